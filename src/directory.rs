//! Mirroring of a class directory into its output location.
//!
//! Every source file maps to the path obtained by swapping the input root for
//! the output root. On incremental runs only the files named in the change map
//! are visited; full runs walk the whole tree.

use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::digest::content_addressed_name;
use crate::filter::is_eligible_class_file;
use crate::fsops::{TempFile, promote, remove_if_exists};
use crate::incremental::{Action, classify};
use crate::input::DirectoryInput;
use crate::pipeline::{UnitStats, WorkContext};

pub fn rewrite_directory(
    input: &DirectoryInput,
    dest: &Path,
    ctx: &WorkContext<'_>,
) -> Result<UnitStats> {
    let src_root = std::path::absolute(&input.path)
        .with_context(|| format!("Failed to resolve directory: {}", input.path.display()))?;
    let dest_root = std::path::absolute(dest)
        .with_context(|| format!("Failed to resolve directory: {}", dest.display()))?;
    std::fs::create_dir_all(&dest_root)
        .with_context(|| format!("Failed to create directory: {}", dest_root.display()))?;

    let mut stats = UnitStats::default();
    match input.changed_files.as_ref() {
        Some(changed) if ctx.incremental => {
            for (file, status) in changed {
                let file = std::path::absolute(file)
                    .with_context(|| format!("Failed to resolve file: {}", file.display()))?;
                let target = mirror_path(&src_root, &file, &dest_root)?;
                match classify(true, *status) {
                    Action::Skip => stats.record_reconciled(*status),
                    Action::Delete => {
                        remove_if_exists(&target)?;
                        stats.record_reconciled(*status);
                    }
                    Action::Process if file.is_dir() => {
                        std::fs::create_dir_all(&target).with_context(|| {
                            format!("Failed to create directory: {}", target.display())
                        })?;
                    }
                    Action::Process => rewrite_file(&file, &target, ctx, &mut stats)?,
                }
            }
        }
        _ => {
            for file in walk_files(&src_root)? {
                let target = mirror_path(&src_root, &file, &dest_root)?;
                rewrite_file(&file, &target, ctx, &mut stats)?;
            }
        }
    }

    debug!(
        dir = %src_root.display(),
        rewritten = stats.classes_rewritten,
        copied = stats.files_copied,
        "directory mirrored"
    );
    Ok(stats)
}

fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk directory: {}", root.display()))?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn mirror_path(src_root: &Path, file: &Path, dest_root: &Path) -> Result<PathBuf> {
    let Ok(relative) = file.strip_prefix(src_root) else {
        bail!(
            "File {} is outside of input directory {}",
            file.display(),
            src_root.display()
        );
    };
    Ok(dest_root.join(relative))
}

fn rewrite_file(
    file: &Path,
    target: &Path,
    ctx: &WorkContext<'_>,
    stats: &mut UnitStats,
) -> Result<()> {
    remove_if_exists(target)?;

    if !is_eligible_class_file(file) {
        promote(file, target)?;
        stats.files_copied += 1;
        return Ok(());
    }

    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read class: {}", file.display()))?;
    let rewritten = ctx.transform.transform(&bytes);

    let temp = TempFile::claim(ctx.temp_dir.join(content_addressed_name(file)?))?;
    std::fs::write(temp.path(), rewritten)
        .with_context(|| format!("Failed to write temp class: {}", temp.path().display()))?;
    promote(temp.path(), target)?;
    stats.classes_rewritten += 1;
    Ok(())
}
