//! Rewriting of a single jar.
//!
//! Entries are streamed from the source jar into a temporary jar in source
//! order. Signature files are dropped, since any rewritten class would
//! invalidate them, eligible classes go through the transform and everything
//! else is copied unchanged. The finished temporary jar is then promoted to
//! the output location.

use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use tracing::debug;
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

use crate::digest::content_addressed_name;
use crate::filter::{is_eligible_class, is_rewritable_jar};
use crate::fsops::{TempFile, promote, remove_if_exists};
use crate::incremental::reconcile;
use crate::input::ArchiveInput;
use crate::pipeline::{UnitStats, WorkContext};
use crate::transform::ClassTransform;

const SIGNATURE_SUFFIXES: [&str; 2] = [".SF", ".DSA"];

/// Other signature block kinds, only recognized where jar signing puts them.
const META_INF_BLOCK_SUFFIXES: [&str; 2] = [".RSA", ".EC"];

pub fn is_signature_entry(name: &str) -> bool {
    SIGNATURE_SUFFIXES.iter().any(|s| name.ends_with(s))
        || (name.starts_with("META-INF/")
            && META_INF_BLOCK_SUFFIXES.iter().any(|s| name.ends_with(s)))
}

pub fn rewrite_archive(
    input: &ArchiveInput,
    dest: &Path,
    ctx: &WorkContext<'_>,
) -> Result<UnitStats> {
    let mut stats = UnitStats::default();
    if !reconcile(ctx.incremental, input.status, dest)? {
        debug!(jar = %input.path.display(), status = ?input.status, "jar left as is");
        stats.record_reconciled(input.status);
        return Ok(stats);
    }
    remove_if_exists(dest)?;

    if !is_rewritable_jar(&input.path) {
        debug!(jar = %input.path.display(), "not a rewritable jar, copying verbatim");
        promote(&input.path, dest)?;
        stats.files_copied += 1;
        return Ok(stats);
    }

    let file = File::open(&input.path)
        .with_context(|| format!("Failed to open jar: {}", input.path.display()))?;
    // SAFETY: The file is opened read-only and outlives the mapping.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap jar: {}", input.path.display()))?;
    let mut archive = match ZipArchive::new(Cursor::new(&mmap[..])) {
        Ok(archive) => archive,
        Err(err) => {
            debug!(jar = %input.path.display(), %err, "unreadable zip structure, copying verbatim");
            promote(&input.path, dest)?;
            stats.files_copied += 1;
            return Ok(stats);
        }
    };

    let temp = TempFile::claim(ctx.temp_dir.join(content_addressed_name(&input.path)?))?;
    write_rewritten(&mut archive, temp.path(), ctx.transform, &mut stats)
        .with_context(|| format!("Failed to rewrite jar: {}", input.path.display()))?;
    promote(temp.path(), dest)?;
    Ok(stats)
}

fn write_rewritten<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    temp_path: &Path,
    transform: &dyn ClassTransform,
    stats: &mut UnitStats,
) -> Result<()> {
    let out = File::create(temp_path)
        .with_context(|| format!("Failed to create temp jar: {}", temp_path.display()))?;
    let mut writer = ZipWriter::new(BufWriter::new(out));

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if is_signature_entry(&name) {
            stats.signatures_stripped += 1;
            continue;
        }

        let mut options = FileOptions::default()
            .compression_method(match entry.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            })
            .large_file(entry.size() >= u64::from(u32::MAX));
        if let Some(mode) = entry.unix_mode() {
            options = options.unix_permissions(mode);
        }

        if entry.is_dir() {
            writer.add_directory(name, options)?;
            stats.files_copied += 1;
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read jar entry: {name}"))?;

        let bytes = if is_eligible_class(&name) {
            stats.classes_rewritten += 1;
            transform.transform(&bytes)
        } else {
            stats.files_copied += 1;
            bytes
        };
        writer.start_file(name, options)?;
        writer.write_all(&bytes)?;
    }

    writer.finish()?.flush()?;
    Ok(())
}
