use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Removes a file or directory tree. A missing path is not an error, a path
/// that exists but cannot be removed is.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    let Ok(meta) = std::fs::symlink_metadata(path) else {
        return Ok(());
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    } else {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }
    Ok(())
}

/// Copies `src` into a uniquely named file beside `dest` and renames it over
/// `dest`, so `dest` is never observed half written and no sibling output can
/// be mistaken for the staging file.
pub fn promote(src: &Path, dest: &Path) -> Result<()> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let mut source = File::open(src)
        .with_context(|| format!("Failed to open file: {}", src.display()))?;
    let permissions = source
        .metadata()
        .with_context(|| format!("Failed to stat file: {}", src.display()))?
        .permissions();

    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create staging file in: {}", parent.display()))?;
    std::io::copy(&mut source, staged.as_file_mut()).with_context(|| {
        format!("Failed to copy file: {} -> {}", src.display(), staged.path().display())
    })?;
    staged
        .as_file()
        .set_permissions(permissions)
        .with_context(|| format!("Failed to set permissions: {}", staged.path().display()))?;

    staged
        .persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("Failed to atomically replace file: {}", dest.display()))?;
    Ok(())
}

/// Deletes a temporary file when dropped, whatever path the owner took out.
pub struct TempFile {
    path: PathBuf,
}

impl TempFile {
    /// Claims `path`, clearing any leftover from an earlier run.
    pub fn claim(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create temp directory: {}", parent.display()))?;
        }
        remove_if_exists(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
