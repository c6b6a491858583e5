//! Stable names for temporary and cached artifacts.
//!
//! Names look like `<8 hex chars>_<file name>`. The prefix is derived from the
//! absolute path, not the content, so the same source location always maps to
//! the same name while same-named files from different places do not collide.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;

const PREFIX_LEN: usize = 8;

pub fn content_addressed_name(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve absolute path: {}", path.display()))?;
    let file_name = absolute
        .file_name()
        .with_context(|| format!("Path has no file name: {}", absolute.display()))?
        .to_string_lossy();
    Ok(format!("{}_{file_name}", path_digest(&absolute)))
}

fn path_digest(absolute: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(absolute.to_string_lossy().as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(PREFIX_LEN);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn name_keeps_original_file_name() -> Result<()> {
        let name = content_addressed_name(Path::new("/work/app/build/classes/Foo.class"))?;
        let (prefix, rest) = name.split_once('_').unwrap();
        assert_eq!(prefix.len(), 8);
        assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(rest, "Foo.class");
        Ok(())
    }

    #[test]
    fn name_is_stable_for_same_path() -> Result<()> {
        let p = Path::new("/work/lib/classes.jar");
        assert_eq!(content_addressed_name(p)?, content_addressed_name(p)?);
        Ok(())
    }

    #[test]
    fn same_file_name_in_different_dirs_does_not_collide() -> Result<()> {
        let mut seen = HashSet::new();
        for i in 0..500 {
            let p = format!("/work/module{i}/build/classes.jar");
            assert!(seen.insert(content_addressed_name(Path::new(&p))?));
        }
        Ok(())
    }

    #[test]
    fn relative_paths_are_resolved_before_hashing() -> Result<()> {
        let cwd = std::env::current_dir()?;
        assert_eq!(
            content_addressed_name(Path::new("Foo.class"))?,
            content_addressed_name(&cwd.join("Foo.class"))?
        );
        Ok(())
    }
}
