//! Output locations owned by the host.
//!
//! The pipeline never invents output paths. It asks an [`OutputProvider`] for
//! the location of an input identity, and the provider guarantees that the
//! same identity and format always resolve to the same place.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::input::{ContentType, Format, Scope};

pub trait OutputProvider: Send + Sync {
    fn content_location(
        &self,
        name: &str,
        content_types: &BTreeSet<ContentType>,
        scopes: &BTreeSet<Scope>,
        format: Format,
    ) -> PathBuf;

    /// Removes every cached output. Used before a full rebuild.
    fn delete_all(&self) -> Result<()>;
}

/// Lays outputs out as `<root>/<jars|folders>/<types>/<scopes>/<name>`.
#[derive(Debug, Clone)]
pub struct FolderOutputProvider {
    root: PathBuf,
}

impl FolderOutputProvider {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputProvider for FolderOutputProvider {
    fn content_location(
        &self,
        name: &str,
        content_types: &BTreeSet<ContentType>,
        scopes: &BTreeSet<Scope>,
        format: Format,
    ) -> PathBuf {
        let kind = match format {
            Format::Jar => "jars",
            Format::Directory => "folders",
        };
        let types = join_tags(content_types.iter().map(|t| t.as_str()));
        let scopes = join_tags(scopes.iter().map(|s| s.as_str()));

        let mut file_name = sanitize(name);
        if format == Format::Jar && !file_name.ends_with(".jar") {
            file_name.push_str(".jar");
        }
        self.root.join(kind).join(types).join(scopes).join(file_name)
    }

    fn delete_all(&self) -> Result<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root).with_context(|| {
                format!("Failed to clear output cache: {}", self.root.display())
            })?;
        }
        Ok(())
    }
}

fn join_tags<'a>(tags: impl Iterator<Item = &'a str>) -> String {
    let joined = tags.collect::<Vec<_>>().join("+");
    if joined.is_empty() {
        "none".to_string()
    } else {
        joined
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => format!("_{cleaned}"),
        _ => cleaned,
    }
}
