//! Inputs handed to one pipeline invocation.
//!
//! The host supplies jars and class directories together with the content
//! types and scopes they were declared with. An [`Invocation`] can also be
//! loaded from a JSON manifest, which is how the binary receives its inputs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::digest::content_addressed_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    #[serde(alias = "notchanged", alias = "not_changed")]
    Unchanged,
    Added,
    Changed,
    Removed,
    /// Any value the host reports that this crate does not know about.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Classes,
    Resources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Project,
    SubProjects,
    ExternalLibraries,
    TestedCode,
    ProvidedOnly,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Classes => "classes",
            ContentType::Resources => "resources",
        }
    }
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Project => "project",
            Scope::SubProjects => "sub_projects",
            Scope::ExternalLibraries => "external_libraries",
            Scope::TestedCode => "tested_code",
            Scope::ProvidedOnly => "provided_only",
        }
    }
}

/// Layout of an output location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Jar,
    Directory,
}

fn default_content_types() -> BTreeSet<ContentType> {
    BTreeSet::from([ContentType::Classes])
}

fn default_scopes() -> BTreeSet<Scope> {
    BTreeSet::from([Scope::Project])
}

fn default_archive_status() -> ChangeStatus {
    ChangeStatus::Changed
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveInput {
    pub path: PathBuf,
    #[serde(default = "default_archive_status")]
    pub status: ChangeStatus,
    #[serde(default = "default_content_types")]
    pub content_types: BTreeSet<ContentType>,
    #[serde(default = "default_scopes")]
    pub scopes: BTreeSet<Scope>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryInput {
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_content_types")]
    pub content_types: BTreeSet<ContentType>,
    #[serde(default = "default_scopes")]
    pub scopes: BTreeSet<Scope>,
    /// Per-file status, only consulted on incremental runs.
    #[serde(default)]
    pub changed_files: Option<BTreeMap<PathBuf, ChangeStatus>>,
}

impl ArchiveInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            status: default_archive_status(),
            content_types: default_content_types(),
            scopes: default_scopes(),
        }
    }

    pub fn with_status(mut self, status: ChangeStatus) -> Self {
        self.status = status;
        self
    }
}

impl DirectoryInput {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            content_types: default_content_types(),
            scopes: default_scopes(),
            changed_files: None,
        }
    }

    pub fn with_changed_files(mut self, changed: BTreeMap<PathBuf, ChangeStatus>) -> Self {
        self.changed_files = Some(changed);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Input {
    Archive(ArchiveInput),
    Directory(DirectoryInput),
}

impl Input {
    /// Identity name used to resolve the output location.
    pub fn name(&self) -> Result<String> {
        match self {
            Input::Archive(a) => content_addressed_name(&a.path),
            Input::Directory(d) => Ok(d.name.clone()),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Input::Archive(_) => Format::Jar,
            Input::Directory(_) => Format::Directory,
        }
    }

    pub fn content_types(&self) -> &BTreeSet<ContentType> {
        match self {
            Input::Archive(a) => &a.content_types,
            Input::Directory(d) => &d.content_types,
        }
    }

    pub fn scopes(&self) -> &BTreeSet<Scope> {
        match self {
            Input::Archive(a) => &a.scopes,
            Input::Directory(d) => &d.scopes,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Input::Archive(a) => &a.path,
            Input::Directory(d) => &d.path,
        }
    }
}

/// Everything the host hands over for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    pub incremental: bool,
    #[serde(default)]
    pub archives: Vec<ArchiveInput>,
    #[serde(default)]
    pub directories: Vec<DirectoryInput>,
}

impl Invocation {
    /// Loads a manifest; relative paths are resolved against its directory.
    pub fn load(manifest: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(manifest)
            .with_context(|| format!("Failed to read manifest: {}", manifest.display()))?;
        let mut invocation: Invocation = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse manifest: {}", manifest.display()))?;
        if let Some(base) = manifest.parent() {
            invocation.resolve_relative_to(base);
        }
        Ok(invocation)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for archive in self.archives.iter_mut() {
            archive.path = base.join(&archive.path);
        }
        for dir in self.directories.iter_mut() {
            dir.path = base.join(&dir.path);
            if let Some(changed) = dir.changed_files.take() {
                dir.changed_files = Some(
                    changed
                        .into_iter()
                        .map(|(file, status)| (base.join(file), status))
                        .collect(),
                );
            }
        }
    }

    /// Inputs in submission order: jars first, then directories.
    pub fn inputs(&self) -> Vec<Input> {
        self.archives
            .iter()
            .cloned()
            .map(Input::Archive)
            .chain(self.directories.iter().cloned().map(Input::Directory))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "class_rewriter_input_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    #[test]
    fn unknown_status_deserializes_to_unknown() -> Result<()> {
        let status: ChangeStatus = serde_json::from_str("\"renamed\"")?;
        assert_eq!(status, ChangeStatus::Unknown);
        let status: ChangeStatus = serde_json::from_str("\"notchanged\"")?;
        assert_eq!(status, ChangeStatus::Unchanged);
        Ok(())
    }

    #[test]
    fn manifest_defaults_and_relative_paths() -> Result<()> {
        let base = temp_dir("manifest");
        std::fs::create_dir_all(&base)?;
        let manifest = base.join("inputs.json");
        std::fs::write(
            &manifest,
            r#"{
                "incremental": true,
                "archives": [{ "path": "libs/a.jar" }],
                "directories": [{
                    "name": "main",
                    "path": "classes",
                    "scopes": ["sub_projects"],
                    "changed_files": { "classes/A.class": "added" }
                }]
            }"#,
        )?;

        let invocation = Invocation::load(&manifest)?;
        assert!(invocation.incremental);
        assert_eq!(invocation.archives[0].path, base.join("libs/a.jar"));
        assert_eq!(invocation.archives[0].status, ChangeStatus::Changed);
        assert!(invocation.archives[0].content_types.contains(&ContentType::Classes));

        let dir = &invocation.directories[0];
        assert_eq!(dir.path, base.join("classes"));
        assert!(dir.scopes.contains(&Scope::SubProjects));
        let changed = dir.changed_files.as_ref().unwrap();
        assert_eq!(changed.get(&base.join("classes/A.class")), Some(&ChangeStatus::Added));

        let inputs = invocation.inputs();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].format(), Format::Jar);
        assert_eq!(inputs[1].format(), Format::Directory);
        assert_eq!(inputs[1].name()?, "main");

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn archive_identity_name_is_content_addressed() -> Result<()> {
        let input = Input::Archive(ArchiveInput::new("/work/lib/classes.jar"));
        let name = input.name()?;
        assert!(name.ends_with("_classes.jar"));
        assert_ne!(
            name,
            Input::Archive(ArchiveInput::new("/work/app/classes.jar")).name()?
        );
        Ok(())
    }
}
