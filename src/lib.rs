//! # class-rewriter
//!
//! Incremental, parallel rewriting of compiled Java classes.
//!
//! Given the jars and class directories that feed a packaging step, every
//! eligible class is passed through a pluggable transform and the results are
//! written into an output cache owned by the host build.
//!
//! ## Architecture
//!
//! - **filter**: Which classes and jars are eligible for rewriting
//! - **digest**: Path-derived names for temporary and cached files
//! - **input**: Jar and directory inputs, change statuses, invocation manifests
//! - **output**: Output location resolution and the folder-backed cache
//! - **incremental**: Skip/delete/process decisions from change statuses
//! - **archive**: Entry-by-entry jar rewriting with signature stripping
//! - **directory**: Mirroring of class directories into the cache
//! - **transform**: The rewrite hook and built-in transforms
//! - **pipeline**: Parallel fan-out of one unit of work per input
//! - **fsops**: Temporary files and atomic promotion into the cache
//! - **cli** / **config**: Command-line surface and setting resolution

pub mod archive;
pub mod cli;
pub mod config;
pub mod digest;
pub mod directory;
pub mod filter;
pub mod fsops;
pub mod incremental;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod transform;

pub use input::{ArchiveInput, ChangeStatus, DirectoryInput, Input, Invocation};
pub use output::{FolderOutputProvider, OutputProvider};
pub use pipeline::{Pipeline, PipelineConfig, RunReport};
pub use transform::ClassTransform;
