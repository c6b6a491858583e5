//! Orchestration of one rewrite run.
//!
//! Every input becomes one independent unit of work. Units run on a bounded
//! rayon pool and never share an output location, so they need no locking.
//! The run waits for every unit before it reports, even when some fail; the
//! first failure in submission order is the one returned.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::archive::rewrite_archive;
use crate::directory::rewrite_directory;
use crate::input::{ChangeStatus, Input};
use crate::output::OutputProvider;
use crate::transform::ClassTransform;

pub type LifecycleHook = Box<dyn Fn() -> Result<()> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Scratch directory for temporary jars and classes.
    pub temp_dir: PathBuf,
    pub threads: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join("class-rewriter"),
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// What a single unit of work sees besides its input.
pub struct WorkContext<'a> {
    pub temp_dir: &'a Path,
    pub incremental: bool,
    pub transform: &'a dyn ClassTransform,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitStats {
    pub classes_rewritten: usize,
    pub files_copied: usize,
    pub signatures_stripped: usize,
    pub outputs_removed: usize,
    pub inputs_skipped: usize,
}

impl UnitStats {
    pub(crate) fn record_reconciled(&mut self, status: ChangeStatus) {
        match status {
            ChangeStatus::Removed => self.outputs_removed += 1,
            ChangeStatus::Unchanged | ChangeStatus::Unknown => self.inputs_skipped += 1,
            ChangeStatus::Added | ChangeStatus::Changed => {}
        }
    }

    fn merge(&mut self, other: UnitStats) {
        self.classes_rewritten += other.classes_rewritten;
        self.files_copied += other.files_copied;
        self.signatures_stripped += other.signatures_stripped;
        self.outputs_removed += other.outputs_removed;
        self.inputs_skipped += other.inputs_skipped;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub incremental: bool,
    pub archives: usize,
    pub directories: usize,
    pub duration_ms: u64,
    #[serde(flatten)]
    pub stats: UnitStats,
}

pub struct Pipeline {
    transform: Box<dyn ClassTransform>,
    config: PipelineConfig,
    on_start: Option<LifecycleHook>,
    on_end: Option<LifecycleHook>,
}

impl Pipeline {
    pub fn new(transform: impl ClassTransform + 'static, config: PipelineConfig) -> Self {
        Self {
            transform: Box::new(transform),
            config,
            on_start: None,
            on_end: None,
        }
    }

    /// Runs once on the calling thread before any unit is submitted.
    pub fn on_start(mut self, hook: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Runs once on the calling thread after every unit succeeded.
    pub fn on_end(mut self, hook: impl Fn() -> Result<()> + Send + Sync + 'static) -> Self {
        self.on_end = Some(Box::new(hook));
        self
    }

    pub fn run(
        &self,
        inputs: &[Input],
        incremental: bool,
        output: &dyn OutputProvider,
    ) -> Result<RunReport> {
        info!(inputs = inputs.len(), incremental, "transform start");
        let start = Instant::now();

        if let Some(hook) = self.on_start.as_ref() {
            hook().context("on_start hook failed")?;
        }
        if !incremental {
            output.delete_all()?;
        }
        std::fs::create_dir_all(&self.config.temp_dir).with_context(|| {
            format!(
                "Failed to create temp directory: {}",
                self.config.temp_dir.display()
            )
        })?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads.max(1))
            .thread_name(|i| format!("class-rewriter-{i}"))
            .build()
            .context("Failed to build worker pool")?;

        let ctx = WorkContext {
            temp_dir: &self.config.temp_dir,
            incremental,
            transform: self.transform.as_ref(),
        };
        let results: Vec<Result<UnitStats>> = pool.install(|| {
            inputs
                .par_iter()
                .map(|input| run_unit(input, &ctx, output))
                .collect()
        });

        let mut stats = UnitStats::default();
        for result in results {
            match result {
                Ok(unit) => stats.merge(unit),
                Err(err) => {
                    error!(
                        duration_ms = start.elapsed().as_millis() as u64,
                        "transform failed: {err:#}"
                    );
                    return Err(err);
                }
            }
        }

        if let Some(hook) = self.on_end.as_ref() {
            hook().context("on_end hook failed")?;
        }

        let report = RunReport {
            incremental,
            archives: inputs
                .iter()
                .filter(|i| matches!(i, Input::Archive(_)))
                .count(),
            directories: inputs
                .iter()
                .filter(|i| matches!(i, Input::Directory(_)))
                .count(),
            duration_ms: start.elapsed().as_millis() as u64,
            stats,
        };
        info!(
            duration_ms = report.duration_ms,
            rewritten = report.stats.classes_rewritten,
            "transform end"
        );
        Ok(report)
    }
}

fn run_unit(input: &Input, ctx: &WorkContext<'_>, output: &dyn OutputProvider) -> Result<UnitStats> {
    let dest = output.content_location(
        &input.name()?,
        input.content_types(),
        input.scopes(),
        input.format(),
    );
    debug!(input = %input.path().display(), dest = %dest.display(), "unit start");

    let result = match input {
        Input::Archive(archive) => rewrite_archive(archive, &dest, ctx),
        Input::Directory(dir) => rewrite_directory(dir, &dest, ctx),
    };
    result.with_context(|| format!("Failed to process input: {}", input.path().display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ArchiveInput, DirectoryInput};
    use crate::output::FolderOutputProvider;
    use crate::transform::Identity;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "class_rewriter_pipeline_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn write_file(path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    fn config(base: &Path) -> PipelineConfig {
        PipelineConfig {
            temp_dir: base.join("tmp"),
            threads: 2,
        }
    }

    #[test]
    fn lifecycle_hooks_wrap_the_parallel_region() -> Result<()> {
        let base = temp_dir("hooks");
        write_file(&base.join("classes/A.class"), b"a")?;
        let events = Arc::new(Mutex::new(Vec::new()));

        let start_events = Arc::clone(&events);
        let end_events = Arc::clone(&events);
        let transform_events = Arc::clone(&events);
        let pipeline = Pipeline::new(
            move |bytes: &[u8]| {
                transform_events.lock().unwrap().push("transform");
                bytes.to_vec()
            },
            config(&base),
        )
        .on_start(move || {
            start_events.lock().unwrap().push("start");
            Ok(())
        })
        .on_end(move || {
            end_events.lock().unwrap().push("end");
            Ok(())
        });

        let output = FolderOutputProvider::new(base.join("out"));
        let inputs = vec![Input::Directory(DirectoryInput::new("main", base.join("classes")))];
        pipeline.run(&inputs, false, &output)?;

        assert_eq!(*events.lock().unwrap(), vec!["start", "transform", "end"]);
        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn failing_start_hook_aborts_before_any_work() -> Result<()> {
        let base = temp_dir("start_fails");
        write_file(&base.join("out/keep.txt"), b"keep")?;
        let pipeline = Pipeline::new(Identity, config(&base))
            .on_start(|| anyhow::bail!("index unavailable"));

        let output = FolderOutputProvider::new(base.join("out"));
        assert!(pipeline.run(&[], false, &output).is_err());
        assert!(base.join("out/keep.txt").exists());

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn full_rebuild_clears_stale_outputs() -> Result<()> {
        let base = temp_dir("full_clear");
        write_file(&base.join("out/folders/classes/project/old/Stale.class"), b"x")?;
        write_file(&base.join("classes/A.class"), b"a")?;
        let pipeline = Pipeline::new(Identity, config(&base));
        let output = FolderOutputProvider::new(base.join("out"));
        let inputs = vec![Input::Directory(DirectoryInput::new("main", base.join("classes")))];

        let report = pipeline.run(&inputs, false, &output)?;
        assert!(!base.join("out/folders/classes/project/old").exists());
        assert!(base.join("out/folders/classes/project/main/A.class").exists());
        assert_eq!(report.directories, 1);
        assert_eq!(report.stats.classes_rewritten, 1);

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn failure_is_reported_after_siblings_finish() -> Result<()> {
        let base = temp_dir("failure");
        write_file(&base.join("good/A.class"), b"a")?;
        let ended = Arc::new(Mutex::new(false));
        let ended_flag = Arc::clone(&ended);
        let pipeline = Pipeline::new(Identity, config(&base)).on_end(move || {
            *ended_flag.lock().unwrap() = true;
            Ok(())
        });
        let output = FolderOutputProvider::new(base.join("out"));
        let inputs = vec![
            Input::Directory(DirectoryInput::new("missing", base.join("missing"))),
            Input::Directory(DirectoryInput::new("good", base.join("good"))),
        ];

        let err = pipeline.run(&inputs, false, &output).unwrap_err();
        assert!(format!("{err:#}").contains("missing"));
        assert!(base.join("out/folders/classes/project/good/A.class").exists());
        assert!(!*ended.lock().unwrap());

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn first_submitted_failure_wins() -> Result<()> {
        let base = temp_dir("first_failure");
        let pipeline = Pipeline::new(Identity, config(&base));
        let output = FolderOutputProvider::new(base.join("out"));
        let inputs = vec![
            Input::Directory(DirectoryInput::new("first", base.join("first-missing"))),
            Input::Archive(ArchiveInput::new(base.join("second-missing.jar"))),
        ];

        let err = pipeline.run(&inputs, false, &output).unwrap_err();
        assert!(err.to_string().contains("first-missing"));

        std::fs::remove_dir_all(base)?;
        Ok(())
    }

    #[test]
    fn stats_record_reconciled_statuses() {
        let mut stats = UnitStats::default();
        stats.record_reconciled(ChangeStatus::Removed);
        stats.record_reconciled(ChangeStatus::Unchanged);
        stats.record_reconciled(ChangeStatus::Unknown);
        stats.record_reconciled(ChangeStatus::Added);
        assert_eq!(stats.outputs_removed, 1);
        assert_eq!(stats.inputs_skipped, 2);
    }
}
