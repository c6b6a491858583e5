use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::pipeline::PipelineConfig;

pub const OUTPUT_ENV: &str = "CLASS_REWRITER_OUTPUT";
pub const TEMP_ENV: &str = "CLASS_REWRITER_TEMP";
pub const THREADS_ENV: &str = "CLASS_REWRITER_THREADS";

pub fn resolve_output_root(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.output.clone() {
        return Ok(p);
    }

    if let Ok(p) = env::var(OUTPUT_ENV) {
        return Ok(PathBuf::from(p));
    }

    Ok(class_rewriter_home()?.join("output"))
}

pub fn resolve_temp_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.temp.clone() {
        return Ok(p);
    }

    if let Ok(p) = env::var(TEMP_ENV) {
        return Ok(PathBuf::from(p));
    }

    let base = dirs::cache_dir().unwrap_or_else(env::temp_dir);
    Ok(base.join("class-rewriter").join("tmp"))
}

pub fn resolve_threads(cli: &Cli) -> Result<usize> {
    if let Some(n) = cli.threads {
        return Ok(n.max(1));
    }

    if let Ok(raw) = env::var(THREADS_ENV) {
        let n: usize = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {THREADS_ENV} value: {raw}"))?;
        return Ok(n.max(1));
    }

    Ok(PipelineConfig::default().threads)
}

pub fn resolve_pipeline_config(cli: &Cli) -> Result<PipelineConfig> {
    Ok(PipelineConfig {
        temp_dir: resolve_temp_dir(cli)?,
        threads: resolve_threads(cli)?,
    })
}

fn class_rewriter_home() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::cache_dir)
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve data directory"))?;
    Ok(base.join("class-rewriter"))
}
