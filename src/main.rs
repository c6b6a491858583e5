use anyhow::Result;
use clap::Parser;
use class_rewriter::cli::{Cli, Commands, TransformKind};
use class_rewriter::config::{resolve_output_root, resolve_pipeline_config};
use class_rewriter::digest::content_addressed_name;
use class_rewriter::transform::{Identity, VerifyMagic};
use class_rewriter::{FolderOutputProvider, Invocation, OutputProvider, Pipeline, RunReport};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct RunOutput {
    output_root: String,
    #[serde(flatten)]
    report: RunReport,
}

#[derive(Debug, Serialize)]
struct CleanOutput {
    output_root: String,
    cleared: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command.clone() {
        Commands::Run {
            manifest,
            transform,
            full,
        } => {
            let output = run(&cli, &manifest, transform, full)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Clean => {
            let root = resolve_output_root(&cli)?;
            FolderOutputProvider::new(root.clone()).delete_all()?;
            let output = CleanOutput {
                output_root: root.to_string_lossy().to_string(),
                cleared: true,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Name { file } => {
            println!("{}", content_addressed_name(&file)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli, manifest: &Path, transform: TransformKind, full: bool) -> Result<RunOutput> {
    let invocation = Invocation::load(manifest)?;
    let root = resolve_output_root(cli)?;
    let provider = FolderOutputProvider::new(root.clone());
    let config = resolve_pipeline_config(cli)?;

    let pipeline = match transform {
        TransformKind::Identity => Pipeline::new(Identity, config),
        TransformKind::Verify => Pipeline::new(VerifyMagic, config),
    };
    let incremental = invocation.incremental && !full;
    let report = pipeline.run(&invocation.inputs(), incremental, &provider)?;

    Ok(RunOutput {
        output_root: root.to_string_lossy().to_string(),
        report,
    })
}
