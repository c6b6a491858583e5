use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-rewriter")]
#[command(about = "Rewrite compiled classes in jars and class directories into an output cache")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Root of the output cache.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Scratch directory for temporary files.
    #[arg(long, value_name = "DIR")]
    pub temp: Option<PathBuf>,

    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Rewrite the inputs listed in a JSON manifest.
    Run {
        #[arg(long, value_name = "FILE")]
        manifest: PathBuf,

        #[arg(short = 't', long, value_enum, default_value_t = TransformKind::Identity)]
        transform: TransformKind,

        /// Ignore the manifest's incremental flag and rebuild everything.
        #[arg(long)]
        full: bool,
    },
    /// Delete every cached output.
    Clean,
    /// Print the content-addressed name of a file.
    Name { file: PathBuf },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum TransformKind {
    Identity,
    Verify,
}
