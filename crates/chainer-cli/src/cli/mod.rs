//! CLI command definitions for the `chainer` binary.

pub mod demo;

use clap::{Parser, Subcommand};

/// Drive saga-style chained workflows from the command line.
#[derive(Parser)]
#[command(name = "chainer", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output one JSON step report per line instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Export run spans as OpenTelemetry traces on stdout.
    #[arg(long, global = true, env = "CHAINER_OTEL")]
    pub otel: bool,

    /// Detailed logs (-v for engine debug events, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a synthetic workflow and print every step notification.
    Demo(demo::DemoArgs),
}
