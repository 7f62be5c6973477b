//! chainer CLI entry point.
//!
//! Binary name: `chainer`

mod cli;

use std::process::ExitCode;

use clap::Parser;

use chainer_observe::chain_attrs::run_directive;
use chainer_observe::tracing_setup::{init_tracing, shutdown_tracing};
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn".to_string(),
        1 => format!("info,{}", run_directive("debug")),
        _ => "trace".to_string(),
    };
    if let Err(err) = init_tracing(cli.otel, &filter) {
        eprintln!("Warning: tracing setup failed: {err}");
    }

    let outcome = match cli.command {
        Commands::Demo(args) => cli::demo::run_demo(args, cli.json).await,
    };
    shutdown_tracing();

    Ok(if outcome? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
