//! `chainer demo`: run a synthetic workflow end to end.
//!
//! Every step's up action "provisions" a resource by writing into the
//! shared step data; its down action releases it. Both honour the
//! cancellation token, so `--cancel-after-ms` interrupts whichever action
//! is in flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::task::AbortOnDropHandle;

use chainer_core::chain::{Action, ChainEngine, ExecutionContext, Step, StepNotification};
use chainer_infra::config::load_engine_config;
use chainer_types::config::EngineConfig;
use chainer_types::step::{Phase, StepStatus};

pub const DEFAULT_STEPS: usize = 5;
pub const DEFAULT_STEP_DELAY_MS: u64 = 200;
pub const DEMO_WORKFLOW: &str = "demo";

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Number of steps in the workflow.
    #[arg(long, default_value_t = DEFAULT_STEPS)]
    pub steps: usize,

    /// Make this step's up action fail (1-based).
    #[arg(long)]
    pub fail_at: Option<usize>,

    /// Send one cancel signal after this many milliseconds.
    #[arg(long)]
    pub cancel_after_ms: Option<u64>,

    /// Time each action spends working.
    #[arg(long, default_value_t = DEFAULT_STEP_DELAY_MS)]
    pub step_delay_ms: u64,

    /// Engine configuration file (TOML).
    #[arg(long, env = "CHAINER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Run the demo workflow. Returns whether every forward step succeeded.
pub async fn run_demo(args: DemoArgs, json: bool) -> Result<bool> {
    let config = match &args.config {
        Some(path) => load_engine_config(path).await,
        None => EngineConfig::default(),
    };

    let engine = Arc::new(ChainEngine::with_config(&config));
    let delay = Duration::from_millis(args.step_delay_ms);
    engine.add(DEMO_WORKFLOW, build_demo_steps(args.steps, args.fail_at, delay))?;

    let (ctx, _canceller) = match args.cancel_after_ms {
        Some(ms) => {
            let (ctx, handle) = ExecutionContext::new().cancelable();
            let task = tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                tracing::info!(after_ms = ms, "sending cancel signal");
                handle.cancel().await;
            });
            (ctx, Some(AbortOnDropHandle::new(task)))
        }
        None => (ExecutionContext::new(), None),
    };
    let ctx = ctx.into_shared();

    if !json {
        println!();
        println!(
            "  {} Running '{}' ({} steps)",
            style("▶").bold(),
            style(DEMO_WORKFLOW).cyan(),
            args.steps
        );
        println!();
    }

    let (tx, mut rx) = mpsc::channel(1);
    let (handle, done) = engine.spawn_run(DEMO_WORKFLOW, Arc::clone(&ctx), tx);

    let mut tally = RunTally::default();
    while let Some(notification) = rx.recv().await {
        tally.record(&notification);
        if json {
            println!("{}", serde_json::to_string(&notification.to_report())?);
        } else {
            println!("{}", format_notification(&notification));
        }
    }

    // `done` fires even when the run task unwinds.
    let _ = done.await;
    if let Err(err) = handle.await {
        anyhow::bail!("workflow run aborted: {err}");
    }

    if !json {
        println!();
        println!("{}", tally.table());
        let mut left: Vec<String> = ctx.data.keys();
        left.sort();
        if !left.is_empty() {
            println!(
                "  {} still provisioned: {}",
                style("!").yellow().bold(),
                left.join(", ")
            );
        }
        println!();
    }

    Ok(tally.forward_succeeded())
}

/// Build `steps` provisioning steps, failing the up action of `fail_at`.
pub fn build_demo_steps(steps: usize, fail_at: Option<usize>, delay: Duration) -> Vec<Step> {
    (1..=steps)
        .map(|n| Step::new(provision(n, fail_at == Some(n), delay), release(n, delay)))
        .collect()
}

fn resource_key(n: usize) -> String {
    format!("resource_{n}")
}

fn provision(n: usize, fail: bool, delay: Duration) -> Action {
    Action::new(move |token, ctx| async move {
        tokio::select! {
            _ = token.cancelled() => return Ok(format!("provisioning {n} interrupted")),
            _ = tokio::time::sleep(delay) => {}
        }
        if fail {
            return Err(anyhow::anyhow!("simulated failure at step {n}"));
        }
        ctx.data.insert(resource_key(n), json!({ "step": n, "state": "ready" }));
        Ok(format!("provisioned resource {n}"))
    })
}

fn release(n: usize, delay: Duration) -> Action {
    Action::new(move |token, ctx| async move {
        tokio::select! {
            _ = token.cancelled() => return Ok(format!("release of {n} interrupted")),
            _ = tokio::time::sleep(delay) => {}
        }
        match ctx.data.remove(&resource_key(n)) {
            Some(_) => Ok(format!("released resource {n}")),
            None => Ok(format!("resource {n} was never provisioned")),
        }
    })
}

fn format_notification(n: &StepNotification) -> String {
    let label = match n.status {
        StepStatus::InProgress => style(n.label()).dim(),
        StepStatus::Succeeded => style(n.label()).green(),
        StepStatus::Failed => style(n.label()).red().bold(),
        StepStatus::Canceled => style(n.label()).yellow(),
    };
    let detail = match &n.error {
        Some(err) => style(err.to_string()).red().to_string(),
        None => n.message.clone(),
    };
    if n.step_number == 0 {
        return format!("  {label}  {detail}");
    }
    format!(
        "  {label}  {}  {detail}",
        style(format!("step {}/{}", n.step_number, n.total_steps)).dim()
    )
}

/// Outcome counts per phase, ignoring `InProgress` announcements.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunTally {
    forward: [usize; 3],
    rollback: [usize; 3],
}

impl RunTally {
    pub fn record(&mut self, n: &StepNotification) {
        let slot = match n.status {
            StepStatus::InProgress => return,
            StepStatus::Succeeded => 0,
            StepStatus::Failed => 1,
            StepStatus::Canceled => 2,
        };
        match n.phase {
            Phase::Forward => self.forward[slot] += 1,
            Phase::Rollback => self.rollback[slot] += 1,
        }
    }

    /// True when no forward step failed or was canceled.
    pub fn forward_succeeded(&self) -> bool {
        self.forward[1] == 0 && self.forward[2] == 0
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Phase").fg(Color::Cyan),
                Cell::new("Succeeded"),
                Cell::new("Failed"),
                Cell::new("Canceled"),
            ]);
        for (phase, counts) in [(Phase::Forward, self.forward), (Phase::Rollback, self.rollback)] {
            table.add_row(vec![
                Cell::new(phase),
                Cell::new(counts[0]).fg(Color::Green),
                Cell::new(counts[1]).fg(if counts[1] > 0 { Color::Red } else { Color::Reset }),
                Cell::new(counts[2]).fg(if counts[2] > 0 { Color::Yellow } else { Color::Reset }),
            ]);
        }
        table
    }
}
