use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use taskgauge::config::ServerConfig;
use taskgauge::dispatch::UiDispatcher;
use taskgauge::host::{DialogOptions, ExitRequest, HostEnv, OverlayDialog, OverlayHost};
use taskgauge::server::ProgressServer;
use taskgauge::session::SessionScope;
use taskgauge::state::ProgressState;
use taskgauge::term::TermUi;

#[derive(Parser)]
#[command(name = "taskgauge")]
#[command(version, about = "Run a simulated batch workload behind the progress server")]
struct Cli {
    /// Number of files in the simulated batch
    #[arg(long, default_value = "4")]
    files: u32,

    /// Number of modules discovered inside each file
    #[arg(long, default_value = "25")]
    units: u32,

    /// Simulated work time per module, in milliseconds
    #[arg(long, default_value = "20")]
    work_ms: u64,

    /// Override the server's update tick, in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Skip dialog surfaces and run the session message-only
    #[arg(long)]
    message_only: bool,

    /// Emit progress updates as JSON lines instead of drawing a bar
    #[arg(long)]
    json: bool,

    /// Path to a TOML config file (defaults built in when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

/// Overlay host for `--json`: every pushed update becomes one line on stdout.
struct JsonHost;

struct JsonOverlay {
    label: String,
    status: String,
}

impl OverlayHost for JsonHost {
    fn create_progress_dialog(
        &self,
        _options: DialogOptions,
        text: &str,
    ) -> Option<Box<dyn OverlayDialog>> {
        Some(Box::new(JsonOverlay {
            label: text.to_string(),
            status: String::new(),
        }))
    }
}

impl OverlayDialog for JsonOverlay {
    fn set_text(&mut self, text: &str) {
        self.label = text.to_string();
    }

    fn bar_set_message(&mut self, _index: usize, text: &str) {
        self.status = text.to_string();
    }

    // The value arrives last within each pushed update, so this is the point
    // where one full line is known.
    fn bar_set_value(&mut self, _index: usize, percent: u32) {
        println!(
            "{}",
            serde_json::json!({
                "label": self.label,
                "status": self.status,
                "percent": percent,
            })
        );
    }

    fn refresh(&mut self) {}

    fn close(&mut self) {
        println!(
            "{}",
            serde_json::json!({ "label": self.label, "event": "closed" })
        );
    }
}

/// Ctrl-C and dialog cancellation both end the demo through the same flag.
struct AbortOnExit {
    abort: Arc<AtomicBool>,
}

impl ExitRequest for AbortOnExit {
    fn request_exit(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "taskgauge=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(tick_ms) = cli.tick_ms {
        config.update_tick_ms = tick_ms;
    }
    if cli.message_only {
        config.force_message_only = true;
    }
    Ok(config)
}

/// Secondary producer overlapping the main batch: a short indexing phase
/// that re-titles the session while it runs and feeds its own units into the
/// shared totals.
async fn simulate_indexing(state: Arc<ProgressState>, abort: Arc<AtomicBool>, work_ms: u64) {
    tokio::time::sleep(Duration::from_millis(work_ms * 3)).await;

    let _scope = SessionScope::enter(&state, "Indexing symbols");
    state.add_unit_total(8);
    for _ in 0..8 {
        if abort.load(Ordering::SeqCst) || state.cancel_requested() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(work_ms)).await;
        state.add_unit_done(1);
    }
}

/// Drive the shared counters the way a real batch producer would: announce
/// the file count up front, discover each file's modules as it is opened,
/// and bump the done counters as work completes.
async fn simulate_batch(state: &Arc<ProgressState>, cli: &Cli, abort: &Arc<AtomicBool>) {
    let scope = SessionScope::enter(state, "Compiling modules");
    state.add_file_total(cli.files);

    let indexer = tokio::spawn(simulate_indexing(state.clone(), abort.clone(), cli.work_ms));

    'batch: for file in 0..cli.files {
        state.add_unit_total(cli.units);
        debug!(file, "Simulated file opened");

        for _ in 0..cli.units {
            if abort.load(Ordering::SeqCst) || state.cancel_requested() {
                info!("Batch interrupted, winding down");
                break 'batch;
            }
            tokio::time::sleep(Duration::from_millis(cli.work_ms)).await;
            state.add_unit_done(1);
        }
        state.add_file_done(1);
    }

    // Scope labels unwind innermost-first, so the indexer must finish before
    // the outer label is released.
    let _ = indexer.await;
    drop(scope);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(&cli)?;

    let state = Arc::new(ProgressState::new());
    let abort = Arc::new(AtomicBool::new(false));

    {
        let abort = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                abort.store(true, Ordering::SeqCst);
            }
        });
    }

    let mut env = HostEnv::new()
        .with_abort_flag(abort.clone())
        .with_exit(Arc::new(AbortOnExit {
            abort: abort.clone(),
        }));
    if cli.json {
        env = env.with_overlay(Arc::new(JsonHost));
    } else {
        let term = Arc::new(TermUi::new());
        env = env.with_overlay(term.clone()).with_notices(term);
    }

    let (dispatcher, queue) = UiDispatcher::channel();
    tokio::spawn(queue.run());

    let mut server = ProgressServer::new(state.clone(), config, env, dispatcher);
    server.start().context("Failed to start the progress server")?;

    simulate_batch(&state, &cli, &abort).await;

    // Let the server observe the cleared label and drain the session before
    // shutting it down, so the surface closes instead of being abandoned. A
    // halted worker never drains, so skip the wait when aborting.
    let remaining = state.snapshot().unit_total;
    if remaining != 0 && !abort.load(Ordering::SeqCst) {
        let _ = tokio::time::timeout(
            Duration::from_secs(2),
            state.unit_total_changed(remaining),
        )
        .await;
    }

    let canceled = state.cancel_requested();
    server.stop().await.context("Progress server shut down uncleanly")?;

    if canceled || abort.load(Ordering::SeqCst) {
        println!("Batch interrupted");
    } else {
        println!("Batch complete");
    }
    Ok(())
}
