use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use appraiser::batch::{BatchEntry, predict_all};
use appraiser::config::{InvokerConfig, default_root_dir};
use appraiser::consts::DEFAULT_AREA;
use appraiser::events::{Event, EventBus};
use appraiser::predictor::InvocationRequest;
use appraiser::predictor::process::ProcessInvoker;
use appraiser::progress::Progress;
use appraiser::report::{print_entry, print_summary};

#[derive(Parser)]
#[command(
    name = "appraiser",
    version,
    about = "Price an area with the bundled prediction executable."
)]
struct Cli {
    /// Areas to price (default: 5000). Several areas run concurrently.
    #[arg(value_name = "AREA", allow_negative_numbers = true)]
    areas: Vec<f64>,

    /// Model file handed to the predictor instead of its bundled one
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Directory that contains dist/ (default: the directory of this binary)
    #[arg(short, long, env = "APPRAISER_ROOT")]
    root: Option<PathBuf>,

    /// Executable file name inside dist/
    #[arg(short, long, env = "APPRAISER_EXECUTABLE")]
    executable: Option<String>,

    /// Run the predictor with an empty environment
    #[arg(long, default_value_t = false)]
    clear_env: bool,

    /// Print one JSON object per result instead of text
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print every lifecycle transition to stderr
    #[arg(long, default_value_t = false)]
    events: bool,

    /// Only log warnings (shows a live progress line on a terminal)
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let areas = if cli.areas.is_empty() {
        vec![DEFAULT_AREA]
    } else {
        cli.areas
    };
    let requests = areas
        .into_iter()
        .map(|area| InvocationRequest::new(area, cli.model.clone()))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid area")?;

    let mut config = InvokerConfig::new(cli.root.unwrap_or_else(default_root_dir));
    if let Some(name) = cli.executable {
        config.executable_name = name;
    }
    if cli.clear_env {
        config = config.with_env(Vec::<(String, String)>::new());
    }

    let bus = Arc::new(EventBus::default());
    let printer = cli.events.then(|| spawn_event_printer(&bus));
    let invoker = ProcessInvoker::new(config).with_events(Arc::clone(&bus));

    let progress = (cli.quiet && std::io::stderr().is_terminal())
        .then(|| Progress::start(&bus, requests.len(), true));

    let entries = predict_all(&invoker, requests).await;

    if let Some(progress) = progress {
        match progress.stop().await {
            Ok(tally) => debug!(finished = tally.finished, failed = tally.failed, "Batch complete"),
            Err(e) => warn!(error = %e, "Progress display task failed"),
        }
    }

    // Closing every sender lets the printer drain and exit.
    drop(invoker);
    drop(bus);
    if let Some(printer) = printer {
        join_logged(printer, "event printer").await;
    }

    for entry in &entries {
        print_entry(entry, cli.json);
    }
    if !cli.json {
        print_summary(&entries);
    }

    Ok(if entries.iter().all(BatchEntry::is_success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logging(quiet: bool) {
    let default_filter = if quiet {
        "appraiser=warn"
    } else {
        "appraiser=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Wait for a background task, logging a panic or cancellation instead of dropping it.
async fn join_logged<T>(handle: JoinHandle<T>, task: &str) -> Option<T> {
    match handle.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(task, error = %e, "Background task failed");
            None
        }
    }
}

fn spawn_event_printer(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => eprintln!("{}", describe(&event)),
                Err(RecvError::Lagged(skipped)) => eprintln!("[events] skipped {}", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

fn describe(event: &Event) -> String {
    match event {
        Event::Spawning { id, path } => format!("[#{}] spawning {}", id, path.display()),
        Event::Running { id, pid } => match pid {
            Some(pid) => format!("[#{}] running (pid {})", id, pid),
            None => format!("[#{}] running", id),
        },
        Event::Exited { id, code } => match code {
            Some(code) => format!("[#{}] exited with code {}", id, code),
            None => format!("[#{}] terminated by signal", id),
        },
        Event::Finished { id, terminal } => format!("[#{}] {}", id, terminal),
    }
}
