use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use siepomaga::{config, MonitorBuilder, Presentation, RefreshOutcome};

/// Watch a SiePomaga fundraiser and print its figures.
#[derive(Debug, Parser)]
#[command(name = "siepomaga", version)]
struct Args {
    /// Fundraiser slug or https://www.siepomaga.pl/<slug> URL
    fundraiser: String,

    /// Seconds between refreshes (minimum 30)
    #[arg(short, long, default_value_t = config::DEFAULT_SCAN_INTERVAL.as_secs())]
    interval: u64,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Log a diagnostic for every failed refresh
    #[arg(long)]
    verbose_errors: bool,

    /// Where the daily inflow history is kept
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Refresh once, print and exit
    #[arg(long)]
    once: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn print(view: &Presentation, json: bool) {
    if json {
        match serde_json::to_string_pretty(view) {
            Ok(s) => println!("{s}"),
            Err(e) => error!("failed to encode presentation: {e}"),
        }
        return;
    }

    let attrs = &view.attributes;
    println!(
        "{} ({}){}",
        attrs.title.as_deref().unwrap_or(&attrs.slug),
        attrs.url,
        if attrs.available { "" } else { " [unavailable]" }
    );
    for v in &view.values {
        let unit = v.unit.symbol().filter(|_| !v.value.is_unknown()).unwrap_or("");
        println!("  {:<20} {} {}", v.name, v.value, unit);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let state_dir = args.state_dir.clone().unwrap_or_else(config::default_state_dir);

    let builder = MonitorBuilder::new(&args.fundraiser)
        .scan_interval(Duration::from_secs(args.interval))
        .timeout(Duration::from_secs(args.timeout))
        .verbose_errors(args.verbose_errors)
        .state_dir(state_dir);

    let mut monitor = match builder.build() {
        Ok(m) => m,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if args.once {
        let outcome = monitor.refresh().await;
        print(&monitor.presentation(), args.json);
        return match outcome {
            RefreshOutcome::Updated(_) => ExitCode::SUCCESS,
            RefreshOutcome::Failed(report) => {
                error!("{report}");
                ExitCode::FAILURE
            }
        };
    }

    let handle = siepomaga::scheduler::spawn(monitor);
    let mut updates = handle.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(view) = updates.borrow_and_update().clone() {
                    print(&view, args.json);
                }
            }
        }
    }
    handle.shutdown().await;
    ExitCode::SUCCESS
}
