mod api;
mod gateway;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use planner_channels::whatsapp::WhatsAppChannel;
use planner_core::{
    compose::Composer,
    config::{self, shellexpand, Config},
    routine::{parse_weekday, weekday_name},
};
use planner_sheets::GoogleSheetsClient;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "planner",
    version,
    about = "Daily task and class-routine notifier driven by spreadsheets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler and the HTTP API until interrupted.
    Start,
    /// Run one pass now and print its report.
    Run {
        /// Pretend today is this weekday (e.g. `Monday`).
        #[arg(long)]
        day: Option<String>,
    },
    /// Show the configuration report and the next scheduled pass.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(&cli.config)?;
    cfg.apply_env_overrides();
    let _log_guard = init_tracing(&cfg);
    info!("{}", config_source(&cli.config));

    match cli.command {
        Commands::Start => start(cfg).await?,
        Commands::Run { day } => {
            let forced = match day.as_deref() {
                Some(raw) => Some(
                    parse_weekday(raw).with_context(|| format!("unknown weekday {raw:?}"))?,
                ),
                None => None,
            };
            cfg.validate()?;
            let gw = build_gateway(&cfg)?;
            let report = gw.run_pass(forced).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.success() {
                anyhow::bail!("pass {} did not complete cleanly", report.id);
            }
        }
        Commands::Status => status(&cli.config, &cfg),
    }

    Ok(())
}

/// Console output plus `<data_dir>/logs/planner.log`.
///
/// `RUST_LOG` wins over `planner.log_level`. The returned guard flushes the
/// file writer on drop.
fn init_tracing(cfg: &Config) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&cfg.planner.log_level))
    };

    let log_dir = PathBuf::from(shellexpand(&cfg.planner.data_dir)).join("logs");
    let file = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::never(&log_dir, "planner.log");
            Some(tracing_appender::non_blocking(appender))
        }
        Err(e) => {
            eprintln!("planner: file logging disabled, cannot create {}: {e}", log_dir.display());
            None
        }
    };

    let (file_layer, guard) = match file {
        Some((writer, guard)) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter())
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Where the configuration came from.
fn config_source(path: &str) -> String {
    if Path::new(path).exists() {
        format!("config: loaded {path}")
    } else {
        format!("Config file not found at {path}, using defaults")
    }
}

/// Wire the Google Sheets source, the optional provider, and WhatsApp.
fn build_gateway(cfg: &Config) -> anyhow::Result<gateway::Gateway> {
    let timeout = Duration::from_secs(cfg.planner.http_timeout_secs);
    let tz = cfg.timezone()?;

    let source = GoogleSheetsClient::from_config(&cfg.sheets, timeout)?;
    let provider = planner_providers::from_config(&cfg.provider, timeout)?;
    let channel = WhatsAppChannel::new(cfg.channel.whatsapp.clone(), timeout)?;

    Ok(gateway::Gateway::new(
        Arc::new(source),
        provider.map(Arc::from),
        Arc::new(channel),
        cfg.sheets.clone(),
        Composer::new(cfg.planner.recipient_name.clone(), tz),
    ))
}

/// The gateway for `start`, plus every reason it is missing.
///
/// A build failure the config checks cannot see (unreadable credentials, an
/// unknown provider) becomes one more problem instead of aborting startup.
fn api_gateway(cfg: &Config) -> (Option<Arc<gateway::Gateway>>, Vec<String>) {
    let mut problems = cfg.problems();
    if !problems.is_empty() {
        return (None, problems);
    }
    match build_gateway(cfg) {
        Ok(gw) => (Some(Arc::new(gw)), problems),
        Err(e) => {
            problems.push(format!("{e:#}"));
            (None, problems)
        }
    }
}

/// Scheduler plus API until Ctrl-C.
///
/// An invalid configuration still serves the API so `/api/status` can show
/// what is missing, but no passes are scheduled.
async fn start(cfg: Config) -> anyhow::Result<()> {
    info!("{} starting", cfg.planner.name);

    let (gw, problems) = api_gateway(&cfg);
    if gw.is_none() {
        for p in &problems {
            warn!("config: {p}");
        }
        warn!("config: invalid, passes will not be scheduled");
    }

    let mut handles = Vec::new();

    match &gw {
        Some(gw) if cfg.scheduler.enabled => {
            let cron = config::parse_cron(&cfg.scheduler.cron)?;
            let expression = cfg.scheduler.cron.trim().to_string();
            handles.push(tokio::spawn(gw.clone().scheduler_loop(cron, expression)));
        }
        Some(_) => info!("scheduler: disabled in config"),
        None => {}
    }

    if cfg.api.enabled {
        let mut info = api::StatusInfo::from_config(&cfg);
        info.problems = problems;
        let state = api::ApiState::new(gw.clone(), info, &cfg.api.secret);
        handles.push(tokio::spawn(api::serve(cfg.api.clone(), state)));
    }

    if handles.is_empty() {
        anyhow::bail!("nothing to run: scheduler and API are both unavailable");
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    for h in handles {
        h.abort();
    }
    Ok(())
}

fn status(path: &str, cfg: &Config) {
    println!("{} status\n", cfg.planner.name);
    println!("Config: {path}");

    let info = api::StatusInfo::from_config(cfg);
    for (key, set) in &info.env {
        println!("  {key}: {}", if *set { "set" } else { "missing" });
    }
    println!();
    println!("Timezone: {}", info.timezone);
    println!("Recipient: {}", cfg.planner.recipient_name);
    println!("Provider: {}", cfg.provider.default);
    println!(
        "Scheduler: {} ({})",
        if info.scheduler_enabled { "enabled" } else { "disabled" },
        info.cron_schedule
    );
    println!(
        "API: {}",
        if cfg.api.enabled {
            format!("{}:{}", cfg.api.host, cfg.api.port)
        } else {
            "disabled".to_string()
        }
    );

    let next = match (cfg.timezone(), config::parse_cron(&cfg.scheduler.cron)) {
        (Ok(tz), Ok(cron)) => gateway::next_run(&cron, tz, chrono::Utc::now()),
        _ => None,
    };
    if let Some(next) = next {
        println!(
            "Next pass: {} ({})",
            next.format("%Y-%m-%d %H:%M %Z"),
            weekday_name(chrono::Datelike::weekday(&next))
        );
    }

    println!();
    if info.problems.is_empty() {
        println!("Configuration OK");
    } else {
        println!("Problems:");
        for p in &info.problems {
            println!("  - {p}");
        }
    }
}
