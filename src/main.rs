use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kayak_fares::adapters::chromium::session::ChromiumSession;
use kayak_fares::adapters::site::driver::run_with_session;
use kayak_fares::config::load_config;
use kayak_fares::domain::alerts::PriceAlertSystem;
use kayak_fares::domain::run::RunResult;
use kayak_fares::domain::search::{DEFAULT_MONTHS, DEFAULT_TOP, SearchMode, SearchRequest};
use kayak_fares::report::summary::{alert_digest, create_alert_summary};
use kayak_fares::report::{ReportWriter, export};

const CONFIG_FILE: &str = "kayak-fares.yaml";

#[derive(Parser)]
#[command(
    name = "kayak-fares",
    version,
    about = "Scrape flight prices from kayak.fr and write JSON, CSV, HTML and SVG reports"
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Config file (default: kayak-fares.yaml)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    #[command(about = "Average, min and max price for each of the coming months")]
    Months {
        #[arg(help = "Departure city or airport")]
        origin: String,
        #[arg(help = "Arrival city or airport")]
        destination: String,
        #[arg(long, default_value_t = DEFAULT_MONTHS, value_name = "N", help = "Months to scan")]
        months: u32,
        #[arg(long, default_value_t = 1, value_name = "N", help = "Number of adult passengers")]
        adults: u32,
    },
    #[command(about = "Top flight cards for one round trip")]
    Flights {
        #[arg(help = "Departure city or airport")]
        origin: String,
        #[arg(help = "Arrival city or airport")]
        destination: String,
        #[arg(long, value_name = "YYYY-MM-DD", help = "Outbound date")]
        depart: NaiveDate,
        #[arg(long = "return", value_name = "YYYY-MM-DD", help = "Return date")]
        return_date: NaiveDate,
        #[arg(long, default_value_t = DEFAULT_TOP, value_name = "N", help = "Cards to extract")]
        top: usize,
        #[arg(long, default_value_t = 1, value_name = "N", help = "Number of adult passengers")]
        adults: u32,
    },
    #[command(about = "Rebuild reports from a previously exported JSON file")]
    Report {
        #[arg(value_name = "JSON")]
        input: PathBuf,
    },
}

fn find_config_path() -> PathBuf {
    let candidates = [PathBuf::from(CONFIG_FILE), exe_dir().join(CONFIG_FILE)];

    for path in &candidates {
        if path.exists() {
            return path.clone();
        }
    }

    candidates[0].clone()
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs on stderr, summaries on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(find_config_path);
    let config = load_config(&config_path)?;
    config.validate()?;

    let request = match cli.command {
        Commands::Months {
            origin,
            destination,
            months,
            adults,
        } => SearchRequest {
            adults,
            mode: SearchMode::MonthOffset { months },
            ..SearchRequest::months(origin, destination)
        },
        Commands::Flights {
            origin,
            destination,
            depart,
            return_date,
            top,
            adults,
        } => SearchRequest {
            adults,
            ..SearchRequest::fixed_range(origin, destination, depart, return_date, top)
        },
        Commands::Report { input } => {
            let run = export::read_json(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            report(&run, &config.output.dir, config.alerts.threshold, "Reports rebuilt")?;
            return Ok(());
        }
    };
    request.validate(Local::now().date_naive())?;

    tracing::info!(
        origin = %request.origin,
        destination = %request.destination,
        "Starting kayak-fares scrape"
    );

    let http = reqwest::Client::builder()
        .timeout(config.timeouts.page_load())
        .build()
        .context("failed to build HTTP client for endpoint discovery")?;
    let session = ChromiumSession::start(&config.browser, &http).await?;

    let Some(run) = run_with_session(session, &config, &request).await? else {
        tracing::warn!("No data collected, nothing to export");
        return Ok(());
    };

    report(&run, &config.output.dir, config.alerts.threshold, "Reports written")
}

/// Check alerts once, then write every artifact and print the summaries.
fn report(run: &RunResult, dir: &Path, threshold: f64, done: &str) -> Result<()> {
    let mut alerts = PriceAlertSystem::new(threshold);
    alerts.check_prices(run);

    let artifacts = ReportWriter::new(dir).export_all(run, alerts.alerts(), alerts.threshold())?;
    tracing::info!(?artifacts, "{done}");

    print!("{}", create_alert_summary(run, alerts.alerts(), alerts.threshold()));
    if let Some(digest) = alert_digest(alerts.alerts()) {
        print!("{digest}");
    }
    Ok(())
}
