mod surface;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use loansim_core::config::Config;
use loansim_core::decision::RngDecider;
use loansim_core::ledger::Ledger;
use loansim_core::scheduler;
use std::path::PathBuf;
use surface::WebDriverSurface;
use tracing::info;
use webdriver_client::{Session, SessionConfig};

#[derive(Parser)]
#[command(
    name = "loansim",
    about = "Soak-test a loan application UI with chaotic simulated applicants",
    version
)]
struct Cli {
    /// YAML config file (defaults are used when omitted)
    #[arg(long, env = "LOANSIM_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger file override
    #[arg(long, env = "LOANSIM_LEDGER")]
    ledger: Option<PathBuf>,

    /// Target application URL override
    #[arg(long, env = "LOANSIM_TARGET_URL")]
    target_url: Option<String>,

    /// WebDriver endpoint (e.g. a local chromedriver)
    #[arg(
        long,
        env = "LOANSIM_WEBDRIVER_URL",
        default_value = "http://localhost:9515"
    )]
    webdriver_url: String,

    /// Run the browser windowed instead of headless
    #[arg(long)]
    headed: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(path) = cli.ledger {
        config.ledger_path = path;
    }
    if let Some(url) = cli.target_url {
        config.target_url = url;
    }

    info!("starting browser session via {}", cli.webdriver_url);
    let session = Session::start(SessionConfig {
        webdriver_url: cli.webdriver_url,
        headless: !cli.headed,
        ..SessionConfig::default()
    })
    .context("could not start a WebDriver session")?;
    let mut surface = WebDriverSurface::new(session, config.state_key.clone());

    let mut ledger = Ledger::load(&config.ledger_path);
    let mut decider = RngDecider::new();
    let outcome = scheduler::run_once(&config, &mut ledger, &mut surface, &mut decider, Utc::now());

    // The ledger is written and the session torn down on every exit path;
    // a failed save still tears down before surfacing the error.
    let saved = ledger.save();
    surface.teardown();
    saved.context("could not persist the ledger")?;

    info!(
        "run complete: {} actor(s) handled, spawned={}",
        outcome.handled, outcome.spawned
    );
    Ok(())
}
