//! rulecheck - Linter for proxy routing rule lists and configuration

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use rulecheck::diagnostic::{OutputFormat, EXIT_FATAL};
use rulecheck::discovery::discover_root;
use rulecheck::runner::Runner;
use rulecheck::settings::{Settings, DEFAULT_CONFIG_PATH};
use rulecheck::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity; stdout is reserved for diagnostics
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            println!("[ERROR] fatal: {:#}", e);
            std::process::exit(EXIT_FATAL);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let root = match cli.root {
        Some(ref root) => root.clone(),
        None => {
            let config_path = cli
                .config
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());
            discover_root(&config_path)
        }
    };

    let settings = match cli.settings {
        Some(ref path) => Settings::load(path)?,
        None => Settings::load_from_root(&root)?,
    }
    .with_overrides(cli.config, cli.reachability, cli.timeout)?;

    let runner = Runner::new(&root, settings);
    debug!("Root directory: {}", runner.root().display());

    let report = runner.run().await?;
    print!("{}", report.render(cli.format)?);
    if cli.format == OutputFormat::Json {
        println!();
    }

    Ok(report.exit_code())
}
