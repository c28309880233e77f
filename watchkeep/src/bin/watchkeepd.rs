//! The `watchkeepd` process entrypoint: wires configuration, the Docker
//! runtime adapter, and the scheduler together and drives the process exit
//! code.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;
use tracing_subscriber::EnvFilter;
use watchkeep::Coordinator;
use watchkeep::Scheduler;
use watchkeep_config::AppConfig;
use watchkeep_runtime::Docker;
use watchkeep_runtime::HttpRegistryProber;

/// Command-line arguments for `watchkeepd`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the configuration file.
    ///
    /// Defaults to `watchkeep.env` in the current directory. A missing file
    /// is not an error; defaults are used instead.
    #[arg(short, long, default_value = watchkeep_config::FILE_NAME)]
    config: PathBuf,

    /// Runs a single check-and-replace pass and exits, ignoring the
    /// configured cron schedule.
    #[arg(long)]
    once: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

/// Initializes tracing, preferring (in order) `RUST_LOG`, an explicit CLI
/// verbosity flag, the configured `LOG_LEVEL`, and finally `INFO`.
fn init_tracing(verbose: &Verbosity, config_level: tracing::Level) {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
        return;
    }

    let cli_filter = verbose.log_level_filter().as_trace();
    let max_level = if cli_filter != LevelFilter::ERROR {
        cli_filter
    } else {
        LevelFilter::from_level(config_level)
    };

    tracing_subscriber::fmt().with_max_level(max_level).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match AppConfig::load(&args.config).context("failed to load configuration") {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&args.verbose, config.log_level());

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: AppConfig) -> anyhow::Result<()> {
    let runtime = Docker::connect().context("container runtime unavailable")?;
    let prober = HttpRegistryProber::new();

    let coordinator = Coordinator::new(args.config.clone(), Box::new(runtime), Box::new(prober));

    if args.once || !config.schedule().is_viable() {
        coordinator.run_once().await?;
        return Ok(());
    }

    let cancellation = tokio_util::sync::CancellationToken::new();
    let signal = {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            cancellation.cancel();
        })
    };

    let scheduler = Scheduler::new(config.schedule().clone(), coordinator);
    let result = scheduler.run(cancellation).await;

    signal.abort();
    result
}
