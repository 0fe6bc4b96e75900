use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use weather_brief::{BriefConfig, BriefError, LivePipeline, Summary};

#[derive(Debug, Parser)]
#[command(name = "weather-brief", version, about = "Summarize today's daytime weather forecast.")]
struct Cli {
    /// Directory holding config.json, template.txt and .env
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

async fn run(cli: &Cli) -> Result<Summary, BriefError> {
    let config = BriefConfig::load(&cli.dir)?;
    debug!(
        "Loaded configuration for {}, {} from {}",
        config.latitude,
        config.longitude,
        cli.dir.display()
    );

    LivePipeline::from_config(&config, &cli.dir)?.run().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::from_path(cli.dir.join(".env")).ok();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{}", e.user_message());
            ExitCode::from(e.exit_code())
        }
    }
}
