use anyhow::Context;
use clap::Parser;
use groupq::cli::{Cli, Commands, Shell};
use groupq::state::Config;
use tokio::io::BufReader;
use tracing::{info, warn};

fn init_tracing(verbose: bool, config: &Config) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("groupq=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.log_filter.as_deref().unwrap_or("groupq=info,warn"))
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignores if missing)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref())?;
    init_tracing(cli.verbose, &config);

    let mut shell = Shell::new(config).with_journal(cli.journal);

    let failures = match cli.command {
        Commands::Run { script } => {
            info!(script = %script.display(), "running script");
            let file = tokio::fs::File::open(&script)
                .await
                .with_context(|| format!("Failed to open script {:?}", script))?;
            shell
                .run_lines(BufReader::new(file), |out| println!("{}", out))
                .await?
        }
        Commands::Repl => {
            shell
                .run_lines(BufReader::new(tokio::io::stdin()), |out| println!("{}", out))
                .await?
        }
    };

    if failures > 0 {
        warn!(failures, "some commands failed");
    }

    Ok(())
}
