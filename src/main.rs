//! Setconf - set-style configuration engine
//!
//! This is the main entry point for the Setconf CLI.

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use setconf::config::{Config, LoggingConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config = Config::load(cli.config.as_ref())?;

    // Initialize logging based on verbosity
    init_logging(cli.verbosity(), &config.logging);

    if cli.verbosity() >= 2 {
        tracing::debug!("setconf v{}", VERSION);
    }

    let mut ctx = CommandContext::new(&cli, config);

    let result = match &cli.command {
        Commands::Render(args) => args.execute(&mut ctx),
        Commands::Parse(args) => args.execute(&mut ctx),
        Commands::Drift(args) => args.execute(&mut ctx),
        Commands::Apply(args) => args.execute(&mut ctx),
    };

    match result {
        Ok(code) => Ok(code),
        Err(err) => {
            ctx.output.error(&format!("{:#}", err));
            Ok(exit_code_for(&err))
        }
    }
}

/// Exit status for an error, using the library's classification when available
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<setconf::Error>()
        .map_or(1, setconf::Error::exit_code)
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8, logging: &LoggingConfig) {
    let filter = match verbosity {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let json_layer = logging
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!logging.json).then(|| {
        fmt::layer()
            .with_target(verbosity >= 3)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(text_layer)
        .with(env_filter)
        .init();
}
