//! compline - declarative shell completion
//!
//! # Usage
//!
//! ```bash
//! # Complete the last word of a command line
//! compline complete --spec pkg -- pkg --install v
//!
//! # Inspect how a line was understood
//! compline explain --spec pkg -- pkg --install v
//!
//! # Hook registered commands into the shell
//! eval "$(compline completion bash)"
//! compline_register pkg
//! ```

use tracing_subscriber::EnvFilter;

use compline::cli::CliInterface;
use compline::error::Result;

/// Environment variable overriding the log filter
const LOG_ENV: &str = "COMPLINE_LOG";

/// Application entry point
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Run the subcommand
///
/// # Returns
/// * `Result<()>` - Success or error
fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.run()
}

/// Initialize logging system based on verbosity level
///
/// Logs go to stderr so that completion output on stdout stays clean.
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().as_directive()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
