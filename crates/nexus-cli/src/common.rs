//! Common types and utilities shared across the binaries

use clap::Parser;
use nexus_logger as logger;
use tracing_subscriber::EnvFilter;

/// Global CLI options available to both tools
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug, -vv for trace)")]
    pub verbose: u8,
}

impl GlobalOpts {
    /// - 0: quiet
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// Set up the file logger and the `tracing` subscriber used by the library crates.
///
/// Both write to stderr only, and only above the default level, so a quiet run
/// leaves stdout and stderr to the tool's own output.
pub fn init_logging(opts: &GlobalOpts) {
    let verbosity = opts.verbosity_level();
    if let Err(e) = logger::init_with_verbosity(verbosity) {
        if verbosity > 0 {
            eprintln!("Warning: Failed to initialize logger: {}", e);
        }
    }

    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins_over_verbose() {
        let opts = GlobalOpts {
            quiet: true,
            verbose: 2,
        };
        assert_eq!(opts.verbosity_level(), 0);
        let opts = GlobalOpts {
            quiet: false,
            verbose: 1,
        };
        assert_eq!(opts.verbosity_level(), 1);
    }
}
