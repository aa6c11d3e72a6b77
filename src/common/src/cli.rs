use clap::Parser;
use std::path::PathBuf;

/// Arguments shared by every fixture command
#[derive(Parser, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::ConfigResolver;

    pub fn log_level(args: &CommonArgs) -> &'static str {
        if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Initialize logging based on CLI arguments
    pub fn init_logging(args: &CommonArgs) {
        crate::logging::init_logging(log_level(args));
    }

    /// Resolver honouring `--config` over `TRINO_TEST_CONFIG`
    pub fn resolver(args: &CommonArgs) -> ConfigResolver {
        ConfigResolver::from_path(args.config.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_flags() {
        let mut args = CommonArgs::default();
        assert_eq!(utils::log_level(&args), "info");

        args.verbose = true;
        assert_eq!(utils::log_level(&args), "debug");

        args.quiet = true;
        assert_eq!(utils::log_level(&args), "warn");
    }

    #[test]
    fn test_parse_common_args() {
        let args = CommonArgs::parse_from(["trino-fixture", "--config", "ci.toml", "-v"]);
        assert_eq!(args.config, Some(PathBuf::from("ci.toml")));
        assert!(args.verbose);
        assert!(!args.quiet);
    }
}
