//! Command-line argument parsing for the composition-root binary.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "vocora", version, about = "Real-time voice assistant pipeline")]
pub struct Cli {
    /// Path to a TOML config file. Missing fields fall back to defaults;
    /// a missing file entirely is not an error — the binary simply runs
    /// with defaults plus environment overrides.
    #[arg(long, env = "VOCORA_CONFIG")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_config_flag_defaults_to_none() {
        let cli = Cli::parse_from(["vocora"]);
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_sets_path() {
        let cli = Cli::parse_from(["vocora", "--config", "/etc/vocora.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/vocora.toml")));
    }
}
