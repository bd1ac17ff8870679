//! Command-line arguments for `smarthqd`.

use std::path::PathBuf;

use clap::Parser;

use smarthq_config::Config;

/// Bridge the SmartHQ appliance event stream to a local HTTP API.
#[derive(Debug, Parser)]
#[command(name = "smarthqd", version, about)]
pub struct Cli {
    /// TOML configuration file. Settings can also come from SMARTHQ_* variables.
    #[arg(long, short = 'c', env = "SMARTHQ_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Override the HTTP bind address.
    #[arg(long, value_name = "ADDR")]
    pub host: Option<String>,

    /// Override the HTTP port.
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<u16>,
}

impl Cli {
    /// Flags win over file and environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
    }

    /// Default tracing filter: the configured level, raised by `-v`.
    pub fn log_filter<'a>(&self, configured: &'a str) -> &'a str {
        match self.verbose {
            0 => configured,
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from(["smarthqd", "--host", "127.0.0.1", "-p", "9000", "-vv"])
            .unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(cli.log_filter("info"), "trace");
    }

    #[test]
    fn configured_level_without_flags() {
        let cli = Cli::try_parse_from(["smarthqd"]).unwrap();
        assert_eq!(cli.log_filter("warn"), "warn");
    }
}
