use std::path::PathBuf;

use clap::Parser;
use web_time::Duration;

use crate::app::run_panel;
use crate::config::PanelConfig;
use crate::error::{AppError, Result};
use crate::logging;

#[derive(Debug, Parser)]
#[command(
    name = "ricebar",
    about = "Headless status bar: logs every widget change on simulated services",
    version
)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stop after this many seconds. Runs until killed otherwise.
    #[arg(long, value_name = "N")]
    pub duration_secs: Option<u64>,

    /// Log JSON lines instead of text.
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    pub fn duration(&self) -> Result<Option<Duration>> {
        match self.duration_secs {
            Some(0) => Err(AppError::invalid("--duration-secs must be positive")),
            Some(secs) => Ok(Some(Duration::from_secs(secs))),
            None => Ok(None),
        }
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let duration = cli.duration()?;
    let config = PanelConfig::load(cli.config.as_deref())?;
    logging::init(cli.log_json)?;
    run_panel(&config, duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_flag() {
        let cli = Cli::try_parse_from([
            "ricebar",
            "--config",
            "/tmp/bar.toml",
            "--duration-secs",
            "3",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/bar.toml")));
        assert_eq!(cli.duration().unwrap(), Some(Duration::from_secs(3)));
        assert!(cli.log_json);
    }

    #[test]
    fn defaults_run_forever_as_text() {
        let cli = Cli::try_parse_from(["ricebar"]).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(cli.duration().unwrap(), None);
        assert!(!cli.log_json);
    }

    #[test]
    fn zero_duration_is_rejected() {
        let cli = Cli::try_parse_from(["ricebar", "--duration-secs", "0"]).unwrap();
        assert!(matches!(cli.duration(), Err(AppError::InvalidConfig { .. })));
    }

    #[test]
    fn negative_duration_does_not_parse() {
        assert!(Cli::try_parse_from(["ricebar", "--duration-secs", "-1"]).is_err());
    }
}
