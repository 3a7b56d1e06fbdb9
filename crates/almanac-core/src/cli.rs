use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::views::ViewMode;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Almanac: month, week, day and agenda layouts for calendar events"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Path to almanac.toml
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// JSON file holding the event records
    #[arg(long = "events")]
    pub events: Option<PathBuf>,

    /// Focus date: today, tomorrow, monday, march, +2w, 2024-03-06 ...
    #[arg(long = "date", default_value = "today")]
    pub date: String,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long = "today")]
    pub today: Option<String>,

    /// Move the focus by this many periods of the chosen view
    #[arg(long = "shift", default_value_t = 0, allow_negative_numbers = true)]
    pub shift: i64,

    /// Print the layout as JSON
    #[arg(long = "json")]
    pub json: bool,

    #[arg(value_enum)]
    pub view: Option<ViewMode>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_and_overrides() {
        let cli = GlobalCli::parse_from([
            "almanac",
            "-vv",
            "--rc",
            "policies.week_start=monday",
            "--shift",
            "-2",
            "--json",
            "week",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.view, Some(ViewMode::Week));
        assert_eq!(cli.shift, -2);
        assert!(cli.json);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert_eq!(cli.rc_overrides[0].key, "policies.week_start");
        assert_eq!(cli.rc_overrides[0].value, "monday");
    }

    #[test]
    fn view_is_optional() {
        let cli = GlobalCli::parse_from(["almanac"]);
        assert_eq!(cli.view, None);
        assert_eq!(cli.date, "today");
    }

    #[test]
    fn key_val_requires_equals() {
        assert!("week_start".parse::<KeyVal>().is_err());
    }
}
