use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use super::params::parse_date;

/// Fetch Irish balancing-market imbalance prices and volumes for one day.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Settlement date (YYYY-MM-DD). Defaults to today in Irish time.
    #[arg(short, long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Path to the config file (imbalance.toml). Built-in defaults otherwise.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory to write `imbalance_{date}.csv` into.
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Print only the summary, not the interval table.
    #[arg(long)]
    pub summary_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_arguments_are_optional() {
        let cli = Cli::try_parse_from(["imbalance"]).unwrap();
        assert!(cli.date.is_none());
        assert!(cli.config.is_none());
        assert!(cli.export.is_none());
    }

    #[test]
    fn parses_date_and_paths() {
        let cli = Cli::try_parse_from([
            "imbalance",
            "--date",
            "2024-01-15",
            "--config",
            "imbalance.toml",
            "-e",
            "out",
        ])
        .unwrap();
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(cli.config, Some(PathBuf::from("imbalance.toml")));
        assert_eq!(cli.export, Some(PathBuf::from("out")));
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(Cli::try_parse_from(["imbalance", "--date", "15/01/2024"]).is_err());
    }
}
