//! `tdp fetch` command implementation
//!
//! Resolves the month range from the CLI arguments and drives the staged
//! fetcher over it.

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::fetch::{Fetcher, FetchSummary};
use crate::layout::Period;
use std::path::PathBuf;

/// Arguments accepted by the fetch command
#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub dataset: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub raw_root: String,
}

/// Run the fetch stage over the resolved range
pub async fn run(args: FetchArgs) -> Result<FetchSummary> {
    let (start, end) = resolve_range(&args)?;
    let raw_root = PathBuf::from(&args.raw_root);

    let fetcher = Fetcher::new(Config::from_env())?;
    fetcher
        .fetch_range(&raw_root, &args.dataset, start, end)
        .await
}

/// Resolve `--year [--month]` or `--from/--to` into an inclusive range
fn resolve_range(args: &FetchArgs) -> Result<(Period, Period)> {
    match (args.year, args.month, &args.from, &args.to) {
        (Some(year), Some(month), None, None) => {
            validate_month(month)?;
            let period = Period::new(year, month);
            Ok((period, period))
        },
        (Some(year), None, None, None) => {
            Ok((Period::new(year, 1), Period::new(year, 12)))
        },
        (None, None, Some(from), Some(to)) => {
            let start = parse_year_month(from)?;
            let end = parse_year_month(to)?;
            if (start.year, start.month) > (end.year, end.month) {
                return Err(CliError::invalid_range(format!(
                    "--from {} is after --to {}",
                    start, end
                )));
            }
            Ok((start, end))
        },
        (None, Some(_), _, _) => Err(CliError::invalid_range("--month requires --year")),
        _ => Err(CliError::invalid_range(
            "specify either --year [--month] or both --from and --to",
        )),
    }
}

fn parse_year_month(s: &str) -> Result<Period> {
    let (year, month) = s
        .split_once('-')
        .ok_or_else(|| CliError::invalid_range(format!("expected YYYY-MM, got '{}'", s)))?;
    let year: i32 = year
        .parse()
        .map_err(|_| CliError::invalid_range(format!("invalid year in '{}'", s)))?;
    let month: u32 = month
        .parse()
        .map_err(|_| CliError::invalid_range(format!("invalid month in '{}'", s)))?;
    validate_month(month)?;
    Ok(Period::new(year, month))
}

fn validate_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(CliError::invalid_range(format!(
            "month must be 1-12, got {}",
            month
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn args(
        year: Option<i32>,
        month: Option<u32>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> FetchArgs {
        FetchArgs {
            dataset: "demo".to_string(),
            year,
            month,
            from: from.map(String::from),
            to: to.map(String::from),
            raw_root: "/tmp/raw".to_string(),
        }
    }

    #[test]
    fn test_single_month() {
        let (start, end) = resolve_range(&args(Some(2024), Some(3), None, None)).unwrap();
        assert_eq!(start, Period::new(2024, 3));
        assert_eq!(end, Period::new(2024, 3));
    }

    #[test]
    fn test_full_year() {
        let (start, end) = resolve_range(&args(Some(2024), None, None, None)).unwrap();
        assert_eq!(start, Period::new(2024, 1));
        assert_eq!(end, Period::new(2024, 12));
    }

    #[test]
    fn test_from_to_range() {
        let (start, end) =
            resolve_range(&args(None, None, Some("2023-11"), Some("2024-02"))).unwrap();
        assert_eq!(start, Period::new(2023, 11));
        assert_eq!(end, Period::new(2024, 2));
    }

    #[test]
    fn test_month_without_year_rejected() {
        assert!(resolve_range(&args(None, Some(3), None, None)).is_err());
    }

    #[test]
    fn test_from_without_to_rejected() {
        assert!(resolve_range(&args(None, None, Some("2024-01"), None)).is_err());
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(resolve_range(&args(None, None, Some("2024-05"), Some("2024-01"))).is_err());
    }

    #[test]
    fn test_month_out_of_bounds_rejected() {
        assert!(resolve_range(&args(Some(2024), Some(13), None, None)).is_err());
        assert!(resolve_range(&args(None, None, Some("2024-00"), Some("2024-01"))).is_err());
    }
}
