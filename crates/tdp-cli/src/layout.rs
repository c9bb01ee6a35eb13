//! Canonical on-disk layout for fetched partitions
//!
//! One partition `(dataset, year, month)` maps deterministically to a final
//! path under the raw root, with a parallel `_incoming` staging tree for
//! in-flight downloads. Within staging a partition is either a `.partial`
//! file (actively being written) or the staged filename (downloaded,
//! awaiting promotion).

use crate::config::{DATA_EXTENSION, SOURCE_TAG};
use std::path::{Path, PathBuf};

/// One year/month period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period {
    pub year: i32,
    /// Month in 1..=12
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The following month, wrapping December into the next year
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive iterator over periods in chronological order
#[derive(Debug, Clone)]
pub struct PeriodRange {
    next: Option<Period>,
    end: Period,
}

impl PeriodRange {
    /// Iterate from `start` to `end` inclusive; empty if `start > end`
    pub fn inclusive(start: Period, end: Period) -> Self {
        let next = if (start.year, start.month) <= (end.year, end.month) {
            Some(start)
        } else {
            None
        };
        Self { next, end }
    }
}

impl Iterator for PeriodRange {
    type Item = Period;

    fn next(&mut self) -> Option<Period> {
        let current = self.next?;
        self.next = if current == self.end {
            None
        } else {
            Some(current.next())
        };
        Some(current)
    }
}

/// Resolved paths for one partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPaths {
    /// Canonical final location
    pub final_path: PathBuf,
    /// Staged file (fully downloaded, awaiting promotion)
    pub staged_path: PathBuf,
    /// In-flight download target
    pub partial_path: PathBuf,
}

/// Compute the canonical and staging paths for one partition
pub fn partition_paths(raw_root: &Path, dataset: &str, period: Period) -> PartitionPaths {
    let file_name = format!(
        "{}_{:04}-{:02}.{}",
        dataset, period.year, period.month, DATA_EXTENSION
    );
    let subtree = PathBuf::from(format!("source={}", SOURCE_TAG))
        .join(format!("dataset={}", dataset))
        .join(format!("year={:04}", period.year))
        .join(format!("month={:02}", period.month));

    let final_path = raw_root.join(&subtree).join(&file_name);
    let staging_dir = raw_root.join("_incoming").join(&subtree);
    let staged_path = staging_dir.join(&file_name);
    let partial_path = staging_dir.join(format!("{}.partial", file_name));

    PartitionPaths {
        final_path,
        staged_path,
        partial_path,
    }
}

/// Relative path of `path` under `raw_root`, with forward slashes
///
/// Used as the ledger registry key, so it must be stable across platforms.
pub fn posix_relative(path: &Path, raw_root: &Path) -> Option<String> {
    let rel = path.strip_prefix(raw_root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_period_next_wraps_december() {
        assert_eq!(Period::new(2023, 12).next(), Period::new(2024, 1));
        assert_eq!(Period::new(2024, 1).next(), Period::new(2024, 2));
    }

    #[test]
    fn test_period_range_inclusive() {
        let periods: Vec<Period> =
            PeriodRange::inclusive(Period::new(2023, 11), Period::new(2024, 2)).collect();
        assert_eq!(
            periods,
            vec![
                Period::new(2023, 11),
                Period::new(2023, 12),
                Period::new(2024, 1),
                Period::new(2024, 2),
            ]
        );
    }

    #[test]
    fn test_period_range_single_month() {
        let periods: Vec<Period> =
            PeriodRange::inclusive(Period::new(2024, 6), Period::new(2024, 6)).collect();
        assert_eq!(periods, vec![Period::new(2024, 6)]);
    }

    #[test]
    fn test_period_range_empty_when_reversed() {
        let mut range = PeriodRange::inclusive(Period::new(2024, 2), Period::new(2024, 1));
        assert!(range.next().is_none());
    }

    #[test]
    fn test_partition_paths_layout() {
        let paths = partition_paths(
            Path::new("/data/raw"),
            "yellow_tripdata",
            Period::new(2024, 3),
        );
        assert_eq!(
            paths.final_path,
            Path::new("/data/raw/source=tlc/dataset=yellow_tripdata/year=2024/month=03/yellow_tripdata_2024-03.parquet")
        );
        assert_eq!(
            paths.staged_path,
            Path::new("/data/raw/_incoming/source=tlc/dataset=yellow_tripdata/year=2024/month=03/yellow_tripdata_2024-03.parquet")
        );
        assert_eq!(
            paths.partial_path,
            Path::new("/data/raw/_incoming/source=tlc/dataset=yellow_tripdata/year=2024/month=03/yellow_tripdata_2024-03.parquet.partial")
        );
    }

    #[test]
    fn test_posix_relative() {
        let root = Path::new("/data/raw");
        let file = Path::new("/data/raw/source=tlc/dataset=demo/year=2024/month=01/demo_2024-01.parquet");
        assert_eq!(
            posix_relative(file, root).unwrap(),
            "source=tlc/dataset=demo/year=2024/month=01/demo_2024-01.parquet"
        );
        assert!(posix_relative(Path::new("/elsewhere/x"), root).is_none());
    }
}
