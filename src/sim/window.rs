//! Calendar windows over an hourly series.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::types::{HOURS_PER_DAY, HOURS_PER_WEEK};

/// Treatment of the hours left over after the last full 168-hour week.
///
/// A non-leap year has 52 full weeks plus 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WeekBoundary {
    /// Drop the trailing hours; only full weeks count.
    #[default]
    Truncate,
    /// Append the trailing hours to the last full week.
    FoldIntoLast,
    /// Keep the trailing hours as a short final week.
    PartialWeek,
}

/// Consecutive 24-hour windows; a trailing partial day is kept as its own window.
pub fn daily_windows(len: usize) -> Vec<Range<usize>> {
    chunk_windows(len, HOURS_PER_DAY)
}

/// Consecutive 168-hour windows with the tail handled per `boundary`.
///
/// A series shorter than one week yields no window under
/// [`WeekBoundary::Truncate`] and a single short window otherwise.
pub fn weekly_windows(len: usize, boundary: WeekBoundary) -> Vec<Range<usize>> {
    let full = len / HOURS_PER_WEEK;
    let mut windows: Vec<Range<usize>> = (0..full)
        .map(|w| w * HOURS_PER_WEEK..(w + 1) * HOURS_PER_WEEK)
        .collect();
    let tail_start = full * HOURS_PER_WEEK;
    if tail_start == len {
        return windows;
    }

    match boundary {
        WeekBoundary::Truncate => {}
        WeekBoundary::FoldIntoLast => match windows.last_mut() {
            Some(last) => last.end = len,
            None => windows.push(0..len),
        },
        WeekBoundary::PartialWeek => windows.push(tail_start..len),
    }
    windows
}

fn chunk_windows(len: usize, size: usize) -> Vec<Range<usize>> {
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::HOURS_PER_YEAR;

    #[test]
    fn year_has_365_days() {
        let days = daily_windows(HOURS_PER_YEAR);
        assert_eq!(days.len(), 365);
        assert_eq!(days[364], 8736..8760);
    }

    #[test]
    fn partial_day_is_kept() {
        let days = daily_windows(50);
        assert_eq!(days, vec![0..24, 24..48, 48..50]);
    }

    #[test]
    fn truncate_drops_trailing_day() {
        let weeks = weekly_windows(HOURS_PER_YEAR, WeekBoundary::Truncate);
        assert_eq!(weeks.len(), 52);
        assert_eq!(weeks.last(), Some(&(8568..8736)));
    }

    #[test]
    fn fold_extends_last_week() {
        let weeks = weekly_windows(HOURS_PER_YEAR, WeekBoundary::FoldIntoLast);
        assert_eq!(weeks.len(), 52);
        assert_eq!(weeks.last(), Some(&(8568..8760)));
    }

    #[test]
    fn partial_week_adds_53rd_window() {
        let weeks = weekly_windows(HOURS_PER_YEAR, WeekBoundary::PartialWeek);
        assert_eq!(weeks.len(), 53);
        assert_eq!(weeks.last(), Some(&(8736..8760)));
    }

    #[test]
    fn exact_weeks_ignore_boundary() {
        for b in [
            WeekBoundary::Truncate,
            WeekBoundary::FoldIntoLast,
            WeekBoundary::PartialWeek,
        ] {
            assert_eq!(weekly_windows(336, b), vec![0..168, 168..336]);
        }
    }

    #[test]
    fn short_series_weeks() {
        assert!(weekly_windows(100, WeekBoundary::Truncate).is_empty());
        assert_eq!(weekly_windows(100, WeekBoundary::FoldIntoLast), vec![0..100]);
        assert_eq!(weekly_windows(100, WeekBoundary::PartialWeek), vec![0..100]);
    }
}
