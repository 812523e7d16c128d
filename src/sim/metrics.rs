//! Post-hoc fleet reliability metrics.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

use crate::error::ValidationError;

use super::types::FleetSnapshot;
use super::window::{WeekBoundary, daily_windows, weekly_windows};

/// Windows meeting a criterion out of all windows considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowCount {
    pub met: usize,
    pub total: usize,
}

impl WindowCount {
    /// `met / total`, or `0.0` when there are no windows.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.met as f64 / self.total as f64
        }
    }
}

impl fmt::Display for WindowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.1}%)",
            self.met,
            self.total,
            100.0 * self.fraction()
        )
    }
}

/// Availability at one output threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdAvailability {
    pub threshold_gw: f64,
    /// Hours with output >= threshold.
    pub hourly: WindowCount,
    /// Days whose mean output >= threshold.
    pub daily: WindowCount,
    /// Weeks whose mean output >= threshold.
    pub weekly: WindowCount,
    /// Days in which every single hour reached the threshold.
    pub days_all_hours: WindowCount,
}

/// One hour of the fleet series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourValue {
    pub hour: usize,
    pub output_gw: f64,
}

/// One weekly window of the fleet series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeekValue {
    /// 0-based week index.
    pub week: usize,
    pub start_hour: usize,
    pub end_hour: usize,
    pub mean_output_gw: f64,
}

/// Aggregate reliability indicators derived from a fleet output series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityMetrics {
    pub target_gw: f64,
    pub hours: usize,
    pub mean_output_gw: f64,
    /// Sum of hourly output (GWh).
    pub total_energy_gwh: f64,
    /// Delivered energy over `target * hours`.
    pub energy_fraction_of_target: f64,
    pub worst_hour: HourValue,
    /// Lowest-mean weekly window, `None` when no window exists.
    pub worst_week: Option<WeekValue>,
    pub week_boundary: WeekBoundary,
    pub thresholds: Vec<ThresholdAvailability>,
}

impl ReliabilityMetrics {
    /// Computes all metrics from the fleet series.
    ///
    /// # Arguments
    ///
    /// * `fleet` - Hourly fleet output
    /// * `target_gw` - Fleet target used for the energy ratio
    /// * `thresholds_gw` - Output levels to evaluate; exact duplicates are evaluated once
    /// * `week_boundary` - Treatment of hours past the last full week
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty series, a non-positive
    /// target, or a non-positive threshold.
    pub fn compute(
        fleet: &[FleetSnapshot],
        target_gw: f64,
        thresholds_gw: &[f64],
        week_boundary: WeekBoundary,
    ) -> Result<Self, ValidationError> {
        if fleet.is_empty() {
            return Err(ValidationError::EmptySeries);
        }
        check_positive("target_gw", target_gw)?;
        for &t in thresholds_gw {
            check_positive("threshold_gw", t)?;
        }

        let output: Vec<f64> = fleet.iter().map(|s| s.output_gw).collect();
        let hours = output.len();
        let total_energy_gwh: f64 = output.iter().sum();

        let worst_hour = fleet
            .iter()
            .min_by(|a, b| a.output_gw.total_cmp(&b.output_gw))
            .map(|s| HourValue {
                hour: s.hour,
                output_gw: s.output_gw,
            })
            .ok_or(ValidationError::EmptySeries)?;

        let days = daily_windows(hours);
        let weeks = weekly_windows(hours, week_boundary);

        let worst_week = weeks
            .iter()
            .enumerate()
            .map(|(week, w)| WeekValue {
                week,
                start_hour: w.start,
                end_hour: w.end,
                mean_output_gw: mean(&output[w.clone()]),
            })
            .min_by(|a, b| a.mean_output_gw.total_cmp(&b.mean_output_gw));

        let mut seen: Vec<f64> = Vec::with_capacity(thresholds_gw.len());
        let mut thresholds = Vec::with_capacity(thresholds_gw.len());
        for &threshold in thresholds_gw {
            if seen.contains(&threshold) {
                continue;
            }
            seen.push(threshold);
            thresholds.push(ThresholdAvailability {
                threshold_gw: threshold,
                hourly: WindowCount {
                    met: output.iter().filter(|&&o| o >= threshold).count(),
                    total: hours,
                },
                daily: count_mean_windows(&output, &days, threshold),
                weekly: count_mean_windows(&output, &weeks, threshold),
                days_all_hours: WindowCount {
                    met: days
                        .iter()
                        .filter(|d| output[(*d).clone()].iter().all(|&o| o >= threshold))
                        .count(),
                    total: days.len(),
                },
            });
        }

        Ok(Self {
            target_gw,
            hours,
            mean_output_gw: total_energy_gwh / hours as f64,
            total_energy_gwh,
            energy_fraction_of_target: total_energy_gwh / (target_gw * hours as f64),
            worst_hour,
            worst_week,
            week_boundary,
            thresholds,
        })
    }

    /// Availability at `threshold_gw`, if it was evaluated.
    pub fn at(&self, threshold_gw: f64) -> Option<&ThresholdAvailability> {
        self.thresholds
            .iter()
            .find(|t| t.threshold_gw == threshold_gw)
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::InvalidParameter { field, value })
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn count_mean_windows(output: &[f64], windows: &[Range<usize>], threshold: f64) -> WindowCount {
    WindowCount {
        met: windows
            .iter()
            .filter(|w| mean(&output[(*w).clone()]) >= threshold)
            .count(),
        total: windows.len(),
    }
}

impl fmt::Display for ReliabilityMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Fleet Reliability ---")?;
        writeln!(f, "Fleet target:          {:.2} GW", self.target_gw)?;
        writeln!(f, "Mean output:           {:.3} GW", self.mean_output_gw)?;
        writeln!(
            f,
            "Energy delivered:      {:.1} TWh ({:.1}% of target)",
            self.total_energy_gwh / 1000.0,
            100.0 * self.energy_fraction_of_target
        )?;
        writeln!(
            f,
            "Worst hour:            {:.2} GW (hour {})",
            self.worst_hour.output_gw, self.worst_hour.hour
        )?;
        if let Some(w) = &self.worst_week {
            writeln!(
                f,
                "Worst week:            {:.2} GW mean (week {}, hours {}-{})",
                w.mean_output_gw,
                w.week + 1,
                w.start_hour,
                w.end_hour
            )?;
        }
        for t in &self.thresholds {
            writeln!(f, "At >= {:.2} GW:", t.threshold_gw)?;
            writeln!(f, "  Hourly availability: {}", t.hourly)?;
            writeln!(f, "  Daily availability:  {}", t.daily)?;
            writeln!(f, "  Weekly availability: {}", t.weekly)?;
            writeln!(f, "  Days with all hours: {}", t.days_all_hours)?;
        }
        Ok(())
    }
}
