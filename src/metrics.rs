//! Wall-clock timers for the phases of a run.
//!
//! A [`Metrics`] value is owned by the caller and passed down explicitly;
//! there is no process-wide collector. Timers are named, can be started
//! and stopped repeatedly, and accumulate their total running time.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use tabled::{Table, Tabled};

use crate::error::{Error, Result};

/// Label of the summary row in a [`MetricsReport`].
pub const TOTAL_ROW: &str = "Total Time";

#[derive(Debug, Clone, Default)]
struct Timer {
    started: Option<Instant>,
    total: Duration,
}

/// A set of named, accumulating timers.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    timers: BTreeMap<String, Timer>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `name`, creating it if needed. A running timer is left alone.
    pub fn start(&mut self, name: &str) {
        let now = Instant::now();
        let timer = self.timers.entry(name.to_string()).or_default();
        if timer.started.is_none() {
            timer.started = Some(now);
        }
    }

    /// Stops `name` and adds the elapsed time to its total.
    ///
    /// Stopping a stopped timer does nothing; stopping an unknown one is an
    /// error.
    pub fn stop(&mut self, name: &str) -> Result<()> {
        let now = Instant::now();
        let timer = self.timers.get_mut(name).ok_or_else(|| Error::Metrics {
            message: format!("timer '{}' not found", name),
        })?;
        if let Some(started) = timer.started.take() {
            timer.total += now.duration_since(started);
        }
        Ok(())
    }

    /// Runs `f` between `start(name)` and `stop(name)`.
    pub fn time<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        self.start(name);
        let result = f();
        // The timer was started above, so it exists.
        let _ = self.stop(name);
        result
    }

    /// Whether `name` is currently running.
    pub fn is_running(&self, name: &str) -> bool {
        self.timers
            .get(name)
            .is_some_and(|timer| timer.started.is_some())
    }

    /// Accumulated time of `name`, not counting a run in progress.
    pub fn total(&self, name: &str) -> Option<Duration> {
        self.timers.get(name).map(|timer| timer.total)
    }

    /// Snapshot of every timer's accumulated total.
    pub fn report(&self) -> MetricsReport {
        MetricsReport::from_totals(
            self.timers
                .iter()
                .map(|(name, timer)| (name.clone(), timer.total)),
        )
    }
}

/// One line of a [`MetricsReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRow {
    pub timer: String,
    pub seconds: f64,
    /// Share of the total, rounded to two decimals.
    pub percent: f64,
}

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "Timer")]
    timer: String,
    #[tabled(rename = "Seconds")]
    seconds: String,
    #[tabled(rename = "% of total")]
    percent: String,
}

/// Timer totals, longest first, followed by a total row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub rows: Vec<MetricsRow>,
}

impl MetricsReport {
    /// Builds a report from `(timer, total)` pairs.
    pub fn from_totals(totals: impl IntoIterator<Item = (String, Duration)>) -> Self {
        let mut totals: Vec<(String, f64)> = totals
            .into_iter()
            .map(|(name, total)| (name, total.as_secs_f64()))
            .collect();
        // Stable sort keeps equal timers in name order.
        totals.sort_by(|a, b| b.1.total_cmp(&a.1));

        let sum: f64 = totals.iter().map(|(_, seconds)| seconds).sum();
        totals.push((TOTAL_ROW.to_string(), sum));

        let rows = totals
            .into_iter()
            .map(|(timer, seconds)| MetricsRow {
                timer,
                seconds,
                percent: percent_of(seconds, sum),
            })
            .collect();
        Self { rows }
    }

    /// The summary row.
    pub fn total(&self) -> Option<&MetricsRow> {
        self.rows.last()
    }
}

fn percent_of(seconds: f64, sum: f64) -> f64 {
    if sum <= 0.0 {
        return 0.0;
    }
    (seconds / sum * 10_000.0).round() / 100.0
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<_> = self
            .rows
            .iter()
            .map(|r| TableRow {
                timer: r.timer.clone(),
                seconds: format!("{:.6}", r.seconds),
                percent: format!("{}%", r.percent),
            })
            .collect();
        write!(f, "{}", Table::new(rows))
    }
}
