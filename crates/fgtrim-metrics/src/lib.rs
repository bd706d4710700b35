#![deny(unsafe_code)]

//! Structured metric types and TSV writer for fgtrim.
//!
//! This crate provides:
//! - [`Metric`] and [`ProcessingMetrics`] traits shared by all metric rows
//! - [`trim`] with the run summary and per-primer read counts of the `trim` command
//! - [`writer`] for TSV file output
//! - [`format_count`] for log summaries

pub mod trim;
pub mod writer;

use serde::{Deserialize, Serialize};

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use fgtrim_metrics::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// assert_eq!(format_count(123), "123");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// A metric type that can be serialized to TSV files.
pub trait Metric: Serialize + for<'de> Deserialize<'de> + Clone + Default {
    /// Human-readable name for this metric type, used in error messages and logging.
    fn metric_name() -> &'static str;
}

/// Common interface for metrics that track processing pipeline counts.
pub trait ProcessingMetrics {
    /// Total number of input records.
    fn total_input(&self) -> u64;

    /// Total number of records written.
    fn total_output(&self) -> u64;

    /// Total number of records not written.
    fn total_filtered(&self) -> u64;

    /// Fraction of input written, as a percentage.
    fn efficiency(&self) -> f64 {
        if self.total_input() == 0 {
            0.0
        } else {
            #[expect(clippy::cast_precision_loss, reason = "read counts never exceed 2^53")]
            let result = self.total_output() as f64 / self.total_input() as f64 * 100.0;
            result
        }
    }
}

pub use trim::{PrimerReadCount, TrimMetrics};
pub use writer::{write_metrics, write_metrics_auto};
