//! Logging helpers: number formatting, operation timing and the end-of-run summary.

use std::time::{Duration, Instant};

use fgtrim_metrics::{PrimerReadCount, ProcessingMetrics, TrimMetrics, format_count};

/// Formats a fraction as a percentage with the given number of decimals.
///
/// # Examples
///
/// ```
/// use fgtrim_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration as e.g. `45s`, `2m 15s` or `1h 30m`.
///
/// # Examples
///
/// ```
/// use fgtrim_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        if remaining_secs == 0 { format!("{mins}m") } else { format!("{mins}m {remaining_secs}s") }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a processing rate in reads per second, falling back to reads per minute for
/// slow runs.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} reads/s", format_count(count));
    }

    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} reads/s", format_count(rate as u64))
    } else {
        let per_min = count as f64 / (secs / 60.0);
        format!("{per_min:.1} reads/min")
    }
}

/// Logs the counters of a finished trimming run.
///
/// Expects [`TrimMetrics::finalize`] to have been called so that the fractions are set.
pub fn log_trim_summary(metrics: &TrimMetrics) {
    log::info!("Trimming Summary:");
    log::info!("  Total records: {}", format_count(metrics.total_records));
    log::info!("  Unmapped (skipped): {}", format_count(metrics.unmapped_reads));
    log::info!("  Mapped: {}", format_count(metrics.mapped_reads));

    if metrics.mapped_reads > 0 {
        log::info!(
            "  Primer trimmed: {} ({})",
            format_count(metrics.primer_trimmed),
            format_percent(metrics.frac_primer_trimmed, 2)
        );
        log::info!(
            "  Below minimum length: {} ({})",
            format_count(metrics.low_quality),
            format_percent(metrics.frac_low_quality, 2)
        );
        log::info!(
            "  No primer found: {} ({})",
            format_count(metrics.no_primer),
            format_percent(metrics.frac_no_primer, 2)
        );
    }

    if metrics.amplicon_rejected > 0 {
        log::info!(
            "  Outside any amplicon: {} ({})",
            format_count(metrics.amplicon_rejected),
            format_percent(metrics.frac_amplicon_rejected, 2)
        );
    }
    if metrics.insert_size_violations > 0 {
        log::warn!(
            "{} reads had an insert size no larger than the read length; \
             is the input paired and mate-fixed?",
            format_count(metrics.insert_size_violations)
        );
    }
    if metrics.qc_failed > 0 {
        log::info!("  Written with QC-fail flag: {}", format_count(metrics.qc_failed));
    }
    log::info!(
        "  Written: {} ({} of input, {} filtered)",
        format_count(metrics.total_output()),
        format_percent(metrics.efficiency() / 100.0, 2),
        format_count(metrics.total_filtered())
    );
}

/// Logs one line per primer with the number of reads it trimmed.
pub fn log_primer_summary(counts: &[PrimerReadCount]) {
    if counts.is_empty() {
        return;
    }
    log::info!("Reads per primer:");
    for row in counts {
        log::info!(
            "  {}\t{}:{}-{}\t{}\t{}",
            row.name,
            row.chrom,
            row.start,
            row.end,
            format_count(row.read_count),
            format_percent(row.frac_reads, 2)
        );
    }
}

/// Operation timing helper.
///
/// ```no_run
/// use fgtrim_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Trimming reads");
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Logs the completion with item count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}
