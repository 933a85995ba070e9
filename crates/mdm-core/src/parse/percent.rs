//! Percentage extraction from progress lines.
//!
//! The tool's progress format is not a stable interface, so the extraction
//! rule is kept behind a trait and can be swapped without touching the
//! line classifier or the runner.

/// Marker substring present on every progress line of the download stage.
pub const DOWNLOAD_MARKER: &str = "[download]";

/// Pulls a completion percentage out of one output line.
pub trait PercentExtractor: Send + Sync {
    /// Returns the percentage in `0.0..=100.0`, or `None` if the line is not
    /// a progress line.
    fn extract(&self, line: &str) -> Option<f64>;
}

/// Default rule: on lines containing `[download]`, the first
/// whitespace-separated token containing `%`, with the sign removed.
///
/// `[download]  42.3% of ~10.00MiB at 1.2MiB/s ETA 00:07` yields `42.3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPercentToken;

impl PercentExtractor for FirstPercentToken {
    fn extract(&self, line: &str) -> Option<f64> {
        if !line.contains(DOWNLOAD_MARKER) {
            return None;
        }
        let token = line.split_whitespace().find(|t| t.contains('%'))?;
        let value: f64 = token.replace('%', "").parse().ok()?;
        if value.is_finite() {
            Some(value.clamp(0.0, 100.0))
        } else {
            None
        }
    }
}
