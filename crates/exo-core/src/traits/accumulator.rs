//! Metric sink trait.

use crate::{Error, Metric};

/// Receives metrics produced by a gather cycle.
///
/// Metrics arrive in the order the plugin produced them.
///
/// # Examples
///
/// ```
/// use exo_core::{Accumulator, Metric};
///
/// let mut acc: Vec<Metric> = Vec::new();
/// acc.add_metric(Metric::builder("cpu").field("idle", 99.0).build());
/// assert_eq!(acc.len(), 1);
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Accumulator: Send {
    /// Adds a single metric.
    fn add_metric(&mut self, metric: Metric);

    /// Records a non-fatal error raised while gathering.
    ///
    /// The default implementation logs the error and drops it.
    fn add_error(&mut self, error: &Error) {
        tracing::warn!(error = %error, "error while gathering metrics");
    }
}

impl Accumulator for Vec<Metric> {
    fn add_metric(&mut self, metric: Metric) {
        self.push(metric);
    }
}
