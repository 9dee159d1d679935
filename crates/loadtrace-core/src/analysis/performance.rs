use super::Analyzer;
use crate::session::CompletedRequest;

/// Picks the slowest completed requests.
pub struct PerformanceAnalyzer {
    top_n: usize,
}

impl PerformanceAnalyzer {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }
}

impl Default for PerformanceAnalyzer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TOP_N)
    }
}

impl Analyzer for PerformanceAnalyzer {
    type Output = Vec<CompletedRequest>;

    /// Top-N by descending duration; equal durations keep matcher order.
    fn analyze(&self, requests: &[CompletedRequest]) -> Self::Output {
        let mut slowest = requests.to_vec();
        slowest.sort_by(|a, b| b.duration.cmp(&a.duration));
        slowest.truncate(self.top_n);

        if let Some(first) = slowest.first() {
            tracing::debug!("Slowest request: {} ({}ms)", first.url, first.duration);
        }
        slowest
    }
}
