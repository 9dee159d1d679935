use super::Analyzer;
use crate::scope::host_of;
use crate::session::CompletedRequest;
use crate::timestamp::format_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_requests: usize,
    pub real_requests: usize,
    pub estimated_requests: usize,
    /// Sum of all durations, as if every load ran one after another
    pub cumulative_time: i64,
    /// Wall-clock span from the first start to the last end
    pub actual_total_time: i64,
    /// Percentage of serial time saved by overlapping loads
    pub parallel_efficiency: f64,
    pub average_duration: f64,
    pub median_duration: f64,
    pub min_duration: i64,
    pub max_duration: i64,
    pub unique_domains: usize,
    pub time_range: Option<(String, String)>,
}

impl SummaryStats {
    /// Estimated share of completed requests, 0 when there are none.
    pub fn estimated_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.estimated_requests as f64 / self.total_requests as f64
        }
    }
}

pub struct SummaryAnalyzer;

impl Analyzer for SummaryAnalyzer {
    type Output = SummaryStats;

    fn analyze(&self, requests: &[CompletedRequest]) -> Self::Output {
        tracing::debug!("Aggregating {} completed requests", requests.len());

        if requests.is_empty() {
            return SummaryStats::default();
        }

        let total_requests = requests.len();
        let estimated_requests = requests.iter().filter(|r| r.estimated).count();
        let cumulative_time = requests
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.duration));

        let first_start = requests.iter().map(|r| r.start_time).min().unwrap_or(0);
        let last_end = requests.iter().map(|r| r.end_time).max().unwrap_or(0);
        let actual_total_time = last_end.saturating_sub(first_start);

        let mut durations: Vec<i64> = requests.iter().map(|r| r.duration).collect();
        durations.sort_unstable();
        let median_duration = if durations.len() % 2 == 0 {
            let mid = durations.len() / 2;
            (durations[mid - 1] + durations[mid]) as f64 / 2.0
        } else {
            durations[durations.len() / 2] as f64
        };

        let unique_domains = requests
            .iter()
            .filter_map(|r| host_of(&r.url))
            .collect::<HashSet<_>>()
            .len();

        let summary = SummaryStats {
            total_requests,
            real_requests: total_requests - estimated_requests,
            estimated_requests,
            cumulative_time,
            actual_total_time,
            parallel_efficiency: parallel_efficiency(actual_total_time, cumulative_time),
            average_duration: cumulative_time as f64 / total_requests as f64,
            median_duration,
            min_duration: durations[0],
            max_duration: durations[durations.len() - 1],
            unique_domains,
            time_range: Some((format_timestamp(first_start), format_timestamp(last_end))),
        };

        tracing::info!(
            "Aggregation complete: cumulative={}ms, actual={}ms, efficiency={:.1}%",
            summary.cumulative_time,
            summary.actual_total_time,
            summary.parallel_efficiency
        );

        summary
    }
}

/// `(1 - actual / cumulative) * 100`, reported as 0 when either side is not
/// positive or when idle gaps make the span longer than the serial sum.
pub fn parallel_efficiency(actual_total_time: i64, cumulative_time: i64) -> f64 {
    if actual_total_time <= 0 || cumulative_time <= 0 {
        return 0.0;
    }
    ((1.0 - actual_total_time as f64 / cumulative_time as f64) * 100.0).max(0.0)
}
