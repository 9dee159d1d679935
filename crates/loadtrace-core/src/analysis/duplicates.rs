//! Repeated loads of the same URL.
//!
//! API URLs loaded exactly twice get one extra check: a short call followed
//! by one more than twice as long looks like a CORS preflight plus the real
//! request, so the pair is not counted. This is an empirical heuristic, not a
//! protocol check. It can hide a genuine double call with skewed timings or
//! miss a preflight whose timings fall outside the ratio.

use super::Analyzer;
use crate::classify::ResourceType;
use crate::session::CompletedRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A preflight candidate must be shorter than this.
pub const PREFLIGHT_MAX_SHORT_MS: i64 = 500;

/// The real request must be more than this many times the preflight.
const PREFLIGHT_MIN_RATIO: i64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub url: String,
    pub resource_type: ResourceType,
    pub count: usize,
    pub durations: Vec<i64>,
    pub average_duration: f64,
    /// `average_duration * (count - 1)`
    pub wasted_time: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightPair {
    pub url: String,
    pub preflight_duration: i64,
    pub request_duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateAnalysis {
    /// Sorted by wasted time (descending), then URL
    pub duplicates: Vec<DuplicateEntry>,
    pub suppressed_preflights: Vec<PreflightPair>,
}

impl DuplicateAnalysis {
    pub fn total_wasted_time(&self) -> f64 {
        self.duplicates.iter().map(|d| d.wasted_time).sum()
    }
}

pub struct DuplicateDetector;

impl DuplicateDetector {
    /// URLs loaded more than once, minus suppressed preflight pairs.
    pub fn detect(requests: &[CompletedRequest]) -> Vec<DuplicateEntry> {
        DuplicateDetector.analyze(requests).duplicates
    }
}

impl Analyzer for DuplicateDetector {
    type Output = DuplicateAnalysis;

    fn analyze(&self, requests: &[CompletedRequest]) -> Self::Output {
        let mut order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<&CompletedRequest>> = HashMap::new();
        for request in requests {
            let group = groups.entry(request.url.as_str()).or_insert_with(|| {
                order.push(request.url.as_str());
                Vec::new()
            });
            group.push(request);
        }

        let mut analysis = DuplicateAnalysis::default();

        for url in order {
            let members = &groups[url];
            if members.len() < 2 {
                continue;
            }

            let resource_type = members[0].resource_type;
            let durations: Vec<i64> = members.iter().map(|r| r.duration).collect();

            if resource_type == ResourceType::Api
                && let [first, second] = durations[..]
                && is_preflight_pair(first.min(second), first.max(second))
            {
                tracing::debug!("Treating {} as preflight + request, not a duplicate", url);
                analysis.suppressed_preflights.push(PreflightPair {
                    url: url.to_string(),
                    preflight_duration: first.min(second),
                    request_duration: first.max(second),
                });
                continue;
            }

            let count = durations.len();
            let average_duration =
                durations.iter().map(|&d| d as f64).sum::<f64>() / count as f64;
            analysis.duplicates.push(DuplicateEntry {
                url: url.to_string(),
                resource_type,
                count,
                durations,
                average_duration,
                wasted_time: average_duration * (count - 1) as f64,
            });
        }

        analysis.duplicates.sort_by(|a, b| {
            b.wasted_time
                .total_cmp(&a.wasted_time)
                .then_with(|| a.url.cmp(&b.url))
        });

        if !analysis.duplicates.is_empty() {
            tracing::info!(
                "Found {} duplicated URLs wasting {:.0}ms ({} preflight pairs ignored)",
                analysis.duplicates.len(),
                analysis.total_wasted_time(),
                analysis.suppressed_preflights.len()
            );
        }

        analysis
    }
}

/// `shorter < 500ms` and `longer > 2 * shorter`.
pub fn is_preflight_pair(shorter: i64, longer: i64) -> bool {
    shorter < PREFLIGHT_MAX_SHORT_MS && longer > PREFLIGHT_MIN_RATIO * shorter
}
