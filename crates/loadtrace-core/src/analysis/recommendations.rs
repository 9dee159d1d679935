use super::{DuplicateEntry, SummaryStats, TypeStats};
use crate::classify::ResourceType;
use crate::session::CompletedRequest;
use serde::{Deserialize, Serialize};

const SLOW_RESOURCE_MS: i64 = 1_000;
const EXTREMELY_SLOW_MS: i64 = 5_000;
const SLOW_TYPE_AVERAGE_MS: f64 = 500.0;
const SLOW_OVERALL_AVERAGE_MS: f64 = 300.0;
const TOTAL_TIME_HIGH_MS: i64 = 20_000;
const TOTAL_TIME_MEDIUM_MS: i64 = 8_000;
const CUMULATIVE_TIME_MS: i64 = 60_000;
const EFFICIENCY_HIGH: f64 = 50.0;
const EFFICIENCY_MEDIUM: f64 = 70.0;
const MANY_REQUESTS: usize = 50;
const ESTIMATED_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

/// Data backing a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    Request {
        url: String,
        resource_type: ResourceType,
        duration: i64,
    },
    Requests {
        requests: Vec<CompletedRequest>,
    },
    ResourceType {
        resource_type: ResourceType,
        count: usize,
        avg_time: f64,
    },
    Metric {
        value: f64,
        threshold: f64,
    },
    Duplicates {
        duplicates: Vec<DuplicateEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub issue: String,
    pub detail: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

impl Recommendation {
    fn new(priority: Priority, issue: &str, detail: String, suggestion: &str) -> Self {
        Self {
            priority,
            issue: issue.to_string(),
            detail,
            suggestion: suggestion.to_string(),
            evidence: None,
        }
    }

    fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

pub struct RecommendationEngine;

impl RecommendationEngine {
    /// Every rule is checked independently of the score. Output keeps
    /// generation order; it is not sorted by priority.
    pub fn recommend(
        summary: &SummaryStats,
        type_stats: &[TypeStats],
        requests: &[CompletedRequest],
        duplicates: &[DuplicateEntry],
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        recommendations.extend(Self::slowest_resource(requests));
        recommendations.extend(Self::slow_types(type_stats));
        recommendations.extend(Self::overall_average(summary));
        recommendations.extend(Self::total_time(summary));
        recommendations.extend(Self::cumulative_time(summary));
        recommendations.extend(Self::parallelism(summary));
        recommendations.extend(Self::request_count(summary));
        recommendations.extend(Self::estimation(summary));
        recommendations.extend(Self::extremely_slow(requests));
        recommendations.extend(Self::duplicate_loads(duplicates));

        tracing::debug!("Generated {} recommendations", recommendations.len());
        recommendations
    }

    fn slowest_resource(requests: &[CompletedRequest]) -> Option<Recommendation> {
        let slowest = requests
            .iter()
            .reduce(|best, r| if r.duration > best.duration { r } else { best })?;
        if slowest.duration <= SLOW_RESOURCE_MS {
            return None;
        }

        Some(
            Recommendation::new(
                Priority::High,
                "Slow resource",
                format!(
                    "{} ({}) took {}ms to load",
                    slowest.url, slowest.resource_type, slowest.duration
                ),
                slowest.resource_type.suggestion(),
            )
            .with_evidence(Evidence::Request {
                url: slowest.url.clone(),
                resource_type: slowest.resource_type,
                duration: slowest.duration,
            }),
        )
    }

    fn slow_types(type_stats: &[TypeStats]) -> Vec<Recommendation> {
        type_stats
            .iter()
            .filter(|stats| stats.avg_time > SLOW_TYPE_AVERAGE_MS)
            .map(|stats| {
                Recommendation::new(
                    Priority::Medium,
                    &format!("Slow {} resources", stats.resource_type),
                    format!(
                        "{} {} requests average {:.0}ms each",
                        stats.count, stats.resource_type, stats.avg_time
                    ),
                    stats.resource_type.suggestion(),
                )
                .with_evidence(Evidence::ResourceType {
                    resource_type: stats.resource_type,
                    count: stats.count,
                    avg_time: stats.avg_time,
                })
            })
            .collect()
    }

    fn overall_average(summary: &SummaryStats) -> Option<Recommendation> {
        (summary.average_duration > SLOW_OVERALL_AVERAGE_MS).then(|| {
            Recommendation::new(
                Priority::Medium,
                "High average load time",
                format!(
                    "Requests take {:.0}ms on average",
                    summary.average_duration
                ),
                "Serve assets from a CDN, enable HTTP caching and compression, and cut payload sizes",
            )
            .with_evidence(Evidence::Metric {
                value: summary.average_duration,
                threshold: SLOW_OVERALL_AVERAGE_MS,
            })
        })
    }

    fn total_time(summary: &SummaryStats) -> Option<Recommendation> {
        let (priority, threshold) = if summary.actual_total_time > TOTAL_TIME_HIGH_MS {
            (Priority::High, TOTAL_TIME_HIGH_MS)
        } else if summary.actual_total_time > TOTAL_TIME_MEDIUM_MS {
            (Priority::Medium, TOTAL_TIME_MEDIUM_MS)
        } else {
            return None;
        };

        Some(
            Recommendation::new(
                priority,
                "Long total load time",
                format!(
                    "All resources took {:.1}s from first request to last response",
                    summary.actual_total_time as f64 / 1000.0
                ),
                "Prioritize critical resources, lazy-load the rest, and remove blocking requests",
            )
            .with_evidence(Evidence::Metric {
                value: summary.actual_total_time as f64,
                threshold: threshold as f64,
            }),
        )
    }

    fn cumulative_time(summary: &SummaryStats) -> Option<Recommendation> {
        (summary.cumulative_time > CUMULATIVE_TIME_MS).then(|| {
            Recommendation::new(
                Priority::Medium,
                "High cumulative load time",
                format!(
                    "Loading every resource one after another would take {:.1}s",
                    summary.cumulative_time as f64 / 1000.0
                ),
                "Reduce the number and size of resources; bundle small files and drop unused ones",
            )
            .with_evidence(Evidence::Metric {
                value: summary.cumulative_time as f64,
                threshold: CUMULATIVE_TIME_MS as f64,
            })
        })
    }

    /// An empty run has no efficiency to judge; any other run is tiered.
    fn parallelism(summary: &SummaryStats) -> Option<Recommendation> {
        if summary.total_requests == 0 {
            return None;
        }

        let (priority, threshold) = if summary.parallel_efficiency < EFFICIENCY_HIGH {
            (Priority::High, EFFICIENCY_HIGH)
        } else if summary.parallel_efficiency < EFFICIENCY_MEDIUM {
            (Priority::Medium, EFFICIENCY_MEDIUM)
        } else {
            return None;
        };

        Some(
            Recommendation::new(
                priority,
                "Poor parallel loading",
                format!(
                    "Parallel efficiency is {:.1}%; resources mostly load one after another",
                    summary.parallel_efficiency
                ),
                "Use HTTP/2, preload and preconnect hints, async/defer scripts, and break request chains",
            )
            .with_evidence(Evidence::Metric {
                value: summary.parallel_efficiency,
                threshold,
            }),
        )
    }

    fn request_count(summary: &SummaryStats) -> Option<Recommendation> {
        (summary.total_requests > MANY_REQUESTS).then(|| {
            Recommendation::new(
                Priority::Medium,
                "Too many requests",
                format!("{} resources were requested", summary.total_requests),
                "Bundle scripts and styles, use image sprites or inline SVG, and remove unused resources",
            )
            .with_evidence(Evidence::Metric {
                value: summary.total_requests as f64,
                threshold: MANY_REQUESTS as f64,
            })
        })
    }

    fn estimation(summary: &SummaryStats) -> Option<Recommendation> {
        let ratio = summary.estimated_ratio();
        (ratio > ESTIMATED_RATIO).then(|| {
            Recommendation::new(
                Priority::Low,
                "Incomplete timing data",
                format!(
                    "{:.0}% of request durations are estimated because no end event was logged",
                    ratio * 100.0
                ),
                "Log both start and end events for each request so durations are measured, not estimated",
            )
            .with_evidence(Evidence::Metric {
                value: ratio,
                threshold: ESTIMATED_RATIO,
            })
        })
    }

    fn extremely_slow(requests: &[CompletedRequest]) -> Option<Recommendation> {
        let mut slow: Vec<CompletedRequest> = requests
            .iter()
            .filter(|r| r.duration > EXTREMELY_SLOW_MS)
            .cloned()
            .collect();
        if slow.is_empty() {
            return None;
        }
        slow.sort_by(|a, b| b.duration.cmp(&a.duration));

        let suggestion = slow[0].resource_type.suggestion();
        Some(
            Recommendation::new(
                Priority::High,
                "Extremely slow resources",
                format!(
                    "{} resource(s) took longer than {}s; the worst is {} at {}ms",
                    slow.len(),
                    EXTREMELY_SLOW_MS / 1000,
                    slow[0].url,
                    slow[0].duration
                ),
                suggestion,
            )
            .with_evidence(Evidence::Requests { requests: slow }),
        )
    }

    fn duplicate_loads(duplicates: &[DuplicateEntry]) -> Option<Recommendation> {
        if duplicates.is_empty() {
            return None;
        }

        let wasted: f64 = duplicates.iter().map(|d| d.wasted_time).sum();
        Some(
            Recommendation::new(
                Priority::Medium,
                "Duplicate resource loads",
                format!(
                    "{} URL(s) were loaded more than once, wasting about {:.0}ms",
                    duplicates.len(),
                    wasted
                ),
                "Cache responses, deduplicate in-flight requests, and check for repeated script or style includes",
            )
            .with_evidence(Evidence::Duplicates {
                duplicates: duplicates.to_vec(),
            }),
        )
    }
}
