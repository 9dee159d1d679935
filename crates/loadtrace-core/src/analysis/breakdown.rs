use super::Analyzer;
use crate::classify::ResourceType;
use crate::session::CompletedRequest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-resource-type statistics. Shares are percentages of the run total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeStats {
    pub resource_type: ResourceType,
    pub count: usize,
    pub total_time: i64,
    pub avg_time: f64,
    pub min_time: i64,
    pub max_time: i64,
    pub estimated_count: usize,
    pub count_share: f64,
    pub time_share: f64,
}

/// Groups completed requests by [`ResourceType`], in the type's fixed order.
pub struct TypeBreakdownAnalyzer;

impl Analyzer for TypeBreakdownAnalyzer {
    type Output = Vec<TypeStats>;

    fn analyze(&self, requests: &[CompletedRequest]) -> Self::Output {
        let mut groups: BTreeMap<ResourceType, Vec<&CompletedRequest>> = BTreeMap::new();
        for request in requests {
            groups.entry(request.resource_type).or_default().push(request);
        }

        let total_count = requests.len();
        let total_time = saturating_total(requests.iter());

        groups
            .into_iter()
            .map(|(resource_type, members)| {
                let count = members.len();
                let type_time = saturating_total(members.iter().copied());

                TypeStats {
                    resource_type,
                    count,
                    total_time: type_time,
                    avg_time: type_time as f64 / count as f64,
                    min_time: members.iter().map(|r| r.duration).min().unwrap_or(0),
                    max_time: members.iter().map(|r| r.duration).max().unwrap_or(0),
                    estimated_count: members.iter().filter(|r| r.estimated).count(),
                    count_share: percentage(count as f64, total_count as f64),
                    time_share: percentage(type_time as f64, total_time as f64),
                }
            })
            .collect()
    }
}

fn saturating_total<'a>(requests: impl Iterator<Item = &'a CompletedRequest>) -> i64 {
    requests.fold(0, |acc, r| acc.saturating_add(r.duration))
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part * 100.0 / whole } else { 0.0 }
}
