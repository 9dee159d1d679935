mod breakdown;
mod duplicates;
mod performance;
mod recommendations;
mod scoring;
mod summary;

pub use breakdown::{TypeBreakdownAnalyzer, TypeStats};
pub use duplicates::{
    DuplicateAnalysis, DuplicateDetector, DuplicateEntry, PREFLIGHT_MAX_SHORT_MS, PreflightPair,
    is_preflight_pair,
};
pub use performance::PerformanceAnalyzer;
pub use recommendations::{Evidence, Priority, Recommendation, RecommendationEngine};
pub use scoring::{Grade, PerformanceScore, ScoreComponent, ScoringEngine};
pub use summary::{SummaryAnalyzer, SummaryStats};

use crate::Result;
use crate::session::{CompletedRequest, FinalizedRun, IngestStats};
use serde::Serialize;

/// Everything derived from one finalized run; the hand-off to printers and
/// file writers.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub summary: SummaryStats,
    pub slowest_requests: Vec<CompletedRequest>,
    pub type_stats: Vec<TypeStats>,
    pub duplicates: DuplicateAnalysis,
    pub score: PerformanceScore,
    pub recommendations: Vec<Recommendation>,
    pub diagnostics: IngestStats,
}

impl PerformanceReport {
    /// Run every analyzer over a finalized run. Never fails; an empty run
    /// yields zeroed statistics.
    pub fn build(run: &FinalizedRun, top_n: usize) -> Self {
        let requests = run.requests();

        let summary = SummaryAnalyzer.analyze(requests);
        let slowest_requests = PerformanceAnalyzer::new(top_n).analyze(requests);
        let type_stats = TypeBreakdownAnalyzer.analyze(requests);
        let duplicates = DuplicateDetector.analyze(requests);
        let score = ScoringEngine::score(&summary);
        let recommendations = RecommendationEngine::recommend(
            &summary,
            &type_stats,
            requests,
            &duplicates.duplicates,
        );

        tracing::info!(
            "Report complete: score {} ({}), {} recommendations",
            score.score,
            score.grade.as_str(),
            recommendations.len()
        );

        Self {
            summary,
            slowest_requests,
            type_stats,
            duplicates,
            score,
            recommendations,
            diagnostics: run.stats().clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A pass over the completed requests of a run.
pub trait Analyzer {
    type Output;

    fn analyze(&self, requests: &[CompletedRequest]) -> Self::Output;
}
