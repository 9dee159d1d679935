//! Event store for one analysis run.
//!
//! An [`AnalysisSession`] accumulates per-URL timelines while records stream
//! in. [`AnalysisSession::finalize`] consumes it and pairs the timelines into
//! completed requests, leaving a read-only [`FinalizedRun`].

mod matcher;

pub use matcher::{MAX_REQUEST_DURATION_MS, Pairing, RunningAverages, pair_times};

use crate::classify::{ResourceType, classify};
use crate::extract::{EntryExtractor, EventKind, Extracted, is_nothing_marker};
use crate::record::RawRecord;
use crate::scope::UrlScope;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A reconciled load with a known or estimated duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedRequest {
    pub url: String,
    pub resource_type: ResourceType,
    pub start_time: i64,
    pub end_time: i64,
    pub duration: i64,
    /// No real end time was found; `duration` is a synthetic estimate
    pub estimated: bool,
}

impl CompletedRequest {
    fn new(url: &str, resource_type: ResourceType, start_time: i64, duration: i64, estimated: bool) -> Self {
        Self {
            url: url.to_string(),
            resource_type,
            start_time,
            end_time: start_time.saturating_add(duration),
            duration,
            estimated,
        }
    }
}

/// Every event seen for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlTimeline {
    pub url: String,
    pub resource_type: ResourceType,
    pub start_times: Vec<i64>,
    pub end_times: Vec<i64>,
    pub unknown_times: Vec<i64>,
}

impl UrlTimeline {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            resource_type: classify(url),
            start_times: vec![],
            end_times: vec![],
            unknown_times: vec![],
        }
    }

    fn sort(&mut self) {
        self.start_times.sort_unstable();
        self.end_times.sort_unstable();
        self.unknown_times.sort_unstable();
    }
}

/// Ingestion counters, reported for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub records_seen: usize,
    /// Records that produced no event or interval at all
    pub records_skipped: usize,
    pub events_accepted: usize,
    pub unknown_events: usize,
    pub direct_intervals: usize,
    /// Events or intervals refused for a bad URL, bad time, or host scope
    pub events_rejected: usize,
    /// End times the matcher never selected
    pub orphaned_end_times: usize,
}

#[derive(Debug, Clone)]
struct PendingInterval {
    url: String,
    resource_type: ResourceType,
    start_ms: Option<i64>,
    duration_ms: i64,
}

/// Accumulating state of a single run. Not shareable between runs.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    scope: UrlScope,
    index: HashMap<String, usize>,
    timelines: Vec<UrlTimeline>,
    intervals: Vec<PendingInterval>,
    earliest_ms: Option<i64>,
    stats: IngestStats,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(scope: UrlScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    /// Extract one record and fold its facts into the store.
    pub fn ingest(&mut self, record: &RawRecord) {
        self.stats.records_seen += 1;

        let extracted = EntryExtractor::extract(record);
        if extracted.is_empty() {
            self.stats.records_skipped += 1;
            return;
        }

        for fact in extracted {
            match fact {
                Extracted::Event(event) => {
                    self.add_event(&event.url, event.timestamp_ms, event.kind);
                }
                Extracted::Interval(interval) => {
                    self.add_interval(&interval.url, interval.start_ms, interval.duration_ms);
                }
            }
        }
    }

    pub fn ingest_all<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        for record in records {
            self.ingest(record);
        }
    }

    /// Append one marker to the URL's timeline. Returns false (and logs) if
    /// the URL or timestamp is unusable or the host is out of scope.
    pub fn add_event(&mut self, url: &str, timestamp_ms: i64, kind: EventKind) -> bool {
        let url = url.trim();
        if !self.admit(url, Some(timestamp_ms)) {
            return false;
        }

        let slot = match self.index.get(url) {
            Some(&slot) => slot,
            None => {
                self.timelines.push(UrlTimeline::new(url));
                self.index.insert(url.to_string(), self.timelines.len() - 1);
                self.timelines.len() - 1
            }
        };

        let timeline = &mut self.timelines[slot];
        match kind {
            EventKind::Start => timeline.start_times.push(timestamp_ms),
            EventKind::End => timeline.end_times.push(timestamp_ms),
            EventKind::Unknown => {
                timeline.unknown_times.push(timestamp_ms);
                self.stats.unknown_events += 1;
            }
        }

        self.stats.events_accepted += 1;
        self.note_time(timestamp_ms);
        true
    }

    /// Record a load whose duration was logged directly; it skips pairing.
    pub fn add_interval(&mut self, url: &str, start_ms: Option<i64>, duration_ms: i64) -> bool {
        let url = url.trim();
        if duration_ms < 0 {
            tracing::debug!("Rejecting negative duration {} for {}", duration_ms, url);
            self.stats.events_rejected += 1;
            return false;
        }
        if !self.admit(url, start_ms) {
            return false;
        }

        self.intervals.push(PendingInterval {
            url: url.to_string(),
            resource_type: classify(url),
            start_ms,
            duration_ms,
        });
        self.stats.direct_intervals += 1;
        if let Some(start) = start_ms {
            self.note_time(start);
        }
        true
    }

    pub fn timelines(&self) -> &[UrlTimeline] {
        &self.timelines
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Pair every timeline and produce the run's completed requests.
    ///
    /// Direct intervals come first, in ingestion order, anchored at the
    /// earliest observed time when their own start is unknown. Timelines
    /// follow in first-seen order; within one, real pairs precede estimates.
    pub fn finalize(mut self) -> FinalizedRun {
        let anchor = self.earliest_ms.unwrap_or(0);
        let mut averages = RunningAverages::default();
        let mut requests = Vec::new();

        for interval in &self.intervals {
            let start = interval.start_ms.unwrap_or(anchor);
            averages.record(interval.resource_type, interval.duration_ms);
            requests.push(CompletedRequest::new(
                &interval.url,
                interval.resource_type,
                start,
                interval.duration_ms,
                false,
            ));
        }

        let mut estimated = 0;
        for timeline in &mut self.timelines {
            timeline.sort();
            let pairing = pair_times(
                &timeline.start_times,
                &timeline.end_times,
                MAX_REQUEST_DURATION_MS,
            );

            for (start, end) in &pairing.pairs {
                let duration = end - start;
                averages.record(timeline.resource_type, duration);
                requests.push(CompletedRequest::new(
                    &timeline.url,
                    timeline.resource_type,
                    *start,
                    duration,
                    false,
                ));
            }

            for start in &pairing.unmatched_starts {
                let duration = averages.estimate(timeline.resource_type).round() as i64;
                tracing::debug!(
                    "No end for {} at {}; estimating {}ms",
                    timeline.url,
                    start,
                    duration
                );
                requests.push(CompletedRequest::new(
                    &timeline.url,
                    timeline.resource_type,
                    *start,
                    duration,
                    true,
                ));
                estimated += 1;
            }

            self.stats.orphaned_end_times += pairing.unused_ends;
        }

        tracing::info!(
            "Matching complete: {} completed requests ({} estimated) from {} URLs",
            requests.len(),
            estimated,
            self.timelines.len()
        );

        FinalizedRun {
            requests,
            timelines: self.timelines,
            stats: self.stats,
        }
    }

    fn admit(&mut self, url: &str, timestamp_ms: Option<i64>) -> bool {
        if is_nothing_marker(url) {
            tracing::debug!("Rejecting event with unusable URL '{}'", url);
        } else if timestamp_ms.is_some_and(|ms| ms < 0) {
            tracing::debug!("Rejecting event for {}: negative timestamp", url);
        } else if !self.scope.admits(url) {
            tracing::debug!("Skipping out-of-scope URL {}", url);
        } else {
            return true;
        }
        self.stats.events_rejected += 1;
        false
    }

    fn note_time(&mut self, ms: i64) {
        self.earliest_ms = Some(self.earliest_ms.map_or(ms, |earliest| earliest.min(ms)));
    }
}

/// Read-only outcome of a finalized session.
#[derive(Debug, Clone)]
pub struct FinalizedRun {
    requests: Vec<CompletedRequest>,
    timelines: Vec<UrlTimeline>,
    stats: IngestStats,
}

impl FinalizedRun {
    pub fn requests(&self) -> &[CompletedRequest] {
        &self.requests
    }

    pub fn timelines(&self) -> &[UrlTimeline] {
        &self.timelines
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }
}
