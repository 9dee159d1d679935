use crate::classify::ResourceType;
use std::collections::HashMap;

/// Longest interval accepted between a start and the end paired with it.
pub const MAX_REQUEST_DURATION_MS: i64 = 60_000;

/// Result of pairing one URL's start and end times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    /// `(start, end)` in start order
    pub pairs: Vec<(i64, i64)>,
    /// Starts with no end inside the window, ascending
    pub unmatched_starts: Vec<i64>,
    /// End times never selected
    pub unused_ends: usize,
}

/// Greedy chronological pairing. Both slices must be sorted ascending.
///
/// Each start takes the earliest unused end that is strictly later and no
/// more than `window_ms` away. Ends skipped by one start stay available to
/// later starts.
pub fn pair_times(starts: &[i64], ends: &[i64], window_ms: i64) -> Pairing {
    debug_assert!(starts.is_sorted() && ends.is_sorted());

    let mut used = vec![false; ends.len()];
    let mut pairing = Pairing::default();

    for &start in starts {
        let first_later = ends.partition_point(|&end| end <= start);
        let chosen = (first_later..ends.len())
            .take_while(|&idx| ends[idx] - start <= window_ms)
            .find(|&idx| !used[idx]);

        match chosen {
            Some(idx) => {
                used[idx] = true;
                pairing.pairs.push((start, ends[idx]));
            }
            None => pairing.unmatched_starts.push(start),
        }
    }

    pairing.unused_ends = used.iter().filter(|taken| !**taken).count();
    pairing
}

/// Running mean of real (non-estimated) durations per resource type.
///
/// The estimate for an unmatched start depends on which same-type requests
/// were completed before it, so callers must feed requests in a fixed order.
#[derive(Debug, Default)]
pub struct RunningAverages {
    totals: HashMap<ResourceType, (i64, usize)>,
}

impl RunningAverages {
    pub fn record(&mut self, resource_type: ResourceType, duration_ms: i64) {
        let entry = self.totals.entry(resource_type).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(duration_ms);
        entry.1 += 1;
    }

    /// Mean so far, or the type's default when nothing real was seen yet.
    pub fn estimate(&self, resource_type: ResourceType) -> f64 {
        match self.totals.get(&resource_type) {
            Some((sum, count)) if *count > 0 => *sum as f64 / *count as f64,
            _ => resource_type.default_duration_ms(),
        }
    }
}
