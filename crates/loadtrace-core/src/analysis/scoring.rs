use super::SummaryStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

/// One weighted input to the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub metric: String,
    pub value: f64,
    pub weight: f64,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceScore {
    pub score: u32,
    pub grade: Grade,
    pub components: Vec<ScoreComponent>,
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Weighted 0-100 score over the run summary.
    pub fn score(summary: &SummaryStats) -> PerformanceScore {
        let estimated_ratio = summary.estimated_ratio();

        let components = vec![
            component(
                "average_duration",
                summary.average_duration,
                0.30,
                average_duration_points(summary.average_duration),
            ),
            component(
                "actual_total_time",
                summary.actual_total_time as f64,
                0.35,
                actual_total_time_points(summary.actual_total_time),
            ),
            component(
                "parallel_efficiency",
                summary.parallel_efficiency,
                0.20,
                parallel_efficiency_points(summary.parallel_efficiency),
            ),
            component(
                "request_count",
                summary.total_requests as f64,
                0.10,
                request_count_points(summary.total_requests),
            ),
            component(
                "estimated_ratio",
                estimated_ratio,
                0.05,
                estimated_ratio_points(estimated_ratio),
            ),
        ];

        let weighted: f64 = components
            .iter()
            .map(|c| c.weight * c.points as f64)
            .sum();
        let score = weighted.round().clamp(0.0, 100.0) as u32;

        PerformanceScore {
            score,
            grade: Grade::from_score(score),
            components,
        }
    }
}

fn component(metric: &str, value: f64, weight: f64, points: u32) -> ScoreComponent {
    ScoreComponent {
        metric: metric.to_string(),
        value,
        weight,
        points,
    }
}

fn average_duration_points(average_ms: f64) -> u32 {
    match average_ms {
        a if a > 2000.0 => 30,
        a if a > 1000.0 => 50,
        a if a > 600.0 => 70,
        a if a > 300.0 => 85,
        _ => 95,
    }
}

fn actual_total_time_points(total_ms: i64) -> u32 {
    match total_ms {
        t if t > 30_000 => 30,
        t if t > 15_000 => 50,
        t if t > 8_000 => 70,
        t if t > 3_000 => 85,
        _ => 95,
    }
}

fn parallel_efficiency_points(efficiency: f64) -> u32 {
    match efficiency {
        e if e < 30.0 => 60,
        e if e < 60.0 => 75,
        e if e < 80.0 => 85,
        _ => 95,
    }
}

fn request_count_points(count: usize) -> u32 {
    match count {
        c if c > 100 => 60,
        c if c > 50 => 75,
        c if c > 20 => 90,
        _ => 95,
    }
}

fn estimated_ratio_points(ratio: f64) -> u32 {
    match ratio {
        r if r > 0.5 => 60,
        r if r > 0.3 => 80,
        r if r > 0.0 => 90,
        _ => 100,
    }
}
