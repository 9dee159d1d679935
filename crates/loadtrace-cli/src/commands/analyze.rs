use crate::OutputFormat;
use anyhow::{Context, Result};
use loadtrace_core::analysis::{PerformanceReport, Priority};
use loadtrace_core::input::LogReader;
use loadtrace_core::{AnalysisConfig, analyze_records};
use std::path::Path;

/// Merge the optional config file with command-line overrides.
pub fn resolve_config(
    config_file: Option<&Path>,
    top: Option<usize>,
    include_hosts: Vec<String>,
    exclude_hosts: Vec<String>,
) -> Result<AnalysisConfig> {
    let mut config = match config_file {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(top) = top {
        config = config.with_top_n(top);
    }
    if !include_hosts.is_empty() {
        config = config.with_include_hosts(include_hosts);
    }
    if !exclude_hosts.is_empty() {
        config = config.with_exclude_hosts(exclude_hosts);
    }

    Ok(config)
}

/// Analyze a log file and return the report
pub fn analyze_file(file: &Path, config: &AnalysisConfig) -> Result<PerformanceReport> {
    tracing::debug!("Reading log file: {}", file.display());

    let records = LogReader::from_file(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let report = analyze_records(&records, config)?;

    Ok(report)
}

pub fn execute(file: &Path, config: &AnalysisConfig, format: OutputFormat) -> Result<()> {
    tracing::info!("Analyzing log file: {}", file.display());

    let report = analyze_file(file, config)?;

    match format {
        OutputFormat::Json => output_json(&report)?,
        OutputFormat::Pretty => output_pretty(&report),
    }

    Ok(())
}

fn output_json(report: &PerformanceReport) -> Result<()> {
    let json = report.to_json_pretty()?;
    println!("{}", json);
    Ok(())
}

fn output_pretty(report: &PerformanceReport) {
    use console::style;

    let summary = &report.summary;

    println!("\n{}", style("Load Performance Report").bold().cyan());
    println!("{}", style("=======================").cyan());

    println!("\n{}", style("Summary:").bold());
    println!(
        "  Requests:            {} ({} measured, {} estimated)",
        summary.total_requests, summary.real_requests, summary.estimated_requests
    );
    println!("  Unique Domains:      {}", summary.unique_domains);
    println!("  Cumulative Time:     {} ms", summary.cumulative_time);
    println!("  Actual Total Time:   {} ms", summary.actual_total_time);
    println!("  Parallel Efficiency: {:.1}%", summary.parallel_efficiency);
    println!("  Average Duration:    {:.2} ms", summary.average_duration);
    println!("  Median Duration:     {:.2} ms", summary.median_duration);
    if let Some((start, end)) = &summary.time_range {
        println!("  Time Range:          {} to {}", start, end);
    }

    println!(
        "\n{} {}/100 ({})",
        style("Score:").bold(),
        report.score.score,
        style(report.score.grade.as_str()).bold()
    );

    if !report.type_stats.is_empty() {
        println!("\n{}", style("By Resource Type:").bold());
        for stats in &report.type_stats {
            println!(
                "  {:<11} {:>4} requests  avg {:>8.1} ms  ({:.1}% of time)",
                stats.resource_type.as_str(),
                stats.count,
                stats.avg_time,
                stats.time_share
            );
        }
    }

    if !report.slowest_requests.is_empty() {
        println!("\n{}", style("Slowest Requests:").bold());
        for (i, req) in report.slowest_requests.iter().enumerate() {
            let marker = if req.estimated { " (estimated)" } else { "" };
            println!(
                "  {}. [{} ms] {}{}",
                i + 1,
                req.duration,
                req.url,
                style(marker).dim()
            );
        }
    }

    if !report.duplicates.duplicates.is_empty() {
        println!("\n{}", style("Duplicate Loads:").bold());
        for dup in &report.duplicates.duplicates {
            println!(
                "  {}x {} (~{:.0} ms wasted)",
                dup.count, dup.url, dup.wasted_time
            );
        }
    }

    if !report.recommendations.is_empty() {
        println!("\n{}", style("Recommendations:").bold());
        for rec in &report.recommendations {
            let priority = match rec.priority {
                Priority::High => style(rec.priority.as_str()).red().bold(),
                Priority::Medium => style(rec.priority.as_str()).yellow(),
                Priority::Low => style(rec.priority.as_str()).dim(),
            };
            println!("  [{}] {}", priority, style(&rec.issue).bold());
            println!("      {}", rec.detail);
            println!("      {}", style(&rec.suggestion).green());
        }
    }

    let diagnostics = &report.diagnostics;
    if diagnostics.records_skipped > 0 || diagnostics.events_rejected > 0 {
        println!(
            "\n{}",
            style(format!(
                "Skipped {} of {} records; rejected {} events",
                diagnostics.records_skipped, diagnostics.records_seen, diagnostics.events_rejected
            ))
            .dim()
        );
    }

    println!(); // trailing newline
}
