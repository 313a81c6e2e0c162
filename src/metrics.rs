//! Batch-run metrics collection and reporting.
//!
//! Uses an HDR histogram for stage-duration percentiles across a run.

use hdrhistogram::Histogram;
use std::time::{Duration, Instant};

/// Metrics for one batch run
#[derive(Debug)]
pub struct BatchMetrics {
    /// Stage duration histogram (milliseconds)
    stage_ms: Histogram<u64>,

    /// Per-stage durations in execution order
    stages: Vec<(&'static str, Duration)>,

    /// Rows read from the results export
    pub rows_in: u64,

    /// Rows in the decoded output
    pub rows_out: u64,

    /// Distinct concept ids referenced by coded strata
    pub candidate_concepts: u64,

    /// Candidates with a vocabulary match
    pub resolved_concepts: u64,

    /// Stratum cells decoded to the no-match placeholder
    pub unmatched_cells: u64,

    /// Run start timestamp
    started: Instant,
}

/// Summary of key metrics for the end-of-run log line
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    /// Total wall time (milliseconds)
    pub total_ms: u64,

    /// Slowest stage name and duration (milliseconds)
    pub slowest_stage: Option<(&'static str, u64)>,

    /// P50 stage duration (milliseconds)
    pub stage_p50_ms: f64,

    /// Stages recorded
    pub stage_count: usize,

    pub rows_in: u64,
    pub rows_out: u64,
    pub candidate_concepts: u64,
    pub resolved_concepts: u64,
    pub unmatched_cells: u64,
}

impl Default for BatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        // Histogram for 1ms to 10 minutes with 2 significant digits
        let stage_ms =
            Histogram::new_with_bounds(1, 600_000, 2).expect("Histogram creation should succeed");

        Self {
            stage_ms,
            stages: Vec::new(),
            rows_in: 0,
            rows_out: 0,
            candidate_concepts: 0,
            resolved_concepts: 0,
            unmatched_cells: 0,
            started: Instant::now(),
        }
    }

    /// Time a stage and record its duration
    pub fn time_stage<T>(&mut self, name: &'static str, run: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let output = run();
        self.record_stage(name, start.elapsed());
        output
    }

    /// Record one stage duration
    pub fn record_stage(&mut self, name: &'static str, duration: Duration) {
        let ms = (duration.as_millis() as u64).max(1);

        if let Err(e) = self.stage_ms.record(ms) {
            tracing::warn!("Failed to record stage duration: {}", e);
        }
        self.stages.push((name, duration));
        tracing::debug!(stage = name, ms, "stage complete");
    }

    /// Get current metrics summary
    pub fn summary(&self) -> MetricsSummary {
        let slowest_stage = self
            .stages
            .iter()
            .max_by_key(|(_, duration)| *duration)
            .map(|(name, duration)| (*name, duration.as_millis() as u64));

        MetricsSummary {
            total_ms: self.started.elapsed().as_millis() as u64,
            slowest_stage,
            stage_p50_ms: self.stage_ms.value_at_quantile(0.5) as f64,
            stage_count: self.stages.len(),
            rows_in: self.rows_in,
            rows_out: self.rows_out,
            candidate_concepts: self.candidate_concepts,
            resolved_concepts: self.resolved_concepts,
            unmatched_cells: self.unmatched_cells,
        }
    }

    /// Log the end-of-run summary
    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            total_ms = summary.total_ms,
            stages = summary.stage_count,
            rows_in = summary.rows_in,
            rows_out = summary.rows_out,
            candidate_concepts = summary.candidate_concepts,
            resolved_concepts = summary.resolved_concepts,
            unmatched_cells = summary.unmatched_cells,
            "batch run complete"
        );
        if let Some((name, ms)) = summary.slowest_stage {
            tracing::debug!(stage = name, ms, "slowest stage");
        }
    }
}
