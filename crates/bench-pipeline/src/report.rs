//! Aggregate pipeline report.

use bench_core::format_duration;
use bench_runner::RunSummary;
use bulk_load::LoadReport;
use datagen::GenerateOutcome;
use std::time::Duration;

/// Overall outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Running,
    /// Every stage completed without failed tables or workloads.
    Passed,
    /// Every stage completed, but some tables or workloads failed.
    Failed,
    /// A stage failed and the remaining stages were not run.
    Error,
}

/// Wall time of one stage.
#[derive(Debug, Clone)]
pub struct StageTiming {
    pub stage: &'static str,
    pub duration: Duration,
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub status: PipelineStatus,
    pub generation: Option<GenerateOutcome>,
    pub load: Option<LoadReport>,
    pub run: Option<RunSummary>,
    pub stages: Vec<StageTiming>,
    pub total_duration: Duration,
    pub errors: Vec<String>,
}

impl PipelineReport {
    pub(crate) fn new() -> Self {
        Self {
            status: PipelineStatus::Running,
            generation: None,
            load: None,
            run: None,
            stages: Vec::new(),
            total_duration: Duration::ZERO,
            errors: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == PipelineStatus::Passed
    }

    /// Record a stage failure. The report keeps whatever finished before it.
    pub(crate) fn abort(&mut self, message: String, total: Duration) {
        self.status = PipelineStatus::Error;
        self.errors.push(message);
        self.total_duration = total;
    }

    pub(crate) fn finish(&mut self, total: Duration) {
        let load_ok = self.load.as_ref().map_or(true, |l| l.success());
        let run_ok = self.run.as_ref().map_or(true, |r| r.error == 0);
        self.status = if load_ok && run_ok {
            PipelineStatus::Passed
        } else {
            PipelineStatus::Failed
        };
        self.total_duration = total;
    }

    pub fn summary(&self) -> String {
        let status = match self.status {
            PipelineStatus::Running => "RUNNING",
            PipelineStatus::Passed => "PASSED",
            PipelineStatus::Failed => "FAILED",
            PipelineStatus::Error => "ERROR",
        };
        let mut summary = format!(
            "Benchmark Report: {}\n\
             ================\n",
            status
        );

        if let Some(generation) = &self.generation {
            summary.push_str(&format!(
                "Generate: scale factor {}, {} partition(s) into {}\n",
                generation.scale_factor,
                generation.parallelism,
                generation.destination.display()
            ));
        }
        if let Some(load) = &self.load {
            summary.push_str(&format!("Load: {}\n", load.summary()));
        }
        if let Some(run) = &self.run {
            summary.push_str(&format!("Run: {}\n", run.summary()));
        }

        summary.push_str("\nStages:\n");
        for stage in &self.stages {
            summary.push_str(&format!(
                "  {:<10} {}\n",
                stage.stage,
                format_duration(stage.duration.as_secs_f64())
            ));
        }
        summary.push_str(&format!(
            "  {:<10} {}\n",
            "total",
            format_duration(self.total_duration.as_secs_f64())
        ));

        if !self.errors.is_empty() {
            summary.push_str("\nErrors:\n");
            for error in &self.errors {
                summary.push_str(&format!("- {error}\n"));
            }
        }
        summary
    }
}
