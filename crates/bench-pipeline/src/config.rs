//! Pipeline configuration.

use bench_runner::RunOptions;
use bulk_load::LoadOptions;
use datagen::GenerateRequest;

/// Which stages to run and how. A `None` stage is skipped.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub generate: Option<GenerateRequest>,
    pub load: Option<LoadOptions>,
    pub run: Option<RunOptions>,
    /// Stop before the workload run if any table failed to load.
    pub fail_on_load_errors: bool,
}

impl PipelineConfig {
    /// All three stages with default load and run settings.
    pub fn full(generate: GenerateRequest, run: RunOptions) -> Self {
        Self {
            generate: Some(generate),
            load: Some(LoadOptions::default()),
            run: Some(run),
            fail_on_load_errors: false,
        }
    }

    /// Names of the enabled stages, in order.
    pub fn stages(&self) -> Vec<&'static str> {
        let mut stages = Vec::new();
        if self.generate.is_some() {
            stages.push("generate");
        }
        if self.load.is_some() {
            stages.push("load");
        }
        if self.run.is_some() {
            stages.push("run");
        }
        stages
    }
}
