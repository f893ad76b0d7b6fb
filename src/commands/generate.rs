//! Generate command handler.

use bench_config::ConfigProvider;
use clap::Args;
use datagen::{DsdgenLauncher, GenerateRequest, Generator};
use std::path::PathBuf;
use std::sync::Arc;

use super::parse_timeout;

/// Arguments for `generate`.
#[derive(Args, Clone, Debug)]
pub struct GenerateArgs {
    /// Scale factor (roughly GB of raw data)
    #[arg(long, default_value_t = 1)]
    pub scale_factor: u32,

    /// Number of generator workers, one partition each
    #[arg(long, default_value_t = 1)]
    pub parallel: u32,

    /// Output directory (defaults to the stored data_dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(flatten)]
    pub dsdgen: DsdgenOpts,
}

impl GenerateArgs {
    pub fn request(&self) -> GenerateRequest {
        GenerateRequest {
            scale_factor: self.scale_factor,
            parallelism: self.parallel,
            destination: self.data_dir.clone(),
        }
    }
}

/// Location and limits of the `dsdgen` binary.
#[derive(Args, Clone, Debug)]
pub struct DsdgenOpts {
    /// Path to the dsdgen binary
    #[arg(long, default_value = "dsdgen", env = "DSDGEN")]
    pub dsdgen: PathBuf,

    /// Directory holding tpcds.idx; dsdgen runs from here
    #[arg(long, env = "TPCDS_TOOLS_DIR")]
    pub tools_dir: Option<PathBuf>,

    /// Kill a worker that runs longer than this (e.g. "30m")
    #[arg(long)]
    pub worker_timeout: Option<String>,
}

impl DsdgenOpts {
    pub fn launcher(&self) -> anyhow::Result<DsdgenLauncher> {
        let mut launcher = DsdgenLauncher::new(self.dsdgen.clone())
            .with_timeout(parse_timeout(self.worker_timeout.as_deref(), "worker-timeout")?);
        if let Some(dir) = &self.tools_dir {
            launcher = launcher.with_tools_dir(dir.clone());
        }
        Ok(launcher)
    }
}

/// Run the generate command.
pub async fn run_generate(args: GenerateArgs, config: Arc<dyn ConfigProvider>) -> anyhow::Result<()> {
    let launcher = Arc::new(args.dsdgen.launcher()?);
    let generator = Generator::new(launcher, config);

    let outcome = generator.generate(args.request()).await?;
    println!(
        "Generated scale factor {} in {} partition(s) at {} ({})",
        outcome.scale_factor,
        outcome.parallelism,
        outcome.destination.display(),
        bench_core::format_duration(outcome.duration.as_secs_f64())
    );
    Ok(())
}
