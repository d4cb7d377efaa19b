use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info};

use sciml_datagen::logging::{LogConfig, LogFormat, LogLevel, init_logging};
use sciml_datagen::sim::{CancelToken, NativeKernel};
use sciml_datagen::{BatchOrchestrator, DatagenConfig, ResultAggregator, Survey};

/// Generate migrated magnetic field samples over a tetrahedral mesh
#[derive(Parser)]
#[command(name = "sciml-datagen", version)]
struct Args {
    /// YAML run configuration
    #[arg(long, alias = "config_file")]
    config_file: PathBuf,

    /// Shared library providing the field kernel (overrides `kernel.library`)
    #[arg(long)]
    kernel_lib: Option<PathBuf>,

    /// Number of worker threads (overrides `n_cpu`)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    workers: Option<u16>,

    /// Number of samples to process (overrides `n_samp`)
    #[arg(long)]
    n_samples: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Args {
    /// Applies command-line overrides on top of the file configuration.
    fn apply_overrides(&self, config: &mut DatagenConfig) {
        if let Some(workers) = self.workers {
            config.n_cpu = usize::from(workers);
        }
        if let Some(n) = self.n_samples {
            config.n_samp = n;
        }
    }

    fn log_config(&self, config: &DatagenConfig) -> LogConfig {
        LogConfig {
            level: LogLevel::from_verbosity(self.verbose),
            format: self.log_format,
            thread_names: config.n_cpu > 1,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = DatagenConfig::from_file(&args.config_file)?;
    args.apply_overrides(&mut config);
    init_logging(&args.log_config(&config));
    run(args, config)
}

fn run(args: Args, config: DatagenConfig) -> Result<()> {
    let library = args
        .kernel_lib
        .or_else(|| config.kernel.library.clone())
        .context("No kernel library given (use --kernel-lib or `kernel.library`)")?;

    let survey = Survey::load(&config)?;
    info!(
        nodes = survey.mesh.node_count(),
        cells = survey.mesh.cell_count(),
        receivers = survey.receivers.len(),
        "Survey loaded"
    );

    let context = survey.context();
    let kernel = NativeKernel::load(&library, &config.kernel.symbol, &context)?;
    let loader = config.sample_loader();
    let options = config.batch_options();
    let batch = BatchOrchestrator::new(context, &kernel, &loader, options);

    let results = ResultAggregator::new();
    let cancel = CancelToken::new();
    let every = (options.sample_count / 10).max(1);
    let summary = batch.run_with_progress(&results, &cancel, every, |p| {
        info!(
            done = p.samples_done,
            total = p.sample_count,
            failed = p.failed,
            elapsed_s = p.elapsed.as_secs_f64(),
            "Progress"
        );
    })?;

    for r in results.ordered() {
        info!(
            sample = r.sample,
            min = r.min(),
            max = r.max(),
            mean = r.mean(),
            "Sample result"
        );
    }
    for f in &summary.failed {
        error!(sample = f.sample, reason = %f.reason, "Sample failed");
    }

    if !summary.failed.is_empty() {
        bail!(
            "{} of {} samples failed",
            summary.failed.len(),
            options.sample_count
        );
    }
    if summary.cancelled {
        bail!("Batch cancelled");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "\
Bx: 0.0
By: 0.0
Bz: 50000.0
mesh:
  dir_name: mesh
  base_file_name: survey
reciever_locations_file: rx.csv
model:
  dir_name: models
  sus_name_prefix: sus_
  kx_name_prefix: kx_
  ky_name_prefix: ky_
  kz_name_prefix: kz_
n_samp: 10
ismag: true
istensor: false
";

    fn configured(extra: &str, argv: &[&str]) -> (Args, DatagenConfig) {
        let mut config = DatagenConfig::parse(&format!("{YAML}{extra}")).unwrap();
        let args = Args::try_parse_from(
            ["sciml-datagen", "--config-file", "run.yml"]
                .iter()
                .chain(argv)
                .copied(),
        )
        .unwrap();
        args.apply_overrides(&mut config);
        (args, config)
    }

    #[test]
    fn test_thread_names_follow_config_workers() {
        let (args, config) = configured("n_cpu: 4\n", &[]);
        assert_eq!(config.n_cpu, 4);
        assert!(args.log_config(&config).thread_names);

        let (args, config) = configured("", &[]);
        assert!(!args.log_config(&config).thread_names);
    }

    #[test]
    fn test_cli_overrides_config() {
        let argv = ["--workers", "1", "--n-samples", "3", "-vv"];
        let (args, config) = configured("n_cpu: 4\n", &argv);
        assert_eq!(config.n_cpu, 1);
        assert_eq!(config.n_samp, 3);
        let log = args.log_config(&config);
        assert!(!log.thread_names);
        assert_eq!(log.level, LogLevel::Trace);
    }

    #[test]
    fn test_config_file_alias() {
        let args = Args::try_parse_from(["sciml-datagen", "--config_file", "run.yml"]).unwrap();
        assert_eq!(args.config_file, PathBuf::from("run.yml"));
        let zero_workers = ["sciml-datagen", "--config-file", "a", "--workers", "0"];
        assert!(Args::try_parse_from(zero_workers).is_err());
    }
}
