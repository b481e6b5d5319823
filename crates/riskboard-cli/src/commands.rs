use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use riskboard_engine::config::{load_engine_config, EngineConfig};
use riskboard_engine::random::RandomSource;
use riskboard_engine::report::build_dashboard;
use riskboard_engine::{EngineError, ReportEngine};

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
}

impl GlobalOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config: matches.get_one::<PathBuf>("config").cloned(),
            seed: matches.get_one::<u64>("seed").copied(),
            output: matches.get_one::<PathBuf>("output_file").cloned(),
        }
    }

    fn engine_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => {
                log::info!("[riskboard] Using config: {:?}", path);
                load_engine_config(path)
            }
            None => {
                log::info!("[riskboard] No config provided; using defaults.");
                Ok(EngineConfig::default())
            }
        }
    }

    fn engine(&self) -> Result<ReportEngine> {
        Ok(ReportEngine::from_config(self.engine_config()?))
    }

    fn rng(&self) -> Box<dyn RandomSource> {
        match self.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(rand::thread_rng()),
        }
    }
}

fn emit(options: &GlobalOptions, text: &str) -> Result<()> {
    match &options.output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("[riskboard] Output written to {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn emit_json<T: Serialize>(options: &GlobalOptions, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    emit(options, &json)
}

pub fn run_models(options: &GlobalOptions) -> Result<()> {
    let config = options.engine_config()?;
    emit_json(options, &config.catalog)
}

pub fn run_report(options: &GlobalOptions, model_id: &str) -> Result<()> {
    let engine = options.engine()?;
    let mut rng = options.rng();
    let report = engine.get_report_with(model_id, rng.as_mut())?;
    emit_json(options, &report)
}

pub fn run_compare(options: &GlobalOptions) -> Result<()> {
    let engine = options.engine()?;
    let mut rng = options.rng();
    let rows = engine.get_comparison_with(rng.as_mut());
    emit_json(options, &rows)
}

pub fn run_stats(options: &GlobalOptions) -> Result<()> {
    let engine = options.engine()?;
    let mut rng = options.rng();
    let stats = engine.get_population_stats_with(rng.as_mut())?;
    emit_json(options, &stats)
}

pub fn run_dashboard(options: &GlobalOptions, model_id: &str) -> Result<()> {
    let Some(path) = &options.output else {
        bail!("dashboard requires --output <file.html>");
    };
    let engine = options.engine()?;
    let mut rng = options.rng();

    let report = engine.get_report_with(model_id, rng.as_mut())?;
    let comparison = engine.get_comparison_with(rng.as_mut());
    let stats = match engine.get_population_stats_with(rng.as_mut()) {
        Ok(stats) => Some(stats),
        Err(EngineError::DataUnavailable) => {
            log::warn!("[riskboard] No dataset loaded; dashboard omits population statistics");
            None
        }
        Err(err) => return Err(err.into()),
    };

    build_dashboard(&report, &comparison, stats.as_ref()).save_to_file(path)
}
