use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

mod commands;

use commands::{
    run_compare, run_dashboard, run_models, run_report, run_stats, GlobalOptions,
};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("RISKBOARD_LOG", "error,riskboard=info"))
        .init();

    let model_id_arg = || {
        Arg::new("model_id")
            .help("Catalog id of the model, e.g. random_forest")
            .required(true)
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .value_hint(ValueHint::Other)
    };

    let matches = Command::new("riskboard")
        .version(clap::crate_version!())
        .about("Model evaluation reports and population risk statistics for clinical classifiers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to the engine JSON configuration. Without one, every report is synthetic.")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed for synthetic values, for reproducible output")
                .global(true)
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("output_file")
                .short('o')
                .long("output")
                .help("Write output to this file instead of stdout")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .subcommand(Command::new("models").about("List the model catalog"))
        .subcommand(
            Command::new("report")
                .about("Evaluation report for one model (JSON)")
                .arg(model_id_arg()),
        )
        .subcommand(Command::new("compare").about("Accuracy and latency of every catalog model (JSON)"))
        .subcommand(
            Command::new("stats").about("Population size and risk tier distribution (JSON)"),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Render an HTML dashboard for one model; requires --output")
                .arg(model_id_arg()),
        )
        .get_matches();

    // global args are read from the subcommand, where clap records them
    let Some((name, sub_m)) = matches.subcommand() else {
        unreachable!("Subcommand is required by CLI configuration")
    };
    let options = GlobalOptions::from_matches(sub_m);

    match name {
        "models" => run_models(&options),
        "report" => run_report(&options, model_id(sub_m)),
        "compare" => run_compare(&options),
        "stats" => run_stats(&options),
        "dashboard" => run_dashboard(&options, model_id(sub_m)),
        _ => unreachable!(),
    }
}

fn model_id(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("model_id")
        .map(String::as_str)
        .unwrap_or_default()
}
