pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod duplicates;
pub mod error;
pub mod infer;
pub mod io_utils;
pub mod key;
pub mod mapping;
pub mod merge;
pub mod merge_cmd;
pub mod preview;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

pub use crate::{
    data::Value,
    dataset::Dataset,
    error::ReconcileError,
    mapping::{FieldMapping, MappingPair},
    merge::{MergeMode, MergeOutcome, MergeStats, ReconcileConfig, merge, reconcile},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_reconcile", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Merge(args) => merge_cmd::execute(&args),
        Commands::Mapping(args) => merge_cmd::execute_mapping(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}
