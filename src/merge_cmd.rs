//! `merge` and `mapping` subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;

use crate::{
    cli::{DatasetArgs, MappingArgs, MergeArgs},
    config::{ProfileOverrides, ReconcileProfile},
    dataset::{self, Dataset, LoadOptions},
    io_utils,
    key::KeyColumns,
    mapping::{self, MappingPair},
    merge::{MergeMode, MergeReport, MergeStats, ReconcileConfig, reconcile},
    table,
};

struct LoadedInputs {
    primary: Dataset,
    secondary: Dataset,
    delimiter: u8,
    config: ReconcileConfig,
}

fn load_inputs(
    args: &DatasetArgs,
    mode: Option<MergeMode>,
    add_missing_rows: Option<bool>,
    allow_empty: Option<bool>,
) -> Result<LoadedInputs> {
    let profile = match &args.config {
        Some(path) => ReconcileProfile::load(path)?,
        None => ReconcileProfile::default(),
    };
    let mapping = match &args.mapping {
        Some(path) => Some(mapping::load_mapping(path)?),
        None => None,
    };
    let key_columns = args
        .key
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect::<Vec<_>>();
    let config = profile.into_config(ProfileOverrides {
        key_columns,
        mode,
        add_missing_rows,
        allow_empty,
        mapping,
    })?;

    let delimiter = io_utils::resolve_input_delimiter(&args.primary, args.delimiter);
    let primary = load_dataset(
        &args.primary,
        delimiter,
        args.primary_encoding.as_deref(),
        args.keep_na_tokens,
    )?;
    let secondary = load_dataset(
        &args.secondary,
        io_utils::resolve_input_delimiter(&args.secondary, args.delimiter),
        args.secondary_encoding.as_deref(),
        args.keep_na_tokens,
    )?;
    info!(
        "Loaded primary {:?} ({} row(s)) and secondary {:?} ({} row(s))",
        args.primary,
        primary.len(),
        args.secondary,
        secondary.len()
    );
    Ok(LoadedInputs {
        primary,
        secondary,
        delimiter,
        config,
    })
}

fn load_dataset(
    path: &Path,
    delimiter: u8,
    encoding: Option<&str>,
    keep_na_tokens: bool,
) -> Result<Dataset> {
    let options = LoadOptions {
        delimiter,
        encoding: io_utils::resolve_encoding(encoding)?,
        placeholders_as_missing: !keep_na_tokens,
    };
    dataset::load_csv(path, &options).with_context(|| format!("Loading dataset {path:?}"))
}

/// An existing directory receives a timestamped file name.
fn resolve_output_path(output: Option<&Path>) -> Option<PathBuf> {
    let path = output?;
    if path.is_dir() {
        let name = format!("merged_result_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
        Some(path.join(name))
    } else {
        Some(path.to_path_buf())
    }
}

#[derive(Serialize)]
struct MergeSummary<'a> {
    mode: MergeMode,
    key_columns: &'a [String],
    stats: MergeStats,
    warnings: MergeReport,
    mapping: &'a [MappingPair],
}

pub fn execute(args: &MergeArgs) -> Result<()> {
    let LoadedInputs {
        primary,
        secondary,
        delimiter,
        config,
    } = load_inputs(
        &args.inputs,
        args.mode,
        args.no_append.then_some(false),
        args.allow_empty.then_some(true),
    )?;
    info!(
        "Reconciling on key column(s) [{}] with mode {:?}{}",
        config.key_columns.iter().join(", "),
        config.mode,
        if config.add_missing_rows {
            ", appending secondary-only rows"
        } else {
            ""
        }
    );

    if let Some(path) = &args.save_config {
        ReconcileProfile::from_config(&config).save(path)?;
        info!("Saved reconcile profile to {path:?}");
    }

    let outcome = reconcile(&primary, &secondary, &config).context("Reconciling datasets")?;

    let output = resolve_output_path(args.output.as_deref());
    let output_delimiter =
        io_utils::resolve_output_delimiter(output.as_deref(), args.output_delimiter, delimiter);
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    dataset::write_csv(
        &outcome.dataset,
        output.as_deref(),
        output_delimiter,
        output_encoding,
    )?;

    if let Some(rows) = args.preview {
        eprint!("{}", table::render_dataset(&outcome.dataset, rows));
        eprint!("{}", table::render_stats(&outcome.stats));
    }

    if let Some(path) = &args.stats_json {
        let summary = MergeSummary {
            mode: config.mode,
            key_columns: &config.key_columns,
            stats: outcome.stats,
            warnings: outcome.report,
            mapping: outcome.mapping.pairs(),
        };
        let json = serde_json::to_string_pretty(&summary).context("Serializing merge summary")?;
        std::fs::write(path, json).with_context(|| format!("Writing merge summary {path:?}"))?;
    }

    let destination = output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    let stats = outcome.stats;
    info!(
        "Merge complete: {} row(s) updated | {} cell(s) filled | {} cell(s) overwritten | {} row(s) appended -> {}",
        stats.touched_rows,
        stats.filled_cells,
        stats.overwritten_cells,
        stats.appended_rows,
        destination
    );
    Ok(())
}

pub fn execute_mapping(args: &MappingArgs) -> Result<()> {
    let LoadedInputs {
        primary,
        secondary,
        config,
        ..
    } = load_inputs(&args.inputs, None, None, Some(true))?;
    let keys = KeyColumns::resolve(&config.key_columns, &primary, &secondary)
        .context("Resolving key columns")?;
    let resolved = mapping::resolve_mapping(
        config.mapping.as_ref(),
        primary.columns(),
        secondary.columns(),
        keys.names(),
    );
    if resolved.is_empty() {
        warn!("No valid destination/source pairs for the current columns");
    }
    let dropped = resolved.dropped() + config.mapping_malformed;

    match &args.output {
        Some(path) => {
            mapping::save_mapping(path, &resolved)?;
            let headers = vec!["destination".to_string(), "source".to_string()];
            let rows = resolved
                .pairs()
                .iter()
                .map(|pair| vec![pair.dest.clone(), pair.src.clone()])
                .collect::<Vec<_>>();
            table::print_table(&headers, &rows);
            info!(
                "Wrote {} mapping pair(s) ({} dropped) to {:?}",
                resolved.len(),
                dropped,
                path
            );
        }
        None => {
            println!("{}", resolved.to_json()?);
            if dropped > 0 {
                warn!("{dropped} mapping pair(s) dropped");
            }
        }
    }
    Ok(())
}
