//! Cell-level fill/overwrite pass and row-append pass.
//!
//! [`reconcile`] validates a [`ReconcileConfig`] against both datasets and then
//! runs [`merge`]. The merge itself cannot fail: it borrows both inputs and
//! builds a new result row by row, primary rows first (original order), then
//! appended secondary-only rows.

use std::collections::HashSet;

use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    dataset::{Dataset, Record},
    duplicates::{SecondaryIndex, detect_duplicates, resolve_secondary},
    error::{ReconcileError, Result},
    key::{KeyColumns, NormalizedKey, normalize, normalize_by_name},
    mapping::{FieldMapping, MappingOrigin, ParsedMapping, ResolvedMapping, resolve_mapping},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MergeMode {
    /// Only populate destination cells that are missing or empty.
    #[default]
    FillEmptyOnly,
    /// Populate empty cells and replace differing non-empty cells.
    PreferSecondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeStats {
    pub touched_rows: usize,
    pub filled_cells: usize,
    pub overwritten_cells: usize,
    pub appended_rows: usize,
}

/// Recoverable conditions noticed while merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeReport {
    pub primary_duplicate_keys: usize,
    pub secondary_duplicate_keys: usize,
    pub secondary_rows_discarded: usize,
    pub dropped_mapping_pairs: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileConfig {
    pub key_columns: Vec<String>,
    pub mode: MergeMode,
    pub add_missing_rows: bool,
    /// `None` selects the identity mapping over shared non-key columns.
    pub mapping: Option<FieldMapping>,
    /// Entries skipped while parsing `mapping`; reported as dropped pairs.
    pub mapping_malformed: usize,
    /// Merge even when a dataset has no rows instead of failing.
    pub allow_empty: bool,
}

impl ReconcileConfig {
    pub fn new(key_columns: Vec<String>) -> Self {
        Self {
            key_columns,
            mode: MergeMode::default(),
            add_missing_rows: true,
            mapping: None,
            mapping_malformed: 0,
            allow_empty: false,
        }
    }

    pub fn with_mode(mut self, mode: MergeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_add_missing_rows(mut self, add: bool) -> Self {
        self.add_missing_rows = add;
        self
    }

    pub fn with_mapping(mut self, mapping: FieldMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Uses a parsed mapping file, carrying its malformed entry count.
    pub fn with_parsed_mapping(mut self, parsed: ParsedMapping) -> Self {
        self.mapping = Some(parsed.mapping);
        self.mapping_malformed = parsed.malformed;
        self
    }

    pub fn with_allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub dataset: Dataset,
    pub stats: MergeStats,
    pub report: MergeReport,
    pub mapping: ResolvedMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellDecision {
    Keep,
    Fill,
    Overwrite,
}

/// Decides what happens to one destination cell given the incoming value.
///
/// A blank incoming value never writes.
pub fn decide_cell(current: &Value, incoming: &Value, mode: MergeMode) -> CellDecision {
    if incoming.is_blank() {
        return CellDecision::Keep;
    }
    if current.is_empty_cell() {
        return CellDecision::Fill;
    }
    match mode {
        MergeMode::FillEmptyOnly => CellDecision::Keep,
        MergeMode::PreferSecondary if current != incoming => CellDecision::Overwrite,
        MergeMode::PreferSecondary => CellDecision::Keep,
    }
}

/// Validates `config` and merges `secondary` into `primary`.
///
/// Every error is raised before the first output row is built.
pub fn reconcile(
    primary: &Dataset,
    secondary: &Dataset,
    config: &ReconcileConfig,
) -> Result<MergeOutcome> {
    if !config.allow_empty && (primary.is_empty() || secondary.is_empty()) {
        return Err(ReconcileError::EmptyInput {
            primary_rows: primary.len(),
            secondary_rows: secondary.len(),
        });
    }
    let keys = KeyColumns::resolve(&config.key_columns, primary, secondary)?;
    let mapping = resolve_mapping(
        config.mapping.as_ref(),
        primary.columns(),
        secondary.columns(),
        keys.names(),
    );
    let dropped_pairs = mapping.dropped() + config.mapping_malformed;
    if mapping.origin() == MappingOrigin::Explicit && mapping.is_empty() {
        return Err(ReconcileError::configuration(format!(
            "explicit mapping has no valid destination/source pairs ({dropped_pairs} dropped)"
        )));
    }
    if dropped_pairs > 0 {
        warn!("Dropped {dropped_pairs} invalid mapping pair(s)");
    }
    if mapping.is_empty() {
        debug!("Mapping resolved to zero pairs; only row appending can apply");
    }

    let primary_keys = normalize_by_name(primary, keys.names())?;
    let secondary_keys = normalize_by_name(secondary, keys.names())?;

    let primary_duplicates = detect_duplicates(&primary_keys);
    if !primary_duplicates.is_empty() {
        warn!(
            "Primary dataset has {} duplicated key(s); each row is merged independently",
            primary_duplicates.len()
        );
    }
    let secondary_duplicates = detect_duplicates(&secondary_keys);
    let index = resolve_secondary(&secondary_keys);
    if !secondary_duplicates.is_empty() {
        warn!(
            "Secondary dataset has {} duplicated key(s); keeping the last record per key ({} row(s) discarded)",
            secondary_duplicates.len(),
            index.discarded()
        );
    }

    let (dataset, stats) = execute(
        primary,
        secondary,
        &MergeInputs {
            keys: &keys,
            primary_keys: &primary_keys,
            secondary_keys: &secondary_keys,
            index: &index,
            pairs: &pair_positions(primary, secondary, &mapping),
            mode: config.mode,
            add_missing_rows: config.add_missing_rows,
        },
    );
    let report = MergeReport {
        primary_duplicate_keys: primary_duplicates.len(),
        secondary_duplicate_keys: secondary_duplicates.len(),
        secondary_rows_discarded: index.discarded(),
        dropped_mapping_pairs: dropped_pairs,
    };
    Ok(MergeOutcome {
        dataset,
        stats,
        report,
        mapping,
    })
}

/// Merges with already-resolved keys and mapping.
///
/// Mapping pairs naming columns absent from either dataset are ignored.
pub fn merge(
    primary: &Dataset,
    secondary: &Dataset,
    keys: &KeyColumns,
    mapping: &ResolvedMapping,
    mode: MergeMode,
    add_missing_rows: bool,
) -> (Dataset, MergeStats) {
    let primary_keys = normalize(primary, keys.primary_indices());
    let secondary_keys = normalize(secondary, keys.secondary_indices());
    let index = resolve_secondary(&secondary_keys);
    execute(
        primary,
        secondary,
        &MergeInputs {
            keys,
            primary_keys: &primary_keys,
            secondary_keys: &secondary_keys,
            index: &index,
            pairs: &pair_positions(primary, secondary, mapping),
            mode,
            add_missing_rows,
        },
    )
}

fn pair_positions(
    primary: &Dataset,
    secondary: &Dataset,
    mapping: &ResolvedMapping,
) -> Vec<(usize, usize)> {
    mapping
        .pairs()
        .iter()
        .filter_map(|pair| {
            Some((
                primary.column_index(&pair.dest)?,
                secondary.column_index(&pair.src)?,
            ))
        })
        .collect()
}

struct MergeInputs<'a> {
    keys: &'a KeyColumns,
    primary_keys: &'a [NormalizedKey],
    secondary_keys: &'a [NormalizedKey],
    index: &'a SecondaryIndex,
    pairs: &'a [(usize, usize)],
    mode: MergeMode,
    add_missing_rows: bool,
}

fn execute(
    primary: &Dataset,
    secondary: &Dataset,
    inputs: &MergeInputs<'_>,
) -> (Dataset, MergeStats) {
    let mut stats = MergeStats::default();
    let mut rows: Vec<Record> = Vec::with_capacity(primary.len());

    for (record, key) in primary.rows().iter().zip(inputs.primary_keys) {
        let mut out = record.clone();
        if let Some(source) = inputs.index.get(key).and_then(|idx| secondary.rows().get(idx)) {
            let mut wrote = false;
            for &(dest, src) in inputs.pairs {
                let incoming = &source[src];
                match decide_cell(&out[dest], incoming, inputs.mode) {
                    CellDecision::Keep => continue,
                    CellDecision::Fill => stats.filled_cells += 1,
                    CellDecision::Overwrite => stats.overwritten_cells += 1,
                }
                out[dest] = incoming.clone();
                wrote = true;
            }
            if wrote {
                stats.touched_rows += 1;
            }
        }
        rows.push(out);
    }
    debug!(
        "Merged {} primary row(s): {} touched, {} filled, {} overwritten",
        primary.len(),
        stats.touched_rows,
        stats.filled_cells,
        stats.overwritten_cells
    );

    if inputs.add_missing_rows {
        let present: HashSet<&NormalizedKey> = inputs.primary_keys.iter().collect();
        let width = primary.columns().len();
        for &row_idx in inputs.index.retained_rows() {
            if present.contains(&inputs.secondary_keys[row_idx]) {
                continue;
            }
            let source = &secondary.rows()[row_idx];
            rows.push(appended_row(source, width, inputs));
            stats.appended_rows += 1;
        }
        debug!("Appended {} secondary-only row(s)", stats.appended_rows);
    }

    (
        Dataset::from_trusted(primary.columns().to_vec(), rows),
        stats,
    )
}

// Key columns carry the secondary's raw key values; mapped destinations take
// their source values; everything else is missing.
fn appended_row(source: &[Value], width: usize, inputs: &MergeInputs<'_>) -> Record {
    let mut out = vec![Value::Missing; width];
    let key_positions = inputs
        .keys
        .primary_indices()
        .iter()
        .zip(inputs.keys.secondary_indices());
    for (&dest, &src) in key_positions.chain(inputs.pairs.iter().map(|(d, s)| (d, s))) {
        if let (Some(slot), Some(value)) = (out.get_mut(dest), source.get(src)) {
            *slot = value.clone();
        }
    }
    out
}
