use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{info, warn};

use super::{BuildingSimplification, SimplificationParams, SimplificationRecord};
use crate::building::{BuildingTree, VoxelBuilding};
use crate::error::Result;
use crate::operations::layering::{Layering, DEFAULT_LAYERING_THRESHOLD, DEFAULT_MIN_SLICES_PER_LAYER};
use crate::operations::simplify::{AlgorithmSpec, LegacyParams};

/// Settings of a batch run over many buildings.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub algorithms: AlgorithmSpec,
    pub params: SimplificationParams,
    pub min_slices_per_layer: usize,
    pub layering_threshold: f64,
    /// Write per-contour statistics to `stats_path` after the run.
    pub record_stats: bool,
    pub stats_path: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::from_legacy(&LegacyParams::default())
    }
}

impl BatchConfig {
    /// Builds a configuration from legacy flat parameters.
    #[must_use]
    pub fn from_legacy(legacy: &LegacyParams) -> Self {
        Self {
            algorithms: AlgorithmSpec::from_legacy(legacy),
            params: SimplificationParams::default(),
            min_slices_per_layer: DEFAULT_MIN_SLICES_PER_LAYER,
            layering_threshold: DEFAULT_LAYERING_THRESHOLD,
            record_stats: false,
            stats_path: PathBuf::from("records.txt"),
        }
    }
}

/// Output of [`simplify_buildings`].
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Simplified trees, grouped by input building in input order.
    pub trees: Vec<BuildingTree>,
    /// Statistics of every simplified contour, in the order of `trees`.
    pub records: Vec<SimplificationRecord>,
    pub elapsed: Duration,
}

/// Layers and simplifies every building in parallel.
///
/// Buildings are independent. A tree that fails to simplify is logged and
/// left out without affecting the others. The deadline in `config.params`
/// covers layering and every tree of one building.
///
/// # Errors
///
/// Returns an error if the statistics file cannot be written.
pub fn simplify_buildings(buildings: &[VoxelBuilding], config: &BatchConfig) -> Result<BatchReport> {
    let started = Instant::now();
    let layering = Layering::new(config.layering_threshold, config.min_slices_per_layer);
    let simplification = BuildingSimplification::new(config.algorithms.clone()).with_params(config.params);

    let per_building: Vec<Vec<(BuildingTree, Vec<SimplificationRecord>)>> = buildings
        .par_iter()
        .map(|building| {
            let building_started = Instant::now();
            let trees = match layering.execute(building) {
                Ok(trees) => trees,
                Err(e) => {
                    warn!(building = building.building_id, error = %e, "layering failed");
                    return Vec::new();
                }
            };
            trees
                .iter()
                .filter_map(|tree| match simplification.execute_from(tree, building_started) {
                    Ok(out) => Some((out.tree, out.records)),
                    Err(e) => {
                        warn!(building = building.building_id, error = %e, "dropping building tree");
                        None
                    }
                })
                .collect()
        })
        .collect();

    let mut trees = Vec::new();
    let mut records = Vec::new();
    for (tree, recs) in per_building.into_iter().flatten() {
        trees.push(tree);
        records.extend(recs);
    }

    let elapsed = started.elapsed();
    info!(
        buildings = buildings.len(),
        trees = trees.len(),
        elapsed_ms = elapsed.as_millis(),
        "batch simplification finished"
    );

    if config.record_stats {
        write_records(&config.stats_path, &records)?;
    }
    Ok(BatchReport {
        trees,
        records,
        elapsed,
    })
}

/// Writes one `error_ratio primitive_count algorithm_id` line per record,
/// replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_records(path: &Path, records: &[SimplificationRecord]) -> Result<()> {
    let mut out = String::new();
    for r in records {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{} {} {}", r.error_ratio, r.primitive_count, r.algorithm.id());
    }
    std::fs::write(path, out)?;
    Ok(())
}
