//! Per-step refresh of vegetation state from forcing
//!
//! Each model step the aggregate veg records take this step's area-averaged
//! properties from the vegetation history, are converted to plant-specific
//! values (split into crop sub-tiles where crop split applies), and the
//! sub-tiles are reapportioned to the new irrigated fraction.
//!
//! Cells are independent of each other, so `step_cells` runs many of them in
//! parallel with rayon.

use crate::config::ModelConfig;
use crate::error::SubtileError;
use crate::grid::AllVars;
use crate::physics::{convert_to_plant_specific, convert_to_plant_specific_crop_subtiles};
use crate::subtile::{handle_subarea_changes, ReapportionSummary};
use crate::vegetation::{VegHistory, VegTile};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Refresh every tile's vegetation state for the current step
///
/// Reads the step-aggregate slot `nr` of each tile's history. Inputs are
/// checked against the containers before anything is modified.
///
/// # Returns
/// Outcome of the sub-tile reapportionment; empty when crop split is off
///
/// # Errors
/// `ShapeMismatch` or `InvalidConfig` when the inputs do not fit `all_vars`
pub fn update_step_vars(
    all_vars: &mut AllVars,
    veg_tiles: &[VegTile],
    veg_hist: &[VegHistory],
    config: &ModelConfig,
) -> Result<ReapportionSummary, SubtileError> {
    all_vars.check_inputs(veg_tiles, veg_hist, config)?;

    let options = &config.options;
    let params = &config.params;
    {
        let AllVars { tiles, subtiles } = &mut *all_vars;
        for iveg in 0..tiles.nitems() {
            let forcing = veg_hist[iveg].at(options.nr);
            let split = options.crop_split && veg_tiles[iveg].crop_split;

            for band in 0..tiles.nbands() {
                let tile = tiles.get_mut(iveg, band);
                let veg = &mut tile.veg;
                veg.albedo = forcing.albedo;
                veg.displacement = forcing.displacement;
                veg.fcanopy = forcing.fcanopy;
                veg.lai = forcing.lai;
                veg.roughness = forcing.roughness;
                if options.irrigation {
                    veg.fcrop = forcing.fcrop;
                    veg.firr = forcing.firr;
                }

                match subtiles.as_mut() {
                    Some(subtiles) if split => {
                        let (dry, wet) = subtiles.pair_mut(iveg, band);
                        convert_to_plant_specific_crop_subtiles(
                            &tile.veg,
                            &mut dry.veg,
                            &mut wet.veg,
                            &mut dry.snow,
                            &mut wet.snow,
                            params,
                        );
                    }
                    _ => convert_to_plant_specific(&mut tile.veg, &mut tile.snow, params),
                }
            }
        }
    }

    if options.crop_split {
        handle_subarea_changes(all_vars, veg_tiles, veg_hist, config)
    } else {
        Ok(ReapportionSummary::default())
    }
}

/// One grid cell with everything the step driver needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub vars: AllVars,
    pub tiles: Vec<VegTile>,
    pub history: Vec<VegHistory>,
}

impl GridCell {
    /// Run `update_step_vars` on this cell
    ///
    /// # Errors
    /// See `update_step_vars`
    pub fn step(&mut self, config: &ModelConfig) -> Result<ReapportionSummary, SubtileError> {
        update_step_vars(&mut self.vars, &self.tiles, &self.history, config)
    }
}

/// Step many cells in parallel
///
/// Returns one result per cell, in order. A failing cell is logged and left
/// unmodified; the others still step.
pub fn step_cells(
    cells: &mut [GridCell],
    config: &ModelConfig,
) -> Vec<Result<ReapportionSummary, SubtileError>> {
    cells
        .par_iter_mut()
        .enumerate()
        .map(|(idx, cell)| {
            let result = cell.step(config);
            if let Err(err) = &result {
                warn!("Cell {} skipped this step: {}", idx, err);
            }
            result
        })
        .collect()
}
