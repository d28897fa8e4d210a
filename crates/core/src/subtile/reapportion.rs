//! Redistribution of stored water between crop sub-tiles when the irrigated
//! fraction changes
//!
//! When the irrigated fraction grows from `old` to `new`, the irrigated
//! sub-tile absorbs the area `new - old` from the non-irrigated one together
//! with the storage that area held. When it shrinks, the non-irrigated
//! sub-tile absorbs `old - new` from the irrigated one. The donor keeps its
//! per-area values, so the area-integrated storage
//! `firr * irrigated + (1 - firr) * non_irrigated` is the same before and
//! after the transfer.
//!
//! Quantities moved: soil moisture of every layer, canopy dew, snow water
//! equivalent and intercepted snow.

use crate::config::ModelConfig;
use crate::error::SubtileError;
use crate::grid::AllVars;
use crate::state::TileState;
use crate::vegetation::{VegHistory, VegTile};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Band visits of one reapportionment pass, by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReapportionSummary {
    /// Irrigated sub-tile grew
    pub grown: usize,
    /// Irrigated sub-tile shrank
    pub shrunk: usize,
    /// Fraction unchanged, or first visit
    pub unchanged: usize,
}

impl ReapportionSummary {
    /// Number of band visits that moved storage
    pub fn transfers(&self) -> usize {
        self.grown + self.shrunk
    }
}

/// Mix the donor's storage into the receiver
///
/// The receiver keeps `kept` of its own area, takes `moved` from the donor,
/// and ends with area `area`.
fn absorb(receiver: &mut TileState, donor: &TileState, kept: f64, moved: f64, area: f64) {
    let mix = |r: f64, d: f64| (r * kept + d * moved) / area;

    for (lr, ld) in receiver.cell.layers.iter_mut().zip(&donor.cell.layers) {
        lr.moist = mix(lr.moist, ld.moist);
    }
    receiver.veg.wdew = mix(receiver.veg.wdew, donor.veg.wdew);
    receiver.snow.swq = mix(receiver.snow.swq, donor.snow.swq);
    receiver.snow.snow_canopy = mix(receiver.snow.snow_canopy, donor.snow.snow_canopy);
}

/// Move storage between crop sub-tiles to follow this step's irrigated fraction
///
/// For every crop-split tile with non-zero area and every band, compares the
/// irrigated fraction remembered on the aggregate veg record with the first
/// sub-step of `veg_hist`, transfers storage in the direction of change, and
/// remembers the new fraction. The first visit only records the fraction.
///
/// # Errors
/// `ShapeMismatch` or `InvalidConfig` from `AllVars::check_inputs`; nothing
/// is moved in that case
pub fn handle_subarea_changes(
    all_vars: &mut AllVars,
    veg_tiles: &[VegTile],
    veg_hist: &[VegHistory],
    config: &ModelConfig,
) -> Result<ReapportionSummary, SubtileError> {
    all_vars.check_inputs(veg_tiles, veg_hist, config)?;

    let mut summary = ReapportionSummary::default();
    let AllVars { tiles, subtiles } = all_vars;
    let Some(subtiles) = subtiles.as_mut() else {
        return Ok(summary);
    };

    for iveg in 0..tiles.nitems() {
        if !veg_tiles[iveg].has_live_subtiles() {
            continue;
        }
        let new_firr = veg_hist[iveg].first_firr();

        for band in 0..tiles.nbands() {
            let veg = &mut tiles.get_mut(iveg, band).veg;
            let old_firr = veg.firr_save.unwrap_or(new_firr);
            let (dry, wet) = subtiles.pair_mut(iveg, band);

            if new_firr > old_firr {
                debug!(
                    "Irrigated area of vegetation {} band {} grows {} -> {}",
                    iveg, band, old_firr, new_firr
                );
                absorb(wet, dry, old_firr, new_firr - old_firr, new_firr);
                summary.grown += 1;
            } else if new_firr < old_firr {
                debug!(
                    "Irrigated area of vegetation {} band {} shrinks {} -> {}",
                    iveg, band, old_firr, new_firr
                );
                absorb(dry, wet, 1.0 - old_firr, old_firr - new_firr, 1.0 - new_firr);
                summary.shrunk += 1;
            } else {
                trace!(
                    "Irrigated area of vegetation {} band {} unchanged at {}",
                    iveg,
                    band,
                    new_firr
                );
                summary.unchanged += 1;
            }

            veg.firr_save = Some(new_firr);
        }
    }

    Ok(summary)
}
