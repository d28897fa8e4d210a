//! Seeding of crop sub-tiles from the aggregate tile state

use crate::config::ModelConfig;
use crate::error::SubtileError;
use crate::grid::{AllVars, Subtile};
use crate::vegetation::{VegHistory, VegTile};
use tracing::debug;

/// Copy each crop tile's aggregate state into its sub-tiles
///
/// Both sub-tiles start as full copies of the aggregate records. Canopy
/// storages are then reassigned so that the area-weighted sum still matches
/// the aggregate: the non-irrigated sub-tile starts dry, and the irrigated
/// sub-tile holds the whole tile's dew and intercepted snow per unit of
/// irrigated area. Bare soil is never split.
///
/// # Errors
/// Returns a shape mismatch when the per-tile inputs do not line up with
/// `all_vars`.
pub fn initialize_crop_subtiles(
    all_vars: &mut AllVars,
    veg_tiles: &[VegTile],
    veg_hist: &[VegHistory],
    config: &ModelConfig,
) -> Result<(), SubtileError> {
    all_vars.check_inputs(veg_tiles, veg_hist, config)?;

    let nr = config.options.nr;
    let nveg = all_vars.nveg();
    let AllVars { tiles, subtiles } = all_vars;
    let Some(subtiles) = subtiles.as_mut() else {
        return Ok(());
    };

    for veg in 0..nveg {
        if !veg_tiles[veg].crop_split {
            continue;
        }
        let firr = veg_hist[veg].at(nr).firr;
        debug!(
            "Initializing {} sub-tiles of vegetation {} with firr {}",
            veg_tiles[veg].nsubtiles, veg, firr
        );

        for subtile in Subtile::ALL.into_iter().take(veg_tiles[veg].nsubtiles) {
            for band in 0..tiles.nbands() {
                let whole = tiles.get(veg, band);
                let sub = subtiles.get_mut(veg, subtile, band);
                sub.copy_from(whole);

                match subtile {
                    Subtile::NonIrrigated => {
                        sub.veg.wdew = 0.0;
                        sub.snow.snow_canopy = 0.0;
                    }
                    Subtile::Irrigated => {
                        if firr > 0.0 {
                            sub.veg.wdew = whole.veg.wdew / firr;
                            sub.snow.snow_canopy = whole.snow.snow_canopy / firr;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
