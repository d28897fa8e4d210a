//! Recombination of crop sub-tiles into the aggregate tile state

use crate::config::ModelConfig;
use crate::grid::AllVars;
use crate::physics::{FrontFinder, SoilParams};
use crate::state::{Aggregation, EnergyContext, Side, SideFlags};
use crate::vegetation::VegTile;

/// Overwrite each crop tile's aggregate state with the area-weighted mix of
/// its sub-tiles
///
/// The non-irrigated sub-tile weighs `1 - firr` and the irrigated one `firr`,
/// where `firr` is the fraction the sub-tile storage was last reapportioned
/// to (`firr_save`), or the current irrigated fraction before the first
/// reapportionment. Only crop-split tiles with non-zero area are touched; the irrigated-fraction
/// memory on the aggregate record is preserved.
pub fn aggregate_subtiles(
    all_vars: &mut AllVars,
    veg_tiles: &[VegTile],
    soil: &SoilParams,
    config: &ModelConfig,
    finder: &dyn FrontFinder,
    scope: Aggregation,
) {
    let AllVars { tiles, subtiles } = all_vars;
    let Some(subtiles) = subtiles.as_ref() else {
        return;
    };
    let ctx = EnergyContext {
        quick_flux: config.options.quick_flux,
        zsum_node: &soil.zsum_node,
        finder,
    };

    for (iveg, veg_tile) in veg_tiles.iter().enumerate().take(tiles.nitems()) {
        if !veg_tile.has_live_subtiles() {
            continue;
        }
        let flags = SideFlags {
            overstory: veg_tile.overstory,
            lake: false,
            fs_active: soil.fs_active,
        };

        for band in 0..tiles.nbands() {
            let (dry, wet) = subtiles.pair(iveg, band);
            let out = tiles.get_mut(iveg, band);
            let firr = out.veg.firr_save.unwrap_or(out.veg.firr);
            out.weighted_average(
                Side::new(dry, 1.0 - firr).with_flags(flags),
                Side::new(wet, firr).with_flags(flags),
                scope,
                config,
                &ctx,
            );
        }
    }
}
