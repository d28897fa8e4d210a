//! Conversion of area-averaged canopy quantities to plant-specific values
//!
//! Forcing supplies LAI, canopy water and intercepted snow averaged over the
//! whole tile. The canopy routines work per unit of plant cover, so these
//! quantities are divided by the canopy fraction. Crop-split tiles are first
//! divided into a non-irrigated sub-tile (fallow plus rainfed crop) and an
//! irrigated sub-tile (pure crop).

use crate::config::Parameters;
use crate::state::{SnowState, VegState};

/// Rescale a tile's canopy quantities from area-average to per-plant
///
/// LAI, dew storage and intercepted snow are divided by the canopy fraction
/// when it is positive. Dew capacity is always recomputed from LAI.
pub fn convert_to_plant_specific(veg: &mut VegState, snow: &mut SnowState, params: &Parameters) {
    if veg.fcanopy > 0.0 {
        veg.lai /= veg.fcanopy;
        veg.wdew /= veg.fcanopy;
        snow.snow_canopy /= veg.fcanopy;
    }
    veg.wdmax = veg.lai * params.veg_lai_water_factor;
}

/// Ceiling of one; anything below the minimum cover snaps to zero
#[inline]
pub(crate) fn clamp_fcanopy(fcanopy: f64, min_fcanopy: f64) -> f64 {
    let fcanopy = fcanopy.min(1.0);
    if fcanopy < min_fcanopy {
        0.0
    } else {
        fcanopy
    }
}

/// Open water below, one above
#[inline]
pub(crate) fn clamp_albedo(albedo: f64, params: &Parameters) -> f64 {
    albedo.clamp(params.albedo_h2o_surf, 1.0)
}

/// Per-plant canopy properties of one land-cover portion
#[derive(Debug, Clone, Copy)]
struct Cover {
    fcanopy: f64,
    albedo: f64,
    lai: f64,
}

/// Split a crop tile into its non-irrigated and irrigated sub-tiles
///
/// `whole` holds this step's area-averaged properties. The fallow and crop
/// portions are derived from it, clamped, and distributed: `sub1` gets the
/// area-weighted mix of fallow and rainfed crop, `sub2` the pure crop. A fully
/// irrigated tile leaves `sub1` as bare soil. Each sub-tile's own dew storage
/// and canopy snow are then rescaled by its canopy fraction, or zeroed when it
/// has no canopy.
pub fn convert_to_plant_specific_crop_subtiles(
    whole: &VegState,
    sub1: &mut VegState,
    sub2: &mut VegState,
    snow1: &mut SnowState,
    snow2: &mut SnowState,
    params: &Parameters,
) {
    let (fallow, crop) = if whole.fcrop > 0.0 {
        (
            Cover {
                fcanopy: 0.0,
                albedo: whole.albedo,
                lai: 0.0,
            },
            Cover {
                fcanopy: whole.fcanopy / whole.fcrop,
                albedo: whole.albedo,
                lai: whole.lai / whole.fcrop,
            },
        )
    } else {
        let uniform = Cover {
            fcanopy: whole.fcanopy,
            albedo: whole.albedo,
            lai: whole.lai,
        };
        (uniform, uniform)
    };
    let fallow = Cover {
        fcanopy: clamp_fcanopy(fallow.fcanopy, params.min_fcanopy),
        albedo: clamp_albedo(fallow.albedo, params),
        ..fallow
    };
    let crop = Cover {
        fcanopy: clamp_fcanopy(crop.fcanopy, params.min_fcanopy),
        albedo: clamp_albedo(crop.albedo, params),
        ..crop
    };

    sub1.firr = 0.0;
    if whole.firr < 1.0 {
        let w_fallow = 1.0 - whole.fcrop;
        let w_rainfed = whole.fcrop - whole.firr;
        let area = 1.0 - whole.firr;
        sub1.fcanopy = (w_fallow * fallow.fcanopy + w_rainfed * crop.fcanopy) / area;
        sub1.albedo = (w_fallow * fallow.albedo + w_rainfed * crop.albedo) / area;
        sub1.lai = (w_fallow * fallow.lai + w_rainfed * crop.lai) / area;
        sub1.wdmax = sub1.lai * params.veg_lai_water_factor;
        sub1.fcrop = w_rainfed / area;
    } else {
        sub1.fcanopy = 0.0;
        sub1.albedo = params.albedo_bare_soil;
        sub1.lai = 0.0;
        sub1.wdmax = 0.0;
        sub1.fcrop = 0.0;
    }
    rescale_canopy_storage(sub1, snow1);

    sub2.fcanopy = crop.fcanopy;
    sub2.albedo = crop.albedo;
    sub2.lai = crop.lai;
    sub2.wdmax = crop.lai * params.veg_lai_water_factor;
    sub2.firr = 1.0;
    sub2.fcrop = 1.0;
    rescale_canopy_storage(sub2, snow2);
}

fn rescale_canopy_storage(veg: &mut VegState, snow: &mut SnowState) {
    if veg.fcanopy > 0.0 {
        veg.wdew /= veg.fcanopy;
        snow.snow_canopy /= veg.fcanopy;
    } else {
        veg.wdew = 0.0;
        snow.snow_canopy = 0.0;
    }
}
