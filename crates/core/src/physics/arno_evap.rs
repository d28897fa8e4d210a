//! Bare-soil evaporation with the ARNO variable infiltration curve
//!
//! The fraction of the tile that is saturated evaporates at the potential
//! rate; the unsaturated remainder evaporates at a rate reduced by a beta
//! function of the infiltration capacity distribution.
//!
//! # Scientific References
//! - Franchini, M., Pacciani, M. (1991). "Comparative analysis of several
//!   conceptual rainfall-runoff models"
//!   Journal of Hydrology, 122, 161-219
//! - Liang, X., Lettenmaier, D.P., Wood, E.F., Burges, S.J. (1994). "A simple
//!   hydrologically based model of land surface water and energy fluxes for
//!   general circulation models"
//!   Journal of Geophysical Research, 99(D7), 14415-14428

use super::{Forcing, PotentialEvaporation, SoilParams};
use crate::config::{ModelConfig, MM_PER_M, SECONDS_PER_DAY};
use crate::state::LayerState;
use tracing::error;

/// Terms of the power expansion used for the beta function
const BETA_SERIES_TERMS: i32 = 30;

/// Compute bare-soil evaporation and distribute it over the top layers
///
/// # Arguments
/// * `layers` - Soil layers of the tile; `esoil` of the contributing layers is
///   overwritten
/// * `forcing` - Air temperature, net radiation and vapour pressure deficit
/// * `soil` - Layer capacities, residual moisture, infiltration shape and
///   frost-area fractions
/// * `ra` - Aerodynamic resistance (s/m)
/// * `delta_t` - Step length (s)
/// * `config` - Decides whether one or two layers contribute
/// * `evaporator` - Potential evaporation solver
///
/// # Returns
/// Evaporation rate (m/s)
pub fn arno_evap(
    layers: &mut [LayerState],
    forcing: &Forcing,
    soil: &SoilParams,
    ra: f64,
    delta_t: f64,
    config: &ModelConfig,
    evaporator: &dyn PotentialEvaporation,
) -> f64 {
    let nlayers = config.esoil_layers();

    let mut moist = 0.0;
    let mut max_moist_tot = 0.0;
    let mut resid_moist_tot = 0.0;
    for (lidx, layer) in layers.iter().take(nlayers).enumerate() {
        moist += layer.liquid_moisture(&soil.frost_fract);
        max_moist_tot += soil.max_moist[lidx];
        resid_moist_tot += soil.resid_moist[lidx];
    }
    let moist = moist.min(max_moist_tot);

    // Potential bare-soil evaporation over the step (mm)
    let epot = evaporator.potential_evap(
        forcing.air_temp,
        soil.elevation,
        forcing.rad,
        forcing.vpd,
        ra,
        0.0,
        config.params.soil_rarc,
    ) * delta_t
        / SECONDS_PER_DAY;

    let b = soil.b_infilt;
    let max_infil = (1.0 + b) * max_moist_tot;
    let infil = if b == -1.0 {
        max_infil
    } else {
        let mut ratio = 1.0 - moist / max_moist_tot;
        if ratio > 1.0 {
            error!(
                "Soil ratio greater than 1: moisture {} max moisture {} ratio {}",
                moist, max_moist_tot, ratio
            );
        } else if ratio < 0.0 {
            error!(
                "Soil ratio less than 0: moisture {} max moisture {} ratio {:e}",
                moist, max_moist_tot, ratio
            );
        } else {
            ratio = ratio.powf(1.0 / (b + 1.0));
        }
        max_infil * (1.0 - ratio)
    };

    let mut esoil = if infil >= max_infil {
        epot
    } else {
        epot * beta(infil / max_infil, b)
    };

    // Condensation is left unlimited
    if esoil > 0.0 {
        if moist > resid_moist_tot {
            esoil = esoil.min(moist - resid_moist_tot);
        } else {
            esoil = 0.0;
        }
    }

    let mut remaining = esoil;
    for (lidx, layer) in layers.iter_mut().take(nlayers).enumerate() {
        let available = layer.moist - soil.resid_moist[lidx];
        if available > remaining {
            layer.esoil = remaining;
            remaining = 0.0;
        } else {
            layer.esoil = available;
            remaining -= available;
        }
    }

    esoil / MM_PER_M / delta_t
}

/// Evaporation efficiency for relative infiltration capacity `i0_frac`
fn beta(i0_frac: f64, b: f64) -> f64 {
    let mut ratio = 1.0 - i0_frac;
    if ratio > 1.0 {
        error!("Evaporation ratio greater than 1: {}", ratio);
    } else if ratio < 0.0 {
        error!("Evaporation ratio less than 0: {}", ratio);
    } else if ratio != 0.0 {
        ratio = ratio.powf(b);
    }

    // Saturated area fraction
    let a_s = 1.0 - ratio;

    let ratio = ratio.powf(1.0 / b);
    let mut series = 1.0;
    let mut term = 1.0;
    for n in 1..=BETA_SERIES_TERMS {
        term *= ratio;
        series += b * term / (b + f64::from(n));
    }

    a_s + (1.0 - a_s) * (1.0 - ratio) * series
}
