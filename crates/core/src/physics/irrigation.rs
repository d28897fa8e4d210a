//! Irrigation demand of the top soil layer
//!
//! Irrigation switches on when top-layer moisture drops below a threshold and
//! off once it reaches a target, with the flag held in between. Demand is the
//! deficit to saturation left after this step's precipitation. Nothing happens
//! while there is snow on the ground or the air is cold.

use super::{Forcing, SoilParams};
use crate::state::CellState;
use crate::vegetation::{IrrigationPolicy, IrrigationTarget, IrrigationThreshold};

/// Snow water equivalent above which irrigation is suspended (m)
const MAX_SWQ_FOR_IRRIGATION: f64 = 0.001;

/// Air temperature at or below which irrigation is suspended (°C)
const MIN_AIR_TEMP_FOR_IRRIGATION: f64 = 7.0;

/// Field capacity as a multiple of the critical point
const WCR_FRACTION_OF_FIELD_CAPACITY: f64 = 0.7;

/// Top-layer moisture that switches irrigation on (mm)
fn threshold_moisture(soil: &SoilParams, threshold: IrrigationThreshold) -> f64 {
    let level = match threshold {
        IrrigationThreshold::Saturation => soil.max_moist[0],
        IrrigationThreshold::FieldCapacity => soil.wcr[0] / WCR_FRACTION_OF_FIELD_CAPACITY,
        IrrigationThreshold::CriticalPoint => soil.wcr[0],
    };
    level.min(soil.max_moist[0])
}

/// Top-layer moisture that switches irrigation off (mm)
fn target_moisture(soil: &SoilParams, target: IrrigationTarget) -> f64 {
    let level = match target {
        IrrigationTarget::Saturation => soil.max_moist[0],
        IrrigationTarget::FieldCapacity => soil.wcr[0] / WCR_FRACTION_OF_FIELD_CAPACITY,
    };
    level.min(soil.max_moist[0])
}

/// Update the irrigation flag and demand of one tile
///
/// # Arguments
/// * `cell` - Soil state; `irr_apply` and `irr_demand` are updated
/// * `soil` - Layer capacities and critical points
/// * `policy` - Threshold and target of the tile's vegetation class
/// * `forcing` - Air temperature and precipitation of the step
/// * `swq` - Snow water equivalent on the ground (m)
pub fn compute_irrig_demand(
    cell: &mut CellState,
    soil: &SoilParams,
    policy: IrrigationPolicy,
    forcing: &Forcing,
    swq: f64,
) {
    if swq >= MAX_SWQ_FOR_IRRIGATION || forcing.air_temp <= MIN_AIR_TEMP_FOR_IRRIGATION {
        return;
    }

    let moist = cell.layers[0].moist;
    if moist < threshold_moisture(soil, policy.threshold) {
        cell.irr_apply = true;
    } else if moist >= target_moisture(soil, policy.target) {
        cell.irr_apply = false;
    }

    let deficit = soil.max_moist[0] - moist;
    cell.irr_demand = if cell.irr_apply && forcing.prec < deficit {
        deficit - forcing.prec
    } else {
        0.0
    };
}
