//! Soil parameters and meteorological forcing for one tile and step

use crate::config::ModelOptions;
use serde::{Deserialize, Serialize};

/// Soil parameters of a cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilParams {
    /// Maximum moisture per layer (mm)
    pub max_moist: Vec<f64>,
    /// Residual moisture per layer (mm)
    pub resid_moist: Vec<f64>,
    /// Critical moisture per layer (mm)
    pub wcr: Vec<f64>,
    /// ARNO infiltration shape parameter
    pub b_infilt: f64,
    /// Mean elevation (m)
    pub elevation: f64,
    /// Area fraction of each frost sub-area
    pub frost_fract: Vec<f64>,
    /// Frozen-soil physics active in this cell
    pub fs_active: bool,
    /// Cumulative depth of each thermal node (m)
    pub zsum_node: Vec<f64>,
}

/// Default thermal damping depth (m)
const DAMPING_DEPTH: f64 = 4.0;

impl SoilParams {
    /// Same properties in every layer, frost areas of equal size, nodes
    /// evenly spaced down to the damping depth
    pub fn uniform(
        options: &ModelOptions,
        max_moist: f64,
        resid_moist: f64,
        wcr: f64,
        b_infilt: f64,
    ) -> Self {
        let n = options.nlayer;
        SoilParams {
            max_moist: vec![max_moist; n],
            resid_moist: vec![resid_moist; n],
            wcr: vec![wcr; n],
            b_infilt,
            elevation: 0.0,
            frost_fract: vec![1.0 / options.nfrost as f64; options.nfrost],
            fs_active: false,
            zsum_node: (0..options.nnode)
                .map(|i| i as f64 * DAMPING_DEPTH / (options.nnode.max(2) - 1) as f64)
                .collect(),
        }
    }
}

/// Meteorological forcing for the current step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Forcing {
    /// Air temperature (°C)
    pub air_temp: f64,
    /// Precipitation (mm per step)
    pub prec: f64,
    /// Net radiation (W/m²)
    pub rad: f64,
    /// Vapour pressure deficit (Pa)
    pub vpd: f64,
}
