//! Run configuration: option flags, physical parameters and capacity limits
//!
//! A `ModelConfig` is built once per run, validated once, and then passed by
//! reference into every routine. Container lengths (layers, frost areas,
//! nodes, canopy layers, bands) are fixed by it at allocation time.

use crate::error::SubtileError;
use serde::{Deserialize, Serialize};

/// Maximum number of soil layers
pub const MAX_LAYERS: usize = 3;
/// Maximum number of frost sub-areas per soil layer
pub const MAX_FROST_AREAS: usize = 10;
/// Maximum number of soil thermal nodes
pub const MAX_NODES: usize = 50;
/// Maximum number of elevation (snow) bands
pub const MAX_BANDS: usize = 10;
/// Number of sub-tile slots per vegetation type (non-irrigated, irrigated)
pub const MAX_SUBTILES: usize = 2;
/// Maximum number of freezing or thawing fronts tracked per profile
pub const MAX_FRONTS: usize = 3;
/// Maximum number of canopy layers for the carbon cycle
pub const MAX_CANOPY_LAYERS: usize = 10;

/// Seconds per day
pub const SECONDS_PER_DAY: f64 = 86400.0;
/// Millimetres per metre
pub const MM_PER_M: f64 = 1000.0;
/// Fill value for unused frozen-front slots
pub const MISSING: f64 = -99999.0;

/// Model option flags and dimension counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Number of soil moisture layers
    pub nlayer: usize,
    /// Number of canopy layers used by the carbon cycle
    pub ncanopy: usize,
    /// Number of frost sub-areas per layer
    pub nfrost: usize,
    /// Number of soil thermal nodes
    pub nnode: usize,
    /// Number of elevation bands
    pub snow_bands: usize,
    /// Index of the step-aggregate slot in the forcing history ("NR")
    pub nr: usize,
    /// Split crop tiles into irrigated and non-irrigated sub-tiles
    pub crop_split: bool,
    /// Carbon cycle enabled
    pub carbon: bool,
    /// Irrigation enabled (crop and irrigated fractions come from forcing)
    pub irrigation: bool,
    /// Draw bare-soil evaporation from the top two layers
    pub deep_esoil: bool,
    /// Simplified ground heat flux (no frozen-front tracking)
    pub quick_flux: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        ModelOptions {
            nlayer: 3,
            ncanopy: 0,
            nfrost: 1,
            nnode: 5,
            snow_bands: 1,
            nr: 0,
            crop_split: true,
            carbon: false,
            irrigation: true,
            deep_esoil: false,
            quick_flux: false,
        }
    }
}

/// Physical parameters consumed by the sub-tile routines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Canopy water storage capacity per unit LAI (mm)
    pub veg_lai_water_factor: f64,
    /// Albedo of open water; floor for canopy albedo
    pub albedo_h2o_surf: f64,
    /// Albedo assigned to a tile with no canopy
    pub albedo_bare_soil: f64,
    /// Architectural resistance of bare soil (s/m)
    pub soil_rarc: f64,
    /// Canopy fractions below this snap to zero
    pub min_fcanopy: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            veg_lai_water_factor: 0.1,
            albedo_h2o_surf: 0.08,
            albedo_bare_soil: 0.2,
            soil_rarc: 100.0,
            min_fcanopy: 0.0001,
        }
    }
}

/// Immutable run configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub options: ModelOptions,
    pub params: Parameters,
}

impl ModelConfig {
    /// Build a configuration and validate it
    pub fn new(options: ModelOptions, params: Parameters) -> Result<Self, SubtileError> {
        let config = ModelConfig { options, params };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration; missing fields take their defaults
    pub fn from_json_str(text: &str) -> Result<Self, SubtileError> {
        let config: ModelConfig =
            serde_json::from_str(text).map_err(|e| SubtileError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every count against its capacity and every parameter for sanity
    pub fn validate(&self) -> Result<(), SubtileError> {
        let o = &self.options;
        check_count("nlayer", o.nlayer, 1, MAX_LAYERS)?;
        check_count("nfrost", o.nfrost, 1, MAX_FROST_AREAS)?;
        check_count("nnode", o.nnode, 1, MAX_NODES)?;
        check_count("snow_bands", o.snow_bands, 1, MAX_BANDS)?;
        if o.carbon {
            check_count("ncanopy", o.ncanopy, 1, MAX_CANOPY_LAYERS)?;
        }
        if o.deep_esoil && o.nlayer < 2 {
            return Err(SubtileError::invalid(
                "deep_esoil",
                "requires at least two soil layers",
            ));
        }
        if o.crop_split && !o.irrigation {
            return Err(SubtileError::invalid(
                "crop_split",
                "requires the irrigation option",
            ));
        }

        let p = &self.params;
        for (field, value) in [
            ("veg_lai_water_factor", p.veg_lai_water_factor),
            ("soil_rarc", p.soil_rarc),
            ("min_fcanopy", p.min_fcanopy),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SubtileError::invalid(
                    field,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        for (field, value) in [
            ("albedo_h2o_surf", p.albedo_h2o_surf),
            ("albedo_bare_soil", p.albedo_bare_soil),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SubtileError::invalid(
                    field,
                    format!("must lie in [0, 1], got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// Number of soil layers that contribute to bare-soil evaporation
    pub fn esoil_layers(&self) -> usize {
        if self.options.deep_esoil {
            2
        } else {
            1
        }
    }
}

fn check_count(
    field: &'static str,
    value: usize,
    min: usize,
    max: usize,
) -> Result<(), SubtileError> {
    if value < min || value > max {
        return Err(SubtileError::invalid(
            field,
            format!("must lie in [{min}, {max}], got {value}"),
        ));
    }
    Ok(())
}
