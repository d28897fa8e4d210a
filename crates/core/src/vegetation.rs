//! Vegetation tile parameters, per-class irrigation policy and the
//! vegetation forcing history consumed by the step driver

use crate::config::MAX_SUBTILES;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Parameters of one vegetation tile within a cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegTile {
    /// Vegetation class id (key into the `VegLibrary`)
    pub veg_class: u16,
    /// Fraction of the cell covered by this tile
    pub cv: f64,
    /// Tile is split into irrigated and non-irrigated sub-tiles
    pub crop_split: bool,
    /// Number of sub-tiles in use (at most `MAX_SUBTILES`)
    pub nsubtiles: usize,
    /// Tile has an overstory
    pub overstory: bool,
}

impl VegTile {
    /// A tile without crop split
    pub fn plain(veg_class: u16, cv: f64) -> Self {
        VegTile {
            veg_class,
            cv,
            crop_split: false,
            nsubtiles: 0,
            overstory: false,
        }
    }

    /// A crop tile split into both sub-tiles
    pub fn crop(veg_class: u16, cv: f64) -> Self {
        VegTile {
            veg_class,
            cv,
            crop_split: true,
            nsubtiles: MAX_SUBTILES,
            overstory: false,
        }
    }

    /// Sub-tiles hold live state for this tile
    pub fn has_live_subtiles(&self) -> bool {
        self.crop_split && self.cv > 0.0
    }
}

/// Soil moisture level that triggers irrigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrigationThreshold {
    /// Maximum moisture
    Saturation,
    /// Field capacity, taken as `Wcr / 0.7`
    FieldCapacity,
    /// Critical point `Wcr`
    CriticalPoint,
}

/// Soil moisture level irrigation refills to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrigationTarget {
    Saturation,
    FieldCapacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrigationPolicy {
    pub threshold: IrrigationThreshold,
    pub target: IrrigationTarget,
}

impl Default for IrrigationPolicy {
    fn default() -> Self {
        IrrigationPolicy {
            threshold: IrrigationThreshold::CriticalPoint,
            target: IrrigationTarget::FieldCapacity,
        }
    }
}

/// Irrigation policy per vegetation class
#[derive(Debug, Clone, Default)]
pub struct VegLibrary {
    policies: FxHashMap<u16, IrrigationPolicy>,
}

impl VegLibrary {
    pub fn new() -> Self {
        VegLibrary::default()
    }

    pub fn insert(&mut self, veg_class: u16, policy: IrrigationPolicy) {
        self.policies.insert(veg_class, policy);
    }

    /// Policy of a class; classes without an entry use the default policy
    pub fn policy(&self, veg_class: u16) -> IrrigationPolicy {
        self.policies.get(&veg_class).copied().unwrap_or_default()
    }
}

/// Area-averaged vegetation properties for one forcing step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VegForcing {
    pub albedo: f64,
    pub lai: f64,
    pub fcanopy: f64,
    pub displacement: f64,
    pub roughness: f64,
    pub fcrop: f64,
    pub firr: f64,
}

/// Vegetation forcing of one tile for the current model step
///
/// Holds `nr + 1` entries: the sub-steps followed by the step-aggregate
/// slot `nr`, which is what the step driver reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VegHistory {
    pub steps: Vec<VegForcing>,
}

impl VegHistory {
    /// Same forcing in every slot
    pub fn uniform(nr: usize, forcing: VegForcing) -> Self {
        VegHistory {
            steps: vec![forcing; nr + 1],
        }
    }

    /// Forcing at slot `idx`
    #[inline]
    pub fn at(&self, idx: usize) -> &VegForcing {
        &self.steps[idx]
    }

    /// Irrigated fraction of the first sub-step
    #[inline]
    pub fn first_firr(&self) -> f64 {
        self.steps[0].firr
    }
}
