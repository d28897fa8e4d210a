//! Per-tile state records and their copy / weighted-average primitives
//!
//! Four record kinds describe one vegetation tile in one elevation band:
//! soil column (`CellState`), canopy (`VegState`), snow pack (`SnowState`)
//! and energy balance (`EnergyState`). `TileState` bundles them.
//!
//! Every record is allocated with the shape fixed by the run configuration,
//! so `copy_from` is a plain value copy between equally shaped records and
//! `weighted_average` combines two records field by field into a third.

pub mod cell;
pub mod energy;
pub mod snow;
pub mod tile;
pub mod veg;

pub use cell::{CellState, LayerState};
pub use energy::{EnergyContext, EnergyState};
pub use snow::SnowState;
pub use tile::TileState;
pub use veg::{VegCarbon, VegState};

use serde::{Deserialize, Serialize};

/// Which fields a weighted average touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    /// State fields only; flux and diagnostic fields of the output are left alone
    StatesOnly,
    /// State fields and flux fields
    StatesAndFluxes,
}

impl Aggregation {
    #[inline]
    pub fn includes_fluxes(self) -> bool {
        matches!(self, Aggregation::StatesAndFluxes)
    }
}

/// Per-side conditions that gate the conditional-presence fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideFlags {
    /// Tile has an overstory, so its canopy albedo is meaningful
    pub overstory: bool,
    /// Tile is a lake, so its lake albedo is meaningful
    pub lake: bool,
    /// Frozen-soil physics is active on this tile
    pub fs_active: bool,
}

/// One input of a weighted average: a record, its weight and its flags
pub struct Side<'a, T> {
    pub state: &'a T,
    pub weight: f64,
    pub flags: SideFlags,
}

impl<T> Clone for Side<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Side<'_, T> {}

impl<'a, T> Side<'a, T> {
    pub fn new(state: &'a T, weight: f64) -> Self {
        Side {
            state,
            weight,
            flags: SideFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: SideFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// `wa * a + wb * b`
#[inline]
pub(crate) fn linear(a: f64, wa: f64, b: f64, wb: f64) -> f64 {
    wa * a + wb * b
}

/// Take `dst`'s buffer and refill it with `src`, keeping the allocation
#[inline]
pub(crate) fn refill<T: Clone>(dst: &mut Vec<T>, src: &[T]) -> Vec<T> {
    let mut buf = std::mem::take(dst);
    buf.clear();
    buf.extend_from_slice(src);
    buf
}

/// Parallel-resistor combination `1 / (wa / a + wb / b)`
#[inline]
pub(crate) fn parallel(a: f64, wa: f64, b: f64, wb: f64) -> f64 {
    1.0 / (wa / a + wb / b)
}

/// Combine a feedback flag/counter pair: OR the flags, keep the larger count
/// while either flag is raised
#[inline]
pub(crate) fn feedback(flag_a: bool, count_a: u32, flag_b: bool, count_b: u32) -> (bool, u32) {
    if flag_a || flag_b {
        (true, count_a.max(count_b))
    } else {
        (false, 0)
    }
}
