//! The four state records of one tile in one elevation band

use super::{Aggregation, CellState, EnergyContext, EnergyState, Side, SnowState, VegState};
use crate::config::{ModelConfig, ModelOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileState {
    pub cell: CellState,
    pub veg: VegState,
    pub snow: SnowState,
    pub energy: EnergyState,
}

impl TileState {
    /// Allocate a zeroed tile shaped by the run options
    pub fn new(options: &ModelOptions) -> Self {
        TileState {
            cell: CellState::new(options),
            veg: VegState::new(options),
            snow: SnowState::default(),
            energy: EnergyState::new(options),
        }
    }

    /// Deep-copy all four records of `src`
    pub fn copy_from(&mut self, src: &TileState) {
        self.cell.copy_from(&src.cell);
        self.veg.copy_from(&src.veg);
        self.snow.copy_from(&src.snow);
        self.energy.copy_from(&src.energy);
    }

    /// Weighted combination of two tiles, record by record
    pub fn weighted_average(
        &mut self,
        a: Side<'_, TileState>,
        b: Side<'_, TileState>,
        scope: Aggregation,
        config: &ModelConfig,
        energy_ctx: &EnergyContext<'_>,
    ) {
        let (ta, tb) = (a.state, b.state);
        self.cell
            .weighted_average(&ta.cell, a.weight, &tb.cell, b.weight, scope);
        self.veg.weighted_average(
            &ta.veg,
            a.weight,
            &tb.veg,
            b.weight,
            scope,
            &config.params,
        );
        self.snow.weighted_average(
            Side::new(&ta.snow, a.weight).with_flags(a.flags),
            Side::new(&tb.snow, b.weight).with_flags(b.flags),
            scope,
        );
        self.energy.weighted_average(
            Side::new(&ta.energy, a.weight).with_flags(a.flags),
            Side::new(&tb.energy, b.weight).with_flags(b.flags),
            scope,
            energy_ctx,
        );
    }
}
