//! Soil column state: per-layer moisture, ice and thermal properties plus
//! cell-level water table, carbon pools and water fluxes

use super::{linear, parallel, refill, Aggregation};
use crate::config::ModelOptions;
use serde::{Deserialize, Serialize};

/// One soil moisture layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerState {
    /// Total moisture (mm)
    pub moist: f64,
    /// Ice content per frost sub-area (mm)
    pub ice: Vec<f64>,
    /// Layer temperature (°C)
    pub t: f64,
    /// Thermal conductivity (W/m/K)
    pub kappa: f64,
    /// Volumetric heat capacity (J/m³/K)
    pub cs: f64,
    /// Matric potential
    pub phi: f64,
    /// Water table depth within the layer (cm)
    pub zwt: f64,
    /// Bare-soil evaporation drawn from this layer (mm)
    pub esoil: f64,
    /// Total evaporation from this layer (mm)
    pub evap: f64,
    /// Transpiration from this layer (mm)
    pub transp: f64,
}

impl LayerState {
    pub fn new(nfrost: usize) -> Self {
        LayerState {
            ice: vec![0.0; nfrost],
            ..LayerState::default()
        }
    }

    /// Copy `src` into this layer, reusing the ice buffer
    pub fn copy_from(&mut self, src: &LayerState) {
        let ice = refill(&mut self.ice, &src.ice);
        *self = LayerState { ice, ..*src };
    }

    /// Liquid moisture weighted over the frost sub-areas
    pub fn liquid_moisture(&self, frost_fract: &[f64]) -> f64 {
        self.ice
            .iter()
            .zip(frost_fract)
            .map(|(ice, fract)| (self.moist - ice) * fract)
            .sum()
    }
}

/// Soil column state of one tile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellState {
    pub layers: Vec<LayerState>,
    /// Aerodynamic resistance, overstory and surface (s/m)
    pub aero_resist: [f64; 2],
    /// Saturated area fraction
    pub asat: f64,
    pub rootmoist: f64,
    pub wetness: f64,
    /// Water table depth (cm)
    pub zwt: f64,
    pub zwt_lumped: f64,
    pub c_litter: f64,
    pub c_inter: f64,
    pub c_slow: f64,

    pub baseflow: f64,
    pub inflow: f64,
    pub pot_evap: f64,
    pub runoff: f64,
    pub irr_applied: f64,
    pub irr_demand: f64,
    pub irr_run_used: f64,
    pub irr_with_used: f64,
    /// Irrigation hysteresis flag; starts lowered
    pub irr_apply: bool,
    pub rh_litter: f64,
    pub rh_litter2atm: f64,
    pub rh_inter: f64,
    pub rh_slow: f64,
    pub rh_tot: f64,
}

impl CellState {
    /// Allocate a zeroed record with `nlayer` layers of `nfrost` frost areas
    pub fn new(options: &ModelOptions) -> Self {
        CellState {
            layers: vec![LayerState::new(options.nfrost); options.nlayer],
            ..CellState::default()
        }
    }

    /// Copy every field of `src` into this pre-allocated record
    pub fn copy_from(&mut self, src: &CellState) {
        debug_assert_eq!(self.layers.len(), src.layers.len());
        let mut layers = std::mem::take(&mut self.layers);
        layers.truncate(src.layers.len());
        for (dst, layer) in layers.iter_mut().zip(&src.layers) {
            dst.copy_from(layer);
        }
        layers.extend_from_slice(&src.layers[layers.len()..]);
        *self = CellState { layers, ..*src };
    }

    /// Overwrite this record with the weighted combination of `a` and `b`
    pub fn weighted_average(
        &mut self,
        a: &CellState,
        wa: f64,
        b: &CellState,
        wb: f64,
        scope: Aggregation,
    ) {
        debug_assert_eq!(a.layers.len(), b.layers.len());
        debug_assert_eq!(self.layers.len(), a.layers.len());

        for i in 0..2 {
            self.aero_resist[i] = parallel(a.aero_resist[i], wa, b.aero_resist[i], wb);
        }
        self.asat = linear(a.asat, wa, b.asat, wb);
        self.c_litter = linear(a.c_litter, wa, b.c_litter, wb);
        self.c_inter = linear(a.c_inter, wa, b.c_inter, wb);
        self.c_slow = linear(a.c_slow, wa, b.c_slow, wb);
        self.rootmoist = linear(a.rootmoist, wa, b.rootmoist, wb);
        self.wetness = linear(a.wetness, wa, b.wetness, wb);
        self.zwt = linear(a.zwt, wa, b.zwt, wb);
        self.zwt_lumped = linear(a.zwt_lumped, wa, b.zwt_lumped, wb);

        for ((out, la), lb) in self.layers.iter_mut().zip(&a.layers).zip(&b.layers) {
            out.cs = linear(la.cs, wa, lb.cs, wb);
            out.t = linear(la.t, wa, lb.t, wb);
            for ((ice, ia), ib) in out.ice.iter_mut().zip(&la.ice).zip(&lb.ice) {
                *ice = linear(*ia, wa, *ib, wb);
            }
            out.kappa = linear(la.kappa, wa, lb.kappa, wb);
            out.moist = linear(la.moist, wa, lb.moist, wb);
            out.phi = linear(la.phi, wa, lb.phi, wb);
            out.zwt = linear(la.zwt, wa, lb.zwt, wb);
        }

        if !scope.includes_fluxes() {
            return;
        }

        self.baseflow = linear(a.baseflow, wa, b.baseflow, wb);
        self.irr_applied = linear(a.irr_applied, wa, b.irr_applied, wb);
        self.irr_demand = linear(a.irr_demand, wa, b.irr_demand, wb);
        self.irr_run_used = linear(a.irr_run_used, wa, b.irr_run_used, wb);
        self.irr_with_used = linear(a.irr_with_used, wa, b.irr_with_used, wb);
        self.inflow = linear(a.inflow, wa, b.inflow, wb);
        self.pot_evap = linear(a.pot_evap, wa, b.pot_evap, wb);
        self.runoff = linear(a.runoff, wa, b.runoff, wb);
        self.rh_litter = linear(a.rh_litter, wa, b.rh_litter, wb);
        self.rh_litter2atm = linear(a.rh_litter2atm, wa, b.rh_litter2atm, wb);
        self.rh_inter = linear(a.rh_inter, wa, b.rh_inter, wb);
        self.rh_slow = linear(a.rh_slow, wa, b.rh_slow, wb);
        self.rh_tot = linear(a.rh_tot, wa, b.rh_tot, wb);

        for ((out, la), lb) in self.layers.iter_mut().zip(&a.layers).zip(&b.layers) {
            out.esoil = linear(la.esoil, wa, lb.esoil, wb);
            out.evap = linear(la.evap, wa, lb.evap, wb);
            out.transp = linear(la.transp, wa, lb.transp, wb);
        }
    }

    /// Total moisture over all layers (mm)
    pub fn total_moisture(&self) -> f64 {
        self.layers.iter().map(|l| l.moist).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_with(moist: f64, runoff: f64) -> CellState {
        let mut cell = CellState::new(&ModelOptions::default());
        for layer in &mut cell.layers {
            layer.moist = moist;
            layer.esoil = runoff / 10.0;
        }
        cell.aero_resist = [50.0, 100.0];
        cell.runoff = runoff;
        cell
    }

    #[test]
    fn test_new_shape() {
        let options = ModelOptions {
            nlayer: 2,
            nfrost: 4,
            ..ModelOptions::default()
        };
        let cell = CellState::new(&options);
        assert_eq!(cell.layers.len(), 2);
        assert!(cell.layers.iter().all(|l| l.ice.len() == 4));
        assert!(!cell.irr_apply);
    }

    #[test]
    fn test_copy_from_is_deep() {
        let mut src = cell_with(42.0, 1.0);
        src.layers[1].ice[0] = 3.0;
        src.irr_apply = true;
        let mut dst = CellState::new(&ModelOptions::default());
        let layers = dst.layers.as_ptr();
        let ice = dst.layers[1].ice.as_ptr();

        dst.copy_from(&src);
        assert_eq!(dst, src);
        // Destination buffers are reused
        assert_eq!(dst.layers.as_ptr(), layers);
        assert_eq!(dst.layers[1].ice.as_ptr(), ice);

        dst.layers[0].moist = 0.0;
        assert_eq!(src.layers[0].moist, 42.0);
    }

    #[test]
    fn test_weighted_average_states_and_fluxes() {
        let a = cell_with(100.0, 2.0);
        let b = cell_with(40.0, 4.0);
        let mut out = CellState::new(&ModelOptions::default());
        out.weighted_average(&a, 0.25, &b, 0.75, Aggregation::StatesAndFluxes);

        assert!((out.layers[0].moist - 55.0).abs() < 1e-12);
        assert!((out.runoff - 3.5).abs() < 1e-12);
        assert!((out.layers[1].esoil - 0.35).abs() < 1e-12);
        // Equal resistances combine to the same resistance
        assert!((out.aero_resist[0] - 50.0).abs() < 1e-9);
        assert!((out.aero_resist[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_average_states_only_leaves_fluxes() {
        let a = cell_with(100.0, 2.0);
        let b = cell_with(40.0, 4.0);
        let mut out = CellState::new(&ModelOptions::default());
        out.runoff = -1.0;
        out.weighted_average(&a, 0.5, &b, 0.5, Aggregation::StatesOnly);

        assert!((out.layers[2].moist - 70.0).abs() < 1e-12);
        assert_eq!(out.runoff, -1.0);
        assert_eq!(out.layers[0].esoil, 0.0);
    }

    #[test]
    fn test_liquid_moisture() {
        let mut layer = LayerState::new(2);
        layer.moist = 30.0;
        layer.ice = vec![10.0, 0.0];
        let liquid = layer.liquid_moisture(&[0.5, 0.5]);
        assert!((liquid - 25.0).abs() < 1e-12);
    }
}
