//! Canopy state of one vegetation tile

use super::{linear, parallel, refill, Aggregation};
use crate::config::{ModelOptions, Parameters};
use serde::{Deserialize, Serialize};

/// Carbon-cycle canopy state; exists only when the carbon option is on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VegCarbon {
    pub ci: f64,
    pub npp_factor: f64,
    pub annual_npp: f64,
    pub annual_npp_prev: f64,
    /// Nitrogen scaling factor per canopy layer
    pub nscale_factor: Vec<f64>,
    /// Absorbed PAR per canopy layer
    pub apar_layer: Vec<f64>,
    /// Leaf-internal CO2 per canopy layer
    pub ci_layer: Vec<f64>,
    /// Stomatal resistance per canopy layer (s/m)
    pub rs_layer: Vec<f64>,

    pub apar: f64,
    pub gpp: f64,
    pub rphoto: f64,
    pub rdark: f64,
    pub rmaint: f64,
    pub rgrowth: f64,
    pub raut: f64,
    pub npp: f64,
    pub litterfall: f64,
}

impl VegCarbon {
    /// Copy `src` into this record, reusing the per-layer buffers
    pub fn copy_from(&mut self, src: &VegCarbon) {
        let nscale_factor = refill(&mut self.nscale_factor, &src.nscale_factor);
        let apar_layer = refill(&mut self.apar_layer, &src.apar_layer);
        let ci_layer = refill(&mut self.ci_layer, &src.ci_layer);
        let rs_layer = refill(&mut self.rs_layer, &src.rs_layer);
        *self = VegCarbon {
            nscale_factor,
            apar_layer,
            ci_layer,
            rs_layer,
            ..*src
        };
    }

    pub fn new(ncanopy: usize) -> Self {
        VegCarbon {
            nscale_factor: vec![0.0; ncanopy],
            apar_layer: vec![0.0; ncanopy],
            ci_layer: vec![0.0; ncanopy],
            rs_layer: vec![0.0; ncanopy],
            ..VegCarbon::default()
        }
    }
}

/// Canopy properties of one tile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VegState {
    pub albedo: f64,
    /// Displacement height (m)
    pub displacement: f64,
    /// Canopy cover fraction
    pub fcanopy: f64,
    /// Leaf area index
    pub lai: f64,
    /// Roughness length (m)
    pub roughness: f64,
    /// Canopy dew storage (mm)
    pub wdew: f64,
    /// Canopy dew capacity (mm)
    pub wdmax: f64,
    /// Crop fraction of the tile
    pub fcrop: f64,
    /// Irrigated fraction of the tile
    pub firr: f64,
    /// Irrigated fraction seen by the previous reapportionment; `None` before the first
    pub firr_save: Option<f64>,
    /// Canopy resistance (s/m)
    pub rc: f64,

    pub canopyevap: f64,
    pub throughfall: f64,

    pub carbon: Option<VegCarbon>,
}

impl VegState {
    pub fn new(options: &ModelOptions) -> Self {
        VegState {
            carbon: options.carbon.then(|| VegCarbon::new(options.ncanopy)),
            ..VegState::default()
        }
    }

    /// Copy every field of `src` into this pre-allocated record
    pub fn copy_from(&mut self, src: &VegState) {
        debug_assert_eq!(self.carbon.is_some(), src.carbon.is_some());
        let mut carbon = self.carbon.take();
        match (&mut carbon, &src.carbon) {
            (Some(dst), Some(c)) => dst.copy_from(c),
            (dst, c) => dst.clone_from(c),
        }
        *self = VegState { carbon, ..*src };
    }

    /// Overwrite this record with the weighted combination of `a` and `b`
    ///
    /// `wdmax` is recomputed from the combined LAI; canopy and stomatal
    /// resistances combine as parallel resistors.
    pub fn weighted_average(
        &mut self,
        a: &VegState,
        wa: f64,
        b: &VegState,
        wb: f64,
        scope: Aggregation,
        params: &Parameters,
    ) {
        self.albedo = linear(a.albedo, wa, b.albedo, wb);
        self.fcrop = linear(a.fcrop, wa, b.fcrop, wb);
        self.firr = linear(a.firr, wa, b.firr, wb);
        self.lai = linear(a.lai, wa, b.lai, wb);
        self.fcanopy = linear(a.fcanopy, wa, b.fcanopy, wb);
        self.wdew = linear(a.wdew, wa, b.wdew, wb);
        self.wdmax = self.lai * params.veg_lai_water_factor;
        self.rc = parallel(a.rc, wa, b.rc, wb);

        if let (Some(out), Some(ca), Some(cb)) = (self.carbon.as_mut(), &a.carbon, &b.carbon) {
            out.ci = linear(ca.ci, wa, cb.ci, wb);
            out.npp_factor = linear(ca.npp_factor, wa, cb.npp_factor, wb);
            out.annual_npp = linear(ca.annual_npp, wa, cb.annual_npp, wb);
            out.annual_npp_prev = linear(ca.annual_npp_prev, wa, cb.annual_npp_prev, wb);
            for l in 0..out.nscale_factor.len() {
                out.nscale_factor[l] = linear(ca.nscale_factor[l], wa, cb.nscale_factor[l], wb);
                out.ci_layer[l] = linear(ca.ci_layer[l], wa, cb.ci_layer[l], wb);
                out.rs_layer[l] = parallel(ca.rs_layer[l], wa, cb.rs_layer[l], wb);
            }

            if scope.includes_fluxes() {
                out.apar = linear(ca.apar, wa, cb.apar, wb);
                out.gpp = linear(ca.gpp, wa, cb.gpp, wb);
                out.rphoto = linear(ca.rphoto, wa, cb.rphoto, wb);
                out.rdark = linear(ca.rdark, wa, cb.rdark, wb);
                out.rmaint = linear(ca.rmaint, wa, cb.rmaint, wb);
                out.rgrowth = linear(ca.rgrowth, wa, cb.rgrowth, wb);
                out.raut = linear(ca.raut, wa, cb.raut, wb);
                out.npp = linear(ca.npp, wa, cb.npp, wb);
                out.litterfall = linear(ca.litterfall, wa, cb.litterfall, wb);
                for l in 0..out.apar_layer.len() {
                    out.apar_layer[l] = linear(ca.apar_layer[l], wa, cb.apar_layer[l], wb);
                }
            }
        }

        if scope.includes_fluxes() {
            self.canopyevap = linear(a.canopyevap, wa, b.canopyevap, wb);
            self.throughfall = linear(a.throughfall, wa, b.throughfall, wb);
        }
    }
}
