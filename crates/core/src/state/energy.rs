//! Energy balance state: soil thermal profile, surface/canopy temperatures
//! with their feedback counters, and the energy flux terms

use super::{feedback, linear, refill, Aggregation, Side};
use crate::config::{ModelOptions, MAX_FRONTS, MISSING};
use crate::physics::FrontFinder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyState {
    /// Node temperatures (°C)
    pub t: Vec<f64>,
    pub t_fbflag: Vec<bool>,
    pub t_fbcount: Vec<u32>,
    /// Node ice content
    pub ice: Vec<f64>,
    /// Node moisture content
    pub moist: Vec<f64>,
    pub kappa_node: Vec<f64>,
    pub cs_node: Vec<f64>,
    /// Thermal conductivity of the top two thermal layers
    pub kappa: [f64; 2],
    /// Heat capacity of the top two thermal layers
    pub cs: [f64; 2],
    pub albedo_lake: f64,
    pub albedo_over: f64,
    pub albedo_under: f64,
    /// Index of the node closest to the first thermal damping depth
    pub t1_index: i32,
    pub tcanopy: f64,
    pub tcanopy_fbflag: bool,
    pub tcanopy_fbcount: u32,
    pub tfoliage: f64,
    pub tfoliage_fbflag: bool,
    pub tfoliage_fbcount: u32,
    pub tsurf: f64,
    pub tsurf_fbflag: bool,
    pub tsurf_fbcount: u32,
    pub unfrozen: f64,
    /// Some node is below freezing
    pub frozen: bool,
    /// Freezing front depths (m)
    pub fdepth: [f64; MAX_FRONTS],
    /// Thawing front depths (m)
    pub tdepth: [f64; MAX_FRONTS],
    pub nfrost: usize,
    pub nthaw: usize,

    pub advected_sensible: f64,
    pub advection: f64,
    pub atmos_error: f64,
    pub atmos_latent: f64,
    pub atmos_latent_sub: f64,
    pub atmos_sensible: f64,
    pub canopy_advection: f64,
    pub canopy_latent: f64,
    pub canopy_latent_sub: f64,
    pub canopy_refreeze: f64,
    pub canopy_sensible: f64,
    pub delta_cc: f64,
    pub delta_h: f64,
    pub error: f64,
    pub fusion: f64,
    pub grnd_flux: f64,
    pub latent: f64,
    pub latent_sub: f64,
    pub longwave: f64,
    pub long_over_in: f64,
    pub long_under_in: f64,
    pub long_under_out: f64,
    pub melt_energy: f64,
    pub net_long_atmos: f64,
    pub net_long_over: f64,
    pub net_long_under: f64,
    pub net_short_atmos: f64,
    pub net_short_over: f64,
    pub net_short_under: f64,
    pub out_long_canopy: f64,
    pub out_long_surface: f64,
    pub refreeze_energy: f64,
    pub sensible: f64,
    pub shortwave: f64,
    pub short_over_in: f64,
    pub short_under_in: f64,
    pub snow_flux: f64,
}

/// What energy aggregation needs beyond the two records
pub struct EnergyContext<'a> {
    /// Skip frozen-front tracking
    pub quick_flux: bool,
    /// Cumulative node depths (m), one per node
    pub zsum_node: &'a [f64],
    /// Recomputes freezing/thawing fronts on the combined profile
    pub finder: &'a dyn FrontFinder,
}

impl EnergyState {
    pub fn new(options: &ModelOptions) -> Self {
        let n = options.nnode;
        EnergyState {
            t: vec![0.0; n],
            t_fbflag: vec![false; n],
            t_fbcount: vec![0; n],
            ice: vec![0.0; n],
            moist: vec![0.0; n],
            kappa_node: vec![0.0; n],
            cs_node: vec![0.0; n],
            kappa: [0.0; 2],
            cs: [0.0; 2],
            albedo_lake: 0.0,
            albedo_over: 0.0,
            albedo_under: 0.0,
            t1_index: 0,
            tcanopy: 0.0,
            tcanopy_fbflag: false,
            tcanopy_fbcount: 0,
            tfoliage: 0.0,
            tfoliage_fbflag: false,
            tfoliage_fbcount: 0,
            tsurf: 0.0,
            tsurf_fbflag: false,
            tsurf_fbcount: 0,
            unfrozen: 0.0,
            frozen: false,
            fdepth: [MISSING; MAX_FRONTS],
            tdepth: [MISSING; MAX_FRONTS],
            nfrost: 0,
            nthaw: 0,
            advected_sensible: 0.0,
            advection: 0.0,
            atmos_error: 0.0,
            atmos_latent: 0.0,
            atmos_latent_sub: 0.0,
            atmos_sensible: 0.0,
            canopy_advection: 0.0,
            canopy_latent: 0.0,
            canopy_latent_sub: 0.0,
            canopy_refreeze: 0.0,
            canopy_sensible: 0.0,
            delta_cc: 0.0,
            delta_h: 0.0,
            error: 0.0,
            fusion: 0.0,
            grnd_flux: 0.0,
            latent: 0.0,
            latent_sub: 0.0,
            longwave: 0.0,
            long_over_in: 0.0,
            long_under_in: 0.0,
            long_under_out: 0.0,
            melt_energy: 0.0,
            net_long_atmos: 0.0,
            net_long_over: 0.0,
            net_long_under: 0.0,
            net_short_atmos: 0.0,
            net_short_over: 0.0,
            net_short_under: 0.0,
            out_long_canopy: 0.0,
            out_long_surface: 0.0,
            refreeze_energy: 0.0,
            sensible: 0.0,
            shortwave: 0.0,
            short_over_in: 0.0,
            short_under_in: 0.0,
            snow_flux: 0.0,
        }
    }

    /// Copy every field of `src` into this pre-allocated record
    pub fn copy_from(&mut self, src: &EnergyState) {
        debug_assert_eq!(self.t.len(), src.t.len());
        let t = refill(&mut self.t, &src.t);
        let t_fbflag = refill(&mut self.t_fbflag, &src.t_fbflag);
        let t_fbcount = refill(&mut self.t_fbcount, &src.t_fbcount);
        let ice = refill(&mut self.ice, &src.ice);
        let moist = refill(&mut self.moist, &src.moist);
        let kappa_node = refill(&mut self.kappa_node, &src.kappa_node);
        let cs_node = refill(&mut self.cs_node, &src.cs_node);
        *self = EnergyState {
            t,
            t_fbflag,
            t_fbcount,
            ice,
            moist,
            kappa_node,
            cs_node,
            ..*src
        };
    }

    /// Overwrite this record with the weighted combination of two sides
    ///
    /// Lake albedo only counts from lake sides. `frozen` is derived from the
    /// combined node temperatures, and when frozen-soil physics is active on
    /// either side (and quick flux is off) the front finder runs on the result.
    pub fn weighted_average(
        &mut self,
        a: Side<'_, EnergyState>,
        b: Side<'_, EnergyState>,
        scope: Aggregation,
        ctx: &EnergyContext<'_>,
    ) {
        let (ea, wa) = (a.state, a.weight);
        let (eb, wb) = (b.state, b.weight);
        debug_assert_eq!(ea.t.len(), eb.t.len());
        debug_assert_eq!(self.t.len(), ea.t.len());

        let mut albedo_lake = 0.0;
        let mut sum = 0.0;
        if a.flags.lake {
            albedo_lake += wa * ea.albedo_lake;
            sum += wa;
        }
        if b.flags.lake {
            albedo_lake += wb * eb.albedo_lake;
            sum += wb;
        }
        self.albedo_lake = if sum > 0.0 { albedo_lake / sum } else { albedo_lake };

        self.albedo_over = linear(ea.albedo_over, wa, eb.albedo_over, wb);
        self.albedo_under = linear(ea.albedo_under, wa, eb.albedo_under, wb);
        self.t1_index = linear(f64::from(ea.t1_index), wa, f64::from(eb.t1_index), wb) as i32;
        self.tcanopy = linear(ea.tcanopy, wa, eb.tcanopy, wb);
        (self.tcanopy_fbflag, self.tcanopy_fbcount) = feedback(
            ea.tcanopy_fbflag,
            ea.tcanopy_fbcount,
            eb.tcanopy_fbflag,
            eb.tcanopy_fbcount,
        );
        self.tfoliage = linear(ea.tfoliage, wa, eb.tfoliage, wb);
        (self.tfoliage_fbflag, self.tfoliage_fbcount) = feedback(
            ea.tfoliage_fbflag,
            ea.tfoliage_fbcount,
            eb.tfoliage_fbflag,
            eb.tfoliage_fbcount,
        );
        self.tsurf = linear(ea.tsurf, wa, eb.tsurf, wb);
        (self.tsurf_fbflag, self.tsurf_fbcount) =
            feedback(ea.tsurf_fbflag, ea.tsurf_fbcount, eb.tsurf_fbflag, eb.tsurf_fbcount);
        self.unfrozen = linear(ea.unfrozen, wa, eb.unfrozen, wb);
        for i in 0..2 {
            self.cs[i] = linear(ea.cs[i], wa, eb.cs[i], wb);
            self.kappa[i] = linear(ea.kappa[i], wa, eb.kappa[i], wb);
        }

        for i in 0..self.t.len() {
            self.cs_node[i] = linear(ea.cs_node[i], wa, eb.cs_node[i], wb);
            self.ice[i] = linear(ea.ice[i], wa, eb.ice[i], wb);
            self.kappa_node[i] = linear(ea.kappa_node[i], wa, eb.kappa_node[i], wb);
            self.moist[i] = linear(ea.moist[i], wa, eb.moist[i], wb);
            self.t[i] = linear(ea.t[i], wa, eb.t[i], wb);
            (self.t_fbflag[i], self.t_fbcount[i]) =
                feedback(ea.t_fbflag[i], ea.t_fbcount[i], eb.t_fbflag[i], eb.t_fbcount[i]);
        }
        self.frozen = self.t.iter().any(|&t| t < 0.0);

        if !ctx.quick_flux && (a.flags.fs_active || b.flags.fs_active) {
            ctx.finder.find_fronts(self, ctx.zsum_node);
        }

        if !scope.includes_fluxes() {
            return;
        }

        self.advected_sensible = linear(ea.advected_sensible, wa, eb.advected_sensible, wb);
        self.advection = linear(ea.advection, wa, eb.advection, wb);
        self.atmos_error = linear(ea.atmos_error, wa, eb.atmos_error, wb);
        self.atmos_latent = linear(ea.atmos_latent, wa, eb.atmos_latent, wb);
        self.atmos_latent_sub = linear(ea.atmos_latent_sub, wa, eb.atmos_latent_sub, wb);
        self.atmos_sensible = linear(ea.atmos_sensible, wa, eb.atmos_sensible, wb);
        self.canopy_advection = linear(ea.canopy_advection, wa, eb.canopy_advection, wb);
        self.canopy_latent = linear(ea.canopy_latent, wa, eb.canopy_latent, wb);
        self.canopy_latent_sub = linear(ea.canopy_latent_sub, wa, eb.canopy_latent_sub, wb);
        self.canopy_refreeze = linear(ea.canopy_refreeze, wa, eb.canopy_refreeze, wb);
        self.canopy_sensible = linear(ea.canopy_sensible, wa, eb.canopy_sensible, wb);
        self.delta_cc = linear(ea.delta_cc, wa, eb.delta_cc, wb);
        self.delta_h = linear(ea.delta_h, wa, eb.delta_h, wb);
        self.error = linear(ea.error, wa, eb.error, wb);
        self.fusion = linear(ea.fusion, wa, eb.fusion, wb);
        self.grnd_flux = linear(ea.grnd_flux, wa, eb.grnd_flux, wb);
        self.latent = linear(ea.latent, wa, eb.latent, wb);
        self.latent_sub = linear(ea.latent_sub, wa, eb.latent_sub, wb);
        self.longwave = linear(ea.longwave, wa, eb.longwave, wb);
        self.long_over_in = linear(ea.long_over_in, wa, eb.long_over_in, wb);
        self.long_under_in = linear(ea.long_under_in, wa, eb.long_under_in, wb);
        self.long_under_out = linear(ea.long_under_out, wa, eb.long_under_out, wb);
        self.melt_energy = linear(ea.melt_energy, wa, eb.melt_energy, wb);
        self.net_long_atmos = linear(ea.net_long_atmos, wa, eb.net_long_atmos, wb);
        self.net_long_over = linear(ea.net_long_over, wa, eb.net_long_over, wb);
        self.net_long_under = linear(ea.net_long_under, wa, eb.net_long_under, wb);
        self.net_short_atmos = linear(ea.net_short_atmos, wa, eb.net_short_atmos, wb);
        self.net_short_over = linear(ea.net_short_over, wa, eb.net_short_over, wb);
        self.net_short_under = linear(ea.net_short_under, wa, eb.net_short_under, wb);
        self.out_long_canopy = linear(ea.out_long_canopy, wa, eb.out_long_canopy, wb);
        self.out_long_surface = linear(ea.out_long_surface, wa, eb.out_long_surface, wb);
        self.refreeze_energy = linear(ea.refreeze_energy, wa, eb.refreeze_energy, wb);
        self.sensible = linear(ea.sensible, wa, eb.sensible, wb);
        self.shortwave = linear(ea.shortwave, wa, eb.shortwave, wb);
        self.short_over_in = linear(ea.short_over_in, wa, eb.short_over_in, wb);
        self.short_under_in = linear(ea.short_under_in, wa, eb.short_under_in, wb);
        self.snow_flux = linear(ea.snow_flux, wa, eb.snow_flux, wb);
    }
}
