//! Snow pack and canopy-intercepted snow state of one tile

use super::{feedback, linear, Aggregation, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnowState {
    /// Snow water equivalent of the ground pack (m)
    pub swq: f64,
    /// Snow intercepted by the canopy (m)
    pub snow_canopy: f64,
    /// Pack temperature (°C)
    pub pack_temp: f64,
    /// Surface layer temperature (°C)
    pub surf_temp: f64,
    pub albedo: f64,
    pub canopy_albedo: f64,
    /// Fractional snow coverage
    pub coverage: f64,
    /// Snow density (kg/m³)
    pub density: f64,
    /// Snow depth (m)
    pub depth: f64,
    pub coldcontent: f64,
    /// Time steps since the last snowfall
    pub last_snow: u32,
    pub max_snow_depth: f64,
    pub pack_water: f64,
    pub surf_water: f64,
    pub store_coverage: f64,
    pub store_swq: f64,
    pub snow_distrib_slope: f64,
    pub tmp_int_storage: f64,
    pub melting: bool,
    pub snow: bool,
    pub store_snow: bool,
    pub surf_temp_fbflag: bool,
    pub surf_temp_fbcount: u32,

    pub blowing_flux: f64,
    pub canopy_vapor_flux: f64,
    pub mass_error: f64,
    pub melt: f64,
    pub qnet: f64,
    pub surface_flux: f64,
    pub transport: f64,
    pub vapor_flux: f64,
}

impl SnowState {
    /// Copy every field of `src` into this record
    pub fn copy_from(&mut self, src: &SnowState) {
        self.clone_from(src);
    }

    /// Overwrite this record with the weighted combination of two sides
    ///
    /// Canopy albedo only counts from sides with an overstory; pack and
    /// surface temperatures, distribution slope and interim storage only
    /// count from sides that hold snow.
    pub fn weighted_average(
        &mut self,
        a: Side<'_, SnowState>,
        b: Side<'_, SnowState>,
        scope: Aggregation,
    ) {
        let (sa, wa) = (a.state, a.weight);
        let (sb, wb) = (b.state, b.weight);

        self.albedo = linear(sa.albedo, wa, sb.albedo, wb);

        let mut canopy_albedo = 0.0;
        let mut sum = 0.0;
        if a.flags.overstory {
            canopy_albedo += wa * sa.canopy_albedo;
            sum += wa;
        }
        if b.flags.overstory {
            canopy_albedo += wb * sb.canopy_albedo;
            sum += wb;
        }
        self.canopy_albedo = if sum > 0.0 {
            canopy_albedo / sum
        } else {
            sa.canopy_albedo
        };

        self.coldcontent = linear(sa.coldcontent, wa, sb.coldcontent, wb);
        self.coverage = linear(sa.coverage, wa, sb.coverage, wb);
        self.depth = linear(sa.depth, wa, sb.depth, wb);
        self.density = if self.depth > 0.0 {
            (wa * sa.density * sa.depth + wb * sb.density * sb.depth) / self.depth
        } else {
            0.0
        };
        self.last_snow = sa.last_snow.max(sb.last_snow);
        self.max_snow_depth = linear(sa.max_snow_depth, wa, sb.max_snow_depth, wb);
        self.melting = sa.melting || sb.melting;
        self.pack_water = linear(sa.pack_water, wa, sb.pack_water, wb);
        self.snow = sa.snow || sb.snow;
        self.snow_canopy = linear(sa.snow_canopy, wa, sb.snow_canopy, wb);
        self.store_coverage = linear(sa.store_coverage, wa, sb.store_coverage, wb);
        self.store_snow = sa.store_snow || sb.store_snow;
        self.store_swq = linear(sa.store_swq, wa, sb.store_swq, wb);
        (self.surf_temp_fbflag, self.surf_temp_fbcount) = feedback(
            sa.surf_temp_fbflag,
            sa.surf_temp_fbcount,
            sb.surf_temp_fbflag,
            sb.surf_temp_fbcount,
        );
        self.surf_water = linear(sa.surf_water, wa, sb.surf_water, wb);
        self.swq = linear(sa.swq, wa, sb.swq, wb);

        self.pack_temp = 0.0;
        self.surf_temp = 0.0;
        self.snow_distrib_slope = 0.0;
        self.tmp_int_storage = 0.0;
        for (s, w) in [(sa, wa), (sb, wb)] {
            if s.swq > 0.0 {
                self.pack_temp += w * s.pack_temp;
                self.surf_temp += w * s.surf_temp;
                self.snow_distrib_slope += w * s.snow_distrib_slope;
                self.tmp_int_storage += w * s.tmp_int_storage;
            }
        }

        if scope.includes_fluxes() {
            self.blowing_flux = linear(sa.blowing_flux, wa, sb.blowing_flux, wb);
            self.canopy_vapor_flux = linear(sa.canopy_vapor_flux, wa, sb.canopy_vapor_flux, wb);
            self.mass_error = linear(sa.mass_error, wa, sb.mass_error, wb);
            self.melt = linear(sa.melt, wa, sb.melt, wb);
            self.qnet = linear(sa.qnet, wa, sb.qnet, wb);
            self.surface_flux = linear(sa.surface_flux, wa, sb.surface_flux, wb);
            self.transport = linear(sa.transport, wa, sb.transport, wb);
            self.vapor_flux = linear(sa.vapor_flux, wa, sb.vapor_flux, wb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SideFlags;

    const OVERSTORY: SideFlags = SideFlags {
        overstory: true,
        lake: false,
        fs_active: false,
    };

    #[test]
    fn test_flags_are_or_even_with_zero_weight() {
        let a = SnowState {
            melting: true,
            snow: true,
            store_snow: true,
            ..SnowState::default()
        };
        let b = SnowState::default();

        let mut out = SnowState::default();
        out.weighted_average(Side::new(&a, 0.0), Side::new(&b, 1.0), Aggregation::StatesOnly);
        assert!(out.melting && out.snow && out.store_snow);

        out.weighted_average(Side::new(&b, 0.5), Side::new(&b, 0.5), Aggregation::StatesOnly);
        assert!(!out.melting && !out.snow && !out.store_snow);
    }

    #[test]
    fn test_feedback_counter_takes_max() {
        let a = SnowState {
            surf_temp_fbflag: true,
            surf_temp_fbcount: 2,
            ..SnowState::default()
        };
        let b = SnowState {
            surf_temp_fbcount: 6,
            ..SnowState::default()
        };
        let mut out = SnowState::default();
        out.weighted_average(Side::new(&a, 0.5), Side::new(&b, 0.5), Aggregation::StatesOnly);
        assert!(out.surf_temp_fbflag);
        assert_eq!(out.surf_temp_fbcount, 6);
    }

    #[test]
    fn test_canopy_albedo_by_overstory() {
        let a = SnowState {
            canopy_albedo: 0.6,
            ..SnowState::default()
        };
        let b = SnowState {
            canopy_albedo: 0.2,
            ..SnowState::default()
        };
        let mut out = SnowState::default();

        // Only side b has an overstory: its value, renormalized
        out.weighted_average(
            Side::new(&a, 0.3),
            Side::new(&b, 0.7).with_flags(OVERSTORY),
            Aggregation::StatesOnly,
        );
        assert!((out.canopy_albedo - 0.2).abs() < 1e-12);

        // Both sides
        out.weighted_average(
            Side::new(&a, 0.5).with_flags(OVERSTORY),
            Side::new(&b, 0.5).with_flags(OVERSTORY),
            Aggregation::StatesOnly,
        );
        assert!((out.canopy_albedo - 0.4).abs() < 1e-12);

        // Neither: falls back to side a's raw value
        out.weighted_average(Side::new(&a, 0.5), Side::new(&b, 0.5), Aggregation::StatesOnly);
        assert_eq!(out.canopy_albedo, 0.6);
    }

    #[test]
    fn test_pack_temperature_only_from_snowy_sides() {
        let a = SnowState {
            swq: 0.1,
            pack_temp: -4.0,
            surf_temp: -6.0,
            ..SnowState::default()
        };
        let b = SnowState {
            swq: 0.0,
            pack_temp: -20.0,
            surf_temp: -20.0,
            ..SnowState::default()
        };
        let mut out = SnowState::default();
        out.weighted_average(Side::new(&a, 0.5), Side::new(&b, 0.5), Aggregation::StatesOnly);
        assert!((out.pack_temp + 2.0).abs() < 1e-12);
        assert!((out.surf_temp + 3.0).abs() < 1e-12);
        assert!((out.swq - 0.05).abs() < 1e-12);

        let bare = SnowState::default();
        out.weighted_average(Side::new(&b, 0.5), Side::new(&bare, 0.5), Aggregation::StatesOnly);
        assert_eq!(out.pack_temp, 0.0);
        assert_eq!(out.surf_temp, 0.0);
    }

    #[test]
    fn test_density_is_depth_weighted() {
        let a = SnowState {
            depth: 1.0,
            density: 100.0,
            ..SnowState::default()
        };
        let b = SnowState {
            depth: 3.0,
            density: 300.0,
            ..SnowState::default()
        };
        let mut out = SnowState::default();
        out.weighted_average(Side::new(&a, 0.5), Side::new(&b, 0.5), Aggregation::StatesOnly);
        // (0.5*100*1 + 0.5*300*3) / 2
        assert!((out.density - 250.0).abs() < 1e-12);

        let empty = SnowState::default();
        out.weighted_average(Side::new(&empty, 0.5), Side::new(&empty, 0.5), Aggregation::StatesOnly);
        assert_eq!(out.density, 0.0);
    }
}
