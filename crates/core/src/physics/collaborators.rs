//! Physics solvers the sub-tile routines call but do not own
//!
//! # Scientific References
//! - Monteith, J.L. (1965). "Evaporation and environment"
//!   Symposia of the Society for Experimental Biology, 19, 205-234
//! - Wigmosta, M.S., Vail, L.W., Lettenmaier, D.P. (1994). "A distributed
//!   hydrology-vegetation model for complex terrain"
//!   Water Resources Research, 30(6), 1665-1679

use crate::config::{MAX_FRONTS, MISSING, SECONDS_PER_DAY};
use crate::state::EnergyState;

/// Potential evaporation from a surface
pub trait PotentialEvaporation {
    /// Potential evaporation (mm/day)
    ///
    /// # Arguments
    /// * `air_temp` - Air temperature (°C)
    /// * `elevation` - Surface elevation (m)
    /// * `rad` - Net radiation (W/m²)
    /// * `vpd` - Vapour pressure deficit (Pa)
    /// * `ra` - Aerodynamic resistance (s/m)
    /// * `rc` - Surface (canopy) resistance (s/m)
    /// * `rarc` - Architectural resistance (s/m)
    fn potential_evap(
        &self,
        air_temp: f64,
        elevation: f64,
        rad: f64,
        vpd: f64,
        ra: f64,
        rc: f64,
        rarc: f64,
    ) -> f64;
}

/// Finds 0 °C isotherm crossings in a soil temperature profile
pub trait FrontFinder {
    /// Update `fdepth`, `tdepth`, `nfrost` and `nthaw` of `energy` from its
    /// node temperatures, with node depths `zsum_node`
    fn find_fronts(&self, energy: &mut EnergyState, zsum_node: &[f64]);
}

const SVP_A: f64 = 610.78; // Pa
const SVP_B: f64 = 17.269;
const SVP_C: f64 = 237.3; // °C
const CP_MOIST_AIR: f64 = 1004.64; // J/kg/K
const R_DRY_AIR: f64 = 287.04; // J/kg/K
const GRAVITY: f64 = 9.80616; // m/s²
const LAPSE_RATE: f64 = -0.0065; // K/m
const P_STD: f64 = 101325.0; // Pa
const T_FREEZE_K: f64 = 273.15;

/// Saturated vapour pressure (Pa)
fn svp(t: f64) -> f64 {
    SVP_A * (SVP_B * t / (SVP_C + t)).exp()
}

/// Slope of the saturated vapour pressure curve (Pa/K)
fn svp_slope(t: f64) -> f64 {
    (SVP_B * SVP_C) / ((SVP_C + t) * (SVP_C + t)) * svp(t)
}

/// Latent heat of vaporization (J/kg)
fn latent_heat_of_vaporization(t: f64) -> f64 {
    2.501e6 - 0.002361e6 * t
}

/// Penman-Monteith combination equation
#[derive(Debug, Clone, Copy, Default)]
pub struct Penman;

impl PotentialEvaporation for Penman {
    fn potential_evap(
        &self,
        air_temp: f64,
        elevation: f64,
        rad: f64,
        vpd: f64,
        ra: f64,
        rc: f64,
        rarc: f64,
    ) -> f64 {
        let slope = svp_slope(air_temp);

        // Hypsometric pressure at elevation with a column-mean scale height
        let scale_height =
            R_DRY_AIR / GRAVITY * ((air_temp + T_FREEZE_K) + 0.5 * elevation * LAPSE_RATE);
        let pz = P_STD * (-elevation / scale_height).exp();

        let lv = latent_heat_of_vaporization(air_temp);
        let gamma = 1628.6 * pz / lv;
        let r_air = 0.003486 * pz / (275.0 + air_temp);

        let evap = (slope * rad + r_air * CP_MOIST_AIR * vpd / ra)
            / (lv * (slope + gamma * (1.0 + (rc + rarc) / ra)))
            * SECONDS_PER_DAY;

        if vpd >= 0.0 && evap < 0.0 {
            0.0
        } else {
            evap
        }
    }
}

/// Locates fronts by linear interpolation between adjacent nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearFrontFinder;

impl FrontFinder for LinearFrontFinder {
    fn find_fronts(&self, energy: &mut EnergyState, zsum_node: &[f64]) {
        let mut fdepth = [MISSING; MAX_FRONTS];
        let mut tdepth = [MISSING; MAX_FRONTS];
        let mut nfrost = 0;
        let mut nthaw = 0;

        let t = &energy.t;
        let nodes = t.len().min(zsum_node.len());
        for i in (0..nodes.saturating_sub(1)).rev() {
            let (t0, t1) = (t[i], t[i + 1]);
            let (z0, z1) = (zsum_node[i], zsum_node[i + 1]);
            if t0 > 0.0 && t1 <= 0.0 && nthaw < MAX_FRONTS {
                tdepth[nthaw] = interp_zero(t0, t1, z0, z1);
                nthaw += 1;
            } else if t0 < 0.0 && t1 >= 0.0 && nfrost < MAX_FRONTS {
                fdepth[nfrost] = interp_zero(t0, t1, z0, z1);
                nfrost += 1;
            }
        }

        energy.fdepth = fdepth;
        energy.tdepth = tdepth;
        energy.nfrost = nfrost;
        energy.nthaw = nthaw;
    }
}

/// Depth where temperature crosses 0 °C between two nodes
fn interp_zero(t0: f64, t1: f64, z0: f64, z1: f64) -> f64 {
    z0 + (0.0 - t0) * (z1 - z0) / (t1 - t0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelOptions;

    #[test]
    fn test_svp_at_freezing() {
        assert!((svp(0.0) - 610.78).abs() < 1e-9);
        assert!(svp_slope(20.0) > svp_slope(0.0));
    }

    #[test]
    fn test_penman_positive_for_sunny_day() {
        let e = Penman.potential_evap(20.0, 200.0, 150.0, 1000.0, 100.0, 0.0, 100.0);
        // A few mm per day is the plausible range
        assert!(e > 1.0 && e < 10.0, "potential evaporation was {e}");
    }

    #[test]
    fn test_penman_clips_negative_under_deficit() {
        let e = Penman.potential_evap(5.0, 0.0, -200.0, 0.0, 100.0, 0.0, 100.0);
        assert_eq!(e, 0.0);
    }

    #[test]
    fn test_penman_more_resistance_less_evap() {
        let low = Penman.potential_evap(20.0, 0.0, 150.0, 1000.0, 100.0, 0.0, 50.0);
        let high = Penman.potential_evap(20.0, 0.0, 150.0, 1000.0, 100.0, 0.0, 500.0);
        assert!(high < low);
    }

    #[test]
    fn test_linear_front_finder() {
        let options = ModelOptions {
            nnode: 4,
            ..ModelOptions::default()
        };
        let mut energy = EnergyState::new(&options);
        // Thawed surface over a frozen layer over thawed soil
        energy.t = vec![2.0, -2.0, -1.0, 3.0];
        let zsum = [0.0, 0.2, 0.6, 1.0];

        LinearFrontFinder.find_fronts(&mut energy, &zsum);

        assert_eq!(energy.nthaw, 1);
        assert_eq!(energy.nfrost, 1);
        assert!((energy.tdepth[0] - 0.1).abs() < 1e-12);
        // -1 at 0.6 to 3 at 1.0 crosses zero at 0.7
        assert!((energy.fdepth[0] - 0.7).abs() < 1e-12);
        assert_eq!(energy.tdepth[1], MISSING);
    }
}
