//! Land-surface routines operating on a single tile
//!
//! The heavy physics (Penman-Monteith potential evaporation, frozen-front
//! detection) sits behind traits in `collaborators` so an embedding model can
//! supply its own solvers; default implementations are provided.

pub mod arno_evap;
pub mod collaborators;
pub mod inputs;
pub mod irrigation;
pub mod plant_specific;

pub use arno_evap::arno_evap;
pub use collaborators::{FrontFinder, LinearFrontFinder, Penman, PotentialEvaporation};
pub use inputs::{Forcing, SoilParams};
pub use irrigation::compute_irrig_demand;
pub use plant_specific::{convert_to_plant_specific, convert_to_plant_specific_crop_subtiles};
