//! Irrigated / non-irrigated sub-tiles of crop vegetation tiles
//!
//! A crop tile with crop split enabled carries two sub-tiles per elevation
//! band. Their lifecycle over a run:
//!
//! 1. `initialize_crop_subtiles` seeds both from the aggregate tile state
//! 2. each step, `handle_subarea_changes` moves stored water between them when
//!    the irrigated fraction changes
//! 3. `aggregate_subtiles` recombines them into the aggregate tile for output

pub mod aggregate;
pub mod initialize;
pub mod reapportion;

pub use aggregate::aggregate_subtiles;
pub use initialize::initialize_crop_subtiles;
pub use reapportion::{handle_subarea_changes, ReapportionSummary};
