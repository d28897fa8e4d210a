//! Sub-tile Water/Energy Accounting Core
//!
//! Bookkeeping for the irrigated and non-irrigated sub-tiles of crop
//! vegetation in a macroscale land-surface model grid cell.
//!
//! ## What it does
//!
//! - Allocates per-cell state for every vegetation tile, elevation band and
//!   crop sub-tile, shaped by an explicit run configuration
//! - Converts area-averaged vegetation forcing to plant-specific values,
//!   splitting crop tiles into fallow-plus-rainfed and irrigated parts
//! - Moves soil moisture, canopy water and snow between sub-tiles when the
//!   irrigated fraction changes, conserving the area-integrated storage
//! - Recombines sub-tiles into area-weighted aggregates for output
//! - Estimates bare-soil evaporation (ARNO) and irrigation demand per tile
//!
//! ## Typical step
//!
//! ```no_run
//! use vic_subtile_core::{
//!     aggregate_subtiles, initialize_crop_subtiles, make_all_vars, update_step_vars,
//!     Aggregation, LinearFrontFinder, ModelConfig, SoilParams, VegForcing, VegHistory, VegTile,
//! };
//!
//! # fn main() -> Result<(), vic_subtile_core::SubtileError> {
//! let config = ModelConfig::default();
//! let mut vars = make_all_vars(1, &config);
//! let tiles = vec![VegTile::crop(1, 0.8), VegTile::plain(0, 0.2)];
//! let history = vec![VegHistory::uniform(0, VegForcing::default()); 2];
//! let soil = SoilParams::uniform(&config.options, 150.0, 10.0, 80.0, 0.3);
//!
//! initialize_crop_subtiles(&mut vars, &tiles, &history, &config)?;
//! update_step_vars(&mut vars, &tiles, &history, &config)?;
//! aggregate_subtiles(
//!     &mut vars,
//!     &tiles,
//!     &soil,
//!     &config,
//!     &LinearFrontFinder,
//!     Aggregation::StatesAndFluxes,
//! );
//! # Ok(())
//! # }
//! ```

// Configuration and errors
pub mod config;
pub mod error;

// State records and containers
pub mod grid;
pub mod state;
pub mod vegetation;

// Physics and sub-tile bookkeeping
pub mod physics;
pub mod step;
pub mod subtile;

pub use config::{ModelConfig, ModelOptions, Parameters};
pub use error::SubtileError;

pub use grid::{make_all_vars, AllVars, Subtile, SubtileGrid, TileGrid};
pub use state::{
    Aggregation, CellState, EnergyState, LayerState, Side, SideFlags, SnowState, TileState,
    VegCarbon, VegState,
};
pub use vegetation::{
    IrrigationPolicy, IrrigationTarget, IrrigationThreshold, VegForcing, VegHistory, VegLibrary,
    VegTile,
};

pub use physics::{
    arno_evap, compute_irrig_demand, convert_to_plant_specific,
    convert_to_plant_specific_crop_subtiles, Forcing, FrontFinder, LinearFrontFinder, Penman,
    PotentialEvaporation, SoilParams,
};
pub use step::{step_cells, update_step_vars, GridCell};
pub use subtile::{
    aggregate_subtiles, handle_subarea_changes, initialize_crop_subtiles, ReapportionSummary,
};
