//! Dense per-cell containers of tile state and the all-vars factory
//!
//! `TileGrid` holds one `TileState` per `[veg][band]`; `SubtileGrid` holds one
//! per `[veg][subtile][band]`. Both are a single contiguous `Vec` indexed
//! arithmetically, with row count `nveg + 1` (the extra row is bare soil).

use crate::config::{ModelConfig, MAX_SUBTILES};
use crate::error::SubtileError;
use crate::state::TileState;
use crate::vegetation::{VegHistory, VegTile};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Sub-tile of a crop-split vegetation tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subtile {
    /// Fallow plus rainfed crop (slot 0)
    NonIrrigated,
    /// Irrigated crop (slot 1)
    Irrigated,
}

impl Subtile {
    pub const ALL: [Subtile; MAX_SUBTILES] = [Subtile::NonIrrigated, Subtile::Irrigated];

    /// Storage slot of this sub-tile
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Subtile::NonIrrigated => 0,
            Subtile::Irrigated => 1,
        }
    }

    pub const fn from_index(index: usize) -> Option<Subtile> {
        match index {
            0 => Some(Subtile::NonIrrigated),
            1 => Some(Subtile::Irrigated),
            _ => None,
        }
    }
}

/// Tile state indexed by `[veg][band]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    nitems: usize,
    nbands: usize,
    tiles: Vec<TileState>,
}

impl TileGrid {
    pub fn new(nitems: usize, config: &ModelConfig) -> Self {
        let nbands = config.options.snow_bands;
        TileGrid {
            nitems,
            nbands,
            tiles: vec![TileState::new(&config.options); nitems * nbands],
        }
    }

    /// Number of vegetation rows (vegetation types plus bare soil)
    pub fn nitems(&self) -> usize {
        self.nitems
    }

    pub fn nbands(&self) -> usize {
        self.nbands
    }

    #[inline]
    fn index(&self, veg: usize, band: usize) -> usize {
        debug_assert!(veg < self.nitems && band < self.nbands);
        veg * self.nbands + band
    }

    #[inline]
    pub fn get(&self, veg: usize, band: usize) -> &TileState {
        &self.tiles[self.index(veg, band)]
    }

    #[inline]
    pub fn get_mut(&mut self, veg: usize, band: usize) -> &mut TileState {
        let idx = self.index(veg, band);
        &mut self.tiles[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileState> {
        self.tiles.iter()
    }
}

/// Tile state indexed by `[veg][subtile][band]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtileGrid {
    nitems: usize,
    nbands: usize,
    tiles: Vec<TileState>,
}

impl SubtileGrid {
    pub fn new(nitems: usize, config: &ModelConfig) -> Self {
        let nbands = config.options.snow_bands;
        SubtileGrid {
            nitems,
            nbands,
            tiles: vec![TileState::new(&config.options); nitems * MAX_SUBTILES * nbands],
        }
    }

    pub fn nitems(&self) -> usize {
        self.nitems
    }

    pub fn nbands(&self) -> usize {
        self.nbands
    }

    #[inline]
    fn index(&self, veg: usize, subtile: Subtile, band: usize) -> usize {
        debug_assert!(veg < self.nitems && band < self.nbands);
        (veg * MAX_SUBTILES + subtile.index()) * self.nbands + band
    }

    #[inline]
    pub fn get(&self, veg: usize, subtile: Subtile, band: usize) -> &TileState {
        &self.tiles[self.index(veg, subtile, band)]
    }

    #[inline]
    pub fn get_mut(&mut self, veg: usize, subtile: Subtile, band: usize) -> &mut TileState {
        let idx = self.index(veg, subtile, band);
        &mut self.tiles[idx]
    }

    /// Both sub-tiles of one `[veg][band]`, as `(non_irrigated, irrigated)`
    pub fn pair(&self, veg: usize, band: usize) -> (&TileState, &TileState) {
        (
            self.get(veg, Subtile::NonIrrigated, band),
            self.get(veg, Subtile::Irrigated, band),
        )
    }

    /// Mutable access to both sub-tiles of one `[veg][band]`
    pub fn pair_mut(&mut self, veg: usize, band: usize) -> (&mut TileState, &mut TileState) {
        let i0 = self.index(veg, Subtile::NonIrrigated, band);
        let i1 = self.index(veg, Subtile::Irrigated, band);
        let (head, tail) = self.tiles.split_at_mut(i1);
        (&mut head[i0], &mut tail[0])
    }
}

/// All state of one grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllVars {
    /// Aggregate state per `[veg][band]`
    pub tiles: TileGrid,
    /// Sub-tile state per `[veg][subtile][band]`; present iff crop split is on
    pub subtiles: Option<SubtileGrid>,
}

impl AllVars {
    /// Allocate the containers for a cell with `nveg` vegetation types
    ///
    /// Every record is zeroed and shaped by the run configuration; the
    /// irrigated-fraction memory of each tile starts out unset.
    pub fn new(nveg: usize, config: &ModelConfig) -> Self {
        let nitems = nveg + 1;
        let subtiles = config
            .options
            .crop_split
            .then(|| SubtileGrid::new(nitems, config));

        info!(
            "Allocated cell state: {} vegetation rows x {} bands, subtiles: {}",
            nitems,
            config.options.snow_bands,
            subtiles.is_some()
        );

        AllVars {
            tiles: TileGrid::new(nitems, config),
            subtiles,
        }
    }

    /// Number of vegetation types, excluding bare soil
    pub fn nveg(&self) -> usize {
        self.tiles.nitems() - 1
    }

    /// Check per-tile inputs against the allocated containers
    ///
    /// The containers must match the configuration they are driven with.
    /// Tiles and histories need one entry per vegetation row, every history
    /// must reach the step-aggregate slot `nr`, and no tile may claim more
    /// sub-tiles than are allocated.
    pub fn check_inputs(
        &self,
        veg_tiles: &[VegTile],
        veg_hist: &[VegHistory],
        config: &ModelConfig,
    ) -> Result<(), SubtileError> {
        if config.options.crop_split != self.subtiles.is_some() {
            return Err(SubtileError::invalid(
                "crop_split",
                "cell state was allocated under a different crop-split setting",
            ));
        }
        SubtileError::check_len("snow bands", config.options.snow_bands, self.tiles.nbands())?;
        let nitems = self.tiles.nitems();
        SubtileError::check_len("vegetation tiles", nitems, veg_tiles.len())?;
        SubtileError::check_len("vegetation histories", nitems, veg_hist.len())?;
        for hist in veg_hist {
            SubtileError::check_len("history steps", config.options.nr + 1, hist.steps.len())?;
        }
        if let Some(tile) = veg_tiles.iter().find(|t| t.nsubtiles > MAX_SUBTILES) {
            return Err(SubtileError::invalid(
                "nsubtiles",
                format!("{} exceeds the maximum of {}", tile.nsubtiles, MAX_SUBTILES),
            ));
        }
        Ok(())
    }
}

/// Allocate all state containers for one cell
pub fn make_all_vars(nveg: usize, config: &ModelConfig) -> AllVars {
    AllVars::new(nveg, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelOptions;
    use crate::vegetation::VegForcing;

    fn config(crop_split: bool, bands: usize) -> ModelConfig {
        ModelConfig {
            options: ModelOptions {
                crop_split,
                snow_bands: bands,
                ..ModelOptions::default()
            },
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_subtile_index_roundtrip() {
        for s in Subtile::ALL {
            assert_eq!(Subtile::from_index(s.index()), Some(s));
        }
        assert_eq!(Subtile::from_index(2), None);
    }

    #[test]
    fn test_make_all_vars_shape() {
        let vars = make_all_vars(4, &config(true, 3));
        assert_eq!(vars.nveg(), 4);
        assert_eq!(vars.tiles.nitems(), 5);
        assert_eq!(vars.tiles.nbands(), 3);
        assert_eq!(vars.tiles.iter().count(), 15);

        let subtiles = vars.subtiles.as_ref().unwrap();
        assert_eq!(subtiles.nitems(), 5);
        assert_eq!(subtiles.nbands(), 3);
        assert!(vars.tiles.get(4, 2).veg.firr_save.is_none());
    }

    #[test]
    fn test_check_inputs() {
        let cfg = config(true, 1);
        let vars = make_all_vars(1, &cfg);
        let tiles = vec![VegTile::crop(1, 0.6), VegTile::plain(0, 0.4)];
        let hist = vec![VegHistory::uniform(0, VegForcing::default()); 2];
        assert!(vars.check_inputs(&tiles, &hist, &cfg).is_ok());

        let err = vars.check_inputs(&tiles[..1], &hist, &cfg).unwrap_err();
        assert_eq!(
            err,
            SubtileError::ShapeMismatch {
                what: "vegetation tiles",
                expected: 2,
                found: 1
            }
        );

        let short = vec![VegHistory { steps: vec![] }; 2];
        assert!(vars.check_inputs(&tiles, &short, &cfg).is_err());

        let mut bad = tiles.clone();
        bad[0].nsubtiles = 3;
        assert!(matches!(
            vars.check_inputs(&bad, &hist, &cfg),
            Err(SubtileError::InvalidConfig { field: "nsubtiles", .. })
        ));

        let other = config(false, 1);
        assert!(matches!(
            vars.check_inputs(&tiles, &hist, &other),
            Err(SubtileError::InvalidConfig { field: "crop_split", .. })
        ));
        let banded = config(true, 2);
        assert!(matches!(
            vars.check_inputs(&tiles, &hist, &banded),
            Err(SubtileError::ShapeMismatch { what: "snow bands", .. })
        ));
    }

    #[test]
    fn test_no_subtiles_without_crop_split() {
        let vars = make_all_vars(2, &config(false, 1));
        assert!(vars.subtiles.is_none());
    }

    #[test]
    fn test_grids_index_independent_slots() {
        let mut vars = make_all_vars(2, &config(true, 2));
        vars.tiles.get_mut(1, 1).veg.lai = 3.0;
        assert_eq!(vars.tiles.get(1, 0).veg.lai, 0.0);
        assert_eq!(vars.tiles.get(2, 1).veg.lai, 0.0);

        let subtiles = vars.subtiles.as_mut().unwrap();
        {
            let (dry, wet) = subtiles.pair_mut(1, 1);
            dry.veg.wdew = 1.0;
            wet.veg.wdew = 2.0;
        }
        assert_eq!(subtiles.get(1, Subtile::NonIrrigated, 1).veg.wdew, 1.0);
        assert_eq!(subtiles.get(1, Subtile::Irrigated, 1).veg.wdew, 2.0);
        assert_eq!(subtiles.get(1, Subtile::Irrigated, 0).veg.wdew, 0.0);
        assert_eq!(subtiles.get(2, Subtile::NonIrrigated, 1).veg.wdew, 0.0);
    }
}
