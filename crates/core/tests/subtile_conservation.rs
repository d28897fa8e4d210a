//! Conservation of stored water through whole sub-tile steps
//!
//! Drives randomized cells through allocation, initialization, a sequence of
//! steps with a changing irrigated fraction, and aggregation, checking that
//! the area-integrated soil moisture and snow water equivalent of each crop
//! tile never change.
//!
//! Run tests with: cargo test --test `subtile_conservation`

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vic_subtile_core::{
    aggregate_subtiles, initialize_crop_subtiles, make_all_vars, update_step_vars, Aggregation,
    AllVars, LinearFrontFinder, ModelConfig, ModelOptions, Parameters, SoilParams, Subtile,
    VegForcing, VegHistory, VegTile,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const NVEG: usize = 3;
const BANDS: usize = 3;

fn config() -> ModelConfig {
    ModelConfig::new(
        ModelOptions {
            snow_bands: BANDS,
            nr: 2,
            ..ModelOptions::default()
        },
        Parameters::default(),
    )
    .unwrap()
}

fn forcing(firr: f64) -> VegForcing {
    VegForcing {
        albedo: 0.18,
        lai: 2.5,
        fcanopy: 0.7,
        displacement: 0.6,
        roughness: 0.12,
        fcrop: 0.8,
        firr,
    }
}

fn histories(config: &ModelConfig, firr: &[f64]) -> Vec<VegHistory> {
    firr.iter()
        .map(|&f| VegHistory::uniform(config.options.nr, forcing(f)))
        .collect()
}

/// Vegetation rows of the crop tiles
const CROP_ROWS: [usize; 2] = [0, 2];

/// Two crop tiles, one plain tile, bare soil
fn tiles() -> Vec<VegTile> {
    vec![
        VegTile::crop(10, 0.4),
        VegTile::plain(4, 0.2),
        VegTile::crop(11, 0.3),
        VegTile::plain(0, 0.1),
    ]
}

fn randomize(vars: &mut AllVars, rng: &mut StdRng) {
    for iveg in 0..=NVEG {
        for band in 0..BANDS {
            let tile = vars.tiles.get_mut(iveg, band);
            for layer in &mut tile.cell.layers {
                layer.moist = rng.random_range(20.0..140.0);
            }
            tile.veg.wdew = rng.random_range(0.0..0.5);
            tile.snow.swq = rng.random_range(0.0..0.2);
            tile.snow.snow_canopy = rng.random_range(0.0..0.01);
        }
    }
}

/// Every (row, band) of the crop tiles
fn crop_slots() -> Vec<(usize, usize)> {
    CROP_ROWS
        .iter()
        .flat_map(|&iveg| (0..BANDS).map(move |band| (iveg, band)))
        .collect()
}

/// Area-integrated (per layer moisture, swq) of one crop tile and band
fn integrated(vars: &AllVars, iveg: usize, band: usize, firr: f64) -> (Vec<f64>, f64) {
    let (dry, wet) = vars.subtiles.as_ref().unwrap().pair(iveg, band);
    let moist = dry
        .cell
        .layers
        .iter()
        .zip(&wet.cell.layers)
        .map(|(d, w)| (1.0 - firr) * d.moist + firr * w.moist)
        .collect();
    let swq = (1.0 - firr) * dry.snow.swq + firr * wet.snow.swq;
    (moist, swq)
}

#[test]
fn test_initialization_preserves_aggregate_storage() {
    let config = config();
    let mut rng = StdRng::seed_from_u64(11);
    let mut vars = make_all_vars(NVEG, &config);
    randomize(&mut vars, &mut rng);
    let tiles = tiles();
    let hist = histories(&config, &[0.3, 0.0, 0.6, 0.0]);

    initialize_crop_subtiles(&mut vars, &tiles, &hist, &config).unwrap();

    for (iveg, firr) in CROP_ROWS.into_iter().zip([0.3, 0.6]) {
        for band in 0..BANDS {
            let agg = vars.tiles.get(iveg, band);
            let (moist, swq) = integrated(&vars, iveg, band, firr);
            for (l, m) in moist.iter().enumerate() {
                assert_relative_eq!(*m, agg.cell.layers[l].moist, epsilon = 1e-9);
            }
            assert_relative_eq!(swq, agg.snow.swq, epsilon = 1e-12);

            let (dry, wet) = vars.subtiles.as_ref().unwrap().pair(iveg, band);
            let dew = (1.0 - firr) * dry.veg.wdew + firr * wet.veg.wdew;
            assert_relative_eq!(dew, agg.veg.wdew, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_random_firr_sequence_conserves_storage() {
    let config = config();
    let tiles = tiles();
    let soil = SoilParams::uniform(&config.options, 150.0, 10.0, 80.0, 0.3);
    let slots = crop_slots();

    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut vars = make_all_vars(NVEG, &config);
        randomize(&mut vars, &mut rng);

        let mut firr = [rng.random_range(0.0..1.0), 0.0, rng.random_range(0.0..1.0), 0.0];
        initialize_crop_subtiles(&mut vars, &tiles, &histories(&config, &firr), &config)
            .unwrap();
        // First step only records the fraction
        update_step_vars(&mut vars, &tiles, &histories(&config, &firr), &config).unwrap();

        for _ in 0..20 {
            let before: Vec<_> = slots
                .iter()
                .map(|&(iveg, band)| integrated(&vars, iveg, band, firr[iveg]))
                .collect();

            // Occasionally pin the fraction to its bounds
            for iveg in CROP_ROWS {
                firr[iveg] = match rng.random_range(0..10) {
                    0 => 0.0,
                    1 => 1.0,
                    _ => rng.random_range(0.0..1.0),
                };
            }
            let summary =
                update_step_vars(&mut vars, &tiles, &histories(&config, &firr), &config)
                    .unwrap();
            assert_eq!(
                summary.grown + summary.shrunk + summary.unchanged,
                2 * BANDS
            );

            let after: Vec<_> = slots
                .iter()
                .map(|&(iveg, band)| integrated(&vars, iveg, band, firr[iveg]))
                .collect();

            for ((m0, s0), (m1, s1)) in before.iter().zip(&after) {
                for (a, b) in m0.iter().zip(m1) {
                    assert_relative_eq!(*a, *b, epsilon = 1e-8);
                }
                assert_relative_eq!(*s0, *s1, epsilon = 1e-12);
            }

            aggregate_subtiles(
                &mut vars,
                &tiles,
                &soil,
                &config,
                &LinearFrontFinder,
                Aggregation::StatesOnly,
            );
            for (&(iveg, band), (moist, swq)) in slots.iter().zip(&after) {
                let agg = vars.tiles.get(iveg, band);
                for (layer, m) in agg.cell.layers.iter().zip(moist) {
                    assert_relative_eq!(layer.moist, *m, epsilon = 1e-9);
                }
                assert_relative_eq!(agg.snow.swq, *swq, epsilon = 1e-12);
                assert_eq!(agg.veg.firr_save, Some(firr[iveg]));
            }
        }
    }
}

/// History whose sub-steps disagree with the step-aggregate slot
fn drifting_histories(config: &ModelConfig, first: &[f64], last: &[f64]) -> Vec<VegHistory> {
    first
        .iter()
        .zip(last)
        .map(|(&f0, &fr)| {
            let mut hist = VegHistory::uniform(config.options.nr, forcing(f0));
            let nr = config.options.nr;
            for (i, slot) in hist.steps.iter_mut().enumerate().skip(1) {
                slot.firr = f0 + (fr - f0) * i as f64 / nr as f64;
            }
            hist
        })
        .collect()
}

#[test]
fn test_aggregate_matches_storage_when_sub_steps_drift() {
    let config = config();
    let tiles = tiles();
    let soil = SoilParams::uniform(&config.options, 150.0, 10.0, 80.0, 0.3);
    let slots = crop_slots();
    let mut rng = StdRng::seed_from_u64(29);
    let mut vars = make_all_vars(NVEG, &config);
    randomize(&mut vars, &mut rng);

    let mut first = [0.5, 0.0, 0.2, 0.0];
    initialize_crop_subtiles(&mut vars, &tiles, &histories(&config, &first), &config).unwrap();
    update_step_vars(&mut vars, &tiles, &histories(&config, &first), &config).unwrap();

    for _ in 0..10 {
        let before: Vec<_> = slots
            .iter()
            .map(|&(iveg, band)| integrated(&vars, iveg, band, first[iveg]))
            .collect();

        let mut last = [0.0; NVEG + 1];
        for iveg in CROP_ROWS {
            first[iveg] = rng.random_range(0.05..0.95);
            last[iveg] = rng.random_range(0.05..0.95);
        }
        let hist = drifting_histories(&config, &first, &last);
        update_step_vars(&mut vars, &tiles, &hist, &config).unwrap();

        // Put uneven storage on the two sides after the transfer
        for &(iveg, band) in &slots {
            let subtiles = vars.subtiles.as_mut().unwrap();
            let (dry, wet) = subtiles.pair_mut(iveg, band);
            dry.cell.layers[0].moist += 60.0;
            wet.cell.layers[0].moist = (wet.cell.layers[0].moist - 60.0).max(0.0);
        }
        let after: Vec<_> = slots
            .iter()
            .map(|&(iveg, band)| integrated(&vars, iveg, band, first[iveg]))
            .collect();

        aggregate_subtiles(
            &mut vars,
            &tiles,
            &soil,
            &config,
            &LinearFrontFinder,
            Aggregation::StatesOnly,
        );

        for ((&(iveg, band), (moist, swq)), (_, swq0)) in slots.iter().zip(&after).zip(&before) {
            let agg = vars.tiles.get(iveg, band);
            assert_eq!(agg.veg.firr_save, Some(first[iveg]));
            for (layer, m) in agg.cell.layers.iter().zip(moist) {
                assert_relative_eq!(layer.moist, *m, epsilon = 1e-9);
            }
            assert_relative_eq!(agg.snow.swq, *swq, epsilon = 1e-12);
            assert_relative_eq!(*swq, *swq0, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_plain_tiles_never_touch_subtiles() {
    let config = config();
    let mut rng = StdRng::seed_from_u64(3);
    let mut vars = make_all_vars(NVEG, &config);
    randomize(&mut vars, &mut rng);
    let tiles = tiles();

    for firr in [0.2, 0.5, 0.1] {
        let hist = histories(&config, &[firr, firr, firr, firr]);
        update_step_vars(&mut vars, &tiles, &hist, &config).unwrap();
    }

    let subtiles = vars.subtiles.as_ref().unwrap();
    for iveg in [1, 3] {
        for subtile in Subtile::ALL {
            for band in 0..BANDS {
                let t = subtiles.get(iveg, subtile, band);
                assert_eq!(t.cell.layers[0].moist, 0.0);
                assert_eq!(t.veg.lai, 0.0);
            }
        }
        assert!(vars.tiles.get(iveg, 0).veg.firr_save.is_none());
    }
}
