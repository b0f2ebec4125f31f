//! River and lake carving
//!
//! The river follows steepest descent from the top row to the bottom row with
//! random meandering. The lake is not a flood fill: the lowest cells are
//! picked, blurred and thresholded, which gives a rounded (possibly
//! disconnected) blob around the terrain's deepest area.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CityGenError, Result};
use crate::tilemap::Tilemap;

/// Sigma of the blur used to round the lake seed cells.
pub const LAKE_BLUR_SIGMA: f32 = 2.0;

/// Kernel half-width in sigmas.
const BLUR_TRUNCATE: f32 = 4.0;

/// Water levels are pinned to this multiple of the terrain minimum.
const WATER_LEVEL_FACTOR: f32 = 1.1;

/// Parameters for river and lake generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterParams {
    pub river_enabled: bool,
    /// Probability per row of shifting the river one column sideways
    pub meander: f64,
    pub river_width: usize,
    /// Fixed river source column on the top row (random if unset)
    pub river_start: Option<usize>,
    pub lake_enabled: bool,
    /// Fraction of all cells used as lake seeds
    pub lake_size_factor: f64,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            river_enabled: true,
            meander: 0.3,
            river_width: 3,
            river_start: None,
            lake_enabled: true,
            lake_size_factor: 0.05,
        }
    }
}

impl WaterParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.meander) {
            return Err(CityGenError::invalid("meander", format!("{} is outside [0, 1]", self.meander)));
        }
        if self.river_width == 0 {
            return Err(CityGenError::invalid("river_width", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.lake_size_factor) {
            return Err(CityGenError::invalid(
                "lake_size_factor",
                format!("{} is outside [0, 1]", self.lake_size_factor),
            ));
        }
        Ok(())
    }
}

/// Seam between the pipeline and whatever produces the water mask.
pub trait WaterFeatures {
    /// Carve water into `heightmap` and return the water mask.
    fn apply(&self, heightmap: &mut Tilemap<f32>, params: &WaterParams, rng: &mut ChaCha8Rng) -> Result<Tilemap<bool>>;
}

pub struct WaterGenerator {
    width: usize,
    height: usize,
}

impl WaterGenerator {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Trace a river from the top row down to the bottom row.
    ///
    /// Every row above the bottom one marks a band of `river_width` cells centred on the current
    /// column, then the next row's column is the lowest of x-1, x, x+1
    /// (leftmost on ties), optionally nudged ±1 with probability `meander`.
    pub fn generate_river(
        &self,
        heightmap: &Tilemap<f32>,
        start_x: Option<usize>,
        meander: f64,
        river_width: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<Tilemap<bool>> {
        if self.width == 0 || self.height == 0 {
            return Err(CityGenError::InvalidDimensions { width: self.width, height: self.height });
        }
        heightmap.ensure_size("heightmap", self.width, self.height)?;
        let mut river = Tilemap::new_with(self.width, self.height, false);
        let mut x = match start_x {
            Some(x) if x < self.width => x,
            Some(x) => {
                return Err(CityGenError::OutOfBounds {
                    x: x as i64,
                    y: 0,
                    width: self.width,
                    height: self.height,
                })
            }
            None => rng.gen_range(0..self.width),
        };

        let half = river_width / 2;
        for y in 0..self.height {
            // the walk ends on the bottom row, which is never marked
            let next_y = y + 1;
            if next_y >= self.height {
                break;
            }

            let left = x.saturating_sub(half);
            let right = (x + half).min(self.width - 1);
            for bx in left..=right {
                river.set(bx, y, true);
            }

            // Move downhill
            let mut next_x = x;
            let mut lowest = f32::MAX;
            for px in x.saturating_sub(1)..=(x + 1).min(self.width - 1) {
                let h = *heightmap.get(px, next_y);
                if h < lowest {
                    lowest = h;
                    next_x = px;
                }
            }

            if rng.gen::<f64>() < meander {
                next_x = if rng.gen_bool(0.5) {
                    next_x.saturating_sub(1)
                } else {
                    (next_x + 1).min(self.width - 1)
                };
            }

            x = next_x;
        }

        Ok(river)
    }

    /// Mark the lowest `width * height * size_factor` cells, blur and threshold.
    pub fn generate_lake(&self, heightmap: &Tilemap<f32>, size_factor: f64) -> Result<Tilemap<bool>> {
        heightmap.ensure_size("heightmap", self.width, self.height)?;
        let total = self.width * self.height;
        let lake_size = ((total as f64 * size_factor) as usize).min(total);

        let values = heightmap.as_slice();
        let mut order: Vec<usize> = (0..total).collect();
        // stable on ties: equal heights keep row-major order
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));

        let mut seeds = Tilemap::new_with(self.width, self.height, 0.0f32);
        for &idx in &order[..lake_size] {
            seeds.set(idx % self.width, idx / self.width, 1.0);
        }

        let blurred = gaussian_blur(&seeds, LAKE_BLUR_SIGMA);
        let mut lake = Tilemap::new_with(self.width, self.height, false);
        for (x, y, &v) in blurred.iter() {
            if v > 0.5 {
                lake.set(x, y, true);
            }
        }
        Ok(lake)
    }

    /// Union river and lake, then lower the heightmap under water to
    /// `min(h, global_min * 1.1)`.
    ///
    /// For a negative minimum this sinks water below the lowest terrain. For a
    /// non-negative one it only pulls cells down to `1.1 * min`; on a
    /// normalized map water ends up at exactly 0.
    pub fn apply_water_features(
        &self,
        heightmap: &mut Tilemap<f32>,
        params: &WaterParams,
        rng: &mut ChaCha8Rng,
    ) -> Result<Tilemap<bool>> {
        params.validate()?;
        heightmap.ensure_size("heightmap", self.width, self.height)?;

        let mut water = Tilemap::new_with(self.width, self.height, false);
        if params.river_enabled {
            let river = self.generate_river(heightmap, params.river_start, params.meander, params.river_width, rng)?;
            merge_mask(&mut water, &river);
        }
        if params.lake_enabled {
            let lake = self.generate_lake(heightmap, params.lake_size_factor)?;
            merge_mask(&mut water, &lake);
        }

        lower_under_water(heightmap, &water);

        info!(
            water_cells = water.count(|&w| w),
            "water features carved"
        );
        Ok(water)
    }
}

impl WaterFeatures for WaterGenerator {
    fn apply(&self, heightmap: &mut Tilemap<f32>, params: &WaterParams, rng: &mut ChaCha8Rng) -> Result<Tilemap<bool>> {
        self.apply_water_features(heightmap, params, rng)
    }
}

fn merge_mask(into: &mut Tilemap<bool>, other: &Tilemap<bool>) {
    for (x, y, w) in into.iter_mut() {
        *w |= *other.get(x, y);
    }
}

/// Pin water cells near the terrain minimum.
pub fn lower_under_water(heightmap: &mut Tilemap<f32>, water: &Tilemap<bool>) {
    let (min_h, _) = heightmap.min_max();
    let level = min_h * WATER_LEVEL_FACTOR;
    for (x, y, h) in heightmap.iter_mut() {
        if *water.get(x, y) {
            *h = h.min(level);
        }
    }
}

// =============================================================================
// GAUSSIAN BLUR
// =============================================================================

/// Separable Gaussian blur with mirrored edges (`d c b a | a b c d`).
pub fn gaussian_blur(map: &Tilemap<f32>, sigma: f32) -> Tilemap<f32> {
    let radius = (BLUR_TRUNCATE * sigma + 0.5) as i64;
    let kernel: Vec<f32> = {
        let raw: Vec<f32> = (-radius..=radius)
            .map(|i| (-0.5 * (i * i) as f32 / (sigma * sigma)).exp())
            .collect();
        let sum: f32 = raw.iter().sum();
        raw.into_iter().map(|w| w / sum).collect()
    };

    let width = map.width;
    let height = map.height;
    let mut horizontal = Tilemap::new_with(width, height, 0.0f32);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let sx = reflect_index(x as i64 + k as i64 - radius, width);
                acc += *map.get(sx, y) * w;
            }
            horizontal.set(x, y, acc);
        }
    }

    let mut result = Tilemap::new_with(width, height, 0.0f32);
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let sy = reflect_index(y as i64 + k as i64 - radius, height);
                acc += *horizontal.get(x, sy) * w;
            }
            result.set(x, y, acc);
        }
    }
    result
}

/// Mirror an index into `0..n`, repeating for kernels wider than the grid.
fn reflect_index(mut i: i64, n: usize) -> usize {
    let n = n as i64;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}
