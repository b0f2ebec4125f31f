//! Organic road growth
//!
//! Roads grow outward from random seed cells with a depth-first stack walk,
//! spreading only across dry land whose slope between neighbouring cells is
//! gentle enough. LIFO order makes each seed produce winding, directionally
//! biased streets rather than a uniform flood.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CityGenError, Result};
use crate::tilemap::Tilemap;

/// Growth directions, pushed in this order (so popped in reverse).
const GROWTH_OFFSETS: [(i64, i64); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Parameters for road network growth
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadParams {
    /// Number of primary seeds (each grows main roads)
    pub num_seeds: usize,
    /// Total road cell budget shared evenly by the primary seeds
    pub max_roads: usize,
    /// Largest elevation step a road may climb between neighbours
    pub max_slope: f32,
    /// Seeds that grow ordinary (non-main) side streets after the main roads
    pub secondary_seeds: usize,
    /// Total budget shared by the secondary seeds
    pub secondary_max_roads: usize,
}

impl Default for RoadParams {
    fn default() -> Self {
        Self {
            num_seeds: 5,
            max_roads: 1000,
            max_slope: 0.1,
            secondary_seeds: 0,
            secondary_max_roads: 0,
        }
    }
}

impl RoadParams {
    pub fn validate(&self) -> Result<()> {
        if self.num_seeds == 0 {
            return Err(CityGenError::invalid("num_seeds", "at least one seed is required"));
        }
        if !(self.max_slope >= 0.0) {
            return Err(CityGenError::invalid("max_slope", format!("{} must be non-negative", self.max_slope)));
        }
        Ok(())
    }
}

/// Road cells of the city, with main roads tracked separately.
///
/// Invariant: every main road cell is also a road cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadNetwork {
    pub width: usize,
    pub height: usize,
    pub roads: Tilemap<bool>,
    pub main_roads: Tilemap<bool>,
}

impl RoadNetwork {
    pub fn new(width: usize, height: usize) -> Self {
        RoadNetwork {
            width,
            height,
            roads: Tilemap::new_with(width, height, false),
            main_roads: Tilemap::new_with(width, height, false),
        }
    }

    /// Mark a road cell. Out-of-bounds cells are an error.
    pub fn add_road(&mut self, x: i64, y: i64, is_main: bool) -> Result<()> {
        self.roads.set_checked(x, y, true)?;
        if is_main {
            self.main_roads.set_checked(x, y, true)?;
        }
        Ok(())
    }

    /// Check if there's a road at a coordinate (false outside the grid)
    pub fn has_road(&self, x: i64, y: i64) -> bool {
        self.roads.get_checked(x, y).copied().unwrap_or(false)
    }

    pub fn has_main_road(&self, x: i64, y: i64) -> bool {
        self.main_roads.get_checked(x, y).copied().unwrap_or(false)
    }

    pub fn road_count(&self) -> usize {
        self.roads.count(|&r| r)
    }

    pub fn main_road_count(&self) -> usize {
        self.main_roads.count(|&r| r)
    }

    /// Grow the whole network: main roads from `num_seeds` random cells, then
    /// optional secondary streets.
    pub fn generate_organic_network(
        &mut self,
        heightmap: &Tilemap<f32>,
        water: &Tilemap<bool>,
        params: &RoadParams,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        params.validate()?;
        if self.width == 0 || self.height == 0 {
            return Err(CityGenError::InvalidDimensions { width: self.width, height: self.height });
        }
        heightmap.ensure_size("heightmap", self.width, self.height)?;
        water.ensure_size("water", self.width, self.height)?;

        self.grow_from_random_seeds(heightmap, water, params.num_seeds, params.max_roads, params.max_slope, true, rng)?;
        if params.secondary_seeds > 0 {
            self.grow_from_random_seeds(
                heightmap,
                water,
                params.secondary_seeds,
                params.secondary_max_roads,
                params.max_slope,
                false,
                rng,
            )?;
        }

        info!(
            roads = self.road_count(),
            main_roads = self.main_road_count(),
            "road network grown"
        );
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn grow_from_random_seeds(
        &mut self,
        heightmap: &Tilemap<f32>,
        water: &Tilemap<bool>,
        seeds: usize,
        budget: usize,
        max_slope: f32,
        is_main: bool,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        let per_seed = budget / seeds;
        let seed_cells: Vec<(usize, usize)> = (0..seeds)
            .map(|_| (rng.gen_range(0..self.width), rng.gen_range(0..self.height)))
            .collect();

        for seed in seed_cells {
            let added = self.grow_road_from_seed(seed, heightmap, water, per_seed, max_slope, is_main)?;
            debug!(x = seed.0, y = seed.1, added, is_main, "road seed grown");
        }
        Ok(())
    }

    /// Depth-first growth from one seed, adding at most `max_roads` cells.
    ///
    /// Cells that are already road stop the walk, which is how regions grown
    /// from different seeds merge. Returns the number of cells added.
    /// A seed outside the grid is an `OutOfBounds` error.
    pub fn grow_road_from_seed(
        &mut self,
        seed: (usize, usize),
        heightmap: &Tilemap<f32>,
        water: &Tilemap<bool>,
        max_roads: usize,
        max_slope: f32,
        is_main: bool,
    ) -> Result<usize> {
        heightmap.ensure_size("heightmap", self.width, self.height)?;
        water.ensure_size("water", self.width, self.height)?;
        if seed.0 >= self.width || seed.1 >= self.height {
            return Err(CityGenError::OutOfBounds {
                x: seed.0 as i64,
                y: seed.1 as i64,
                width: self.width,
                height: self.height,
            });
        }

        let mut stack = vec![seed];
        let mut roads_added = 0;

        while roads_added < max_roads {
            let Some((x, y)) = stack.pop() else {
                break;
            };
            if self.has_road(x as i64, y as i64) || *water.get(x, y) {
                continue;
            }

            self.add_road(x as i64, y as i64, is_main)?;
            roads_added += 1;

            let here = *heightmap.get(x, y);
            for (dx, dy) in GROWTH_OFFSETS {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if !self.roads.in_bounds(nx, ny) {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if !*water.get(nx, ny) && (heightmap.get(nx, ny) - here).abs() <= max_slope {
                    stack.push((nx, ny));
                }
            }
        }

        Ok(roads_added)
    }
}
