//! Pipeline driver
//!
//! Runs heightmap → water → roads → zoning → parks/landmarks → buildings in
//! that order. Every grid lives in one `GenerationContext` that is passed
//! explicitly through the stages and finally turned into `CityData`.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::buildings::{Building, BuildingPlacer, BuildingType};
use crate::config::CityConfig;
use crate::error::Result;
use crate::features::ParksAndLandmarks;
use crate::heightmap::generate_heightmap;
use crate::roads::RoadNetwork;
use crate::seeds::CitySeeds;
use crate::tilemap::Tilemap;
use crate::water::{WaterFeatures, WaterGenerator};
use crate::zoning::{zone_distribution, ZoneType, Zoning};

/// Every grid produced during one generation run.
pub struct GenerationContext {
    pub seeds: CitySeeds,
    pub heightmap: Tilemap<f32>,
    pub water: Tilemap<bool>,
    pub roads: RoadNetwork,
    pub zoning: Zoning,
    pub features: ParksAndLandmarks,
    pub placer: BuildingPlacer,
}

impl GenerationContext {
    fn new(width: usize, height: usize, seeds: CitySeeds) -> Self {
        Self {
            seeds,
            heightmap: Tilemap::new_with(width, height, 0.0),
            water: Tilemap::new_with(width, height, false),
            roads: RoadNetwork::new(width, height),
            zoning: Zoning::new(width, height),
            features: ParksAndLandmarks::new(width, height),
            placer: BuildingPlacer::new(width, height),
        }
    }

    /// Assemble the output aggregate, rasterizing the building list.
    pub fn into_city_data(self, width: usize, height: usize) -> CityData {
        let building_map = self.placer.get_building_map();
        CityData {
            width,
            height,
            seed: self.seeds.master,
            heightmap: self.heightmap,
            water_map: self.water,
            zoning: self.zoning.zones,
            roads: self.roads.roads,
            main_roads: self.roads.main_roads,
            building_map,
            buildings: self.placer.into_buildings(),
            parks: self.features.parks,
            landmarks: self.features.landmarks,
        }
    }
}

/// The finished city, handed to renderers and exporters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityData {
    pub width: usize,
    pub height: usize,
    pub seed: u64,
    pub heightmap: Tilemap<f32>,
    pub water_map: Tilemap<bool>,
    pub zoning: Tilemap<ZoneType>,
    pub roads: Tilemap<bool>,
    pub main_roads: Tilemap<bool>,
    /// 0 = none, 1 = residential, 2 = commercial, 3 = industrial
    pub building_map: Tilemap<u8>,
    pub buildings: Vec<Building>,
    pub parks: Tilemap<bool>,
    pub landmarks: Tilemap<bool>,
}

/// Generate a city with the standard river-and-lake water stage.
pub fn generate_city(config: &CityConfig) -> Result<CityData> {
    let water = WaterGenerator::new(config.width, config.height);
    generate_city_with(config, &water)
}

/// Generate a city using a caller-supplied water stage.
pub fn generate_city_with(config: &CityConfig, water_stage: &dyn WaterFeatures) -> Result<CityData> {
    config.validate()?;

    let master = config.seed.unwrap_or_else(rand::random);
    let seeds = CitySeeds::from_master(master);
    debug!(%seeds, "derived stage seeds");

    let mut ctx = GenerationContext::new(config.width, config.height, seeds);
    run_stages(&mut ctx, config, water_stage)?;

    let city = ctx.into_city_data(config.width, config.height);
    info!(
        width = city.width,
        height = city.height,
        seed = city.seed,
        buildings = city.buildings.len(),
        "city generated"
    );
    Ok(city)
}

fn run_stages(ctx: &mut GenerationContext, config: &CityConfig, water_stage: &dyn WaterFeatures) -> Result<()> {
    ctx.heightmap = generate_heightmap(config.width, config.height, &config.terrain, ctx.seeds.heightmap)?;
    info!(octaves = config.terrain.octaves, scale = config.terrain.scale, "heightmap generated");

    let mut water_rng = ChaCha8Rng::seed_from_u64(ctx.seeds.water);
    ctx.water = water_stage.apply(&mut ctx.heightmap, &config.water, &mut water_rng)?;

    let mut road_rng = ChaCha8Rng::seed_from_u64(ctx.seeds.roads);
    ctx.roads
        .generate_organic_network(&ctx.heightmap, &ctx.water, &config.roads, &mut road_rng)?;

    ctx.zoning
        .generate_sophisticated_zoning(&ctx.water, &ctx.roads, config.zoning.city_center)?;

    let features = &config.features;
    let mut feature_rng = ChaCha8Rng::seed_from_u64(ctx.seeds.features);
    ctx.features.generate_parks(
        &mut ctx.zoning,
        &ctx.water,
        &ctx.roads,
        features.num_parks,
        features.park_min_size,
        features.park_max_size,
        &mut feature_rng,
    )?;
    ctx.features.generate_landmarks(
        &mut ctx.zoning,
        &ctx.water,
        &ctx.roads,
        features.num_landmarks,
        features.landmark_size,
        &mut feature_rng,
    )?;

    ctx.placer
        .place_buildings_in_zones(&ctx.zoning, &ctx.roads, &ctx.heightmap, &ctx.water)?;
    Ok(())
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Coverage summary of a generated city
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CityStats {
    pub water_pct: f64,
    pub road_pct: f64,
    pub main_road_pct: f64,
    pub building_pct: f64,
    pub park_pct: f64,
    pub landmark_tiles: usize,
    pub residential_buildings: usize,
    pub commercial_buildings: usize,
    pub industrial_buildings: usize,
    /// Cell count per zone, in code order
    pub zone_counts: [(ZoneType, usize); 7],
}

impl From<&CityData> for CityStats {
    fn from(city: &CityData) -> Self {
        let cells = (city.width * city.height).max(1) as f64;
        let pct = |n: usize| 100.0 * n as f64 / cells;
        let buildings_of = |t: BuildingType| city.buildings.iter().filter(|b| b.building_type == t).count();

        CityStats {
            water_pct: pct(city.water_map.count(|&w| w)),
            road_pct: pct(city.roads.count(|&r| r)),
            main_road_pct: pct(city.main_roads.count(|&r| r)),
            building_pct: pct(city.building_map.count(|&b| b > 0)),
            park_pct: pct(city.parks.count(|&p| p)),
            landmark_tiles: city.landmarks.count(|&l| l),
            residential_buildings: buildings_of(BuildingType::Residential),
            commercial_buildings: buildings_of(BuildingType::Commercial),
            industrial_buildings: buildings_of(BuildingType::Industrial),
            zone_counts: zone_distribution(&city.zoning),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightmap::TerrainParams;
    use crate::roads::RoadParams;
    use crate::water::WaterParams;

    /// Water stage that leaves the terrain dry.
    struct DryLand;

    impl WaterFeatures for DryLand {
        fn apply(&self, heightmap: &mut Tilemap<f32>, _params: &WaterParams, _rng: &mut ChaCha8Rng) -> Result<Tilemap<bool>> {
            Ok(Tilemap::new_with(heightmap.width, heightmap.height, false))
        }
    }

    fn small_config() -> CityConfig {
        let mut config = CityConfig::with_size(48, 48);
        config.seed = Some(2024);
        config.terrain.scale = 20.0;
        config.roads = RoadParams {
            num_seeds: 3,
            max_roads: 300,
            max_slope: 0.2,
            ..RoadParams::default()
        };
        config.features.num_parks = 2;
        config.features.park_min_size = 4;
        config.features.park_max_size = 7;
        config.features.num_landmarks = 2;
        config.features.landmark_size = 3;
        config
    }

    fn tiny_dry_config(seed: u64) -> CityConfig {
        // 16x16, one octave, one road seed with 50 cells
        CityConfig {
            width: 16,
            height: 16,
            seed: Some(seed),
            terrain: TerrainParams { octaves: 1, ..TerrainParams::default() },
            roads: RoadParams { num_seeds: 1, max_roads: 50, ..RoadParams::default() },
            ..CityConfig::default()
        }
    }

    #[test]
    fn test_small_dry_city_scenario() {
        for seed in 0..20 {
            let mut config = tiny_dry_config(seed);
            config.features.num_parks = 0;
            let city = generate_city_with(&config, &DryLand).unwrap();

            assert!(city.roads.count(|&r| r) <= 50, "seed {}", seed);
            for (x, y, &zone) in city.zoning.iter() {
                assert_eq!(
                    zone == ZoneType::Unzoned,
                    *city.roads.get(x, y),
                    "seed {} cell ({}, {})",
                    seed,
                    x,
                    y
                );
            }
            assert!(!city.buildings.is_empty(), "seed {} has no buildings", seed);
        }
    }

    #[test]
    fn test_parks_are_the_only_unzoned_land() {
        for seed in 0..20 {
            let city = generate_city_with(&tiny_dry_config(seed), &DryLand).unwrap();
            for (x, y, &zone) in city.zoning.iter() {
                if zone == ZoneType::Unzoned {
                    assert!(*city.roads.get(x, y) || *city.parks.get(x, y), "seed {} cell ({}, {})", seed, x, y);
                }
            }
        }
    }

    #[test]
    fn test_full_pipeline_invariants() {
        let city = generate_city(&small_config()).unwrap();
        assert_eq!(city.seed, 2024);

        for (x, y, &h) in city.heightmap.iter() {
            assert!(h <= 1.0);
            if *city.water_map.get(x, y) {
                assert_eq!(h, 0.0);
                assert_eq!(*city.zoning.get(x, y), ZoneType::Unzoned);
            }
            if *city.main_roads.get(x, y) {
                assert!(*city.roads.get(x, y));
            }
            if *city.roads.get(x, y) {
                assert_eq!(*city.zoning.get(x, y), ZoneType::Unzoned);
                assert!(!*city.water_map.get(x, y));
            }
            assert!(!(*city.parks.get(x, y) && *city.landmarks.get(x, y)));
        }

        for b in &city.buildings {
            assert!(!*city.water_map.get(b.x, b.y));
            assert!(!*city.roads.get(b.x, b.y));
            assert!(b.x + b.width <= city.width && b.y + b.height <= city.height);
        }
    }

    #[test]
    fn test_same_seed_same_city() {
        let a = generate_city(&small_config()).unwrap();
        let b = generate_city(&small_config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_aborts() {
        let mut config = small_config();
        config.terrain.scale = 0.0;
        assert!(generate_city(&config).is_err());
    }

    #[test]
    fn test_stats_percentages() {
        let city = generate_city(&small_config()).unwrap();
        let stats = CityStats::from(&city);
        assert!((0.0..=100.0).contains(&stats.road_pct));
        assert!(stats.main_road_pct <= stats.road_pct);
        assert_eq!(stats.zone_counts.iter().map(|(_, n)| n).sum::<usize>(), 48 * 48);
        assert_eq!(stats.zone_counts[0].0, ZoneType::Unzoned);
        assert_eq!(
            stats.residential_buildings + stats.commercial_buildings + stats.industrial_buildings,
            city.buildings.len()
        );
    }
}
