//! Parks and landmarks
//!
//! Both are square stamps placed by rejection sampling with a fixed attempt
//! budget per item. Running out of attempts is routine on crowded maps and
//! simply drops that item.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CityGenError, Result};
use crate::roads::RoadNetwork;
use crate::tilemap::Tilemap;
use crate::zoning::{ZoneType, Zoning};

/// Random positions tried per park or landmark before giving up on it.
pub const PLACEMENT_ATTEMPTS: usize = 100;

/// A landmark needs a road within this many cells of its square.
const LANDMARK_ROAD_MARGIN: usize = 2;

/// Parameters for park and landmark placement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    pub num_parks: usize,
    /// Smallest park side (inclusive)
    pub park_min_size: usize,
    /// Largest park side (exclusive)
    pub park_max_size: usize,
    pub num_landmarks: usize,
    pub landmark_size: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            num_parks: 5,
            park_min_size: 10,
            park_max_size: 30,
            num_landmarks: 3,
            landmark_size: 5,
        }
    }
}

impl FeatureParams {
    pub fn validate(&self) -> Result<()> {
        if self.park_min_size == 0 {
            return Err(CityGenError::invalid("park_min_size", "must be at least 1"));
        }
        if self.park_min_size >= self.park_max_size {
            return Err(CityGenError::invalid(
                "park_max_size",
                format!("{} must exceed park_min_size {}", self.park_max_size, self.park_min_size),
            ));
        }
        if self.landmark_size == 0 {
            return Err(CityGenError::invalid("landmark_size", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParksAndLandmarks {
    pub width: usize,
    pub height: usize,
    pub parks: Tilemap<bool>,
    pub landmarks: Tilemap<bool>,
}

impl ParksAndLandmarks {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            parks: Tilemap::new_with(width, height, false),
            landmarks: Tilemap::new_with(width, height, false),
        }
    }

    /// Place up to `count` parks, each a square with side in `[min_size, max_size)`.
    ///
    /// Park cells are unzoned afterwards. Returns how many were placed.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_parks(
        &mut self,
        zoning: &mut Zoning,
        water: &Tilemap<bool>,
        roads: &RoadNetwork,
        count: usize,
        min_size: usize,
        max_size: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<usize> {
        if min_size == 0 || min_size >= max_size {
            return Err(CityGenError::invalid(
                "park_size",
                format!("need 1 <= min < max, got {}..{}", min_size, max_size),
            ));
        }

        self.check_inputs(zoning, water, roads)?;

        let mut placed = 0;
        for item in 0..count {
            let size = rng.gen_range(min_size..max_size);
            let found = self.try_place(size, rng, |x, y| self.can_place_park(x, y, size, zoning, water, roads));
            match found {
                Some((x, y)) => {
                    self.parks.fill_rect(x as i64, y as i64, size, size, true);
                    zoning.zones.fill_rect(x as i64, y as i64, size, size, ZoneType::Unzoned);
                    placed += 1;
                }
                None => debug!(item, size, "no free square for park, skipping"),
            }
        }

        info!(placed, requested = count, "parks placed");
        Ok(placed)
    }

    /// Place up to `count` landmarks of side `size`, each next to a road.
    ///
    /// Landmark cells are rezoned to the commercial code.
    pub fn generate_landmarks(
        &mut self,
        zoning: &mut Zoning,
        water: &Tilemap<bool>,
        roads: &RoadNetwork,
        count: usize,
        size: usize,
        rng: &mut ChaCha8Rng,
    ) -> Result<usize> {
        if size == 0 {
            return Err(CityGenError::invalid("landmark_size", "must be at least 1"));
        }

        self.check_inputs(zoning, water, roads)?;

        let mut placed = 0;
        for item in 0..count {
            let found = self.try_place(size, rng, |x, y| self.can_place_landmark(x, y, size, zoning, water, roads));
            match found {
                Some((x, y)) => {
                    self.landmarks.fill_rect(x as i64, y as i64, size, size, true);
                    zoning.zones.fill_rect(x as i64, y as i64, size, size, ZoneType::Commercial);
                    placed += 1;
                }
                None => debug!(item, size, "no square near a road for landmark, skipping"),
            }
        }

        info!(placed, requested = count, "landmarks placed");
        Ok(placed)
    }

    fn check_inputs(&self, zoning: &Zoning, water: &Tilemap<bool>, roads: &RoadNetwork) -> Result<()> {
        zoning.zones.ensure_size("zoning", self.width, self.height)?;
        water.ensure_size("water", self.width, self.height)?;
        roads.roads.ensure_size("roads", self.width, self.height)
    }

    /// Draw up to `PLACEMENT_ATTEMPTS` origins in `[0, width-size) x [0, height-size)`.
    fn try_place(
        &self,
        size: usize,
        rng: &mut ChaCha8Rng,
        accept: impl Fn(usize, usize) -> bool,
    ) -> Option<(usize, usize)> {
        if size >= self.width || size >= self.height {
            return None;
        }
        (0..PLACEMENT_ATTEMPTS).find_map(|_| {
            let x = rng.gen_range(0..self.width - size);
            let y = rng.gen_range(0..self.height - size);
            accept(x, y).then_some((x, y))
        })
    }

    /// No water, no road, and every cell zoned (so no park or landmark yet).
    pub fn can_place_park(
        &self,
        x: usize,
        y: usize,
        size: usize,
        zoning: &Zoning,
        water: &Tilemap<bool>,
        roads: &RoadNetwork,
    ) -> bool {
        let (x, y) = (x as i64, y as i64);
        !water.any_in_rect(x, y, size, size, |&w| w)
            && !roads.roads.any_in_rect(x, y, size, size, |&r| r)
            && zoning.zones.all_in_rect(x, y, size, size, |z| z.is_zoned())
    }

    /// Park rules plus a road somewhere within the margin around the square.
    pub fn can_place_landmark(
        &self,
        x: usize,
        y: usize,
        size: usize,
        zoning: &Zoning,
        water: &Tilemap<bool>,
        roads: &RoadNetwork,
    ) -> bool {
        let grown = size + 2 * LANDMARK_ROAD_MARGIN;
        let (gx, gy) = (x as i64 - LANDMARK_ROAD_MARGIN as i64, y as i64 - LANDMARK_ROAD_MARGIN as i64);
        self.can_place_park(x, y, size, zoning, water, roads)
            && roads.roads.any_in_rect(gx, gy, grown, grown, |&r| r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn open_city(width: usize, height: usize) -> (Zoning, Tilemap<bool>, RoadNetwork) {
        let mut zoning = Zoning::new(width, height);
        zoning.zones.fill(ZoneType::LowRes);
        (zoning, Tilemap::new_with(width, height, false), RoadNetwork::new(width, height))
    }

    #[test]
    fn test_parks_unzone_their_cells() {
        let (mut zoning, water, roads) = open_city(60, 60);
        let mut features = ParksAndLandmarks::new(60, 60);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let placed = features
            .generate_parks(&mut zoning, &water, &roads, 2, 5, 8, &mut rng)
            .unwrap();

        assert!(placed >= 1);
        for (x, y, &park) in features.parks.iter() {
            if park {
                assert_eq!(*zoning.zones.get(x, y), ZoneType::Unzoned);
            }
        }
    }

    #[test]
    fn test_park_rejected_over_water_or_road() {
        let (zoning, mut water, mut roads) = open_city(20, 20);
        let features = ParksAndLandmarks::new(20, 20);
        assert!(features.can_place_park(2, 2, 5, &zoning, &water, &roads));

        water.set(4, 4, true);
        assert!(!features.can_place_park(2, 2, 5, &zoning, &water, &roads));
        assert!(features.can_place_park(10, 10, 5, &zoning, &water, &roads));

        roads.add_road(12, 12, true).unwrap();
        assert!(!features.can_place_park(10, 10, 5, &zoning, &water, &roads));
    }

    #[test]
    fn test_landmark_needs_nearby_road() {
        let (zoning, water, mut roads) = open_city(20, 20);
        let features = ParksAndLandmarks::new(20, 20);
        assert!(!features.can_place_landmark(5, 5, 3, &zoning, &water, &roads));

        // two cells right of the square's last column (x = 7)
        roads.add_road(9, 6, true).unwrap();
        assert!(features.can_place_landmark(5, 5, 3, &zoning, &water, &roads));

        let (zoning, water, mut far_roads) = open_city(20, 20);
        far_roads.add_road(10, 6, true).unwrap();
        assert!(!features.can_place_landmark(5, 5, 3, &zoning, &water, &far_roads));
    }

    #[test]
    fn test_landmark_cannot_cover_park() {
        let (mut zoning, water, mut roads) = open_city(20, 20);
        for x in 0..20 {
            roads.add_road(x, 0, true).unwrap();
        }
        zoning.zones.fill_rect(0, 1, 20, 19, ZoneType::Unzoned);
        let mut features = ParksAndLandmarks::new(20, 20);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let placed = features
            .generate_landmarks(&mut zoning, &water, &roads, 3, 4, &mut rng)
            .unwrap();
        assert_eq!(placed, 0);
        assert_eq!(features.landmarks.count(|&l| l), 0);
    }

    #[test]
    fn test_landmarks_are_rezoned_commercial() {
        let (mut zoning, water, mut roads) = open_city(30, 30);
        for y in 0..30 {
            roads.add_road(15, y, true).unwrap();
        }
        let mut features = ParksAndLandmarks::new(30, 30);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let placed = features
            .generate_landmarks(&mut zoning, &water, &roads, 2, 3, &mut rng)
            .unwrap();
        assert!(placed >= 1);
        for (x, y, &l) in features.landmarks.iter() {
            if l {
                assert_eq!(*zoning.zones.get(x, y), ZoneType::Commercial);
                assert!(!*features.parks.get(x, y));
            }
        }
    }

    #[test]
    fn test_mismatched_grids_are_rejected() {
        let (mut zoning, water, _) = open_city(20, 20);
        let mut features = ParksAndLandmarks::new(20, 20);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let roads = RoadNetwork::new(12, 12);
        assert!(matches!(
            features.generate_parks(&mut zoning, &water, &roads, 1, 3, 5, &mut rng),
            Err(CityGenError::InvalidParameter { name: "roads", .. })
        ));
        assert!(features.generate_landmarks(&mut zoning, &water, &roads, 1, 3, &mut rng).is_err());
    }

    #[test]
    fn test_oversized_items_are_skipped() {
        let (mut zoning, water, roads) = open_city(8, 8);
        let mut features = ParksAndLandmarks::new(8, 8);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let placed = features
            .generate_parks(&mut zoning, &water, &roads, 3, 8, 12, &mut rng)
            .unwrap();
        assert_eq!(placed, 0);
        assert!(features.generate_parks(&mut zoning, &water, &roads, 1, 5, 5, &mut rng).is_err());
    }
}
