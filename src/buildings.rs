//! Building footprint placement
//!
//! A single row-major scan packs footprints greedily: the first clear
//! footprint found wins, so buildings fill the map left to right, top to
//! bottom.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::roads::RoadNetwork;
use crate::tilemap::Tilemap;
use crate::zoning::{ZoneType, Zoning};

/// Cells at or above this elevation are too high to build on.
pub const MAX_BUILDABLE_ELEVATION: f32 = 0.7;

/// Type of building
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    Residential,
    Commercial,
    Industrial,
}

impl BuildingType {
    /// Building type hosted by a zone, if any.
    ///
    /// All residential densities share one footprint. Mixed-use and unzoned
    /// cells get no building.
    pub fn for_zone(zone: ZoneType) -> Option<BuildingType> {
        match zone {
            ZoneType::LowRes | ZoneType::MedRes | ZoneType::HighRes => Some(BuildingType::Residential),
            ZoneType::Commercial => Some(BuildingType::Commercial),
            ZoneType::Industrial => Some(BuildingType::Industrial),
            ZoneType::Unzoned | ZoneType::MixedUse => None,
        }
    }

    /// Square footprint side in cells
    pub fn footprint(&self) -> usize {
        match self {
            BuildingType::Residential => 2,
            BuildingType::Commercial => 3,
            BuildingType::Industrial => 4,
        }
    }

    /// Value written to the building map
    pub fn map_id(&self) -> u8 {
        match self {
            BuildingType::Residential => 1,
            BuildingType::Commercial => 2,
            BuildingType::Industrial => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BuildingType::Residential => "Residential",
            BuildingType::Commercial => "Commercial",
            BuildingType::Industrial => "Industrial",
        }
    }
}

/// An axis-aligned building footprint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub building_type: BuildingType,
}

impl Building {
    /// Bounding-box overlap with another rectangle
    pub fn overlaps(&self, x: usize, y: usize, width: usize, height: usize) -> bool {
        x < self.x + self.width && x + width > self.x && y < self.y + self.height && y + height > self.y
    }
}

pub struct BuildingPlacer {
    width: usize,
    height: usize,
    buildings: Vec<Building>,
}

impl BuildingPlacer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buildings: Vec::new(),
        }
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn into_buildings(self) -> Vec<Building> {
        self.buildings
    }

    pub fn place_building(&mut self, x: usize, y: usize, width: usize, height: usize, building_type: BuildingType) {
        self.buildings.push(Building {
            x,
            y,
            width,
            height,
            building_type,
        });
    }

    /// No water under the footprint and no overlap with a placed building.
    pub fn is_area_clear(&self, x: usize, y: usize, width: usize, height: usize, water: &Tilemap<bool>) -> bool {
        if water.any_in_rect(x as i64, y as i64, width, height, |&w| w) {
            return false;
        }
        !self.buildings.iter().any(|b| b.overlaps(x, y, width, height))
    }

    /// Scan every cell once and drop the zone's footprint where it fits.
    ///
    /// A footprint must lie entirely inside the grid. Origins whose square
    /// would run past the right or bottom edge are skipped rather than
    /// clipped, so every recorded `Building` covers exactly its own cells
    /// and the last one to three rows and columns may stay empty.
    pub fn place_buildings_in_zones(
        &mut self,
        zoning: &Zoning,
        roads: &RoadNetwork,
        heightmap: &Tilemap<f32>,
        water: &Tilemap<bool>,
    ) -> Result<&[Building]> {
        zoning.zones.ensure_size("zoning", self.width, self.height)?;
        roads.roads.ensure_size("roads", self.width, self.height)?;
        heightmap.ensure_size("heightmap", self.width, self.height)?;
        water.ensure_size("water", self.width, self.height)?;

        let before = self.buildings.len();

        for y in 0..self.height {
            for x in 0..self.width {
                if roads.has_road(x as i64, y as i64) || *water.get(x, y) {
                    continue;
                }
                if *heightmap.get(x, y) >= MAX_BUILDABLE_ELEVATION {
                    continue;
                }
                let Some(kind) = BuildingType::for_zone(*zoning.zones.get(x, y)) else {
                    continue;
                };

                let side = kind.footprint();
                if x + side > self.width || y + side > self.height {
                    continue;
                }
                if self.is_area_clear(x, y, side, side, water) {
                    self.place_building(x, y, side, side, kind);
                }
            }
        }

        info!(
            placed = self.buildings.len() - before,
            total = self.buildings.len(),
            "buildings placed"
        );
        Ok(&self.buildings)
    }

    /// Rasterize every placed building into a fresh map (0 = no building).
    pub fn get_building_map(&self) -> Tilemap<u8> {
        let mut map = Tilemap::new_with(self.width, self.height, 0u8);
        for b in &self.buildings {
            map.fill_rect(b.x as i64, b.y as i64, b.width, b.height, b.building_type.map_id());
        }
        map
    }

    pub fn count_by_type(&self, building_type: BuildingType) -> usize {
        self.buildings.iter().filter(|b| b.building_type == building_type).count()
    }
}
