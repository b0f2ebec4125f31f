//! Land-use zoning
//!
//! Zones are assigned in rings around the city centre (mixed use, dense and
//! medium residential), commercial strips along roads and industry on the
//! outskirts, then smoothed with a majority filter.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CityGenError, Result};
use crate::roads::RoadNetwork;
use crate::tilemap::Tilemap;

/// Land-use class of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum ZoneType {
    /// Water, road or park: nothing may be built
    #[default]
    Unzoned = 0,
    LowRes = 1,
    MedRes = 2,
    HighRes = 3,
    /// Shops along roads; landmark squares are also stamped with this code
    Commercial = 4,
    Industrial = 5,
    MixedUse = 6,
}

impl ZoneType {
    pub const ALL: [ZoneType; 7] = [
        ZoneType::Unzoned,
        ZoneType::LowRes,
        ZoneType::MedRes,
        ZoneType::HighRes,
        ZoneType::Commercial,
        ZoneType::Industrial,
        ZoneType::MixedUse,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn is_zoned(self) -> bool {
        self != ZoneType::Unzoned
    }

    pub fn is_residential(self) -> bool {
        matches!(self, ZoneType::LowRes | ZoneType::MedRes | ZoneType::HighRes)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ZoneType::Unzoned => "Unzoned",
            ZoneType::LowRes => "Low-density residential",
            ZoneType::MedRes => "Medium-density residential",
            ZoneType::HighRes => "High-density residential",
            ZoneType::Commercial => "Commercial",
            ZoneType::Industrial => "Industrial",
            ZoneType::MixedUse => "Mixed use",
        }
    }
}

impl From<ZoneType> for u8 {
    fn from(zone: ZoneType) -> u8 {
        zone.code()
    }
}

impl TryFrom<u8> for ZoneType {
    type Error = CityGenError;

    fn try_from(code: u8) -> Result<Self> {
        ZoneType::from_code(code).ok_or_else(|| CityGenError::invalid("zone", format!("unknown zone code {}", code)))
    }
}

// Ring radii as fractions of the largest centre distance on the grid.
const MIXED_USE_RADIUS: f32 = 0.1;
const HIGH_RES_RADIUS: f32 = 0.2;
const MED_RES_RADIUS: f32 = 0.4;
const INDUSTRIAL_RADIUS: f32 = 0.7;

/// Cells strictly closer than this to a road become commercial.
const COMMERCIAL_ROAD_DISTANCE: f32 = 3.0;

/// Passes of the majority filter.
pub const SMOOTHING_ITERATIONS: usize = 2;

/// Parameters for zoning
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoningParams {
    /// City centre (defaults to the grid centre)
    pub city_center: Option<(usize, usize)>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Zoning {
    pub width: usize,
    pub height: usize,
    pub zones: Tilemap<ZoneType>,
}

impl Zoning {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            zones: Tilemap::new(width, height),
        }
    }

    pub fn set_zone(&mut self, x: i64, y: i64, zone: ZoneType) -> Result<()> {
        self.zones.set_checked(x, y, zone)
    }

    /// Zone at a cell, `None` outside the grid.
    pub fn get_zone(&self, x: i64, y: i64) -> Option<ZoneType> {
        self.zones.get_checked(x, y).copied()
    }

    /// Assign zones from centre distance and road proximity, then smooth.
    ///
    /// Later rules override earlier ones; road cells always end up unzoned.
    pub fn generate_sophisticated_zoning(
        &mut self,
        water: &Tilemap<bool>,
        roads: &RoadNetwork,
        city_center: Option<(usize, usize)>,
    ) -> Result<()> {
        let (cx, cy) = city_center.unwrap_or((self.width / 2, self.height / 2));
        if cx >= self.width || cy >= self.height {
            return Err(CityGenError::OutOfBounds {
                x: cx as i64,
                y: cy as i64,
                width: self.width,
                height: self.height,
            });
        }

        water.ensure_size("water", self.width, self.height)?;
        roads.roads.ensure_size("roads", self.width, self.height)?;

        self.zones.fill(ZoneType::LowRes);
        for (x, y, &w) in water.iter() {
            if w {
                self.zones.set(x, y, ZoneType::Unzoned);
            }
        }

        let center_dist = distance_from_point(self.width, self.height, cx, cy);
        let (_, max_dist) = center_dist.min_max();

        for (x, y, zone) in self.zones.iter_mut() {
            let d = *center_dist.get(x, y);
            if d < max_dist * MIXED_USE_RADIUS && !*water.get(x, y) {
                *zone = ZoneType::MixedUse;
            }
            if d < max_dist * HIGH_RES_RADIUS && *zone == ZoneType::LowRes {
                *zone = ZoneType::HighRes;
            }
            if d < max_dist * MED_RES_RADIUS && *zone == ZoneType::LowRes {
                *zone = ZoneType::MedRes;
            }
        }

        let road_dist = distance_to_nearest(&roads.roads);
        for (x, y, zone) in self.zones.iter_mut() {
            if *road_dist.get(x, y) < COMMERCIAL_ROAD_DISTANCE && zone.is_residential() {
                *zone = ZoneType::Commercial;
            }
        }

        for (x, y, zone) in self.zones.iter_mut() {
            if *center_dist.get(x, y) > max_dist * INDUSTRIAL_RADIUS && *zone == ZoneType::LowRes {
                *zone = ZoneType::Industrial;
            }
        }

        for (x, y, &r) in roads.roads.iter() {
            if r {
                self.zones.set(x, y, ZoneType::Unzoned);
            }
        }

        self.smooth_transitions(SMOOTHING_ITERATIONS);

        info!(
            zoned = self.zones.count(|z| z.is_zoned()),
            center_x = cx,
            center_y = cy,
            "zoning assigned"
        );
        debug!(distribution = ?self.distribution(), "zone histogram");
        Ok(())
    }

    /// Majority filter over interior zoned cells.
    ///
    /// Each pass reads only the previous pass's grid. A cell takes the most
    /// frequent zoned value in its 3x3 window (itself included, lowest code
    /// on ties). Border cells keep their value.
    ///
    /// This is not a plain 3x3 mode: unzoned neighbours (water, roads) are
    /// left out of the vote. A dry cell beside a road would otherwise be
    /// voted to 0 and lose its zone, so only road and water cells stay
    /// unzoned after smoothing.
    pub fn smooth_transitions(&mut self, iterations: usize) {
        if self.width < 3 || self.height < 3 {
            return;
        }

        for _ in 0..iterations {
            let previous = self.zones.clone();
            for y in 1..self.height - 1 {
                for x in 1..self.width - 1 {
                    if !previous.get(x, y).is_zoned() {
                        continue;
                    }
                    let mut counts = [0u8; ZoneType::ALL.len()];
                    for ny in y - 1..=y + 1 {
                        for nx in x - 1..=x + 1 {
                            let zone = *previous.get(nx, ny);
                            if zone.is_zoned() {
                                counts[zone.code() as usize] += 1;
                            }
                        }
                    }
                    self.zones.set(x, y, mode_of(&counts));
                }
            }
        }
    }

    /// Cell count per zone type.
    pub fn distribution(&self) -> [(ZoneType, usize); 7] {
        zone_distribution(&self.zones)
    }
}

/// Cell count per zone type of any zone grid, in code order.
pub fn zone_distribution(zones: &Tilemap<ZoneType>) -> [(ZoneType, usize); 7] {
    let mut counts = [0usize; 7];
    for &zone in zones.as_slice() {
        counts[zone.code() as usize] += 1;
    }
    ZoneType::ALL.map(|zone| (zone, counts[zone.code() as usize]))
}

fn mode_of(counts: &[u8; 7]) -> ZoneType {
    let mut best = 0;
    for code in 1..counts.len() {
        if counts[code] > counts[best] {
            best = code;
        }
    }
    ZoneType::ALL[best]
}

// =============================================================================
// DISTANCE FIELDS
// =============================================================================

/// Euclidean distance of every cell to `(cx, cy)`.
fn distance_from_point(width: usize, height: usize, cx: usize, cy: usize) -> Tilemap<f32> {
    let mut dist = Tilemap::new_with(width, height, 0.0f32);
    for (x, y, d) in dist.iter_mut() {
        let dx = x as f32 - cx as f32;
        let dy = y as f32 - cy as f32;
        *d = (dx * dx + dy * dy).sqrt();
    }
    dist
}

/// Exact Euclidean distance from every cell to the nearest `true` cell.
///
/// Two passes of the 1D lower-envelope transform (columns, then rows).
/// With no target cells every distance is infinite.
pub fn distance_to_nearest(targets: &Tilemap<bool>) -> Tilemap<f32> {
    let width = targets.width;
    let height = targets.height;
    let mut sq = Tilemap::new_with(width, height, f64::INFINITY);
    for (x, y, &t) in targets.iter() {
        if t {
            sq.set(x, y, 0.0);
        }
    }

    let mut column = vec![0.0f64; height];
    for x in 0..width {
        for (y, v) in column.iter_mut().enumerate() {
            *v = *sq.get(x, y);
        }
        let transformed = squared_distance_1d(&column);
        for (y, &v) in transformed.iter().enumerate() {
            sq.set(x, y, v);
        }
    }

    let mut result = Tilemap::new_with(width, height, f32::INFINITY);
    let mut row = vec![0.0f64; width];
    for y in 0..height {
        for (x, v) in row.iter_mut().enumerate() {
            *v = *sq.get(x, y);
        }
        let transformed = squared_distance_1d(&row);
        for (x, &v) in transformed.iter().enumerate() {
            result.set(x, y, v.sqrt() as f32);
        }
    }
    result
}

/// 1D squared distance transform of a sampled function (Felzenszwalb-Huttenlocher).
fn squared_distance_1d(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    let mut out = vec![f64::INFINITY; n];
    // parabola vertices and the boundaries between them
    let mut vertices: Vec<usize> = Vec::with_capacity(n);
    let mut bounds: Vec<f64> = Vec::with_capacity(n + 1);

    for q in 0..n {
        if !f[q].is_finite() {
            continue;
        }
        let mut start = f64::NEG_INFINITY;
        while let Some(&v) = vertices.last() {
            let s = ((f[q] + (q * q) as f64) - (f[v] + (v * v) as f64)) / (2.0 * q as f64 - 2.0 * v as f64);
            if s <= *bounds.last().unwrap_or(&f64::NEG_INFINITY) {
                vertices.pop();
                bounds.pop();
            } else {
                start = s;
                break;
            }
        }
        vertices.push(q);
        bounds.push(start);
    }

    if vertices.is_empty() {
        return out;
    }

    let mut k = 0;
    for (q, slot) in out.iter_mut().enumerate() {
        while k + 1 < vertices.len() && bounds[k + 1] < q as f64 {
            k += 1;
        }
        let v = vertices[k];
        let d = q as f64 - v as f64;
        *slot = d * d + f[v];
    }
    out
}
