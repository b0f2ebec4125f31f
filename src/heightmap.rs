use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::error::{CityGenError, Result};
use crate::tilemap::Tilemap;

// =============================================================================
// TERRAIN PARAMETERS
// =============================================================================

/// Parameters for terrain generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Cells per noise unit (higher = larger, smoother features)
    pub scale: f64,
    /// Number of noise octaves
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            scale: 50.0,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(CityGenError::InvalidScale(self.scale));
        }
        Ok(())
    }
}

// =============================================================================
// MAIN HEIGHTMAP GENERATION
// =============================================================================

/// Generate a normalized heightmap by layering `octaves` of Perlin noise.
///
/// Octave `i` is sampled at `(x / scale, y / scale) * lacunarity^i` and
/// weighted by `persistence^i`. The sum is rescaled to [0, 1]. The Perlin
/// permutation table comes from `seed`, so equal seeds give equal terrain.
pub fn generate_heightmap(
    width: usize,
    height: usize,
    params: &TerrainParams,
    seed: u64,
) -> Result<Tilemap<f32>> {
    if width == 0 || height == 0 {
        return Err(CityGenError::InvalidDimensions { width, height });
    }
    params.validate()?;

    // noise seeds are 32-bit; fold the high half in so every bit matters
    let noise = Perlin::new((seed ^ (seed >> 32)) as u32);
    let mut heightmap = Tilemap::new_with(width, height, 0.0f32);

    for y in 0..height {
        for x in 0..width {
            let nx = x as f64 / params.scale;
            let ny = y as f64 / params.scale;
            let value = fbm(&noise, nx, ny, params.octaves, params.persistence, params.lacunarity);
            heightmap.set(x, y, value as f32);
        }
    }

    Ok(normalize_heightmap(&heightmap))
}

/// Fractional Brownian Motion - unnormalized sum of octaves
fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total
}

// =============================================================================
// POST-PROCESSING
// =============================================================================

/// Normalize heightmap values to 0.0-1.0 range.
/// A perfectly flat field has no range to stretch and becomes all zeros.
pub fn normalize_heightmap(heightmap: &Tilemap<f32>) -> Tilemap<f32> {
    let (min_val, max_val) = heightmap.min_max();
    let range = max_val - min_val;

    let mut normalized = Tilemap::new_with(heightmap.width, heightmap.height, 0.0);
    if !(range > 0.0) {
        return normalized;
    }

    for (x, y, &val) in heightmap.iter() {
        normalized.set(x, y, ((val - min_val) / range).clamp(0.0, 1.0));
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_span_unit_interval() {
        let heightmap = generate_heightmap(48, 32, &TerrainParams::default(), 7).unwrap();
        assert_eq!((heightmap.width, heightmap.height), (48, 32));

        let (min_h, max_h) = heightmap.min_max();
        assert_eq!(min_h, 0.0);
        assert_eq!(max_h, 1.0);
        assert!(heightmap.iter().all(|(_, _, &h)| (0.0..=1.0).contains(&h)));
    }

    #[test]
    fn test_same_seed_same_terrain() {
        let params = TerrainParams { octaves: 3, ..TerrainParams::default() };
        let a = generate_heightmap(20, 20, &params, 99).unwrap();
        let b = generate_heightmap(20, 20, &params, 99).unwrap();
        let c = generate_heightmap(20, 20, &params, 100).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_flat_field_is_all_zero() {
        // no octaves means no signal at all
        let params = TerrainParams { octaves: 0, ..TerrainParams::default() };
        let heightmap = generate_heightmap(8, 8, &params, 1).unwrap();
        assert!(heightmap.iter().all(|(_, _, &h)| h == 0.0));

        let flat = Tilemap::new_with(4, 4, 0.25f32);
        assert!(normalize_heightmap(&flat).iter().all(|(_, _, &h)| h == 0.0));
    }

    #[test]
    fn test_zero_scale_is_rejected() {
        let params = TerrainParams { scale: 0.0, ..TerrainParams::default() };
        assert_eq!(
            generate_heightmap(16, 16, &params, 0),
            Err(CityGenError::InvalidScale(0.0))
        );

        let params = TerrainParams { scale: -3.0, ..TerrainParams::default() };
        assert!(generate_heightmap(16, 16, &params, 0).is_err());
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        assert_eq!(
            generate_heightmap(0, 16, &TerrainParams::default(), 0),
            Err(CityGenError::InvalidDimensions { width: 0, height: 16 })
        );
    }
}
