//! Input configuration for a whole city.
//!
//! Every field has a default, so a JSON config only needs the values it
//! changes.

use serde::{Deserialize, Serialize};

use crate::error::{CityGenError, Result};
use crate::features::FeatureParams;
use crate::heightmap::TerrainParams;
use crate::roads::RoadParams;
use crate::water::WaterParams;
use crate::zoning::ZoningParams;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    pub width: usize,
    pub height: usize,
    /// Master seed (random if unset)
    pub seed: Option<u64>,
    pub terrain: TerrainParams,
    pub water: WaterParams,
    pub roads: RoadParams,
    pub zoning: ZoningParams,
    pub features: FeatureParams,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            seed: None,
            terrain: TerrainParams::default(),
            water: WaterParams::default(),
            roads: RoadParams::default(),
            zoning: ZoningParams::default(),
            features: FeatureParams::default(),
        }
    }
}

impl CityConfig {
    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Check every stage's parameters before any generation starts.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CityGenError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        self.terrain.validate()?;
        self.water.validate()?;
        self.roads.validate()?;
        self.features.validate()?;

        if let Some(x) = self.water.river_start {
            if x >= self.width {
                return Err(CityGenError::invalid(
                    "river_start",
                    format!("column {} is outside width {}", x, self.width),
                ));
            }
        }
        if let Some((cx, cy)) = self.zoning.city_center {
            if cx >= self.width || cy >= self.height {
                return Err(CityGenError::OutOfBounds {
                    x: cx as i64,
                    y: cy as i64,
                    width: self.width,
                    height: self.height,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(CityConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: CityConfig = serde_json::from_str(
            r#"{ "width": 64, "seed": 9, "terrain": { "octaves": 2 }, "features": { "num_parks": 0 } }"#,
        )
        .unwrap();
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 256);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.terrain.octaves, 2);
        assert_eq!(config.terrain.scale, 50.0);
        assert_eq!(config.features.num_parks, 0);
        assert_eq!(config.features.num_landmarks, 3);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = CityConfig::with_size(32, 48);
        config.zoning.city_center = Some((3, 4));
        let json = serde_json::to_string(&config).unwrap();
        let back: CityConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validation_catches_bad_values() {
        let mut config = CityConfig::with_size(16, 16);
        config.terrain.scale = 0.0;
        assert_eq!(config.validate(), Err(CityGenError::InvalidScale(0.0)));

        let mut config = CityConfig::with_size(16, 0);
        assert!(matches!(config.validate(), Err(CityGenError::InvalidDimensions { .. })));

        config.height = 16;
        config.zoning.city_center = Some((16, 0));
        assert!(matches!(config.validate(), Err(CityGenError::OutOfBounds { .. })));

        config.zoning.city_center = None;
        config.features.park_max_size = config.features.park_min_size;
        assert!(matches!(config.validate(), Err(CityGenError::InvalidParameter { .. })));
    }
}
