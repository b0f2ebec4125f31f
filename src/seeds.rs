//! Seed management for city generation
//!
//! Every stage draws from its own RNG stream derived from one master seed,
//! so changing e.g. the park count does not reshuffle the road network.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seeds for all generation stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CitySeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Perlin permutation table for the terrain
    pub heightmap: u64,
    /// River source and meandering
    pub water: u64,
    /// Road seed positions
    pub roads: u64,
    /// Park sizes and park/landmark positions
    pub features: u64,
}

impl CitySeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            heightmap: derive_seed(master, "heightmap"),
            water: derive_seed(master, "water"),
            roads: derive_seed(master, "roads"),
            features: derive_seed(master, "features"),
        }
    }
}

/// Derive a sub-seed from a master seed and a stage name.
fn derive_seed(master: u64, stage: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    stage.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for CitySeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CitySeeds {{ master: {}, heightmap: {}, water: {}, roads: {}, features: {} }}",
            self.master, self.heightmap, self.water, self.roads, self.features,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_derivation() {
        assert_eq!(CitySeeds::from_master(12345), CitySeeds::from_master(12345));
    }

    #[test]
    fn test_different_stages_get_different_seeds() {
        let seeds = CitySeeds::from_master(12345);
        assert_ne!(seeds.heightmap, seeds.water);
        assert_ne!(seeds.roads, seeds.features);
        assert_ne!(seeds.heightmap, CitySeeds::from_master(54321).heightmap);
    }
}
