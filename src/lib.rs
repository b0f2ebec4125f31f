//! City generation library
//!
//! Re-exports modules for use by binaries and tools.

pub mod buildings;
pub mod city;
pub mod config;
pub mod error;
pub mod features;
pub mod heightmap;
pub mod roads;
pub mod seeds;
pub mod tilemap;
pub mod water;
pub mod zoning;

pub use city::{generate_city, generate_city_with, CityData, CityStats};
pub use config::CityConfig;
pub use error::{CityGenError, Result};
pub use tilemap::Tilemap;
