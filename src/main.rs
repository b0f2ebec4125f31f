use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use city_generator::buildings::BuildingType;
use city_generator::{generate_city, CityConfig, CityStats};

#[derive(Parser, Debug)]
#[command(name = "city_generator")]
#[command(about = "Generate procedural city layouts: terrain, water, roads, zoning and buildings")]
struct Args {
    /// Width of the city grid in cells
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the city grid in cells
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the generated city as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of parks
    #[arg(long)]
    parks: Option<usize>,

    /// Number of landmarks
    #[arg(long)]
    landmarks: Option<usize>,

    /// Number of main road seeds
    #[arg(long)]
    road_seeds: Option<usize>,

    /// Road cell budget per growth phase
    #[arg(long)]
    max_roads: Option<usize>,
}

impl Args {
    fn apply_to(&self, config: &mut CityConfig) {
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(parks) = self.parks {
            config.features.num_parks = parks;
        }
        if let Some(landmarks) = self.landmarks {
            config.features.num_landmarks = landmarks;
        }
        if let Some(seeds) = self.road_seeds {
            config.roads.num_seeds = seeds;
        }
        if let Some(max_roads) = self.max_roads {
            config.roads.max_roads = max_roads;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => CityConfig::default(),
    };
    args.apply_to(&mut config);

    info!(width = config.width, height = config.height, "generating city");
    let city = generate_city(&config)?;
    let stats = CityStats::from(&city);

    info!(seed = city.seed, "seed");
    info!(
        water = %format!("{:.1}%", stats.water_pct),
        roads = %format!("{:.1}%", stats.road_pct),
        main_roads = %format!("{:.1}%", stats.main_road_pct),
        buildings = %format!("{:.1}%", stats.building_pct),
        parks = %format!("{:.1}%", stats.park_pct),
        landmark_tiles = stats.landmark_tiles,
        "coverage"
    );
    for (building_type, count) in [
        (BuildingType::Residential, stats.residential_buildings),
        (BuildingType::Commercial, stats.commercial_buildings),
        (BuildingType::Industrial, stats.industrial_buildings),
    ] {
        info!("  {}: {} buildings", building_type.display_name(), count);
    }
    for (zone, cells) in stats.zone_counts {
        info!("  {}: {} cells", zone.display_name(), cells);
    }

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string(&city)?)?;
        info!(path = %path.display(), "city written");
    }

    Ok(())
}
