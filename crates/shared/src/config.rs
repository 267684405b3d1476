use serde::{Deserialize, Serialize};

use crate::models::Category;
use crate::recenter::RECENTER_ZOOM;

/// Icon URL per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIcons {
    pub food: String,
    pub shelter: String,
    pub health_clinic: String,
    pub campus_food: String,
}

impl CategoryIcons {
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Food => &self.food,
            Category::Shelter => &self.shelter,
            Category::HealthClinic => &self.health_clinic,
            Category::CampusFood => &self.campus_food,
        }
    }
}

impl Default for CategoryIcons {
    fn default() -> Self {
        CategoryIcons {
            food: "https://www.svgrepo.com/show/494450/food-market-purchasing.svg".to_string(),
            shelter: "https://www.svgrepo.com/show/126102/shelter.svg".to_string(),
            health_clinic: "https://www.svgrepo.com/show/326199/health-worker.svg".to_string(),
            campus_food: "https://www.svgrepo.com/show/533533/school-flag.svg".to_string(),
        }
    }
}

/// Presentation settings for the map widget. Missing keys fall back to the
/// defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    /// Center shown before the viewer's location is known (Central Park).
    pub initial_center: [f64; 2],
    pub initial_zoom: u8,
    pub recenter_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Template with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
    pub attribution: String,
    pub attribution_url: String,
    /// Pins closer than this many screen pixels are grouped into one cluster.
    pub cluster_radius_px: f64,
    /// Icons are drawn square, this many pixels on a side.
    pub icon_size: u32,
    pub icons: CategoryIcons,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            initial_center: [40.768538, -73.964741],
            initial_zoom: 13,
            recenter_zoom: RECENTER_ZOOM,
            min_zoom: 3,
            max_zoom: 18,
            tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
            attribution_url: "https://www.openstreetmap.org/copyright".to_string(),
            cluster_radius_px: 80.0,
            icon_size: 38,
            icons: CategoryIcons::default(),
        }
    }
}

impl MapConfig {
    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        self.tile_url
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }

    pub fn clamp_zoom(&self, zoom: i32) -> u8 {
        zoom.clamp(i32::from(self.min_zoom), i32::from(self.max_zoom)) as u8
    }
}
