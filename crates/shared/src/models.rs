use serde::{Deserialize, Serialize};

/// The four kinds of resource shown on the map. Each one is backed by a
/// single backend collection and rendered with its own icon and popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Food,
    Shelter,
    HealthClinic,
    CampusFood,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Food,
        Category::Shelter,
        Category::HealthClinic,
        Category::CampusFood,
    ];

    /// Position of this category in per-category arrays.
    pub fn index(self) -> usize {
        match self {
            Category::Food => 0,
            Category::Shelter => 1,
            Category::HealthClinic => 2,
            Category::CampusFood => 3,
        }
    }

    /// Prefix used to build stable pin keys (`food-0`, `clinic-3`, ...).
    pub fn key_prefix(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Shelter => "shelter",
            Category::HealthClinic => "clinic",
            Category::CampusFood => "cunyfood",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Food => write!(f, "food sites"),
            Category::Shelter => write!(f, "shelters"),
            Category::HealthClinic => write!(f, "sex health clinics"),
            Category::CampusFood => write!(f, "CUNY food sites"),
        }
    }
}

/// A single displayable point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// `[latitude, longitude]`
    pub geocode: [f64; 2],
    pub pop_up: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// The viewer's position as reported by the host. Either half may be
/// unknown while the host is still waiting on the browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerLocation {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ViewerLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        ViewerLocation {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Both coordinates, if both are known.
    pub fn pair(&self) -> Option<[f64; 2]> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some([lat, lon]),
            _ => None,
        }
    }
}
