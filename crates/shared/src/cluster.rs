//! Builds the clustered marker layer from the category stores.
//!
//! [`compose_layer`] flattens every store into display pins; [`cluster_pins`]
//! groups pins that would overlap on screen at the current zoom. Clustering
//! only decides what is drawn, it never alters the stores.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Category, Marker};
use crate::projection::{project, unproject};

/// One marker ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    /// Stable per-render key, e.g. `food-3`.
    pub key: String,
    pub category: Category,
    pub position: [f64; 2],
    pub popup: Vec<String>,
}

/// Popup text for a marker, one entry per paragraph.
pub fn popup_lines(category: Category, marker: &Marker) -> Vec<String> {
    let mut lines = vec![marker.pop_up.clone()];
    match category {
        Category::Food => {
            if let Some(contact) = &marker.contact {
                lines.push(format!("Contact: {}", contact));
            }
            if let Some(address) = &marker.address {
                lines.push(format!("Address: {}", address));
            }
        }
        Category::CampusFood => {
            lines.extend(marker.contact.clone());
        }
        Category::Shelter | Category::HealthClinic => {}
    }
    lines
}

/// Flatten store snapshots into pins, preserving store order.
pub fn compose_layer(stores: &[(Category, Arc<[Marker]>)]) -> Vec<Pin> {
    stores
        .iter()
        .flat_map(|(category, markers)| {
            markers.iter().enumerate().map(move |(i, marker)| Pin {
                key: format!("{}-{}", category.key_prefix(), i),
                category: *category,
                position: marker.geocode,
                popup: popup_lines(*category, marker),
            })
        })
        .collect()
}

/// A group of pins drawn as one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Centroid of the members, as `[latitude, longitude]`.
    pub center: [f64; 2],
    /// Indices into the pin slice passed to [`cluster_pins`].
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_single(&self) -> bool {
        self.members.len() == 1
    }
}

/// Greedy distance clustering in screen space.
///
/// Pins are visited in order; each unclaimed pin seeds a cluster that claims
/// every unclaimed pin within `radius_px` of it at `zoom`. A spatial grid
/// with `radius_px` cells limits each search to the 3x3 neighborhood.
pub fn cluster_pins(pins: &[Pin], zoom: u8, radius_px: f64) -> Vec<Cluster> {
    let points: Vec<(f64, f64)> = pins
        .iter()
        .map(|p| project(p.position[0], p.position[1], zoom))
        .collect();

    if radius_px <= 0.0 {
        return pins
            .iter()
            .enumerate()
            .map(|(i, p)| Cluster {
                center: p.position,
                members: vec![i],
            })
            .collect();
    }

    let cell_of = |(x, y): (f64, f64)| ((x / radius_px).floor() as i64, (y / radius_px).floor() as i64);
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, point) in points.iter().enumerate() {
        grid.entry(cell_of(*point)).or_default().push(i);
    }

    let radius_sq = radius_px * radius_px;
    let mut claimed = vec![false; pins.len()];
    let mut clusters = Vec::new();

    for seed in 0..pins.len() {
        if claimed[seed] {
            continue;
        }
        let (sx, sy) = points[seed];
        let (cx, cy) = cell_of((sx, sy));

        let mut members = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = grid.get(&(cx + dx, cy + dy)) else { continue };
                for &i in bucket {
                    if claimed[i] {
                        continue;
                    }
                    let (x, y) = points[i];
                    if (x - sx).powi(2) + (y - sy).powi(2) <= radius_sq {
                        claimed[i] = true;
                        members.push(i);
                    }
                }
            }
        }
        members.sort_unstable();

        let n = members.len() as f64;
        let (sum_x, sum_y) = members
            .iter()
            .fold((0.0, 0.0), |(ax, ay), &i| (ax + points[i].0, ay + points[i].1));
        let center = if members.len() == 1 {
            pins[seed].position
        } else {
            unproject(sum_x / n, sum_y / n, zoom)
        };

        clusters.push(Cluster { center, members });
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(lat: f64, lon: f64, label: &str) -> Marker {
        Marker {
            geocode: [lat, lon],
            pop_up: label.to_string(),
            contact: None,
            address: None,
        }
    }

    fn pin(lat: f64, lon: f64) -> Pin {
        Pin {
            key: String::new(),
            category: Category::Shelter,
            position: [lat, lon],
            popup: Vec::new(),
        }
    }

    #[test]
    fn test_food_popup_layout() {
        let m = Marker {
            geocode: [40.7, -73.9],
            pop_up: "Community Pantry".to_string(),
            contact: Some("555-1234".to_string()),
            address: Some("1 Main St".to_string()),
        };
        assert_eq!(
            popup_lines(Category::Food, &m),
            vec!["Community Pantry", "Contact: 555-1234", "Address: 1 Main St"]
        );
    }

    #[test]
    fn test_campus_popup_shows_bare_contact() {
        let mut m = marker(40.8, -73.95, "City College");
        m.contact = Some("212-555-0100".to_string());
        assert_eq!(
            popup_lines(Category::CampusFood, &m),
            vec!["City College", "212-555-0100"]
        );
    }

    #[test]
    fn test_shelter_and_clinic_popup_is_label_only() {
        let mut m = marker(40.75, -73.99, "Midtown");
        m.contact = Some("ignored".to_string());
        assert_eq!(popup_lines(Category::Shelter, &m), vec!["Midtown"]);
        assert_eq!(popup_lines(Category::HealthClinic, &m), vec!["Midtown"]);
    }

    #[test]
    fn test_compose_layer_keys_and_order() {
        let stores: Vec<(Category, Arc<[Marker]>)> = vec![
            (Category::Food, Arc::from(vec![marker(1.0, 1.0, "f0"), marker(2.0, 2.0, "f1")])),
            (Category::Shelter, Arc::from(Vec::new())),
            (Category::HealthClinic, Arc::from(vec![marker(3.0, 3.0, "c0")])),
            (Category::CampusFood, Arc::from(vec![marker(4.0, 4.0, "u0")])),
        ];
        let pins = compose_layer(&stores);
        let keys: Vec<_> = pins.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["food-0", "food-1", "clinic-0", "cunyfood-0"]);
        assert_eq!(pins[2].category, Category::HealthClinic);
        assert_eq!(pins[3].position, [4.0, 4.0]);
    }

    #[test]
    fn test_nearby_pins_cluster_at_low_zoom_and_split_at_high_zoom() {
        // Two pins ~100m apart in Manhattan
        let pins = vec![pin(40.7580, -73.9855), pin(40.7589, -73.9851)];

        let low = cluster_pins(&pins, 10, 80.0);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].members, vec![0, 1]);

        let high = cluster_pins(&pins, 18, 80.0);
        assert_eq!(high.len(), 2);
        assert!(high.iter().all(Cluster::is_single));
    }

    #[test]
    fn test_every_pin_lands_in_exactly_one_cluster() {
        let pins: Vec<_> = (0..50)
            .map(|i| pin(40.6 + (i % 7) as f64 * 0.01, -74.0 + (i / 7) as f64 * 0.013))
            .collect();
        let clusters = cluster_pins(&pins, 12, 80.0);

        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_cluster_center_is_between_members() {
        let pins = vec![pin(40.0, -74.0), pin(40.001, -73.999)];
        let clusters = cluster_pins(&pins, 10, 80.0);
        assert_eq!(clusters.len(), 1);
        let [lat, lon] = clusters[0].center;
        assert!(lat > 40.0 && lat < 40.001);
        assert!(lon > -74.0 && lon < -73.999);
    }

    #[test]
    fn test_zero_radius_disables_clustering() {
        let pins = vec![pin(40.0, -74.0), pin(40.0, -74.0)];
        let clusters = cluster_pins(&pins, 10, 0.0);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn test_empty_layer() {
        assert!(cluster_pins(&[], 13, 80.0).is_empty());
        assert!(compose_layer(&[]).is_empty());
    }
}
