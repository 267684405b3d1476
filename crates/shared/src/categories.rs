//! Declarative per-category table: which backend collection feeds each
//! category and how its record fields map onto a [`Marker`](crate::models::Marker).

use crate::models::Category;

/// Source field names for one category's records.
///
/// Backend collections were imported from different open-data sets, so the
/// same concept is spelled differently per collection (`LATITUDE` vs
/// `Latitude`, `PHONE` vs `phone`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    pub latitude: &'static str,
    pub longitude: &'static str,
    pub label: &'static str,
    /// When set, the field is required and copied into `contact`.
    pub contact: Option<&'static str>,
    /// When set, the field is copied into `address` if present.
    pub address: Option<&'static str>,
}

impl FieldMap {
    /// Fields that must be present and truthy for a record to be kept.
    pub fn required_fields(&self) -> Vec<&'static str> {
        let mut fields = vec![self.latitude, self.longitude];
        fields.extend(self.contact);
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryConfig {
    pub category: Category,
    pub collection: &'static str,
    pub fields: FieldMap,
}

pub const CATEGORIES: [CategoryConfig; 4] = [
    CategoryConfig {
        category: Category::Food,
        collection: "food",
        fields: FieldMap {
            latitude: "LATITUDE",
            longitude: "LONGITUDE",
            label: "PROGRAM",
            contact: Some("PHONE"),
            address: Some("ADDRESS"),
        },
    },
    CategoryConfig {
        category: Category::Shelter,
        collection: "shelters",
        fields: FieldMap {
            latitude: "Latitude",
            longitude: "Longitude",
            label: "Center Name",
            contact: None,
            address: None,
        },
    },
    CategoryConfig {
        category: Category::HealthClinic,
        collection: "sex_health_clinics",
        fields: FieldMap {
            latitude: "LATITUDE",
            longitude: "LONGITUDE",
            label: "Clinic Name",
            contact: None,
            address: None,
        },
    },
    CategoryConfig {
        category: Category::CampusFood,
        collection: "cuny_food",
        fields: FieldMap {
            latitude: "Latitude",
            longitude: "Longitude",
            label: "School",
            contact: Some("phone"),
            address: None,
        },
    },
];

pub fn config_for(category: Category) -> &'static CategoryConfig {
    &CATEGORIES[category.index()]
}
