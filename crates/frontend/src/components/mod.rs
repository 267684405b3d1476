pub mod marker_popup;
pub mod resource_map;
