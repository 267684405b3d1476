use resource_map_shared::projection::{project, unproject, viewport_origin};
use resource_map_shared::recenter::Viewport;

/// What the map is currently looking at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// `[latitude, longitude]` at the middle of the container.
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Viewport for ViewState {
    fn set_view(&mut self, center: [f64; 2], zoom: u8) {
        *self = ViewState { center, zoom };
    }
}

/// Pure function: container-relative pixel position of a coordinate.
pub fn screen_position(point: [f64; 2], view: ViewState, width: f64, height: f64) -> (f64, f64) {
    let (origin_x, origin_y) = viewport_origin(view.center, view.zoom, width, height);
    let (x, y) = project(point[0], point[1], view.zoom);
    (x - origin_x, y - origin_y)
}

/// Whether a container-relative point is visible, allowing `margin` pixels of overhang.
pub fn is_on_screen(x: f64, y: f64, width: f64, height: f64, margin: f64) -> bool {
    x >= -margin && x <= width + margin && y >= -margin && y <= height + margin
}

/// Move the view so its content shifts by `(dx, dy)` screen pixels, as a drag does.
pub fn pan_by(view: ViewState, dx: f64, dy: f64) -> ViewState {
    let (cx, cy) = project(view.center[0], view.center[1], view.zoom);
    ViewState {
        center: unproject(cx - dx, cy - dy, view.zoom),
        zoom: view.zoom,
    }
}

/// Change zoom while keeping the point under the cursor fixed.
///
/// `offset` is the cursor position relative to the container center.
pub fn zoom_around(view: ViewState, offset: (f64, f64), new_zoom: u8) -> ViewState {
    if new_zoom == view.zoom {
        return view;
    }
    let (cx, cy) = project(view.center[0], view.center[1], view.zoom);
    let anchor = unproject(cx + offset.0, cy + offset.1, view.zoom);
    let (ax, ay) = project(anchor[0], anchor[1], new_zoom);
    ViewState {
        center: unproject(ax - offset.0, ay - offset.1, new_zoom),
        zoom: new_zoom,
    }
}

/// Zoom in on a cluster so its members start to separate.
pub fn expand_cluster(view: ViewState, cluster_center: [f64; 2], step: u8, max_zoom: u8) -> ViewState {
    ViewState {
        center: cluster_center,
        zoom: view.zoom.saturating_add(step).min(max_zoom).max(view.zoom),
    }
}

pub fn point_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}

pub fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Zoom level reached by a pinch: each doubling of finger spread adds one
/// level. Unclamped; the caller applies the configured bounds.
pub fn pinch_zoom(start_zoom: u8, start_distance: f64, distance: f64) -> i32 {
    if start_distance < 1.0 || distance <= 0.0 {
        return i32::from(start_zoom);
    }
    i32::from(start_zoom) + (distance / start_distance).log2().round() as i32
}
