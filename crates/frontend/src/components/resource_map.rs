use std::cell::RefCell;
use std::rc::Rc;

use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use resource_map_shared::cluster::{cluster_pins, compose_layer, Cluster, Pin};
use resource_map_shared::config::MapConfig;
use resource_map_shared::fetch::{load_markers, LoadOutcome};
use resource_map_shared::models::ViewerLocation;
use resource_map_shared::projection::visible_tiles;
use resource_map_shared::recenter::RecenterController;
use resource_map_shared::store::MarkerStores;

use crate::api::GraphQlSource;
use crate::components::marker_popup::MarkerPopup;
use crate::coords::{self, ViewState};

const MAP_CONTAINER_ID: &str = "resource-map-container";

/// Movement below this many pixels is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

/// Fingers wobble more than a mouse, so taps get a wider allowance.
const TOUCH_DRAG_THRESHOLD: f64 = 8.0;

/// Container size assumed until the element is mounted and measured.
const DEFAULT_SIZE: (f64, f64) = (1024.0, 768.0);

/// Zoom levels gained when a cluster is clicked.
const CLUSTER_EXPAND_STEP: u8 = 2;

/// Two-finger gesture in progress: spread and view when it began, and the
/// client point the zoom is anchored on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pinch {
    start_distance: f64,
    start_view: ViewState,
    midpoint: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
struct OpenPopup {
    position: [f64; 2],
    lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct TileView {
    key: String,
    url: String,
    left: f64,
    top: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct PinView {
    key: String,
    icon: String,
    left: f64,
    top: f64,
    popup: OpenPopup,
}

#[derive(Debug, Clone, PartialEq)]
struct ClusterView {
    key: String,
    class: &'static str,
    count: usize,
    center: [f64; 2],
    left: f64,
    top: f64,
    popup: OpenPopup,
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

fn container_size() -> Option<(f64, f64)> {
    let rect = container_rect()?;
    (rect.width() > 0.0 && rect.height() > 0.0).then(|| (rect.width(), rect.height()))
}

/// Offset of a client point from the container center.
fn offset_from_center(client: (f64, f64)) -> Option<(f64, f64)> {
    let rect = container_rect()?;
    Some((
        client.0 - rect.left() - rect.width() / 2.0,
        client.1 - rect.top() - rect.height() / 2.0,
    ))
}

/// The measured size, if it differs from what the view was laid out for.
fn resized(current: (f64, f64), measured: Option<(f64, f64)>) -> Option<(f64, f64)> {
    measured.filter(|&m| m != current)
}

fn sync_size(mut size: Signal<(f64, f64)>) {
    let current = *size.peek();
    if let Some(measured) = resized(current, container_size()) {
        size.set(measured);
    }
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

// ---------------------------------------------------------------------------
// Layer composition (pure, no DOM access)
// ---------------------------------------------------------------------------

fn cluster_size_class(count: usize) -> &'static str {
    match count {
        0..=9 => "cluster-small",
        10..=99 => "cluster-medium",
        _ => "cluster-large",
    }
}

fn build_tiles(config: &MapConfig, view: ViewState, width: f64, height: f64) -> Vec<TileView> {
    visible_tiles(view.center, view.zoom, width, height)
        .into_iter()
        .map(|t| TileView {
            key: format!("{}/{}/{}/{}", t.z, t.x, t.y, t.left.round() as i64),
            url: config.tile_url(t.z, t.x, t.y),
            left: t.left,
            top: t.top,
        })
        .collect()
}

/// Pins from every store, clustered at one zoom level.
#[derive(Debug, Clone, Default, PartialEq)]
struct ClusteredLayer {
    pins: Vec<Pin>,
    clusters: Vec<Cluster>,
}

fn cluster_layer(stores: &MarkerStores, zoom: u8, radius_px: f64) -> ClusteredLayer {
    let pins = compose_layer(&stores.snapshot_all());
    let clusters = cluster_pins(&pins, zoom, radius_px);
    ClusteredLayer { pins, clusters }
}

/// The part of a clustered layer visible in the current view, split into
/// single pins and multi-pin clusters.
fn place_layer(
    layer: &ClusteredLayer,
    config: &MapConfig,
    view: ViewState,
    width: f64,
    height: f64,
) -> (Vec<PinView>, Vec<ClusterView>) {
    let pins = &layer.pins;
    let margin = f64::from(config.icon_size);

    let mut pin_views = Vec::new();
    let mut cluster_views = Vec::new();
    for cluster in &layer.clusters {
        let (left, top) = coords::screen_position(cluster.center, view, width, height);
        if !coords::is_on_screen(left, top, width, height, margin) {
            continue;
        }
        let first = &pins[cluster.members[0]];
        if cluster.is_single() {
            pin_views.push(PinView {
                key: first.key.clone(),
                icon: config.icons.get(first.category).to_string(),
                left,
                top,
                popup: OpenPopup {
                    position: first.position,
                    lines: first.popup.clone(),
                },
            });
        } else {
            let lines = cluster
                .members
                .iter()
                .map(|&i| pins[i].popup.first().cloned().unwrap_or_default())
                .collect();
            cluster_views.push(ClusterView {
                key: format!("cluster-{}", first.key),
                class: cluster_size_class(cluster.len()),
                count: cluster.len(),
                center: cluster.center,
                left,
                top,
                popup: OpenPopup {
                    position: cluster.center,
                    lines,
                },
            });
        }
    }
    (pin_views, cluster_views)
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn ResourceMap(config: MapConfig, location: ReadSignal<ViewerLocation>) -> Element {
    let stores = use_hook(MarkerStores::new);
    let mut revision = use_signal(|| 0u64);

    let mut view = use_signal(|| ViewState {
        center: config.initial_center,
        zoom: config.initial_zoom,
    });
    let size = use_signal(|| DEFAULT_SIZE);
    let mut open_popup = use_signal(|| None::<OpenPopup>);

    // Zoom bounds for event handlers
    let zoom_config = use_signal(|| config.clone());

    // Drag state: start position in client coordinates plus the view at that moment
    let mut drag_start = use_signal(|| None::<(f64, f64, ViewState)>);
    let mut did_drag = use_signal(|| false);

    // Touch state
    let mut touch_start = use_signal(|| None::<(f64, f64, ViewState)>);
    let mut pinch = use_signal(|| None::<Pinch>);

    // Fetch every category once; each loaded category triggers a redraw
    let load_stores = stores.clone();
    use_future(move || {
        let stores = load_stores.clone();
        async move {
            let source = match GraphQlSource::same_origin() {
                Ok(source) => source,
                Err(e) => {
                    tracing::error!(error = %e, "Cannot reach collection backend");
                    return;
                }
            };
            let report = load_markers(&source, &stores.writers(), |_, outcome| {
                if matches!(outcome, LoadOutcome::Loaded { .. }) {
                    revision.set(stores.total_revision());
                }
            })
            .await;
            tracing::info!(failed = ?report.failed(), "Initial marker load finished");
        }
    });

    // Follow the viewer location. Only the location is tracked; the current
    // view is peeked so panning does not re-run the effect.
    let recenter = use_hook(|| Rc::new(RefCell::new(RecenterController::new(config.recenter_zoom))));
    use_effect(move || {
        let loc = *location.read();
        let mut next = *view.peek();
        recenter.borrow_mut().on_location_changed(&loc, &mut next);
        if next != *view.peek() {
            view.set(next);
        }
    });

    // Clustering only depends on store contents and zoom, not on panning
    let zoom_level = use_memo(move || view.read().zoom);
    let cluster_radius = config.cluster_radius_px;
    let layer_stores = stores.clone();
    let layer = use_memo(move || {
        let _revision = *revision.read();
        cluster_layer(&layer_stores, *zoom_level.read(), cluster_radius)
    });

    let current = *view.read();
    let (width, height) = *size.read();

    let tiles = build_tiles(&config, current, width, height);
    let (pins, clusters) = place_layer(&layer.read(), &config, current, width, height);
    let popup_view = open_popup.read().clone().map(|p| {
        let (left, top) = coords::screen_position(p.position, current, width, height);
        (p.lines, left, top)
    });
    let icon_size = config.icon_size;
    let min_zoom = config.min_zoom;
    let max_zoom = config.max_zoom;

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "map",

            onmounted: move |_| sync_size(size),
            onresize: move |_| sync_size(size),

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();

                let delta_y = wheel_delta_y(evt.data().delta());
                if delta_y == 0.0 {
                    return;
                }
                let old = *view.read();
                let step = if delta_y < 0.0 { 1 } else { -1 };
                let new_zoom = zoom_config.read().clamp_zoom(i32::from(old.zoom) + step);
                if new_zoom == old.zoom {
                    return;
                }

                let client = evt.data().client_coordinates();
                let Some(offset) = offset_from_center((client.x, client.y)) else { return };
                view.set(coords::zoom_around(old, offset, new_zoom));
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                drag_start.set(Some((client.x, client.y, *view.read())));
                did_drag.set(false);
            },

            onmousemove: move |evt: Event<MouseData>| {
                let Some((start_x, start_y, start_view)) = *drag_start.read() else { return };
                let client = evt.client_coordinates();
                let dx = client.x - start_x;
                let dy = client.y - start_y;

                if !*did_drag.read() && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                    did_drag.set(true);
                }
                if *did_drag.read() {
                    view.set(coords::pan_by(start_view, dx, dy));
                }
            },

            onmouseup: move |_| drag_start.set(None),
            onmouseleave: move |_| drag_start.set(None),

            // --- Touch event handlers ---
            // No prevent_default on touchstart, so a tap still produces the
            // click that opens popups and expands clusters.

            ontouchstart: move |evt: Event<TouchData>| {
                let touches = evt.data().touches();
                if touches.len() == 1 {
                    let t = &touches[0];
                    let start = (t.client_coordinates().x, t.client_coordinates().y);
                    touch_start.set(Some((start.0, start.1, *view.read())));
                    did_drag.set(false);
                } else if touches.len() >= 2 {
                    let t0 = &touches[0];
                    let t1 = &touches[1];
                    let p0 = (t0.client_coordinates().x, t0.client_coordinates().y);
                    let p1 = (t1.client_coordinates().x, t1.client_coordinates().y);
                    pinch.set(Some(Pinch {
                        start_distance: coords::point_distance(p0, p1),
                        start_view: *view.read(),
                        midpoint: coords::midpoint(p0, p1),
                    }));
                    // Cancel any tap tracking
                    touch_start.set(None);
                    did_drag.set(true);
                }
            },

            ontouchmove: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();

                let gesture = *pinch.read();
                if let (Some(gesture), true) = (gesture, touches.len() >= 2) {
                    let t0 = &touches[0];
                    let t1 = &touches[1];
                    let p0 = (t0.client_coordinates().x, t0.client_coordinates().y);
                    let p1 = (t1.client_coordinates().x, t1.client_coordinates().y);
                    let target = coords::pinch_zoom(
                        gesture.start_view.zoom,
                        gesture.start_distance,
                        coords::point_distance(p0, p1),
                    );
                    let new_zoom = zoom_config.read().clamp_zoom(target);
                    let Some(offset) = offset_from_center(gesture.midpoint) else { return };
                    view.set(coords::zoom_around(gesture.start_view, offset, new_zoom));
                } else if touches.len() == 1 {
                    let Some((start_x, start_y, start_view)) = *touch_start.read() else { return };
                    let t = &touches[0];
                    let cur = (t.client_coordinates().x, t.client_coordinates().y);
                    if !*did_drag.read() && coords::point_distance((start_x, start_y), cur) > TOUCH_DRAG_THRESHOLD {
                        did_drag.set(true);
                    }
                    if *did_drag.read() {
                        view.set(coords::pan_by(start_view, cur.0 - start_x, cur.1 - start_y));
                    }
                }
            },

            ontouchend: move |evt: Event<TouchData>| {
                let remaining = evt.data().touches().len();
                let pinching = pinch.read().is_some();
                if pinching {
                    // Wait for all fingers to lift before ending the pinch
                    if remaining == 0 {
                        pinch.set(None);
                        touch_start.set(None);
                    }
                    return;
                }
                if remaining == 0 {
                    touch_start.set(None);
                }
            },

            ontouchcancel: move |_evt: Event<TouchData>| {
                touch_start.set(None);
                pinch.set(None);
                did_drag.set(false);
            },

            // A click on bare map closes any open popup
            onclick: move |_| {
                if !*did_drag.read() {
                    open_popup.set(None);
                }
            },

            div { class: "tile-layer",
                for tile in tiles {
                    img {
                        key: "{tile.key}",
                        class: "tile",
                        src: "{tile.url}",
                        draggable: "false",
                        style: "left:{tile.left}px;top:{tile.top}px;",
                    }
                }
            }

            div { class: "marker-layer",
                for cluster in clusters {
                    div {
                        key: "{cluster.key}",
                        class: "cluster {cluster.class}",
                        style: "left:{cluster.left}px;top:{cluster.top}px;",
                        onclick: move |evt: Event<MouseData>| {
                            evt.stop_propagation();
                            if *did_drag.read() {
                                return;
                            }
                            let old = *view.read();
                            if old.zoom >= max_zoom {
                                // Cannot separate further, list the members instead
                                open_popup.set(Some(cluster.popup.clone()));
                            } else {
                                view.set(coords::expand_cluster(old, cluster.center, CLUSTER_EXPAND_STEP, max_zoom));
                            }
                        },
                        span { "{cluster.count}" }
                    }
                }
                for pin in pins {
                    img {
                        key: "{pin.key}",
                        class: "pin",
                        src: "{pin.icon}",
                        draggable: "false",
                        style: "left:{pin.left}px;top:{pin.top}px;width:{icon_size}px;height:{icon_size}px;",
                        onclick: move |evt: Event<MouseData>| {
                            evt.stop_propagation();
                            if !*did_drag.read() {
                                open_popup.set(Some(pin.popup.clone()));
                            }
                        },
                    }
                }
            }

            if let Some((lines, left, top)) = popup_view {
                MarkerPopup {
                    lines: lines,
                    left: left,
                    top: top,
                    on_close: move |_| open_popup.set(None),
                }
            }

            div { class: "zoom-controls",
                onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),
                ontouchstart: move |evt: Event<TouchData>| evt.stop_propagation(),
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
                button {
                    disabled: current.zoom >= max_zoom,
                    onclick: move |evt: Event<MouseData>| {
                        evt.stop_propagation();
                        let old = *view.read();
                        let new_zoom = zoom_config.read().clamp_zoom(i32::from(old.zoom) + 1);
                        view.set(coords::zoom_around(old, (0.0, 0.0), new_zoom));
                    },
                    "+"
                }
                button {
                    disabled: current.zoom <= min_zoom,
                    onclick: move |evt: Event<MouseData>| {
                        evt.stop_propagation();
                        let old = *view.read();
                        let new_zoom = zoom_config.read().clamp_zoom(i32::from(old.zoom) - 1);
                        view.set(coords::zoom_around(old, (0.0, 0.0), new_zoom));
                    },
                    "−"
                }
            }

            div { class: "attribution",
                a { href: "{config.attribution_url}", target: "_blank", rel: "noopener", "{config.attribution}" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_map_shared::models::{Category, Marker};

    const MIDTOWN: ViewState = ViewState {
        center: [40.768538, -73.964741],
        zoom: 13,
    };

    fn marker(lat: f64, lon: f64, label: &str) -> Marker {
        Marker {
            geocode: [lat, lon],
            pop_up: label.to_string(),
            contact: None,
            address: None,
        }
    }

    fn layout(stores: &MarkerStores, config: &MapConfig, view: ViewState) -> (Vec<PinView>, Vec<ClusterView>) {
        let layer = cluster_layer(stores, view.zoom, config.cluster_radius_px);
        place_layer(&layer, config, view, 800.0, 600.0)
    }

    #[test]
    fn test_cluster_size_class() {
        assert_eq!(cluster_size_class(2), "cluster-small");
        assert_eq!(cluster_size_class(10), "cluster-medium");
        assert_eq!(cluster_size_class(250), "cluster-large");
    }

    #[test]
    fn test_build_tiles_uses_config_template() {
        let config = MapConfig::default();
        let tiles = build_tiles(&config, MIDTOWN, 512.0, 512.0);
        assert!(!tiles.is_empty());
        assert!(tiles
            .iter()
            .all(|t| t.url.starts_with("https://tile.openstreetmap.org/13/")));
        let mut keys: Vec<_> = tiles.iter().map(|t| t.key.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), tiles.len());
    }

    #[test]
    fn test_empty_stores_draw_nothing() {
        let (pins, clusters) = layout(&MarkerStores::new(), &MapConfig::default(), MIDTOWN);
        assert!(pins.is_empty());
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_distant_markers_draw_as_pins_with_category_icons() {
        let stores = MarkerStores::new();
        stores
            .writer(Category::Shelter)
            .replace(vec![marker(40.768538, -73.964741, "Center")]);
        stores
            .writer(Category::HealthClinic)
            .replace(vec![marker(40.776, -73.95, "Clinic")]);
        let config = MapConfig::default();

        let (pins, clusters) = layout(&stores, &config, MIDTOWN);
        assert!(clusters.is_empty());
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[0].key, "shelter-0");
        assert_eq!(pins[0].icon, config.icons.shelter);
        assert!((pins[0].left - 400.0).abs() < 1e-6);
        assert_eq!(pins[1].icon, config.icons.health_clinic);
        assert_eq!(pins[1].popup.lines, vec!["Clinic"]);
    }

    #[test]
    fn test_overlapping_markers_across_categories_cluster() {
        let stores = MarkerStores::new();
        stores
            .writer(Category::Food)
            .replace(vec![marker(40.7685, -73.9647, "Pantry")]);
        stores
            .writer(Category::CampusFood)
            .replace(vec![marker(40.7686, -73.9646, "Hunter College")]);

        let (pins, clusters) = layout(&stores, &MapConfig::default(), MIDTOWN);
        assert!(pins.is_empty());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count, 2);
        assert_eq!(clusters[0].popup.lines, vec!["Pantry", "Hunter College"]);
    }

    #[test]
    fn test_off_screen_markers_are_skipped() {
        let stores = MarkerStores::new();
        stores
            .writer(Category::Shelter)
            .replace(vec![marker(34.05, -118.24, "Los Angeles")]);
        let (pins, clusters) = layout(&stores, &MapConfig::default(), MIDTOWN);
        assert!(pins.is_empty() && clusters.is_empty());
    }

    #[test]
    fn test_clustered_layer_reused_across_pans() {
        let stores = MarkerStores::new();
        stores
            .writer(Category::Shelter)
            .replace(vec![marker(40.768538, -73.964741, "Center")]);
        let config = MapConfig::default();
        let layer = cluster_layer(&stores, MIDTOWN.zoom, config.cluster_radius_px);

        let panned = coords::pan_by(MIDTOWN, 120.0, 0.0);
        let (before, _) = place_layer(&layer, &config, MIDTOWN, 800.0, 600.0);
        let (after, _) = place_layer(&layer, &config, panned, 800.0, 600.0);
        assert!((after[0].left - before[0].left - 120.0).abs() < 1e-6);
        assert_eq!(after[0].key, before[0].key);
    }

    #[test]
    fn test_cluster_layer_splits_when_zooming_in() {
        let stores = MarkerStores::new();
        stores
            .writer(Category::Food)
            .replace(vec![marker(40.7685, -73.9647, "Pantry"), marker(40.7700, -73.9620, "Kitchen")]);

        let radius = MapConfig::default().cluster_radius_px;
        assert_eq!(cluster_layer(&stores, 13, radius).clusters.len(), 1);
        assert_eq!(cluster_layer(&stores, 18, radius).clusters.len(), 2);
        assert_eq!(cluster_layer(&stores, 18, radius).pins.len(), 2);
    }

    #[test]
    fn test_layout_follows_resized_container() {
        let stores = MarkerStores::new();
        stores
            .writer(Category::Shelter)
            .replace(vec![marker(40.768538, -73.964741, "Center")]);
        let config = MapConfig::default();
        let layer = cluster_layer(&stores, MIDTOWN.zoom, config.cluster_radius_px);

        let (pins, _) = place_layer(&layer, &config, MIDTOWN, 390.0, 844.0);
        assert!((pins[0].left - 195.0).abs() < 1e-6);
        assert!((pins[0].top - 422.0).abs() < 1e-6);
    }

    #[test]
    fn test_resized_only_reports_changes() {
        assert_eq!(resized((1024.0, 768.0), None), None);
        assert_eq!(resized((1024.0, 768.0), Some((1024.0, 768.0))), None);
        assert_eq!(resized((1024.0, 768.0), Some((768.0, 1024.0))), Some((768.0, 1024.0)));
    }
}
