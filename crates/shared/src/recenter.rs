//! Keeps the viewport centered on the viewer's reported location.

use crate::models::ViewerLocation;

/// Zoom level applied whenever the map recenters on the viewer.
pub const RECENTER_ZOOM: u8 = 13;

/// Something that can be moved to a center point and zoom level.
pub trait Viewport {
    fn set_view(&mut self, center: [f64; 2], zoom: u8);
}

/// Where the viewport should move for a given location, if anywhere.
pub fn recenter_target(location: &ViewerLocation) -> Option<[f64; 2]> {
    location.pair()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecenterState {
    NoLocationYet,
    Centered { center: [f64; 2] },
}

#[derive(Debug, Clone)]
pub struct RecenterController {
    zoom: u8,
    state: RecenterState,
}

impl Default for RecenterController {
    fn default() -> Self {
        Self::new(RECENTER_ZOOM)
    }
}

impl RecenterController {
    pub fn new(zoom: u8) -> Self {
        RecenterController {
            zoom,
            state: RecenterState::NoLocationYet,
        }
    }

    pub fn state(&self) -> RecenterState {
        self.state
    }

    /// Reacts to a new location value. Partial locations are ignored; a full
    /// pair is applied every time, even when it repeats the previous one.
    pub fn on_location_changed<V: Viewport + ?Sized>(
        &mut self,
        location: &ViewerLocation,
        viewport: &mut V,
    ) {
        let Some(center) = recenter_target(location) else {
            return;
        };
        viewport.set_view(center, self.zoom);
        self.state = RecenterState::Centered { center };
    }
}

type Listener = Box<dyn FnMut(&ViewerLocation)>;

/// Notification point for hosts that push location updates by hand.
#[derive(Default)]
pub struct LocationFeed {
    current: ViewerLocation,
    listeners: Vec<Listener>,
}

impl LocationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ViewerLocation {
        self.current
    }

    /// Registers a listener. It is called immediately with the current value.
    pub fn subscribe(&mut self, mut listener: impl FnMut(&ViewerLocation) + 'static) {
        listener(&self.current);
        self.listeners.push(Box::new(listener));
    }

    pub fn publish(&mut self, location: ViewerLocation) {
        self.current = location;
        for listener in &mut self.listeners {
            listener(&location);
        }
    }
}

impl std::fmt::Debug for LocationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationFeed")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
