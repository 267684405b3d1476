//! Browser geolocation feed for the map's viewer location.

use resource_map_shared::models::ViewerLocation;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// An active `watchPosition` subscription. Dropping it stops the watch.
pub struct LocationWatch {
    id: i32,
    _on_position: Closure<dyn FnMut(web_sys::GeolocationPosition)>,
    _on_error: Closure<dyn FnMut(web_sys::GeolocationPositionError)>,
}

impl Drop for LocationWatch {
    fn drop(&mut self) {
        if let Some(geolocation) = web_sys::window().and_then(|w| w.navigator().geolocation().ok()) {
            geolocation.clear_watch(self.id);
        }
    }
}

/// Start watching the device position; `on_change` receives every fix.
pub fn watch_location(
    mut on_change: impl FnMut(ViewerLocation) + 'static,
) -> Result<LocationWatch, JsValue> {
    let geolocation = web_sys::window()
        .ok_or_else(|| JsValue::from_str("no browser window"))?
        .navigator()
        .geolocation()?;

    let on_position = Closure::<dyn FnMut(web_sys::GeolocationPosition)>::new(
        move |position: web_sys::GeolocationPosition| {
            let coords = position.coords();
            on_change(ViewerLocation::new(coords.latitude(), coords.longitude()));
        },
    );
    let on_error = Closure::<dyn FnMut(web_sys::GeolocationPositionError)>::new(
        |err: web_sys::GeolocationPositionError| {
            tracing::warn!(code = err.code(), message = %err.message(), "Geolocation unavailable");
        },
    );

    let id = geolocation.watch_position_with_error_callback(
        on_position.as_ref().unchecked_ref(),
        Some(on_error.as_ref().unchecked_ref()),
    );

    Ok(LocationWatch {
        id,
        _on_position: on_position,
        _on_error: on_error,
    })
}
