mod api;
mod components;
mod coords;
mod geolocation;

use dioxus::prelude::*;
use futures::channel::mpsc;
use futures::StreamExt;
use resource_map_shared::config::MapConfig;
use resource_map_shared::models::ViewerLocation;

use components::resource_map::ResourceMap;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[route("/")]
    Home {},
}

/// Full-page map fed by the browser's position watch.
#[component]
fn Home() -> Element {
    let mut location = use_signal(ViewerLocation::default);

    use_future(move || async move {
        let (tx, mut rx) = mpsc::unbounded();
        // The watch stops when this future is dropped with the page
        let _watch = match geolocation::watch_location(move |fix| {
            let _ = tx.unbounded_send(fix);
        }) {
            Ok(watch) => watch,
            Err(e) => {
                tracing::warn!(error = ?e, "Geolocation not available, map stays at default view");
                return;
            }
        };
        while let Some(fix) = rx.next().await {
            location.set(fix);
        }
    });

    rsx! {
        ResourceMap { config: MapConfig::default(), location }
    }
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        document::Title { "Community Resource Map" }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
