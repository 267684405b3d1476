use dioxus::prelude::*;

/// Popup anchored above a marker or cluster, one paragraph per line.
#[component]
pub fn MarkerPopup(lines: Vec<String>, left: f64, top: f64, on_close: EventHandler<()>) -> Element {
    rsx! {
        div {
            class: "marker-popup",
            style: "left:{left}px;top:{top}px;",
            // Keep clicks and drags inside the popup away from the map
            onclick: move |evt: Event<MouseData>| evt.stop_propagation(),
            onmousedown: move |evt: Event<MouseData>| evt.stop_propagation(),

            button {
                class: "popup-close",
                title: "Close",
                onclick: move |evt: Event<MouseData>| {
                    evt.stop_propagation();
                    on_close.call(());
                },
                "×"
            }

            div { class: "popup-content",
                for (i, line) in lines.iter().enumerate() {
                    p { key: "{i}", "{line}" }
                }
            }
        }
    }
}
