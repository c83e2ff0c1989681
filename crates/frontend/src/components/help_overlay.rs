use dioxus::prelude::*;

#[component]
pub fn HelpOverlay(show: Signal<bool>) -> Element {
    if !*show.read() {
        return rsx! {};
    }

    rsx! {
        div {
            class: "help-overlay-backdrop",
            onclick: move |_| show.set(false),

            div {
                class: "help-overlay",
                onclick: move |evt: Event<MouseData>| evt.stop_propagation(),

                h2 { "Board gestures" }

                div { class: "help-section",
                    h3 { "Players" }
                    div { class: "help-row",
                        span { class: "help-gesture", "Drag" }
                        span { "Move a player; drops near a formation spot snap onto it" }
                    }
                    div { class: "help-row",
                        span { class: "help-gesture", "Tap, then tap another player" }
                        span { "Swap the two players" }
                    }
                    div { class: "help-row",
                        span { class: "help-gesture", "Tap, then tap an open spot" }
                        span { "Move the selected player there" }
                    }
                    div { class: "help-row",
                        span { class: "help-gesture", "Double tap" }
                        span { "Remove from the field" }
                    }
                }

                div { class: "help-section",
                    h3 { "Tactics view" }
                    div { class: "help-row",
                        span { class: "help-gesture", "Drag" }
                        span { "Move discs and the ball" }
                    }
                    div { class: "help-row",
                        span { class: "help-gesture", "Double tap a disc" }
                        span { "Home discs switch role; others are removed" }
                    }
                    div { class: "help-row",
                        span { class: "help-gesture", "Draw mode + drag" }
                        span { "Sketch runs and passes freehand" }
                    }
                }

                div { class: "help-section",
                    h3 { "Bench" }
                    div { class: "help-row",
                        span { class: "help-gesture", "Drag a chip onto the field" }
                        span { "Place a benched player" }
                    }
                    div { class: "help-row",
                        span { class: "help-gesture", "Tap a chip, then the field" }
                        span { "Same, without drag-and-drop" }
                    }
                }

                button { class: "help-close", onclick: move |_| show.set(false), "Close" }
            }
        }
    }
}
