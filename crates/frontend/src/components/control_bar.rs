use dioxus::prelude::*;
use touchline_shared::models::GameType;

#[component]
#[allow(clippy::too_many_arguments)]
pub fn ControlBar(
    tactics_view: Signal<bool>,
    drawing_enabled: Signal<bool>,
    show_names: Signal<bool>,
    game_type: Signal<GameType>,
    can_undo: bool,
    can_redo: bool,
    on_add_opponent: EventHandler<()>,
    on_add_disc: EventHandler<()>,
    on_place_ball: EventHandler<()>,
    on_clear_drawings: EventHandler<()>,
    on_undo: EventHandler<()>,
    on_redo: EventHandler<()>,
    on_export: EventHandler<()>,
    on_help: EventHandler<()>,
) -> Element {
    let tactics = *tactics_view.read();
    let drawing = *drawing_enabled.read();
    let names = *show_names.read();
    let current_game = *game_type.read();

    rsx! {
        div { class: "control-bar",
            div { class: "control-group",
                button {
                    class: if tactics { "active" } else { "" },
                    onclick: move |_| tactics_view.set(!tactics),
                    "Tactics"
                }
                button {
                    class: if drawing { "active" } else { "" },
                    onclick: move |_| drawing_enabled.set(!drawing),
                    "Draw"
                }
                button {
                    class: if names { "active" } else { "" },
                    onclick: move |_| show_names.set(!names),
                    "Names"
                }
                select {
                    value: "{current_game}",
                    onchange: move |evt: Event<FormData>| {
                        let next = if evt.value() == "Futsal" {
                            GameType::Futsal
                        } else {
                            GameType::Soccer
                        };
                        game_type.set(next);
                    },
                    option { value: "Soccer", selected: current_game == GameType::Soccer, "Soccer" }
                    option { value: "Futsal", selected: current_game == GameType::Futsal, "Futsal" }
                }
            }
            div { class: "control-group",
                if tactics {
                    button { onclick: move |_| on_add_disc.call(()), "+ Disc" }
                    button { onclick: move |_| on_place_ball.call(()), "Ball" }
                    button { onclick: move |_| on_clear_drawings.call(()), "Clear ink" }
                } else {
                    button { onclick: move |_| on_add_opponent.call(()), "+ Opponent" }
                }
            }
            div { class: "control-group",
                button { disabled: !can_undo, onclick: move |_| on_undo.call(()), "Undo" }
                button { disabled: !can_redo, onclick: move |_| on_redo.call(()), "Redo" }
                button { onclick: move |_| on_export.call(()), "Export PNG" }
                button { onclick: move |_| on_help.call(()), "?" }
            }
        }
    }
}
