use dioxus::prelude::*;
use touchline_shared::models::Player;

/// Bench strip: players without a field position. Each chip supports two
/// placement flows that land in the same host callback — native
/// drag-and-drop onto the canvas (payload: player id) and tap-to-place
/// (arm here, then tap the field).
#[component]
pub fn RosterBar(
    players: ReadSignal<Vec<Player>>,
    pending_placement: Signal<Option<String>>,
) -> Element {
    let bench: Vec<Player> = players
        .read()
        .iter()
        .filter(|p| p.position.is_none())
        .cloned()
        .collect();

    rsx! {
        div { class: "roster-bar",
            span { class: "roster-title", "Bench" }
            if bench.is_empty() {
                span { class: "roster-empty", "everyone is placed" }
            }
            for player in bench {
                RosterChip {
                    player: player.clone(),
                    pending_placement,
                }
            }
        }
    }
}

#[component]
fn RosterChip(player: Player, pending_placement: Signal<Option<String>>) -> Element {
    let armed = pending_placement.read().as_deref() == Some(player.id.as_str());
    let drag_id = player.id.clone();
    let tap_id = player.id.clone();
    let label = player.display_label().to_string();

    rsx! {
        div {
            class: if armed { "roster-chip armed" } else { "roster-chip" },
            draggable: "true",
            ondragstart: move |evt: Event<DragData>| {
                if let Some(native) = evt.data().downcast::<web_sys::DragEvent>() {
                    if let Some(transfer) = native.data_transfer() {
                        let _ = transfer.set_data("text/plain", &drag_id);
                    }
                }
            },
            onclick: move |_| {
                // Tap again to disarm.
                if pending_placement.read().as_deref() == Some(tap_id.as_str()) {
                    pending_placement.set(None);
                } else {
                    pending_placement.set(Some(tap_id.clone()));
                }
            },
            "{label}"
        }
    }
}
