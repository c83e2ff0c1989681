//! The interactive field canvas: hit-testing, gesture disambiguation and
//! drag/draw dispatch for the tactics board.
//!
//! The component never mutates entity lists. It reads the host's signals,
//! classifies pointer input against them, and reports every proposed
//! mutation through the `on_*` callbacks; the host stays the single
//! source of truth and a redraw follows from its updates.

use dioxus::html::input_data::MouseButton;
use dioxus::logger::tracing::warn;
use dioxus::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use touchline_shared::hit::{classify_press, PressContext, PressTarget};
use touchline_shared::models::{
    DiscType, FormationAnchor, GameType, Opponent, Player, RelPoint, Stroke, SubSlot, TacticalDisc,
};
use touchline_shared::snap::snap_to_anchor;

use crate::components::field_renderer::{self, FieldScene};
use crate::coords;
use crate::gestures::{DragKind, EndEvent, GestureState, TapTargetId};

const BALL_TEXTURE: Asset = asset!("/assets/ball.svg");

/// Read a touch point's identifier. `TouchPoint::identifier` is private in
/// dioxus-html 0.7.10, so reach the underlying `web_sys::Touch` (which backs
/// every touch point on the web renderer) and read the same value from it.
fn touch_identifier(touch: &TouchPoint) -> i32 {
    touch
        .downcast::<web_sys::Touch>()
        .map(|t| t.identifier())
        .unwrap_or(-1)
}

/// Render the current board into a fresh scaled-up surface and return it
/// as a data URL. Host-initiated (export button), not gesture-initiated.
pub fn export_scene_data_url(scene: &FieldScene, scale: f64) -> Option<String> {
    let live = coords::field_canvas()?;
    let surface = field_renderer::render_for_export(&live, scene, scale)?;
    surface.to_data_url().ok()
}

#[component]
#[allow(clippy::too_many_arguments)]
pub fn FieldCanvas(
    players: ReadSignal<Vec<Player>>,
    opponents: ReadSignal<Vec<Opponent>>,
    discs: ReadSignal<Vec<TacticalDisc>>,
    drawings: ReadSignal<Vec<Stroke>>,
    ball: ReadSignal<Option<RelPoint>>,
    anchors: ReadSignal<Vec<FormationAnchor>>,
    sub_slots: ReadSignal<Vec<SubSlot>>,
    tactics_view: ReadSignal<bool>,
    drawing_enabled: ReadSignal<bool>,
    show_names: ReadSignal<bool>,
    game_type: ReadSignal<GameType>,
    /// Roster player armed for tap-to-place; the next press on the field
    /// resolves to `on_drop_external` instead of a gesture.
    pending_placement: ReadSignal<Option<String>>,
    on_player_move: EventHandler<(String, RelPoint)>,
    on_player_move_end: EventHandler<String>,
    on_opponent_move: EventHandler<(String, RelPoint)>,
    on_opponent_move_end: EventHandler<String>,
    on_disc_move: EventHandler<(String, RelPoint)>,
    on_disc_move_end: EventHandler<String>,
    on_ball_move: EventHandler<RelPoint>,
    on_ball_move_end: EventHandler<()>,
    on_player_remove: EventHandler<String>,
    on_opponent_remove: EventHandler<String>,
    on_disc_remove: EventHandler<String>,
    on_disc_toggle_type: EventHandler<String>,
    on_stroke_start: EventHandler<RelPoint>,
    on_stroke_point: EventHandler<RelPoint>,
    on_stroke_end: EventHandler<()>,
    on_player_swap: EventHandler<(String, String)>,
    on_drop_external: EventHandler<(String, RelPoint)>,
) -> Element {
    let mut gesture = use_signal(GestureState::new);
    // Bumped by the resize observer, visibility-resume and the ball image
    // load; the draw effect reads it so every bump schedules a redraw.
    let mut redraw_epoch = use_signal(|| 0u64);

    // Terminate the active gesture: snap a released player, then fire
    // each owed end callback. `finish` drains the state, so this is safe
    // to call from every terminal event without double-firing.
    let mut end_gesture = move || {
        let last_pos = gesture.read().last_drag_pos;
        let events = gesture.write().finish();
        for event in events {
            match event {
                EndEvent::PlayerMoveEnd(id) => {
                    if !tactics_view() {
                        if let (Some(pos), Some((w, h))) = (last_pos, coords::container_size()) {
                            let snapped =
                                snap_to_anchor(&anchors.read(), pos, &players.read(), &id, w, h);
                            if let Some(point) = snapped {
                                on_player_move.call((id.clone(), point));
                            }
                        }
                    }
                    on_player_move_end.call(id);
                }
                EndEvent::OpponentMoveEnd(id) => on_opponent_move_end.call(id),
                EndEvent::DiscMoveEnd(id) => on_disc_move_end.call(id),
                EndEvent::BallMoveEnd => on_ball_move_end.call(()),
                EndEvent::StrokeEnd => on_stroke_end.call(()),
            }
        }
    };

    // Double-activation outcome, shared by double-click and double-tap:
    // players and opponents are removed, a Home disc toggles its type,
    // any other disc is removed.
    let double_activate = move |target: PressTarget| match target {
        PressTarget::Player(id) => on_player_remove.call(id),
        PressTarget::Opponent(id) => on_opponent_remove.call(id),
        PressTarget::Disc(id) => {
            let is_home = discs
                .read()
                .iter()
                .find(|d| d.id == id)
                .is_some_and(|d| d.disc_type == DiscType::Home);
            if is_home {
                on_disc_toggle_type.call(id);
            } else {
                on_disc_remove.call(id);
            }
        }
        _ => {}
    };

    let classify = move |cx: f64, cy: f64, has_selection: bool| -> Option<PressTarget> {
        let (w, h) = coords::container_size()?;
        let ctx = PressContext {
            tactics_view: tactics_view(),
            drawing_enabled: drawing_enabled(),
            has_selection,
        };
        Some(classify_press(
            ctx,
            &players.read(),
            &opponents.read(),
            &discs.read(),
            ball(),
            &anchors.read(),
            &sub_slots.read(),
            cx,
            cy,
            w,
            h,
        ))
    };

    // One-shot browser wiring: resize observation on the container (the
    // canvas always fills it), cache invalidation on visibility-resume,
    // and the ball texture load.
    use_effect(move || {
        field_renderer::ensure_ball_image(&BALL_TEXTURE.to_string(), move || {
            redraw_epoch += 1;
        });

        let on_resize = Closure::<dyn FnMut()>::new(move || {
            redraw_epoch += 1;
        });
        match web_sys::ResizeObserver::new(on_resize.as_ref().unchecked_ref()) {
            Ok(observer) => {
                match web_sys::window()
                    .and_then(|w| w.document())
                    .and_then(|d| d.get_element_by_id(coords::FIELD_CONTAINER_ID))
                {
                    Some(container) => observer.observe(&container),
                    None => warn!("field container not mounted; resize observation disabled"),
                }
                on_resize.forget();
            }
            Err(_) => {
                warn!("ResizeObserver unavailable; field will not follow container resizes");
            }
        }

        let on_visibility = Closure::<dyn FnMut()>::new(move || {
            let visible = web_sys::window()
                .and_then(|w| w.document())
                .map(|d| d.visibility_state() == web_sys::VisibilityState::Visible)
                .unwrap_or(false);
            if visible {
                // Cached surfaces may be stale after backgrounding; pay
                // one cold redraw instead of risking a corrupt frame.
                field_renderer::invalidate_background_cache();
                redraw_epoch += 1;
            }
        });
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            if document
                .add_event_listener_with_callback(
                    "visibilitychange",
                    on_visibility.as_ref().unchecked_ref(),
                )
                .is_ok()
            {
                on_visibility.forget();
            }
        }
    });

    // Externally disabling draw mode closes an in-flight stroke (and any
    // other open gesture) gracefully rather than dropping it.
    use_effect(move || {
        if !drawing_enabled() {
            end_gesture();
        }
    });

    // Redraw on every entity/mode/selection change and on epoch bumps.
    use_effect(move || {
        let _ = redraw_epoch();
        let players_v = players.read();
        let opponents_v = opponents.read();
        let discs_v = discs.read();
        let drawings_v = drawings.read();
        let anchors_v = anchors.read();
        let sub_slots_v = sub_slots.read();
        let g = gesture.read();
        let Some(canvas) = coords::field_canvas() else {
            return;
        };
        let scene = FieldScene {
            players: &players_v,
            opponents: &opponents_v,
            discs: &discs_v,
            drawings: &drawings_v,
            ball: ball(),
            anchors: &anchors_v,
            sub_slots: &sub_slots_v,
            tactics_view: tactics_view(),
            show_names: show_names(),
            game_type: game_type(),
            selected_player: g.selected_player.as_deref(),
        };
        field_renderer::draw_field(&canvas, &scene);
    });

    rsx! {
        div {
            id: coords::FIELD_CONTAINER_ID,
            class: "field-canvas-container",

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                if let Some(id) = pending_placement() {
                    if let Some(rel) = coords::client_to_relative(client.x, client.y) {
                        on_drop_external.call((id, rel));
                    }
                    return;
                }
                let Some((cx, cy)) = coords::client_to_container(client.x, client.y) else {
                    return;
                };
                let Some(target) = classify(cx, cy, false) else {
                    return;
                };
                match target {
                    PressTarget::Ball => gesture.write().drag = Some(DragKind::Ball),
                    PressTarget::Disc(id) => gesture.write().drag = Some(DragKind::Disc(id)),
                    PressTarget::Player(id) => {
                        let pos = players
                            .read()
                            .iter()
                            .find(|p| p.id == id)
                            .and_then(|p| p.position);
                        let mut g = gesture.write();
                        g.selected_player = None;
                        g.last_drag_pos = pos;
                        g.drag = Some(DragKind::Player(id));
                    }
                    PressTarget::Opponent(id) => {
                        gesture.write().drag = Some(DragKind::Opponent(id));
                    }
                    PressTarget::Draw => {
                        let had_open = {
                            let mut g = gesture.write();
                            let open = g.stroke_active;
                            g.stroke_active = true;
                            open
                        };
                        if had_open {
                            // Never leave a prior stroke dangling.
                            on_stroke_end.call(());
                        }
                        if let Some(rel) = coords::client_to_relative(client.x, client.y) {
                            on_stroke_start.call(rel);
                        }
                    }
                    PressTarget::FreeSlot(_) | PressTarget::None => {}
                }
            },

            onmousemove: move |evt: Event<MouseData>| {
                let client = evt.client_coordinates();
                let drag = gesture.read().drag.clone();
                if let Some(kind) = drag {
                    let Some(rel) = coords::client_to_relative(client.x, client.y) else {
                        return;
                    };
                    match kind {
                        DragKind::Player(id) => {
                            gesture.write().last_drag_pos = Some(rel);
                            on_player_move.call((id, rel));
                        }
                        DragKind::Opponent(id) => on_opponent_move.call((id, rel)),
                        DragKind::Disc(id) => on_disc_move.call((id, rel)),
                        DragKind::Ball => on_ball_move.call(rel),
                    }
                } else if gesture.read().stroke_active {
                    if let Some(rel) = coords::client_to_relative(client.x, client.y) {
                        on_stroke_point.call(rel);
                    }
                }
            },

            onmouseup: move |_| end_gesture(),

            onmouseleave: move |_| end_gesture(),

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                let client = evt.client_coordinates();
                let Some((cx, cy)) = coords::client_to_container(client.x, client.y) else {
                    return;
                };
                if let Some(target) = classify(cx, cy, false) {
                    double_activate(target);
                }
            },

            // --- Touch event handlers ---

            ontouchstart: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let touches = evt.data().touches();
                // Single-touch policy: a press with multiple simultaneous
                // touch points changes nothing.
                if touches.len() != 1 {
                    return;
                }
                if gesture.read().touch_id.is_some() {
                    return;
                }
                let touch = &touches[0];
                let client = touch.client_coordinates();
                if let Some(id) = pending_placement() {
                    if let Some(rel) = coords::client_to_relative(client.x, client.y) {
                        on_drop_external.call((id, rel));
                    }
                    return;
                }
                let Some((cx, cy)) = coords::client_to_container(client.x, client.y) else {
                    return;
                };
                let has_selection = gesture.read().selected_player.is_some();
                let Some(target) = classify(cx, cy, has_selection) else {
                    return;
                };

                // Touch has no native double-tap: match this press against
                // the recorded previous tap before anything else.
                let tap_target = match &target {
                    PressTarget::Player(id) => Some(TapTargetId::Player(id.clone())),
                    PressTarget::Opponent(id) => Some(TapTargetId::Opponent(id.clone())),
                    PressTarget::Disc(id) => Some(TapTargetId::Disc(id.clone())),
                    _ => None,
                };
                let now = js_sys::Date::now();
                if let Some(tt) = &tap_target {
                    if gesture.read().is_double_tap(tt, cx, cy, now) {
                        let mut g = gesture.write();
                        g.consume_tap();
                        // The target may be about to disappear; a stale
                        // selection must not survive it.
                        g.selected_player = None;
                        drop(g);
                        double_activate(target);
                        return;
                    }
                }
                if let Some(tt) = tap_target {
                    gesture.write().record_tap(tt, cx, cy, now);
                }

                let tid = touch_identifier(touch);
                match target {
                    PressTarget::Ball => {
                        let mut g = gesture.write();
                        g.touch_id = Some(tid);
                        g.drag = Some(DragKind::Ball);
                    }
                    PressTarget::Disc(id) => {
                        let mut g = gesture.write();
                        g.touch_id = Some(tid);
                        g.drag = Some(DragKind::Disc(id));
                    }
                    PressTarget::Player(id) => {
                        // Not a drag yet: stays a tap candidate until the
                        // movement threshold is crossed.
                        let mut g = gesture.write();
                        g.touch_id = Some(tid);
                        g.arm_player_drag(id, cx, cy);
                    }
                    PressTarget::Opponent(id) => {
                        let mut g = gesture.write();
                        g.touch_id = Some(tid);
                        g.drag = Some(DragKind::Opponent(id));
                    }
                    PressTarget::FreeSlot(point) => {
                        // Consumed on release, not on press.
                        let mut g = gesture.write();
                        g.touch_id = Some(tid);
                        g.pending_slot = Some(point);
                    }
                    PressTarget::Draw => {
                        let had_open = {
                            let mut g = gesture.write();
                            let open = g.stroke_active;
                            g.touch_id = Some(tid);
                            g.stroke_active = true;
                            open
                        };
                        if had_open {
                            on_stroke_end.call(());
                        }
                        if let Some(rel) = coords::client_to_relative(client.x, client.y) {
                            on_stroke_start.call(rel);
                        }
                    }
                    PressTarget::None => {
                        // Track the touch so the release can clear a
                        // pending selection.
                        gesture.write().touch_id = Some(tid);
                    }
                }
            },

            ontouchmove: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let Some(tid) = gesture.read().touch_id else {
                    return;
                };
                let touches = evt.data().touches();
                // Only the tracked touch drives the gesture.
                let Some(touch) = touches.iter().find(|t| touch_identifier(t) == tid) else {
                    return;
                };
                let client = touch.client_coordinates();
                let Some((cx, cy)) = coords::client_to_container(client.x, client.y) else {
                    return;
                };

                let promote = gesture.read().should_promote(cx, cy);
                if promote {
                    let mut g = gesture.write();
                    if let Some(armed) = g.armed.take() {
                        // The tap candidate became a real drag: any
                        // pending swap-selection is off.
                        g.selected_player = None;
                        g.drag = Some(DragKind::Player(armed.player_id));
                    }
                }

                let drag = gesture.read().drag.clone();
                if let Some(kind) = drag {
                    let Some(rel) = coords::client_to_relative(client.x, client.y) else {
                        return;
                    };
                    match kind {
                        DragKind::Player(id) => {
                            gesture.write().last_drag_pos = Some(rel);
                            on_player_move.call((id, rel));
                        }
                        DragKind::Opponent(id) => on_opponent_move.call((id, rel)),
                        DragKind::Disc(id) => on_disc_move.call((id, rel)),
                        DragKind::Ball => on_ball_move.call(rel),
                    }
                } else if gesture.read().stroke_active {
                    if let Some(rel) = coords::client_to_relative(client.x, client.y) {
                        on_stroke_point.call(rel);
                    }
                }
            },

            ontouchend: move |evt: Event<TouchData>| {
                evt.prevent_default();
                let Some(tid) = gesture.read().touch_id else {
                    return;
                };
                let ended = evt
                    .data()
                    .touches_changed()
                    .iter()
                    .any(|t| touch_identifier(t) == tid);
                if !ended {
                    return;
                }

                let was_gesture = {
                    let g = gesture.read();
                    g.drag.is_some() || g.stroke_active
                };
                if was_gesture {
                    end_gesture();
                    return;
                }

                // Tap resolution: no drag, draw or ball-drag was entered
                // and the press wasn't consumed as a double-tap.
                let (pending_slot, tapped_player, selected) = {
                    let mut g = gesture.write();
                    g.touch_id = None;
                    (
                        g.pending_slot.take(),
                        g.armed.take().map(|a| a.player_id),
                        g.selected_player.clone(),
                    )
                };

                if let (Some(slot), Some(sel)) = (pending_slot, selected.clone()) {
                    // Move the selected player to the tapped empty slot,
                    // with the same commit side effects as a drag ending
                    // there.
                    gesture.write().selected_player = None;
                    on_player_move.call((sel.clone(), slot));
                    on_player_move_end.call(sel);
                    return;
                }

                match (tapped_player, selected) {
                    (Some(tapped), None) => {
                        gesture.write().selected_player = Some(tapped);
                    }
                    (Some(tapped), Some(sel)) if tapped == sel => {
                        gesture.write().selected_player = None;
                    }
                    (Some(tapped), Some(sel)) => {
                        gesture.write().selected_player = None;
                        on_player_swap.call((sel, tapped));
                    }
                    (None, _) => {
                        // Tap on nothing in particular.
                        gesture.write().selected_player = None;
                    }
                }
            },

            ontouchcancel: move |_| end_gesture(),

            // --- External drop (roster bar drag-and-drop) ---

            ondragover: move |evt: Event<DragData>| {
                evt.prevent_default();
            },

            ondrop: move |evt: Event<DragData>| {
                evt.prevent_default();
                let Some(native) = evt.data().downcast::<web_sys::DragEvent>().cloned() else {
                    return;
                };
                let Some(transfer) = native.data_transfer() else {
                    return;
                };
                let Ok(id) = transfer.get_data("text/plain") else {
                    return;
                };
                if id.is_empty() {
                    return;
                }
                let (x, y) = (f64::from(native.client_x()), f64::from(native.client_y()));
                if let Some(rel) = coords::client_to_relative(x, y) {
                    on_drop_external.call((id, rel));
                }
            },

            canvas {
                id: coords::FIELD_CANVAS_ID,
                class: "field-canvas",
            }
        }
    }
}
