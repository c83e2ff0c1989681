//! The board page: owner of every entity list and the only code that
//! mutates them. The field canvas proposes mutations through callbacks;
//! this page applies them, recomputes derived state (goalie detection)
//! and keeps the undo history on each commit signal.

use dioxus::logger::tracing::warn;
use dioxus::prelude::*;
use wasm_bindgen::JsCast;

use touchline_shared::hit::OCCUPANCY_THRESHOLD;
use touchline_shared::models::{
    DiscType, FormationAnchor, GameType, Opponent, Player, RelPoint, Stroke, SubSlot, TacticalDisc,
};

use crate::components::control_bar::ControlBar;
use crate::components::field_canvas::{export_scene_data_url, FieldCanvas};
use crate::components::field_renderer::FieldScene;
use crate::components::help_overlay::HelpOverlay;
use crate::components::roster_bar::RosterBar;

const UNDO_LIMIT: usize = 50;

const EXPORT_SCALE: f64 = 2.0;

/// Everything the undo history needs to restore a board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub players: Vec<Player>,
    pub opponents: Vec<Opponent>,
    pub discs: Vec<TacticalDisc>,
    pub drawings: Vec<Stroke>,
    pub ball: Option<RelPoint>,
}

/// Push the previous committed state onto the undo stack, dropping the
/// oldest entry past the limit. Any redo future is invalidated.
pub fn push_undo(
    undo: &mut Vec<BoardSnapshot>,
    redo: &mut Vec<BoardSnapshot>,
    snapshot: BoardSnapshot,
) {
    if undo.last() == Some(&snapshot) {
        return;
    }
    undo.push(snapshot);
    if undo.len() > UNDO_LIMIT {
        undo.remove(0);
    }
    redo.clear();
}

/// A player parked on the goalkeeper anchor is the goalie; everyone else
/// is not. Runs on every move-end commit.
pub fn recompute_goalies(players: &mut [Player], anchors: &[FormationAnchor]) {
    let Some(gk) = anchors.iter().find(|a| a.is_goalkeeper()) else {
        return;
    };
    for player in players.iter_mut() {
        player.is_goalie = player.position.is_some_and(|pos| {
            (pos.x - gk.point.x).abs() <= OCCUPANCY_THRESHOLD
                && (pos.y - gk.point.y).abs() <= OCCUPANCY_THRESHOLD
        });
    }
}

/// 4-4-2 laid out on a portrait field, defending the bottom goal.
fn default_anchors() -> Vec<FormationAnchor> {
    let spots = [
        ("GK", 0.5, 0.9),
        ("LB", 0.17, 0.74),
        ("LCB", 0.38, 0.78),
        ("RCB", 0.62, 0.78),
        ("RB", 0.83, 0.74),
        ("LM", 0.15, 0.52),
        ("LCM", 0.4, 0.56),
        ("RCM", 0.6, 0.56),
        ("RM", 0.85, 0.52),
        ("LS", 0.4, 0.32),
        ("RS", 0.6, 0.32),
    ];
    spots
        .into_iter()
        .map(|(label, x, y)| FormationAnchor {
            point: RelPoint::new(x, y),
            label: label.to_string(),
        })
        .collect()
}

fn default_sub_slots() -> Vec<SubSlot> {
    (0..4)
        .map(|i| SubSlot {
            point: RelPoint::new(0.97, 0.15 + 0.12 * f64::from(i)),
            label: format!("S{}", i + 1),
        })
        .collect()
}

fn default_squad(anchors: &[FormationAnchor]) -> Vec<Player> {
    let names = [
        ("Maya Ortiz", "Maya", "#0ea5e9"),
        ("Lena Fischer", "Lena", "#7e22ce"),
        ("Sara Haddad", "Sara", "#7e22ce"),
        ("Ines Walker", "Ines", "#7e22ce"),
        ("Noa Berg", "Noa", "#7e22ce"),
        ("Julia Costa", "Jules", "#16a34a"),
        ("Emma Novak", "Emma", "#16a34a"),
        ("Aiko Tanaka", "Aiko", "#16a34a"),
        ("Zoe Martin", "Zoe", "#16a34a"),
        ("Ada Kowalski", "Ada", "#dc2626"),
        ("Mia Rossi", "Mia", "#dc2626"),
        ("Vera Lind", "Vera", "#64748b"),
        ("Pia Vogel", "Pia", "#64748b"),
        ("Tess Dubois", "Tess", "#64748b"),
    ];
    let mut players: Vec<Player> = names
        .into_iter()
        .enumerate()
        .map(|(i, (name, nickname, color))| Player {
            id: format!("p{}", i + 1),
            name: name.to_string(),
            nickname: Some(nickname.to_string()),
            position: anchors.get(i).map(|a| a.point),
            color: Some(color.to_string()),
            is_goalie: false,
        })
        .collect();
    recompute_goalies(&mut players, anchors);
    players
}

fn download_png(url: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Ok(element) = document.create_element("a") else {
        return;
    };
    let Ok(anchor) = element.dyn_into::<web_sys::HtmlAnchorElement>() else {
        return;
    };
    anchor.set_href(url);
    anchor.set_download("touchline-board.png");
    anchor.click();
}

#[component]
pub fn BoardPage() -> Element {
    let anchors = use_signal(default_anchors);
    let sub_slots = use_signal(default_sub_slots);
    let mut players = use_signal(|| default_squad(&default_anchors()));
    let mut opponents = use_signal(Vec::<Opponent>::new);
    let mut discs = use_signal(Vec::<TacticalDisc>::new);
    let mut drawings = use_signal(Vec::<Stroke>::new);
    let mut ball = use_signal(|| None::<RelPoint>);

    let tactics_view = use_signal(|| false);
    let drawing_enabled = use_signal(|| false);
    let show_names = use_signal(|| true);
    let game_type = use_signal(|| GameType::Soccer);
    let mut pending_placement = use_signal(|| None::<String>);
    let show_help = use_signal(|| false);

    let capture = move || BoardSnapshot {
        players: players.read().clone(),
        opponents: opponents.read().clone(),
        discs: discs.read().clone(),
        drawings: drawings.read().clone(),
        ball: *ball.read(),
    };

    // The last committed state; undo restores from here backwards.
    let mut committed = use_signal(capture);
    let mut undo_stack = use_signal(Vec::<BoardSnapshot>::new);
    let mut redo_stack = use_signal(Vec::<BoardSnapshot>::new);

    let mut restore = move |snapshot: &BoardSnapshot| {
        players.set(snapshot.players.clone());
        opponents.set(snapshot.opponents.clone());
        discs.set(snapshot.discs.clone());
        drawings.set(snapshot.drawings.clone());
        ball.set(snapshot.ball);
    };

    // Commit signal: record the state we are leaving behind, then advance.
    let mut commit = move || {
        let previous = committed.read().clone();
        push_undo(&mut undo_stack.write(), &mut redo_stack.write(), previous);
        committed.set(capture());
    };

    // Move-end flush for players also refreshes derived goalie flags.
    let mut commit_players = move || {
        recompute_goalies(&mut players.write(), &anchors.read());
        commit();
    };

    let can_undo = !undo_stack.read().is_empty();
    let can_redo = !redo_stack.read().is_empty();

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "Touchline" }
                ControlBar {
                    tactics_view,
                    drawing_enabled,
                    show_names,
                    game_type,
                    can_undo,
                    can_redo,
                    on_add_opponent: move |_| {
                        opponents.write().push(Opponent {
                            id: format!("opp-{}", uuid::Uuid::new_v4()),
                            position: RelPoint::new(0.5, 0.25),
                        });
                        commit();
                    },
                    on_add_disc: move |_| {
                        discs.write().push(TacticalDisc {
                            id: format!("disc-{}", uuid::Uuid::new_v4()),
                            position: RelPoint::new(0.5, 0.5),
                            disc_type: DiscType::Home,
                        });
                        commit();
                    },
                    on_place_ball: move |_| {
                        ball.set(Some(RelPoint::new(0.5, 0.5)));
                        commit();
                    },
                    on_clear_drawings: move |_| {
                        drawings.write().clear();
                        commit();
                    },
                    on_undo: move |_| {
                        let restored = undo_stack.write().pop();
                        if let Some(snapshot) = restored {
                            redo_stack.write().push(committed.read().clone());
                            restore(&snapshot);
                            committed.set(snapshot);
                        }
                    },
                    on_redo: move |_| {
                        let restored = redo_stack.write().pop();
                        if let Some(snapshot) = restored {
                            undo_stack.write().push(committed.read().clone());
                            restore(&snapshot);
                            committed.set(snapshot);
                        }
                    },
                    on_export: move |_| {
                        let players_v = players.read();
                        let opponents_v = opponents.read();
                        let discs_v = discs.read();
                        let drawings_v = drawings.read();
                        let anchors_v = anchors.read();
                        let sub_slots_v = sub_slots.read();
                        let scene = FieldScene {
                            players: &players_v,
                            opponents: &opponents_v,
                            discs: &discs_v,
                            drawings: &drawings_v,
                            ball: *ball.read(),
                            anchors: &anchors_v,
                            sub_slots: &sub_slots_v,
                            tactics_view: *tactics_view.read(),
                            show_names: *show_names.read(),
                            game_type: *game_type.read(),
                            selected_player: None,
                        };
                        match export_scene_data_url(&scene, EXPORT_SCALE) {
                            Some(url) => download_png(&url),
                            None => warn!("board export unavailable (no layout yet)"),
                        }
                    },
                    on_help: {
                        let mut show_help = show_help;
                        move |_| show_help.set(true)
                    },
                }
            }

            div { class: "board-area",
                FieldCanvas {
                    players,
                    opponents,
                    discs,
                    drawings,
                    ball,
                    anchors,
                    sub_slots,
                    tactics_view,
                    drawing_enabled,
                    show_names,
                    game_type,
                    pending_placement,
                    on_player_move: move |(id, rel): (String, RelPoint)| {
                        let mut list = players.write();
                        if let Some(player) = list.iter_mut().find(|p| p.id == id) {
                            player.position = Some(rel);
                        }
                    },
                    on_player_move_end: move |_id: String| commit_players(),
                    on_opponent_move: move |(id, rel): (String, RelPoint)| {
                        let mut list = opponents.write();
                        if let Some(opponent) = list.iter_mut().find(|o| o.id == id) {
                            opponent.position = rel;
                        }
                    },
                    on_opponent_move_end: move |_id: String| commit(),
                    on_disc_move: move |(id, rel): (String, RelPoint)| {
                        let mut list = discs.write();
                        if let Some(disc) = list.iter_mut().find(|d| d.id == id) {
                            disc.position = rel;
                        }
                    },
                    on_disc_move_end: move |_id: String| commit(),
                    on_ball_move: move |rel: RelPoint| ball.set(Some(rel)),
                    on_ball_move_end: move |_| commit(),
                    on_player_remove: move |id: String| {
                        // Back to the bench, not out of the roster.
                        {
                            let mut list = players.write();
                            if let Some(player) = list.iter_mut().find(|p| p.id == id) {
                                player.position = None;
                            }
                        }
                        commit_players();
                    },
                    on_opponent_remove: move |id: String| {
                        opponents.write().retain(|o| o.id != id);
                        commit();
                    },
                    on_disc_remove: move |id: String| {
                        discs.write().retain(|d| d.id != id);
                        commit();
                    },
                    on_disc_toggle_type: move |id: String| {
                        {
                            let mut list = discs.write();
                            if let Some(disc) = list.iter_mut().find(|d| d.id == id) {
                                disc.disc_type = DiscType::Goalie;
                            }
                        }
                        commit();
                    },
                    on_stroke_start: move |point: RelPoint| {
                        drawings.write().push(vec![point]);
                    },
                    on_stroke_point: move |point: RelPoint| {
                        if let Some(stroke) = drawings.write().last_mut() {
                            stroke.push(point);
                        }
                    },
                    on_stroke_end: move |_| commit(),
                    on_player_swap: move |(a, b): (String, String)| {
                        {
                            let mut list = players.write();
                            let pos_a = list.iter().find(|p| p.id == a).and_then(|p| p.position);
                            let pos_b = list.iter().find(|p| p.id == b).and_then(|p| p.position);
                            if let Some(player) = list.iter_mut().find(|p| p.id == a) {
                                player.position = pos_b;
                            }
                            if let Some(player) = list.iter_mut().find(|p| p.id == b) {
                                player.position = pos_a;
                            }
                        }
                        commit_players();
                    },
                    on_drop_external: move |(id, rel): (String, RelPoint)| {
                        {
                            let mut list = players.write();
                            if let Some(player) = list.iter_mut().find(|p| p.id == id) {
                                player.position = Some(rel);
                            }
                        }
                        pending_placement.set(None);
                        commit_players();
                    },
                }
            }

            RosterBar { players, pending_placement }
            HelpOverlay { show: show_help }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tag: f64) -> BoardSnapshot {
        BoardSnapshot {
            players: vec![],
            opponents: vec![],
            discs: vec![],
            drawings: vec![],
            ball: Some(RelPoint::new(tag, tag)),
        }
    }

    #[test]
    fn test_push_undo_clears_redo() {
        let mut undo = vec![];
        let mut redo = vec![snapshot(0.1)];
        push_undo(&mut undo, &mut redo, snapshot(0.2));
        assert_eq!(undo.len(), 1);
        assert!(redo.is_empty());
    }

    #[test]
    fn test_push_undo_dedupes_identical_state() {
        let mut undo = vec![];
        let mut redo = vec![];
        push_undo(&mut undo, &mut redo, snapshot(0.2));
        push_undo(&mut undo, &mut redo, snapshot(0.2));
        assert_eq!(undo.len(), 1);
    }

    #[test]
    fn test_push_undo_respects_limit() {
        let mut undo = vec![];
        let mut redo = vec![];
        for i in 0..(UNDO_LIMIT + 10) {
            push_undo(&mut undo, &mut redo, snapshot(i as f64));
        }
        assert_eq!(undo.len(), UNDO_LIMIT);
        // The oldest entries were dropped.
        assert_eq!(undo[0].ball, Some(RelPoint::new(10.0, 10.0)));
    }

    #[test]
    fn test_recompute_goalies_by_anchor() {
        let anchors = default_anchors();
        let gk_point = anchors[0].point;
        let mut players = vec![
            Player {
                id: "a".to_string(),
                name: "A".to_string(),
                nickname: None,
                position: Some(gk_point),
                color: None,
                is_goalie: false,
            },
            Player {
                id: "b".to_string(),
                name: "B".to_string(),
                nickname: None,
                position: Some(RelPoint::new(0.5, 0.5)),
                color: None,
                is_goalie: true,
            },
        ];
        recompute_goalies(&mut players, &anchors);
        assert!(players[0].is_goalie);
        assert!(!players[1].is_goalie);
    }

    #[test]
    fn test_default_squad_covers_formation() {
        let anchors = default_anchors();
        let squad = default_squad(&anchors);
        let placed = squad.iter().filter(|p| p.position.is_some()).count();
        assert_eq!(placed, anchors.len());
        assert_eq!(squad.iter().filter(|p| p.is_goalie).count(), 1);
        // Bench players exist for the roster bar flows.
        assert!(squad.iter().any(|p| p.position.is_none()));
    }

    #[test]
    fn test_default_sub_slots_sit_on_sideline() {
        for slot in default_sub_slots() {
            assert!(touchline_shared::geometry::is_sideline_x(slot.point.x));
        }
    }
}
