/// Hit-testing: classify a press position against the current entity set.
///
/// All tests are fixed-pixel-radius circle tests against the marker's draw
/// radius, so what you see is what you can grab.
use crate::geometry::{hit_circle, to_pixel};
use crate::models::{FormationAnchor, Opponent, Player, RelPoint, SubSlot, TacticalDisc};

/// Base marker radius in CSS pixels (players, and the ball's touch target).
pub const MARKER_RADIUS: f64 = 20.0;

/// Opponents and tactical discs render slightly smaller than players.
pub const SMALL_MARKER_RADIUS: f64 = MARKER_RADIUS * 0.9;

/// Per-axis relative-coordinate threshold for "this spot is taken".
pub const OCCUPANCY_THRESHOLD: f64 = 0.04;

/// What a press landed on, in classification priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum PressTarget {
    Ball,
    Disc(String),
    Player(String),
    Opponent(String),
    /// An unoccupied formation anchor or sub-slot, eligible as a
    /// tap-move destination for the currently selected player.
    FreeSlot(RelPoint),
    /// Background press in a state where freehand drawing may begin.
    Draw,
    None,
}

/// Flags that gate which entity kinds are interactive for this press.
#[derive(Debug, Clone, Copy)]
pub struct PressContext {
    pub tactics_view: bool,
    pub drawing_enabled: bool,
    /// A player is currently selected-for-swap, making empty formation
    /// slots valid tap-move targets.
    pub has_selection: bool,
}

pub fn player_at(players: &[Player], px: f64, py: f64, w: f64, h: f64) -> Option<&Player> {
    players.iter().find(|p| {
        p.position.is_some_and(|pos| {
            let (cx, cy) = to_pixel(pos, w, h);
            hit_circle(px, py, cx, cy, MARKER_RADIUS)
        })
    })
}

pub fn opponent_at(opponents: &[Opponent], px: f64, py: f64, w: f64, h: f64) -> Option<&Opponent> {
    opponents.iter().find(|o| {
        let (cx, cy) = to_pixel(o.position, w, h);
        hit_circle(px, py, cx, cy, SMALL_MARKER_RADIUS)
    })
}

pub fn disc_at(discs: &[TacticalDisc], px: f64, py: f64, w: f64, h: f64) -> Option<&TacticalDisc> {
    discs.iter().find(|d| {
        let (cx, cy) = to_pixel(d.position, w, h);
        hit_circle(px, py, cx, cy, SMALL_MARKER_RADIUS)
    })
}

pub fn ball_at(ball: Option<RelPoint>, px: f64, py: f64, w: f64, h: f64) -> bool {
    // Full base radius: a forgiving touch target for the smallest marker.
    ball.is_some_and(|b| {
        let (cx, cy) = to_pixel(b, w, h);
        hit_circle(px, py, cx, cy, MARKER_RADIUS)
    })
}

/// True when some placed player sits within `threshold` of `(x, y)` on
/// BOTH axes independently. One axis within range is not occupancy.
pub fn is_occupied(players: &[Player], x: f64, y: f64, threshold: f64) -> bool {
    players.iter().any(|p| {
        p.position
            .is_some_and(|pos| (pos.x - x).abs() <= threshold && (pos.y - y).abs() <= threshold)
    })
}

/// Find an unoccupied formation anchor or sub-slot under the press.
pub fn free_slot_at(
    anchors: &[FormationAnchor],
    sub_slots: &[SubSlot],
    players: &[Player],
    px: f64,
    py: f64,
    w: f64,
    h: f64,
) -> Option<RelPoint> {
    let points = anchors
        .iter()
        .map(|a| a.point)
        .chain(sub_slots.iter().map(|s| s.point));
    for point in points {
        let (cx, cy) = to_pixel(point, w, h);
        if hit_circle(px, py, cx, cy, MARKER_RADIUS)
            && !is_occupied(players, point.x, point.y, OCCUPANCY_THRESHOLD)
        {
            return Some(point);
        }
    }
    None
}

/// Classify a press at container pixel `(px, py)`. First match wins:
/// ball, tactical disc, player, opponent, free slot (selection pending),
/// freehand draw, background.
#[allow(clippy::too_many_arguments)]
pub fn classify_press(
    ctx: PressContext,
    players: &[Player],
    opponents: &[Opponent],
    discs: &[TacticalDisc],
    ball: Option<RelPoint>,
    anchors: &[FormationAnchor],
    sub_slots: &[SubSlot],
    px: f64,
    py: f64,
    w: f64,
    h: f64,
) -> PressTarget {
    if ctx.tactics_view {
        if ball_at(ball, px, py, w, h) {
            return PressTarget::Ball;
        }
        if let Some(d) = disc_at(discs, px, py, w, h) {
            return PressTarget::Disc(d.id.clone());
        }
    } else {
        if let Some(p) = player_at(players, px, py, w, h) {
            return PressTarget::Player(p.id.clone());
        }
        if let Some(o) = opponent_at(opponents, px, py, w, h) {
            return PressTarget::Opponent(o.id.clone());
        }
        if ctx.has_selection {
            if let Some(point) = free_slot_at(anchors, sub_slots, players, px, py, w, h) {
                return PressTarget::FreeSlot(point);
            }
        }
    }
    if ctx.drawing_enabled && ctx.tactics_view {
        return PressTarget::Draw;
    }
    PressTarget::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiscType;

    fn player(id: &str, x: f64, y: f64) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_string(),
            nickname: None,
            position: Some(RelPoint::new(x, y)),
            color: None,
            is_goalie: false,
        }
    }

    fn benched(id: &str) -> Player {
        Player {
            position: None,
            ..player(id, 0.0, 0.0)
        }
    }

    #[test]
    fn test_player_at_within_radius() {
        // (0.5, 0.5) on 300x300 = pixel (150, 150); radius 20
        let players = vec![player("a", 0.5, 0.5)];
        assert!(player_at(&players, 160.0, 150.0, 300.0, 300.0).is_some());
        assert!(player_at(&players, 171.0, 150.0, 300.0, 300.0).is_none());
    }

    #[test]
    fn test_player_at_ignores_benched() {
        let players = vec![benched("a")];
        assert!(player_at(&players, 0.0, 0.0, 300.0, 300.0).is_none());
    }

    #[test]
    fn test_opponent_uses_smaller_radius() {
        let opponents = vec![Opponent {
            id: "o1".to_string(),
            position: RelPoint::new(0.5, 0.5),
        }];
        // 18 px radius: 19 px off-center misses, 17 px hits
        assert!(opponent_at(&opponents, 167.0, 150.0, 300.0, 300.0).is_some());
        assert!(opponent_at(&opponents, 169.0, 150.0, 300.0, 300.0).is_none());
    }

    #[test]
    fn test_ball_uses_full_radius() {
        let ball = Some(RelPoint::new(0.5, 0.5));
        assert!(ball_at(ball, 169.0, 150.0, 300.0, 300.0));
        assert!(!ball_at(ball, 171.0, 150.0, 300.0, 300.0));
        assert!(!ball_at(None, 150.0, 150.0, 300.0, 300.0));
    }

    #[test]
    fn test_is_occupied_both_axes_required() {
        let players = vec![player("a", 0.5, 0.5)];
        assert!(is_occupied(&players, 0.52, 0.52, OCCUPANCY_THRESHOLD));
        // One axis inside, one outside: not occupied
        assert!(!is_occupied(&players, 0.52, 0.6, OCCUPANCY_THRESHOLD));
        assert!(!is_occupied(&players, 0.6, 0.52, OCCUPANCY_THRESHOLD));
    }

    #[test]
    fn test_is_occupied_threshold_boundary() {
        // 0.53125 - 0.5 = 0.03125: exactly representable, inside 0.04.
        let players = vec![player("a", 0.5, 0.5)];
        assert!(is_occupied(&players, 0.53125, 0.53125, OCCUPANCY_THRESHOLD));
        assert!(!is_occupied(&players, 0.545, 0.53125, OCCUPANCY_THRESHOLD));
    }

    #[test]
    fn test_classify_press_prefers_ball_over_disc() {
        let discs = vec![TacticalDisc {
            id: "d1".to_string(),
            position: RelPoint::new(0.5, 0.5),
            disc_type: DiscType::Home,
        }];
        let ctx = PressContext {
            tactics_view: true,
            drawing_enabled: false,
            has_selection: false,
        };
        let target = classify_press(
            ctx,
            &[],
            &[],
            &discs,
            Some(RelPoint::new(0.5, 0.5)),
            &[],
            &[],
            150.0,
            150.0,
            300.0,
            300.0,
        );
        assert_eq!(target, PressTarget::Ball);
    }

    #[test]
    fn test_classify_press_player_before_opponent() {
        let players = vec![player("p1", 0.5, 0.5)];
        let opponents = vec![Opponent {
            id: "o1".to_string(),
            position: RelPoint::new(0.5, 0.5),
        }];
        let ctx = PressContext {
            tactics_view: false,
            drawing_enabled: false,
            has_selection: false,
        };
        let target = classify_press(
            ctx, &players, &opponents, &[], None, &[], &[], 150.0, 150.0, 300.0, 300.0,
        );
        assert_eq!(target, PressTarget::Player("p1".to_string()));
    }

    #[test]
    fn test_classify_press_free_slot_requires_selection() {
        let anchors = vec![FormationAnchor {
            point: RelPoint::new(0.5, 0.5),
            label: "CM".to_string(),
        }];
        let base = PressContext {
            tactics_view: false,
            drawing_enabled: false,
            has_selection: false,
        };
        let miss = classify_press(
            base, &[], &[], &[], None, &anchors, &[], 150.0, 150.0, 300.0, 300.0,
        );
        assert_eq!(miss, PressTarget::None);

        let with_sel = PressContext {
            has_selection: true,
            ..base
        };
        let hit = classify_press(
            with_sel, &[], &[], &[], None, &anchors, &[], 150.0, 150.0, 300.0, 300.0,
        );
        assert_eq!(hit, PressTarget::FreeSlot(RelPoint::new(0.5, 0.5)));
    }

    #[test]
    fn test_classify_press_occupied_slot_not_free() {
        let anchors = vec![FormationAnchor {
            point: RelPoint::new(0.5, 0.5),
            label: "CM".to_string(),
        }];
        // Occupant sits 0.02 rel away: within the occupancy threshold but
        // outside the press radius, so the press still reaches the anchor.
        let players = vec![player("other", 0.52, 0.48)];
        let ctx = PressContext {
            tactics_view: false,
            drawing_enabled: false,
            has_selection: true,
        };
        let target = classify_press(
            ctx, &players, &[], &[], None, &anchors, &[], 150.0, 150.0, 300.0, 300.0,
        );
        // Falls through slot matching; 0.52/0.48 is ~8px from the press,
        // which is a player hit instead.
        assert_ne!(target, PressTarget::FreeSlot(RelPoint::new(0.5, 0.5)));
    }

    #[test]
    fn test_classify_press_draw_requires_both_flags() {
        let drawing_only = PressContext {
            tactics_view: false,
            drawing_enabled: true,
            has_selection: false,
        };
        let both = PressContext {
            tactics_view: true,
            drawing_enabled: true,
            has_selection: false,
        };
        let t1 = classify_press(
            drawing_only,
            &[],
            &[],
            &[],
            None,
            &[],
            &[],
            10.0,
            10.0,
            300.0,
            300.0,
        );
        let t2 = classify_press(
            both,
            &[],
            &[],
            &[],
            None,
            &[],
            &[],
            10.0,
            10.0,
            300.0,
            300.0,
        );
        assert_eq!(t1, PressTarget::None);
        assert_eq!(t2, PressTarget::Draw);
    }
}
