/// Formation snapping: on releasing a dragged player, relocate it to the
/// nearest formation anchor when the drop lands close enough, so manual
/// placement doesn't demand pixel precision.
use crate::geometry::{hit_circle, rel_dist_sq_px, to_pixel};
use crate::hit::MARKER_RADIUS;
use crate::models::{FormationAnchor, Player, RelPoint};

/// Maximum Euclidean pixel distance between the drop point and an anchor
/// for the snap to engage. Exactly at the threshold still snaps.
pub const SNAP_DISTANCE_PX: f64 = 36.0;

/// Nearest unoccupied anchor within [`SNAP_DISTANCE_PX`] of `last_pos`,
/// or `None` when the player should stay exactly where released.
///
/// Distances are computed per axis in pixels (relative delta times the
/// surface dimension) and compared squared. Ties keep the first anchor
/// encountered; anchors are never coincident in practice.
///
/// The occupancy guard rejects an anchor when a *different* player sits
/// within the marker hit radius of it. The dragged player never blocks
/// itself, so nudging a player already on its anchor re-snaps cleanly.
pub fn snap_to_anchor(
    anchors: &[FormationAnchor],
    last_pos: RelPoint,
    players: &[Player],
    dragged_id: &str,
    width: f64,
    height: f64,
) -> Option<RelPoint> {
    let mut best: Option<(&FormationAnchor, f64)> = None;
    for anchor in anchors {
        let d = rel_dist_sq_px(anchor.point, last_pos, width, height);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((anchor, d));
        }
    }
    let (anchor, d) = best?;
    if d > SNAP_DISTANCE_PX * SNAP_DISTANCE_PX {
        return None;
    }

    let (ax, ay) = to_pixel(anchor.point, width, height);
    let occupied = players.iter().any(|p| {
        p.id != dragged_id
            && p.position.is_some_and(|pos| {
                let (px, py) = to_pixel(pos, width, height);
                hit_circle(px, py, ax, ay, MARKER_RADIUS)
            })
    });
    if occupied {
        return None;
    }
    Some(anchor.point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(x: f64, y: f64) -> FormationAnchor {
        FormationAnchor {
            point: RelPoint::new(x, y),
            label: "CM".to_string(),
        }
    }

    fn placed(id: &str, x: f64, y: f64) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_string(),
            nickname: None,
            position: Some(RelPoint::new(x, y)),
            color: None,
            is_goalie: false,
        }
    }

    #[test]
    fn test_snap_scenario_near_anchor() {
        // Anchor (0.5, 0.75) on 300x300 = pixel (150, 225); release at
        // pixel (151, 226) -> rel (0.50333.., 0.75333..): within 36 px.
        let anchors = vec![anchor(0.5, 0.75)];
        let release = RelPoint::new(151.0 / 300.0, 226.0 / 300.0);
        let snapped = snap_to_anchor(&anchors, release, &[], "p1", 300.0, 300.0);
        assert_eq!(snapped, Some(RelPoint::new(0.5, 0.75)));
    }

    #[test]
    fn test_snap_threshold_boundary() {
        let anchors = vec![anchor(0.5, 0.5)];
        // On a 288 px surface, 0.125 rel is exactly 36 px: snaps.
        let at = RelPoint::new(0.625, 0.5);
        assert!(snap_to_anchor(&anchors, at, &[], "p1", 288.0, 288.0).is_some());
        // Just beyond: stays where released.
        let beyond = RelPoint::new(0.63, 0.5);
        assert!(snap_to_anchor(&anchors, beyond, &[], "p1", 288.0, 288.0).is_none());
    }

    #[test]
    fn test_snap_blocked_by_other_occupant() {
        let anchors = vec![anchor(0.5, 0.5)];
        // Other player sits 6 px from the anchor: inside the hit radius.
        let others = vec![placed("p2", 0.52, 0.5)];
        let release = RelPoint::new(0.51, 0.5);
        assert!(snap_to_anchor(&anchors, release, &others, "p1", 300.0, 300.0).is_none());
    }

    #[test]
    fn test_snap_not_blocked_by_self() {
        let anchors = vec![anchor(0.5, 0.5)];
        let me = vec![placed("p1", 0.5, 0.5)];
        let release = RelPoint::new(0.51, 0.5);
        let snapped = snap_to_anchor(&anchors, release, &me, "p1", 300.0, 300.0);
        assert_eq!(snapped, Some(RelPoint::new(0.5, 0.5)));
    }

    #[test]
    fn test_snap_picks_nearest_anchor() {
        let anchors = vec![anchor(0.5, 0.5), anchor(0.55, 0.5)];
        // Release closer to the second anchor.
        let release = RelPoint::new(0.56, 0.5);
        let snapped = snap_to_anchor(&anchors, release, &[], "p1", 300.0, 300.0);
        assert_eq!(snapped, Some(RelPoint::new(0.55, 0.5)));
    }

    #[test]
    fn test_snap_empty_anchor_list() {
        assert!(snap_to_anchor(&[], RelPoint::new(0.5, 0.5), &[], "p1", 300.0, 300.0).is_none());
    }

    #[test]
    fn test_snap_benched_player_does_not_block() {
        let anchors = vec![anchor(0.5, 0.5)];
        let bench = vec![Player {
            position: None,
            ..placed("p2", 0.0, 0.0)
        }];
        let release = RelPoint::new(0.5, 0.5);
        assert!(snap_to_anchor(&anchors, release, &bench, "p1", 300.0, 300.0).is_some());
    }
}
