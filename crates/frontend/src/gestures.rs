//! Gesture bookkeeping for the field canvas.
//!
//! The state here is ephemeral and owned entirely by the canvas component;
//! it never touches the entity lists. Keeping it as a plain struct (rather
//! than a pile of individual signals) makes the tap/drag/double-tap rules
//! testable without a browser.

use touchline_shared::models::RelPoint;

/// Two activations of the same logical target within this window count as
/// a double-activation.
pub const DOUBLE_TAP_MS: f64 = 300.0;

/// ... and within this pixel distance of each other.
pub const DOUBLE_TAP_DISTANCE_PX: f64 = 15.0;

/// A touch that starts on a player only becomes a drag once cumulative
/// movement exceeds this many pixels (compared squared, no sqrt).
pub const TOUCH_DRAG_THRESHOLD_PX: f64 = 10.0;

/// Which entity a drag is moving. At most one drag exists at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum DragKind {
    Player(String),
    Opponent(String),
    Disc(String),
    Ball,
}

/// Logical identity of a tap target, for double-tap matching.
#[derive(Debug, Clone, PartialEq)]
pub enum TapTargetId {
    Player(String),
    Opponent(String),
    Disc(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TapRecord {
    pub at_ms: f64,
    pub x: f64,
    pub y: f64,
    pub target: TapTargetId,
}

/// A touch that began on a player and is still eligible to resolve as a
/// tap; it promotes to a drag once movement passes the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmedDrag {
    pub player_id: String,
    pub start_x: f64,
    pub start_y: f64,
}

/// End callbacks owed by a finished gesture. [`GestureState::finish`]
/// drains the state, so each begun drag/stroke yields its end exactly
/// once no matter which terminal event (up, leave, cancel, mode toggle)
/// arrives first — or how many arrive.
#[derive(Debug, Clone, PartialEq)]
pub enum EndEvent {
    PlayerMoveEnd(String),
    OpponentMoveEnd(String),
    DiscMoveEnd(String),
    BallMoveEnd,
    StrokeEnd,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureState {
    pub drag: Option<DragKind>,
    /// Identifier of the touch driving the current gesture. Events from
    /// other touch points are ignored until this gesture ends.
    pub touch_id: Option<i32>,
    pub last_tap: Option<TapRecord>,
    /// Player selected by a tap, awaiting a second tap (swap target or
    /// empty slot) to act on.
    pub selected_player: Option<String>,
    /// Empty formation/sub slot recorded at press time; consumed on
    /// release as a tap-move destination.
    pub pending_slot: Option<RelPoint>,
    pub stroke_active: bool,
    pub armed: Option<ArmedDrag>,
    /// Last position forwarded for the dragged player; the snap algorithm
    /// measures from here on release.
    pub last_drag_pos: Option<RelPoint>,
}

impl GestureState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Would a press on `target` at `(x, y)` complete a double-activation?
    pub fn is_double_tap(&self, target: &TapTargetId, x: f64, y: f64, now_ms: f64) -> bool {
        let Some(last) = &self.last_tap else {
            return false;
        };
        if last.target != *target {
            return false;
        }
        if now_ms - last.at_ms > DOUBLE_TAP_MS {
            return false;
        }
        let dx = x - last.x;
        let dy = y - last.y;
        dx * dx + dy * dy <= DOUBLE_TAP_DISTANCE_PX * DOUBLE_TAP_DISTANCE_PX
    }

    pub fn record_tap(&mut self, target: TapTargetId, x: f64, y: f64, now_ms: f64) {
        self.last_tap = Some(TapRecord {
            at_ms: now_ms,
            x,
            y,
            target,
        });
    }

    /// Forget the tap history, so a triple tap doesn't fire twice.
    pub fn consume_tap(&mut self) {
        self.last_tap = None;
    }

    pub fn arm_player_drag(&mut self, player_id: String, x: f64, y: f64) {
        self.armed = Some(ArmedDrag {
            player_id,
            start_x: x,
            start_y: y,
        });
    }

    /// True once the armed touch has moved far enough to become a drag.
    pub fn should_promote(&self, x: f64, y: f64) -> bool {
        self.armed.as_ref().is_some_and(|a| {
            let dx = x - a.start_x;
            let dy = y - a.start_y;
            dx * dx + dy * dy > TOUCH_DRAG_THRESHOLD_PX * TOUCH_DRAG_THRESHOLD_PX
        })
    }

    /// Terminate the current gesture, returning the end callbacks to fire.
    /// Selection and tap history survive (they span gestures); everything
    /// else is reset.
    pub fn finish(&mut self) -> Vec<EndEvent> {
        let mut events = Vec::new();
        match self.drag.take() {
            Some(DragKind::Player(id)) => events.push(EndEvent::PlayerMoveEnd(id)),
            Some(DragKind::Opponent(id)) => events.push(EndEvent::OpponentMoveEnd(id)),
            Some(DragKind::Disc(id)) => events.push(EndEvent::DiscMoveEnd(id)),
            Some(DragKind::Ball) => events.push(EndEvent::BallMoveEnd),
            None => {}
        }
        if self.stroke_active {
            self.stroke_active = false;
            events.push(EndEvent::StrokeEnd);
        }
        self.armed = None;
        self.touch_id = None;
        self.pending_slot = None;
        self.last_drag_pos = None;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_tap(id: &str) -> TapTargetId {
        TapTargetId::Player(id.to_string())
    }

    #[test]
    fn test_double_tap_within_window() {
        let mut g = GestureState::new();
        g.record_tap(player_tap("p1"), 100.0, 100.0, 1000.0);
        // 250 ms later, 6 px away (within 10 px): double tap
        assert!(g.is_double_tap(&player_tap("p1"), 106.0, 100.0, 1250.0));
    }

    #[test]
    fn test_double_tap_too_slow() {
        let mut g = GestureState::new();
        g.record_tap(player_tap("p1"), 100.0, 100.0, 1000.0);
        assert!(!g.is_double_tap(&player_tap("p1"), 100.0, 100.0, 1350.0));
    }

    #[test]
    fn test_double_tap_too_far() {
        let mut g = GestureState::new();
        g.record_tap(player_tap("p1"), 100.0, 100.0, 1000.0);
        // 16 px away exceeds the 15 px window
        assert!(!g.is_double_tap(&player_tap("p1"), 116.0, 100.0, 1100.0));
    }

    #[test]
    fn test_double_tap_requires_same_target() {
        let mut g = GestureState::new();
        g.record_tap(player_tap("p1"), 100.0, 100.0, 1000.0);
        assert!(!g.is_double_tap(&player_tap("p2"), 100.0, 100.0, 1100.0));
        assert!(!g.is_double_tap(
            &TapTargetId::Opponent("p1".to_string()),
            100.0,
            100.0,
            1100.0
        ));
    }

    #[test]
    fn test_drag_promotion_threshold_is_strict() {
        let mut g = GestureState::new();
        g.arm_player_drag("p1".to_string(), 50.0, 50.0);
        // Exactly 10 px: still a tap candidate
        assert!(!g.should_promote(60.0, 50.0));
        // Just past: drag
        assert!(g.should_promote(60.1, 50.0));
        // Diagonal shorter than 10 px: still a tap
        assert!(!g.should_promote(56.0, 56.0));
    }

    #[test]
    fn test_should_promote_without_arming() {
        let g = GestureState::new();
        assert!(!g.should_promote(500.0, 500.0));
    }

    #[test]
    fn test_finish_emits_each_end_exactly_once() {
        let mut g = GestureState::new();
        g.drag = Some(DragKind::Player("p1".to_string()));
        g.stroke_active = true;
        g.touch_id = Some(3);

        let first = g.finish();
        assert_eq!(
            first,
            vec![
                EndEvent::PlayerMoveEnd("p1".to_string()),
                EndEvent::StrokeEnd
            ]
        );
        // A second terminal event (e.g. mouseleave after mouseup) owes nothing.
        assert!(g.finish().is_empty());
        assert!(g.touch_id.is_none());
    }

    #[test]
    fn test_finish_preserves_selection_and_tap_history() {
        let mut g = GestureState::new();
        g.selected_player = Some("p1".to_string());
        g.record_tap(player_tap("p1"), 10.0, 10.0, 500.0);
        g.drag = Some(DragKind::Ball);

        let events = g.finish();
        assert_eq!(events, vec![EndEvent::BallMoveEnd]);
        assert_eq!(g.selected_player.as_deref(), Some("p1"));
        assert!(g.last_tap.is_some());
    }

    #[test]
    fn test_finish_clears_armed_without_end_event() {
        let mut g = GestureState::new();
        g.arm_player_drag("p1".to_string(), 0.0, 0.0);
        // Never promoted: no drag began, so no move-end is owed.
        assert!(g.finish().is_empty());
        assert!(g.armed.is_none());
    }
}
