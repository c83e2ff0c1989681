use serde::{Deserialize, Serialize};

/// A point in relative field coordinates: both axes in `[0, 1]`,
/// origin top-left, independent of the rendering surface's pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelPoint {
    pub x: f64,
    pub y: f64,
}

impl RelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers (NaN/Inf poison canvas paths).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One continuous freehand stroke. The drawing layer is a `Vec<Stroke>`;
/// insertion order is z-order, earliest first.
pub type Stroke = Vec<RelPoint>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    /// On-field position. `None` = benched/off-field. Either fully set or
    /// fully absent — there is no partially-placed player.
    pub position: Option<RelPoint>,
    pub color: Option<String>,
    pub is_goalie: bool,
}

impl Player {
    /// Preferred short label for on-disc rendering.
    pub fn display_label(&self) -> &str {
        match &self.nickname {
            Some(n) if !n.is_empty() => n,
            _ => &self.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opponent {
    pub id: String,
    pub position: RelPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscType {
    Home,
    Opponent,
    Goalie,
}

impl std::fmt::Display for DiscType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscType::Home => write!(f, "Home"),
            DiscType::Opponent => write!(f, "Opponent"),
            DiscType::Goalie => write!(f, "Goalie"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TacticalDisc {
    pub id: String,
    pub position: RelPoint,
    pub disc_type: DiscType,
}

/// A valid on-field position for the active formation. The label is the
/// position abbreviation ("GK", "LB", "ST", ...); the goalkeeper slot is
/// the anchor labelled "GK".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormationAnchor {
    pub point: RelPoint,
    pub label: String,
}

impl FormationAnchor {
    pub fn is_goalkeeper(&self) -> bool {
        self.label == "GK"
    }
}

/// A labelled bench/substitute slot on the sideline strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSlot {
    pub point: RelPoint,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameType {
    Soccer,
    Futsal,
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameType::Soccer => write!(f, "Soccer"),
            GameType::Futsal => write!(f, "Futsal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_point_finite() {
        assert!(RelPoint::new(0.5, 0.5).is_finite());
        assert!(!RelPoint::new(f64::NAN, 0.5).is_finite());
        assert!(!RelPoint::new(0.5, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_player_display_label_prefers_nickname() {
        let p = Player {
            id: "p1".to_string(),
            name: "Alexandra Meyer".to_string(),
            nickname: Some("Alex".to_string()),
            position: None,
            color: None,
            is_goalie: false,
        };
        assert_eq!(p.display_label(), "Alex");
    }

    #[test]
    fn test_player_display_label_empty_nickname_falls_back() {
        let p = Player {
            id: "p1".to_string(),
            name: "Alexandra Meyer".to_string(),
            nickname: Some(String::new()),
            position: None,
            color: None,
            is_goalie: false,
        };
        assert_eq!(p.display_label(), "Alexandra Meyer");
    }

    #[test]
    fn test_player_deserializes_without_position() {
        let json = r##"{"id":"p1","name":"Sam","nickname":null,"position":null,"color":"#7e22ce","isGoalie":false}"##;
        let p: Player = serde_json::from_str(json).unwrap();
        assert!(p.position.is_none());
        assert_eq!(p.color.as_deref(), Some("#7e22ce"));
    }

    #[test]
    fn test_player_position_round_trips() {
        let p = Player {
            id: "p2".to_string(),
            name: "Kim".to_string(),
            nickname: None,
            position: Some(RelPoint::new(0.25, 0.75)),
            color: None,
            is_goalie: true,
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: Player = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_disc_type_serializes_camel_case() {
        let d = TacticalDisc {
            id: "d1".to_string(),
            position: RelPoint::new(0.5, 0.5),
            disc_type: DiscType::Goalie,
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["discType"], "goalie");
    }

    #[test]
    fn test_formation_anchor_goalkeeper() {
        let gk = FormationAnchor {
            point: RelPoint::new(0.5, 0.95),
            label: "GK".to_string(),
        };
        let lb = FormationAnchor {
            point: RelPoint::new(0.2, 0.75),
            label: "LB".to_string(),
        };
        assert!(gk.is_goalkeeper());
        assert!(!lb.is_goalkeeper());
    }

    #[test]
    fn test_game_type_display() {
        assert_eq!(GameType::Soccer.to_string(), "Soccer");
        assert_eq!(GameType::Futsal.to_string(), "Futsal");
    }
}
