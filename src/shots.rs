use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::Pitch;
use crate::quality::{XgotPolicy, xg_from_distance};

/// One mined record mapped onto the canonical shape. Raw values are kept exactly as
/// found; absent keys are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalShotEvent {
    pub minute: Option<Value>,
    pub player: Option<Value>,
    pub team: Option<Value>,
    pub x_raw: Option<Value>,
    pub y_raw: Option<Value>,
    pub is_goal: bool,
    pub on_target: bool,
    pub raw: Value,
}

impl CanonicalShotEvent {
    pub fn team_label(&self) -> Option<String> {
        self.team.as_ref().and_then(value_label)
    }

    pub fn player_label(&self) -> Option<String> {
        self.player.as_ref().and_then(value_label)
    }

    pub fn minute_value(&self) -> Option<f64> {
        self.minute.as_ref().and_then(crate::geometry::numeric)
    }
}

/// A canonical event carried forward through geometry and quality scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotEvent {
    #[serde(flatten)]
    pub event: CanonicalShotEvent,
    pub x_m: Option<f64>,
    pub y_m: Option<f64>,
    pub dist_m: Option<f64>,
    pub xg: Option<f64>,
    pub xgot: Option<f64>,
}

impl ShotEvent {
    /// canonical -> geometric -> scored, in that order.
    pub fn enrich(event: CanonicalShotEvent, pitch: &Pitch, policy: XgotPolicy) -> Self {
        let (x_m, y_m) = pitch.to_meters(event.x_raw.as_ref(), event.y_raw.as_ref());
        let dist_m = pitch.distance(x_m, y_m);
        let xg = xg_from_distance(dist_m);
        let xgot = policy.xgot(xg, event.on_target, event.is_goal);
        Self {
            event,
            x_m,
            y_m,
            dist_m,
            xg,
            xgot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Location {
    Home,
    Away,
}

impl Location {
    pub fn label(self) -> &'static str {
        match self {
            Location::Home => "HOME",
            Location::Away => "AWAY",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of a match record to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Team,
    Opponent,
}

pub type StatMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// 1-based position in the input URL list.
    pub index: usize,
    pub url: String,
    pub team: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub location: Location,
    pub opponent: Option<String>,
    pub shots: Vec<ShotEvent>,
    #[serde(default)]
    pub opponent_shots: Vec<ShotEvent>,
    pub home_stats: Option<StatMap>,
    pub away_stats: Option<StatMap>,
}

impl MatchRecord {
    pub fn side(&self, side: Side) -> &[ShotEvent] {
        match side {
            Side::Team => &self.shots,
            Side::Opponent => &self.opponent_shots,
        }
    }

    /// Location from the point of view of `side`.
    pub fn location_for(&self, side: Side) -> Location {
        match (side, self.location) {
            (Side::Team, loc) => loc,
            (Side::Opponent, Location::Home) => Location::Away,
            (Side::Opponent, Location::Away) => Location::Home,
        }
    }
}

/// Identifier text for a team or player value: strings verbatim, numbers rendered,
/// objects by their `name` (or `shortName`), then their `id`, then their compact JSON.
pub fn value_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("shortName"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| match map.get("id") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            })
            .or_else(|| Some(value.to_string())),
        _ => None,
    }
}
