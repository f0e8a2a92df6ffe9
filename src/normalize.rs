use serde_json::{Map, Value};

use crate::shots::CanonicalShotEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Minute,
    Player,
    Team,
    X,
    Y,
}

/// Accepted source spellings per canonical field, in priority order.
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (
        Field::Minute,
        &["minute", "time", "min", "matchMinute", "minuteInMatch"],
    ),
    (
        Field::Player,
        &["player", "playerName", "player_name", "playerId", "player_id"],
    ),
    (Field::Team, &["team", "side", "teamId", "teamName"]),
    (
        Field::X,
        &["x", "xCoord", "xPosition", "xPercent", "percentX", "posX"],
    ),
    (
        Field::Y,
        &["y", "yCoord", "yPosition", "yPercent", "percentY", "posY"],
    ),
];

const GOAL_KEYS: &[&str] = &["isGoal", "goal", "is_goal"];
const ON_TARGET_KEY: &str = "onTarget";

pub fn aliases(field: Field) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[])
}

/// Maps any record onto the canonical shape. Never fails; a non-object record yields
/// an event with every optional field empty.
pub fn normalize(record: &Value) -> CanonicalShotEvent {
    let empty = Map::new();
    let map = record.as_object().unwrap_or(&empty);

    CanonicalShotEvent {
        minute: pick_first(map, aliases(Field::Minute)),
        player: pick_first(map, aliases(Field::Player)),
        team: pick_first(map, aliases(Field::Team)),
        x_raw: pick_first(map, aliases(Field::X)),
        y_raw: pick_first(map, aliases(Field::Y)),
        is_goal: GOAL_KEYS
            .iter()
            .any(|key| map.get(*key).is_some_and(is_truthy)),
        on_target: map.get(ON_TARGET_KEY).is_some_and(is_truthy),
        raw: record.clone(),
    }
}

/// First present key wins, even when it holds `null`.
fn pick_first(map: &Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .find_map(|key| map.get(*key))
        .filter(|v| !v.is_null())
        .cloned()
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
