use serde_json::{Map, Value};

/// Decides which collections and records look like shot data.
pub trait CandidateFilter {
    fn key_matches(&self, key: &str) -> bool;
    fn record_matches(&self, record: &Map<String, Value>) -> bool;
}

/// Name + content heuristic tuned for recall; false positives are dropped later by
/// team matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShotHeuristic;

const MARKER_TOKENS: &[&str] = &["x", "y", "isgoal", "shot", "xpercent", "ypercent"];

impl CandidateFilter for ShotHeuristic {
    fn key_matches(&self, key: &str) -> bool {
        let lowered = key.to_lowercase();
        lowered.contains("shot") || lowered == "shots" || lowered.contains("events")
    }

    fn record_matches(&self, record: &Map<String, Value>) -> bool {
        let serialized = serde_json::to_string(record)
            .unwrap_or_default()
            .to_lowercase();
        MARKER_TOKENS.iter().any(|token| serialized.contains(token))
    }
}

pub fn mine(payload: &Value) -> Vec<&Value> {
    mine_with(payload, &ShotHeuristic)
}

pub fn mine_with<'a, F: CandidateFilter + ?Sized>(
    payload: &'a Value,
    filter: &F,
) -> Vec<&'a Value> {
    let mut out = Vec::new();
    walk(payload, filter, &mut out);
    out
}

fn walk<'a, F: CandidateFilter + ?Sized>(node: &'a Value, filter: &F, out: &mut Vec<&'a Value>) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Array(items) if filter.key_matches(key) => {
                        for item in items {
                            if let Value::Object(record) = item {
                                if filter.record_matches(record) {
                                    out.push(item);
                                }
                            }
                        }
                    }
                    _ => walk(value, filter, out),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, filter, out);
            }
        }
        _ => {}
    }
}
