use rayon::prelude::*;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::ExtractError;
use crate::fetch::DocumentFetcher;
use crate::geometry::Pitch;
use crate::mine::mine;
use crate::normalize::normalize;
use crate::quality::XgotPolicy;
use crate::shots::{CanonicalShotEvent, Location, MatchRecord, ShotEvent, StatMap};

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub pitch: Pitch,
    pub xgot_policy: XgotPolicy,
    pub include_opponent: bool,
}

impl ExtractOptions {
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self {
            pitch: cfg.pitch,
            xgot_policy: cfg.xgot_policy,
            include_opponent: cfg.include_opponent,
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

/// Home/away names as published by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchTeams {
    pub home: Option<String>,
    pub away: Option<String>,
}

impl MatchTeams {
    /// Exact name equality only.
    pub fn location_of(&self, team: &str) -> Location {
        if self.home.as_deref() == Some(team) {
            Location::Home
        } else {
            Location::Away
        }
    }

    pub fn opponent_of(&self, location: Location) -> Option<String> {
        match location {
            Location::Home => self.away.clone(),
            Location::Away => self.home.clone(),
        }
    }
}

#[derive(Debug)]
pub struct MatchOutcome {
    pub index: usize,
    pub url: String,
    pub result: Result<MatchRecord, ExtractError>,
}

pub struct MatchExtractor {
    fetcher: DocumentFetcher,
    options: ExtractOptions,
}

impl MatchExtractor {
    pub fn new(fetcher: DocumentFetcher, options: ExtractOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn extract(
        &self,
        index: usize,
        url: &str,
        team: &str,
    ) -> Result<MatchRecord, ExtractError> {
        let located = self.fetcher.fetch_payload(url)?;
        build_match_record(index, url, team, &located.payload, &self.options)
    }

    fn extract_outcome(&self, index: usize, total: usize, url: &str, team: &str) -> MatchOutcome {
        info!("processing match {index}/{total}: {url}");
        let result = self.extract(index, url, team);
        match &result {
            Ok(record) => info!(
                url,
                shots = record.shots.len(),
                location = %record.location,
                "match extracted"
            ),
            Err(err) => warn!(url, kind = err.kind(), "skipping match: {err}"),
        }
        MatchOutcome {
            index,
            url: url.to_string(),
            result,
        }
    }
}

/// Runs every URL through the extractor. Outcomes come back in input order whatever
/// the parallelism.
pub fn extract_all(
    extractor: &MatchExtractor,
    urls: &[String],
    team: &str,
    parallelism: usize,
) -> Vec<MatchOutcome> {
    let total = urls.len();
    if parallelism > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(parallelism).build() {
            Ok(pool) => {
                return pool.install(|| {
                    urls.par_iter()
                        .enumerate()
                        .map(|(pos, url)| extractor.extract_outcome(pos + 1, total, url, team))
                        .collect()
                });
            }
            Err(err) => warn!("fetch pool unavailable, running sequentially: {err}"),
        }
    }
    urls.iter()
        .enumerate()
        .map(|(pos, url)| extractor.extract_outcome(pos + 1, total, url, team))
        .collect()
}

/// Everything after the payload is in hand: mine, normalize, split by team, enrich.
pub fn build_match_record(
    index: usize,
    url: &str,
    team: &str,
    payload: &Value,
    options: &ExtractOptions,
) -> Result<MatchRecord, ExtractError> {
    let teams = resolve_teams(payload);
    let location = teams.location_of(team);
    let opponent = teams.opponent_of(location);

    let events: Vec<CanonicalShotEvent> = mine(payload).into_iter().map(normalize).collect();
    let (own, against) = partition_by_team(events, team, opponent.as_deref());
    if own.is_empty() {
        return Err(ExtractError::NoTeamShots {
            url: url.to_string(),
            team: team.to_string(),
        });
    }

    let enrich = |event: CanonicalShotEvent| {
        ShotEvent::enrich(event, &options.pitch, options.xgot_policy)
    };
    let shots = own.into_iter().map(enrich).collect();
    let opponent_shots = if options.include_opponent {
        against.into_iter().map(enrich).collect()
    } else {
        Vec::new()
    };

    let (home_stats, away_stats) = resolve_stats(payload);

    Ok(MatchRecord {
        index,
        url: url.to_string(),
        team: team.to_string(),
        home_team: teams.home,
        away_team: teams.away,
        location,
        opponent,
        shots,
        opponent_shots,
        home_stats,
        away_stats,
    })
}

/// Target-team events first, resolved-opponent events second; anything else is
/// treated as a mining false positive and dropped.
pub fn partition_by_team(
    events: Vec<CanonicalShotEvent>,
    team: &str,
    opponent: Option<&str>,
) -> (Vec<CanonicalShotEvent>, Vec<CanonicalShotEvent>) {
    let mut own = Vec::new();
    let mut against = Vec::new();
    for event in events {
        let Some(label) = event.team_label() else {
            continue;
        };
        if label == team {
            own.push(event);
        } else if opponent.is_some_and(|name| name == label) {
            against.push(event);
        }
    }
    (own, against)
}

fn match_block(payload: &Value) -> &Value {
    payload
        .get("events")
        .filter(|v| v.is_object())
        .unwrap_or(payload)
}

pub fn resolve_teams(payload: &Value) -> MatchTeams {
    let block = match_block(payload);
    MatchTeams {
        home: pick_team_name(block, &["homeTeam", "home"]),
        away: pick_team_name(block, &["awayTeam", "away"]),
    }
}

fn pick_team_name(block: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match block.get(*key)? {
        Value::Object(team) => team.get("name").and_then(Value::as_str).map(str::to_string),
        Value::String(name) => Some(name.clone()),
        _ => None,
    })
}

pub fn resolve_stats(payload: &Value) -> (Option<StatMap>, Option<StatMap>) {
    let block = match_block(payload);
    let nested = block.get("statistics").filter(|v| v.is_object());
    let side = |key: &str, fallback: &str| {
        nested
            .and_then(|stats| stats.get(key))
            .or_else(|| block.get(fallback))
            .filter(|v| !v.is_null())
            .map(flatten_stats)
    };
    (
        side("home", "homeStatistics"),
        side("away", "awayStatistics"),
    )
}

/// Dotted-path view of a statistics block. Array items named by a `name` field use
/// that name as their path segment.
pub fn flatten_stats(value: &Value) -> StatMap {
    let mut out = StatMap::new();
    flatten_into(value, String::new(), &mut out);
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut StatMap) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child, join_path(&prefix, key), out);
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                match item.get("name").and_then(Value::as_str) {
                    Some(name) => {
                        let path = join_path(&prefix, name);
                        if let Value::Object(map) = item {
                            for (key, child) in map.iter().filter(|(k, _)| k.as_str() != "name") {
                                flatten_into(child, join_path(&path, key), out);
                            }
                        }
                    }
                    None => flatten_into(item, join_path(&prefix, &idx.to_string()), out),
                }
            }
        }
        scalar => {
            let key = if prefix.is_empty() {
                "value".to_string()
            } else {
                prefix
            };
            out.insert(key, scalar.clone());
        }
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}
