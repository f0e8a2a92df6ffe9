//! Shot table handed to manual reviewers, plus an explicit cursor over it.
//!
//! Reviewers may flip `is_goal` and re-place a shot (`x`, `y` in metres); both edits
//! re-score the row with the same distance model used during extraction.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::Pitch;
use crate::quality::{XgotPolicy, xg_from_distance};
use crate::shots::{MatchRecord, ShotEvent, value_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotResult {
    Goal,
    OnTarget,
    OffTarget,
}

impl ShotResult {
    fn on_frame(self) -> bool {
        matches!(self, ShotResult::Goal | ShotResult::OnTarget)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub player_id: Option<String>,
    pub player_name: Option<String>,
    pub team: Option<String>,
    pub minute: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub xg: Option<f64>,
    pub xgot: Option<f64>,
    pub result: ShotResult,
    pub is_goal: bool,
}

impl ReviewRow {
    pub fn from_shot(shot: &ShotEvent) -> Self {
        let event = &shot.event;
        let result = if event.is_goal {
            ShotResult::Goal
        } else if event.on_target {
            ShotResult::OnTarget
        } else {
            ShotResult::OffTarget
        };
        Self {
            player_id: player_id(shot),
            player_name: player_name(shot),
            team: event.team_label(),
            minute: event.minute_value(),
            x: shot.x_m,
            y: shot.y_m,
            xg: shot.xg,
            xgot: shot.xgot,
            result,
            is_goal: event.is_goal,
        }
    }

    fn rescore(&mut self, pitch: &Pitch, policy: XgotPolicy) {
        self.xg = xg_from_distance(pitch.distance(self.x, self.y));
        self.xgot = policy.xgot(self.xg, self.result.on_frame(), self.is_goal);
    }
}

fn raw_label(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| raw.get(*key).and_then(value_label))
}

fn player_id(shot: &ShotEvent) -> Option<String> {
    raw_label(&shot.event.raw, &["playerId", "player_id"]).or_else(|| match &shot.event.player {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Object(map)) => map.get("id").and_then(value_label),
        _ => None,
    })
}

fn player_name(shot: &ShotEvent) -> Option<String> {
    raw_label(&shot.event.raw, &["playerName", "player_name"]).or_else(|| match &shot.event.player {
        Some(Value::String(name)) => Some(name.clone()),
        Some(Value::Object(map)) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

pub fn rows_from_records(records: &[MatchRecord]) -> Vec<ReviewRow> {
    records
        .iter()
        .flat_map(|record| record.shots.iter().map(ReviewRow::from_shot))
        .collect()
}

/// Position in a list of `len` rows. `position == len` means review is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewCursor {
    position: usize,
    len: usize,
}

impl ReviewCursor {
    pub fn new(len: usize) -> Self {
        Self { position: 0, len }
    }

    pub fn current(&self) -> Option<usize> {
        (self.position < self.len).then_some(self.position)
    }

    pub fn advance(&mut self) -> Option<usize> {
        if self.position < self.len {
            self.position += 1;
        }
        self.current()
    }

    pub fn back(&mut self) -> Option<usize> {
        self.position = self.position.saturating_sub(1);
        self.current()
    }

    pub fn seek(&mut self, index: usize) -> bool {
        if index < self.len {
            self.position = index;
            true
        } else {
            false
        }
    }

    pub fn is_done(&self) -> bool {
        self.position >= self.len
    }
}

pub struct ReviewSession {
    rows: Vec<ReviewRow>,
    cursor: ReviewCursor,
    pitch: Pitch,
    policy: XgotPolicy,
}

impl ReviewSession {
    pub fn new(rows: Vec<ReviewRow>, pitch: Pitch, policy: XgotPolicy) -> Self {
        let cursor = ReviewCursor::new(rows.len());
        Self {
            rows,
            cursor,
            pitch,
            policy,
        }
    }

    pub fn cursor(&self) -> ReviewCursor {
        self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut ReviewCursor {
        &mut self.cursor
    }

    pub fn current(&self) -> Option<&ReviewRow> {
        self.cursor.current().and_then(|idx| self.rows.get(idx))
    }

    fn current_mut(&mut self) -> Option<&mut ReviewRow> {
        let idx = self.cursor.current()?;
        self.rows.get_mut(idx)
    }

    pub fn set_goal(&mut self, is_goal: bool) -> Option<&ReviewRow> {
        let (pitch, policy) = (self.pitch, self.policy);
        let row = self.current_mut()?;
        row.is_goal = is_goal;
        row.result = match (is_goal, row.result) {
            (true, _) => ShotResult::Goal,
            (false, ShotResult::Goal) => ShotResult::OnTarget,
            (false, other) => other,
        };
        row.rescore(&pitch, policy);
        Some(&*row)
    }

    /// Re-places the current shot, in pitch metres.
    pub fn recalibrate(&mut self, x_m: f64, y_m: f64) -> Option<&ReviewRow> {
        let (pitch, policy) = (self.pitch, self.policy);
        let row = self.current_mut()?;
        row.x = Some(x_m);
        row.y = Some(y_m);
        row.rescore(&pitch, policy);
        Some(&*row)
    }

    pub fn rows(&self) -> &[ReviewRow] {
        &self.rows
    }
}

pub fn save_review_table(path: &Path, rows: &[ReviewRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).ok();
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(rows).context("serialize review table")?;
    fs::write(&tmp, json).context("write review table")?;
    fs::rename(&tmp, path).context("swap review table")?;
    Ok(())
}

pub fn load_review_table(path: &Path) -> Result<Vec<ReviewRow>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read review table {}", path.display()))?;
    serde_json::from_str(&raw).context("invalid review table json")
}
