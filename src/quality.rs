//! Distance-only shot quality.
//!
//! A logistic decay centred on 16 m. This is a monotonic proxy, not a fitted model: it
//! ignores angle, body part, assist type and game state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const XG_MIDPOINT_M: f64 = 16.0;
const XG_SCALE_M: f64 = 5.0;

/// `1 / (1 + exp((d - 16) / 5))`, held strictly inside (0, 1).
pub fn xg_from_distance(dist_m: Option<f64>) -> Option<f64> {
    let d = dist_m?;
    if !d.is_finite() {
        return None;
    }
    let z = (d - XG_MIDPOINT_M) / XG_SCALE_M;
    // Evaluate on the side that cannot overflow.
    let p = if z >= 0.0 {
        let e = (-z).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + z.exp())
    };
    Some(p.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON))
}

/// How xGOT is derived from xG. One policy applies to a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XgotPolicy {
    /// Every shot counts as on target: xGOT equals xG.
    #[default]
    AllShots,
    /// xGOT equals xG for shots flagged on target or scored, 0 otherwise.
    OnTargetOrGoal,
}

impl XgotPolicy {
    pub fn xgot(self, xg: Option<f64>, on_target: bool, is_goal: bool) -> Option<f64> {
        let xg = xg?;
        match self {
            XgotPolicy::AllShots => Some(xg),
            XgotPolicy::OnTargetOrGoal => Some(if on_target || is_goal { xg } else { 0.0 }),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            XgotPolicy::AllShots => "all",
            XgotPolicy::OnTargetOrGoal => "gated",
        }
    }
}

impl fmt::Display for XgotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for XgotPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" | "all_shots" | "always" => Ok(XgotPolicy::AllShots),
            "gated" | "on_target" | "on_target_or_goal" => Ok(XgotPolicy::OnTargetOrGoal),
            other => Err(format!("unknown xgot policy '{other}' (expected all|gated)")),
        }
    }
}
