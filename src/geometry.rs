use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Playing surface in metres. Source coordinates are percentages of these dimensions,
/// with the attacking goal on the far (`x = length`) end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pitch {
    pub length: f64,
    pub width: f64,
}

impl Default for Pitch {
    fn default() -> Self {
        Self {
            length: 105.0,
            width: 68.0,
        }
    }
}

impl Pitch {
    /// Centre of the attacking goal line.
    pub fn goal_center(&self) -> (f64, f64) {
        (self.length, self.width / 2.0)
    }

    /// Converts each coordinate independently; a missing or non-numeric input only
    /// nulls its own axis. No clamping is applied.
    pub fn to_meters(
        &self,
        x_raw: Option<&Value>,
        y_raw: Option<&Value>,
    ) -> (Option<f64>, Option<f64>) {
        let x_m = x_raw.and_then(numeric).map(|x| x * self.length / 100.0);
        let y_m = y_raw.and_then(numeric).map(|y| y * self.width / 100.0);
        (x_m, y_m)
    }

    pub fn distance(&self, x_m: Option<f64>, y_m: Option<f64>) -> Option<f64> {
        let (x, y) = (x_m?, y_m?);
        let (gx, gy) = self.goal_center();
        Some((gx - x).hypot(gy - y))
    }
}

/// Numeric reading of a raw coordinate: JSON numbers, or strings holding a finite number.
pub fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}
