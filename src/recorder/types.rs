use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::click_event::MouseButton;

/// Marker stored in place of a screenshot file name when capture failed.
pub const MISSING_SCREENSHOT: &str = "MISSING_SCREENSHOT";

/// One recorded click, in the shape written to `data.json` and `data.csv`.
///
/// Field order is the column order of the CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position in the session.
    pub step: u32,
    /// Local wall clock time of the click, `HH:MM:SS`.
    pub time: String,
    /// Seconds since the session started, rounded to two decimals.
    pub seconds: f64,
    pub action: String,
    pub x: i32,
    pub y: i32,
    /// `step_<n>.png` relative to `screenshots/`, or [`MISSING_SCREENSHOT`].
    pub screenshot: String,
    pub wiki_entry: String,
}

impl Step {
    pub fn new(
        step: u32,
        time: String,
        elapsed: Duration,
        button: MouseButton,
        x: i32,
        y: i32,
    ) -> Self {
        let action = button.label();
        let wiki_entry = narrative(&action, x, y);
        Self {
            step,
            time,
            seconds: round_seconds(elapsed),
            action,
            x,
            y,
            screenshot: screenshot_name(step),
            wiki_entry,
        }
    }

    pub fn has_screenshot(&self) -> bool {
        self.screenshot != MISSING_SCREENSHOT
    }

    pub fn mark_missing_screenshot(&mut self) {
        self.screenshot = MISSING_SCREENSHOT.to_string();
    }

    #[cfg(test)]
    pub fn sample(step: u32) -> Self {
        Self::new(
            step,
            "10:15:00".to_string(),
            Duration::from_millis(1_250 * u64::from(step)),
            MouseButton::Left,
            100,
            200,
        )
    }
}

pub fn screenshot_name(step: u32) -> String {
    format!("step_{step}.png")
}

pub fn narrative(action: &str, x: i32, y: i32) -> String {
    format!("User performed a {action} at screen coordinates {x}, {y}.")
}

pub fn round_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}
