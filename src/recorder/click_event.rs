use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Any extra button, by its platform button number.
    Other(u8),
}

impl MouseButton {
    /// Human-readable action label, used for the `action` column and the narrative.
    pub fn label(&self) -> String {
        match self {
            MouseButton::Left => "left click".to_string(),
            MouseButton::Right => "right click".to_string(),
            MouseButton::Middle => "middle click".to_string(),
            MouseButton::Other(number) => format!("button {number} click"),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.label())
    }
}

/// A raw pointer notification as delivered by an input hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub x: i32,
    pub y: i32,
    pub button: MouseButton,
    /// `true` for the press half of a click, `false` for the release.
    pub pressed: bool,
}

impl ClickEvent {
    pub fn press(x: i32, y: i32, button: MouseButton) -> Self {
        Self {
            x,
            y,
            button,
            pressed: true,
        }
    }

    pub fn release(x: i32, y: i32, button: MouseButton) -> Self {
        Self {
            x,
            y,
            button,
            pressed: false,
        }
    }
}
