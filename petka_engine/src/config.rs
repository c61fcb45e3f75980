use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::animation::Rect;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub screen_width: i32,
    pub screen_height: i32,
    /// Upper bound on messages handled in one tick; the rest wait for the next.
    pub max_messages_per_tick: usize,
    /// Seed for `Random` steps. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
    /// Cursor animation id for action 0; later actions follow consecutively.
    pub cursor_resource_base: i32,
    /// Hero walking speed in pixels per millisecond.
    pub walk_speed: f32,
    pub record_events: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            screen_width: 640,
            screen_height: 480,
            max_messages_per_tick: 4096,
            rng_seed: None,
            cursor_resource_base: 5002,
            walk_speed: 0.2,
            record_events: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing engine config {}", path.display()))
    }

    pub fn screen(&self) -> Rect {
        Rect::sized(self.screen_width, self.screen_height)
    }
}
