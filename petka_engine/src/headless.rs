//! Scripted, window-less driver: replays recorded input against an engine and
//! collects everything that happened as a numbered event log.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::hero::HeroSlot;
use crate::recording::ServiceLog;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    Click { x: i32, y: i32 },
    RightClick { x: i32, y: i32 },
    Move { x: i32, y: i32 },
    /// Advances the clock; `ms` overrides the runner's tick length.
    Tick {
        #[serde(default)]
        ms: Option<u32>,
    },
    WalkFinished { hero: HeroSlot },
    DialogueEnd,
}

pub fn read_input_script(path: &Path) -> Result<Vec<InputEvent>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading input script {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing input script {}", path.display()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub sequence: u32,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    pub events: Vec<EventLogEntry>,
}

impl EventLog {
    fn extend(&mut self, labels: impl IntoIterator<Item = String>) {
        for label in labels {
            let sequence = self.events.len() as u32;
            self.events.push(EventLogEntry { sequence, label });
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|entry| entry.label.as_str())
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing event log")?;
        fs::write(path, json).with_context(|| format!("writing event log to {}", path.display()))
    }
}

/// Replays `script`, then runs `extra_ticks` more ticks of `tick_ms`.
/// Stops early once a script asks the game to quit.
pub fn run_script(
    engine: &mut Engine,
    services: &ServiceLog,
    script: &[InputEvent],
    tick_ms: u32,
    extra_ticks: u32,
) -> EventLog {
    let mut log = EventLog::default();
    collect(engine, services, &mut log);

    for event in script {
        match *event {
            InputEvent::Click { x, y } => engine.on_left_button_down(x, y),
            InputEvent::RightClick { x, y } => engine.on_right_button_down(x, y),
            InputEvent::Move { x, y } => engine.on_mouse_move(x, y),
            InputEvent::Tick { ms } => tick(engine, ms.unwrap_or(tick_ms)),
            InputEvent::WalkFinished { hero } => engine.finish_walk(hero),
            InputEvent::DialogueEnd => engine.end_dialogue(),
        }
        collect(engine, services, &mut log);
        if engine.quit_requested() {
            log::info!("quit requested by script");
            return log;
        }
    }

    for _ in 0..extra_ticks {
        tick(engine, tick_ms);
        collect(engine, services, &mut log);
        if engine.quit_requested() {
            break;
        }
    }
    log
}

fn tick(engine: &mut Engine, delta_ms: u32) {
    engine.update(delta_ms);
    engine.draw_list();
}

fn collect(engine: &mut Engine, services: &ServiceLog, log: &mut EventLog) {
    log.extend(engine.take_events());
    log.extend(services.drain().iter().map(|event| event.label()));
}
