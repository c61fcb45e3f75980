//! JSON game data: the object catalogue with its reactions, the room
//! attachment table and the resource tables for the in-memory collaborators.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use petka_formats::{BackgroundTable, BgInfo};

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::message::{ObjectId, Reaction};
use crate::object::{ObjectKind, SceneObject, NO_RESOURCE};
use crate::opcode::Opcode;
use crate::recording::{
    recording_services, HandlerTable, MemoryResources, ResourceTables, ServiceLog,
};
use crate::registry::ObjectRegistry;

fn yes() -> bool {
    true
}

fn no_resource() -> i32 {
    NO_RESOURCE
}

fn default_z() -> i32 {
    240
}

fn unset() -> i32 {
    -1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDef {
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub name_on_screen: Option<String>,
    #[serde(default = "unset")]
    pub dialog_color: i32,
    #[serde(default)]
    pub kind: ObjectKind,
    #[serde(default = "no_resource")]
    pub resource_id: i32,
    #[serde(default)]
    pub status: i8,
    #[serde(default = "yes")]
    pub shown: bool,
    #[serde(default = "yes")]
    pub active: bool,
    #[serde(default = "yes")]
    pub animate: bool,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default = "default_z")]
    pub z: i32,
    #[serde(default = "unset")]
    pub walk_x: i32,
    #[serde(default = "unset")]
    pub walk_y: i32,
    #[serde(default = "yes")]
    pub update_z: bool,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl ObjectDef {
    pub fn into_object(self) -> SceneObject {
        let mut object = SceneObject::new(self.id, self.name, self.kind);
        object.name_on_screen = self.name_on_screen;
        object.dialog_color = self.dialog_color;
        object.resource_id = self.resource_id;
        object.status = self.status;
        object.shown = self.shown;
        object.active = self.active;
        object.animate = self.animate;
        object.x = self.x;
        object.y = self.y;
        object.z = self.z;
        object.walk_x = self.walk_x;
        object.walk_y = self.walk_y;
        object.update_z = self.update_z;
        object.reactions = self.reactions;
        object
    }
}

/// Dialogue handler registered for `(object, opcode)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HandlerDef {
    pub object: ObjectId,
    pub opcode: Opcode,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub start_room: String,
    pub objects: Vec<ObjectDef>,
    #[serde(default)]
    pub backgrounds: Vec<BgInfo>,
    #[serde(default)]
    pub resources: ResourceTables,
    #[serde(default)]
    pub handlers: Vec<HandlerDef>,
}

impl GameData {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading game data {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parsing game data {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Builds an engine over recording collaborators and enters the start
    /// room. `backgrounds` replaces the table embedded in the game data.
    pub fn into_engine(
        self,
        config: EngineConfig,
        backgrounds: Option<BackgroundTable>,
    ) -> Result<(Engine, ServiceLog)> {
        let mut registry = ObjectRegistry::new();
        for def in self.objects {
            registry
                .register(def.into_object())
                .context("registering game objects")?;
        }
        let handlers = self
            .handlers
            .iter()
            .fold(HandlerTable::default(), |table, def| {
                table.with_handler(def.object, def.opcode, def.fallback)
            });
        let (services, log) =
            recording_services(MemoryResources::new(self.resources), handlers);
        let backgrounds = backgrounds.unwrap_or_else(|| BackgroundTable::new(self.backgrounds));
        let mut engine = Engine::new(config, registry, backgrounds, services)
            .context("assembling engine from game data")?;
        engine
            .start(&self.start_room)
            .context("entering the start room")?;
        log::info!(
            "started in room {} with {} objects",
            self.start_room,
            engine.registry().len()
        );
        Ok((engine, log))
    }
}
