//! In-memory collaborators that record what the runtime asked of them. The
//! headless runner and the tests drive the engine through these.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::animation::{Animation, Rect};
use crate::message::{Continuation, ObjectId};
use crate::opcode::Opcode;
use crate::services::{
    DialogueController, DialogueRegistry, HandlerInfo, ResourceManager, Services, SoundChannel,
    SoundManager, VideoSystem,
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceEvent {
    BitmapLoad { id: i32 },
    ClearUnneeded,
    SoundAdd { name: String, channel: SoundChannel },
    SoundPlay { name: String, looped: bool },
    SoundRemove { name: String },
    SoundRemoveType { channel: SoundChannel },
    AllDirty,
    Shake { enabled: bool },
    TimeReset,
    Video { name: String },
    HandlerSet { object: ObjectId, opcode: Opcode },
    DialogueStart { dialogue: i16, owner: ObjectId },
    DialogueNext { choice: i32 },
    DialogueEndUserMsg,
    DialogueSender { owner: ObjectId },
    DialogueEnd,
}

impl ServiceEvent {
    /// Compact one-line form used in event logs.
    pub fn label(&self) -> String {
        match self {
            ServiceEvent::BitmapLoad { id } => format!("bitmap.load {id}"),
            ServiceEvent::ClearUnneeded => "resources.clear".to_string(),
            ServiceEvent::SoundAdd { name, channel } => format!("sound.add {name} {channel:?}"),
            ServiceEvent::SoundPlay { name, looped } => {
                format!("sound.play {name} looped={looped}")
            }
            ServiceEvent::SoundRemove { name } => format!("sound.remove {name}"),
            ServiceEvent::SoundRemoveType { channel } => format!("sound.remove_all {channel:?}"),
            ServiceEvent::AllDirty => "video.all_dirty".to_string(),
            ServiceEvent::Shake { enabled } => format!("video.shake {enabled}"),
            ServiceEvent::TimeReset => "video.time_reset".to_string(),
            ServiceEvent::Video { name } => format!("video.play {name}"),
            ServiceEvent::HandlerSet { object, opcode } => {
                format!("handler.set {object} {opcode}")
            }
            ServiceEvent::DialogueStart { dialogue, owner } => {
                format!("dialog.begin {owner} {dialogue}")
            }
            ServiceEvent::DialogueNext { choice } => format!("dialog.next {choice}"),
            ServiceEvent::DialogueEndUserMsg => "dialog.end_user_msg".to_string(),
            ServiceEvent::DialogueSender { owner } => format!("dialog.sender {owner}"),
            ServiceEvent::DialogueEnd => "dialog.close".to_string(),
        }
    }
}

/// Shared, append-only record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct ServiceLog {
    events: Rc<RefCell<Vec<ServiceEvent>>>,
}

impl ServiceLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ServiceEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<ServiceEvent> {
        self.events.borrow().clone()
    }

    pub fn contains(&self, event: &ServiceEvent) -> bool {
        self.events.borrow().iter().any(|seen| seen == event)
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Hands back everything recorded so far and empties the log.
    pub fn drain(&self) -> Vec<ServiceEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

/// Resource tables as they appear in game data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceTables {
    #[serde(default)]
    pub animations: BTreeMap<i32, Animation>,
    #[serde(default)]
    pub sounds: BTreeMap<i32, String>,
    #[serde(default)]
    pub names: BTreeMap<i32, String>,
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemoryResources {
    tables: ResourceTables,
    log: ServiceLog,
}

impl MemoryResources {
    pub fn new(tables: ResourceTables) -> Self {
        Self {
            tables,
            log: ServiceLog::new(),
        }
    }

    pub fn with_animation(mut self, id: i32, animation: Animation) -> Self {
        self.tables.animations.insert(id, animation);
        self
    }

    pub fn with_sound(mut self, id: i32, name: impl Into<String>) -> Self {
        self.tables.sounds.insert(id, name.into());
        self
    }

    pub fn with_name(mut self, id: i32, name: impl Into<String>) -> Self {
        self.tables.names.insert(id, name.into());
        self
    }

    pub fn with_description(mut self, object: impl Into<String>, text: impl Into<String>) -> Self {
        self.tables.descriptions.insert(object.into(), text.into());
        self
    }
}

impl ResourceManager for MemoryResources {
    fn load_flic(&mut self, id: i32) -> Option<&mut Animation> {
        self.tables.animations.get_mut(&id)
    }

    fn load_bitmap(&mut self, id: i32) {
        self.log.push(ServiceEvent::BitmapLoad { id });
    }

    fn clear_unneeded(&mut self) {
        self.log.push(ServiceEvent::ClearUnneeded);
    }

    fn find_sound_name(&self, id: i32) -> Option<String> {
        self.tables.sounds.get(&id).cloned()
    }

    fn find_resource_name(&self, id: i32) -> Option<String> {
        self.tables.names.get(&id).cloned()
    }

    fn find_description(&self, object_name: &str) -> Option<String> {
        self.tables.descriptions.get(object_name).cloned()
    }
}

#[derive(Debug, Default)]
pub struct RecordingSound {
    loaded: BTreeMap<String, SoundChannel>,
    log: ServiceLog,
}

impl RecordingSound {
    pub fn loaded(&self) -> &BTreeMap<String, SoundChannel> {
        &self.loaded
    }
}

impl SoundManager for RecordingSound {
    fn add_sound(&mut self, name: &str, channel: SoundChannel) -> bool {
        if name.is_empty() {
            return false;
        }
        self.loaded.insert(name.to_string(), channel);
        self.log.push(ServiceEvent::SoundAdd {
            name: name.to_string(),
            channel,
        });
        true
    }

    fn play(&mut self, name: &str, looped: bool) {
        if !self.loaded.contains_key(name) {
            return;
        }
        self.log.push(ServiceEvent::SoundPlay {
            name: name.to_string(),
            looped,
        });
    }

    fn remove_sound(&mut self, name: &str) {
        if self.loaded.remove(name).is_some() {
            self.log.push(ServiceEvent::SoundRemove {
                name: name.to_string(),
            });
        }
    }

    fn remove_sounds_with_type(&mut self, channel: SoundChannel) {
        self.loaded.retain(|_, kind| *kind != channel);
        self.log.push(ServiceEvent::SoundRemoveType { channel });
    }
}

#[derive(Debug, Default)]
pub struct RecordingVideo {
    dirty_rects: Vec<Rect>,
    log: ServiceLog,
}

impl RecordingVideo {
    pub fn dirty_rects(&self) -> &[Rect] {
        &self.dirty_rects
    }
}

impl VideoSystem for RecordingVideo {
    fn add_dirty_rect(&mut self, rect: Rect) {
        self.dirty_rects.push(rect);
    }

    fn make_all_dirty(&mut self) {
        self.log.push(ServiceEvent::AllDirty);
    }

    fn set_shake(&mut self, enabled: bool) {
        self.log.push(ServiceEvent::Shake { enabled });
    }

    fn update_time(&mut self) {
        self.log.push(ServiceEvent::TimeReset);
    }

    fn play_video(&mut self, name: &str) {
        self.log.push(ServiceEvent::Video {
            name: name.to_string(),
        });
    }
}

/// Dialogue handler table keyed by `(object, opcode)`.
#[derive(Debug, Default)]
pub struct HandlerTable {
    handlers: BTreeMap<(ObjectId, Opcode), HandlerInfo>,
    log: ServiceLog,
}

impl HandlerTable {
    pub fn with_handler(mut self, object: ObjectId, opcode: Opcode, fallback: bool) -> Self {
        self.handlers
            .insert((object, opcode), HandlerInfo { fallback });
        self
    }
}

impl DialogueRegistry for HandlerTable {
    fn find_handler(&self, object: ObjectId, opcode: Opcode) -> Option<HandlerInfo> {
        self.handlers.get(&(object, opcode)).copied()
    }

    fn set_handler(&mut self, object: ObjectId, opcode: Opcode) {
        self.log.push(ServiceEvent::HandlerSet { object, opcode });
    }
}

#[derive(Debug, Default)]
pub struct ScriptedDialogue {
    active: bool,
    reaction: Option<Continuation>,
    log: ServiceLog,
}

impl DialogueController for ScriptedDialogue {
    fn start(&mut self, dialogue: i16, owner: ObjectId) {
        self.active = true;
        self.log.push(ServiceEvent::DialogueStart { dialogue, owner });
    }

    fn next(&mut self, choice: i32) {
        self.log.push(ServiceEvent::DialogueNext { choice });
    }

    fn end_user_msg(&mut self) {
        self.log.push(ServiceEvent::DialogueEndUserMsg);
    }

    fn set_sender(&mut self, owner: ObjectId) {
        self.log.push(ServiceEvent::DialogueSender { owner });
    }

    fn set_reaction(&mut self, continuation: Continuation) {
        self.reaction = Some(continuation);
    }

    fn take_reaction(&mut self) -> Option<Continuation> {
        self.reaction.take()
    }

    fn end(&mut self) {
        if self.active {
            self.active = false;
            self.log.push(ServiceEvent::DialogueEnd);
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Builds a full set of recording collaborators that share one log.
pub fn recording_services(
    resources: MemoryResources,
    handlers: HandlerTable,
) -> (Services, ServiceLog) {
    let log = resources.log.clone();
    let handlers = HandlerTable {
        log: log.clone(),
        ..handlers
    };
    let services = Services {
        resources: Box::new(resources),
        sounds: Box::new(RecordingSound {
            log: log.clone(),
            ..RecordingSound::default()
        }),
        video: Box::new(RecordingVideo {
            log: log.clone(),
            ..RecordingVideo::default()
        }),
        handlers: Box::new(handlers),
        dialogue: Box::new(ScriptedDialogue {
            log: log.clone(),
            ..ScriptedDialogue::default()
        }),
    };
    (services, log)
}
