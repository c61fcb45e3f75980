//! Contracts of the subsystems the room runtime drives but does not own.

use std::fmt;

use serde::Serialize;

use crate::animation::{Animation, Rect};
use crate::message::{Continuation, ObjectId};
use crate::opcode::Opcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundChannel {
    Music,
    Sfx,
}

/// Decoded resources, looked up by numeric id. Missing resources are `None`
/// and every caller treats that as a silent no-op.
pub trait ResourceManager {
    fn load_flic(&mut self, id: i32) -> Option<&mut Animation>;
    fn load_bitmap(&mut self, id: i32);
    fn clear_unneeded(&mut self);
    fn find_sound_name(&self, id: i32) -> Option<String>;
    fn find_resource_name(&self, id: i32) -> Option<String>;
    /// Inventory description text for an object name.
    fn find_description(&self, object_name: &str) -> Option<String>;
}

pub trait SoundManager {
    /// Loads a sound; `false` when nothing could be loaded under that name.
    fn add_sound(&mut self, name: &str, channel: SoundChannel) -> bool;
    fn play(&mut self, name: &str, looped: bool);
    fn remove_sound(&mut self, name: &str);
    fn remove_sounds_with_type(&mut self, channel: SoundChannel);
}

pub trait VideoSystem {
    fn add_dirty_rect(&mut self, rect: Rect);
    fn make_all_dirty(&mut self);
    fn set_shake(&mut self, enabled: bool);
    /// Resets the frame timing baseline after a room switch.
    fn update_time(&mut self);
    fn play_video(&mut self, name: &str);
}

/// What the dialogue registry knows about `(object, opcode)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerInfo {
    pub fallback: bool,
}

pub trait DialogueRegistry {
    fn find_handler(&self, object: ObjectId, opcode: Opcode) -> Option<HandlerInfo>;
    fn set_handler(&mut self, object: ObjectId, opcode: Opcode);
}

/// The on-screen dialogue interface.
pub trait DialogueController {
    fn start(&mut self, dialogue: i16, owner: ObjectId);
    fn next(&mut self, choice: i32);
    fn end_user_msg(&mut self);
    fn set_sender(&mut self, owner: ObjectId);
    /// Stores the continuation to run once the dialogue closes, replacing any previous one.
    fn set_reaction(&mut self, continuation: Continuation);
    fn take_reaction(&mut self) -> Option<Continuation>;
    /// Closes the dialogue; the engine then resumes the stored continuation.
    fn end(&mut self);
    fn is_active(&self) -> bool;
}

/// Bundle of collaborators handed to the engine.
pub struct Services {
    pub resources: Box<dyn ResourceManager>,
    pub sounds: Box<dyn SoundManager>,
    pub video: Box<dyn VideoSystem>,
    pub handlers: Box<dyn DialogueRegistry>,
    pub dialogue: Box<dyn DialogueController>,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Services")
    }
}
