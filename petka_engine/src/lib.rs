//! Room runtime for the Petka adventure engine: the message-driven object
//! interpreter and the main interface that loads rooms and routes input.

pub mod animation;
pub mod config;
mod dispatch;
pub mod engine;
pub mod error;
pub mod game_data;
pub mod headless;
pub mod hero;
pub mod inventory;
pub mod message;
pub mod object;
pub mod opcode;
pub mod queue;
pub mod recording;
pub mod registry;
pub mod scene;
pub mod services;

#[cfg(test)]
mod test_support;

pub use config::EngineConfig;
pub use engine::{DrawItem, Engine, SystemObjects};
pub use error::EngineError;
pub use message::{Continuation, Message, ObjectId, Reaction, WILDCARD};
pub use object::{CursorAction, ObjectKind, SceneObject};
pub use opcode::Opcode;
