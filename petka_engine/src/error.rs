use thiserror::Error;

use crate::hero::HeroSlot;
use crate::message::ObjectId;

/// Failures raised while assembling an engine from game data. The running
/// interpreter itself never fails; it logs and skips instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("object id {0} registered twice")]
    DuplicateObject(ObjectId),
    #[error("game data has no {0} object")]
    MissingSystemObject(&'static str),
    #[error("game data has no {} hero", .0.label())]
    MissingHero(HeroSlot),
    #[error("start room {0:?} is not a known object")]
    UnknownStartRoom(String),
    #[error("background table references unknown object {0}")]
    UnknownAttachment(ObjectId),
}
