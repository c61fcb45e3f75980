use serde::{Deserialize, Serialize};

use crate::animation::{Point, Rect};
use crate::hero::HeroSlot;
use crate::inventory::InventoryState;
use crate::message::{Continuation, ObjectId, PendingReaction, Reaction};
use crate::opcode::Opcode;

/// Resource id meaning "no animation".
pub const NO_RESOURCE: i32 = -1;

/// What a left click does when it lands on an object (or on nothing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorAction {
    Look,
    #[default]
    Walk,
    Use,
    Take,
    Talk,
    ObjectUseChapayev,
    ObjectUse,
}

impl CursorAction {
    pub fn index(self) -> i32 {
        match self {
            CursorAction::Look => 0,
            CursorAction::Walk => 1,
            CursorAction::Use => 2,
            CursorAction::Take => 3,
            CursorAction::Talk => 4,
            CursorAction::ObjectUseChapayev => 5,
            CursorAction::ObjectUse => 6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    #[serde(default)]
    pub action: CursorAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inv_item: Option<ObjectId>,
}

/// Hot area on the look/inventory star selecting a cursor action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarButton {
    pub area: Rect,
    pub action: CursorAction,
}

/// Closed set of object specialisations sharing the message-object core.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    #[default]
    Plain,
    Background {
        #[serde(default = "no_resource")]
        music_id: i32,
        #[serde(default = "no_resource")]
        fx_id: i32,
    },
    Cursor(CursorState),
    Case(InventoryState),
    Star {
        #[serde(default)]
        buttons: Vec<StarButton>,
    },
    Hero {
        slot: HeroSlot,
    },
}

fn no_resource() -> i32 {
    NO_RESOURCE
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub name_on_screen: Option<String>,
    /// Subtitle colour for this object's lines; -1 uses the default.
    pub dialog_color: i32,
    pub kind: ObjectKind,
    pub status: i8,
    pub reactions: Vec<Reaction>,
    pending: Option<PendingReaction>,
    pub shown: bool,
    pub active: bool,
    pub animate: bool,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub resource_id: i32,
    pub walk_x: i32,
    pub walk_y: i32,
    pub update_z: bool,
    pub(crate) time: u32,
    pub(crate) looped_sound: bool,
    pub(crate) start_sound: bool,
    pub sound: Option<String>,
}

impl SceneObject {
    pub fn new(id: ObjectId, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id,
            name: name.into(),
            name_on_screen: None,
            dialog_color: -1,
            kind,
            status: 0,
            reactions: Vec::new(),
            pending: None,
            shown: true,
            active: true,
            animate: true,
            x: 0,
            y: 0,
            z: 240,
            resource_id: NO_RESOURCE,
            walk_x: -1,
            walk_y: -1,
            update_z: true,
            time: 0,
            looped_sound: false,
            start_sound: false,
            sound: None,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Preset walk-to point, when the room defines one.
    pub fn walk_point(&self) -> Option<Point> {
        (self.walk_x != -1).then(|| Point::new(self.walk_x, self.walk_y))
    }

    pub fn matching_reactions(
        &self,
        opcode: Opcode,
        sender: Option<ObjectId>,
    ) -> Vec<Reaction> {
        self.reactions
            .iter()
            .filter(|reaction| reaction.matches(opcode, self.status, sender))
            .cloned()
            .collect()
    }

    /// Parks `continuation` until `End(id)` arrives. The previously pending
    /// reaction, if any, is handed back so the caller drops it.
    pub fn set_reaction(&mut self, id: i16, continuation: Continuation) -> Option<PendingReaction> {
        self.pending.replace(PendingReaction { id, continuation })
    }

    pub fn pending_reaction(&self) -> Option<&PendingReaction> {
        self.pending.as_ref()
    }

    /// Releases the pending continuation only when it waits for `id`.
    pub(crate) fn take_pending_for(&mut self, id: i16) -> Option<Continuation> {
        if self.pending.as_ref().map(|pending| pending.id) != Some(id) {
            return None;
        }
        self.pending.take().map(|pending| pending.continuation)
    }

    pub fn is_cursor(&self) -> bool {
        matches!(self.kind, ObjectKind::Cursor(_))
    }

    pub fn cursor(&self) -> Option<&CursorState> {
        match &self.kind {
            ObjectKind::Cursor(state) => Some(state),
            _ => None,
        }
    }

    pub fn cursor_mut(&mut self) -> Option<&mut CursorState> {
        match &mut self.kind {
            ObjectKind::Cursor(state) => Some(state),
            _ => None,
        }
    }

    pub fn inventory(&self) -> Option<&InventoryState> {
        match &self.kind {
            ObjectKind::Case(items) => Some(items),
            _ => None,
        }
    }

    pub fn inventory_mut(&mut self) -> Option<&mut InventoryState> {
        match &mut self.kind {
            ObjectKind::Case(items) => Some(items),
            _ => None,
        }
    }

    pub fn hero_slot(&self) -> Option<HeroSlot> {
        match self.kind {
            ObjectKind::Hero { slot } => Some(slot),
            _ => None,
        }
    }

    /// Music and ambient track ids of a room object.
    pub fn room_audio(&self) -> Option<(i32, i32)> {
        match self.kind {
            ObjectKind::Background { music_id, fx_id } => Some((music_id, fx_id)),
            _ => None,
        }
    }
}
