use std::fmt;

use serde::{Deserialize, Serialize};

/// Instruction set carried by [`Message`](crate::message::Message)s.
///
/// The set is closed: reaction scripts may only use these opcodes and the
/// built-in handler matches on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    // player verbs delivered by clicks
    Use,
    Look,
    Take,
    Talk,
    ObjectUse,
    // room lifecycle broadcasts
    #[serde(rename = "init_bg")]
    InitBg,
    #[serde(rename = "leave_bg")]
    LeaveBg,
    // animation notifications
    End,
    Half,
    // reaction control steps
    Check,
    If,
    Random,
    GoTo,
    // inventory
    AddInv,
    DelInv,
    SetInv,
    // presentation
    Avi,
    Continue,
    Cursor,
    Dialog,
    SetPos,
    Set,
    Play,
    Animate,
    Status,
    On,
    Off,
    Stop,
    Show,
    Hide,
    Shake,
    System,
    #[serde(rename = "zbuffer")]
    ZBuffer,
    Active,
    Passive,
    Description,
    // heroes
    Jump,
    JumpVich,
    Walk,
    WalkTo,
    WalkVich,
    // handled by subsystems outside the room runtime
    Say,
    Me,
    Think,
    Hint,
    Map,
    Music,
    Part,
    Chapter,
    Save,
    Load,
    Timer,
    Return,
    Pause,
}

impl Opcode {
    pub fn as_str(self) -> &'static str {
        match self {
            Opcode::Use => "use",
            Opcode::Look => "look",
            Opcode::Take => "take",
            Opcode::Talk => "talk",
            Opcode::ObjectUse => "object_use",
            Opcode::InitBg => "init_bg",
            Opcode::LeaveBg => "leave_bg",
            Opcode::End => "end",
            Opcode::Half => "half",
            Opcode::Check => "check",
            Opcode::If => "if",
            Opcode::Random => "random",
            Opcode::GoTo => "go_to",
            Opcode::AddInv => "add_inv",
            Opcode::DelInv => "del_inv",
            Opcode::SetInv => "set_inv",
            Opcode::Avi => "avi",
            Opcode::Continue => "continue",
            Opcode::Cursor => "cursor",
            Opcode::Dialog => "dialog",
            Opcode::SetPos => "set_pos",
            Opcode::Set => "set",
            Opcode::Play => "play",
            Opcode::Animate => "animate",
            Opcode::Status => "status",
            Opcode::On => "on",
            Opcode::Off => "off",
            Opcode::Stop => "stop",
            Opcode::Show => "show",
            Opcode::Hide => "hide",
            Opcode::Shake => "shake",
            Opcode::System => "system",
            Opcode::ZBuffer => "zbuffer",
            Opcode::Active => "active",
            Opcode::Passive => "passive",
            Opcode::Description => "description",
            Opcode::Jump => "jump",
            Opcode::JumpVich => "jump_vich",
            Opcode::Walk => "walk",
            Opcode::WalkTo => "walk_to",
            Opcode::WalkVich => "walk_vich",
            Opcode::Say => "say",
            Opcode::Me => "me",
            Opcode::Think => "think",
            Opcode::Hint => "hint",
            Opcode::Map => "map",
            Opcode::Music => "music",
            Opcode::Part => "part",
            Opcode::Chapter => "chapter",
            Opcode::Save => "save",
            Opcode::Load => "load",
            Opcode::Timer => "timer",
            Opcode::Return => "return",
            Opcode::Pause => "pause",
        }
    }

    /// Steps that hand the rest of their reaction to an external completion event.
    pub fn suspends_reaction(self) -> bool {
        matches!(
            self,
            Opcode::Dialog | Opcode::Play | Opcode::Walk | Opcode::WalkTo | Opcode::WalkVich
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
