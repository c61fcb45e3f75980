use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::opcode::Opcode;

/// Stable identifier of a game object. Every cross-object reference goes
/// through this id and the registry, never through ownership.
pub type ObjectId = u16;

/// Argument value meaning "anything" in `If` filters and "unset" elsewhere.
pub const WILDCARD: i16 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub opcode: Opcode,
    pub target: ObjectId,
    #[serde(default)]
    pub arg1: i16,
    #[serde(default)]
    pub arg2: i16,
    #[serde(default)]
    pub arg3: i16,
    #[serde(default)]
    pub extra: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<ObjectId>,
}

impl Message {
    pub fn new(target: ObjectId, opcode: Opcode) -> Self {
        Self {
            opcode,
            target,
            arg1: 0,
            arg2: 0,
            arg3: 0,
            extra: 0,
            sender: None,
        }
    }

    pub fn with_args(mut self, arg1: i16, arg2: i16, arg3: i16) -> Self {
        self.arg1 = arg1;
        self.arg2 = arg2;
        self.arg3 = arg3;
        self
    }

    pub fn with_sender(mut self, sender: Option<ObjectId>) -> Self {
        self.sender = sender;
        self
    }

    /// `If` step filter: every non-wildcard argument must equal the trigger's.
    pub(crate) fn filter_accepts(&self, trigger: &Message) -> bool {
        (self.arg1 == WILDCARD || self.arg1 == trigger.arg1)
            && (self.arg2 == WILDCARD || self.arg2 == trigger.arg2)
            && (self.arg3 == WILDCARD || self.arg3 == trigger.arg3)
    }
}

/// A stored script: when `opcode` arrives while the owner is in `status`
/// (from `sender`), the `messages` run in order. `None` filters match anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub opcode: Opcode,
    #[serde(
        default,
        deserialize_with = "wildcard_filter",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<i8>,
    #[serde(
        default,
        deserialize_with = "wildcard_filter",
        skip_serializing_if = "Option::is_none"
    )]
    pub sender: Option<ObjectId>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Reads a status or sender filter where `-1` (or null) means "any".
fn wildcard_filter<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i32>,
{
    match Option::<i32>::deserialize(deserializer)? {
        None | Some(-1) => Ok(None),
        Some(value) => T::try_from(value)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("reaction filter {value} out of range"))),
    }
}

impl Reaction {
    pub fn new(opcode: Opcode, messages: Vec<Message>) -> Self {
        Self {
            opcode,
            status: None,
            sender: None,
            messages,
        }
    }

    pub fn with_status(mut self, status: i8) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_sender(mut self, sender: ObjectId) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn matches(&self, opcode: Opcode, status: i8, sender: Option<ObjectId>) -> bool {
        if self.opcode != opcode {
            return false;
        }
        if self.status.is_some_and(|required| required != status) {
            return false;
        }
        match self.sender {
            Some(required) => sender == Some(required),
            None => true,
        }
    }
}

/// A reaction suspended mid-way: the program counter over its steps.
///
/// Resuming runs `reaction.messages[next..]` on behalf of `owner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    owner: ObjectId,
    reaction: Reaction,
    next: usize,
}

impl Continuation {
    pub fn new(owner: ObjectId, reaction: Reaction, next: usize) -> Self {
        Self {
            owner,
            reaction,
            next,
        }
    }

    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub fn next_step(&self) -> usize {
        self.next
    }

    pub fn remaining(&self) -> &[Message] {
        self.reaction
            .messages
            .get(self.next..)
            .unwrap_or_default()
    }

    /// Whether any step of the parked reaction, run or not, is `opcode`.
    pub fn contains(&self, opcode: Opcode) -> bool {
        self.reaction
            .messages
            .iter()
            .any(|step| step.opcode == opcode)
    }

    pub(crate) fn into_parts(self) -> (ObjectId, Reaction, usize) {
        (self.owner, self.reaction, self.next)
    }
}

/// Continuation parked on an object until it receives `End(id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReaction {
    pub id: i16,
    pub continuation: Continuation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_filters_match_any_status_and_sender() {
        let reaction = Reaction::new(Opcode::Use, Vec::new());
        assert!(reaction.matches(Opcode::Use, 3, None));
        assert!(reaction.matches(Opcode::Use, -7, Some(12)));
        assert!(!reaction.matches(Opcode::Look, 3, None));
    }

    #[test]
    fn required_status_and_sender_must_match() {
        let reaction = Reaction::new(Opcode::Use, Vec::new())
            .with_status(2)
            .with_sender(40);
        assert!(reaction.matches(Opcode::Use, 2, Some(40)));
        assert!(!reaction.matches(Opcode::Use, 1, Some(40)));
        assert!(!reaction.matches(Opcode::Use, 2, Some(41)));
        assert!(!reaction.matches(Opcode::Use, 2, None));
    }

    #[test]
    fn minus_one_filters_in_reaction_data_are_wildcards() {
        let reaction: Reaction =
            serde_json::from_str(r#"{"opcode":"use","status":-1,"sender":-1,"messages":[]}"#)
                .expect("wildcard filters parse");
        assert_eq!(reaction.status, None);
        assert_eq!(reaction.sender, None);
        assert!(reaction.matches(Opcode::Use, 2, None));
        assert!(reaction.matches(Opcode::Use, -5, Some(40)));

        let reaction: Reaction =
            serde_json::from_str(r#"{"opcode":"use","status":3,"sender":40}"#)
                .expect("explicit filters parse");
        assert_eq!(reaction.status, Some(3));
        assert_eq!(reaction.sender, Some(40));
        assert!(serde_json::from_str::<Reaction>(r#"{"opcode":"use","status":300}"#).is_err());
    }

    #[test]
    fn if_filter_honours_wildcards() {
        let trigger = Message::new(1, Opcode::Use).with_args(5, 6, 7);
        let filter = Message::new(1, Opcode::If).with_args(WILDCARD, 6, WILDCARD);
        assert!(filter.filter_accepts(&trigger));
        let filter = Message::new(1, Opcode::If).with_args(4, WILDCARD, WILDCARD);
        assert!(!filter.filter_accepts(&trigger));
    }

    #[test]
    fn continuation_resumes_after_its_step_but_scans_the_whole_reaction() {
        let reaction = Reaction::new(
            Opcode::Use,
            vec![
                Message::new(1, Opcode::Walk),
                Message::new(1, Opcode::GoTo),
                Message::new(1, Opcode::Show),
            ],
        );
        let continuation = Continuation::new(1, reaction.clone(), 2);
        assert_eq!(continuation.remaining().len(), 1);
        assert!(continuation.contains(Opcode::GoTo));
        assert!(!continuation.contains(Opcode::Hide));
        assert!(Continuation::new(1, reaction, 9).remaining().is_empty());
    }
}
