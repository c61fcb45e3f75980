//! Message delivery: stored reactions first, then the built-in behaviour of
//! each opcode.

use crate::engine::Engine;
use crate::hero::HeroSlot;
use crate::inventory::InventoryState;
use crate::message::{Continuation, Message, ObjectId, Reaction, WILDCARD};
use crate::object::{CursorAction, SceneObject};
use crate::opcode::Opcode;

/// What a `System` message's first argument selects.
const SYSTEM_STAR_OFF: i16 = 0;
const SYSTEM_STAR_ON: i16 = 1;
const SYSTEM_QUIT: i16 = 242;

impl Engine {
    /// Delivers `message` to object `id`.
    ///
    /// Every reaction matching the opcode, the object's status and the sender
    /// runs in declaration order. The built-in behaviour follows when a
    /// reaction ran or when no dialogue handler claims the opcode; otherwise
    /// the message is diverted into a dialogue.
    pub fn process_message(&mut self, id: ObjectId, message: &Message) {
        let Some(object) = self.registry.find(id) else {
            log::warn!("message {} for unknown object {id}", message.opcode);
            return;
        };
        let matched = object.matching_reactions(message.opcode, message.sender);
        let reacted = !matched.is_empty();
        self.log_event(format!(
            "msg.deliver {id} {} {},{},{}",
            message.opcode, message.arg1, message.arg2, message.arg3
        ));

        for reaction in matched {
            let handler = self.services.handlers.find_handler(id, message.opcode);
            if handler.is_some_and(|info| !info.fallback) {
                self.services.handlers.set_handler(id, message.opcode);
                self.services.dialogue.set_sender(id);
            }
            self.process_reaction(id, reaction, 0, Some(message));
        }

        let handler = self.services.handlers.find_handler(id, message.opcode);
        if reacted || handler.is_none() {
            self.run_builtin(id, message, reacted);
        } else {
            self.services.handlers.set_handler(id, message.opcode);
            self.services.dialogue.start(message.arg1, id);
            self.log_event(format!("dialog.divert {id} {}", message.opcode));
        }
    }

    /// Runs `reaction.messages[start..]` on behalf of `owner`.
    ///
    /// `trigger` is the message that fired the reaction; resumed
    /// continuations have none, so their `If` and `Random` steps pass through
    /// unchanged. The walk stops early at a failed `Check` or `If`, and parks
    /// itself at the first step that waits for something.
    pub fn process_reaction(
        &mut self,
        owner: ObjectId,
        reaction: Reaction,
        start: usize,
        trigger: Option<&Message>,
    ) {
        for index in start..reaction.messages.len() {
            let mut step = reaction.messages[index];
            match step.opcode {
                Opcode::Check => {
                    let status = self.registry.find(step.target).map(|target| target.status);
                    if status.map(i16::from) != Some(step.arg1) {
                        self.log_event(format!("reaction.abort {owner} check {}", step.target));
                        return;
                    }
                }
                Opcode::If => {
                    if let Some(trigger) = trigger {
                        if !step.filter_accepts(trigger) {
                            self.log_event(format!("reaction.abort {owner} if"));
                            return;
                        }
                    }
                }
                Opcode::Random => {
                    if trigger.is_some() && step.arg2 > 0 {
                        step.arg1 = self.random_below(step.arg2);
                    }
                }
                _ => {}
            }

            self.queue.push(step.with_sender(Some(owner)));

            match step.opcode {
                Opcode::Dialog => {
                    let continuation = Continuation::new(step.target, reaction, index + 1);
                    self.services.dialogue.set_reaction(continuation);
                    self.log_event(format!("reaction.suspend {owner} dialog"));
                    return;
                }
                Opcode::Play => {
                    let continuation = Continuation::new(step.target, reaction, index + 1);
                    match self.registry.find_mut(step.target) {
                        Some(target) => {
                            if let Some(dropped) = target.set_reaction(step.arg1, continuation) {
                                log::debug!(
                                    "object {} dropped reaction waiting for end {}",
                                    step.target,
                                    dropped.id
                                );
                            }
                        }
                        None => log::warn!("play step targets unknown object {}", step.target),
                    }
                    self.log_event(format!("reaction.suspend {owner} play {}", step.arg1));
                    return;
                }
                Opcode::Walk | Opcode::WalkTo | Opcode::WalkVich => {
                    let slot = if step.opcode == Opcode::WalkVich {
                        HeroSlot::Chapayev
                    } else {
                        HeroSlot::Petka
                    };
                    let continuation = Continuation::new(owner, reaction, index + 1);
                    self.heroes
                        .get_mut(slot)
                        .set_reaction_after_walk(continuation);
                    self.log_event(format!("reaction.suspend {owner} walk {}", slot.label()));
                    return;
                }
                _ => {}
            }
        }
    }

    fn run_builtin(&mut self, id: ObjectId, message: &Message, reacted: bool) {
        let (arg1, arg2) = (message.arg1, message.arg2);
        match message.opcode {
            Opcode::AddInv => {
                if let Some(case) = self.case_mut() {
                    case.add_item(id);
                }
            }
            Opcode::DelInv => {
                if let Some(case) = self.case_mut() {
                    case.remove_item(id);
                }
            }
            Opcode::SetInv => match message.sender {
                Some(sender) => {
                    if let Some(case) = self.case_mut() {
                        case.transform_item(sender, id);
                    }
                }
                None => log::warn!("set_inv on {id} without a sender"),
            },
            Opcode::Avi => {
                let resource = i32::from(arg1 as u16);
                match self.services.resources.find_resource_name(resource) {
                    Some(name) => {
                        self.services.video.play_video(&name);
                        self.log_event(format!("video.play {name}"));
                    }
                    None => log::warn!("no video registered for resource {resource}"),
                }
            }
            Opcode::Continue => self.services.dialogue.end_user_msg(),
            Opcode::Cursor => {
                self.set_inventory_cursor(id, i32::from(arg1));
                self.services.video.make_all_dirty();
            }
            Opcode::Dialog => {
                self.services.dialogue.start(arg1, id);
                self.log_event(format!("dialog.start {id} {arg1}"));
            }
            Opcode::SetPos => self.set_pos(id, i32::from(arg1), i32::from(arg2)),
            Opcode::Set | Opcode::Play => self.play(id, i32::from(arg1), arg2),
            Opcode::Animate => self.with_object(id, |object| object.animate = arg1 != 0),
            Opcode::Status => self.with_object(id, |object| object.status = arg1 as i8),
            Opcode::On => {
                self.with_object(id, |object| object.active = true);
                self.show(id, true);
            }
            Opcode::Off => {
                self.with_object(id, |object| object.active = false);
                self.show(id, false);
            }
            Opcode::Show => self.show(id, true),
            Opcode::Hide => self.show(id, false),
            Opcode::Stop => {
                let enabled = arg1 != 0;
                let (cursor, star) = (self.system.cursor, self.system.star);
                self.with_object(cursor, |object| object.shown = enabled);
                self.with_object(star, |object| object.active = enabled);
            }
            Opcode::Shake => self.services.video.set_shake(arg1 != 0),
            Opcode::System => {
                let star = self.system.star;
                match arg1 {
                    SYSTEM_STAR_OFF => self.with_object(star, |object| object.active = false),
                    SYSTEM_STAR_ON => self.with_object(star, |object| object.active = true),
                    SYSTEM_QUIT => {
                        self.quit_requested = true;
                        self.log_event("system.quit");
                    }
                    other => log::debug!("system message {other} ignored"),
                }
            }
            Opcode::ZBuffer => self.with_object(id, |object| {
                object.update_z = arg1 != 0;
                if arg2 != WILDCARD {
                    object.z = i32::from(arg2);
                }
            }),
            Opcode::Active => self.with_object(id, |object| object.active = arg1 != 0),
            Opcode::Passive => self.with_object(id, |object| object.active = false),
            Opcode::End => {
                let continuation = self
                    .registry
                    .find_mut(id)
                    .and_then(|object| object.take_pending_for(arg1));
                if let Some(continuation) = continuation {
                    self.resume(continuation);
                }
            }
            Opcode::Jump | Opcode::JumpVich => {
                let Some(object) = self.registry.find(id) else {
                    return;
                };
                let x = if arg1 == WILDCARD { object.walk_x } else { i32::from(arg1) };
                let y = if arg2 == WILDCARD { object.walk_y } else { i32::from(arg2) };
                let petka = self.system.petka;
                self.set_pos(petka, x, y);
                self.log_event(format!("hero.jump petka {x},{y}"));
            }
            Opcode::Walk => {
                if !reacted {
                    let Some(object) = self.registry.find(id) else {
                        return;
                    };
                    let (x, y) = match object.walk_point() {
                        Some(point) => (point.x, point.y),
                        None => (i32::from(arg1), i32::from(arg2)),
                    };
                    self.walk_hero(HeroSlot::Petka, x, y);
                }
            }
            Opcode::WalkTo => {
                let Some(object) = self.registry.find(id) else {
                    return;
                };
                let (walk_x, walk_y) = (object.walk_x, object.walk_y);
                let (x, y) = if arg1 == WILDCARD || arg2 == WILDCARD {
                    (walk_x, walk_y)
                } else {
                    (i32::from(arg1), i32::from(arg2))
                };
                if x != -1 {
                    self.walk_hero(HeroSlot::Petka, x, y);
                    let follows = self
                        .heroes
                        .get(HeroSlot::Petka)
                        .reaction_after_walk()
                        .is_some_and(|after| after.contains(Opcode::GoTo));
                    if follows {
                        self.walk_hero(HeroSlot::Chapayev, walk_x, walk_y);
                    }
                }
            }
            Opcode::WalkVich => {
                let Some(object) = self.registry.find(id) else {
                    return;
                };
                let destination = if arg1 != WILDCARD && arg2 != WILDCARD {
                    Some((i32::from(arg1), i32::from(arg2)))
                } else {
                    object.walk_point().map(|point| (point.x, point.y))
                };
                if let Some((x, y)) = destination {
                    self.walk_hero(HeroSlot::Chapayev, x, y);
                }
            }
            Opcode::Description => {
                let Some(name) = self.registry.find(id).map(|object| object.name.clone()) else {
                    return;
                };
                match self.services.resources.find_description(&name) {
                    Some(text) => self.set_text_description(text, arg1),
                    None => log::warn!("object {name} has no description"),
                }
            }
            Opcode::Use
            | Opcode::Look
            | Opcode::Take
            | Opcode::Talk
            | Opcode::ObjectUse
            | Opcode::InitBg
            | Opcode::LeaveBg
            | Opcode::Half
            | Opcode::Check
            | Opcode::If
            | Opcode::Random
            | Opcode::GoTo => {}
            Opcode::Say
            | Opcode::Me
            | Opcode::Think
            | Opcode::Hint
            | Opcode::Map
            | Opcode::Music
            | Opcode::Part
            | Opcode::Chapter
            | Opcode::Save
            | Opcode::Load
            | Opcode::Timer
            | Opcode::Return
            | Opcode::Pause => {
                log::debug!("opcode {} on object {id} is not implemented", message.opcode);
            }
        }
    }

    fn with_object(&mut self, id: ObjectId, apply: impl FnOnce(&mut SceneObject)) {
        if let Some(object) = self.registry.find_mut(id) {
            apply(object);
        }
    }

    fn case_mut(&mut self) -> Option<&mut InventoryState> {
        self.registry
            .find_mut(self.system.case)
            .and_then(|case| case.inventory_mut())
    }

    /// Arms the cursor with an inventory item.
    pub fn set_inventory_cursor(&mut self, item: ObjectId, resource_id: i32) {
        let cursor = self.system.cursor;
        self.with_object(cursor, |object| {
            if let Some(state) = object.cursor_mut() {
                state.action = CursorAction::ObjectUse;
                state.inv_item = Some(item);
            }
            object.resource_id = resource_id;
        });
    }
}
