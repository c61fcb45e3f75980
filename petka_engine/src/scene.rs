//! The main interface: which room is loaded, which objects are active in it,
//! and how mouse input reaches them.

use serde::Serialize;

use petka_formats::{BackgroundTable, BgInfo};

use crate::engine::{Engine, SystemObjects};
use crate::error::EngineError;
use crate::hero::HeroSlot;
use crate::message::{Message, ObjectId};
use crate::object::{CursorAction, ObjectKind, NO_RESOURCE};
use crate::opcode::Opcode;
use crate::registry::ObjectRegistry;
use crate::services::SoundChannel;

const NAME_ON_SCREEN_COLOR: [u8; 3] = [0xC0, 0xFF, 0xFF];
const NAME_COLOR: [u8; 3] = [0x80, 0x00, 0x00];
const LABEL_OUTLINE: [u8; 3] = [0x0A, 0x0A, 0x0A];

/// Name shown next to the cursor while it hovers an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoverLabel {
    pub text: String,
    pub color: [u8; 3],
    pub outline: [u8; 3],
    pub x: i32,
    pub y: i32,
}

/// Full-screen inventory description overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextDescription {
    pub text: String,
    pub frame: i16,
}

#[derive(Debug, Clone)]
pub struct SceneManager {
    backgrounds: BackgroundTable,
    objects: Vec<ObjectId>,
    room_id: Option<ObjectId>,
    under_cursor: Option<ObjectId>,
    label: Option<HoverLabel>,
    description: Option<TextDescription>,
}

impl SceneManager {
    /// Places every attached object where the background table puts it and
    /// seeds the active list with the cursor, case and star.
    pub fn new(
        backgrounds: BackgroundTable,
        registry: &mut ObjectRegistry,
        system: &SystemObjects,
    ) -> Result<Self, EngineError> {
        for info in backgrounds.entries() {
            for attached in &info.attached {
                let object = registry
                    .find_mut(attached.id)
                    .ok_or(EngineError::UnknownAttachment(attached.id))?;
                object.x = attached.x;
                object.y = attached.y;
                object.z = attached.z;
                object.walk_x = attached.walk_x;
                object.walk_y = attached.walk_y;
            }
        }
        Ok(Self {
            backgrounds,
            objects: vec![system.cursor, system.case, system.star],
            room_id: None,
            under_cursor: None,
            label: None,
            description: None,
        })
    }

    /// Active objects, bottom of the paint order first.
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }

    pub fn room_id(&self) -> Option<ObjectId> {
        self.room_id
    }

    pub fn object_under_cursor(&self) -> Option<ObjectId> {
        self.under_cursor
    }

    pub fn label(&self) -> Option<&HoverLabel> {
        self.label.as_ref()
    }

    pub fn description(&self) -> Option<&TextDescription> {
        self.description.as_ref()
    }

    pub fn backgrounds(&self) -> &BackgroundTable {
        &self.backgrounds
    }

    pub fn find_bg_info(&self, room: ObjectId) -> Option<&BgInfo> {
        self.backgrounds.find(room)
    }

    pub(crate) fn push(&mut self, id: ObjectId) {
        if !self.objects.contains(&id) {
            self.objects.push(id);
        }
    }

    /// Leaves the current input mode.
    fn stop(&mut self) {
        self.under_cursor = None;
        self.label = None;
    }

    /// Stable sort by z; equal depths keep their load order.
    pub(crate) fn sort_by_z(&mut self, registry: &ObjectRegistry) {
        self.objects
            .sort_by_key(|id| registry.find(*id).map(|object| object.z).unwrap_or(i32::MAX));
    }
}

impl Engine {
    /// Leaves initialisation, brings the heroes on stage and enters the
    /// room named `start_room`.
    pub fn start(&mut self, start_room: &str) -> Result<(), EngineError> {
        let room = self
            .registry
            .find_by_name(start_room)
            .map(|object| object.id)
            .ok_or_else(|| EngineError::UnknownStartRoom(start_room.to_string()))?;
        self.dispatch_pending();
        self.is_initing = false;
        self.scene.push(self.system.petka);
        self.scene.push(self.system.chapayev);
        self.load_room(room, false);
        Ok(())
    }

    pub fn load_room(&mut self, id: ObjectId, from_save: bool) {
        self.scene.stop();
        if self.scene.room_id == Some(id) {
            return;
        }
        let Some(room) = self.registry.find(id) else {
            log::warn!("cannot load unknown room {id}");
            return;
        };
        let room_resource = room.resource_id;
        let (music, fx) = room.room_audio().unwrap_or((NO_RESOURCE, NO_RESOURCE));

        self.unload_room(from_save);
        self.scene.room_id = Some(id);
        self.services.resources.load_bitmap(room_resource);
        self.scene.push(id);

        let attached: Vec<ObjectId> = match self.scene.find_bg_info(id) {
            Some(info) => info.attached_ids().collect(),
            None => {
                log::warn!("room {id} has no background entry");
                Vec::new()
            }
        };
        for object_id in attached {
            self.load_sound(object_id);
            if let Some(object) = self.registry.find(object_id) {
                if object.shown || object.active {
                    let _ = self.services.resources.load_flic(object.resource_id);
                }
            }
            self.scene.push(object_id);
        }

        if self.music_id != music {
            self.swap_track(self.music_id, music);
            self.music_id = music;
        }
        if self.fx_id != fx {
            self.swap_track(self.fx_id, fx);
            self.fx_id = fx;
        }

        self.log_event(format!("room.load {id}"));
        if !from_save {
            self.add_message_for_all_objects(Opcode::InitBg, Some(id));
        }
        self.services.video.update_time();
    }

    fn swap_track(&mut self, old: i32, new: i32) {
        if let Some(name) = self.services.resources.find_sound_name(old) {
            self.services.sounds.remove_sound(&name);
        }
        if let Some(name) = self.services.resources.find_sound_name(new) {
            if self.services.sounds.add_sound(&name, SoundChannel::Music) {
                self.services.sounds.play(&name, true);
            }
        }
    }

    pub fn unload_room(&mut self, from_save: bool) {
        let Some(room) = self.scene.room_id else {
            return;
        };
        if self.registry.find(room).is_none() {
            return;
        }
        if !from_save {
            self.add_message_for_all_objects(Opcode::LeaveBg, Some(room));
        }
        self.scene.room_id = None;
        self.services.resources.clear_unneeded();
        self.services.sounds.remove_sounds_with_type(SoundChannel::Sfx);

        let Some(info) = self.scene.find_bg_info(room).cloned() else {
            log::warn!("room {room} has no background entry; keeping its objects");
            return;
        };
        let mut removed = Vec::new();
        self.scene.objects.retain(|id| {
            let leaving = *id == room || info.contains(*id);
            if leaving && *id != room {
                removed.push(*id);
            }
            !leaving
        });
        for id in removed {
            self.remove_sound(id);
        }
        self.log_event(format!("room.unload {room}"));
    }

    /// Whether the point lands on an opaque pixel of the object.
    pub fn is_in_point(&mut self, id: ObjectId, x: i32, y: i32) -> bool {
        let Some(object) = self.registry.find(id) else {
            return false;
        };
        if !object.active {
            return false;
        }
        match object.kind {
            ObjectKind::Cursor(_) => return false,
            ObjectKind::Star { .. } | ObjectKind::Case(_) if !object.shown => return false,
            _ => {}
        }
        let (left, top) = (object.x, object.y);
        self.services
            .resources
            .load_flic(object.resource_id)
            .is_some_and(|flc| flc.hit(x - left, y - top))
    }

    /// Topmost active object under the point.
    pub fn hit_test(&mut self, x: i32, y: i32) -> Option<ObjectId> {
        let candidates: Vec<ObjectId> = self.scene.objects.iter().rev().copied().collect();
        candidates
            .into_iter()
            .find(|id| self.is_in_point(*id, x, y))
    }

    pub fn on_left_button_down(&mut self, x: i32, y: i32) {
        self.log_event(format!("input.click {x},{y}"));
        if self.scene.description.is_some() {
            self.remove_text_description();
            return;
        }
        let cursor_shown = self
            .registry
            .find(self.system.cursor)
            .is_some_and(|cursor| cursor.shown);
        if !cursor_shown {
            self.services.dialogue.next(-1);
            return;
        }
        if let Some(hit) = self.hit_test(x, y) {
            self.on_click(hit, x, y);
            return;
        }
        match self.cursor_action() {
            CursorAction::Walk => {
                let petka = self.heroes.get_mut(HeroSlot::Petka);
                if let Some(after) = petka.clear_reaction_after_walk() {
                    if after.contains(Opcode::GoTo) {
                        self.heroes.get_mut(HeroSlot::Chapayev).stop_walk();
                    }
                }
                self.walk_hero(HeroSlot::Petka, x, y);
            }
            CursorAction::ObjectUseChapayev => self.walk_hero(HeroSlot::Chapayev, x, y),
            _ => {}
        }
    }

    /// Reacts to a click that landed on `id`.
    pub fn on_click(&mut self, id: ObjectId, x: i32, y: i32) {
        let Some(object) = self.registry.find(id) else {
            return;
        };
        let (left, top) = (object.x, object.y);
        match &object.kind {
            ObjectKind::Cursor(_) => {}
            ObjectKind::Case(_) => log::debug!("case clicked at {x},{y}"),
            ObjectKind::Star { buttons } => {
                let action = buttons
                    .iter()
                    .find(|button| button.area.contains(x - left, y - top))
                    .map(|button| button.action);
                if let Some(action) = action {
                    self.set_cursor_action(action);
                }
                self.show(id, false);
            }
            _ => {
                let cursor = self.registry.find(self.system.cursor).and_then(|c| c.cursor());
                let Some(state) = cursor.cloned() else {
                    return;
                };
                let (px, py) = (x as i16, y as i16);
                let message = match state.action {
                    CursorAction::Look => Message::new(id, Opcode::Look),
                    CursorAction::Walk => Message::new(id, Opcode::Walk).with_args(px, py, 0),
                    CursorAction::Use => Message::new(id, Opcode::Use),
                    CursorAction::Take => Message::new(id, Opcode::Take),
                    CursorAction::Talk => Message::new(id, Opcode::Talk),
                    CursorAction::ObjectUseChapayev => Message::new(id, Opcode::ObjectUse)
                        .with_args(px, py, 0)
                        .with_sender(Some(self.system.chapayev)),
                    CursorAction::ObjectUse => {
                        Message::new(id, Opcode::ObjectUse).with_sender(state.inv_item)
                    }
                };
                self.log_event(format!("input.hit {id} {}", message.opcode));
                self.add_message(message);
            }
        }
    }

    pub fn on_right_button_down(&mut self, x: i32, y: i32) {
        self.log_event(format!("input.right_click {x},{y}"));
        let star = self.system.star;
        if !self.registry.find(star).is_some_and(|star| star.active) {
            return;
        }
        let case_shown = self
            .registry
            .find(self.system.case)
            .is_some_and(|case| case.shown);
        if case_shown && self.cursor_action() == CursorAction::ObjectUse {
            self.set_cursor_action(CursorAction::Take);
            return;
        }
        self.place_star(x, y);
        let shown = self.registry.find(star).is_some_and(|star| star.shown);
        self.show(star, !shown);
    }

    /// Centres the star on the point, kept fully on screen.
    fn place_star(&mut self, x: i32, y: i32) {
        let star = self.system.star;
        let Some(resource_id) = self.registry.find(star).map(|star| star.resource_id) else {
            return;
        };
        let size = self
            .services
            .resources
            .load_flic(resource_id)
            .map(|flc| (flc.bounds.width(), flc.bounds.height()));
        let screen = self.config.screen();
        let (left, top) = match size {
            Some((width, height)) => (
                (x - width / 2).clamp(0, (screen.width() - width).max(0)),
                (y - height / 2).clamp(0, (screen.height() - height).max(0)),
            ),
            None => (x, y),
        };
        if let Some(star) = self.registry.find_mut(star) {
            star.x = left;
            star.y = top;
        }
    }

    pub fn on_mouse_move(&mut self, x: i32, y: i32) {
        let previous = self.scene.under_cursor.take();
        let cursor_id = self.system.cursor;
        let cursor_shown = self.registry.find(cursor_id).is_some_and(|c| c.shown);
        if cursor_shown {
            self.scene.under_cursor = self.hit_test(x, y);
        }
        let under = self.scene.under_cursor;
        if let Some(cursor) = self.registry.find_mut(cursor_id) {
            cursor.animate = under.is_some();
            cursor.x = x;
            cursor.y = y;
        }

        if self.services.dialogue.is_active() {
            return;
        }
        match under {
            Some(id) if previous != under => {
                let Some(object) = self.registry.find(id) else {
                    return;
                };
                let (text, color) = match &object.name_on_screen {
                    Some(name) => (name.clone(), NAME_ON_SCREEN_COLOR),
                    None => (object.name.clone(), NAME_COLOR),
                };
                self.scene.label = Some(HoverLabel {
                    text,
                    color,
                    outline: LABEL_OUTLINE,
                    x,
                    y,
                });
            }
            None if previous.is_some() => self.scene.label = None,
            _ => {}
        }
    }

    pub fn cursor_action(&self) -> CursorAction {
        self.registry
            .find(self.system.cursor)
            .and_then(|cursor| cursor.cursor())
            .map(|state| state.action)
            .unwrap_or_default()
    }

    /// Switches the cursor to `action` and its matching animation.
    pub fn set_cursor_action(&mut self, action: CursorAction) {
        let resource_id = self.config.cursor_resource_base + action.index();
        if let Some(cursor) = self.registry.find_mut(self.system.cursor) {
            if let Some(state) = cursor.cursor_mut() {
                state.action = action;
                if action != CursorAction::ObjectUse {
                    state.inv_item = None;
                }
            }
            cursor.resource_id = resource_id;
        }
        self.log_event(format!("cursor.action {}", action.index()));
    }

    pub fn set_text_description(&mut self, text: String, frame: i16) {
        if let Some(star) = self.registry.find_mut(self.system.star) {
            star.active = false;
        }
        self.scene.under_cursor = None;
        self.scene.label = None;
        self.scene.description = Some(TextDescription { text, frame });
        self.log_event(format!("description.show {frame}"));
    }

    pub fn remove_text_description(&mut self) {
        if self.scene.description.take().is_none() {
            return;
        }
        self.scene.under_cursor = None;
        if let Some(star) = self.registry.find_mut(self.system.star) {
            star.active = true;
        }
        self.log_event("description.hide");
    }
}
