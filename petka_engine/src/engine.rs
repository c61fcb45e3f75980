use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use petka_formats::BackgroundTable;

use crate::animation::Rect;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::hero::{HeroSlot, Heroes};
use crate::message::{Continuation, Message, ObjectId};
use crate::object::{ObjectKind, SceneObject, NO_RESOURCE};
use crate::opcode::Opcode;
use crate::queue::MessageQueue;
use crate::registry::ObjectRegistry;
use crate::scene::SceneManager;
use crate::services::{Services, SoundChannel};

/// Ids of the objects every room shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemObjects {
    pub cursor: ObjectId,
    pub case: ObjectId,
    pub star: ObjectId,
    pub petka: ObjectId,
    pub chapayev: ObjectId,
}

impl SystemObjects {
    pub fn from_registry(registry: &ObjectRegistry) -> Result<Self, EngineError> {
        let find = |label: &'static str, wanted: fn(&ObjectKind) -> bool| {
            registry
                .iter()
                .find(|object| wanted(&object.kind))
                .map(|object| object.id)
                .ok_or(EngineError::MissingSystemObject(label))
        };
        let hero = |slot: HeroSlot| {
            registry
                .iter()
                .find(|object| object.hero_slot() == Some(slot))
                .map(|object| object.id)
                .ok_or(EngineError::MissingHero(slot))
        };
        Ok(Self {
            cursor: find("cursor", |kind| matches!(kind, ObjectKind::Cursor(_)))?,
            case: find("case", |kind| matches!(kind, ObjectKind::Case(_)))?,
            star: find("star", |kind| matches!(kind, ObjectKind::Star { .. }))?,
            petka: hero(HeroSlot::Petka)?,
            chapayev: hero(HeroSlot::Chapayev)?,
        })
    }

    pub fn hero(&self, slot: HeroSlot) -> ObjectId {
        match slot {
            HeroSlot::Petka => self.petka,
            HeroSlot::Chapayev => self.chapayev,
        }
    }
}

/// One entry of the painter-ordered draw list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawItem {
    pub id: ObjectId,
    pub resource_id: i32,
    pub frame: usize,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Explicit game context: the object arena, the message queue, the active
/// scene and the collaborators, passed around instead of global singletons.
#[derive(Debug)]
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) registry: ObjectRegistry,
    pub(crate) queue: MessageQueue,
    pub(crate) scene: SceneManager,
    pub(crate) heroes: Heroes,
    pub(crate) services: Services,
    pub(crate) system: SystemObjects,
    pub(crate) rng: StdRng,
    pub(crate) is_initing: bool,
    pub(crate) music_id: i32,
    pub(crate) fx_id: i32,
    pub(crate) quit_requested: bool,
    events: Vec<String>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        mut registry: ObjectRegistry,
        backgrounds: BackgroundTable,
        services: Services,
    ) -> Result<Self, EngineError> {
        let system = SystemObjects::from_registry(&registry)?;
        let scene = SceneManager::new(backgrounds, &mut registry, &system)?;
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            registry,
            queue: MessageQueue::new(),
            scene,
            heroes: Heroes::default(),
            services,
            system,
            rng,
            is_initing: true,
            music_id: NO_RESOURCE,
            fx_id: NO_RESOURCE,
            quit_requested: false,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.registry.find(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.registry.find_mut(id)
    }

    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    pub fn heroes(&self) -> &Heroes {
        &self.heroes
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut Services {
        &mut self.services
    }

    pub fn system(&self) -> &SystemObjects {
        &self.system
    }

    pub fn queue(&self) -> &MessageQueue {
        &self.queue
    }

    pub fn is_initing(&self) -> bool {
        self.is_initing
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn music_id(&self) -> i32 {
        self.music_id
    }

    pub fn fx_id(&self) -> i32 {
        self.fx_id
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn log_event(&mut self, event: impl Into<String>) {
        if self.config.record_events {
            self.events.push(event.into());
        }
    }

    pub fn add_message(&mut self, message: Message) {
        self.queue.push(message);
    }

    /// Queues `opcode` for every registered object, in registration order.
    pub fn add_message_for_all_objects(&mut self, opcode: Opcode, sender: Option<ObjectId>) {
        for id in self.registry.ids() {
            self.queue
                .push(Message::new(id, opcode).with_sender(sender));
        }
    }

    pub(crate) fn random_below(&mut self, bound: i16) -> i16 {
        self.rng.gen_range(0..bound)
    }

    /// One game tick.
    pub fn update(&mut self, delta_ms: u32) {
        self.dispatch_pending();
        self.update_animations(delta_ms);
        self.update_walks(delta_ms);
        self.update_z_order();
    }

    /// Drains the queue, including messages queued while draining.
    pub fn dispatch_pending(&mut self) {
        let limit = self.config.max_messages_per_tick.max(1);
        let mut handled = 0;
        while let Some(message) = self.queue.next() {
            self.deliver(message);
            handled += 1;
            if handled >= limit && !self.queue.is_empty() {
                log::warn!(
                    "message budget of {limit} reached; {} messages deferred to the next tick",
                    self.queue.len()
                );
                break;
            }
        }
    }

    fn deliver(&mut self, message: Message) {
        if self.registry.find(message.target).is_none() {
            log::warn!(
                "dropping {} for unknown object {}",
                message.opcode,
                message.target
            );
            return;
        }
        self.process_message(message.target, &message);
    }

    fn update_animations(&mut self, delta_ms: u32) {
        for id in self.scene.objects().to_vec() {
            let Some(object) = self.registry.find_mut(id) else {
                continue;
            };
            if !object.animate || !object.shown {
                continue;
            }
            object.time = object.time.saturating_add(delta_ms);
            let resource_id = object.resource_id;
            let Some(flc) = self.services.resources.load_flic(resource_id) else {
                continue;
            };
            let frame_count = flc.frame_count();
            if frame_count <= 1 || flc.delay_ms == 0 {
                continue;
            }
            while object.time >= flc.delay_ms {
                if object.sound.is_some() && flc.current_frame_index() == 0 {
                    object.start_sound = true;
                }
                self.services
                    .video
                    .add_dirty_rect(flc.bounds.translated(object.x, object.y));
                flc.advance();
                let current = flc.current_frame_index();
                if current == frame_count - 1 {
                    self.queue
                        .push(Message::new(id, Opcode::End).with_args(resource_id as i16, 0, 0));
                }
                if current + 1 == frame_count / 2 {
                    self.queue
                        .push(Message::new(id, Opcode::Half).with_args(resource_id as i16, 0, 0));
                }
                object.time -= flc.delay_ms;
            }
        }
    }

    fn update_walks(&mut self, delta_ms: u32) {
        if delta_ms == 0 {
            return;
        }
        let distance = self.config.walk_speed * delta_ms as f32;
        for slot in HeroSlot::ALL {
            let hero_id = self.system.hero(slot);
            let Some(from) = self.registry.find(hero_id).map(SceneObject::position) else {
                continue;
            };
            let Some((next, arrived)) = self.heroes.get(slot).step(from, distance) else {
                continue;
            };
            if let Some(hero) = self.registry.find_mut(hero_id) {
                hero.x = next.x;
                hero.y = next.y;
            }
            if arrived {
                self.finish_walk(slot);
            }
        }
    }

    fn update_z_order(&mut self) {
        for id in self.scene.objects().to_vec() {
            let Some(object) = self.registry.find_mut(id) else {
                continue;
            };
            if !object.animate || !object.shown || !object.update_z {
                continue;
            }
            if let Some(flc) = self.services.resources.load_flic(object.resource_id) {
                object.z = flc
                    .mask_bottom()
                    .map(|bottom| (object.y + bottom).max(1))
                    .unwrap_or(1);
            }
        }
        self.scene.sort_by_z(&self.registry);
    }

    pub fn walk_hero(&mut self, slot: HeroSlot, x: i32, y: i32) {
        self.heroes.get_mut(slot).walk(x, y);
        self.log_event(format!("walk.start {} {x},{y}", slot.label()));
    }

    /// Completes a hero's walk: the hero lands on its destination and the
    /// parked continuation, if any, resumes.
    pub fn finish_walk(&mut self, slot: HeroSlot) {
        let destination = self.heroes.get(slot).destination();
        let hero_id = self.system.hero(slot);
        if let (Some(target), Some(hero)) = (destination, self.registry.find_mut(hero_id)) {
            hero.x = target.x;
            hero.y = target.y;
        }
        self.log_event(format!("walk.finish {}", slot.label()));
        if let Some(continuation) = self.heroes.get_mut(slot).arrive() {
            self.resume(continuation);
        }
    }

    /// Closes the dialogue and resumes the reaction waiting for it.
    pub fn end_dialogue(&mut self) {
        self.services.dialogue.end();
        self.log_event("dialog.end");
        if let Some(continuation) = self.services.dialogue.take_reaction() {
            self.resume(continuation);
        }
    }

    pub(crate) fn resume(&mut self, continuation: Continuation) {
        let (owner, reaction, next) = continuation.into_parts();
        if self.registry.find(owner).is_none() {
            log::warn!("continuation owner {owner} vanished; dropping reaction");
            return;
        }
        self.log_event(format!("reaction.resume {owner} {} @{next}", reaction.opcode));
        self.process_reaction(owner, reaction, next, None);
    }

    fn animation_area(&mut self, id: ObjectId) -> Option<Rect> {
        let object = self.registry.find(id)?;
        let (x, y) = (object.x, object.y);
        let flc = self.services.resources.load_flic(object.resource_id)?;
        Some(flc.bounds.translated(x, y))
    }

    pub(crate) fn mark_dirty(&mut self, id: ObjectId) {
        if let Some(area) = self.animation_area(id) {
            self.services.video.add_dirty_rect(area);
        }
    }

    /// Switches the object's animation.
    pub fn play(&mut self, id: ObjectId, resource_id: i32, kind: i16) {
        if self.registry.find(id).is_none() {
            return;
        }
        if self.is_initing {
            if let Some(object) = self.registry.find_mut(id) {
                object.resource_id = resource_id;
            }
        } else {
            if self.registry.find(id).is_some_and(|object| object.looped_sound) {
                self.remove_sound(id);
            }
            self.mark_dirty(id);
            if let Some(object) = self.registry.find_mut(id) {
                object.resource_id = resource_id;
                object.time = 0;
            }
            self.load_sound(id);
            if let Some(flc) = self.services.resources.load_flic(resource_id) {
                flc.rewind();
            }
        }
        match kind {
            1 => {
                if let Some(flc) = self.services.resources.load_flic(resource_id) {
                    flc.rewind();
                }
                self.services.video.make_all_dirty();
            }
            2 => {
                let _ = self.services.resources.load_flic(resource_id);
            }
            _ => {}
        }
        if let Some(object) = self.registry.find_mut(id) {
            object.looped_sound = kind == 5;
        }
    }

    pub fn load_sound(&mut self, id: ObjectId) {
        let Some(object) = self.registry.find(id) else {
            return;
        };
        let name = self.services.resources.find_sound_name(object.resource_id);
        let loaded = name
            .filter(|name| self.services.sounds.add_sound(name, SoundChannel::Sfx));
        if let Some(object) = self.registry.find_mut(id) {
            object.sound = loaded;
            object.start_sound = false;
        }
    }

    pub fn remove_sound(&mut self, id: ObjectId) {
        let Some(object) = self.registry.find(id) else {
            return;
        };
        if let Some(name) = self.services.resources.find_sound_name(object.resource_id) {
            self.services.sounds.remove_sound(&name);
        }
        if let Some(object) = self.registry.find_mut(id) {
            object.sound = None;
        }
    }

    /// Moves an object. Non-hero objects only move once their animation is loaded.
    pub fn set_pos(&mut self, id: ObjectId, x: i32, y: i32) {
        let Some(object) = self.registry.find(id) else {
            return;
        };
        let is_hero = object.hero_slot().is_some();
        let (old_x, old_y) = (object.x, object.y);
        let masks = self
            .services
            .resources
            .load_flic(object.resource_id)
            .map(|flc| flc.mask_rects.clone());
        match masks {
            Some(masks) => {
                for rect in &masks {
                    self.services.video.add_dirty_rect(rect.translated(old_x, old_y));
                    self.services.video.add_dirty_rect(rect.translated(x, y));
                }
            }
            None if !is_hero => return,
            None => {}
        }
        if let Some(object) = self.registry.find_mut(id) {
            object.x = x;
            object.y = y;
        }
    }

    pub fn show(&mut self, id: ObjectId, visible: bool) {
        if self.scene.contains(id) {
            self.mark_dirty(id);
        }
        if let Some(object) = self.registry.find_mut(id) {
            object.shown = visible;
        }
    }

    /// Painter-ordered draw list for the current frame. Sounds queued to
    /// start with the animation begin playing here.
    pub fn draw_list(&mut self) -> Vec<DrawItem> {
        let screen = self.config.screen();
        let mut items = Vec::new();
        for id in self.scene.objects().to_vec() {
            let Some(object) = self.registry.find_mut(id) else {
                continue;
            };
            if !object.shown || object.resource_id == NO_RESOURCE {
                continue;
            }
            let Some(flc) = self.services.resources.load_flic(object.resource_id) else {
                continue;
            };
            if object.animate && object.start_sound {
                if let Some(name) = object.sound.clone() {
                    self.services.sounds.play(&name, object.looped_sound);
                    if !object.looped_sound {
                        object.sound = None;
                    }
                }
                object.start_sound = false;
            }
            let dest = flc.bounds.translated(object.x, object.y);
            if screen.intersection(&dest).is_empty() {
                continue;
            }
            items.push(DrawItem {
                id,
                resource_id: object.resource_id,
                frame: flc.current_frame_index(),
                x: object.x,
                y: object.y,
                z: object.z,
            });
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Point;
    use crate::recording::ServiceEvent;
    use crate::test_support::{solid_animation, EngineBuilder, TestEngine};

    const FAN: ObjectId = 100;

    fn fan_engine(frames: usize) -> TestEngine {
        let mut flc = solid_animation(10, 10);
        flc.frames = vec![flc.frames[0].clone(); frames];
        let mut engine = EngineBuilder::new()
            .object(FAN, "FAN", ObjectKind::Plain, |fan| fan.resource_id = 30)
            .resources(|resources| {
                resources
                    .with_animation(30, flc)
                    .with_sound(30, "whirr.wav")
                    .with_sound(31, "hum.wav")
            })
            .build();
        engine.scene.push(FAN);
        engine.is_initing = false;
        engine
    }

    #[test]
    fn system_objects_must_all_exist() {
        let mut registry = ObjectRegistry::new();
        registry
            .register(SceneObject::new(1, "CURSOR", ObjectKind::Cursor(Default::default())))
            .expect("register");
        assert!(matches!(
            SystemObjects::from_registry(&registry),
            Err(EngineError::MissingSystemObject("case"))
        ));
    }

    #[test]
    fn animation_ticks_emit_half_then_end() {
        let mut engine = fan_engine(4);

        engine.update(250);
        let queued: Vec<_> = engine.queue().pending().map(|m| (m.opcode, m.arg1)).collect();
        assert_eq!(queued, vec![(Opcode::Half, 30)]);

        engine.update(100);
        let queued: Vec<_> = engine.queue().pending().map(|m| (m.opcode, m.sender)).collect();
        assert_eq!(queued, vec![(Opcode::End, None)]);
    }

    #[test]
    fn single_frame_and_hidden_objects_do_not_animate() {
        let mut engine = fan_engine(1);
        engine.update(1000);
        assert!(engine.queue().is_empty());

        let mut engine = fan_engine(4);
        engine.object_mut(FAN).expect("fan").shown = false;
        engine.update(1000);
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn play_while_initing_only_swaps_resource() {
        let mut engine = fan_engine(4);
        engine.is_initing = true;
        engine.play(FAN, 31, 0);
        let fan = engine.object(FAN).expect("fan");
        assert_eq!(fan.resource_id, 31);
        assert!(fan.sound.is_none());
        assert!(engine.service_log().events().is_empty());
    }

    #[test]
    fn play_loads_sound_and_tracks_looping() {
        let mut engine = fan_engine(4);
        engine.play(FAN, 31, 5);
        let fan = engine.object(FAN).expect("fan");
        assert_eq!(fan.sound.as_deref(), Some("hum.wav"));
        assert!(fan.looped_sound);

        engine.play(FAN, 30, 1);
        let fan = engine.object(FAN).expect("fan");
        assert_eq!(fan.sound.as_deref(), Some("whirr.wav"));
        assert!(!fan.looped_sound);
        let log = engine.service_log();
        assert!(log.contains(&ServiceEvent::SoundRemove {
            name: "hum.wav".to_string()
        }));
        assert!(log.contains(&ServiceEvent::AllDirty));
    }

    #[test]
    fn draw_list_starts_one_shot_sound_once() {
        let mut engine = fan_engine(4);
        engine.load_sound(FAN);
        engine.update(100);
        assert!(engine.object(FAN).expect("fan").start_sound);

        let items = engine.draw_list();
        assert!(items.iter().any(|item| item.id == FAN && item.frame == 1));
        assert!(engine.service_log().contains(&ServiceEvent::SoundPlay {
            name: "whirr.wav".to_string(),
            looped: false
        }));
        let fan = engine.object(FAN).expect("fan");
        assert!(fan.sound.is_none() && !fan.start_sound);
    }

    #[test]
    fn off_screen_objects_are_not_drawn() {
        let mut engine = fan_engine(4);
        engine.object_mut(FAN).expect("fan").x = 2000;
        assert!(engine.draw_list().is_empty());
    }

    #[test]
    fn message_budget_defers_the_rest() {
        let mut engine = EngineBuilder::new()
            .config(|config| config.max_messages_per_tick = 2)
            .build();
        engine.add_message_for_all_objects(Opcode::Look, None);
        assert_eq!(engine.queue().len(), 5);
        engine.dispatch_pending();
        assert_eq!(engine.queue().len(), 3);
        engine.dispatch_pending();
        engine.dispatch_pending();
        assert!(engine.queue().is_empty());
    }

    #[test]
    fn messages_to_unknown_objects_are_dropped() {
        let mut engine = EngineBuilder::new().build();
        engine.add_message(Message::new(999, Opcode::Show));
        engine.dispatch_pending();
        assert!(engine.queue().is_empty());
        assert!(engine.events().is_empty());
    }

    #[test]
    fn heroes_walk_at_configured_speed_and_land_on_target() {
        let mut engine = EngineBuilder::new()
            .config(|config| config.walk_speed = 0.1)
            .build();
        let petka = engine.system().petka;
        engine.walk_hero(HeroSlot::Petka, 30, 0);

        engine.update(100);
        assert_eq!(engine.object(petka).map(SceneObject::position), Some(Point::new(10, 0)));

        engine.update(1000);
        assert_eq!(engine.object(petka).map(SceneObject::position), Some(Point::new(30, 0)));
        assert!(!engine.heroes().get(HeroSlot::Petka).is_walking());
        assert!(engine.events().iter().any(|event| event == "walk.finish petka"));
    }
}
