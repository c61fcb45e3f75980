//! Builders shared by the unit tests.

use std::ops::{Deref, DerefMut};

use petka_formats::{BackgroundTable, BgInfo};

use crate::animation::{Animation, Frame, Pixels, Point, Rect};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::hero::HeroSlot;
use crate::inventory::InventoryState;
use crate::message::ObjectId;
use crate::object::{CursorState, ObjectKind, SceneObject};
use crate::recording::{recording_services, HandlerTable, MemoryResources, ServiceLog};
use crate::registry::ObjectRegistry;

pub const CURSOR: ObjectId = 1;
pub const CASE: ObjectId = 2;
pub const STAR: ObjectId = 3;

/// Opaque single-frame animation whose mask covers the whole frame.
pub fn solid_animation(width: i32, height: i32) -> Animation {
    let frame = Frame {
        offset: Point::new(0, 0),
        width: width as u32,
        height: height as u32,
        pixels: Pixels::Rgb565 {
            transparent: 0,
            data: vec![0xFFFF; (width * height) as usize],
        },
    };
    Animation::new(Rect::sized(width, height), vec![frame], 100)
        .with_mask_rects(vec![Rect::sized(width, height)])
}

pub struct EngineBuilder {
    objects: Vec<SceneObject>,
    backgrounds: Vec<BgInfo>,
    resources: MemoryResources,
    handlers: HandlerTable,
    config: EngineConfig,
}

impl EngineBuilder {
    pub fn new() -> Self {
        let objects = vec![
            SceneObject::new(CURSOR, "CURSOR", ObjectKind::Cursor(CursorState::default())),
            SceneObject::new(CASE, "CASE", ObjectKind::Case(InventoryState::new())),
            SceneObject::new(STAR, "STAR", ObjectKind::Star { buttons: Vec::new() }),
            SceneObject::new(10, "PETKA", ObjectKind::Hero { slot: HeroSlot::Petka }),
            SceneObject::new(
                11,
                "CHAPAYEV",
                ObjectKind::Hero {
                    slot: HeroSlot::Chapayev,
                },
            ),
        ];
        Self {
            objects,
            backgrounds: Vec::new(),
            resources: MemoryResources::default(),
            handlers: HandlerTable::default(),
            config: EngineConfig {
                rng_seed: Some(7),
                ..EngineConfig::default()
            },
        }
    }

    pub fn object(
        mut self,
        id: ObjectId,
        name: &str,
        kind: ObjectKind,
        configure: impl FnOnce(&mut SceneObject),
    ) -> Self {
        let mut object = SceneObject::new(id, name, kind);
        configure(&mut object);
        self.objects.push(object);
        self
    }

    pub fn edit(mut self, id: ObjectId, configure: impl FnOnce(&mut SceneObject)) -> Self {
        if let Some(object) = self.objects.iter_mut().find(|object| object.id == id) {
            configure(object);
        }
        self
    }

    pub fn background(mut self, info: BgInfo) -> Self {
        self.backgrounds.push(info);
        self
    }

    pub fn resources(mut self, configure: impl FnOnce(MemoryResources) -> MemoryResources) -> Self {
        self.resources = configure(std::mem::take(&mut self.resources));
        self
    }

    pub fn handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    pub fn config(mut self, configure: impl FnOnce(&mut EngineConfig)) -> Self {
        configure(&mut self.config);
        self
    }

    pub fn try_build(self) -> Result<TestEngine, EngineError> {
        let mut registry = ObjectRegistry::new();
        for object in self.objects {
            registry.register(object)?;
        }
        let (services, log) = recording_services(self.resources, self.handlers);
        let engine = Engine::new(
            self.config,
            registry,
            BackgroundTable::new(self.backgrounds),
            services,
        )?;
        Ok(TestEngine { engine, log })
    }

    pub fn build(self) -> TestEngine {
        self.try_build().expect("test engine builds")
    }
}

/// Engine plus the log its recording collaborators write to.
pub struct TestEngine {
    engine: Engine,
    log: ServiceLog,
}

impl TestEngine {
    pub fn service_log(&self) -> &ServiceLog {
        &self.log
    }
}

impl Deref for TestEngine {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

impl DerefMut for TestEngine {
    fn deref_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}
