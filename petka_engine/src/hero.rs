use serde::{Deserialize, Serialize};

use crate::animation::Point;
use crate::message::Continuation;

/// The two controllable heroes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroSlot {
    Petka,
    Chapayev,
}

impl HeroSlot {
    pub const ALL: [HeroSlot; 2] = [HeroSlot::Petka, HeroSlot::Chapayev];

    pub fn label(self) -> &'static str {
        match self {
            HeroSlot::Petka => "petka",
            HeroSlot::Chapayev => "chapayev",
        }
    }
}

/// Straight-line walk state for one hero plus the continuation to resume
/// once the hero arrives.
#[derive(Debug, Clone, Default)]
pub struct WalkController {
    destination: Option<Point>,
    after_walk: Option<Continuation>,
}

impl WalkController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn walk(&mut self, x: i32, y: i32) {
        self.destination = Some(Point::new(x, y));
    }

    pub fn stop_walk(&mut self) -> Option<Point> {
        self.destination.take()
    }

    pub fn is_walking(&self) -> bool {
        self.destination.is_some()
    }

    pub fn destination(&self) -> Option<Point> {
        self.destination
    }

    /// Parks `continuation` until the walk completes. Returns whatever was
    /// parked before; at most one continuation is outstanding.
    pub fn set_reaction_after_walk(&mut self, continuation: Continuation) -> Option<Continuation> {
        self.after_walk.replace(continuation)
    }

    pub fn reaction_after_walk(&self) -> Option<&Continuation> {
        self.after_walk.as_ref()
    }

    pub fn clear_reaction_after_walk(&mut self) -> Option<Continuation> {
        self.after_walk.take()
    }

    /// Next position when moving at most `distance` pixels from `from`, and
    /// whether that position is the destination.
    pub fn step(&self, from: Point, distance: f32) -> Option<(Point, bool)> {
        let target = self.destination?;
        let dx = (target.x - from.x) as f32;
        let dy = (target.y - from.y) as f32;
        let length = (dx * dx + dy * dy).sqrt();
        let distance = distance.max(1.0);
        if length <= distance {
            return Some((target, true));
        }
        let scale = distance / length;
        let next = Point::new(
            from.x + (dx * scale).round() as i32,
            from.y + (dy * scale).round() as i32,
        );
        Some((next, next == target))
    }

    /// Ends the walk and hands back the parked continuation, if any.
    pub(crate) fn arrive(&mut self) -> Option<Continuation> {
        self.destination = None;
        self.after_walk.take()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Heroes {
    petka: WalkController,
    chapayev: WalkController,
}

impl Heroes {
    pub fn get(&self, slot: HeroSlot) -> &WalkController {
        match slot {
            HeroSlot::Petka => &self.petka,
            HeroSlot::Chapayev => &self.chapayev,
        }
    }

    pub fn get_mut(&mut self, slot: HeroSlot) -> &mut WalkController {
        match slot {
            HeroSlot::Petka => &mut self.petka,
            HeroSlot::Chapayev => &mut self.chapayev,
        }
    }
}
