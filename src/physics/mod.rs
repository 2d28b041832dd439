//! Body engine capability consumed by the board.
//!
//! The board never integrates motion itself. It asks a [`PhysicsWorld`] to create
//! positioned circular bodies, push them around with forces, rescale them and
//! answer point queries. [`CircleWorld`] is the small engine the desktop app and
//! the tests run on; anything implementing the trait can replace it.

pub mod circle_world;

use egui::{Pos2, Rect, Vec2};

pub use circle_world::CircleWorld;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodyOptions {
    pub friction_air: f32,
    pub restitution: f32,
    pub is_static: bool,
    /// Bodies sharing the same negative group never collide with each other.
    pub collision_group: i32,
}

impl Default for BodyOptions {
    fn default() -> Self {
        Self {
            friction_air: 0.01,
            restitution: 0.0,
            is_static: false,
            collision_group: 0,
        }
    }
}

impl BodyOptions {
    pub fn bubble() -> Self {
        Self {
            friction_air: 0.05,
            restitution: 0.3,
            is_static: false,
            collision_group: 1,
        }
    }

    pub fn fixed() -> Self {
        Self { is_static: true, ..Self::default() }
    }
}

pub trait PhysicsWorld {
    fn create_circle(&mut self, position: Pos2, radius: f32, options: BodyOptions) -> BodyId;
    fn remove_body(&mut self, id: BodyId) -> bool;
    fn contains(&self, id: BodyId) -> bool;

    fn position(&self, id: BodyId) -> Option<Pos2>;
    fn set_position(&mut self, id: BodyId, position: Pos2);
    fn velocity(&self, id: BodyId) -> Option<Vec2>;
    fn set_velocity(&mut self, id: BodyId, velocity: Vec2);
    fn apply_force(&mut self, id: BodyId, force: Vec2);
    fn set_static(&mut self, id: BodyId, is_static: bool);

    fn radius(&self, id: BodyId) -> Option<f32>;
    /// Scales the body about its own position.
    fn scale_body(&mut self, id: BodyId, factor: f32);

    /// Advance the simulation by `delta_ms` milliseconds.
    fn step(&mut self, delta_ms: f64);
    /// Simulation clock in milliseconds.
    fn timestamp(&self) -> f64;
    fn last_delta(&self) -> f64;

    fn area(&self, id: BodyId) -> Option<f32> {
        self.radius(id).map(|r| std::f32::consts::PI * r * r)
    }

    /// First of `candidates` whose circle contains `point`.
    fn query_point(&self, candidates: &[BodyId], point: Pos2) -> Option<BodyId> {
        candidates.iter().copied().find(|id| {
            match (self.position(*id), self.radius(*id)) {
                (Some(p), Some(r)) => p.distance(point) <= r,
                _ => false,
            }
        })
    }

    /// Tight bounding box of the given bodies; `None` when none of them exist.
    fn bounds(&self, ids: &[BodyId]) -> Option<Rect> {
        let mut out: Option<Rect> = None;
        for id in ids {
            if let (Some(p), Some(r)) = (self.position(*id), self.radius(*id)) {
                let rect = Rect::from_center_size(p, Vec2::splat(r * 2.0));
                out = Some(match out {
                    Some(acc) => acc.union(rect),
                    None => rect,
                });
            }
        }
        out
    }
}
