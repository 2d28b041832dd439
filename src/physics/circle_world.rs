use std::collections::BTreeMap;

use egui::{Pos2, Vec2};

use super::{BodyId, BodyOptions, PhysicsWorld};

// mass per unit of area, matching the density browser engines default to
const DENSITY: f32 = 0.001;

#[derive(Clone, Debug)]
struct CircleBody {
    position: Pos2,
    velocity: Vec2,
    force: Vec2,
    radius: f32,
    options: BodyOptions,
}

impl CircleBody {
    fn mass(&self) -> f32 {
        (std::f32::consts::PI * self.radius * self.radius * DENSITY).max(f32::EPSILON)
    }

    fn inverse_mass(&self) -> f32 {
        if self.options.is_static { 0.0 } else { 1.0 / self.mass() }
    }
}

/// Gravity-free world of circles with air friction and overlap resolution.
///
/// Velocities are expressed in world units per step and forces are integrated
/// with `force / mass * delta²`, so forces tuned for browser engines behave the
/// same here.
#[derive(Clone, Debug, Default)]
pub struct CircleWorld {
    bodies: BTreeMap<BodyId, CircleBody>,
    next_id: u64,
    timestamp: f64,
    last_delta: f64,
}

impl CircleWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn collides(a: &BodyOptions, b: &BodyOptions) -> bool {
        if a.is_static && b.is_static {
            return false;
        }
        !(a.collision_group < 0 && a.collision_group == b.collision_group)
    }

    fn resolve_overlaps(&mut self) {
        let ids: Vec<BodyId> = self.bodies.keys().copied().collect();
        for (i, &ia) in ids.iter().enumerate() {
            for &ib in &ids[i + 1..] {
                let (Some(a), Some(b)) = (self.bodies.get(&ia), self.bodies.get(&ib)) else { continue };
                if !Self::collides(&a.options, &b.options) {
                    continue;
                }
                let delta = b.position - a.position;
                let dist = delta.length();
                let overlap = a.radius + b.radius - dist;
                if overlap <= 0.0 {
                    continue;
                }
                let normal = if dist > f32::EPSILON { delta / dist } else { Vec2::X };
                let (inv_a, inv_b) = (a.inverse_mass(), b.inverse_mass());
                let inv_sum = inv_a + inv_b;
                if inv_sum <= 0.0 {
                    continue;
                }
                let restitution = a.options.restitution.max(b.options.restitution);
                let approach = (b.velocity - a.velocity).dot(normal);
                let impulse = if approach < 0.0 { -(1.0 + restitution) * approach / inv_sum } else { 0.0 };

                if let Some(a) = self.bodies.get_mut(&ia) {
                    a.position -= normal * overlap * (inv_a / inv_sum);
                    a.velocity -= normal * impulse * inv_a;
                }
                if let Some(b) = self.bodies.get_mut(&ib) {
                    b.position += normal * overlap * (inv_b / inv_sum);
                    b.velocity += normal * impulse * inv_b;
                }
            }
        }
    }
}

impl PhysicsWorld for CircleWorld {
    fn create_circle(&mut self, position: Pos2, radius: f32, options: BodyOptions) -> BodyId {
        self.next_id += 1;
        let id = BodyId(self.next_id);
        self.bodies.insert(
            id,
            CircleBody {
                position,
                velocity: Vec2::ZERO,
                force: Vec2::ZERO,
                radius: radius.max(f32::EPSILON),
                options,
            },
        );
        id
    }

    fn remove_body(&mut self, id: BodyId) -> bool {
        self.bodies.remove(&id).is_some()
    }

    fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    fn position(&self, id: BodyId) -> Option<Pos2> {
        self.bodies.get(&id).map(|b| b.position)
    }

    fn set_position(&mut self, id: BodyId, position: Pos2) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.position = position;
        }
    }

    fn velocity(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.velocity)
    }

    fn set_velocity(&mut self, id: BodyId, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.velocity = velocity;
        }
    }

    fn apply_force(&mut self, id: BodyId, force: Vec2) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.force += force;
        }
    }

    fn set_static(&mut self, id: BodyId, is_static: bool) {
        if let Some(b) = self.bodies.get_mut(&id) {
            b.options.is_static = is_static;
            if is_static {
                b.velocity = Vec2::ZERO;
            }
        }
    }

    fn radius(&self, id: BodyId) -> Option<f32> {
        self.bodies.get(&id).map(|b| b.radius)
    }

    fn scale_body(&mut self, id: BodyId, factor: f32) {
        if factor <= 0.0 || !factor.is_finite() {
            return;
        }
        if let Some(b) = self.bodies.get_mut(&id) {
            b.radius *= factor;
        }
    }

    fn step(&mut self, delta_ms: f64) {
        let dt = delta_ms as f32;
        for body in self.bodies.values_mut() {
            if !body.options.is_static {
                let accel = body.force / body.mass();
                body.velocity = body.velocity * (1.0 - body.options.friction_air) + accel * dt * dt;
                body.position += body.velocity;
            }
            body.force = Vec2::ZERO;
        }
        self.resolve_overlaps();
        self.timestamp += delta_ms;
        self.last_delta = delta_ms;
    }

    fn timestamp(&self) -> f64 {
        self.timestamp
    }

    fn last_delta(&self) -> f64 {
        self.last_delta
    }
}
