//! Per-tick cluster controller.
//!
//! Every tick pulls each bubble towards the anchor and, while the view shows the
//! pristine frame, rescales the whole cluster so its bounding box settles just
//! inside that frame. The scale factor is proportional to the worst margin, so
//! the loop behaves as a damped negative-feedback controller: overflow shrinks,
//! spare room grows, and the fixed point is a zero margin.

use egui::{Pos2, Rect};

use crate::physics::{BodyId, PhysicsWorld};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterConfig {
    /// Attraction per unit of distance and area.
    pub attraction: f32,
    pub padding: f32,
    /// Scale change per unit of margin.
    pub gain: f32,
    pub min_factor: f32,
    pub max_factor: f32,
    /// Below this cumulative scaler the cluster is not shrunk any further.
    pub collapse_floor: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            attraction: 0.000_000_005,
            padding: 20.0,
            gain: 0.000_05,
            min_factor: 0.01,
            max_factor: 1.9,
            collapse_floor: 0.1,
        }
    }
}

/// What the auto-scale pass did this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleOutcome {
    /// Nothing to scale; the cumulative scaler went back to 1.
    Reset,
    /// View is zoomed or scaling is paused.
    Suspended,
    /// Collapsed cluster would have shrunk further; left untouched.
    Held,
    Scaled { factor: f32 },
}

#[derive(Clone, Debug, Default)]
pub struct ClusterLayout {
    config: ClusterConfig,
}

impl ClusterLayout {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Pull every body towards `anchor`, harder for larger bodies.
    pub fn apply_attraction<W: PhysicsWorld + ?Sized>(&self, world: &mut W, bodies: &[BodyId], anchor: Pos2) {
        for &body in bodies {
            let (Some(position), Some(area)) = (world.position(body), world.area(body)) else { continue };
            let force = (anchor - position) * area * self.config.attraction;
            world.apply_force(body, force);
        }
    }

    /// Smallest distance between the cluster box and the frame edges, minus padding.
    /// Negative when the cluster spills over.
    pub fn overflow_margin(&self, cluster: Rect, frame: Rect) -> f32 {
        let left = cluster.min.x - frame.min.x;
        let right = frame.max.x - cluster.max.x;
        let top = cluster.min.y - frame.min.y;
        let bottom = frame.max.y - cluster.max.y;
        left.min(right).min(top).min(bottom) - self.config.padding
    }

    pub fn scale_factor(&self, margin: f32) -> f32 {
        (1.0 + margin * self.config.gain).clamp(self.config.min_factor, self.config.max_factor)
    }

    /// Auto-scale pass. `frame` is the pristine bounds and `active` tells whether
    /// the view currently shows exactly that frame with scaling enabled.
    pub fn rescale<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        bodies: &[BodyId],
        frame: Rect,
        active: bool,
        cluster_scaler: &mut f32,
    ) -> ScaleOutcome {
        let Some(cluster) = world.bounds(bodies) else {
            *cluster_scaler = 1.0;
            return ScaleOutcome::Reset;
        };
        if !active {
            return ScaleOutcome::Suspended;
        }
        let factor = self.scale_factor(self.overflow_margin(cluster, frame));
        if *cluster_scaler < self.config.collapse_floor && factor <= 1.0 {
            return ScaleOutcome::Held;
        }
        for &body in bodies {
            world.scale_body(body, factor);
        }
        *cluster_scaler *= factor;
        ScaleOutcome::Scaled { factor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyOptions, CircleWorld};
    use egui::Vec2;

    fn frame() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0))
    }

    #[test]
    fn margin_picks_most_violated_side() {
        let layout = ClusterLayout::default();
        let cluster = Rect::from_min_max(Pos2::new(100.0, -50.0), Pos2::new(300.0, 200.0));
        assert_eq!(layout.overflow_margin(cluster, frame()), -70.0);
    }

    #[test]
    fn factor_is_clamped() {
        let layout = ClusterLayout::default();
        assert_eq!(layout.scale_factor(0.0), 1.0);
        assert_eq!(layout.scale_factor(-1.0e9), 0.01);
        assert_eq!(layout.scale_factor(1.0e9), 1.9);
        assert!(layout.scale_factor(-100.0) < 1.0);
        assert!(layout.scale_factor(100.0) > 1.0);
    }

    #[test]
    fn attraction_points_at_anchor_and_grows_with_area() {
        let layout = ClusterLayout::default();
        let mut world = CircleWorld::new();
        let small = world.create_circle(Pos2::new(0.0, 300.0), 10.0, BodyOptions::bubble());
        let big = world.create_circle(Pos2::new(800.0, 300.0), 40.0, BodyOptions::bubble());
        layout.apply_attraction(&mut world, &[small, big], Pos2::new(400.0, 300.0));
        world.step(16.0);
        let ds = world.velocity(small).unwrap();
        let db = world.velocity(big).unwrap();
        assert!(ds.x > 0.0 && db.x < 0.0);
        // force scales with area and so does mass: equal distance gives equal pull
        assert!((ds.x + db.x).abs() < 1e-4);
    }

    #[test]
    fn empty_cluster_resets_scaler() {
        let layout = ClusterLayout::default();
        let mut world = CircleWorld::new();
        let mut scaler = 0.3;
        assert_eq!(layout.rescale(&mut world, &[], frame(), true, &mut scaler), ScaleOutcome::Reset);
        assert_eq!(scaler, 1.0);
    }

    #[test]
    fn collapsed_cluster_stops_shrinking_but_may_grow() {
        let layout = ClusterLayout::default();
        let mut world = CircleWorld::new();
        let huge = world.create_circle(Pos2::new(400.0, 300.0), 900.0, BodyOptions::bubble());
        let mut scaler = 0.05;
        let out = layout.rescale(&mut world, &[huge], frame(), true, &mut scaler);
        assert_eq!(out, ScaleOutcome::Held);
        assert_eq!(scaler, 0.05);
        assert_eq!(world.radius(huge), Some(900.0));

        world.remove_body(huge);
        let tiny = world.create_circle(Pos2::new(400.0, 300.0), 1.0, BodyOptions::bubble());
        let out = layout.rescale(&mut world, &[tiny], frame(), true, &mut scaler);
        assert!(matches!(out, ScaleOutcome::Scaled { factor } if factor > 1.0));
        assert!(scaler > 0.05);
    }

    #[test]
    fn suspended_when_inactive() {
        let layout = ClusterLayout::default();
        let mut world = CircleWorld::new();
        let b = world.create_circle(Pos2::new(400.0, 300.0), 500.0, BodyOptions::bubble());
        let mut scaler = 1.0;
        assert_eq!(layout.rescale(&mut world, &[b], frame(), false, &mut scaler), ScaleOutcome::Suspended);
        assert_eq!(scaler, 1.0);
    }

    #[test]
    fn overflowing_cluster_converges_without_overshoot() {
        let layout = ClusterLayout::default();
        let mut world = CircleWorld::new();
        let b = world.create_circle(Pos2::new(400.0, 300.0), 500.0, BodyOptions::bubble());
        let mut scaler = 1.0f32;
        let mut previous = scaler;
        for _ in 0..3000 {
            layout.rescale(&mut world, &[b], frame(), true, &mut scaler);
            let margin = layout.overflow_margin(world.bounds(&[b]).unwrap(), frame());
            if margin < 0.0 {
                assert!(scaler <= previous, "scaler must not grow while overflowing");
            }
            assert!(scaler >= layout.config().min_factor);
            previous = scaler;
        }
        let margin = layout.overflow_margin(world.bounds(&[b]).unwrap(), frame());
        assert!(margin > -1.0 && margin < 1.0, "margin {margin}");
        // fits at radius 280: 300 half-height minus 20 padding
        assert!((world.radius(b).unwrap() - 280.0).abs() < 1.0);
        assert!((scaler - 0.56).abs() < 0.01);
    }
}
