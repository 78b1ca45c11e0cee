use tracing::warn;

use crate::api::NarrowphaseApi;
use crate::error::BodyError;
use crate::narrowphase::Narrowphase;
use crate::vector::Vector3;

/// Physical state and material of one axis-aligned box.
///
/// - `position` is the box center; `velocity` is added to it every integration step,
///   `acceleration` is added to `velocity`.
/// - `dimensions` are full extents (length, depth, height), all non-negative.
/// - `restitution` is bounciness in `[0, 1]`; the lower of two colliding bodies wins.
/// - `omni_impel_force` pushes anything touching this body away along the contact
///   normal (negative pulls). `dir_impel_force` pushes touching bodies in a fixed
///   direction, like a wind tunnel.
/// - `collidable == false` opts out of collision detection entirely.
/// - static bodies are never moved by outside forces or contacts, though they may
///   still move under their own velocity/acceleration and affect others.
/// - `tangible` marks solid bodies; intangible ones still exchange impel forces.
///
/// Setters enforce the value invariants; invalid input is clamped (or, for
/// dimensions, rejected) and logged rather than returned as an error.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RigidBody {
    position: Vector3,
    velocity: Vector3,
    acceleration: Vector3,
    dimensions: Vector3,
    mass: f32,
    restitution: f32,
    static_friction: f32,
    dynamic_friction: f32,
    omni_impel_force: f32,
    dir_impel_force: Vector3,
    collidable: bool,
    is_static: bool,
    tangible: bool,

    // Staging area for one tick; consumed by `integrate`.
    accumulated_force: Vector3,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            velocity: Vector3::ZERO,
            acceleration: Vector3::ZERO,
            dimensions: Vector3::ZERO,
            mass: 1.0,
            restitution: 0.0,
            static_friction: 0.0,
            dynamic_friction: 0.0,
            omni_impel_force: 0.0,
            dir_impel_force: Vector3::ZERO,
            collidable: true,
            is_static: false,
            tangible: true,
            accumulated_force: Vector3::ZERO,
        }
    }
}

impl RigidBody {
    /// Collidable, tangible, dynamic box of mass 1 at rest.
    pub fn new(position: Vector3, dimensions: Vector3) -> Self {
        let mut body = Self { position, ..Default::default() };
        body.set_dims(dimensions);
        body
    }

    // --- Builder-style constructors (routed through the setters) ----------

    pub fn with_velocity(mut self, v: Vector3) -> Self {
        self.velocity = v;
        self
    }

    pub fn with_acceleration(mut self, a: Vector3) -> Self {
        self.acceleration = a;
        self
    }

    pub fn with_mass(mut self, m: f32) -> Self {
        self.set_mass(m);
        self
    }

    pub fn with_restitution(mut self, r: f32) -> Self {
        self.set_restitution(r);
        self
    }

    pub fn with_friction(mut self, static_friction: f32, dynamic_friction: f32) -> Self {
        self.set_static_friction(static_friction);
        self.set_dynamic_friction(dynamic_friction);
        self
    }

    pub fn with_impel(mut self, omni: f32, directional: Vector3) -> Self {
        self.omni_impel_force = omni;
        self.dir_impel_force = directional;
        self
    }

    pub fn with_collidable(mut self, c: bool) -> Self {
        self.collidable = c;
        self
    }

    pub fn with_static(mut self, s: bool) -> Self {
        self.is_static = s;
        self
    }

    pub fn with_tangible(mut self, t: bool) -> Self {
        self.tangible = t;
        self
    }

    // --- Getters ------------------------------------------------------------

    pub fn position(&self) -> Vector3 { self.position }
    pub fn velocity(&self) -> Vector3 { self.velocity }
    pub fn acceleration(&self) -> Vector3 { self.acceleration }
    pub fn dims(&self) -> Vector3 { self.dimensions }
    pub fn mass(&self) -> f32 { self.mass }
    pub fn restitution(&self) -> f32 { self.restitution }
    pub fn static_friction(&self) -> f32 { self.static_friction }
    pub fn dynamic_friction(&self) -> f32 { self.dynamic_friction }
    pub fn omni_impel_force(&self) -> f32 { self.omni_impel_force }
    pub fn dir_impel_force(&self) -> Vector3 { self.dir_impel_force }
    pub fn is_collidable(&self) -> bool { self.collidable }
    pub fn is_static(&self) -> bool { self.is_static }
    pub fn is_tangible(&self) -> bool { self.tangible }
    /// Force staged for the next `integrate` call.
    pub fn accumulated_force(&self) -> Vector3 { self.accumulated_force }

    /// Half extents of the box.
    #[inline]
    pub fn half_extents(&self) -> Vector3 {
        self.dimensions * 0.5
    }

    /// Inverse mass; finite because mass is kept positive.
    #[inline]
    pub fn inv_mass(&self) -> f32 {
        1.0 / self.mass
    }

    /// Back-to-front render key: the y of the box's near face.
    #[inline]
    pub fn depth_key(&self) -> f32 {
        self.position.y + self.dimensions.y / 2.0
    }

    // --- Setters ------------------------------------------------------------

    pub fn set_position(&mut self, p: Vector3) { self.position = p; }
    pub fn set_velocity(&mut self, v: Vector3) { self.velocity = v; }
    pub fn set_acceleration(&mut self, a: Vector3) { self.acceleration = a; }
    pub fn set_omni_impel_force(&mut self, o: f32) { self.omni_impel_force = o; }
    pub fn set_dir_impel_force(&mut self, d: Vector3) { self.dir_impel_force = d; }
    pub fn set_collidable(&mut self, c: bool) { self.collidable = c; }
    pub fn set_static(&mut self, s: bool) { self.is_static = s; }
    pub fn set_tangible(&mut self, t: bool) { self.tangible = t; }

    /// Replace the dimensions; any negative (or NaN) component rejects the whole
    /// value and keeps the previous one.
    pub fn try_set_dims(&mut self, d: Vector3) -> Result<(), BodyError> {
        if d.x >= 0.0 && d.y >= 0.0 && d.z >= 0.0 {
            self.dimensions = d;
            Ok(())
        } else {
            Err(BodyError::dims(d))
        }
    }

    /// Like [`try_set_dims`](Self::try_set_dims) but logs the rejection instead of returning it.
    pub fn set_dims(&mut self, d: Vector3) {
        if let Err(err) = self.try_set_dims(d) {
            warn!(%err, kept = ?self.dimensions, "rejected body dimensions");
        }
    }

    /// Mass must be positive and finite; anything else stores 1.
    pub fn set_mass(&mut self, m: f32) {
        if m > 0.0 && m.is_finite() {
            self.mass = m;
        } else {
            warn!(mass = m, "non-positive or infinite mass coerced to 1");
            self.mass = 1.0;
        }
    }

    /// Restitution outside `[0, 1]` stores 0.
    pub fn set_restitution(&mut self, r: f32) {
        if (0.0..=1.0).contains(&r) {
            self.restitution = r;
        } else {
            warn!(restitution = r, "restitution out of [0, 1] coerced to 0");
            self.restitution = 0.0;
        }
    }

    /// Negative coefficients store 0.
    pub fn set_static_friction(&mut self, f: f32) {
        self.static_friction = non_negative_or_zero(f, "static friction");
    }

    /// Negative coefficients store 0.
    pub fn set_dynamic_friction(&mut self, f: f32) {
        self.dynamic_friction = non_negative_or_zero(f, "dynamic friction");
    }

    // --- Dynamics -------------------------------------------------------------

    /// Stage a force for the next integration step. No-op on static bodies.
    pub fn apply_force(&mut self, force: Vector3) {
        if !self.is_static {
            self.accumulated_force += force;
        }
    }

    /// Advance one tick.
    ///
    /// The staged force contributes `force / mass` to acceleration for this step
    /// only: resting acceleration (e.g. a standing gravity field set with
    /// `set_acceleration`) is restored afterwards and the staging area cleared.
    pub fn integrate(&mut self) {
        let da = if self.is_static {
            Vector3::ZERO
        } else {
            self.accumulated_force * self.inv_mass()
        };
        self.acceleration += da;
        self.velocity += self.acceleration;
        self.position += self.velocity;
        self.acceleration -= da;
        self.accumulated_force = Vector3::ZERO;
    }

    /// True iff `other` is collidable and the two boxes overlap strictly on every axis.
    pub fn check_collision(&self, other: &RigidBody) -> bool {
        other.collidable
            && Narrowphase::overlaps(self.position, self.half_extents(), other.position, other.half_extents())
    }
}

fn non_negative_or_zero(v: f32, what: &'static str) -> f32 {
    if v >= 0.0 {
        v
    } else {
        warn!(value = v, "negative {what} coerced to 0");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cube(pos: Vector3, side: f32) -> RigidBody {
        RigidBody::new(pos, Vector3::splat(side))
    }

    #[test]
    fn test_mass_clamp() {
        let mut b = RigidBody::default();
        b.set_mass(0.0);
        assert_eq!(b.mass(), 1.0);
        b.set_mass(-5.0);
        assert_eq!(b.mass(), 1.0);
        b.set_mass(f32::NAN);
        assert_eq!(b.mass(), 1.0);
        b.set_mass(f32::INFINITY);
        assert_eq!(b.mass(), 1.0);
        b.set_mass(42.0);
        assert_eq!(b.mass(), 42.0);
    }

    #[test]
    fn test_restitution_and_friction_clamp() {
        let mut b = RigidBody::default();
        b.set_restitution(1.5);
        assert_eq!(b.restitution(), 0.0);
        b.set_restitution(-0.1);
        assert_eq!(b.restitution(), 0.0);
        b.set_restitution(1.0);
        assert_eq!(b.restitution(), 1.0);
        b.set_static_friction(-2.0);
        b.set_dynamic_friction(-0.5);
        assert_eq!(b.static_friction(), 0.0);
        assert_eq!(b.dynamic_friction(), 0.0);
        let b = b.with_friction(0.6, 0.7);
        assert_eq!(b.static_friction(), 0.6);
        assert_eq!(b.dynamic_friction(), 0.7);
    }

    #[test]
    fn test_invalid_dims_keep_previous() {
        let mut b = RigidBody::new(Vector3::ZERO, Vector3::new(1.0, 2.0, 3.0));
        b.set_dims(Vector3::new(-1.0, 2.0, 3.0));
        assert_eq!(b.dims(), Vector3::new(1.0, 2.0, 3.0));
        let err = b.try_set_dims(Vector3::new(0.0, -2.0, 3.0)).unwrap_err();
        assert!(matches!(err, BodyError::InvalidDimensions { y, .. } if y == -2.0));
        assert_eq!(b.dims(), Vector3::new(1.0, 2.0, 3.0));
        assert!(b.try_set_dims(Vector3::ZERO).is_ok());
        assert_eq!(b.dims(), Vector3::ZERO);
    }

    #[test]
    fn test_new_rejects_negative_dims() {
        let b = RigidBody::new(Vector3::ZERO, Vector3::new(1.0, -1.0, 1.0));
        assert_eq!(b.dims(), Vector3::ZERO);
    }

    #[test]
    fn test_integrate_order() {
        let mut b = RigidBody::new(Vector3::ZERO, Vector3::ONE)
            .with_velocity(Vector3::new(1.0, 0.0, 0.0))
            .with_acceleration(Vector3::new(0.0, 0.0, -1.0));
        b.integrate();
        // velocity picks up acceleration before position moves
        assert_eq!(b.velocity(), Vector3::new(1.0, 0.0, -1.0));
        assert_eq!(b.position(), Vector3::new(1.0, 0.0, -1.0));
        assert_eq!(b.acceleration(), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_applied_force_lasts_one_tick() {
        let mut b = RigidBody::new(Vector3::ZERO, Vector3::ONE).with_mass(2.0);
        b.apply_force(Vector3::new(4.0, 0.0, 0.0));
        assert_eq!(b.accumulated_force(), Vector3::new(4.0, 0.0, 0.0));
        b.integrate();
        assert_eq!(b.velocity(), Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(b.acceleration(), Vector3::ZERO);
        assert_eq!(b.accumulated_force(), Vector3::ZERO);
        b.integrate();
        // no further acceleration, just drift
        assert_eq!(b.velocity(), Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(b.position(), Vector3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_static_ignores_forces() {
        let mut b = RigidBody::new(Vector3::ZERO, Vector3::ONE).with_static(true);
        b.apply_force(Vector3::new(100.0, 0.0, 0.0));
        assert_eq!(b.accumulated_force(), Vector3::ZERO);
        b.integrate();
        assert_eq!(b.position(), Vector3::ZERO);
    }

    #[test]
    fn test_static_moves_under_own_velocity() {
        let mut b = RigidBody::new(Vector3::ZERO, Vector3::ONE)
            .with_static(true)
            .with_velocity(Vector3::new(0.0, 1.0, 0.0));
        b.integrate();
        assert_eq!(b.position(), Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_check_collision_strict_and_collidable() {
        let a = cube(Vector3::ZERO, 2.0);
        let touching = cube(Vector3::new(2.0, 0.0, 0.0), 2.0);
        let overlapping = cube(Vector3::new(1.9, 0.0, 0.0), 2.0);
        assert!(!a.check_collision(&touching));
        assert!(a.check_collision(&overlapping));
        let ghost = overlapping.with_collidable(false);
        assert!(!a.check_collision(&ghost));
        // needs overlap on z as well
        let above = cube(Vector3::new(1.0, 0.0, 5.0), 2.0);
        assert!(!a.check_collision(&above));
    }

    proptest! {
        #[test]
        fn prop_check_collision_symmetric(
            ax in -10.0f32..10.0, ay in -10.0f32..10.0, az in -10.0f32..10.0,
            bx in -10.0f32..10.0, by in -10.0f32..10.0, bz in -10.0f32..10.0,
            sa in 0.0f32..8.0, sb in 0.0f32..8.0,
        ) {
            let a = cube(Vector3::new(ax, ay, az), sa);
            let b = cube(Vector3::new(bx, by, bz), sb);
            prop_assert_eq!(a.check_collision(&b), b.check_collision(&a));
        }

        #[test]
        fn prop_integrate_deterministic(
            px in -100.0f32..100.0, vx in -5.0f32..5.0, az in -1.0f32..1.0, steps in 1usize..64,
        ) {
            let start = RigidBody::new(Vector3::new(px, 0.0, 0.0), Vector3::ONE)
                .with_velocity(Vector3::new(vx, 0.0, 0.0))
                .with_acceleration(Vector3::new(0.0, 0.0, az));
            let run = || {
                let mut b = start;
                for _ in 0..steps { b.integrate(); }
                b
            };
            prop_assert_eq!(run(), run());
        }

        #[test]
        fn prop_mass_always_positive(m in proptest::num::f32::ANY) {
            let mut b = RigidBody::default();
            b.set_mass(m);
            prop_assert!(b.mass() > 0.0);
            prop_assert!(b.mass().is_finite());
        }

        #[test]
        fn prop_restitution_in_unit_range(r in proptest::num::f32::ANY) {
            let mut b = RigidBody::default();
            b.set_restitution(r);
            prop_assert!((0.0..=1.0).contains(&b.restitution()));
        }
    }
}
