//! Impulse-based pairwise resolution for overlapping boxes.
//!
//! All math runs on copies of the two bodies. Only non-static originals are
//! overwritten, so a static body can take part in the impulse computation (its
//! mass still counts) without ever being moved by it.

use tracing::trace;

use crate::api::NarrowphaseApi;
use crate::body::RigidBody;
use crate::narrowphase::Narrowphase;
use crate::types::{Overlap, ResolverConfig, Resolution};
use crate::vector::{Vector3, VectorExt};

/// Least-penetration normal (from `a` toward `b`) and depth, without an overlap check.
pub fn contact(a: &RigidBody, b: &RigidBody) -> Overlap {
    let (c0, h0, c1, h1) = (a.position(), a.half_extents(), b.position(), b.half_extents());
    Overlap {
        normal: Narrowphase::contact_normal(c0, h0, c1, h1),
        depth: Narrowphase::penetration_depth(c0, h0, c1, h1),
    }
}

/// Resolve one overlapping pair.
///
/// Returns `None`, leaving both bodies untouched, when they are already
/// separating along the contact normal.
pub fn collide(cfg: &ResolverConfig, body_a: &mut RigidBody, body_b: &mut RigidBody) -> Option<Resolution> {
    let mut a = *body_a;
    let mut b = *body_b;

    let Overlap { normal, depth } = contact(&a, &b);

    let rv = b.velocity() - a.velocity();
    let vel_along_normal = rv.dot(normal);
    if vel_along_normal >= 0.0 {
        trace!(vel_along_normal, "pair separating; skipped");
        return None;
    }

    let e = a.restitution().min(b.restitution());
    let inv_sum = a.inv_mass() + b.inv_mass();
    let j = -(1.0 + e) * vel_along_normal / inv_sum;

    let impulse = normal * j;
    a.set_velocity(a.velocity() - impulse * a.inv_mass());
    b.set_velocity(b.velocity() + impulse * b.inv_mass());

    apply_impel_forces(&mut a, &mut b, normal);
    position_correction(cfg, &mut a, &mut b);
    apply_friction(&mut a, &mut b, normal, j);

    if !body_a.is_static() {
        *body_a = a;
    }
    if !body_b.is_static() {
        *body_b = b;
    }

    trace!(?normal, depth, j, "pair resolved");
    Some(Resolution { normal, depth, impulse: j })
}

/// Each body receives the other's omni force along the contact normal (pushing
/// them apart when positive) and the other's directional force as is.
fn apply_impel_forces(a: &mut RigidBody, b: &mut RigidBody, normal: Vector3) {
    let (a_omni, a_dir) = (a.omni_impel_force(), a.dir_impel_force());
    a.apply_force(normal * -b.omni_impel_force());
    a.apply_force(b.dir_impel_force());
    b.apply_force(normal * a_omni);
    b.apply_force(a_dir);
}

/// Push the pair apart along the contact normal, mass-weighted.
///
/// Penetration up to `cfg.slop` is left alone; `cfg.percent` of the rest is removed.
pub fn position_correction(cfg: &ResolverConfig, a: &mut RigidBody, b: &mut RigidBody) {
    let Overlap { normal, depth } = contact(a, b);
    let (inv_a, inv_b) = (a.inv_mass(), b.inv_mass());
    let correction = normal * ((depth - cfg.slop).max(0.0) / (inv_a + inv_b) * cfg.percent);

    a.set_position(a.position() - correction * inv_a);
    b.set_position(b.position() + correction * inv_b);
}

/// Coulomb friction along the tangential relative velocity.
///
/// Static coefficients (combined root-sum-of-squares) bound the impulse that can
/// stop sliding outright; past that bound the dynamic coefficients apply.
fn apply_friction(a: &mut RigidBody, b: &mut RigidBody, normal: Vector3, j: f32) {
    let rv = b.velocity() - a.velocity();
    let tangent = (rv - normal * rv.dot(normal)).unit_or_zero();

    let jt = -rv.dot(tangent) / (a.inv_mass() + b.inv_mass());
    let mu = a.static_friction().hypot(b.static_friction());

    let friction_impulse = if jt.abs() < j * mu {
        tangent * jt
    } else {
        let dynamic = a.dynamic_friction().hypot(b.dynamic_friction());
        tangent * -j * dynamic
    };

    a.set_velocity(a.velocity() - friction_impulse * a.inv_mass());
    b.set_velocity(b.velocity() + friction_impulse * b.inv_mass());
}
