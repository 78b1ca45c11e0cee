use crate::entity::Entity;
use crate::types::*;
use crate::vector::Vector3;

/// Public API contract for the simulation world.
pub trait WorldApi {
    /// Construct an empty world with the given configuration.
    fn new(cfg: WorldConfig) -> Self
    where
        Self: Sized;

    // --- Ownership -----------------------------------------------------------

    /// Transfer ownership of an entity to the world and return its handle.
    fn push(&mut self, entity: Entity) -> EntityId;

    /// Take an entity back out of the world. Stale handles return `None`.
    fn remove(&mut self, id: EntityId) -> Option<Entity>;

    fn get(&self, id: EntityId) -> Option<&Entity>;

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity>;

    // --- Tick phases ---------------------------------------------------------

    /// Run one full frame: sort, update, detect, resolve, clean.
    fn tick(&mut self);

    /// Depth-sort and apply gravity + per-entity update to every entity.
    fn update_objects(&mut self);

    /// Rebuild the list of overlapping collidable pairs.
    fn detect_collisions(&mut self);

    /// Resolve every pair still overlapping and notify both sides.
    fn resolve_collisions(&mut self);

    /// Drop entities whose liveness flag is false. Returns how many were removed.
    fn clean(&mut self) -> usize;

    // --- Output --------------------------------------------------------------

    /// Screen-space draw calls in back-to-front order.
    fn render_objects(&self, scale: f32) -> Vec<DrawCall>;

    /// Drain and return the collision events accumulated since the last drain.
    fn drain_events(&mut self) -> Vec<CollisionEvent>;
}

/// Pairwise box geometry.
pub trait NarrowphaseApi {
    /// Strict overlap on all three axes (touching faces do not overlap).
    fn overlaps(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> bool;

    /// Per-axis overlap amounts: sum of half extents minus center distance.
    fn axis_overlaps(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> [f32; 3];

    /// Unit normal along the axis of least penetration, signed from box 0 toward box 1.
    fn contact_normal(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> Vector3;

    /// Smallest of the per-axis overlaps.
    fn penetration_depth(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> f32;

    /// Normal and depth together; `None` unless the boxes overlap.
    fn overlap_aabb_aabb(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> Option<Overlap>;
}

/// Grid path queries.
pub trait PathfinderApi {
    /// Waypoints from `start` toward `target` in travel order, start excluded.
    /// Off-grid endpoints give an empty path.
    fn calc_path(&self, start: Vector3, target: Vector3) -> Vec<Vector3>;
}
