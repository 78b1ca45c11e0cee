//! Fixed-tiling navigation grid with occupancy and A* path queries.
//!
//! Nodes sit at `origin + (i, j) * tiling`. Occupancy is a list of
//! non-owning [`EntityId`]s per node; occupied nodes stay walkable but are
//! scored with a large penalty so searches route around them when they can.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, instrument, warn};

use crate::api::{PathfinderApi, WorldApi};
use crate::body::RigidBody;
use crate::error::NavMeshError;
use crate::types::{EntityId, NavMeshConfig};
use crate::vector::{Vector3, VectorExt};
use crate::world::World;

#[derive(Clone, Debug)]
struct Node {
    center: Vector3,
    occupants: Vec<EntityId>,
}

pub struct NavMesh {
    cfg: NavMeshConfig,
    // Row-major: index = j * length + i.
    nodes: Vec<Node>,
    // Everything inserted since the last clear, for `refresh`.
    registered: Vec<EntityId>,
}

impl NavMesh {
    /// Grid with default height, penalty and iteration cap.
    ///
    /// A non-positive `tiling` is replaced by 1 and logged; use
    /// [`NavMesh::try_new`] to get the rejection as an error instead.
    pub fn new(origin_x: i32, origin_y: i32, length: usize, thickness: usize, tiling: i32) -> Self {
        Self::with_config(NavMeshConfig { origin_x, origin_y, length, thickness, tiling, ..Default::default() })
    }

    pub fn try_new(
        origin_x: i32,
        origin_y: i32,
        length: usize,
        thickness: usize,
        tiling: i32,
    ) -> Result<Self, NavMeshError> {
        Self::try_with_config(NavMeshConfig { origin_x, origin_y, length, thickness, tiling, ..Default::default() })
    }

    pub fn with_config(mut cfg: NavMeshConfig) -> Self {
        if cfg.tiling <= 0 {
            warn!(tiling = cfg.tiling, "non-positive navmesh tiling; using 1");
            cfg.tiling = 1;
        }
        if cfg.length == 0 || cfg.thickness == 0 {
            warn!(length = cfg.length, thickness = cfg.thickness, "navmesh has no nodes; every query will be empty");
        }
        Self::build(cfg)
    }

    pub fn try_with_config(cfg: NavMeshConfig) -> Result<Self, NavMeshError> {
        if cfg.tiling <= 0 {
            return Err(NavMeshError::InvalidTiling(cfg.tiling));
        }
        if cfg.length == 0 || cfg.thickness == 0 {
            return Err(NavMeshError::EmptyGrid { length: cfg.length, thickness: cfg.thickness });
        }
        Ok(Self::build(cfg))
    }

    fn build(cfg: NavMeshConfig) -> Self {
        let mut nodes = Vec::with_capacity(cfg.length * cfg.thickness);
        for j in 0..cfg.thickness {
            for i in 0..cfg.length {
                let x = cfg.origin_x as f32 + (i as f32) * cfg.tiling as f32;
                let y = cfg.origin_y as f32 + (j as f32) * cfg.tiling as f32;
                nodes.push(Node { center: Vector3::new(x, y, cfg.height), occupants: Vec::new() });
            }
        }
        Self { cfg, nodes, registered: Vec::new() }
    }

    pub fn config(&self) -> &NavMeshConfig {
        &self.cfg
    }

    /// `(length, thickness)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.cfg.length, self.cfg.thickness)
    }

    pub fn in_bounds(&self, i: i32, j: i32) -> bool {
        i >= 0 && j >= 0 && (i as usize) < self.cfg.length && (j as usize) < self.cfg.thickness
    }

    /// Nearest node indices for a world position; may be out of bounds.
    pub fn indices_of(&self, p: Vector3) -> (i32, i32) {
        let t = self.cfg.tiling as f32;
        let i = ((p.x - self.cfg.origin_x as f32) / t + 0.5).floor() as i32;
        let j = ((p.y - self.cfg.origin_y as f32) / t + 0.5).floor() as i32;
        (i, j)
    }

    pub fn node_center(&self, i: i32, j: i32) -> Option<Vector3> {
        self.index(i, j).map(|n| self.nodes[n].center)
    }

    pub fn occupants(&self, i: i32, j: i32) -> &[EntityId] {
        match self.index(i, j) {
            Some(n) => &self.nodes[n].occupants,
            None => &[],
        }
    }

    pub fn is_occupied(&self, i: i32, j: i32) -> bool {
        !self.occupants(i, j).is_empty()
    }

    fn index(&self, i: i32, j: i32) -> Option<usize> {
        self.in_bounds(i, j).then(|| j as usize * self.cfg.length + i as usize)
    }

    fn coords(&self, n: usize) -> (i32, i32) {
        ((n % self.cfg.length) as i32, (n / self.cfg.length) as i32)
    }

    /// Half-open index range of tiles whose extent overlaps `[min, max]` on one axis.
    fn tile_span(&self, min: f32, max: f32, origin: i32, count: usize) -> (usize, usize) {
        let t = self.cfg.tiling as f32;
        let o = origin as f32;
        let start = ((min - o - t / 2.0) / t).floor() as i64 + 1;
        let end = ((max - o + t / 2.0) / t).ceil() as i64;
        (start.clamp(0, count as i64) as usize, end.clamp(0, count as i64) as usize)
    }

    /// Record `id` in every node whose tile overlaps the body's x/y footprint.
    pub fn insert_object(&mut self, id: EntityId, body: &RigidBody) {
        if !self.registered.contains(&id) {
            self.registered.push(id);
        }
        self.mark(id, body);
    }

    fn mark(&mut self, id: EntityId, body: &RigidBody) {
        let p = body.position();
        let h = body.half_extents();
        let (i0, i1) = self.tile_span(p.x - h.x, p.x + h.x, self.cfg.origin_x, self.cfg.length);
        let (j0, j1) = self.tile_span(p.y - h.y, p.y + h.y, self.cfg.origin_y, self.cfg.thickness);
        for j in j0..j1 {
            for i in i0..i1 {
                let occupants = &mut self.nodes[j * self.cfg.length + i].occupants;
                if !occupants.contains(&id) {
                    occupants.push(id);
                }
            }
        }
    }

    /// Forget `id` everywhere.
    pub fn remove_object(&mut self, id: EntityId) {
        self.registered.retain(|&e| e != id);
        for node in &mut self.nodes {
            node.occupants.retain(|&e| e != id);
        }
    }

    pub fn clear_objects(&mut self) {
        self.registered.clear();
        for node in &mut self.nodes {
            node.occupants.clear();
        }
    }

    /// Re-mark every registered entity at its current position, dropping
    /// handles the world no longer knows.
    pub fn refresh(&mut self, world: &World) {
        for node in &mut self.nodes {
            node.occupants.clear();
        }
        self.registered.retain(|&id| world.get(id).is_some());
        let ids = self.registered.clone();
        for id in ids {
            if let Some(entity) = world.get(id) {
                self.mark(id, &entity.body());
            }
        }
    }

    fn neighbors(&self, n: usize) -> impl Iterator<Item = usize> + '_ {
        let (i, j) = self.coords(n);
        (-1..=1)
            .flat_map(move |dj| (-1..=1).map(move |di| (di, dj)))
            .filter(|&(di, dj)| di != 0 || dj != 0)
            .filter_map(move |(di, dj)| self.index(i + di, j + dj))
    }

    fn max_iterations(&self) -> usize {
        self.cfg.max_iterations.unwrap_or(self.nodes.len() * 8)
    }

    fn trail(&self, scratch: &[Option<Record>], end: usize) -> Vec<Vector3> {
        let mut path = Vec::new();
        let mut cur = end;
        // Bounded: a parent chain can never be longer than the grid.
        for _ in 0..self.nodes.len() {
            let Some(rec) = scratch[cur] else { break };
            let Some(parent) = rec.parent else { break };
            path.push(self.nodes[cur].center);
            cur = parent;
        }
        path.reverse();
        path
    }
}

/// Per-search bookkeeping for one node.
#[derive(Copy, Clone, Debug)]
struct Record {
    g: f32,
    f: f32,
    parent: Option<usize>,
    closed: bool,
}

/// Open-list entry; `BinaryHeap` is a max-heap so the ordering is reversed.
#[derive(Copy, Clone, Debug)]
struct Open {
    f: f32,
    node: usize,
}

impl Ord for Open {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.total_cmp(&self.f).then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Open {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Open {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Open {}

impl PathfinderApi for NavMesh {
    #[instrument(level = "debug", skip(self))]
    fn calc_path(&self, start: Vector3, target: Vector3) -> Vec<Vector3> {
        let (si, sj) = self.indices_of(start);
        let (ti, tj) = self.indices_of(target);
        let (Some(s), Some(t)) = (self.index(si, sj), self.index(ti, tj)) else {
            debug!("endpoint off grid");
            return Vec::new();
        };
        if s == t {
            return Vec::new();
        }

        // Measured to the requested point, not to the center of its node.
        let goal = target.planar();
        let h = |n: usize| self.nodes[n].center.planar().distance(goal);

        let mut scratch: Vec<Option<Record>> = vec![None; self.nodes.len()];
        let mut open = BinaryHeap::new();
        scratch[s] = Some(Record { g: 0.0, f: h(s), parent: None, closed: false });
        open.push(Open { f: h(s), node: s });

        let cap = self.max_iterations();
        let mut expanded = 0;
        let mut nearest = s;
        let mut found = false;

        'search: while let Some(Open { f, node }) = open.pop() {
            let Some(rec) = scratch[node] else { continue };
            if rec.closed || f > rec.f {
                continue;
            }
            if expanded >= cap {
                debug!(expanded, "iteration cap reached");
                break;
            }
            expanded += 1;
            scratch[node] = Some(Record { closed: true, ..rec });
            if h(node) < h(nearest) {
                nearest = node;
            }

            let here = self.nodes[node].center;
            for next in self.neighbors(node) {
                let g = rec.g + here.distance(self.nodes[next].center);
                let penalty = if self.nodes[next].occupants.is_empty() { 0.0 } else { self.cfg.occupied_penalty };
                let f = g + h(next) + penalty;

                if next == t {
                    scratch[t] = Some(Record { g, f, parent: Some(node), closed: false });
                    found = true;
                    break 'search;
                }
                if scratch[next].is_some_and(|r| r.f <= f) {
                    continue;
                }
                scratch[next] = Some(Record { g, f, parent: Some(node), closed: false });
                open.push(Open { f, node: next });
            }
        }

        let end = if found { t } else { nearest };
        let path = self.trail(&scratch, end);
        debug!(found, expanded, waypoints = path.len(), "path search finished");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use std::f32::consts::SQRT_2;

    fn mesh10() -> NavMesh {
        NavMesh::new(0, 0, 10, 10, 32)
    }

    fn at(mesh: &NavMesh, i: i32, j: i32) -> Vector3 {
        mesh.node_center(i, j).unwrap()
    }

    fn block(x: f32, y: f32, side: f32) -> RigidBody {
        RigidBody::new(Vector3::new(x, y, 0.0), Vector3::splat(side))
    }

    #[test]
    fn test_node_centers_and_rounding() {
        let m = NavMesh::new(100, 50, 4, 3, 10);
        assert_eq!(m.dims(), (4, 3));
        assert_eq!(m.node_center(0, 0), Some(Vector3::new(100.0, 50.0, 32.0)));
        assert_eq!(m.node_center(3, 2), Some(Vector3::new(130.0, 70.0, 32.0)));
        assert_eq!(m.node_center(4, 0), None);
        assert_eq!(m.indices_of(Vector3::new(121.0, 50.0, 0.0)), (2, 0));
        assert_eq!(m.indices_of(Vector3::new(104.9, 55.0, 0.0)), (0, 1));
        assert_eq!(m.indices_of(Vector3::new(94.0, 50.0, 0.0)), (-1, 0));
        assert!(!m.in_bounds(-1, 0));
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(NavMesh::try_new(0, 0, 4, 4, 0).err(), Some(NavMeshError::InvalidTiling(0)));
        assert_eq!(
            NavMesh::try_new(0, 0, 0, 4, 32).err(),
            Some(NavMeshError::EmptyGrid { length: 0, thickness: 4 })
        );
        let m = NavMesh::new(0, 0, 2, 2, -5);
        assert_eq!(m.config().tiling, 1);
        assert_eq!(m.node_center(1, 1), Some(Vector3::new(1.0, 1.0, 32.0)));
    }

    #[test]
    fn test_straight_diagonal() {
        let m = mesh10();
        let path = m.calc_path(at(&m, 0, 0), at(&m, 3, 3));
        assert_eq!(path, vec![at(&m, 1, 1), at(&m, 2, 2), at(&m, 3, 3)]);
    }

    #[test]
    fn test_heuristic_uses_requested_point() {
        let m = mesh10();
        // both points round to node (2, 1); the diagonal and the straight first
        // step tie when scored against the node center
        let high = m.calc_path(at(&m, 0, 0), Vector3::new(64.0, 47.0, 0.0));
        assert_eq!(high, vec![at(&m, 1, 1), at(&m, 2, 1)]);
        let low = m.calc_path(at(&m, 0, 0), Vector3::new(64.0, 17.0, 0.0));
        assert_eq!(low, vec![at(&m, 1, 0), at(&m, 2, 1)]);
    }

    #[test]
    fn test_adjacent_target() {
        let m = mesh10();
        assert_eq!(m.calc_path(at(&m, 4, 4), at(&m, 5, 4)), vec![at(&m, 5, 4)]);
    }

    #[test]
    fn test_same_node_and_off_grid_are_empty() {
        let m = mesh10();
        assert!(m.calc_path(Vector3::new(10.0, 10.0, 0.0), Vector3::ZERO).is_empty());
        assert!(m.calc_path(Vector3::new(-100.0, -100.0, 0.0), at(&m, 5, 5)).is_empty());
        assert!(m.calc_path(at(&m, 5, 5), Vector3::new(1000.0, 0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_routes_around_occupied_node() {
        let mut m = mesh10();
        let obstacle = EntityId::default();
        m.insert_object(obstacle, &block(160.0, 160.0, 20.0));
        assert!(m.is_occupied(5, 5));
        assert!(!m.is_occupied(4, 5));
        assert!(!m.is_occupied(5, 6));

        let path = m.calc_path(at(&m, 0, 0), at(&m, 9, 9));
        assert!(!path.is_empty());
        assert_eq!(path.last(), Some(&at(&m, 9, 9)));
        assert!(!path.contains(&at(&m, 5, 5)));

        let mut prev = at(&m, 0, 0);
        for p in &path {
            assert!(prev.distance(*p) <= 32.0 * SQRT_2 + 1e-3, "non-adjacent step {prev:?} -> {p:?}");
            prev = *p;
        }
    }

    #[test]
    fn test_occupied_target_still_reached() {
        let mut m = mesh10();
        m.insert_object(EntityId::default(), &block(64.0, 0.0, 10.0));
        let path = m.calc_path(at(&m, 0, 0), at(&m, 2, 0));
        assert_eq!(path.last(), Some(&at(&m, 2, 0)));
    }

    #[test]
    fn test_iteration_cap_returns_nearest_trail() {
        let capped = |cap| {
            let m = NavMesh::with_config(NavMeshConfig {
                length: 10,
                thickness: 10,
                max_iterations: Some(cap),
                ..Default::default()
            });
            let path = m.calc_path(at(&m, 0, 0), at(&m, 9, 9));
            (path, at(&m, 1, 1))
        };
        assert!(capped(0).0.is_empty());
        assert!(capped(1).0.is_empty());
        let (path, first) = capped(2);
        assert_eq!(path, vec![first]);
    }

    #[test]
    fn test_footprint_spans_overlapped_tiles() {
        let mut m = mesh10();
        let id = EntityId::default();
        // x in [43, 53] touches tiles 1 ([16, 48]) and 2 ([48, 80])
        m.insert_object(id, &block(48.0, 0.0, 10.0));
        assert_eq!(m.occupants(1, 0), &[id]);
        assert_eq!(m.occupants(2, 0), &[id]);
        assert!(!m.is_occupied(0, 0));
        assert!(!m.is_occupied(3, 0));
        assert!(!m.is_occupied(1, 1));

        // re-inserting does not duplicate
        m.insert_object(id, &block(48.0, 0.0, 10.0));
        assert_eq!(m.occupants(1, 0).len(), 1);

        m.clear_objects();
        assert!(!m.is_occupied(1, 0));
        assert!(m.occupants(42, 42).is_empty());
    }

    #[test]
    fn test_footprint_clamped_to_grid() {
        let mut m = NavMesh::new(0, 0, 3, 3, 32);
        m.insert_object(EntityId::default(), &block(0.0, 0.0, 1000.0));
        for j in 0..3 {
            for i in 0..3 {
                assert!(m.is_occupied(i, j));
            }
        }
    }

    #[test]
    fn test_refresh_tracks_world() {
        let mut world = World::default();
        let id = world.push(Entity::barrier(block(0.0, 0.0, 10.0)));
        let mut m = mesh10();
        m.insert_object(id, &world.get(id).unwrap().body());
        assert!(m.is_occupied(0, 0));

        world.get_mut(id).unwrap().set_position(Vector3::new(96.0, 64.0, 0.0));
        m.refresh(&world);
        assert!(!m.is_occupied(0, 0));
        assert_eq!(m.occupants(3, 2), &[id]);

        world.remove(id);
        m.refresh(&world);
        assert!(!m.is_occupied(3, 2));

        m.remove_object(id);
        assert!(!m.is_occupied(3, 2));
    }
}
