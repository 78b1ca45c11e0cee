use slotmap::SlotMap;
use tracing::debug;

use std::time::Instant;

use crate::api::WorldApi;
use crate::entity::{Contact, Entity};
use crate::resolve;
use crate::types::*;
use crate::vector::Vector3;

/// Owns every simulated entity and advances them one tick at a time.
///
/// Entities live in a generational arena; collaborators hold [`EntityId`]s,
/// never the entities themselves. Iteration order is the back-to-front depth
/// order recomputed at the start of every update pass.
pub struct World {
    pub cfg: WorldConfig,
    pub tick_counter: u64,

    entities: SlotMap<EntityId, Entity>,
    order: Vec<EntityId>,

    // Rebuilt every tick by `detect_collisions`.
    pairs: Vec<(EntityId, EntityId)>,

    events: Vec<CollisionEvent>,
    // Detached during update; ownership goes back to the caller.
    detached: Vec<(EntityId, Entity)>,
    stats: WorldStats,
    last_timing: Option<WorldTiming>,
}

impl WorldApi for World {
    fn new(cfg: WorldConfig) -> Self {
        Self {
            cfg,
            tick_counter: 0,
            entities: SlotMap::with_key(),
            order: Vec::new(),
            pairs: Vec::new(),
            events: Vec::new(),
            detached: Vec::new(),
            stats: WorldStats::default(),
            last_timing: None,
        }
    }

    fn push(&mut self, entity: Entity) -> EntityId {
        let id = self.entities.insert(entity);
        self.order.push(id);
        id
    }

    fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.order.retain(|&e| e != id);
        self.pairs.retain(|&(a, b)| a != id && b != id);
        Some(entity)
    }

    fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    fn tick(&mut self) {
        let timing = self.cfg.enable_timing;
        let t_all = if timing { Some(Instant::now()) } else { None };
        self.stats = WorldStats::default();

        let t0 = if timing { Some(Instant::now()) } else { None };
        self.update_objects();
        let update_ms = elapsed_ms(t0);

        let t1 = if timing { Some(Instant::now()) } else { None };
        self.detect_collisions();
        let detect_ms = elapsed_ms(t1);

        let t2 = if timing { Some(Instant::now()) } else { None };
        self.resolve_collisions();
        let resolve_ms = elapsed_ms(t2);

        let t3 = if timing { Some(Instant::now()) } else { None };
        self.clean();
        let clean_ms = elapsed_ms(t3);

        self.stats.entities = self.entities.len();
        self.stats.collidable = self.entities.values().filter(|e| e.is_collidable()).count();
        self.tick_counter = self.tick_counter.wrapping_add(1);

        if t_all.is_some() {
            self.last_timing = Some(WorldTiming {
                tick_ms: elapsed_ms(t_all),
                update_ms,
                detect_ms,
                resolve_ms,
                clean_ms,
            });
        }

        debug!(
            tick = self.tick_counter,
            entities = self.stats.entities,
            candidates = self.stats.candidate_pairs,
            resolved = self.stats.resolved_pairs,
            removed = self.stats.removed,
            "world tick"
        );
    }

    fn update_objects(&mut self) {
        self.sort();

        let gravity = self.cfg.gravity;
        let mut i = 0;
        // Length is re-read every step: a detach shifts the next entity into
        // slot `i`, and the increment below then steps over it for this tick.
        while i < self.order.len() {
            let id = self.order[i];
            let directive = match self.entities.get_mut(id) {
                Some(entity) => {
                    let mass = entity.body().mass();
                    entity.apply_force(Vector3::new(0.0, 0.0, mass * gravity));
                    entity.update()
                }
                None => Directive::Keep,
            };
            match directive {
                Directive::Keep => {}
                Directive::Kill => {
                    if let Some(entity) = self.entities.get_mut(id) {
                        entity.set_alive(false);
                    }
                }
                Directive::Detach => {
                    if let Some(entity) = self.entities.remove(id) {
                        self.detached.push((id, entity));
                    }
                    self.order.remove(i);
                    self.stats.removed += 1;
                    debug!(?id, "entity detached during update");
                }
            }
            i += 1;
        }
    }

    fn detect_collisions(&mut self) {
        self.pairs.clear();

        for (i, &a) in self.order.iter().enumerate() {
            let Some(ea) = self.entities.get(a) else { continue };
            if !ea.is_collidable() {
                continue;
            }
            for &b in &self.order[i + 1..] {
                let Some(eb) = self.entities.get(b) else { continue };
                if eb.is_collidable() && ea.check_collision(eb) {
                    self.pairs.push((a, b));
                }
            }
        }
        self.stats.candidate_pairs = self.pairs.len();
    }

    fn resolve_collisions(&mut self) {
        let cfg = self.cfg.resolver;
        let pairs = std::mem::take(&mut self.pairs);

        for &(a, b) in &pairs {
            let Some([ea, eb]) = self.entities.get_disjoint_mut([a, b]) else { continue };
            // An earlier pair in this pass may already have pushed these apart.
            if !ea.check_collision(eb) {
                continue;
            }

            let mut body_a = ea.body();
            let mut body_b = eb.body();
            let resolution = resolve::collide(&cfg, &mut body_a, &mut body_b);
            ea.set_body(body_a);
            eb.set_body(body_b);

            let normal = match resolution {
                Some(r) => r.normal,
                None => resolve::contact(&body_a, &body_b).normal,
            };
            let (tag_a, tag_b) = (ea.tag(), eb.tag());
            let to_a = Contact { other: b, other_tag: tag_b, other_body: eb.body(), normal };
            let to_b = Contact { other: a, other_tag: tag_a, other_body: ea.body(), normal: -normal };

            let da = ea.collided(&to_a);
            let db = eb.collided(&to_b);
            if da != Directive::Keep {
                ea.set_alive(false);
            }
            if db != Directive::Keep {
                eb.set_alive(false);
            }

            self.stats.resolved_pairs += 1;
            if self.events.len() < self.cfg.max_events {
                self.events.push(CollisionEvent { a, b, a_tag: tag_a, b_tag: tag_b, resolution });
            }
        }
        self.pairs = pairs;
    }

    fn clean(&mut self) -> usize {
        let dead: Vec<EntityId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| self.entities.get(id).is_some_and(|e| !e.is_alive()))
            .collect();
        for &id in &dead {
            self.entities.remove(id);
        }
        if !dead.is_empty() {
            self.order.retain(|id| self.entities.contains_key(*id));
            debug!(count = dead.len(), "removed dead entities");
        }
        self.stats.removed += dead.len();
        dead.len()
    }

    fn render_objects(&self, scale: f32) -> Vec<DrawCall> {
        let mut out = Vec::with_capacity(self.order.len());
        for &id in &self.order {
            if let Some(entity) = self.entities.get(id) {
                entity.render(id, scale, &mut out);
            }
        }
        out
    }

    fn drain_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl World {
    /// Stable sort of the iteration order by the y of each body's near face.
    pub fn sort(&mut self) {
        let entities = &self.entities;
        let key = |id: &EntityId| entities.get(*id).map_or(f32::INFINITY, |e| e.body().depth_key());
        self.order.sort_by(|a, b| key(a).total_cmp(&key(b)));
    }

    pub fn gravity(&self) -> f32 {
        self.cfg.gravity
    }

    pub fn set_gravity(&mut self, g: f32) {
        self.cfg.gravity = g;
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Handles in current iteration (back-to-front) order.
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    /// Entities in current iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.order.iter().filter_map(|&id| self.entities.get(id).map(|e| (id, e)))
    }

    /// Entities that detached themselves during update, in detach order.
    /// Their handles are already stale in this world.
    pub fn drain_detached(&mut self) -> Vec<(EntityId, Entity)> {
        std::mem::take(&mut self.detached)
    }

    /// Pairs found by the last `detect_collisions`.
    pub fn pairs(&self) -> &[(EntityId, EntityId)] {
        &self.pairs
    }

    /// Debug/perf stats for the last tick.
    pub fn stats(&self) -> WorldStats {
        self.stats
    }

    /// Return timing breakdown for the last `tick`.
    pub fn timing(&self) -> Option<WorldTiming> {
        self.last_timing
    }
}

impl Default for World {
    fn default() -> Self {
        <World as WorldApi>::new(WorldConfig::default())
    }
}

fn elapsed_ms(t: Option<Instant>) -> f64 {
    t.map(|t| t.elapsed().as_secs_f64() * 1000.0).unwrap_or(0.0)
}
