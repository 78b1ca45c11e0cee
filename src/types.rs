use glam::Vec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::error::ConfigError;
use crate::vector::Vector3;

new_key_type! {
    /// Stable generational handle to an entity owned by a [`World`](crate::World).
    ///
    /// Handles of removed entities never alias a later insertion.
    pub struct EntityId;
}

/// Coarse type tag carried by every entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// Walls, floors and other level geometry.
    Boundary,
    /// Everything else (characters, props, projectiles).
    Object,
}

/// What an entity asks the world to do after one of its hooks ran.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Directive {
    /// Carry on.
    #[default]
    Keep,
    /// Mark dead; removed by the cleanup pass at the end of the tick.
    Kill,
    /// Remove from the world right now and hand the entity back through
    /// `World::drain_detached`. During the update pass this skips the entity
    /// that follows in iteration order for the current tick.
    Detach,
}

/// Contact geometry between two overlapping boxes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Overlap {
    /// Unit axis of least penetration, pointing from A toward B.
    pub normal: Vector3,
    /// Least penetration depth (≥ 0 while overlapping).
    pub depth: f32,
}

/// Result of one applied pairwise resolution.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resolution {
    /// Contact normal, from A toward B.
    pub normal: Vector3,
    /// Penetration depth before positional correction.
    pub depth: f32,
    /// Normal impulse magnitude `j`.
    pub impulse: f32,
}

/// Recorded after the world resolves a pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CollisionEvent {
    pub a: EntityId,
    pub b: EntityId,
    pub a_tag: EntityTag,
    pub b_tag: EntityTag,
    /// `None` when the pair was separating and no impulse was applied.
    pub resolution: Option<Resolution>,
}

/// Screen-space draw request produced by the render projection.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DrawCall {
    /// Entity sprite at `(world.x - screen.x, world.y - world.z - screen.y)`.
    Sprite { id: EntityId, at: Vec2, scale: f32 },
    /// Ground shadow ellipse under an entity.
    Shadow { id: EntityId, center: Vec2, radii: Vec2 },
}

// --- Configuration -----------------------------------------------------------

pub(crate) fn from_json<T: DeserializeOwned>(json: &str) -> Result<T, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

/// Tunables of the positional-correction step.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Penetration tolerated without correction.
    pub slop: f32,
    /// Fraction of the remaining penetration removed per resolution (1.0 = all of it).
    pub percent: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { slop: 0.01, percent: 1.0 }
    }
}

impl ResolverConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = from_json(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.slop >= 0.0 && self.slop.is_finite()) {
            return Err(ConfigError::Invalid(format!("slop must be finite and >= 0, got {}", self.slop)));
        }
        if !(self.percent >= 0.0 && self.percent.is_finite()) {
            return Err(ConfigError::Invalid(format!("percent must be finite and >= 0, got {}", self.percent)));
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Elevation acceleration per tick; the world applies `mass * gravity` along z.
    pub gravity: f32,
    pub resolver: ResolverConfig,
    /// Maximum number of collision events buffered per tick; extra are dropped.
    pub max_events: usize,
    /// Enable internal timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: 0.0,
            resolver: ResolverConfig::default(),
            max_events: 1024,
            enable_timing: false,
        }
    }
}

impl WorldConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = from_json(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() {
            return Err(ConfigError::Invalid(format!("gravity must be finite, got {}", self.gravity)));
        }
        self.resolver.validate()
    }
}

/// Navigation grid layout and search tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavMeshConfig {
    /// World x of node (0, 0).
    pub origin_x: i32,
    /// World y of node (0, 0).
    pub origin_y: i32,
    /// Nodes along x.
    pub length: usize,
    /// Nodes along y.
    pub thickness: usize,
    /// Spacing between node centers in world units.
    pub tiling: i32,
    /// Elevation reported for every node center.
    pub height: f32,
    /// Added to the score of any node with occupants.
    pub occupied_penalty: f32,
    /// Expansion cap per search; `None` means `8 * node count`.
    pub max_iterations: Option<usize>,
}

impl Default for NavMeshConfig {
    fn default() -> Self {
        Self {
            origin_x: 0,
            origin_y: 0,
            length: 32,
            thickness: 18,
            tiling: 32,
            height: 32.0,
            occupied_penalty: 10_000_000.0,
            max_iterations: None,
        }
    }
}

impl NavMeshConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = from_json(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiling <= 0 {
            return Err(ConfigError::Invalid(format!("tiling must be positive, got {}", self.tiling)));
        }
        if self.length == 0 || self.thickness == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must have at least one node, got {}x{}",
                self.length, self.thickness
            )));
        }
        if !self.height.is_finite() {
            return Err(ConfigError::Invalid(format!("height must be finite, got {}", self.height)));
        }
        if !(self.occupied_penalty >= 0.0 && self.occupied_penalty.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "occupied_penalty must be finite and >= 0, got {}",
                self.occupied_penalty
            )));
        }
        Ok(())
    }
}

/// Debug/performance statistics for the last tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub entities: usize,
    pub collidable: usize,
    /// Overlapping pairs found by the broad phase.
    pub candidate_pairs: usize,
    /// Pairs still overlapping when their turn came in the narrow phase.
    pub resolved_pairs: usize,
    /// Entities dropped by detach or cleanup.
    pub removed: usize,
}

/// Timing breakdown for the last tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub tick_ms: f64,
    pub update_ms: f64,
    pub detect_ms: f64,
    pub resolve_ms: f64,
    pub clean_ms: f64,
}
