//! bayou: axis-aligned rigid-body simulation core (impulse resolution) with grid A* pathfinding

pub mod types;
pub mod error;
pub mod vector;
pub mod body;
pub mod entity;
pub mod api;
pub mod narrowphase;
pub mod resolve;
pub mod world;
pub mod navmesh;
pub mod follow;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::{BodyError, ConfigError, NavMeshError};
pub use crate::vector::{Vector3, VectorExt};
pub use crate::body::RigidBody;
pub use crate::entity::{Behavior, Boundary, Character, Contact, Entity, EntityKind};
pub use crate::world::World;
pub use crate::navmesh::NavMesh;
pub use crate::follow::PathFollower;
