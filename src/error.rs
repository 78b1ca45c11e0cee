//! Error types for the few fallible entry points.
//!
//! Most invalid input in this crate is recovered locally (clamped and logged);
//! these errors exist for callers that want the rejection as a value.

use thiserror::Error;

use crate::vector::Vector3;

/// Rejected rigid-body mutation.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum BodyError {
    /// Every dimension component must be non-negative.
    #[error("invalid dimensions: {x} {y} {z}")]
    InvalidDimensions { x: f32, y: f32, z: f32 },
}

impl BodyError {
    pub(crate) fn dims(d: Vector3) -> Self {
        BodyError::InvalidDimensions { x: d.x, y: d.y, z: d.z }
    }
}

/// Rejected navigation grid construction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NavMeshError {
    /// Node spacing must be positive.
    #[error("tiling must be positive, got {0}")]
    InvalidTiling(i32),
    /// Grid needs at least one node along each axis.
    #[error("grid must have at least one node, got {length}x{thickness}")]
    EmptyGrid { length: usize, thickness: usize },
}

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Malformed JSON or mismatched field types.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Well-formed but semantically unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}
