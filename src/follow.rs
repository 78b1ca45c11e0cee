use tracing::trace;

use crate::api::PathfinderApi;
use crate::body::RigidBody;
use crate::vector::{Vector3, VectorExt};

/// Steers an agent along grid paths toward a moving target.
///
/// The path is recomputed every `repath_interval` calls to [`PathFollower::steer`];
/// between re-paths the agent works through the cached waypoints.
#[derive(Clone, Debug)]
pub struct PathFollower {
    /// Ticks between path recomputations.
    pub repath_interval: u32,
    /// Planar distance at which a waypoint counts as reached.
    pub arrive_radius: f32,
    timer: u32,
    path: Vec<Vector3>,
    cursor: usize,
}

impl Default for PathFollower {
    fn default() -> Self {
        Self::new(60, 10.0)
    }
}

impl PathFollower {
    pub fn new(repath_interval: u32, arrive_radius: f32) -> Self {
        Self { repath_interval: repath_interval.max(1), arrive_radius, timer: 0, path: Vec::new(), cursor: 0 }
    }

    /// Waypoints not reached yet, nearest first.
    pub fn remaining(&self) -> &[Vector3] {
        &self.path[self.cursor..]
    }

    pub fn next_waypoint(&self) -> Option<Vector3> {
        self.path.get(self.cursor).copied()
    }

    /// Drop the cached path and re-path on the next call.
    pub fn reset(&mut self) {
        self.timer = 0;
        self.path.clear();
        self.cursor = 0;
    }

    /// One tick of following. Returns the force to apply to `body`: `±mass`
    /// on x and y toward the next waypoint, zero once the path is used up.
    pub fn steer(&mut self, mesh: &impl PathfinderApi, body: &RigidBody, target: Vector3) -> Vector3 {
        let pos = body.position();
        if self.timer % self.repath_interval.max(1) == 0 {
            self.path = mesh.calc_path(pos, target);
            self.cursor = 0;
            self.timer = 0;
            trace!(waypoints = self.path.len(), "follower re-pathed");
        }
        self.timer += 1;

        if let Some(wp) = self.next_waypoint() {
            if (wp.planar() - pos.planar()).length() < self.arrive_radius {
                self.cursor += 1;
            }
        }

        let Some(wp) = self.next_waypoint() else {
            return Vector3::ZERO;
        };
        let m = body.mass();
        let fx = if wp.x < pos.x { -m } else { m };
        let fy = if wp.y < pos.y { -m } else { m };
        Vector3::new(fx, fy, 0.0)
    }
}
