use crate::api::NarrowphaseApi;
use crate::types::*;
use crate::vector::{axis_unit, Vector3, VectorExt};

/// Axis-aligned box geometry shared by detection and resolution.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn overlaps(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> bool {
        // Evaluated x, z, y; every axis must overlap.
        c0.x + h0.x > c1.x - h1.x
            && c1.x + h1.x > c0.x - h0.x
            && c0.z + h0.z > c1.z - h1.z
            && c1.z + h1.z > c0.z - h0.z
            && c0.y + h0.y > c1.y - h1.y
            && c1.y + h1.y > c0.y - h0.y
    }

    fn axis_overlaps(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> [f32; 3] {
        let d = c1 - c0;
        [
            h0.x + h1.x - d.x.abs(),
            h0.y + h1.y - d.y.abs(),
            h0.z + h1.z - d.z.abs(),
        ]
    }

    fn contact_normal(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> Vector3 {
        let d = c1 - c0;
        let [ox, oy, oz] = Self::axis_overlaps(c0, h0, c1, h1);

        // First axis strictly below both others wins; z takes every tie.
        let axis = if ox < oy && ox < oz {
            0
        } else if oy < ox && oy < oz {
            1
        } else {
            2
        };
        let sign = if d.axis(axis) < 0.0 { -1.0 } else { 1.0 };
        axis_unit(axis, sign)
    }

    fn penetration_depth(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> f32 {
        let [ox, oy, oz] = Self::axis_overlaps(c0, h0, c1, h1);
        ox.min(oy.min(oz))
    }

    fn overlap_aabb_aabb(c0: Vector3, h0: Vector3, c1: Vector3, h1: Vector3) -> Option<Overlap> {
        if !Self::overlaps(c0, h0, c1, h1) {
            return None;
        }
        Some(Overlap {
            normal: Self::contact_normal(c0, h0, c1, h1),
            depth: Self::penetration_depth(c0, h0, c1, h1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: Vector3 = Vector3::ONE;

    #[test]
    fn test_overlap_basic_x() {
        let o = Narrowphase::overlap_aabb_aabb(Vector3::ZERO, H, Vector3::new(1.5, 0.0, 0.0), H).unwrap();
        assert_eq!(o.normal, Vector3::X);
        assert!((o.depth - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_overlap_separated_and_touching() {
        assert!(Narrowphase::overlap_aabb_aabb(Vector3::ZERO, H, Vector3::new(3.1, 0.0, 0.0), H).is_none());
        // exactly touching faces is not an overlap
        assert!(Narrowphase::overlap_aabb_aabb(Vector3::ZERO, H, Vector3::new(2.0, 0.0, 0.0), H).is_none());
    }

    #[test]
    fn test_normal_points_toward_b() {
        let n = Narrowphase::contact_normal(Vector3::ZERO, H, Vector3::new(0.0, -1.8, 0.2), H);
        assert_eq!(n, Vector3::new(0.0, -1.0, 0.0));
        let n = Narrowphase::contact_normal(Vector3::ZERO, H, Vector3::new(0.1, 0.2, -1.9), H);
        assert_eq!(n, Vector3::new(0.0, 0.0, -1.0));
        let n = Narrowphase::contact_normal(Vector3::ZERO, H, Vector3::new(-1.7, 0.0, 0.0), H);
        assert_eq!(n, Vector3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_normal_tie_breaking() {
        // x and y tie below z: neither is strictly smallest, so z wins
        let n = Narrowphase::contact_normal(Vector3::ZERO, H, Vector3::new(1.5, 1.5, 0.0), H);
        assert_eq!(n, Vector3::Z);
        // coincident centers: all equal, positive z
        let n = Narrowphase::contact_normal(Vector3::ZERO, H, Vector3::ZERO, H);
        assert_eq!(n, Vector3::Z);
        // y strictly smallest
        let n = Narrowphase::contact_normal(Vector3::ZERO, H, Vector3::new(0.5, 1.5, 0.0), H);
        assert_eq!(n, Vector3::Y);
    }

    #[test]
    fn test_penetration_depth_is_min_axis() {
        let d = Narrowphase::penetration_depth(Vector3::ZERO, H, Vector3::new(0.5, 1.25, 1.5), H);
        assert!((d - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_mixed_sizes() {
        let big = Vector3::new(10.0, 10.0, 1.0);
        let o = Narrowphase::overlap_aabb_aabb(Vector3::ZERO, big, Vector3::new(3.0, 2.0, 1.5), H).unwrap();
        // z overlap = 1 + 1 - 1.5 = 0.5 is the least
        assert_eq!(o.normal, Vector3::Z);
        assert!((o.depth - 0.5).abs() < 1e-6);
    }
}
