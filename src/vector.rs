use glam::{Vec2, Vec3};

/// 3-component float vector used for every physical quantity.
///
/// `x` runs left to right across the screen, `y` runs away from (negative) and
/// toward (positive) the viewer, `z` is elevation.
pub type Vector3 = Vec3;

/// The handful of vector helpers the engine leans on beyond what `glam` names directly.
pub trait VectorExt: Copy {
    /// Euclidean length.
    fn magnitude(self) -> f32;
    /// Unit vector in the same direction; the zero vector stays zero.
    fn unit_or_zero(self) -> Self;
    /// Ground-plane projection (x, y); elevation is dropped.
    fn planar(self) -> Vec2;
    /// Component by axis index (0 = x, 1 = y, 2 = z).
    fn axis(self, i: usize) -> f32;
}

impl VectorExt for Vec3 {
    #[inline]
    fn magnitude(self) -> f32 {
        self.length()
    }

    #[inline]
    fn unit_or_zero(self) -> Self {
        let m = self.length();
        if m != 0.0 && m.is_finite() { self / m } else { Vec3::ZERO }
    }

    #[inline]
    fn planar(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    fn axis(self, i: usize) -> f32 {
        match i {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// Signed unit vector along one axis.
#[inline]
pub fn axis_unit(i: usize, sign: f32) -> Vec3 {
    match i {
        0 => Vec3::new(sign, 0.0, 0.0),
        1 => Vec3::new(0.0, sign, 0.0),
        _ => Vec3::new(0.0, 0.0, sign),
    }
}
