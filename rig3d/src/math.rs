//! Blending helpers shared by the pose accumulator and the track sampler.

use glam::{Quat, Vec3};

/// Weighted blend towards another value.
///
/// `factor` 0.0 keeps `self`, 1.0 yields `other`. Rotations take the
/// shorter arc, so blending a pose against its negated-quaternion twin
/// never spins the long way round.
pub trait Blend {
    fn blend(&self, other: &Self, factor: f32) -> Self;
}

impl Blend for Vec3 {
    fn blend(&self, other: &Self, factor: f32) -> Self {
        self.lerp(*other, factor)
    }
}

impl Blend for Quat {
    fn blend(&self, other: &Self, factor: f32) -> Self {
        // Hemisphere fix: flip the target when the dot product is negative.
        let other = if self.dot(*other) < 0.0 { -*other } else { *other };

        let blended = Self::from_xyzw(
            self.x + factor * (other.x - self.x),
            self.y + factor * (other.y - self.y),
            self.z + factor * (other.z - self.z),
            self.w + factor * (other.w - self.w),
        );

        // Degenerate inputs (opposite rotations at factor 0.5) collapse to
        // zero length; fall back to the nearer endpoint.
        if blended.length_squared() > f32::EPSILON {
            blended.normalize()
        } else if factor < 0.5 {
            *self
        } else {
            other
        }
    }
}
