use glam::{Quat, Vec3};

/// A single keyframe: the bone's offset direction and rotation at `time`.
///
/// The direction is a unit offset; the playing model scales it by the
/// target bone's length to get the local translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub direction: Vec3,
    pub rotation: Quat,
}

impl Keyframe {
    pub fn new(time: f32, direction: Vec3, rotation: Quat) -> Self {
        Self {
            time,
            direction,
            rotation,
        }
    }
}

impl Default for Keyframe {
    fn default() -> Self {
        Self {
            time: 0.0,
            direction: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}
