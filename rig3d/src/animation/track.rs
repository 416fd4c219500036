//! A keyframe track targeting one bone by name.

use std::sync::atomic::{AtomicI32, Ordering};

use glam::{Quat, Vec3};

use super::Keyframe;
use crate::math::Blend;

/// Sentinel for a hint that has not resolved to a bone yet.
pub const UNRESOLVED_HINT: i32 = -1;

/// Keyframes for one bone, kept sorted by time.
///
/// The track addresses its bone by name so clips stay portable across
/// rigs with matching naming. Resolution results are cached in an atomic
/// hint shared by every model playing the clip; the hint is only a cache,
/// a stale value costs one rescan.
#[derive(Debug)]
pub struct Track {
    bone_name: String,
    bone_hint: AtomicI32,
    keyframes: Vec<Keyframe>,
}

impl Track {
    pub fn new(bone_name: impl Into<String>) -> Self {
        Self {
            bone_name: bone_name.into(),
            bone_hint: AtomicI32::new(UNRESOLVED_HINT),
            keyframes: Vec::new(),
        }
    }

    pub fn bone_name(&self) -> &str {
        &self.bone_name
    }

    pub fn bone_hint(&self) -> i32 {
        self.bone_hint.load(Ordering::Relaxed)
    }

    pub fn set_bone_hint(&self, bone_id: i32) {
        self.bone_hint.store(bone_id, Ordering::Relaxed);
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Insert a keyframe, keeping the list sorted by time regardless of
    /// insertion order.
    pub fn add_keyframe(&mut self, keyframe: Keyframe) {
        let at = self
            .keyframes
            .partition_point(|existing| existing.time <= keyframe.time);
        self.keyframes.insert(at, keyframe);
    }

    /// Sample the track at `time` within a clip of `duration` seconds.
    ///
    /// Between keyframes the state is interpolated; past the last keyframe
    /// it wraps towards the first, interpolating over the remainder of the
    /// clip. A single-keyframe track returns that keyframe's state at any
    /// time.
    pub fn sample(&self, time: f32, duration: f32) -> (Vec3, Quat) {
        let count = self.keyframes.len();
        if count == 0 {
            return (Vec3::ZERO, Quat::IDENTITY);
        }

        let after_index = self.keyframes.partition_point(|kf| kf.time <= time);
        let (before_index, after_index, wraps) = if after_index == count {
            (count - 1, 0, true)
        } else if after_index == 0 {
            (count - 1, 0, false)
        } else {
            (after_index - 1, after_index, false)
        };

        let before = &self.keyframes[before_index];
        let after = &self.keyframes[after_index];

        let denominator = if wraps {
            duration - before.time
        } else {
            after.time - before.time
        };
        if before_index == after_index || denominator.abs() <= f32::EPSILON {
            return (before.direction, before.rotation);
        }

        let factor = (time - before.time) / denominator;
        (
            before.direction.blend(&after.direction, factor),
            before.rotation.blend(&after.rotation, factor),
        )
    }
}

impl Clone for Track {
    fn clone(&self) -> Self {
        Self {
            bone_name: self.bone_name.clone(),
            bone_hint: AtomicI32::new(self.bone_hint()),
            keyframes: self.keyframes.clone(),
        }
    }
}
