//! Per-instance bone state: the blend accumulator and derived transforms.

use glam::{Quat, Vec3};

use crate::math::Blend;
use crate::rig::Bone;

/// Mutable pose state for one bone of one model instance.
///
/// The local translation/rotation start at the rig's bind pose and are
/// driven by incremental weighted blending; the absolute and skinning
/// transforms are derived by [`crate::Model::calculate_state`].
#[derive(Debug, Clone)]
pub struct BonePose {
    translation: Vec3,
    rotation: Quat,
    saved_translation: Vec3,
    saved_rotation: Quat,
    accumulated_weight: f32,
    accumulated_weight_absolute: f32,
    translation_absolute: Vec3,
    rotation_absolute: Quat,
    translation_skin: Vec3,
    rotation_skin: Quat,
}

impl BonePose {
    /// Seed the pose from the rig bone's bind-pose local transform.
    pub fn new(core: &Bone) -> Self {
        Self {
            translation: core.translation(),
            rotation: core.rotation(),
            saved_translation: core.translation(),
            saved_rotation: core.rotation(),
            accumulated_weight: 0.0,
            accumulated_weight_absolute: 0.0,
            translation_absolute: Vec3::ZERO,
            rotation_absolute: Quat::IDENTITY,
            translation_skin: Vec3::ZERO,
            rotation_skin: Quat::IDENTITY,
        }
    }

    /// Reset both accumulators for a new blend cycle. The local state
    /// keeps its last value; with no further blending the next
    /// `calculate_state` reproduces it unchanged.
    pub fn clear_state(&mut self) {
        self.accumulated_weight = 0.0;
        self.accumulated_weight_absolute = 0.0;
    }

    /// Blend a new local state in at `weight`.
    ///
    /// The first contribution overwrites; later contributions fold in at
    /// `weight / (accumulated + weight)`, so the result depends on the
    /// order of calls.
    pub fn blend_state(&mut self, weight: f32, translation: Vec3, rotation: Quat) {
        if self.accumulated_weight_absolute == 0.0 {
            self.translation = translation;
            self.rotation = rotation;
            self.accumulated_weight_absolute = weight;
        } else {
            let factor = weight / (self.accumulated_weight_absolute + weight);
            self.translation = self.translation.blend(&translation, factor);
            self.rotation = self.rotation.blend(&rotation, factor);
            self.accumulated_weight_absolute += weight;
        }
        self.accumulated_weight += weight;
    }

    /// Copy the current local state into the shadow slot.
    pub fn save_state(&mut self) {
        self.saved_translation = self.translation;
        self.saved_rotation = self.rotation;
    }

    /// Blend the shadow state back into the current local state with the
    /// incremental rule, driving the plain accumulator.
    pub fn blend_saved_state(&mut self, weight: f32) {
        if self.accumulated_weight == 0.0 {
            self.translation = self.saved_translation;
            self.rotation = self.saved_rotation;
        } else {
            let factor = weight / (self.accumulated_weight + weight);
            self.translation = self.translation.blend(&self.saved_translation, factor);
            self.rotation = self.rotation.blend(&self.saved_rotation, factor);
        }
        self.accumulated_weight += weight;
    }

    /// Lifecycle marker between blending and `calculate_state`; the
    /// accumulator design needs no freezing, so nothing mutates.
    pub fn lock_state(&mut self) {}

    /// Copy another instance's full state over this one.
    pub fn mimic(&mut self, other: &Self) {
        *self = other.clone();
    }

    /// Derive the absolute and skinning transforms from the parent's
    /// absolute transform and the rig bone's inverse-bind transform.
    pub(crate) fn calculate(
        &mut self,
        core: &Bone,
        parent_translation: Vec3,
        parent_rotation: Quat,
    ) {
        self.rotation_absolute = parent_rotation * self.rotation;
        self.translation_absolute = parent_translation + parent_rotation * self.translation;
        self.rotation_skin = self.rotation_absolute * core.rotation_bone_space();
        self.translation_skin =
            self.translation_absolute + self.rotation_absolute * core.translation_bone_space();
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn accumulated_weight(&self) -> f32 {
        self.accumulated_weight
    }

    pub fn accumulated_weight_absolute(&self) -> f32 {
        self.accumulated_weight_absolute
    }

    pub fn translation_absolute(&self) -> Vec3 {
        self.translation_absolute
    }

    pub fn rotation_absolute(&self) -> Quat {
        self.rotation_absolute
    }

    /// Skinning-composite translation (absolute pose times inverse bind).
    pub fn translation_skin(&self) -> Vec3 {
        self.translation_skin
    }

    /// Skinning-composite rotation (absolute pose times inverse bind).
    pub fn rotation_skin(&self) -> Quat {
        self.rotation_skin
    }
}
