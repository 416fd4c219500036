//! Rig-level bone: bind pose, hierarchy wiring and the inverse-bind
//! ("bone space") transform used to build skinning matrices.

use glam::{Quat, Vec3};

/// A bone in the shared rig.
///
/// Holds the bind-pose transform relative to the parent, the derived
/// absolute bind transform (filled in by [`crate::Rig::calculate_bind_pose`])
/// and the inverse-bind transform that maps bind-pose model space into the
/// bone's local space.
#[derive(Debug, Clone)]
pub struct Bone {
    name: String,
    parent: Option<usize>,
    children: Vec<usize>,
    length: f32,
    translation: Vec3,
    rotation: Quat,
    translation_absolute: Vec3,
    rotation_absolute: Quat,
    translation_bone_space: Vec3,
    rotation_bone_space: Quat,
}

impl Bone {
    /// Create a root-less bone with identity transforms.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            length: 0.0,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            translation_absolute: Vec3::ZERO,
            rotation_absolute: Quat::IDENTITY,
            translation_bone_space: Vec3::ZERO,
            rotation_bone_space: Quat::IDENTITY,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<usize>) {
        self.parent = parent;
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub(crate) fn add_child(&mut self, child: usize) {
        self.children.push(child);
    }

    /// Length of the bone, used to scale track offset directions.
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn set_length(&mut self, length: f32) {
        self.length = length;
    }

    /// Bind-pose translation relative to the parent bone.
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    /// Bind-pose rotation relative to the parent bone.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Absolute bind-pose translation, valid after
    /// [`crate::Rig::calculate_bind_pose`].
    pub fn translation_absolute(&self) -> Vec3 {
        self.translation_absolute
    }

    /// Absolute bind-pose rotation, valid after
    /// [`crate::Rig::calculate_bind_pose`].
    pub fn rotation_absolute(&self) -> Quat {
        self.rotation_absolute
    }

    pub(crate) fn set_absolute(&mut self, translation: Vec3, rotation: Quat) {
        self.translation_absolute = translation;
        self.rotation_absolute = rotation;
    }

    /// Inverse-bind translation (bind model space -> bone space).
    pub fn translation_bone_space(&self) -> Vec3 {
        self.translation_bone_space
    }

    /// Inverse-bind rotation (bind model space -> bone space).
    pub fn rotation_bone_space(&self) -> Quat {
        self.rotation_bone_space
    }

    pub fn set_bone_space(&mut self, translation: Vec3, rotation: Quat) {
        self.translation_bone_space = translation;
        self.rotation_bone_space = rotation;
    }
}
