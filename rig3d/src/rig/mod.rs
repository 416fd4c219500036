//! The shared, immutable side of the engine: bone hierarchy and bind
//! geometry. A [`Rig`] is built once (by an exporter or the binary
//! loader), wrapped in an [`std::sync::Arc`] and shared by any number of
//! [`crate::Model`] instances.

mod bone;
mod submesh;

pub use bone::Bone;
pub use submesh::{
    Face, Influence, LodControl, MAX_INFLUENCE_COUNT, PhysicalProperty, Spring, Submesh,
    TangentSpace, TextureCoordinate, Vertex,
};

use glam::{Quat, Vec3};

use crate::error::{Result, RigError};

/// Shared bone hierarchy plus bind geometry.
#[derive(Debug, Clone, Default)]
pub struct Rig {
    bones: Vec<Bone>,
    submeshes: Vec<Submesh>,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bone and wire it into the hierarchy. Returns the new bone id.
    pub fn add_bone(&mut self, name: impl Into<String>, parent: Option<usize>) -> Result<usize> {
        let bone_id = self.bones.len();
        let mut bone = Bone::new(name);
        bone.set_parent(parent);
        if let Some(parent_id) = parent {
            let count = self.bones.len();
            self.bones
                .get_mut(parent_id)
                .ok_or(RigError::OutOfRange {
                    what: "bone",
                    index: parent_id,
                    count,
                })?
                .add_child(bone_id);
        }
        self.bones.push(bone);
        Ok(bone_id)
    }

    /// Append a fully-formed bone without hierarchy wiring. The loader
    /// uses this to handle forward parent references, wiring afterwards.
    pub(crate) fn push_bone(&mut self, bone: Bone) -> usize {
        let bone_id = self.bones.len();
        self.bones.push(bone);
        bone_id
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, bone_id: usize) -> Option<&Bone> {
        self.bones.get(bone_id)
    }

    pub fn bone_mut(&mut self, bone_id: usize) -> Option<&mut Bone> {
        self.bones.get_mut(bone_id)
    }

    /// Linear scan for a bone by name.
    pub fn bone_id(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name() == name)
    }

    pub fn add_submesh(&mut self, submesh: Submesh) -> usize {
        let submesh_id = self.submeshes.len();
        self.submeshes.push(submesh);
        submesh_id
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    pub fn submesh(&self, submesh_id: usize) -> Option<&Submesh> {
        self.submeshes.get(submesh_id)
    }

    pub fn submesh_mut(&mut self, submesh_id: usize) -> Option<&mut Submesh> {
        self.submeshes.get_mut(submesh_id)
    }

    /// Derive absolute bind-pose transforms, parents before children.
    ///
    /// Roots compose against identity; every other bone composes against
    /// its parent's already-computed absolute transform.
    pub fn calculate_bind_pose(&mut self) {
        let mut stack: Vec<usize> = (0..self.bones.len())
            .filter(|&id| self.bones[id].parent().is_none())
            .collect();

        while let Some(bone_id) = stack.pop() {
            let (parent_translation, parent_rotation) = match self.bones[bone_id].parent() {
                Some(parent_id) => {
                    let parent = &self.bones[parent_id];
                    (parent.translation_absolute(), parent.rotation_absolute())
                }
                None => (Vec3::ZERO, Quat::IDENTITY),
            };

            let bone = &self.bones[bone_id];
            let rotation = parent_rotation * bone.rotation();
            let translation = parent_translation + parent_rotation * bone.translation();
            self.bones[bone_id].set_absolute(translation, rotation);

            stack.extend(self.bones[bone_id].children().iter().copied());
        }
    }
}
