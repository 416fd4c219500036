//! The mutable instance side of the engine.
//!
//! A [`Model`] owns per-bone pose state and per-submesh geometry buffers
//! over a shared [`Rig`]. The per-frame cycle is `clear_state`, one
//! `blend_animation` per playing clip, `lock_state`, `calculate_state`,
//! then `update_vertices` for CPU-skinned submeshes.

mod bone;
mod submesh;

pub use bone::BonePose;
pub use submesh::SubmeshBuffers;

use std::sync::Arc;

use glam::{Mat3, Quat, Vec3};
use log::trace;

use crate::animation::{AnimationClip, UNRESOLVED_HINT};
use crate::error::{Result, RigError};
use crate::rig::Rig;
use crate::springs::SpringConfig;

/// A posable instance of a [`Rig`].
#[derive(Debug, Clone)]
pub struct Model {
    rig: Arc<Rig>,
    bones: Vec<BonePose>,
    submeshes: Vec<SubmeshBuffers>,
    translation: Vec3,
    rotation: Quat,
    transform_matrices: Vec<Mat3>,
    transform_translations: Vec<Vec3>,
    spring_config: SpringConfig,
}

impl Model {
    /// Instantiate a model over a shared rig, seeded at the bind pose.
    pub fn new(rig: Arc<Rig>) -> Self {
        let bones = rig.bones().iter().map(BonePose::new).collect();
        let submeshes = rig.submeshes().iter().map(SubmeshBuffers::new).collect();
        let bone_count = rig.bone_count();
        Self {
            rig,
            bones,
            submeshes,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            transform_matrices: vec![Mat3::IDENTITY; bone_count],
            transform_translations: vec![Vec3::ZERO; bone_count],
            spring_config: SpringConfig::default(),
        }
    }

    pub fn rig(&self) -> &Arc<Rig> {
        &self.rig
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone(&self, bone_id: usize) -> Option<&BonePose> {
        self.bones.get(bone_id)
    }

    pub fn bones(&self) -> &[BonePose] {
        &self.bones
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    pub fn submesh(&self, submesh_id: usize) -> Option<&SubmeshBuffers> {
        self.submeshes.get(submesh_id)
    }

    /// Root transform applied ahead of every root bone.
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    pub fn spring_config(&self) -> &SpringConfig {
        &self.spring_config
    }

    pub fn set_spring_config(&mut self, config: SpringConfig) {
        self.spring_config = config;
    }

    /// Flat per-bone skinning rotation palette, valid after
    /// [`Self::calculate_state`].
    pub fn transform_matrices(&self) -> &[Mat3] {
        &self.transform_matrices
    }

    /// Flat per-bone skinning translation palette, valid after
    /// [`Self::calculate_state`].
    pub fn transform_translations(&self) -> &[Vec3] {
        &self.transform_translations
    }

    /// Start a new blend cycle on every bone.
    pub fn clear_state(&mut self) {
        for bone in &mut self.bones {
            bone.clear_state();
        }
    }

    /// Blend a clip into the pose at `weight`, sampled at `time` seconds.
    ///
    /// Tracks resolve their bones by name through the shared hint cache;
    /// tracks naming no bone of this rig are skipped.
    pub fn blend_animation(&mut self, clip: &AnimationClip, weight: f32, time: f32) {
        for track in clip.tracks() {
            let bone_id = self.find_bone(track.bone_name(), track.bone_hint());
            track.set_bone_hint(bone_id.map_or(UNRESOLVED_HINT, |id| id as i32));
            let Some(bone_id) = bone_id else {
                trace!("no bone named '{}' in rig, track skipped", track.bone_name());
                continue;
            };

            let (direction, rotation) = track.sample(time, clip.duration());
            let translation = direction * self.rig.bones()[bone_id].length();
            self.bones[bone_id].blend_state(weight, translation, rotation);
        }
    }

    /// Resolve a bone by name, checking the cached hint before scanning.
    pub fn find_bone(&self, name: &str, hint: i32) -> Option<usize> {
        if hint >= 0 {
            let hinted = hint as usize;
            if self
                .rig
                .bone(hinted)
                .is_some_and(|bone| bone.name() == name)
            {
                return Some(hinted);
            }
        }
        self.rig.bone_id(name)
    }

    /// Snapshot every bone's local state for later re-blending.
    pub fn save_state(&mut self) {
        for bone in &mut self.bones {
            bone.save_state();
        }
    }

    /// Blend the snapshot back into the current pose at `weight`.
    pub fn blend_saved_state(&mut self, weight: f32) {
        for bone in &mut self.bones {
            bone.blend_saved_state(weight);
        }
    }

    /// Close the blend phase. Kept for lifecycle parity; performs no
    /// mutation.
    pub fn lock_state(&mut self) {
        for bone in &mut self.bones {
            bone.lock_state();
        }
    }

    /// Derive absolute and skinning transforms for every bone, parents
    /// before children, and refresh the flat palettes.
    pub fn calculate_state(&mut self) {
        let rig = Arc::clone(&self.rig);

        let mut stack: Vec<usize> = (0..rig.bone_count())
            .filter(|&id| rig.bones()[id].parent().is_none())
            .collect();
        while let Some(bone_id) = stack.pop() {
            let core = &rig.bones()[bone_id];
            let (parent_translation, parent_rotation) = match core.parent() {
                Some(parent_id) => {
                    let parent = &self.bones[parent_id];
                    (parent.translation_absolute(), parent.rotation_absolute())
                }
                None => (self.translation, self.rotation),
            };
            self.bones[bone_id].calculate(core, parent_translation, parent_rotation);
            stack.extend(core.children().iter().copied());
        }

        for (bone_id, bone) in self.bones.iter().enumerate() {
            self.transform_matrices[bone_id] = Mat3::from_quat(bone.rotation_skin());
            self.transform_translations[bone_id] = bone.translation_skin();
        }
    }

    /// Copy the entire pose of another model over the same rig.
    pub fn mimic_pose(&mut self, other: &Self) -> Result<()> {
        if self.bones.len() != other.bones.len() {
            return Err(RigError::ConfigMismatch {
                expected: self.bones.len(),
                actual: other.bones.len(),
            });
        }

        for (bone, other_bone) in self.bones.iter_mut().zip(&other.bones) {
            bone.mimic(other_bone);
        }
        self.transform_matrices.copy_from_slice(&other.transform_matrices);
        self.transform_translations
            .copy_from_slice(&other.transform_translations);
        self.translation = other.translation;
        self.rotation = other.rotation;
        Ok(())
    }

    /// Turn CPU-side geometry buffering on for one submesh.
    pub fn enable_buffering(&mut self, submesh_id: usize) -> Result<()> {
        let rig = Arc::clone(&self.rig);
        let core = rig
            .submesh(submesh_id)
            .ok_or_else(|| RigError::InvalidHandle(format!("submesh {submesh_id}")))?;
        let buffers = self
            .submeshes
            .get_mut(submesh_id)
            .ok_or_else(|| RigError::InvalidHandle(format!("submesh {submesh_id}")))?;
        buffers.enable_buffering(core);
        Ok(())
    }

    /// Apply a level of detail in `[0.0, 1.0]` to every submesh.
    pub fn set_lod_level(&mut self, level: f32) {
        trace!("setting LOD level {level}");
        for (buffers, core) in self.submeshes.iter_mut().zip(self.rig.submeshes()) {
            buffers.set_lod_level(core, level);
        }
    }

    /// Accumulate simulation time for the cloth solver.
    pub fn update_spring_system(&mut self, delta_time: f32) {
        for (buffers, core) in self.submeshes.iter_mut().zip(self.rig.submeshes()) {
            if core.has_springs() {
                buffers.add_spring_time(delta_time);
            }
        }
    }

    /// Re-skin every buffered submesh and run the cloth solver where
    /// springs exist. Call after [`Self::calculate_state`].
    pub fn update_vertices(&mut self) -> Result<()> {
        let rig = Arc::clone(&self.rig);
        for (buffers, core) in self.submeshes.iter_mut().zip(rig.submeshes()) {
            if buffers.is_buffered() {
                buffers.update(
                    core,
                    &self.transform_matrices,
                    &self.transform_translations,
                    &self.spring_config,
                )?;
            }
        }
        Ok(())
    }
}
