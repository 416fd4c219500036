//! Per-instance submesh buffers: skinned geometry, cloth state and the
//! LOD-rewritten face list.

use glam::{Mat3, Vec3};

use crate::error::{Result, RigError};
use crate::rig::{Face, Submesh};
use crate::skinning::{self, SkinnedTangent};
use crate::springs::{self, PhysicalState, SpringConfig};

/// Mutable geometry buffers for one submesh of one model instance.
///
/// Buffering is opt-in: a submesh that is skinned on the GPU never needs
/// these vectors filled. Submeshes with springs force buffering on, since
/// the cloth solver runs on the CPU.
#[derive(Debug, Clone)]
pub struct SubmeshBuffers {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tangents: Vec<Vec<SkinnedTangent>>,
    physical: Vec<PhysicalState>,
    faces: Vec<Face>,
    vertex_count: usize,
    face_count: usize,
    buffered: bool,
    spring_time: f32,
}

impl SubmeshBuffers {
    pub fn new(core: &Submesh) -> Self {
        let mut buffers = Self {
            positions: Vec::new(),
            normals: Vec::new(),
            tangents: vec![Vec::new(); core.channel_count()],
            physical: Vec::new(),
            faces: core.faces().to_vec(),
            vertex_count: core.vertex_count(),
            face_count: core.face_count(),
            buffered: false,
            spring_time: 0.0,
        };
        if core.has_springs() {
            buffers.enable_buffering(core);
        }
        buffers
    }

    /// Seed the internal buffers from the bind pose. Idempotent.
    pub fn enable_buffering(&mut self, core: &Submesh) {
        if self.buffered {
            return;
        }

        let vertices = core.vertices();
        self.positions = vertices.iter().map(|vertex| vertex.position).collect();
        self.normals = vertices
            .iter()
            .map(|vertex| skinning::descale(vertex.normal))
            .collect();
        for channel in 0..core.channel_count() {
            if let Ok(spaces) = core.tangent_spaces(channel) {
                self.tangents[channel] = spaces
                    .iter()
                    .map(|space| SkinnedTangent {
                        tangent: skinning::descale(space.tangent),
                        cross_factor: f32::from(space.cross_factor),
                    })
                    .collect();
            }
        }
        self.physical = vertices
            .iter()
            .map(|vertex| PhysicalState {
                position: vertex.position,
                old_position: vertex.position,
                force: Vec3::ZERO,
            })
            .collect();
        self.buffered = true;
    }

    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    /// Active vertex count after LOD collapse.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Active face count after LOD collapse.
    pub fn face_count(&self) -> usize {
        self.face_count
    }

    /// Skinned vertex positions for the active vertices.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions[..self.vertex_count.min(self.positions.len())]
    }

    /// Skinned vertex normals for the active vertices.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals[..self.vertex_count.min(self.normals.len())]
    }

    /// Skinned tangent spaces for a channel that has them.
    pub fn tangent_spaces(&self, channel: usize) -> Result<&[SkinnedTangent]> {
        match self.tangents.get(channel) {
            Some(spaces) if !spaces.is_empty() => {
                Ok(&spaces[..self.vertex_count.min(spaces.len())])
            }
            _ => Err(RigError::InvalidTangentChannel(channel)),
        }
    }

    /// Active faces, rewritten to reference active vertices only.
    pub fn faces(&self) -> &[Face] {
        &self.faces[..self.face_count.min(self.faces.len())]
    }

    /// Active faces with every vertex id shifted by `offset`, for
    /// appending several submeshes into one shared vertex buffer.
    pub fn faces_with_offset(&self, offset: usize) -> Vec<Face> {
        self.faces()
            .iter()
            .map(|face| Face {
                vertex_ids: face.vertex_ids.map(|vertex_id| vertex_id + offset),
            })
            .collect()
    }

    pub(crate) fn add_spring_time(&mut self, delta_time: f32) {
        self.spring_time += delta_time;
    }

    pub fn spring_time(&self) -> f32 {
        self.spring_time
    }

    /// Apply a level of detail in `[0.0, 1.0]`; 1.0 keeps everything.
    ///
    /// Shrinks the active vertex and face windows and rewrites every face
    /// index, chasing collapse ids until they land on an active vertex.
    pub fn set_lod_level(&mut self, core: &Submesh, level: f32) {
        let level = level.clamp(0.0, 1.0);
        let lod_count = ((1.0 - level) * core.lod_count() as f32) as usize;
        self.vertex_count = core.vertex_count().saturating_sub(lod_count);

        let controls = core.lod_controls();
        let mut face_count = core.face_count();
        for control in &controls[self.vertex_count.min(controls.len())..] {
            face_count = face_count.saturating_sub(control.face_collapse_count);
        }
        self.face_count = face_count;

        for (face, core_face) in self.faces.iter_mut().zip(core.faces()) {
            for (slot, &core_vertex_id) in face.vertex_ids.iter_mut().zip(&core_face.vertex_ids) {
                let mut vertex_id = core_vertex_id;
                while vertex_id >= self.vertex_count {
                    let Some(control) = controls.get(vertex_id) else {
                        break;
                    };
                    vertex_id = control.collapse_id;
                }
                *slot = vertex_id;
            }
        }
    }

    /// Skin the active vertices and, when the submesh has springs, run the
    /// cloth solver over the accumulated spring time.
    pub fn update(
        &mut self,
        core: &Submesh,
        matrices: &[Mat3],
        translations: &[Vec3],
        config: &SpringConfig,
    ) -> Result<()> {
        if !self.buffered {
            return Ok(());
        }

        let enabled: Vec<usize> = (0..core.channel_count())
            .filter(|&channel| core.tangents_enabled(channel))
            .collect();

        // A single tangent channel rides along in one fused pass; more
        // channels each get their own tangent-only pass.
        if let [channel] = enabled[..] {
            skinning::skin_vertices(
                core,
                matrices,
                translations,
                self.vertex_count,
                Some(&mut self.positions),
                Some(&mut self.normals),
                Some((channel, &mut self.tangents[channel])),
            )?;
        } else {
            skinning::skin_vertices(
                core,
                matrices,
                translations,
                self.vertex_count,
                Some(&mut self.positions),
                Some(&mut self.normals),
                None,
            )?;
            for &channel in &enabled {
                skinning::skin_vertices(
                    core,
                    matrices,
                    translations,
                    self.vertex_count,
                    None,
                    None,
                    Some((channel, &mut self.tangents[channel])),
                )?;
            }
        }

        if core.has_springs() {
            let properties = core.physical_properties();
            springs::accumulate_forces(&mut self.physical, properties, config);
            springs::integrate_vertices(
                &mut self.physical,
                &self.positions,
                properties,
                config,
                self.spring_time,
            );
            springs::relax_constraints(
                &mut self.physical,
                core.springs(),
                properties,
                config.iterations,
            )?;

            for ((position, state), property) in self
                .positions
                .iter_mut()
                .zip(&self.physical)
                .zip(properties)
            {
                if property.weight > 0.0 {
                    *position = state.position;
                }
            }
            self.spring_time = 0.0;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fan of four vertices and two faces where vertex 3 collapses onto
    /// vertex 1, taking one face with it.
    fn lod_submesh() -> Submesh {
        let mut submesh = Submesh::new();
        submesh.resize(4, 0, 2, 0);
        for vertex_id in 0..4 {
            submesh
                .set_vertex(vertex_id, Vec3::new(vertex_id as f32, 0.0, 0.0), Vec3::Z)
                .unwrap();
            submesh.set_lod_control(vertex_id, 0, 0).unwrap();
        }
        submesh.set_lod_control(3, 1, 1).unwrap();
        submesh.set_face(0, [0, 1, 2]).unwrap();
        submesh.set_face(1, [1, 3, 2]).unwrap();
        submesh.set_lod_count(1);
        submesh
    }

    #[test]
    fn test_full_detail_keeps_everything() {
        let core = lod_submesh();
        let mut buffers = SubmeshBuffers::new(&core);

        buffers.set_lod_level(&core, 1.0);

        assert_eq!(buffers.vertex_count(), 4);
        assert_eq!(buffers.face_count(), 2);
        assert_eq!(buffers.faces()[1], Face { vertex_ids: [1, 3, 2] });
    }

    #[test]
    fn test_lowest_detail_collapses_tail_vertices() {
        let core = lod_submesh();
        let mut buffers = SubmeshBuffers::new(&core);

        buffers.set_lod_level(&core, 0.0);

        assert_eq!(buffers.vertex_count(), 3);
        assert_eq!(buffers.face_count(), 1);
        for face in buffers.faces() {
            for &vertex_id in &face.vertex_ids {
                assert!(vertex_id < buffers.vertex_count());
            }
        }
    }

    #[test]
    fn test_lod_is_reversible() {
        let core = lod_submesh();
        let mut buffers = SubmeshBuffers::new(&core);

        buffers.set_lod_level(&core, 0.0);
        buffers.set_lod_level(&core, 1.0);

        assert_eq!(buffers.vertex_count(), 4);
        assert_eq!(buffers.faces()[1], Face { vertex_ids: [1, 3, 2] });
    }

    #[test]
    fn test_faces_with_offset_shifts_into_a_merged_buffer() {
        let core = lod_submesh();
        let mut buffers = SubmeshBuffers::new(&core);

        assert_eq!(
            buffers.faces_with_offset(100),
            vec![
                Face { vertex_ids: [100, 101, 102] },
                Face { vertex_ids: [101, 103, 102] },
            ]
        );
        // A zero offset matches the plain accessor.
        assert_eq!(buffers.faces_with_offset(0), buffers.faces());

        // The offset applies to the LOD-rewritten faces, not the bind data.
        buffers.set_lod_level(&core, 0.0);
        assert_eq!(
            buffers.faces_with_offset(100),
            vec![Face { vertex_ids: [100, 101, 102] }]
        );
    }

    #[test]
    fn test_buffering_seeds_bind_pose() {
        let core = lod_submesh();
        let mut buffers = SubmeshBuffers::new(&core);
        assert!(!buffers.is_buffered());

        buffers.enable_buffering(&core);

        assert!(buffers.is_buffered());
        assert_eq!(buffers.positions()[2], Vec3::new(2.0, 0.0, 0.0));
        assert!((buffers.normals()[0] - Vec3::Z).length() < 0.01);
        assert!(buffers.tangent_spaces(0).is_err());
    }
}
