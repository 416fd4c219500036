//! Rig-level submesh: bind geometry, skinning influences, texture
//! channels, cloth springs and LOD collapse data.
//!
//! Normals and tangents are stored quantized to signed bytes; positions,
//! weights and texture coordinates stay in full precision. The influence
//! array is flat and vertex-ordered: vertex N's influences follow vertex
//! N-1's, with the per-vertex count stored on the vertex itself.

use glam::Vec3;

use crate::error::{Result, RigError};

/// Highest influence count a single vertex may carry.
pub const MAX_INFLUENCE_COUNT: usize = 127;

/// Scale applied when quantizing unit-range components to signed bytes.
const QUANTIZE_SCALE: f32 = 127.5;

/// A bind-pose vertex with its quantized normal and influence count.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: [i8; 3],
    pub influence_count: u8,
}

/// One bone's pull on a vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Influence {
    pub bone_id: usize,
    pub weight: f32,
}

/// A triangle referencing submesh-local vertex ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Face {
    pub vertex_ids: [usize; 3],
}

/// A structural spring between two vertices.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spring {
    pub vertex_ids: [usize; 2],
    pub coefficient: f32,
    pub idle_length: f32,
}

/// Per-vertex physical weight; zero or negative anchors the vertex to the
/// skinned surface, positive hands it to the spring solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicalProperty {
    pub weight: f32,
}

/// Per-vertex LOD collapse data.
#[derive(Debug, Clone, Copy, Default)]
pub struct LodControl {
    /// Vertex that stands in for this one once it is collapsed away.
    pub collapse_id: usize,
    /// Number of faces that disappear when this vertex collapses.
    pub face_collapse_count: usize,
}

/// One texture channel's coordinates for a vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureCoordinate {
    pub u: f32,
    pub v: f32,
}

/// Quantized tangent plus the handedness factor used to rebuild the
/// bitangent as `(normal x tangent) * cross_factor`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TangentSpace {
    pub tangent: [i8; 3],
    pub cross_factor: i8,
}

fn quantize(component: f32) -> i8 {
    (component * QUANTIZE_SCALE).clamp(-127.0, 127.0) as i8
}

/// A rig-level submesh.
#[derive(Debug, Clone, Default)]
pub struct Submesh {
    material_id: i32,
    vertices: Vec<Vertex>,
    influences: Vec<Influence>,
    lod_controls: Vec<LodControl>,
    texture_coordinates: Vec<Vec<TextureCoordinate>>,
    tangents_enabled: Vec<bool>,
    tangent_spaces: Vec<Vec<TangentSpace>>,
    physical_properties: Vec<PhysicalProperty>,
    springs: Vec<Spring>,
    faces: Vec<Face>,
    lod_count: usize,
}

impl Submesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate storage for the given counts. Existing content is reset.
    pub fn resize(
        &mut self,
        vertex_count: usize,
        channel_count: usize,
        face_count: usize,
        spring_count: usize,
    ) {
        self.vertices = vec![Vertex::default(); vertex_count];
        self.influences.clear();
        self.lod_controls = vec![LodControl::default(); vertex_count];
        self.texture_coordinates =
            vec![vec![TextureCoordinate::default(); vertex_count]; channel_count];
        self.tangents_enabled = vec![false; channel_count];
        self.tangent_spaces = vec![Vec::new(); channel_count];
        self.physical_properties = vec![PhysicalProperty::default(); vertex_count];
        self.springs = vec![Spring::default(); spring_count];
        self.faces = vec![Face::default(); face_count];
    }

    pub fn material_id(&self) -> i32 {
        self.material_id
    }

    pub fn set_material_id(&mut self, material_id: i32) {
        self.material_id = material_id;
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    pub fn has_springs(&self) -> bool {
        !self.springs.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.texture_coordinates.len()
    }

    /// Number of collapsible vertices at the tail of the vertex list.
    pub fn lod_count(&self) -> usize {
        self.lod_count
    }

    pub fn set_lod_count(&mut self, lod_count: usize) {
        self.lod_count = lod_count;
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn influences(&self) -> &[Influence] {
        &self.influences
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn physical_properties(&self) -> &[PhysicalProperty] {
        &self.physical_properties
    }

    pub fn lod_controls(&self) -> &[LodControl] {
        &self.lod_controls
    }

    /// Store a vertex position and full-precision normal; the normal is
    /// quantized on the way in.
    pub fn set_vertex(&mut self, vertex_id: usize, position: Vec3, normal: Vec3) -> Result<()> {
        let vertex = self.vertex_mut(vertex_id)?;
        vertex.position = position;
        vertex.normal = [quantize(normal.x), quantize(normal.y), quantize(normal.z)];
        Ok(())
    }

    /// Store a vertex with an already-quantized normal, as read from a
    /// file.
    pub(crate) fn set_vertex_raw(
        &mut self,
        vertex_id: usize,
        position: Vec3,
        normal: [i8; 3],
    ) -> Result<()> {
        let vertex = self.vertex_mut(vertex_id)?;
        vertex.position = position;
        vertex.normal = normal;
        Ok(())
    }

    /// Store an already-quantized tangent space, as read from a file.
    pub(crate) fn set_tangent_space_raw(
        &mut self,
        channel: usize,
        vertex_id: usize,
        tangent: [i8; 3],
        cross_factor: i8,
    ) -> Result<()> {
        if !self.tangents_enabled(channel) {
            return Err(RigError::InvalidTangentChannel(channel));
        }
        let spaces = &mut self.tangent_spaces[channel];
        let count = spaces.len();
        let slot = spaces.get_mut(vertex_id).ok_or(RigError::OutOfRange {
            what: "vertex",
            index: vertex_id,
            count,
        })?;
        slot.tangent = tangent;
        slot.cross_factor = cross_factor;
        Ok(())
    }

    pub fn set_influence_count(&mut self, vertex_id: usize, count: usize) -> Result<()> {
        if count > MAX_INFLUENCE_COUNT {
            return Err(RigError::OutOfRange {
                what: "influence count",
                index: count,
                count: MAX_INFLUENCE_COUNT + 1,
            });
        }
        self.vertex_mut(vertex_id)?.influence_count = count as u8;
        Ok(())
    }

    /// Append one influence to the flat, vertex-ordered influence array.
    pub fn push_influence(&mut self, bone_id: usize, weight: f32) {
        self.influences.push(Influence { bone_id, weight });
    }

    pub fn set_lod_control(
        &mut self,
        vertex_id: usize,
        collapse_id: usize,
        face_collapse_count: usize,
    ) -> Result<()> {
        let count = self.lod_controls.len();
        let control = self
            .lod_controls
            .get_mut(vertex_id)
            .ok_or(RigError::OutOfRange {
                what: "vertex",
                index: vertex_id,
                count,
            })?;
        control.collapse_id = collapse_id;
        control.face_collapse_count = face_collapse_count;
        Ok(())
    }

    pub fn texture_coordinates(&self, channel: usize) -> Result<&[TextureCoordinate]> {
        self.texture_coordinates
            .get(channel)
            .map(Vec::as_slice)
            .ok_or(RigError::OutOfRange {
                what: "texture channel",
                index: channel,
                count: self.texture_coordinates.len(),
            })
    }

    pub fn set_texture_coordinate(
        &mut self,
        channel: usize,
        vertex_id: usize,
        u: f32,
        v: f32,
    ) -> Result<()> {
        let channel_count = self.texture_coordinates.len();
        let coordinates =
            self.texture_coordinates
                .get_mut(channel)
                .ok_or(RigError::OutOfRange {
                    what: "texture channel",
                    index: channel,
                    count: channel_count,
                })?;
        let count = coordinates.len();
        let slot = coordinates.get_mut(vertex_id).ok_or(RigError::OutOfRange {
            what: "vertex",
            index: vertex_id,
            count,
        })?;
        *slot = TextureCoordinate { u, v };
        Ok(())
    }

    pub fn tangents_enabled(&self, channel: usize) -> bool {
        self.tangents_enabled.get(channel).copied().unwrap_or(false)
    }

    /// Turn tangent-space storage for a channel on or off. Enabling
    /// allocates zeroed tangents for every vertex.
    pub fn enable_tangents(&mut self, channel: usize, enabled: bool) -> Result<()> {
        let channel_count = self.tangents_enabled.len();
        let flag = self
            .tangents_enabled
            .get_mut(channel)
            .ok_or(RigError::OutOfRange {
                what: "texture channel",
                index: channel,
                count: channel_count,
            })?;
        *flag = enabled;
        self.tangent_spaces[channel] = if enabled {
            vec![TangentSpace::default(); self.vertices.len()]
        } else {
            Vec::new()
        };
        Ok(())
    }

    pub fn tangent_spaces(&self, channel: usize) -> Result<&[TangentSpace]> {
        if !self.tangents_enabled(channel) {
            return Err(RigError::InvalidTangentChannel(channel));
        }
        Ok(&self.tangent_spaces[channel])
    }

    /// Store a tangent for a vertex on an enabled channel; the tangent is
    /// quantized on the way in, the cross factor (+/-1) is kept verbatim.
    pub fn set_tangent_space(
        &mut self,
        channel: usize,
        vertex_id: usize,
        tangent: Vec3,
        cross_factor: f32,
    ) -> Result<()> {
        if !self.tangents_enabled(channel) {
            return Err(RigError::InvalidTangentChannel(channel));
        }
        let spaces = &mut self.tangent_spaces[channel];
        let count = spaces.len();
        let slot = spaces.get_mut(vertex_id).ok_or(RigError::OutOfRange {
            what: "vertex",
            index: vertex_id,
            count,
        })?;
        slot.tangent = [quantize(tangent.x), quantize(tangent.y), quantize(tangent.z)];
        slot.cross_factor = cross_factor as i8;
        Ok(())
    }

    pub fn set_physical_property(&mut self, vertex_id: usize, weight: f32) -> Result<()> {
        let count = self.physical_properties.len();
        let property = self
            .physical_properties
            .get_mut(vertex_id)
            .ok_or(RigError::OutOfRange {
                what: "vertex",
                index: vertex_id,
                count,
            })?;
        property.weight = weight;
        Ok(())
    }

    pub fn set_face(&mut self, face_id: usize, vertex_ids: [usize; 3]) -> Result<()> {
        let count = self.faces.len();
        let face = self.faces.get_mut(face_id).ok_or(RigError::OutOfRange {
            what: "face",
            index: face_id,
            count,
        })?;
        face.vertex_ids = vertex_ids;
        Ok(())
    }

    pub fn set_spring(
        &mut self,
        spring_id: usize,
        vertex_ids: [usize; 2],
        coefficient: f32,
        idle_length: f32,
    ) -> Result<()> {
        let count = self.springs.len();
        let spring = self.springs.get_mut(spring_id).ok_or(RigError::OutOfRange {
            what: "spring",
            index: spring_id,
            count,
        })?;
        *spring = Spring {
            vertex_ids,
            coefficient,
            idle_length,
        };
        Ok(())
    }

    fn vertex_mut(&mut self, vertex_id: usize) -> Result<&mut Vertex> {
        let count = self.vertices.len();
        self.vertices.get_mut(vertex_id).ok_or(RigError::OutOfRange {
            what: "vertex",
            index: vertex_id,
            count,
        })
    }
}
