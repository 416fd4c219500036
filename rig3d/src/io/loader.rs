//! Binary loader for rigs and animation clips.

use std::f32::consts::FRAC_PI_2;
use std::io::Read;

use bitflags::bitflags;
use byteorder::{LittleEndian, ReadBytesExt};
use glam::{Quat, Vec3};
use log::debug;

use super::{
    ANIMATION_MAGIC, CURRENT_FILE_VERSION, EARLIEST_COMPATIBLE_FILE_VERSION, MESH_MAGIC,
    MODEL_MAGIC, SKELETON_MAGIC,
};
use crate::animation::{AnimationClip, Keyframe, Track};
use crate::error::{Result, RigError};
use crate::rig::{Bone, MAX_INFLUENCE_COUNT, Rig, Submesh};

bitflags! {
    /// Import-time conveniences for exporters with other conventions.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct LoaderOptions: u32 {
        /// Re-base root bones from Z-up exporters: swap translation y/z
        /// and fold a 90 degree X rotation into the root rotation.
        const ROTATE_X_AXIS = 1;
        /// Flip texture coordinates vertically (v becomes 1 - v).
        const INVERT_V_COORD = 1 << 1;
    }
}

/// Load a rig from a combined model stream (skeleton followed by mesh).
pub fn load_combined<R: Read>(mut reader: R, options: LoaderOptions) -> Result<Rig> {
    check_magic(&mut reader, MODEL_MAGIC)?;
    let version = check_version(&mut reader)?;
    debug!("loading combined model stream, version {version}");

    let mut rig = Rig::new();
    read_bones(&mut reader, &mut rig, options)?;
    read_submeshes(&mut reader, &mut rig, options)?;
    rig.calculate_bind_pose();
    Ok(rig)
}

/// Load a rig from separate skeleton and mesh streams.
pub fn load_split<R: Read, S: Read>(
    mut skeleton: R,
    mut mesh: S,
    options: LoaderOptions,
) -> Result<Rig> {
    check_magic(&mut skeleton, SKELETON_MAGIC)?;
    let version = check_version(&mut skeleton)?;
    debug!("loading skeleton stream, version {version}");

    let mut rig = Rig::new();
    read_bones(&mut skeleton, &mut rig, options)?;
    rig.calculate_bind_pose();

    check_magic(&mut mesh, MESH_MAGIC)?;
    let version = check_version(&mut mesh)?;
    debug!("loading mesh stream, version {version}");
    read_submeshes(&mut mesh, &mut rig, options)?;
    Ok(rig)
}

/// Load an animation clip.
pub fn load_animation<R: Read>(mut reader: R) -> Result<AnimationClip> {
    check_magic(&mut reader, ANIMATION_MAGIC)?;
    let version = check_version(&mut reader)?;

    let duration = reader.read_f32::<LittleEndian>()?;
    if duration <= 0.0 {
        return Err(RigError::InvalidDuration(duration));
    }

    let track_count = reader.read_i32::<LittleEndian>()?;
    if track_count <= 0 {
        return Err(RigError::ParseError(format!(
            "invalid track count {track_count}"
        )));
    }
    debug!("loading clip, version {version}, {track_count} tracks, {duration}s");

    let mut clip = AnimationClip::new(duration);
    for _ in 0..track_count {
        clip.add_track(read_track(&mut reader)?);
    }
    Ok(clip)
}

fn read_track<R: Read>(reader: &mut R) -> Result<Track> {
    let bone_name = read_string(reader)?;
    let keyframe_count = reader.read_i32::<LittleEndian>()?;
    if keyframe_count <= 0 {
        return Err(RigError::ParseError(format!(
            "invalid keyframe count {keyframe_count} in track '{bone_name}'"
        )));
    }

    let mut track = Track::new(bone_name);
    for _ in 0..keyframe_count {
        let time = reader.read_f32::<LittleEndian>()?;
        let direction = read_vec3(reader)?;
        let rotation = read_quat(reader)?;
        track.add_keyframe(Keyframe::new(time, direction, rotation));
    }
    Ok(track)
}

fn read_bones<R: Read>(reader: &mut R, rig: &mut Rig, options: LoaderOptions) -> Result<()> {
    let bone_count = reader.read_i32::<LittleEndian>()?;
    if bone_count <= 0 {
        return Err(RigError::ParseError(format!(
            "invalid bone count {bone_count}"
        )));
    }

    // Parents may reference bones in either direction, so wiring happens
    // after every bone exists.
    let mut parents = Vec::with_capacity(bone_count as usize);
    for _ in 0..bone_count {
        let (bone, parent) = read_bone(reader, options)?;
        rig.push_bone(bone);
        parents.push(parent);
    }
    for (bone_id, parent) in parents.into_iter().enumerate() {
        if let Some(parent_id) = parent {
            if parent_id >= rig.bone_count() {
                return Err(RigError::ParseError(format!(
                    "bone {bone_id} references missing parent {parent_id}"
                )));
            }
            if let Some(bone) = rig.bone_mut(bone_id) {
                bone.set_parent(Some(parent_id));
            }
        }
    }
    Ok(())
}

fn read_bone<R: Read>(reader: &mut R, options: LoaderOptions) -> Result<(Bone, Option<usize>)> {
    let name = read_string(reader)?;
    let length = reader.read_f32::<LittleEndian>()?;
    let mut translation = read_vec3(reader)?;
    let mut rotation = read_quat(reader)?;
    let translation_bone_space = read_vec3(reader)?;
    let rotation_bone_space = read_quat(reader)?;

    let parent_id = reader.read_i32::<LittleEndian>()?;
    let parent = if parent_id < 0 {
        None
    } else {
        Some(parent_id as usize)
    };

    if parent.is_none() && options.contains(LoaderOptions::ROTATE_X_AXIS) {
        translation = Vec3::new(translation.x, translation.z, translation.y);
        rotation *= Quat::from_rotation_x(FRAC_PI_2);
    }

    let mut bone = Bone::new(name);
    bone.set_length(length);
    bone.set_translation(translation);
    bone.set_rotation(rotation);
    bone.set_bone_space(translation_bone_space, rotation_bone_space);

    let child_count = reader.read_i32::<LittleEndian>()?;
    if child_count < 0 {
        return Err(RigError::ParseError(format!(
            "invalid child count {child_count}"
        )));
    }
    for _ in 0..child_count {
        let child_id = reader.read_i32::<LittleEndian>()?;
        if child_id < 0 {
            return Err(RigError::ParseError(format!(
                "invalid child bone id {child_id}"
            )));
        }
        bone.add_child(child_id as usize);
    }

    Ok((bone, parent))
}

fn read_submeshes<R: Read>(reader: &mut R, rig: &mut Rig, options: LoaderOptions) -> Result<()> {
    let submesh_count = reader.read_i32::<LittleEndian>()?;
    if submesh_count < 0 {
        return Err(RigError::ParseError(format!(
            "invalid submesh count {submesh_count}"
        )));
    }
    for _ in 0..submesh_count {
        let submesh = read_submesh(reader, options)?;
        rig.add_submesh(submesh);
    }
    Ok(())
}

fn read_submesh<R: Read>(reader: &mut R, options: LoaderOptions) -> Result<Submesh> {
    let material_id = reader.read_i32::<LittleEndian>()?;
    let vertex_count = read_count(reader, "vertex")?;
    let face_count = read_count(reader, "face")?;
    let lod_count = read_count(reader, "LOD")?;
    let spring_count = read_count(reader, "spring")?;
    let channel_count = read_count(reader, "texture channel")?;

    let mut submesh = Submesh::new();
    submesh.resize(vertex_count, channel_count, face_count, spring_count);
    submesh.set_material_id(material_id);
    submesh.set_lod_count(lod_count);

    for channel in 0..channel_count {
        let enabled = reader.read_u8()? != 0;
        submesh.enable_tangents(channel, enabled)?;
    }

    for vertex_id in 0..vertex_count {
        let position = read_vec3(reader)?;
        let normal = [reader.read_i8()?, reader.read_i8()?, reader.read_i8()?];
        submesh.set_vertex_raw(vertex_id, position, normal)?;

        let collapse_id = reader.read_i32::<LittleEndian>()?;
        let face_collapse_count = reader.read_i32::<LittleEndian>()?;
        submesh.set_lod_control(
            vertex_id,
            collapse_id.max(0) as usize,
            face_collapse_count.max(0) as usize,
        )?;

        for channel in 0..channel_count {
            let u = reader.read_f32::<LittleEndian>()?;
            let mut v = reader.read_f32::<LittleEndian>()?;
            if options.contains(LoaderOptions::INVERT_V_COORD) {
                v = 1.0 - v;
            }
            submesh.set_texture_coordinate(channel, vertex_id, u, v)?;

            if submesh.tangents_enabled(channel) {
                let tangent = [reader.read_i8()?, reader.read_i8()?, reader.read_i8()?];
                let cross_factor = reader.read_i8()?;
                submesh.set_tangent_space_raw(channel, vertex_id, tangent, cross_factor)?;
            }
        }

        let influence_count = reader.read_i32::<LittleEndian>()?;
        if influence_count < 0 || influence_count as usize > MAX_INFLUENCE_COUNT {
            return Err(RigError::ParseError(format!(
                "invalid influence count {influence_count} on vertex {vertex_id}"
            )));
        }
        submesh.set_influence_count(vertex_id, influence_count as usize)?;
        for _ in 0..influence_count {
            let bone_id = reader.read_i32::<LittleEndian>()?;
            if bone_id < 0 {
                return Err(RigError::ParseError(format!(
                    "invalid influence bone id {bone_id}"
                )));
            }
            let weight = reader.read_f32::<LittleEndian>()?;
            submesh.push_influence(bone_id as usize, weight);
        }

        if spring_count > 0 {
            let weight = reader.read_f32::<LittleEndian>()?;
            submesh.set_physical_property(vertex_id, weight)?;
        }
    }

    for spring_id in 0..spring_count {
        let vertex_0 = read_count(reader, "spring vertex")?;
        let vertex_1 = read_count(reader, "spring vertex")?;
        let coefficient = reader.read_f32::<LittleEndian>()?;
        let idle_length = reader.read_f32::<LittleEndian>()?;
        submesh.set_spring(spring_id, [vertex_0, vertex_1], coefficient, idle_length)?;
    }

    for face_id in 0..face_count {
        let vertex_ids = [
            read_count(reader, "face vertex")?,
            read_count(reader, "face vertex")?,
            read_count(reader, "face vertex")?,
        ];
        submesh.set_face(face_id, vertex_ids)?;
    }

    Ok(submesh)
}

fn check_magic<R: Read>(reader: &mut R, expected: &[u8; 4]) -> Result<()> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != expected {
        return Err(RigError::InvalidMagic {
            expected: String::from_utf8_lossy(expected).into_owned(),
            actual: String::from_utf8_lossy(&magic).into_owned(),
        });
    }
    Ok(())
}

fn check_version<R: Read>(reader: &mut R) -> Result<i32> {
    let version = reader.read_i32::<LittleEndian>()?;
    if !(EARLIEST_COMPATIBLE_FILE_VERSION..=CURRENT_FILE_VERSION).contains(&version) {
        return Err(RigError::UnsupportedVersion(version));
    }
    Ok(version)
}

/// Read a length-prefixed, NUL-terminated string.
fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let length = reader.read_i32::<LittleEndian>()?;
    if length < 1 {
        return Err(RigError::ParseError(format!(
            "invalid string length {length}"
        )));
    }

    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    String::from_utf8(bytes).map_err(|err| RigError::ParseError(format!("invalid string: {err}")))
}

fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let count = reader.read_i32::<LittleEndian>()?;
    if count < 0 {
        return Err(RigError::ParseError(format!("invalid {what} count {count}")));
    }
    Ok(count as usize)
}

fn read_vec3<R: Read>(reader: &mut R) -> Result<Vec3> {
    Ok(Vec3::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}

fn read_quat<R: Read>(reader: &mut R) -> Result<Quat> {
    Ok(Quat::from_xyzw(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}
