//! Binary saver; mirrors the loader field for field.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use glam::{Quat, Vec3};
use log::debug;

use super::{ANIMATION_MAGIC, CURRENT_FILE_VERSION, MESH_MAGIC, MODEL_MAGIC, SKELETON_MAGIC};
use crate::animation::AnimationClip;
use crate::error::{Result, RigError};
use crate::rig::{Bone, Rig, Submesh};

/// Save a rig as one combined model stream (skeleton followed by mesh).
pub fn save_combined<W: Write>(mut writer: W, rig: &Rig) -> Result<()> {
    debug!(
        "saving combined model stream: {} bones, {} submeshes",
        rig.bone_count(),
        rig.submesh_count()
    );
    writer.write_all(MODEL_MAGIC)?;
    writer.write_i32::<LittleEndian>(CURRENT_FILE_VERSION)?;
    write_bones(&mut writer, rig)?;
    write_submeshes(&mut writer, rig)?;
    Ok(())
}

/// Save a rig as separate skeleton and mesh streams.
pub fn save_split<W: Write, X: Write>(mut skeleton: W, mut mesh: X, rig: &Rig) -> Result<()> {
    skeleton.write_all(SKELETON_MAGIC)?;
    skeleton.write_i32::<LittleEndian>(CURRENT_FILE_VERSION)?;
    write_bones(&mut skeleton, rig)?;

    mesh.write_all(MESH_MAGIC)?;
    mesh.write_i32::<LittleEndian>(CURRENT_FILE_VERSION)?;
    write_submeshes(&mut mesh, rig)?;
    Ok(())
}

/// Save an animation clip.
pub fn save_animation<W: Write>(mut writer: W, clip: &AnimationClip) -> Result<()> {
    debug!(
        "saving clip: {} tracks, {}s",
        clip.track_count(),
        clip.duration()
    );
    writer.write_all(ANIMATION_MAGIC)?;
    writer.write_i32::<LittleEndian>(CURRENT_FILE_VERSION)?;
    writer.write_f32::<LittleEndian>(clip.duration())?;
    writer.write_i32::<LittleEndian>(clip.track_count() as i32)?;

    for track in clip.tracks() {
        write_string(&mut writer, track.bone_name())?;
        writer.write_i32::<LittleEndian>(track.keyframes().len() as i32)?;
        for keyframe in track.keyframes() {
            writer.write_f32::<LittleEndian>(keyframe.time)?;
            write_vec3(&mut writer, keyframe.direction)?;
            write_quat(&mut writer, keyframe.rotation)?;
        }
    }
    Ok(())
}

fn write_bones<W: Write>(writer: &mut W, rig: &Rig) -> Result<()> {
    writer.write_i32::<LittleEndian>(rig.bone_count() as i32)?;
    for bone in rig.bones() {
        write_bone(writer, bone)?;
    }
    Ok(())
}

fn write_bone<W: Write>(writer: &mut W, bone: &Bone) -> Result<()> {
    write_string(writer, bone.name())?;
    writer.write_f32::<LittleEndian>(bone.length())?;
    write_vec3(writer, bone.translation())?;
    write_quat(writer, bone.rotation())?;
    write_vec3(writer, bone.translation_bone_space())?;
    write_quat(writer, bone.rotation_bone_space())?;
    writer.write_i32::<LittleEndian>(bone.parent().map_or(-1, |id| id as i32))?;
    writer.write_i32::<LittleEndian>(bone.children().len() as i32)?;
    for &child_id in bone.children() {
        writer.write_i32::<LittleEndian>(child_id as i32)?;
    }
    Ok(())
}

fn write_submeshes<W: Write>(writer: &mut W, rig: &Rig) -> Result<()> {
    writer.write_i32::<LittleEndian>(rig.submesh_count() as i32)?;
    for submesh in rig.submeshes() {
        write_submesh(writer, submesh)?;
    }
    Ok(())
}

fn write_submesh<W: Write>(writer: &mut W, submesh: &Submesh) -> Result<()> {
    writer.write_i32::<LittleEndian>(submesh.material_id())?;
    writer.write_i32::<LittleEndian>(submesh.vertex_count() as i32)?;
    writer.write_i32::<LittleEndian>(submesh.face_count() as i32)?;
    writer.write_i32::<LittleEndian>(submesh.lod_count() as i32)?;
    writer.write_i32::<LittleEndian>(submesh.spring_count() as i32)?;
    writer.write_i32::<LittleEndian>(submesh.channel_count() as i32)?;

    for channel in 0..submesh.channel_count() {
        writer.write_u8(u8::from(submesh.tangents_enabled(channel)))?;
    }

    let influences = submesh.influences();
    let lod_controls = submesh.lod_controls();
    let physical_properties = submesh.physical_properties();
    let mut cursor = 0usize;

    for (vertex_id, vertex) in submesh.vertices().iter().enumerate() {
        write_vec3(writer, vertex.position)?;
        for component in vertex.normal {
            writer.write_i8(component)?;
        }

        let control = &lod_controls[vertex_id];
        writer.write_i32::<LittleEndian>(control.collapse_id as i32)?;
        writer.write_i32::<LittleEndian>(control.face_collapse_count as i32)?;

        for channel in 0..submesh.channel_count() {
            let coordinate = submesh.texture_coordinates(channel)?[vertex_id];
            writer.write_f32::<LittleEndian>(coordinate.u)?;
            writer.write_f32::<LittleEndian>(coordinate.v)?;

            if submesh.tangents_enabled(channel) {
                let space = &submesh.tangent_spaces(channel)?[vertex_id];
                for component in space.tangent {
                    writer.write_i8(component)?;
                }
                writer.write_i8(space.cross_factor)?;
            }
        }

        let influence_count = vertex.influence_count as usize;
        writer.write_i32::<LittleEndian>(influence_count as i32)?;
        let vertex_influences = influences
            .get(cursor..cursor + influence_count)
            .ok_or(RigError::OutOfRange {
                what: "influence",
                index: cursor + influence_count,
                count: influences.len(),
            })?;
        for influence in vertex_influences {
            writer.write_i32::<LittleEndian>(influence.bone_id as i32)?;
            writer.write_f32::<LittleEndian>(influence.weight)?;
        }
        cursor += influence_count;

        if submesh.has_springs() {
            writer.write_f32::<LittleEndian>(physical_properties[vertex_id].weight)?;
        }
    }

    for spring in submesh.springs() {
        writer.write_i32::<LittleEndian>(spring.vertex_ids[0] as i32)?;
        writer.write_i32::<LittleEndian>(spring.vertex_ids[1] as i32)?;
        writer.write_f32::<LittleEndian>(spring.coefficient)?;
        writer.write_f32::<LittleEndian>(spring.idle_length)?;
    }

    for face in submesh.faces() {
        for &vertex_id in &face.vertex_ids {
            writer.write_i32::<LittleEndian>(vertex_id as i32)?;
        }
    }

    Ok(())
}

/// Write a string with its trailing NUL counted in the length prefix.
fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    writer.write_i32::<LittleEndian>(value.len() as i32 + 1)?;
    writer.write_all(value.as_bytes())?;
    writer.write_u8(0)?;
    Ok(())
}

fn write_vec3<W: Write>(writer: &mut W, value: Vec3) -> Result<()> {
    writer.write_f32::<LittleEndian>(value.x)?;
    writer.write_f32::<LittleEndian>(value.y)?;
    writer.write_f32::<LittleEndian>(value.z)?;
    Ok(())
}

fn write_quat<W: Write>(writer: &mut W, value: Quat) -> Result<()> {
    writer.write_f32::<LittleEndian>(value.x)?;
    writer.write_f32::<LittleEndian>(value.y)?;
    writer.write_f32::<LittleEndian>(value.z)?;
    writer.write_f32::<LittleEndian>(value.w)?;
    Ok(())
}
