//! Save/load round-trips over in-memory buffers.

use std::io::Cursor;

use glam::{Quat, Vec3};
use pretty_assertions::assert_eq;

use rig3d::animation::{AnimationClip, Keyframe, Track};
use rig3d::io::{self, LoaderOptions};
use rig3d::rig::Submesh;
use rig3d::Rig;

fn build_rig() -> Rig {
    let mut rig = Rig::new();
    let root = rig.add_bone("root", None).unwrap();
    let flap = rig.add_bone("flap", Some(root)).unwrap();
    {
        let bone = rig.bone_mut(root).unwrap();
        bone.set_length(1.25);
        bone.set_rotation(Quat::from_rotation_y(0.5));
    }
    {
        let bone = rig.bone_mut(flap).unwrap();
        bone.set_length(2.0);
        bone.set_translation(Vec3::new(0.0, 2.0, 0.25));
        bone.set_bone_space(Vec3::new(0.0, -2.0, -0.25), Quat::from_rotation_x(-0.5));
    }
    rig.calculate_bind_pose();

    let mut submesh = Submesh::new();
    submesh.resize(3, 2, 1, 1);
    submesh.set_material_id(7);
    submesh.set_lod_count(1);
    submesh.enable_tangents(1, true).unwrap();
    for vertex_id in 0..3 {
        let offset = vertex_id as f32;
        submesh
            .set_vertex(vertex_id, Vec3::new(offset, offset * 0.5, 1.0), Vec3::Y)
            .unwrap();
        submesh.set_lod_control(vertex_id, 0, usize::from(vertex_id == 2)).unwrap();
        submesh
            .set_texture_coordinate(0, vertex_id, offset * 0.1, 0.9)
            .unwrap();
        submesh
            .set_texture_coordinate(1, vertex_id, offset * 0.2, 0.1)
            .unwrap();
        submesh
            .set_tangent_space(1, vertex_id, Vec3::X, -1.0)
            .unwrap();
        submesh.set_physical_property(vertex_id, offset).unwrap();
    }
    submesh.set_influence_count(0, 1).unwrap();
    submesh.push_influence(root, 1.0);
    submesh.set_influence_count(1, 2).unwrap();
    submesh.push_influence(root, 0.75);
    submesh.push_influence(flap, 0.25);
    submesh.set_influence_count(2, 0).unwrap();
    submesh.set_spring(0, [0, 2], 11.5, 1.75).unwrap();
    submesh.set_face(0, [0, 1, 2]).unwrap();
    rig.add_submesh(submesh);
    rig
}

fn assert_rigs_match(loaded: &Rig, original: &Rig) {
    assert_eq!(loaded.bone_count(), original.bone_count());
    for (loaded_bone, bone) in loaded.bones().iter().zip(original.bones()) {
        assert_eq!(loaded_bone.name(), bone.name());
        assert_eq!(loaded_bone.parent(), bone.parent());
        assert_eq!(loaded_bone.children(), bone.children());
        assert_eq!(loaded_bone.length(), bone.length());
        assert_eq!(loaded_bone.translation(), bone.translation());
        assert_eq!(loaded_bone.rotation(), bone.rotation());
        assert_eq!(
            loaded_bone.translation_bone_space(),
            bone.translation_bone_space()
        );
        assert_eq!(loaded_bone.rotation_bone_space(), bone.rotation_bone_space());
        // Derived bind-pose transforms are recomputed on load.
        assert!(
            (loaded_bone.translation_absolute() - bone.translation_absolute()).length() < 1e-6
        );
    }

    assert_eq!(loaded.submesh_count(), original.submesh_count());
    for (loaded_submesh, submesh) in loaded.submeshes().iter().zip(original.submeshes()) {
        assert_eq!(loaded_submesh.material_id(), submesh.material_id());
        assert_eq!(loaded_submesh.lod_count(), submesh.lod_count());
        assert_eq!(loaded_submesh.vertex_count(), submesh.vertex_count());
        assert_eq!(loaded_submesh.channel_count(), submesh.channel_count());

        for (loaded_vertex, vertex) in loaded_submesh.vertices().iter().zip(submesh.vertices()) {
            assert_eq!(loaded_vertex.position, vertex.position);
            assert_eq!(loaded_vertex.normal, vertex.normal);
            assert_eq!(loaded_vertex.influence_count, vertex.influence_count);
        }
        for (loaded_influence, influence) in
            loaded_submesh.influences().iter().zip(submesh.influences())
        {
            assert_eq!(loaded_influence.bone_id, influence.bone_id);
            assert_eq!(loaded_influence.weight, influence.weight);
        }
        for (loaded_control, control) in loaded_submesh
            .lod_controls()
            .iter()
            .zip(submesh.lod_controls())
        {
            assert_eq!(loaded_control.collapse_id, control.collapse_id);
            assert_eq!(
                loaded_control.face_collapse_count,
                control.face_collapse_count
            );
        }
        for channel in 0..submesh.channel_count() {
            assert_eq!(
                loaded_submesh.texture_coordinates(channel).unwrap(),
                submesh.texture_coordinates(channel).unwrap()
            );
            assert_eq!(
                loaded_submesh.tangents_enabled(channel),
                submesh.tangents_enabled(channel)
            );
        }
        let loaded_spaces = loaded_submesh.tangent_spaces(1).unwrap();
        for (loaded_space, space) in loaded_spaces.iter().zip(submesh.tangent_spaces(1).unwrap())
        {
            assert_eq!(loaded_space.tangent, space.tangent);
            assert_eq!(loaded_space.cross_factor, space.cross_factor);
        }
        for (loaded_property, property) in loaded_submesh
            .physical_properties()
            .iter()
            .zip(submesh.physical_properties())
        {
            assert_eq!(loaded_property.weight, property.weight);
        }
        for (loaded_spring, spring) in loaded_submesh.springs().iter().zip(submesh.springs()) {
            assert_eq!(loaded_spring.vertex_ids, spring.vertex_ids);
            assert_eq!(loaded_spring.coefficient, spring.coefficient);
            assert_eq!(loaded_spring.idle_length, spring.idle_length);
        }
        assert_eq!(loaded_submesh.faces(), submesh.faces());
    }
}

#[test]
fn test_combined_model_round_trip() {
    let rig = build_rig();

    let mut buffer = Vec::new();
    io::save_combined(&mut buffer, &rig).unwrap();
    let loaded = io::load_combined(Cursor::new(buffer), LoaderOptions::empty()).unwrap();

    assert_rigs_match(&loaded, &rig);
}

#[test]
fn test_split_streams_round_trip() {
    let rig = build_rig();

    let mut skeleton = Vec::new();
    let mut mesh = Vec::new();
    io::save_split(&mut skeleton, &mut mesh, &rig).unwrap();
    let loaded = io::load_split(
        Cursor::new(skeleton),
        Cursor::new(mesh),
        LoaderOptions::empty(),
    )
    .unwrap();

    assert_rigs_match(&loaded, &rig);
}

#[test]
fn test_animation_round_trip() {
    let mut clip = AnimationClip::new(2.5);
    let mut track = Track::new("flap");
    track.add_keyframe(Keyframe::new(0.0, Vec3::Y, Quat::IDENTITY));
    track.add_keyframe(Keyframe::new(1.25, Vec3::new(0.3, 0.9, 0.1), Quat::from_rotation_z(0.7)));
    track.add_keyframe(Keyframe::new(2.5, Vec3::Y, Quat::IDENTITY));
    clip.add_track(track);

    let mut buffer = Vec::new();
    io::save_animation(&mut buffer, &clip).unwrap();
    let loaded = io::load_animation(Cursor::new(buffer)).unwrap();

    assert_eq!(loaded.duration(), clip.duration());
    assert_eq!(loaded.track_count(), clip.track_count());
    let (loaded_track, track) = (&loaded.tracks()[0], &clip.tracks()[0]);
    assert_eq!(loaded_track.bone_name(), track.bone_name());
    assert_eq!(loaded_track.keyframes(), track.keyframes());
}

#[test]
fn test_invert_v_coordinate_option() {
    let rig = build_rig();

    let mut buffer = Vec::new();
    io::save_combined(&mut buffer, &rig).unwrap();
    let loaded = io::load_combined(Cursor::new(buffer), LoaderOptions::INVERT_V_COORD).unwrap();

    let submesh = loaded.submesh(0).unwrap();
    let coordinate = submesh.texture_coordinates(0).unwrap()[0];
    assert!((coordinate.v - 0.1).abs() < 1e-6);
}
