//! Full pose-to-skinned-vertices pipeline over a small two-bone rig.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{Quat, Vec3};
use pretty_assertions::assert_eq;
use test_case::test_case;

use rig3d::animation::{AnimationClip, Keyframe, Track};
use rig3d::rig::Submesh;
use rig3d::{Model, Rig};

/// Two bones on a vertical chain: "root" at the origin, "forearm" two
/// units up. One submesh: vertex 0 rides the root rigidly, vertex 1
/// rides the forearm rigidly, vertex 2 is split between both.
fn build_rig() -> Arc<Rig> {
    let mut rig = Rig::new();
    let root = rig.add_bone("root", None).unwrap();
    let forearm = rig.add_bone("forearm", Some(root)).unwrap();
    rig.bone_mut(forearm)
        .unwrap()
        .set_translation(Vec3::new(0.0, 2.0, 0.0));
    // Inverse bind: each bone maps its absolute bind position back to
    // the origin of its own space.
    rig.bone_mut(forearm)
        .unwrap()
        .set_bone_space(Vec3::new(0.0, -2.0, 0.0), Quat::IDENTITY);
    rig.calculate_bind_pose();

    let mut submesh = Submesh::new();
    submesh.resize(3, 0, 1, 0);
    submesh.set_vertex(0, Vec3::ZERO, Vec3::Z).unwrap();
    submesh.set_vertex(1, Vec3::new(0.0, 2.0, 0.0), Vec3::Z).unwrap();
    submesh.set_vertex(2, Vec3::new(0.0, 1.0, 0.0), Vec3::Z).unwrap();
    submesh.set_influence_count(0, 1).unwrap();
    submesh.push_influence(root, 1.0);
    submesh.set_influence_count(1, 1).unwrap();
    submesh.push_influence(forearm, 1.0);
    submesh.set_influence_count(2, 2).unwrap();
    submesh.push_influence(root, 0.5);
    submesh.push_influence(forearm, 0.5);
    submesh.set_face(0, [0, 1, 2]).unwrap();
    rig.add_submesh(submesh);

    Arc::new(rig)
}

fn roll_root_clip() -> AnimationClip {
    let mut clip = AnimationClip::new(1.0);
    let mut track = Track::new("root");
    track.add_keyframe(Keyframe::new(0.0, Vec3::ZERO, Quat::IDENTITY));
    track.add_keyframe(Keyframe::new(
        1.0,
        Vec3::ZERO,
        Quat::from_rotation_z(FRAC_PI_2),
    ));
    clip.add_track(track);
    clip
}

#[test]
fn test_bind_pose_skins_to_bind_positions() {
    let mut model = Model::new(build_rig());
    model.enable_buffering(0).unwrap();

    model.clear_state();
    model.lock_state();
    model.calculate_state();
    model.update_vertices().unwrap();

    let buffers = model.submesh(0).unwrap();
    assert!((buffers.positions()[0] - Vec3::ZERO).length() < 1e-5);
    assert!((buffers.positions()[1] - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    assert!((buffers.positions()[2] - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-2);
}

#[test]
fn test_full_clip_rolls_the_chain() {
    let mut model = Model::new(build_rig());
    model.enable_buffering(0).unwrap();
    let clip = roll_root_clip();

    model.clear_state();
    model.blend_animation(&clip, 1.0, 1.0);
    model.lock_state();
    model.calculate_state();
    model.update_vertices().unwrap();

    // The root's 90 degree Z roll carries the whole chain: the forearm
    // vertex swings from (0,2,0) to (-2,0,0).
    let buffers = model.submesh(0).unwrap();
    assert!((buffers.positions()[0] - Vec3::ZERO).length() < 1e-5);
    assert!((buffers.positions()[1] - Vec3::new(-2.0, 0.0, 0.0)).length() < 1e-4);

    // Blended vertices keep unit normals.
    assert!((buffers.normals()[2].length() - 1.0).abs() < 0.001);
}

#[test]
fn test_halfway_sample_rolls_halfway() {
    let mut model = Model::new(build_rig());
    let clip = roll_root_clip();

    model.clear_state();
    model.blend_animation(&clip, 1.0, 0.5);
    model.lock_state();
    model.calculate_state();

    let expected = Quat::from_rotation_z(FRAC_PI_2 / 2.0);
    let actual = model.bone(0).unwrap().rotation_absolute();
    assert!(actual.dot(expected).abs() > 0.999);
}

#[test]
fn test_second_model_mimics_the_first() {
    let rig = build_rig();
    let mut leader = Model::new(Arc::clone(&rig));
    let clip = roll_root_clip();
    leader.clear_state();
    leader.blend_animation(&clip, 1.0, 1.0);
    leader.lock_state();
    leader.calculate_state();

    let mut follower = Model::new(rig);
    follower.mimic_pose(&leader).unwrap();

    assert_eq!(
        follower.bone(1).unwrap().translation_absolute(),
        leader.bone(1).unwrap().translation_absolute()
    );
    assert_eq!(follower.transform_translations(), leader.transform_translations());
}

/// A strip of four vertices where the last two collapse onto the first
/// two, each taking one face with it.
fn lod_rig() -> Arc<Rig> {
    let mut rig = Rig::new();
    rig.add_bone("root", None).unwrap();
    rig.calculate_bind_pose();

    let mut submesh = Submesh::new();
    submesh.resize(4, 0, 3, 0);
    for vertex_id in 0..4 {
        submesh
            .set_vertex(vertex_id, Vec3::new(vertex_id as f32, 0.0, 0.0), Vec3::Z)
            .unwrap();
        submesh.set_influence_count(vertex_id, 0).unwrap();
        submesh.set_lod_control(vertex_id, 0, 0).unwrap();
    }
    submesh.set_lod_control(2, 0, 1).unwrap();
    submesh.set_lod_control(3, 1, 1).unwrap();
    submesh.set_face(0, [0, 1, 2]).unwrap();
    submesh.set_face(1, [1, 3, 2]).unwrap();
    submesh.set_face(2, [0, 2, 3]).unwrap();
    submesh.set_lod_count(2);
    rig.add_submesh(submesh);
    Arc::new(rig)
}

#[test_case(1.0, 4, 3; "full detail")]
#[test_case(0.5, 3, 2; "half detail")]
#[test_case(0.0, 2, 1; "lowest detail")]
fn test_lod_levels(level: f32, vertex_count: usize, face_count: usize) {
    let mut model = Model::new(lod_rig());

    model.set_lod_level(level);

    let buffers = model.submesh(0).unwrap();
    assert_eq!(buffers.vertex_count(), vertex_count);
    assert_eq!(buffers.face_count(), face_count);
    for face in buffers.faces() {
        for &vertex_id in &face.vertex_ids {
            assert!(vertex_id < vertex_count, "face references collapsed vertex");
        }
    }
}
