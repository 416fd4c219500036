//! Cloth behavior: a pennant of one anchored and one free vertex.

use std::sync::Arc;

use glam::Vec3;

use rig3d::rig::Submesh;
use rig3d::{Model, Rig};

/// Vertex 0 is pinned to the bone, vertex 1 hangs off it on a unit
/// spring.
fn pennant_rig() -> Arc<Rig> {
    let mut rig = Rig::new();
    let mast = rig.add_bone("mast", None).unwrap();
    rig.calculate_bind_pose();

    let mut submesh = Submesh::new();
    submesh.resize(2, 0, 0, 1);
    submesh.set_vertex(0, Vec3::ZERO, Vec3::Z).unwrap();
    submesh.set_vertex(1, Vec3::new(1.0, 0.0, 0.0), Vec3::Z).unwrap();
    submesh.set_influence_count(0, 1).unwrap();
    submesh.push_influence(mast, 1.0);
    // The free vertex carries an influence too; the skinner must step
    // over it without shifting later vertices' influence windows.
    submesh.set_influence_count(1, 1).unwrap();
    submesh.push_influence(mast, 1.0);
    submesh.set_physical_property(0, 0.0).unwrap();
    submesh.set_physical_property(1, 1.0).unwrap();
    submesh.set_spring(0, [0, 1], 10.0, 1.0).unwrap();
    rig.add_submesh(submesh);

    Arc::new(rig)
}

fn step(model: &mut Model, delta_time: f32) {
    model.clear_state();
    model.lock_state();
    model.calculate_state();
    model.update_spring_system(delta_time);
    model.update_vertices().unwrap();
}

#[test]
fn test_springs_force_buffering_on() {
    let model = Model::new(pennant_rig());

    assert!(model.submesh(0).unwrap().is_buffered());
}

#[test]
fn test_free_vertex_sags_but_keeps_spring_length() {
    let mut model = Model::new(pennant_rig());

    for _ in 0..10 {
        step(&mut model, 0.02);
    }

    let buffers = model.submesh(0).unwrap();
    let anchor = buffers.positions()[0];
    let free = buffers.positions()[1];

    // The anchor sticks to the skinned surface.
    assert!((anchor - Vec3::ZERO).length() < 1e-5);
    // Gravity dragged the free vertex down...
    assert!(free.z < -0.1);
    // ...while the length constraint held the spring at idle length.
    assert!(((free - anchor).length() - 1.0).abs() < 1e-4);
}

#[test]
fn test_anchor_follows_the_skeleton() {
    let mut model = Model::new(pennant_rig());
    model.set_translation(Vec3::new(3.0, 0.0, 0.0));

    step(&mut model, 0.02);

    let buffers = model.submesh(0).unwrap();
    assert!((buffers.positions()[0] - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn test_spring_time_is_consumed_by_update() {
    let mut model = Model::new(pennant_rig());
    model.clear_state();
    model.calculate_state();

    model.update_spring_system(0.016);
    assert!((model.submesh(0).unwrap().spring_time() - 0.016).abs() < 1e-6);

    model.update_vertices().unwrap();
    assert_eq!(model.submesh(0).unwrap().spring_time(), 0.0);
}
