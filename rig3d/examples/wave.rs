//! Build a three-bone arm, play a waving clip and print the fingertip
//! path.

use std::f32::consts::FRAC_PI_4;
use std::sync::Arc;

use glam::{Quat, Vec3};
use rig3d::animation::{AnimationClip, Keyframe, Track};
use rig3d::{Model, Rig};

#[allow(clippy::unwrap_used, clippy::print_stdout)]
fn main() {
    env_logger::init();

    let mut rig = Rig::new();
    let shoulder = rig.add_bone("shoulder", None).unwrap();
    let elbow = rig.add_bone("elbow", Some(shoulder)).unwrap();
    let wrist = rig.add_bone("wrist", Some(elbow)).unwrap();
    rig.bone_mut(elbow)
        .unwrap()
        .set_translation(Vec3::new(0.0, 1.0, 0.0));
    rig.bone_mut(elbow).unwrap().set_length(1.0);
    rig.bone_mut(wrist)
        .unwrap()
        .set_translation(Vec3::new(0.0, 1.0, 0.0));
    rig.calculate_bind_pose();

    let mut clip = AnimationClip::new(2.0);
    let mut track = Track::new("elbow");
    track.add_keyframe(Keyframe::new(0.0, Vec3::Y, Quat::from_rotation_z(-FRAC_PI_4)));
    track.add_keyframe(Keyframe::new(1.0, Vec3::Y, Quat::from_rotation_z(FRAC_PI_4)));
    track.add_keyframe(Keyframe::new(2.0, Vec3::Y, Quat::from_rotation_z(-FRAC_PI_4)));
    clip.add_track(track);

    let mut model = Model::new(Arc::new(rig));
    for frame in 0..=8 {
        let time = frame as f32 * 0.25;
        model.clear_state();
        model.blend_animation(&clip, 1.0, time);
        model.lock_state();
        model.calculate_state();

        let tip = model.bone(wrist).unwrap().translation_absolute();
        println!(
            "t={time:.2}s fingertip at ({:+.3}, {:+.3}, {:+.3})",
            tip.x, tip.y, tip.z
        );
    }
}
