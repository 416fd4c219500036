//! Keyframe animation data and sampling.

mod clip;
mod keyframe;
mod track;

pub use clip::AnimationClip;
pub use keyframe::Keyframe;
pub use track::{Track, UNRESOLVED_HINT};
