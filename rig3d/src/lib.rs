//! Runtime skeletal animation engine.
//!
//! The data model splits into a shared, immutable [`Rig`] (bone hierarchy
//! plus bind geometry) and per-instance [`Model`]s that blend animation
//! clips into poses, derive skinning palettes, skin vertices on the CPU,
//! simulate cloth springs and apply LOD vertex collapse.
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec3;
//! use rig3d::{Model, Rig};
//!
//! let mut rig = Rig::new();
//! let root = rig.add_bone("root", None).unwrap();
//! let arm = rig.add_bone("arm", Some(root)).unwrap();
//! rig.bone_mut(arm).unwrap().set_translation(Vec3::new(0.0, 2.0, 0.0));
//! rig.calculate_bind_pose();
//!
//! let mut model = Model::new(Arc::new(rig));
//! model.clear_state();
//! model.calculate_state();
//! assert_eq!(model.bone(arm).unwrap().translation_absolute(), Vec3::new(0.0, 2.0, 0.0));
//! ```

pub mod animation;
pub mod error;
pub mod io;
pub mod math;
pub mod model;
pub mod rig;
pub mod skinning;
pub mod springs;

// Re-export common types
pub use animation::{AnimationClip, Keyframe, Track};
pub use error::{Result, RigError};
pub use model::{BonePose, Model, SubmeshBuffers};
pub use rig::{Bone, Rig, Submesh};
pub use skinning::{SkinnedTangent, skin_vertices};
pub use springs::SpringConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
