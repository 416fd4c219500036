//! Binary serialization of rigs and animation clips.
//!
//! All streams are little-endian with a 4-byte magic and an i32 version.
//! A rig travels either as one combined model stream or split into a
//! skeleton stream and a mesh stream; clips have their own stream.

mod loader;
mod saver;

pub use loader::{LoaderOptions, load_animation, load_combined, load_split};
pub use saver::{save_animation, save_combined, save_split};

/// Magic for a combined model stream (skeleton + mesh).
pub const MODEL_MAGIC: &[u8; 4] = b"CDF\0";
/// Magic for a skeleton-only stream.
pub const SKELETON_MAGIC: &[u8; 4] = b"CSF\0";
/// Magic for a mesh-only stream.
pub const MESH_MAGIC: &[u8; 4] = b"CMF\0";
/// Magic for an animation clip stream.
pub const ANIMATION_MAGIC: &[u8; 4] = b"CAF\0";

/// Version written by the saver.
pub const CURRENT_FILE_VERSION: i32 = 710;
/// Oldest version the loader accepts.
pub const EARLIEST_COMPATIBLE_FILE_VERSION: i32 = 700;
