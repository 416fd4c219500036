//! Linear-blend vertex skinning.
//!
//! One routine drives every output combination: callers pass the slices
//! they want filled (positions, normals, one tangent channel) and leave
//! the rest `None`. Vertices with a single influence take a fast path
//! with no renormalization; multi-influence vertices blend weighted bone
//! matrices and renormalize the transformed directions; zero-influence
//! vertices pass their bind-pose data through untouched.

use glam::{Mat3, Vec3};

use crate::error::{Result, RigError};
use crate::rig::Submesh;

/// Inverse of the signed-byte quantization scale.
const DESCALE: f32 = 1.0 / 127.0;

/// A skinned tangent with its handedness factor carried through.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinnedTangent {
    pub tangent: Vec3,
    pub cross_factor: f32,
}

pub(crate) fn descale(quantized: [i8; 3]) -> Vec3 {
    Vec3::new(
        f32::from(quantized[0]),
        f32::from(quantized[1]),
        f32::from(quantized[2]),
    ) * DESCALE
}

/// Skin the first `vertex_count` vertices of `submesh` into the given
/// output slices.
///
/// `matrices` and `translations` form the per-bone skinning palette.
/// Vertices owned by the spring solver (submesh has springs and the
/// vertex's physical weight is positive) are left untouched in every
/// output. Returns the number of vertices processed.
///
/// # Errors
///
/// [`RigError::InvalidTangentChannel`] when tangents are requested on a
/// channel without tangent data, [`RigError::OutOfRange`] for short
/// output slices or influence bone ids outside the palette.
pub fn skin_vertices(
    submesh: &Submesh,
    matrices: &[Mat3],
    translations: &[Vec3],
    vertex_count: usize,
    mut positions: Option<&mut [Vec3]>,
    mut normals: Option<&mut [Vec3]>,
    mut tangents: Option<(usize, &mut [SkinnedTangent])>,
) -> Result<usize> {
    if vertex_count > submesh.vertex_count() {
        return Err(RigError::OutOfRange {
            what: "vertex",
            index: vertex_count,
            count: submesh.vertex_count(),
        });
    }
    for length in [
        positions.as_deref().map(<[Vec3]>::len),
        normals.as_deref().map(<[Vec3]>::len),
        tangents.as_ref().map(|(_, out)| out.len()),
    ]
    .into_iter()
    .flatten()
    {
        if length < vertex_count {
            return Err(RigError::OutOfRange {
                what: "output buffer",
                index: vertex_count,
                count: length,
            });
        }
    }

    let tangent_source = match &tangents {
        Some((channel, _)) => Some(submesh.tangent_spaces(*channel)?),
        None => None,
    };

    let bone_count = matrices.len().min(translations.len());
    let vertices = submesh.vertices();
    let influences = submesh.influences();
    let physical = submesh.physical_properties();
    let has_springs = submesh.has_springs();

    let mut cursor = 0usize;
    for vertex_id in 0..vertex_count {
        let vertex = &vertices[vertex_id];
        let first = cursor;
        // The cursor advances for every vertex, including skipped ones,
        // so later vertices keep reading their own influences.
        cursor += vertex.influence_count as usize;

        if has_springs && physical[vertex_id].weight > 0.0 {
            continue;
        }

        let vertex_influences = influences.get(first..cursor).ok_or(RigError::OutOfRange {
            what: "influence",
            index: cursor,
            count: influences.len(),
        })?;

        let bind_normal = descale(vertex.normal);
        let bind_tangent = tangent_source.map(|source| {
            let space = &source[vertex_id];
            (descale(space.tangent), f32::from(space.cross_factor))
        });

        let (position, normal, tangent) = match vertex_influences {
            [] => (
                vertex.position,
                bind_normal,
                bind_tangent.map(|(tangent, _)| tangent),
            ),
            [single] => {
                if single.bone_id >= bone_count {
                    return Err(RigError::OutOfRange {
                        what: "bone",
                        index: single.bone_id,
                        count: bone_count,
                    });
                }
                let matrix = matrices[single.bone_id];
                (
                    matrix * vertex.position + translations[single.bone_id],
                    matrix * bind_normal,
                    bind_tangent.map(|(tangent, _)| matrix * tangent),
                )
            }
            blended => {
                let mut matrix = Mat3::ZERO;
                let mut translation = Vec3::ZERO;
                for influence in blended {
                    if influence.bone_id >= bone_count {
                        return Err(RigError::OutOfRange {
                            what: "bone",
                            index: influence.bone_id,
                            count: bone_count,
                        });
                    }
                    matrix += matrices[influence.bone_id] * influence.weight;
                    translation += translations[influence.bone_id] * influence.weight;
                }
                (
                    matrix * vertex.position + translation,
                    (matrix * bind_normal).normalize_or_zero(),
                    bind_tangent.map(|(tangent, _)| (matrix * tangent).normalize_or_zero()),
                )
            }
        };

        if let Some(out) = positions.as_deref_mut() {
            out[vertex_id] = position;
        }
        if let Some(out) = normals.as_deref_mut() {
            out[vertex_id] = normal;
        }
        if let (Some((_, out)), Some(tangent), Some((_, cross_factor))) =
            (tangents.as_mut(), tangent, bind_tangent)
        {
            out[vertex_id] = SkinnedTangent {
                tangent,
                cross_factor,
            };
        }
    }

    Ok(vertex_count)
}
