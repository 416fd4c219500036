//! Mass-spring cloth solver: force accumulation, Verlet integration and
//! position-based length-constraint relaxation.
//!
//! Vertices with a positive physical weight are simulated; vertices with
//! zero or negative weight are anchors that follow the skinned surface.
//! Spring coefficients and idle lengths come from the rig; the solver
//! corrects lengths positionally, so the coefficient is carried as data
//! but does not enter the relaxation step.

use glam::Vec3;

use crate::error::{Result, RigError};
use crate::rig::{PhysicalProperty, Spring};

/// Tunable solver constants.
#[derive(Debug, Clone, Copy)]
pub struct SpringConfig {
    /// Constant force applied to every simulated vertex.
    pub base_force: Vec3,
    /// Gravity along -Z, scaled per vertex by its physical weight.
    pub gravity: f32,
    /// Velocity damping applied each Verlet step.
    pub damping: f32,
    /// Length-constraint relaxation passes per update.
    pub iterations: usize,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            base_force: Vec3::new(0.0, 0.5, 0.0),
            gravity: -98.1,
            damping: 0.99,
            iterations: 2,
        }
    }
}

/// Per-vertex simulation state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicalState {
    pub position: Vec3,
    pub old_position: Vec3,
    pub force: Vec3,
}

/// Reset every simulated vertex's force to the configured base force plus
/// weight-scaled gravity. Anchored vertices keep zero force.
pub fn accumulate_forces(
    states: &mut [PhysicalState],
    properties: &[PhysicalProperty],
    config: &SpringConfig,
) {
    for (state, property) in states.iter_mut().zip(properties) {
        if property.weight > 0.0 {
            state.force = config.base_force + Vec3::new(0.0, 0.0, property.weight * config.gravity);
        }
    }
}

/// Advance every vertex one Verlet step of `delta_time` seconds.
///
/// Simulated vertices integrate; anchored vertices snap to their skinned
/// position in `skinned`. Forces are consumed and cleared.
pub fn integrate_vertices(
    states: &mut [PhysicalState],
    skinned: &[Vec3],
    properties: &[PhysicalProperty],
    config: &SpringConfig,
    delta_time: f32,
) {
    for ((state, property), skinned_position) in states.iter_mut().zip(properties).zip(skinned) {
        if property.weight > 0.0 {
            let position = state.position
                + (state.position - state.old_position) * config.damping
                + state.force / property.weight * (delta_time * delta_time);
            state.old_position = state.position;
            state.position = position;
        } else {
            state.position = *skinned_position;
            state.old_position = state.position;
        }
        state.force = Vec3::ZERO;
    }
}

/// Run `iterations` passes of length-constraint relaxation over all
/// springs.
///
/// A stretched or compressed spring moves its two endpoints towards the
/// idle length: both halves when both ends are simulated, the full
/// correction onto the free end when the other is anchored.
pub fn relax_constraints(
    states: &mut [PhysicalState],
    springs: &[Spring],
    properties: &[PhysicalProperty],
    iterations: usize,
) -> Result<()> {
    let count = states.len().min(properties.len());
    for _ in 0..iterations {
        for spring in springs {
            let [id0, id1] = spring.vertex_ids;
            if id0 >= count || id1 >= count {
                return Err(RigError::OutOfRange {
                    what: "spring vertex",
                    index: id0.max(id1),
                    count,
                });
            }

            let distance = states[id1].position - states[id0].position;
            let length = distance.length();
            if length == 0.0 {
                continue;
            }

            let mut factor0 = (length - spring.idle_length) / length;
            let mut factor1 = factor0;

            if properties[id0].weight > 0.0 {
                factor0 /= 2.0;
                factor1 /= 2.0;
            } else {
                factor0 = 0.0;
            }
            if properties[id1].weight <= 0.0 {
                factor0 *= 2.0;
                factor1 = 0.0;
            }

            states[id0].position += distance * factor0;
            states[id1].position -= distance * factor1;
        }
    }
    Ok(())
}
