//! Integration tests for the rig3d animation engine.

mod cloth;
mod pipeline;
mod roundtrip;
