//! Engine systems.
//!
//! Submodules overview
//! - [`physics`] – body lifecycle, transform/velocity sync and stepping
//! - [`time`] – update simulation time and delta
//! - [`touching`] – turn contact events into [`Touching`](crate::components::touching::Touching) sets

pub mod physics;
pub mod time;
pub mod touching;
