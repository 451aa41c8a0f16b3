//! Event records produced by the physics world.
//!
//! Submodules:
//! - [`collision`] – contact begin/end and sensor enter/exit records
pub mod collision;
