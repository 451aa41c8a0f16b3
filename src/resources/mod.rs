//! ECS resources made available to systems.
//!
//! Overview
//! - `physicsconfig` – simulation settings loaded from an INI file
//! - `physicsworld` – the rigid-body simulation and its entity registry
//! - `worldtime` – simulation time and delta
pub mod physicsconfig;
pub mod physicsworld;
pub mod worldtime;
