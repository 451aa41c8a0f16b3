//! Physics configuration resource.
//!
//! Holds the simulation settings loaded from an INI configuration file.
//! Provides defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [physics]
//! pixels_per_meter = 100
//! gravity_x = 0
//! gravity_y = 980
//! fixed_timestep = 0.0166667
//! solver_iterations = 4
//! ; optional, every owed step runs when absent
//! max_steps_per_update = 8
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use glam::Vec2;
use log::{info, warn};
use std::path::PathBuf;

use crate::resources::physicsworld::PhysicsSettings;

/// Default safe values for startup
const DEFAULT_PIXELS_PER_METER: f32 = 100.0;
const DEFAULT_GRAVITY_X: f32 = 0.0;
const DEFAULT_GRAVITY_Y: f32 = 980.0;
const DEFAULT_FIXED_TIMESTEP: f32 = 1.0 / 60.0;
const DEFAULT_SOLVER_ITERATIONS: u32 = 4;
const DEFAULT_CONFIG_PATH: &str = "./physics.ini";

/// Physics configuration resource.
///
/// All values are in the engine's pixel units. The
/// [`PhysicsWorld`](crate::resources::physicsworld::PhysicsWorld) converts
/// them to meters internally.
#[derive(Resource, Debug, Clone)]
pub struct PhysicsConfig {
    /// Scale between screen pixels and simulation meters.
    pub pixels_per_meter: f32,
    /// Gravity in pixels per second squared. Positive y points down.
    pub gravity: Vec2,
    /// Duration of one simulation step in seconds.
    pub fixed_timestep: f32,
    /// Constraint solver iterations per step.
    pub solver_iterations: u32,
    /// Upper bound on fixed steps per update. `None` runs every owed step.
    pub max_steps_per_update: Option<u32>,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            pixels_per_meter: DEFAULT_PIXELS_PER_METER,
            gravity: Vec2::new(DEFAULT_GRAVITY_X, DEFAULT_GRAVITY_Y),
            fixed_timestep: DEFAULT_FIXED_TIMESTEP,
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
            max_steps_per_update: None,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values. Values that are
    /// present but unusable (non-positive scale or timestep) are ignored with
    /// a warning. Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load physics config file: {}", e))?;

        if let Some(ppm) = config.getfloat("physics", "pixels_per_meter").ok().flatten() {
            if ppm > 0.0 {
                self.pixels_per_meter = ppm as f32;
            } else {
                warn!("Ignoring non-positive pixels_per_meter = {}", ppm);
            }
        }
        if let Some(gx) = config.getfloat("physics", "gravity_x").ok().flatten() {
            self.gravity.x = gx as f32;
        }
        if let Some(gy) = config.getfloat("physics", "gravity_y").ok().flatten() {
            self.gravity.y = gy as f32;
        }
        if let Some(step) = config.getfloat("physics", "fixed_timestep").ok().flatten() {
            if step > 0.0 {
                self.fixed_timestep = step as f32;
            } else {
                warn!("Ignoring non-positive fixed_timestep = {}", step);
            }
        }
        if let Some(iterations) = config.getuint("physics", "solver_iterations").ok().flatten() {
            self.solver_iterations = u32::try_from(iterations).unwrap_or(u32::MAX).max(1);
        }
        if let Some(max_steps) = config
            .getuint("physics", "max_steps_per_update")
            .ok()
            .flatten()
        {
            // 0 means no cap
            self.max_steps_per_update = match max_steps {
                0 => None,
                n => Some(u32::try_from(n).unwrap_or(u32::MAX)),
            };
        }

        info!(
            "Loaded physics config: {} px/m, gravity=({}, {}), step={}s, iterations={}",
            self.pixels_per_meter,
            self.gravity.x,
            self.gravity.y,
            self.fixed_timestep,
            self.solver_iterations
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set(
            "physics",
            "pixels_per_meter",
            Some(self.pixels_per_meter.to_string()),
        );
        config.set("physics", "gravity_x", Some(self.gravity.x.to_string()));
        config.set("physics", "gravity_y", Some(self.gravity.y.to_string()));
        config.set(
            "physics",
            "fixed_timestep",
            Some(self.fixed_timestep.to_string()),
        );
        config.set(
            "physics",
            "solver_iterations",
            Some(self.solver_iterations.to_string()),
        );
        if let Some(max_steps) = self.max_steps_per_update {
            config.set(
                "physics",
                "max_steps_per_update",
                Some(max_steps.to_string()),
            );
        }

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save physics config file: {}", e))?;

        info!("Saved physics config to {:?}", self.config_path);

        Ok(())
    }

    /// The value type the physics world is built from.
    pub fn settings(&self) -> PhysicsSettings {
        PhysicsSettings {
            pixels_per_meter: self.pixels_per_meter,
            gravity: self.gravity,
            fixed_timestep: self.fixed_timestep,
            solver_iterations: self.solver_iterations,
            max_steps_per_update: self.max_steps_per_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("aberred_physics_{}_{}.ini", name, std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let config = PhysicsConfig::new();
        assert_eq!(config.pixels_per_meter, 100.0);
        assert_eq!(config.gravity, Vec2::new(0.0, 980.0));
        assert!((config.fixed_timestep - 1.0 / 60.0).abs() < 1e-7);
        assert_eq!(config.solver_iterations, 4);
        assert_eq!(config.max_steps_per_update, None);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let path = temp_path("partial");
        fs::write(&path, "[physics]\npixels_per_meter = 32\ngravity_y = 500\n").unwrap();

        let mut config = PhysicsConfig::with_path(&path);
        config.load_from_file().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.pixels_per_meter, 32.0);
        assert_eq!(config.gravity, Vec2::new(0.0, 500.0));
        assert!((config.fixed_timestep - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn test_load_rejects_non_positive_values() {
        let path = temp_path("invalid");
        fs::write(&path, "[physics]\npixels_per_meter = 0\nfixed_timestep = -1\n").unwrap();

        let mut config = PhysicsConfig::with_path(&path);
        config.load_from_file().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.pixels_per_meter, 100.0);
        assert!(config.fixed_timestep > 0.0);
    }

    #[test]
    fn test_load_clamps_solver_iterations() {
        let path = temp_path("iterations_huge");
        fs::write(&path, "[physics]\nsolver_iterations = 5000000000\n").unwrap();
        let mut config = PhysicsConfig::with_path(&path);
        config.load_from_file().unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(config.solver_iterations, u32::MAX);

        let path = temp_path("iterations_zero");
        fs::write(&path, "[physics]\nsolver_iterations = 0\n").unwrap();
        let mut config = PhysicsConfig::with_path(&path);
        config.load_from_file().unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(config.solver_iterations, 1);
    }

    #[test]
    fn test_load_step_cap() {
        let path = temp_path("step_cap");
        fs::write(&path, "[physics]\nmax_steps_per_update = 0\n").unwrap();
        let mut config = PhysicsConfig::with_path(&path);
        config.max_steps_per_update = Some(3);
        config.load_from_file().unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(config.max_steps_per_update, None);
        assert_eq!(config.settings().max_steps_per_update, None);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let mut config = PhysicsConfig::with_path(temp_path("does_not_exist"));
        assert!(config.load_from_file().is_err());
        assert_eq!(config.pixels_per_meter, 100.0);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let mut original = PhysicsConfig::with_path(&path);
        original.pixels_per_meter = 50.0;
        original.gravity = Vec2::new(1.0, -9.0);
        original.fixed_timestep = 0.02;
        original.solver_iterations = 8;
        original.max_steps_per_update = Some(12);
        original.save_to_file().unwrap();

        let mut loaded = PhysicsConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.pixels_per_meter, 50.0);
        assert_eq!(loaded.gravity, Vec2::new(1.0, -9.0));
        assert!((loaded.fixed_timestep - 0.02).abs() < 1e-6);
        assert_eq!(loaded.solver_iterations, 8);
        assert_eq!(loaded.max_steps_per_update, Some(12));
    }
}
