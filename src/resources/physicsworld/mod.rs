//! Rigid-body simulation resource.
//!
//! [`PhysicsWorld`] owns the rapier2d simulation and every piece of state
//! needed to keep it in step with the ECS world:
//!
//! - the entity ↔ body registry and per-entity fixture lists
//! - the collision/sensor event buffers of the last [`update`](PhysicsWorld::update)
//! - the fixed-timestep accumulator
//! - the pixels-per-meter scale
//!
//! The public API speaks in pixels (positions, sizes, velocities, forces,
//! gravity). Rapier works in meters; conversion happens at this boundary
//! using [`PhysicsSettings::pixels_per_meter`]. Angles are radians on both
//! sides.
//!
//! Bodies are normally created and destroyed by the systems in
//! [`crate::systems::physics`], but every operation is also usable directly.
//!
//! # Example
//! ```ignore
//! let mut physics = PhysicsWorld::new(PhysicsSettings::default());
//! physics.create_body(entity, &RigidBodyConfig::dynamic(), Vec2::ZERO, 0.0)?;
//! physics.add_collider(entity, &ColliderConfig::single(Shape::circle(10.0)))?;
//! physics.update(1.0 / 60.0);
//! let pos = physics.position(entity);
//! ```

mod convert;
mod error;
mod hooks;
mod registry;

use std::num::NonZeroUsize;

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, warn};
use rapier2d::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::components::collider::ColliderConfig;
use crate::components::rigidbody::{BodyType, RigidBodyConfig};
use crate::events::collision::{CollisionEvent, ContactEvent, SensorEvent};
use crate::resources::physicsconfig::PhysicsConfig;

use convert::{ConvertedShape, convert_shape, point_to_pixels, vec_to_meters, vec_to_pixels};
use hooks::{ColliderMaterial, EventCollector, MaterialHooks, RawContactEvent, contact_summary};
use registry::BodyRegistry;

pub use convert::{to_meters, to_pixels};
pub use error::PhysicsError;
pub use registry::{MAX_FIXTURES, entity_key};

/// Accumulator slack so that frame deltas built from the same float as the
/// timestep (e.g. 2 × 1/60) are not short by one ulp.
const STEP_TOLERANCE: f32 = 1e-5;

/// Plain simulation settings, in pixel units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsSettings {
    pub pixels_per_meter: f32,
    /// Pixels per second squared.
    pub gravity: Vec2,
    /// Seconds per fixed step.
    pub fixed_timestep: f32,
    pub solver_iterations: u32,
    /// Optional cap on fixed steps per `update`. `None` runs every whole step
    /// the accumulator holds; with a cap, older backlog is dropped.
    pub max_steps_per_update: Option<u32>,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            pixels_per_meter: 100.0,
            gravity: Vec2::new(0.0, 980.0),
            fixed_timestep: 1.0 / 60.0,
            solver_iterations: 4,
            max_steps_per_update: None,
        }
    }
}

impl PhysicsSettings {
    /// Replace unusable values with defaults, logging each replacement.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.pixels_per_meter.is_finite() && self.pixels_per_meter > 0.0) {
            warn!(
                "Invalid pixels_per_meter {}, using {}",
                self.pixels_per_meter, defaults.pixels_per_meter
            );
            self.pixels_per_meter = defaults.pixels_per_meter;
        }
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            warn!(
                "Invalid fixed_timestep {}, using {}",
                self.fixed_timestep, defaults.fixed_timestep
            );
            self.fixed_timestep = defaults.fixed_timestep;
        }
        if self.max_steps_per_update == Some(0) {
            warn!("max_steps_per_update of 0 would never step, running unbounded");
            self.max_steps_per_update = None;
        }
        if !self.gravity.is_finite() {
            warn!("Invalid gravity {:?}, using {:?}", self.gravity, defaults.gravity);
            self.gravity = defaults.gravity;
        }
        self
    }
}

/// The simulation and its ECS bookkeeping.
#[derive(Resource)]
pub struct PhysicsWorld {
    settings: PhysicsSettings,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: EventCollector,

    registry: BodyRegistry,
    materials: FxHashMap<ColliderHandle, ColliderMaterial>,
    /// Colliders of destroyed bodies, resolvable until the next step reports
    /// their removal.
    retired: FxHashMap<ColliderHandle, Entity>,
    /// Bodies with a pending one-step force.
    forced: FxHashSet<RigidBodyHandle>,

    accumulator: f32,
    steps: u64,

    collision_begin: Vec<CollisionEvent>,
    collision_end: Vec<CollisionEvent>,
    sensor_enter: Vec<SensorEvent>,
    sensor_exit: Vec<SensorEvent>,
    /// All of the above, in the order they happened.
    contact_log: Vec<ContactEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsSettings::default())
    }
}

impl PhysicsWorld {
    pub fn new(settings: PhysicsSettings) -> Self {
        let settings = settings.sanitized();
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = settings.fixed_timestep;
        integration_parameters.num_solver_iterations =
            NonZeroUsize::new(settings.solver_iterations as usize).unwrap_or(NonZeroUsize::MIN);

        Self {
            gravity: vec_to_meters(settings.gravity, settings.pixels_per_meter),
            settings,
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: EventCollector::default(),
            registry: BodyRegistry::default(),
            materials: FxHashMap::default(),
            retired: FxHashMap::default(),
            forced: FxHashSet::default(),
            accumulator: 0.0,
            steps: 0,
            collision_begin: Vec::new(),
            collision_end: Vec::new(),
            sensor_enter: Vec::new(),
            sensor_exit: Vec::new(),
            contact_log: Vec::new(),
        }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.settings())
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    pub fn pixels_per_meter(&self) -> f32 {
        self.settings.pixels_per_meter
    }

    pub fn fixed_timestep(&self) -> f32 {
        self.settings.fixed_timestep
    }

    /// Gravity in pixels per second squared.
    pub fn gravity(&self) -> Vec2 {
        vec_to_pixels(&self.gravity, self.pixels_per_meter())
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.settings.gravity = gravity;
        self.gravity = vec_to_meters(gravity, self.pixels_per_meter());
    }

    // ==================== BODY LIFECYCLE ====================

    /// Create the body of `entity` at `position` (pixels) and `angle` (radians).
    ///
    /// Idempotent: when the entity already has a body, its handle is returned
    /// and nothing else happens.
    pub fn create_body(
        &mut self,
        entity: Entity,
        config: &RigidBodyConfig,
        position: Vec2,
        angle: f32,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        if let Some(handle) = self.registry.body(entity) {
            return Ok(handle);
        }
        if !position.is_finite() || !angle.is_finite() {
            return Err(PhysicsError::InvalidBody(format!(
                "non-finite transform {:?} / {}",
                position, angle
            )));
        }
        if !(config.mass.is_finite() && config.mass >= 0.0) {
            return Err(PhysicsError::InvalidBody(format!(
                "mass must be non-negative, got {}",
                config.mass
            )));
        }

        let body_type = match config.body_type {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
            BodyType::Dynamic => RigidBodyType::Dynamic,
        };
        let mut builder = RigidBodyBuilder::new(body_type)
            .translation(vec_to_meters(position, self.pixels_per_meter()))
            .rotation(angle)
            .gravity_scale(config.gravity_scale)
            .linear_damping(config.linear_damping)
            .angular_damping(config.angular_damping)
            .ccd_enabled(config.continuous_collision)
            .can_sleep(config.allow_sleep)
            .sleeping(!config.awake)
            .user_data(entity_key(entity) as u128);
        if config.fixed_rotation {
            builder = builder.lock_rotations();
        }
        if config.mass > 0.0 {
            builder = builder.additional_mass(config.mass);
        }

        let handle = self.bodies.insert(builder);
        self.registry.insert(entity, handle);
        debug!(
            "Created {:?} body for {:?} at ({}, {})",
            config.body_type, entity, position.x, position.y
        );
        Ok(handle)
    }

    /// Attach every shape of `config` to the body of `entity`.
    ///
    /// All shapes are converted before any is attached, so on error the world
    /// is left untouched. Returns the number of fixtures created; shapes that
    /// would exceed [`MAX_FIXTURES`] for the entity are dropped with a warning.
    pub fn add_collider(
        &mut self,
        entity: Entity,
        config: &ColliderConfig,
    ) -> Result<usize, PhysicsError> {
        let body = self.registry.body(entity).ok_or(PhysicsError::NoBody(entity))?;
        let ppm = self.pixels_per_meter();
        let converted = config
            .shapes()
            .map(|entry| convert_shape(entry, ppm))
            .collect::<Result<Vec<ConvertedShape>, PhysicsError>>()?;

        let room = self.registry.fixture_room(entity);
        if converted.len() > room {
            warn!(
                "{:?} can hold {} more fixtures, dropping {} of {} shapes",
                entity,
                room,
                converted.len() - room,
                converted.len()
            );
        }

        let material = ColliderMaterial {
            filter: config.filter,
            restitution_threshold: to_meters(config.restitution_threshold, ppm),
        };
        let mut attached = 0;
        for ConvertedShape { shape, position } in converted.into_iter().take(room) {
            let collider = ColliderBuilder::new(shape)
                .position(position)
                .density(config.density)
                .friction(config.friction)
                .restitution(config.restitution)
                .sensor(config.is_sensor)
                .collision_groups(material.interaction_groups())
                .active_events(ActiveEvents::COLLISION_EVENTS)
                .active_hooks(material.active_hooks(config.restitution))
                .user_data(entity_key(entity) as u128)
                .build();
            let handle = self
                .colliders
                .insert_with_parent(collider, body, &mut self.bodies);
            self.registry.push_fixture(entity, handle);
            self.materials.insert(handle, material);
            attached += 1;
        }
        Ok(attached)
    }

    /// Remove the body of `entity` and all its fixtures. Returns false when
    /// the entity had no body.
    pub fn destroy_body(&mut self, entity: Entity) -> bool {
        let Some((body, fixtures)) = self.registry.remove(entity) else {
            return false;
        };
        for collider in &fixtures {
            self.materials.remove(collider);
            self.retired.insert(*collider, entity);
        }
        self.forced.remove(&body);
        self.bodies.remove(
            body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        debug!("Destroyed body of {:?}", entity);
        true
    }

    // ==================== STEPPING ====================

    /// Advance the simulation by `dt` seconds of frame time.
    ///
    /// Clears the event buffers, then runs as many fixed steps as the
    /// accumulated time allows (possibly none). Events of every step run by
    /// this call are collected together.
    pub fn update(&mut self, dt: f32) {
        self.collision_begin.clear();
        self.collision_end.clear();
        self.sensor_enter.clear();
        self.sensor_exit.clear();
        self.contact_log.clear();

        if !dt.is_finite() || dt < 0.0 {
            warn!("PhysicsWorld::update called with invalid dt {}, ignoring", dt);
            return;
        }

        let step = self.settings.fixed_timestep;
        self.accumulator += dt;
        if let Some(max_steps) = self.settings.max_steps_per_update {
            let max_backlog = step * max_steps as f32;
            if self.accumulator > max_backlog {
                warn!(
                    "Physics fell {:.3}s behind, dropping time beyond {} steps",
                    self.accumulator, max_steps
                );
                self.accumulator = max_backlog;
            }
        }
        while self.accumulator + step * STEP_TOLERANCE >= step {
            self.step_once();
            self.accumulator = (self.accumulator - step).max(0.0);
        }
    }

    /// Fraction of a fixed step left in the accumulator, for render
    /// interpolation between the last two simulated states.
    pub fn interpolation_alpha(&self) -> f32 {
        self.accumulator / self.settings.fixed_timestep
    }

    /// Total fixed steps run since creation.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    fn step_once(&mut self) {
        let hooks = MaterialHooks::new(&self.materials);
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &hooks,
            &self.collector,
        );
        self.steps += 1;

        for handle in self.forced.drain() {
            if let Some(rb) = self.bodies.get_mut(handle) {
                rb.reset_forces(false);
            }
        }

        for mut raw in self.collector.drain() {
            // Begin events are emitted before the solver runs; read the solved
            // contact back for its impulse and final point.
            if raw.started && !raw.sensor {
                let solved = self
                    .narrow_phase
                    .contact_pair(raw.collider1, raw.collider2)
                    .and_then(|pair| contact_summary(&self.colliders, pair));
                if let Some((point, normal, impulse)) = solved {
                    raw.point = point;
                    raw.normal = normal;
                    raw.impulse = impulse;
                }
            }
            self.record_event(raw);
        }
        self.retired.clear();
    }

    fn resolve(&self, collider: ColliderHandle) -> Option<Entity> {
        self.registry
            .collider_entity(collider)
            .or_else(|| self.retired.get(&collider).copied())
    }

    fn record_event(&mut self, raw: RawContactEvent) {
        let (Some(e1), Some(e2)) = (self.resolve(raw.collider1), self.resolve(raw.collider2)) else {
            return;
        };
        if raw.sensor {
            let (sensor, visitor) = if raw.collider1_is_sensor {
                (e1, e2)
            } else {
                (e2, e1)
            };
            let event = SensorEvent { sensor, visitor };
            if raw.started {
                self.sensor_enter.push(event);
                self.contact_log.push(ContactEvent::SensorEnter(event));
            } else {
                self.sensor_exit.push(event);
                self.contact_log.push(ContactEvent::SensorExit(event));
            }
        } else {
            let event = CollisionEvent {
                a: e1,
                b: e2,
                point: point_to_pixels(&raw.point, self.pixels_per_meter()),
                normal: Vec2::new(raw.normal.x, raw.normal.y),
                impulse: raw.impulse,
            };
            if raw.started {
                self.collision_begin.push(event);
                self.contact_log.push(ContactEvent::CollisionBegin(event));
            } else {
                self.collision_end.push(event);
                self.contact_log.push(ContactEvent::CollisionEnd(event));
            }
        }
    }

    // ==================== EVENTS ====================

    pub fn collision_begin_events(&self) -> &[CollisionEvent] {
        &self.collision_begin
    }

    pub fn collision_end_events(&self) -> &[CollisionEvent] {
        &self.collision_end
    }

    /// Every event of the last update in the order the steps produced them.
    pub fn contact_events(&self) -> &[ContactEvent] {
        &self.contact_log
    }

    pub fn sensor_enter_events(&self) -> &[SensorEvent] {
        &self.sensor_enter
    }

    pub fn sensor_exit_events(&self) -> &[SensorEvent] {
        &self.sensor_exit
    }

    // ==================== REGISTRY QUERIES ====================

    pub fn has_body(&self, entity: Entity) -> bool {
        self.registry.body(entity).is_some()
    }

    pub fn body_handle(&self, entity: Entity) -> Option<RigidBodyHandle> {
        self.registry.body(entity)
    }

    pub fn entity_of(&self, body: RigidBodyHandle) -> Option<Entity> {
        self.registry.entity(body)
    }

    pub fn fixtures(&self, entity: Entity) -> Option<&[ColliderHandle]> {
        self.registry.fixtures(entity).map(|list| list.as_slice())
    }

    pub fn body_count(&self) -> usize {
        self.registry.len()
    }

    /// Colliders alive in the simulation, across all bodies.
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Entities that currently own a body. No particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.registry.entities()
    }

    /// Entities with a body of the given type.
    pub fn entities_of_type(&self, body_type: BodyType) -> Vec<Entity> {
        self.registry
            .bodies()
            .filter(|(_, handle)| {
                self.bodies
                    .get(*handle)
                    .is_some_and(|rb| map_body_type(rb.body_type()) == body_type)
            })
            .map(|(entity, _)| entity)
            .collect()
    }

    // ==================== PER-BODY STATE ====================

    fn body(&self, entity: Entity) -> Option<&RigidBody> {
        self.registry.body(entity).and_then(|h| self.bodies.get(h))
    }

    fn body_mut(&mut self, entity: Entity) -> Option<&mut RigidBody> {
        let handle = self.registry.body(entity)?;
        self.bodies.get_mut(handle)
    }

    pub fn body_type(&self, entity: Entity) -> Option<BodyType> {
        self.body(entity).map(|rb| map_body_type(rb.body_type()))
    }

    /// Position in pixels.
    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        let ppm = self.pixels_per_meter();
        self.body(entity)
            .map(|rb| vec_to_pixels(rb.translation(), ppm))
    }

    /// Rotation in radians.
    pub fn angle(&self, entity: Entity) -> Option<f32> {
        self.body(entity).map(|rb| rb.rotation().angle())
    }

    /// Linear velocity in pixels per second.
    pub fn linear_velocity(&self, entity: Entity) -> Option<Vec2> {
        let ppm = self.pixels_per_meter();
        self.body(entity).map(|rb| vec_to_pixels(rb.linvel(), ppm))
    }

    /// Angular velocity in radians per second.
    pub fn angular_velocity(&self, entity: Entity) -> Option<f32> {
        self.body(entity).map(|rb| rb.angvel())
    }

    /// Whether the body is currently asleep.
    pub fn is_sleeping(&self, entity: Entity) -> Option<bool> {
        self.body(entity).map(|rb| rb.is_sleeping())
    }

    /// Move the body. Kinematic bodies reach the pose over the next step so
    /// that contacts see a velocity; other bodies are teleported.
    pub fn set_transform(&mut self, entity: Entity, position: Vec2, angle: f32) {
        let iso = Isometry::new(vec_to_meters(position, self.pixels_per_meter()), angle);
        if let Some(rb) = self.body_mut(entity) {
            if rb.is_kinematic() {
                rb.set_next_kinematic_position(iso);
            } else {
                rb.set_position(iso, true);
            }
        }
    }

    pub fn set_linear_velocity(&mut self, entity: Entity, velocity: Vec2) {
        let v = vec_to_meters(velocity, self.pixels_per_meter());
        if let Some(rb) = self.body_mut(entity) {
            rb.set_linvel(v, true);
        }
    }

    pub fn set_angular_velocity(&mut self, entity: Entity, velocity: f32) {
        if let Some(rb) = self.body_mut(entity) {
            rb.set_angvel(velocity, true);
        }
    }

    /// Instant change of momentum, in kilogram-pixels per second.
    pub fn apply_linear_impulse(&mut self, entity: Entity, impulse: Vec2) {
        let j = vec_to_meters(impulse, self.pixels_per_meter());
        if let Some(rb) = self.body_mut(entity) {
            rb.apply_impulse(j, true);
        }
    }

    /// Force in kilogram-pixels per second squared, applied at the center of
    /// mass during the next fixed step only.
    pub fn apply_force(&mut self, entity: Entity, force: Vec2) {
        let f = vec_to_meters(force, self.pixels_per_meter());
        let Some(handle) = self.registry.body(entity) else {
            return;
        };
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.add_force(f, true);
            self.forced.insert(handle);
        }
    }

    /// Total mass in kilograms (density-derived plus extra mass).
    pub fn mass(&self, entity: Entity) -> Option<f32> {
        self.body(entity).map(|rb| rb.mass())
    }

    /// Pixel length to meters, with this world's scale.
    pub fn to_meters(&self, pixels: f32) -> f32 {
        to_meters(pixels, self.pixels_per_meter())
    }

    /// Meter length to pixels, with this world's scale.
    pub fn to_pixels(&self, meters: f32) -> f32 {
        to_pixels(meters, self.pixels_per_meter())
    }

    #[cfg(test)]
    pub(crate) fn registry_is_consistent(&self, entity: Entity) -> bool {
        self.registry.is_consistent(entity)
    }
}

fn map_body_type(body_type: RigidBodyType) -> BodyType {
    match body_type {
        RigidBodyType::Fixed => BodyType::Static,
        RigidBodyType::Dynamic => BodyType::Dynamic,
        RigidBodyType::KinematicPositionBased | RigidBodyType::KinematicVelocityBased => {
            BodyType::Kinematic
        }
    }
}
