//! Aberred Physics demo entry point.
//!
//! Headless run of the physics chain: a static floor, a sensor strip halfway
//! down and a row of bouncing balls. Contacts and sensor crossings are logged
//! as they happen, and final positions are printed at the end.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --seconds 3 --balls 5
//! RUST_LOG=debug cargo run -- --config physics.ini
//! ```

use bevy_ecs::prelude::*;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

use aberred_physics::components::collider::{ColliderConfig, Shape};
use aberred_physics::components::mapposition::MapPosition;
use aberred_physics::components::rigidbody::RigidBodyConfig;
use aberred_physics::components::touching::Touching;
use aberred_physics::components::velocity::Velocity;
use aberred_physics::events::collision::ContactEvent;
use aberred_physics::resources::physicsconfig::PhysicsConfig;
use aberred_physics::resources::physicsworld::PhysicsWorld;
use aberred_physics::resources::worldtime::WorldTime;
use aberred_physics::systems::physics::add_physics_systems;
use aberred_physics::systems::time::update_world_time;

const FLOOR_Y: f32 = 600.0;
const SENSOR_Y: f32 = 300.0;
const BALL_RADIUS: f32 = 12.0;

/// Aberred Physics headless demo
#[derive(Parser)]
#[command(version, about = "Drop some balls on a floor and log what touches what.")]
struct Cli {
    /// INI file with a [physics] section. Defaults are used when missing.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Simulated time to run, in seconds.
    #[arg(long, default_value_t = 3.0)]
    seconds: f32,

    /// Frames per second driving the simulation. Need not match the fixed step.
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Number of balls to drop.
    #[arg(long, default_value_t = 5)]
    balls: u32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PhysicsConfig::with_path(path),
        None => PhysicsConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        warn!("{}, using defaults", e);
    }

    if !(cli.fps > 0.0) {
        warn!("--fps must be positive, got {}", cli.fps);
        std::process::exit(1);
    }
    let dt = 1.0 / cli.fps;
    let frames = (cli.seconds.max(0.0) * cli.fps).round() as u64;

    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(PhysicsWorld::from_config(&config));
    world.insert_resource(config);

    spawn_scene(&mut world, cli.balls);

    let mut schedule = Schedule::default();
    add_physics_systems::<MapPosition>(&mut schedule);

    info!("Running {} frames at {} fps", frames, cli.fps);
    for _ in 0..frames {
        update_world_time(&mut world, dt);
        schedule.run(&mut world);
        log_events(&world);
    }

    let physics = world.resource::<PhysicsWorld>();
    info!(
        "Done: {} fixed steps, {} bodies, alpha {:.2}",
        physics.step_count(),
        physics.body_count(),
        physics.interpolation_alpha()
    );
    let mut query = world.query_filtered::<(Entity, &MapPosition, Option<&Touching>), With<Velocity>>();
    for (entity, pos, touching) in query.iter(&world) {
        info!(
            "{:?} at ({:.1}, {:.1}) touching {}",
            entity,
            pos.x,
            pos.y,
            touching.map_or(0, |t| t.len())
        );
    }
}

fn spawn_scene(world: &mut World, balls: u32) {
    world.spawn((
        MapPosition::new(400.0, FLOOR_Y),
        RigidBodyConfig::fixed(),
        ColliderConfig::single(Shape::box_shape(800.0, 20.0)).with_friction(0.6),
    ));
    world.spawn((
        MapPosition::new(400.0, SENSOR_Y),
        RigidBodyConfig::fixed(),
        ColliderConfig::single(Shape::box_shape(800.0, 10.0)).with_sensor(true),
    ));

    for i in 0..balls {
        let x = 100.0 + i as f32 * (600.0 / balls.max(1) as f32);
        world.spawn((
            MapPosition::new(x, 50.0 + i as f32 * 15.0),
            RigidBodyConfig::dynamic(),
            ColliderConfig::single(Shape::circle(BALL_RADIUS))
                .with_restitution(0.6)
                .with_restitution_threshold(40.0),
            Velocity::default(),
        ));
    }
}

fn log_events(world: &World) {
    let physics = world.resource::<PhysicsWorld>();
    for event in physics.contact_events() {
        match event {
            ContactEvent::CollisionBegin(e) => info!(
                "Contact {:?} <-> {:?} at ({:.1}, {:.1}), impulse {:.3}",
                e.a, e.b, e.point.x, e.point.y, e.impulse
            ),
            ContactEvent::CollisionEnd(e) => info!("Separated {:?} <-> {:?}", e.a, e.b),
            ContactEvent::SensorEnter(e) => info!("{:?} entered sensor {:?}", e.visitor, e.sensor),
            ContactEvent::SensorExit(e) => info!("{:?} left sensor {:?}", e.visitor, e.sensor),
        }
    }
}
