//! Physics chain integration tests: body lifecycle, transform and velocity
//! sync, contact sets and sensors, driven through a real `Schedule`.

use bevy_ecs::prelude::*;
use glam::Vec2;

use aberred_physics::components::collider::{ColliderConfig, Shape};
use aberred_physics::components::mapposition::{MapPosition, PositionLike};
use aberred_physics::components::rigidbody::{BodyType, RigidBodyConfig};
use aberred_physics::components::touching::Touching;
use aberred_physics::components::velocity::Velocity;
use aberred_physics::resources::physicsworld::{PhysicsSettings, PhysicsWorld};
use aberred_physics::resources::worldtime::WorldTime;
use aberred_physics::systems::physics::add_physics_systems;
use aberred_physics::systems::time::update_world_time;

const DT: f32 = 1.0 / 60.0;
const EPSILON: f32 = 1e-2;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn make_world(gravity: Vec2) -> World {
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(PhysicsWorld::new(PhysicsSettings {
        gravity,
        ..PhysicsSettings::default()
    }));
    world
}

fn make_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    add_physics_systems::<MapPosition>(&mut schedule);
    schedule
}

fn tick(world: &mut World, schedule: &mut Schedule) {
    update_world_time(world, DT);
    schedule.run(world);
}

fn spawn_ball(world: &mut World, x: f32, y: f32, radius: f32) -> Entity {
    world
        .spawn((
            MapPosition::new(x, y),
            RigidBodyConfig::dynamic(),
            ColliderConfig::single(Shape::circle(radius)),
        ))
        .id()
}

fn spawn_ground(world: &mut World, y: f32) -> Entity {
    world
        .spawn((
            MapPosition::new(0.0, y),
            RigidBodyConfig::fixed(),
            ColliderConfig::single(Shape::box_shape(400.0, 20.0)),
        ))
        .id()
}

fn touching(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<Touching>(entity)
        .map(|t| t.iter().collect())
        .unwrap_or_default()
}

// ==================== LIFECYCLE ====================

#[test]
fn init_bodies_creates_once() {
    let mut world = make_world(Vec2::ZERO);
    let mut schedule = make_schedule();
    let ball = spawn_ball(&mut world, 0.0, 0.0, 10.0);

    tick(&mut world, &mut schedule);
    let handle = world.resource::<PhysicsWorld>().body_handle(ball);
    assert!(handle.is_some());

    tick(&mut world, &mut schedule);
    tick(&mut world, &mut schedule);
    let physics = world.resource::<PhysicsWorld>();
    assert_eq!(physics.body_count(), 1);
    assert_eq!(physics.body_handle(ball), handle);
    assert_eq!(physics.fixtures(ball).map(|f| f.len()), Some(1));
}

#[test]
fn entity_without_position_gets_no_body() {
    let mut world = make_world(Vec2::ZERO);
    let mut schedule = make_schedule();
    let e = world.spawn(RigidBodyConfig::dynamic()).id();

    tick(&mut world, &mut schedule);
    assert!(!world.resource::<PhysicsWorld>().has_body(e));
}

#[test]
fn despawned_entity_loses_its_body() {
    let mut world = make_world(Vec2::ZERO);
    let mut schedule = make_schedule();
    let a = spawn_ball(&mut world, 0.0, 0.0, 5.0);
    let b = spawn_ball(&mut world, 100.0, 0.0, 5.0);

    tick(&mut world, &mut schedule);
    assert_eq!(world.resource::<PhysicsWorld>().body_count(), 2);

    world.despawn(a);
    tick(&mut world, &mut schedule);

    let physics = world.resource::<PhysicsWorld>();
    assert!(!physics.has_body(a));
    assert!(physics.has_body(b));
    assert_eq!(physics.body_count(), 1);
    assert_eq!(physics.collider_count(), 1);
}

// ==================== TRANSFORM & VELOCITY ====================

#[test]
fn free_fall_through_the_chain() {
    let mut world = make_world(Vec2::new(0.0, 980.0));
    let mut schedule = make_schedule();
    let ball = spawn_ball(&mut world, 0.0, 0.0, 10.0);

    let mut last_y = 0.0;
    for frame in 0..60 {
        tick(&mut world, &mut schedule);
        let y = world.get::<MapPosition>(ball).unwrap().y;
        assert!(y > last_y, "frame {}: {} -> {}", frame, last_y, y);
        last_y = y;
    }
    assert_eq!(world.resource::<PhysicsWorld>().step_count(), 60);
    assert!(last_y > 470.0 && last_y < 510.0, "y after 1s = {}", last_y);
}

#[test]
fn time_scale_zero_freezes_simulation() {
    let mut world = make_world(Vec2::new(0.0, 980.0));
    let mut schedule = make_schedule();
    world.resource_mut::<WorldTime>().time_scale = 0.0;
    let ball = spawn_ball(&mut world, 0.0, 0.0, 10.0);

    for _ in 0..10 {
        tick(&mut world, &mut schedule);
    }
    assert_eq!(world.resource::<PhysicsWorld>().step_count(), 0);
    assert_eq!(world.get::<MapPosition>(ball).unwrap().y, 0.0);
}

#[test]
fn kinematic_body_follows_position_component() {
    let mut world = make_world(Vec2::new(0.0, 980.0));
    let mut schedule = make_schedule();
    let platform = world
        .spawn((
            MapPosition::new(0.0, 0.0),
            RigidBodyConfig::kinematic(),
            ColliderConfig::single(Shape::box_shape(50.0, 10.0)),
        ))
        .id();

    tick(&mut world, &mut schedule);
    world
        .get_mut::<MapPosition>(platform)
        .unwrap()
        .set_transform(30.0, -10.0, 0.25);
    tick(&mut world, &mut schedule);

    let physics = world.resource::<PhysicsWorld>();
    assert_eq!(physics.body_type(platform), Some(BodyType::Kinematic));
    let pos = physics.position(platform).unwrap();
    assert!(approx_eq(pos.x, 30.0) && approx_eq(pos.y, -10.0), "pos = {:?}", pos);
    assert!(approx_eq(physics.angle(platform).unwrap(), 0.25));
    // Kinematic poses are never written back.
    assert_eq!(world.get::<MapPosition>(platform).unwrap().x, 30.0);
}

#[test]
fn velocity_component_drives_dynamic_body() {
    let mut world = make_world(Vec2::ZERO);
    let mut schedule = make_schedule();
    let ball = spawn_ball(&mut world, 0.0, 0.0, 10.0);
    world.entity_mut(ball).insert(Velocity::new(120.0, 0.0));

    tick(&mut world, &mut schedule);
    let pos = world.get::<MapPosition>(ball).unwrap();
    assert!(approx_eq(pos.x, 2.0), "x = {}", pos.x);

    let velocity = world.get::<Velocity>(ball).unwrap();
    assert!(approx_eq(velocity.linear.x, 120.0));

    world.get_mut::<Velocity>(ball).unwrap().linear = Vec2::new(0.0, 60.0);
    tick(&mut world, &mut schedule);
    let pos = world.get::<MapPosition>(ball).unwrap();
    assert!(approx_eq(pos.x, 2.0) && approx_eq(pos.y, 1.0), "pos = {:?}", pos);
}

// ==================== CONTACTS ====================

#[test]
fn landing_and_leaving_updates_touching_on_both_sides() {
    let mut world = make_world(Vec2::new(0.0, 980.0));
    let mut schedule = make_schedule();
    let ground = spawn_ground(&mut world, 200.0);
    let ball = spawn_ball(&mut world, 0.0, 150.0, 10.0);
    world.entity_mut(ball).insert(Velocity::default());

    for _ in 0..60 {
        tick(&mut world, &mut schedule);
    }
    assert_eq!(touching(&world, ball), vec![ground]);
    assert_eq!(touching(&world, ground), vec![ball]);

    world.get_mut::<Velocity>(ball).unwrap().linear = Vec2::new(0.0, -800.0);
    let mut saw_end = false;
    for _ in 0..15 {
        tick(&mut world, &mut schedule);
        saw_end |= !world
            .resource::<PhysicsWorld>()
            .collision_end_events()
            .is_empty();
    }
    assert!(saw_end);
    assert!(touching(&world, ball).is_empty());
    assert!(touching(&world, ground).is_empty());
}

#[test]
fn hop_within_one_update_keeps_pair_touching() {
    let mut world = make_world(Vec2::new(0.0, 980.0));
    let mut schedule = make_schedule();
    let ground = spawn_ground(&mut world, 200.0);
    let ball = spawn_ball(&mut world, 0.0, 180.0, 10.0);
    world.entity_mut(ball).insert(Velocity::default());

    for _ in 0..60 {
        tick(&mut world, &mut schedule);
    }
    assert_eq!(touching(&world, ball), vec![ground]);

    // A small hop that leaves and lands again inside one long frame.
    world.get_mut::<Velocity>(ball).unwrap().linear = Vec2::new(0.0, -50.0);
    update_world_time(&mut world, 8.0 / 60.0);
    schedule.run(&mut world);
    {
        let physics = world.resource::<PhysicsWorld>();
        assert_eq!(physics.step_count(), 68);
        assert!(!physics.collision_end_events().is_empty());
        assert!(!physics.collision_begin_events().is_empty());
    }
    assert_eq!(touching(&world, ball), vec![ground]);
    assert_eq!(touching(&world, ground), vec![ball]);

    for _ in 0..60 {
        tick(&mut world, &mut schedule);
    }
    assert_eq!(touching(&world, ball), vec![ground]);
    assert_eq!(touching(&world, ground), vec![ball]);
}

#[test]
fn ball_crossing_sensor_enters_and_exits() {
    let mut world = make_world(Vec2::new(0.0, 980.0));
    let mut schedule = make_schedule();
    let sensor = world
        .spawn((
            MapPosition::new(0.0, 100.0),
            RigidBodyConfig::fixed(),
            ColliderConfig::single(Shape::box_shape(200.0, 10.0)).with_sensor(true),
        ))
        .id();
    let ball = spawn_ball(&mut world, 0.0, 0.0, 5.0);

    let mut entered_at = None;
    let mut exited_at = None;
    let mut touched_while_inside = false;
    for frame in 0..60 {
        tick(&mut world, &mut schedule);
        let physics = world.resource::<PhysicsWorld>();
        if physics
            .sensor_enter_events()
            .iter()
            .any(|e| e.sensor == sensor && e.visitor == ball)
        {
            entered_at = Some(frame);
        }
        if physics
            .sensor_exit_events()
            .iter()
            .any(|e| e.sensor == sensor && e.visitor == ball)
        {
            exited_at = Some(frame);
        }
        if entered_at.is_some() && exited_at.is_none() {
            touched_while_inside |= touching(&world, sensor) == vec![ball];
        }
    }

    let (Some(entered), Some(exited)) = (entered_at, exited_at) else {
        panic!("enter {:?} / exit {:?}", entered_at, exited_at);
    };
    assert!(entered < exited);
    assert!(touched_while_inside);
    assert!(touching(&world, sensor).is_empty());
    assert!(touching(&world, ball).is_empty());
    // Sensors never push back.
    assert!(world.get::<MapPosition>(ball).unwrap().y > 110.0);
}

// ==================== CUSTOM POSITION TYPE ====================

#[derive(Component, Debug, Default)]
struct Pose {
    at: Vec2,
    heading: f32,
}

impl PositionLike for Pose {
    fn x(&self) -> f32 {
        self.at.x
    }
    fn y(&self) -> f32 {
        self.at.y
    }
    fn rotation(&self) -> f32 {
        self.heading
    }
    fn set_transform(&mut self, x: f32, y: f32, rotation: f32) {
        self.at = Vec2::new(x, y);
        self.heading = rotation;
    }
}

#[test]
fn chain_is_generic_over_position_type() {
    let mut world = make_world(Vec2::new(0.0, 980.0));
    let mut schedule = Schedule::default();
    add_physics_systems::<Pose>(&mut schedule);

    let body = world
        .spawn((
            Pose {
                at: Vec2::new(10.0, 0.0),
                heading: 0.0,
            },
            RigidBodyConfig::dynamic(),
            ColliderConfig::single(Shape::box_shape(8.0, 8.0)),
        ))
        .id();
    // MapPosition alone is not enough for this chain.
    let ignored = spawn_ball(&mut world, 0.0, 0.0, 5.0);

    for _ in 0..10 {
        tick(&mut world, &mut schedule);
    }
    let physics = world.resource::<PhysicsWorld>();
    assert!(physics.has_body(body));
    assert!(!physics.has_body(ignored));
    let pose = world.get::<Pose>(body).unwrap();
    assert!(pose.at.y > 0.0);
    assert!(approx_eq(pose.at.x, 10.0));
}
