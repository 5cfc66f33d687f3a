//! End-to-end scenarios run against `PhysicsWorld` directly, one per
//! documented simulation behavior.

use glam::DVec2;
use rigid2d::config::WorldConfig;
use rigid2d::core::shape::ColliderShape;
use rigid2d::core::{BodyKind, Material, RigidBody};
use rigid2d::{EntityId, PhysicsWorld};

fn step_n(world: &mut PhysicsWorld, n: u32) {
    for _ in 0..n {
        world.step(1.0 / 60.0);
    }
}

#[test]
fn free_fall_matches_closed_form_after_one_second() {
    let config = WorldConfig::builder().gravity(0.0, -9.81).build();
    let mut world = PhysicsWorld::new(config);

    let ball = RigidBody::builder(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(0.5))
        .position(DVec2::ZERO)
        .build();
    let id = world.create_body(ball).unwrap();

    step_n(&mut world, 60);

    let state = world.body_state(id);
    assert!((state.position.x).abs() < 1e-9);
    assert!((state.position.y + 4.905).abs() < 0.01);
    assert!((state.linear_velocity.y + 9.81).abs() < 0.01);
}

#[test]
fn elastic_bounce_off_a_static_wall_preserves_speed() {
    let config = WorldConfig::builder().gravity(0.0, 0.0).build();
    let mut world = PhysicsWorld::new(config);

    let wall = RigidBody::builder(EntityId::default(), BodyKind::Static, ColliderShape::aabb(0.5, 10.0))
        .position(DVec2::new(5.0, 0.0))
        .material(Material { restitution: 1.0, friction: 0.0 })
        .build();
    world.create_body(wall).unwrap();

    let ball = RigidBody::builder(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(1.0))
        .position(DVec2::ZERO)
        .material(Material { restitution: 1.0, friction: 0.0 })
        .build();
    let ball_id = world.create_body(ball).unwrap();
    world.set_body_velocity(ball_id, DVec2::new(1.0, 0.0));

    let mut sign_flips = 0;
    let mut last_sign = 1.0f64;
    for _ in 0..600 {
        world.step(1.0 / 60.0);
        let vx = world.body_state(ball_id).linear_velocity.x;
        if vx != 0.0 {
            let sign = vx.signum();
            if sign != last_sign {
                sign_flips += 1;
                last_sign = sign;
            }
        }
    }

    let final_speed = world.body_state(ball_id).linear_velocity.length();
    assert!((final_speed - 1.0).abs() < 0.01, "speed drifted to {final_speed}");
    assert_eq!(sign_flips % 2, 1, "expected an odd number of bounces, got {sign_flips}");
}

#[test]
fn three_box_stack_settles_to_rest() {
    let config = WorldConfig::builder().gravity(0.0, -9.81).build();
    let mut world = PhysicsWorld::new(config);

    let ground = RigidBody::builder(EntityId::default(), BodyKind::Static, ColliderShape::aabb(50.0, 0.5))
        .position(DVec2::new(0.0, 10.0))
        .build();
    world.create_body(ground).unwrap();

    let mut ids = Vec::new();
    for &y in &[8.5, 7.5, 6.5] {
        let body = RigidBody::builder(EntityId::default(), BodyKind::Dynamic, ColliderShape::aabb(0.5, 0.5))
            .position(DVec2::new(0.0, y))
            .build();
        ids.push(world.create_body(body).unwrap());
    }

    step_n(&mut world, 300);

    for &id in &ids {
        let speed = world.body_state(id).linear_velocity.length();
        assert!(speed < 0.05, "box still moving at speed {speed}");
    }
    let top = world.body_state(*ids.last().unwrap());
    assert!((top.position.y - 6.5).abs() < 0.05, "top box settled at {}", top.position.y);
}

#[test]
fn soft_distance_joint_converges_to_rest_length() {
    let config = WorldConfig::builder().gravity(0.0, 0.0).build();
    let mut world = PhysicsWorld::new(config);

    let anchor = RigidBody::builder(EntityId::default(), BodyKind::Kinematic, ColliderShape::circle(0.5))
        .position(DVec2::ZERO)
        .build();
    let anchor_id = world.create_body(anchor).unwrap();

    let bob = RigidBody::builder(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(0.5))
        .position(DVec2::new(2.0, 0.0))
        .build();
    let bob_id = world.create_body(bob).unwrap();

    world
        .create_soft_distance_joint(anchor_id, bob_id, 2.0, 1.0, 0.3)
        .expect("both bodies exist");

    step_n(&mut world, 300);

    let state = world.body_state(bob_id);
    let distance = state.position.length();
    assert!((distance - 2.0).abs() < 0.02, "distance settled at {distance}");
    assert!(state.linear_velocity.length() < 0.05);
}

#[test]
fn raycast_hits_the_nearer_of_two_static_circles() {
    let mut world = PhysicsWorld::default();

    let near = RigidBody::builder(EntityId::default(), BodyKind::Static, ColliderShape::circle(1.0))
        .position(DVec2::new(3.0, 0.0))
        .build();
    world.create_body(near).unwrap();

    let far = RigidBody::builder(EntityId::default(), BodyKind::Static, ColliderShape::circle(1.0))
        .position(DVec2::new(7.0, 0.0))
        .build();
    world.create_body(far).unwrap();

    let query = rigid2d::RaycastQuery {
        origin: DVec2::ZERO,
        direction: DVec2::new(1.0, 0.0),
        max_distance: 10.0,
    };
    let hit = world.raycast(&query).expect("ray should hit the near circle");

    assert!((hit.point.x - 2.0).abs() < 1e-6);
    assert!((hit.distance - 2.0).abs() < 1e-6);
}

#[test]
fn disjoint_collision_filters_pass_through_each_other() {
    let config = WorldConfig::builder().gravity(0.0, 0.0).build();
    let mut world = PhysicsWorld::new(config);

    let a = RigidBody::builder(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(0.5))
        .position(DVec2::new(-5.0, 0.0))
        .filter(rigid2d::CollisionFilter { layer: 0x01, mask: 0x02 })
        .build();
    let a_id = world.create_body(a).unwrap();
    world.set_body_velocity(a_id, DVec2::new(1.0, 0.0));

    let b = RigidBody::builder(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(0.5))
        .position(DVec2::new(5.0, 0.0))
        .filter(rigid2d::CollisionFilter { layer: 0x04, mask: 0xFFFF })
        .build();
    let b_id = world.create_body(b).unwrap();
    world.set_body_velocity(b_id, DVec2::new(-1.0, 0.0));

    step_n(&mut world, 600);

    assert!(
        world.contacts().is_empty(),
        "disjoint layer/mask bodies should never generate a contact"
    );
    assert!((world.body_state(a_id).linear_velocity.x - 1.0).abs() < 1e-9);
    assert!((world.body_state(b_id).linear_velocity.x + 1.0).abs() < 1e-9);
}
