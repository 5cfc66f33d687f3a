//! Collision-pipeline tests that exercise the broad and narrow phase
//! together through `PhysicsWorld`, rather than the lower-level unit tests
//! that live next to each module.

use glam::DVec2;
use rigid2d::core::shape::ColliderShape;
use rigid2d::core::{BodyKind, RigidBody};
use rigid2d::{EntityId, PhysicsWorld};

fn body_at(world: &mut PhysicsWorld, kind: BodyKind, shape: ColliderShape, pos: DVec2) -> EntityId {
    let body = RigidBody::builder(EntityId::default(), kind, shape)
        .position(pos)
        .build();
    world.create_body(body).unwrap()
}

#[test]
fn overlapping_boxes_produce_a_contact_with_positive_depth() {
    let mut world = PhysicsWorld::default();
    body_at(&mut world, BodyKind::Dynamic, ColliderShape::aabb(0.5, 0.5), DVec2::ZERO);
    body_at(
        &mut world,
        BodyKind::Dynamic,
        ColliderShape::aabb(0.5, 0.5),
        DVec2::new(0.4, 0.0),
    );

    world.step(1.0 / 600.0);

    let contacts = world.contacts();
    assert!(!contacts.is_empty(), "overlapping boxes should produce at least one contact");
    assert!(contacts.iter().all(|c| c.depth > 0.0));
}

#[test]
fn deep_box_overlap_produces_a_multi_point_manifold() {
    let mut world = PhysicsWorld::default();
    body_at(&mut world, BodyKind::Dynamic, ColliderShape::aabb(0.5, 0.5), DVec2::ZERO);
    body_at(
        &mut world,
        BodyKind::Dynamic,
        ColliderShape::aabb(0.5, 0.5),
        DVec2::new(0.3, 0.2),
    );

    world.step(1.0 / 600.0);

    let manifold = world
        .manifolds()
        .next()
        .expect("deep overlap should produce a manifold");
    assert!(
        manifold.points.len() >= 2,
        "expected a clipped multi-point manifold, got {}",
        manifold.points.len()
    );
    assert!(manifold.points.len() <= 4, "a manifold should never carry more than 4 points");
}

#[test]
fn static_bodies_never_generate_a_contact_with_each_other() {
    let mut world = PhysicsWorld::default();
    body_at(&mut world, BodyKind::Static, ColliderShape::circle(1.0), DVec2::ZERO);
    body_at(&mut world, BodyKind::Static, ColliderShape::circle(1.0), DVec2::new(0.5, 0.0));

    world.step(1.0 / 600.0);

    assert!(world.contacts().is_empty());
}

#[test]
fn aabb_query_returns_only_bodies_whose_bounds_overlap() {
    let mut world = PhysicsWorld::default();
    let inside = body_at(&mut world, BodyKind::Static, ColliderShape::circle(0.5), DVec2::new(1.0, 1.0));
    let outside = body_at(&mut world, BodyKind::Static, ColliderShape::circle(0.5), DVec2::new(50.0, 50.0));

    let hits = world.query_aabb(DVec2::new(0.0, 0.0), DVec2::new(2.0, 2.0));
    assert!(hits.contains(&inside));
    assert!(!hits.contains(&outside));
}

#[test]
fn mismatched_layer_and_mask_suppresses_the_contact() {
    let mut world = PhysicsWorld::default();
    let a = body_at(&mut world, BodyKind::Dynamic, ColliderShape::circle(0.5), DVec2::ZERO);
    let b = body_at(
        &mut world,
        BodyKind::Dynamic,
        ColliderShape::circle(0.5),
        DVec2::new(0.4, 0.0),
    );

    world.set_collision_layers(a, 0x01, 0x02);
    world.set_collision_layers(b, 0x04, 0xFFFF);

    world.step(1.0 / 600.0);

    assert!(world.contacts().is_empty(), "disjoint filters should suppress the overlap");
}
