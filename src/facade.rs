//! Flat, handle-based entry point for a host embedding this engine as a
//! service: create a world, create bodies, step time, read state back as
//! primitive numbers. This is the one module that turns the typed,
//! `Result`/`Option`-returning [`crate::world::PhysicsWorld`] API into the
//! wire contract: every failure becomes a sentinel (0, an empty array, or
//! an all-zero snapshot) instead of an error value, and nothing here ever
//! panics on host-supplied input.
//!
//! At most one world exists at a time, guarded by a process-wide mutex so
//! a host can call these functions from any thread without its own locking.

use std::sync::OnceLock;

use glam::DVec2;
use parking_lot::Mutex;

use crate::config::{MAX_BODIES, MAX_CONSTRAINTS, WorldConfig};
use crate::core::rigidbody::{BodyKind, RigidBody};
use crate::core::shape::ColliderShape;
use crate::core::types::Material;
use crate::core::CollisionFilter;
use crate::utils::allocator::EntityId;
use crate::world::PhysicsWorld;

static WORLD: OnceLock<Mutex<Option<PhysicsWorld>>> = OnceLock::new();

fn slot() -> &'static Mutex<Option<PhysicsWorld>> {
    WORLD.get_or_init(|| Mutex::new(None))
}

/// Packs an [`EntityId`] into a non-zero `f64` handle, and back. `0` is
/// reserved exclusively for "no such object" on the wire; every live id
/// encodes to a value `>= 1`, and a stale or garbage handle decodes to an
/// `EntityId` that the world's generation check will simply reject.
fn encode_handle(id: EntityId, capacity: usize) -> f64 {
    let stride = capacity as u64 + 1;
    let packed = (id.generation() as u64) * stride + id.index() as u64 + 1;
    packed as f64
}

fn decode_handle(handle: f64, capacity: usize) -> Option<EntityId> {
    if !handle.is_finite() || handle < 1.0 {
        return None;
    }
    let stride = capacity as u64 + 1;
    let packed = handle as u64;
    let index = (packed - 1) % stride;
    let generation = (packed - 1) / stride;
    Some(EntityId::new(index as usize, generation as u32))
}

fn encode_body(id: EntityId) -> f64 {
    encode_handle(id, MAX_BODIES)
}

fn decode_body(handle: f64) -> Option<EntityId> {
    decode_handle(handle, MAX_BODIES)
}

fn encode_constraint(id: EntityId) -> f64 {
    encode_handle(id, MAX_CONSTRAINTS)
}

fn decode_constraint(handle: f64) -> Option<EntityId> {
    decode_handle(handle, MAX_CONSTRAINTS)
}

fn body_kind_from_tag(kind: u32) -> BodyKind {
    match kind {
        0 => BodyKind::Static,
        2 => BodyKind::Kinematic,
        _ => BodyKind::Dynamic,
    }
}

/// Creates the world, replacing any world already live. Gravity is the only
/// world-level parameter exposed on the wire; every other tunable keeps its
/// default from [`WorldConfig`].
pub fn create_world(gravity_x: f64, gravity_y: f64) {
    let config = WorldConfig::builder().gravity(gravity_x, gravity_y).build();
    *slot().lock() = Some(PhysicsWorld::new(config));
}

pub fn destroy_world() {
    *slot().lock() = None;
}

/// Advances the live world by `dt` seconds. No-op if no world exists.
pub fn step(dt: f64) {
    if let Some(world) = slot().lock().as_mut() {
        world.step(dt);
    }
}

/// Creates a circle (`shape_tag == 0`) or AABB (`shape_tag == 1`) body.
/// `p1`/`p2` are the circle radius (p2 unused) or AABB half-extents.
/// Returns `0` if no world exists; never fails for circle/AABB shapes.
#[allow(clippy::too_many_arguments)]
pub fn create_body(
    kind: u32,
    shape_tag: u32,
    p1: f64,
    p2: f64,
    x: f64,
    y: f64,
    mass: f64,
    restitution: f64,
    friction: f64,
    layer: u16,
    mask: u16,
) -> f64 {
    let shape = if shape_tag == 1 {
        ColliderShape::aabb(p1, p2)
    } else {
        ColliderShape::circle(p1)
    };
    create_body_with_shape(kind, shape, x, y, mass, restitution, friction, layer, mask)
}

/// Creates a convex polygon body from a flat `[x0, y0, x1, y1, ...]` vertex
/// array. Returns `0` if no world exists, or if the vertices fail the
/// convex/CCW/vertex-count validation (the polygon is not created).
#[allow(clippy::too_many_arguments)]
pub fn create_polygon_body(
    kind: u32,
    flat_vertices: &[f64],
    x: f64,
    y: f64,
    mass: f64,
    restitution: f64,
    friction: f64,
    layer: u16,
    mask: u16,
) -> f64 {
    let vertices: Vec<DVec2> = flat_vertices
        .chunks_exact(2)
        .map(|pair| DVec2::new(pair[0], pair[1]))
        .collect();

    let shape = match ColliderShape::polygon(vertices) {
        Ok(shape) => shape,
        Err(_) => return 0.0,
    };

    create_body_with_shape(kind, shape, x, y, mass, restitution, friction, layer, mask)
}

#[allow(clippy::too_many_arguments)]
fn create_body_with_shape(
    kind: u32,
    shape: ColliderShape,
    x: f64,
    y: f64,
    mass: f64,
    restitution: f64,
    friction: f64,
    layer: u16,
    mask: u16,
) -> f64 {
    let mut guard = slot().lock();
    let Some(world) = guard.as_mut() else { return 0.0 };

    let kind = body_kind_from_tag(kind);
    let body = RigidBody::builder(EntityId::default(), kind, shape)
        .position(DVec2::new(x, y))
        .mass(mass)
        .material(Material { restitution, friction })
        .filter(CollisionFilter { layer, mask })
        .build();

    match world.create_body(body) {
        Ok(id) => encode_body(id),
        Err(_) => 0.0,
    }
}

pub fn remove_body(id: f64) -> bool {
    let Some(id) = decode_body(id) else { return false };
    match slot().lock().as_mut() {
        Some(world) => world.remove_body(id),
        None => false,
    }
}

pub fn set_body_position(id: f64, x: f64, y: f64) {
    let Some(id) = decode_body(id) else { return };
    if let Some(world) = slot().lock().as_mut() {
        world.set_body_position(id, DVec2::new(x, y));
    }
}

pub fn set_body_velocity(id: f64, vx: f64, vy: f64) {
    let Some(id) = decode_body(id) else { return };
    if let Some(world) = slot().lock().as_mut() {
        world.set_body_velocity(id, DVec2::new(vx, vy));
    }
}

pub fn set_body_angular_velocity(id: f64, omega: f64) {
    let Some(id) = decode_body(id) else { return };
    if let Some(world) = slot().lock().as_mut() {
        world.set_body_angular_velocity(id, omega);
    }
}

pub fn apply_force(id: f64, fx: f64, fy: f64) {
    let Some(id) = decode_body(id) else { return };
    if let Some(world) = slot().lock().as_mut() {
        world.apply_force(id, DVec2::new(fx, fy));
    }
}

pub fn apply_impulse(id: f64, ix: f64, iy: f64) {
    let Some(id) = decode_body(id) else { return };
    if let Some(world) = slot().lock().as_mut() {
        world.apply_impulse(id, DVec2::new(ix, iy));
    }
}

pub fn set_collision_layers(id: f64, layer: u16, mask: u16) {
    let Some(id) = decode_body(id) else { return };
    if let Some(world) = slot().lock().as_mut() {
        world.set_collision_layers(id, layer, mask);
    }
}

/// `[x, y, angle, vx, vy, omega, sleeping]`. All-zero for an unknown id or
/// when no world exists.
pub fn get_body_state(id: f64) -> [f64; 7] {
    let Some(id) = decode_body(id) else { return [0.0; 7] };
    let guard = slot().lock();
    let Some(world) = guard.as_ref() else { return [0.0; 7] };
    let s = world.body_state(id);
    [
        s.position.x,
        s.position.y,
        s.angle,
        s.linear_velocity.x,
        s.linear_velocity.y,
        s.angular_velocity,
        if s.sleeping { 1.0 } else { 0.0 },
    ]
}

/// One `[id, x, y, vx, vy, angle, omega, sleeping]` record per live body, in
/// creation order. Empty if no world exists.
pub fn get_all_body_states() -> Vec<[f64; 8]> {
    let guard = slot().lock();
    let Some(world) = guard.as_ref() else { return Vec::new() };
    world
        .all_body_states()
        .into_iter()
        .map(|(id, s)| {
            [
                encode_body(id),
                s.position.x,
                s.position.y,
                s.linear_velocity.x,
                s.linear_velocity.y,
                s.angle,
                s.angular_velocity,
                if s.sleeping { 1.0 } else { 0.0 },
            ]
        })
        .collect()
}

pub fn create_distance_joint(a: f64, b: f64, distance: f64) -> f64 {
    with_body_pair(a, b, |world, a, b| world.create_rigid_distance_joint(a, b, distance))
}

pub fn create_soft_distance_joint(a: f64, b: f64, distance: f64, frequency_hz: f64, damping_ratio: f64) -> f64 {
    with_body_pair(a, b, |world, a, b| {
        world.create_soft_distance_joint(a, b, distance, frequency_hz, damping_ratio)
    })
}

pub fn create_revolute_joint(a: f64, b: f64, px: f64, py: f64) -> f64 {
    with_body_pair(a, b, |world, a, b| world.create_rigid_revolute_joint(a, b, DVec2::new(px, py)))
}

pub fn create_soft_revolute_joint(a: f64, b: f64, px: f64, py: f64, frequency_hz: f64, damping_ratio: f64) -> f64 {
    with_body_pair(a, b, |world, a, b| {
        world.create_soft_revolute_joint(a, b, DVec2::new(px, py), frequency_hz, damping_ratio)
    })
}

fn with_body_pair(
    a: f64,
    b: f64,
    f: impl FnOnce(&mut PhysicsWorld, EntityId, EntityId) -> Option<EntityId>,
) -> f64 {
    let (Some(a), Some(b)) = (decode_body(a), decode_body(b)) else { return 0.0 };
    match slot().lock().as_mut() {
        Some(world) => f(world, a, b).map(encode_constraint).unwrap_or(0.0),
        None => 0.0,
    }
}

pub fn remove_constraint(id: f64) -> bool {
    let Some(id) = decode_constraint(id) else { return false };
    match slot().lock().as_mut() {
        Some(world) => world.remove_constraint(id),
        None => false,
    }
}

/// Every body id whose world-space AABB overlaps `[min, max]`. Empty if no
/// world exists.
pub fn query_aabb(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<f64> {
    let guard = slot().lock();
    let Some(world) = guard.as_ref() else { return Vec::new() };
    world
        .query_aabb(DVec2::new(min_x, min_y), DVec2::new(max_x, max_y))
        .into_iter()
        .map(encode_body)
        .collect()
}

/// `[id, hitX, hitY, distance]` for the nearest hit, or empty if nothing
/// was hit (or no world exists). `direction` need not be normalized;
/// `max_distance` defaults to [`crate::config::DEFAULT_RAYCAST_DISTANCE`]
/// when the host passes a non-positive value.
pub fn raycast(origin_x: f64, origin_y: f64, dir_x: f64, dir_y: f64, max_distance: f64) -> Vec<f64> {
    let guard = slot().lock();
    let Some(world) = guard.as_ref() else { return Vec::new() };

    let max_distance = if max_distance > 0.0 {
        max_distance
    } else {
        crate::config::DEFAULT_RAYCAST_DISTANCE
    };

    let query = crate::collision::queries::RaycastQuery {
        origin: DVec2::new(origin_x, origin_y),
        direction: DVec2::new(dir_x, dir_y),
        max_distance,
    };

    match world.raycast(&query) {
        Some(hit) => vec![encode_body(hit.body_id), hit.point.x, hit.point.y, hit.distance],
        None => Vec::new(),
    }
}

/// Flat `(idA, idB, px, py, nx, ny, depth)` 7-tuples, one per contact point.
pub fn get_contacts() -> Vec<f64> {
    let guard = slot().lock();
    let Some(world) = guard.as_ref() else { return Vec::new() };

    let mut out = Vec::new();
    for row in world.contacts() {
        out.extend_from_slice(&[
            encode_body(row.body_a),
            encode_body(row.body_b),
            row.point.x,
            row.point.y,
            row.normal.x,
            row.normal.y,
            row.depth,
        ]);
    }
    out
}

/// Self-describing stream: `(bodyA, bodyB, nx, ny, numPoints)` followed by
/// `numPoints` groups of `(localAx, localAy, localBx, localBy, penetration)`.
pub fn get_manifolds() -> Vec<f64> {
    let guard = slot().lock();
    let Some(world) = guard.as_ref() else { return Vec::new() };

    let mut out = Vec::new();
    for manifold in world.manifolds() {
        out.extend_from_slice(&[
            encode_body(manifold.body_a),
            encode_body(manifold.body_b),
            manifold.normal.x,
            manifold.normal.y,
            manifold.points.len() as f64,
        ]);
        for point in &manifold.points {
            out.extend_from_slice(&[
                point.local_anchor_a.x,
                point.local_anchor_a.y,
                point.local_anchor_b.x,
                point.local_anchor_b.y,
                point.depth,
            ]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    // All facade tests share one process-wide world, so they run as a
    // single `#[test]` lifecycle rather than independent cases that would
    // race each other under the default parallel test runner.
    use super::*;

    #[test]
    fn facade_lifecycle() {
        destroy_world();
        assert_eq!(create_body(1, 0, 0.5, 0.0, 0.0, 0.0, 1.0, 0.3, 0.5, 1, 0xFFFF), 0.0);

        create_world(0.0, -9.81);

        assert_eq!(get_body_state(12345.0), [0.0; 7]);

        let id = create_body(1, 0, 0.5, 0.0, 1.0, 2.0, 1.0, 0.3, 0.5, 1, 0xFFFF);
        assert!(id > 0.0);
        let state = get_body_state(id);
        assert!((state[0] - 1.0).abs() < 1e-9);
        assert!((state[1] - 2.0).abs() < 1e-9);

        let bad = [0.0, 0.0, 1.0, 0.0];
        let invalid = create_polygon_body(1, &bad, 0.0, 0.0, 1.0, 0.3, 0.5, 1, 0xFFFF);
        assert_eq!(invalid, 0.0);

        assert!(raycast(0.0, 0.0, 1.0, 0.0, 100.0).is_empty());

        assert!(remove_body(id));
        assert_eq!(get_body_state(id), [0.0; 7]);
        assert!(!remove_body(id));

        destroy_world();
    }
}
