//! Persistent contact manifolds. Caches warm-start impulses across steps by
//! matching new contact points to cached ones through body-local anchors,
//! per §4.4: "matched by proximity of their body-local anchors, not identity".

use std::collections::HashMap;

use glam::DVec2;

use super::narrowphase::{self, ContactGeometry};
use crate::core::rigidbody::BodyKind;
use crate::core::soa::{BodyRef, BodiesSoA};
use crate::core::types::{Material, MaterialPairProperties, Transform2};
use crate::utils::allocator::EntityId;

/// A pair is dormant (no manifold, no solving) when every non-static body in
/// it is asleep. Static bodies are inert terrain and never count toward
/// "someone here is awake"; a lone sleeping dynamic body resting against the
/// ground must not keep regenerating a manifold against it, or the warm-start
/// impulse the solver reapplies each substep would wake it right back up
/// (§3: "sleeping bodies do not generate manifolds and do not move"; §4.8:
/// "excluded from... narrow phase until woken").
pub fn pair_is_dormant(a: &BodyRef, b: &BodyRef) -> bool {
    let active = |body: &BodyRef| body.kind() != BodyKind::Static && body.is_awake();
    !active(a) && !active(b)
}

/// Anchors close enough to be considered "the same" contact feature across
/// steps, in body-local units.
const ANCHOR_MATCH_TOLERANCE: f64 = 0.02;

/// Hook invoked with a read-only snapshot of a manifold each time `refresh`
/// regenerates it, for a host that wants per-contact diagnostics without
/// polling `ManifoldCache::debug_snapshots` every step.
type ManifoldDebugHook = dyn Fn(&ManifoldDebugInfo) + Send + Sync;

#[derive(Debug, Clone, Copy)]
pub struct ManifoldPointDebugInfo {
    pub world_point: DVec2,
    pub depth: f64,
    pub normal_impulse: f64,
    pub tangent_impulse: f64,
}

/// Read-only snapshot of a [`PersistentManifold`], handed to a debug hook or
/// returned in bulk from [`ManifoldCache::debug_snapshots`].
#[derive(Debug, Clone)]
pub struct ManifoldDebugInfo {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub normal: DVec2,
    pub points: Vec<ManifoldPointDebugInfo>,
}

impl PersistentManifold {
    fn debug_snapshot(&self) -> ManifoldDebugInfo {
        ManifoldDebugInfo {
            body_a: self.body_a,
            body_b: self.body_b,
            normal: self.normal,
            points: self
                .points
                .iter()
                .map(|p| ManifoldPointDebugInfo {
                    world_point: p.world_point,
                    depth: p.depth,
                    normal_impulse: p.normal_impulse,
                    tangent_impulse: p.tangent_impulse,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ManifoldPoint {
    pub local_anchor_a: DVec2,
    pub local_anchor_b: DVec2,
    pub world_point: DVec2,
    pub depth: f64,
    pub normal_impulse: f64,
    pub tangent_impulse: f64,
}

#[derive(Debug, Clone)]
pub struct PersistentManifold {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub normal: DVec2,
    pub material: MaterialPairProperties,
    pub points: Vec<ManifoldPoint>,
}

/// Canonical key for a body pair: `a.index() < b.index()` always.
type ManifoldKey = (usize, usize);

fn canonical_key(a: EntityId, b: EntityId) -> ManifoldKey {
    if a.index() < b.index() {
        (a.index(), b.index())
    } else {
        (b.index(), a.index())
    }
}

/// Owns every body pair's manifold across the life of the world, refreshing
/// geometry and warm-starting impulses each narrow-phase pass.
#[derive(Default)]
pub struct ManifoldCache {
    manifolds: HashMap<ManifoldKey, PersistentManifold>,
    debug_hook: Option<Box<ManifoldDebugHook>>,
}

impl ManifoldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or clears, with `None`) a hook called with each manifold's
    /// snapshot as `refresh` regenerates it.
    pub fn set_debug_hook<F>(&mut self, hook: Option<F>)
    where
        F: Fn(&ManifoldDebugInfo) + Send + Sync + 'static,
    {
        self.debug_hook = hook.map(|f| Box::new(f) as Box<_>);
    }

    /// Snapshot of every live manifold, for a host that polls instead of
    /// installing a hook.
    pub fn debug_snapshots(&self) -> Vec<ManifoldDebugInfo> {
        self.manifolds.values().map(PersistentManifold::debug_snapshot).collect()
    }

    /// Regenerates every manifold for the supplied candidate pairs, dropping
    /// any cached manifold not present in this step's candidate set.
    pub fn refresh(&mut self, bodies: &BodiesSoA, candidate_pairs: &[(EntityId, EntityId)]) {
        let mut touched = HashMap::with_capacity(candidate_pairs.len());

        for &(id_a, id_b) in candidate_pairs {
            let (body_a, body_b) = match (bodies.get(id_a), bodies.get(id_b)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };

            if !body_a.filter().collides_with(body_b.filter()) {
                continue;
            }
            if body_a.is_static() && body_b.is_static() {
                continue;
            }
            if pair_is_dormant(&body_a, &body_b) {
                continue;
            }

            let geometry = narrowphase::generate(
                body_a.shape(),
                body_a.transform(),
                body_b.shape(),
                body_b.transform(),
            );

            let key = canonical_key(id_a, id_b);
            let material = Material::combine_pair(body_a.material(), body_b.material());

            if let Some(geometry) = geometry {
                let new_points = self.merge_points(
                    key,
                    &geometry,
                    body_a.transform(),
                    body_b.transform(),
                );
                let manifold = PersistentManifold {
                    body_a: id_a,
                    body_b: id_b,
                    normal: geometry.normal,
                    material,
                    points: new_points,
                };
                if let Some(hook) = self.debug_hook.as_ref() {
                    hook(&manifold.debug_snapshot());
                }
                touched.insert(key, manifold);
            }
        }

        self.manifolds = touched;
    }

    fn merge_points(
        &self,
        key: ManifoldKey,
        geometry: &ContactGeometry,
        transform_a: &Transform2,
        transform_b: &Transform2,
    ) -> Vec<ManifoldPoint> {
        let cached = self.manifolds.get(&key);

        geometry
            .points
            .iter()
            .map(|p| {
                let local_a = transform_a.point_to_local(p.point);
                let local_b = transform_b.point_to_local(p.point);

                let warm_start = cached.and_then(|manifold| {
                    manifold.points.iter().find(|cp| {
                        (cp.local_anchor_a - local_a).length() < ANCHOR_MATCH_TOLERANCE
                            || (cp.local_anchor_b - local_b).length() < ANCHOR_MATCH_TOLERANCE
                    })
                });

                ManifoldPoint {
                    local_anchor_a: local_a,
                    local_anchor_b: local_b,
                    world_point: p.point,
                    depth: p.depth,
                    normal_impulse: warm_start.map(|w| w.normal_impulse).unwrap_or(0.0),
                    tangent_impulse: warm_start.map(|w| w.tangent_impulse).unwrap_or(0.0),
                }
            })
            .collect()
    }

    /// Drops any cached manifold referencing `id`, per §4.2's "drops cached
    /// manifolds involving it" removal contract (the next `refresh` would
    /// eventually do the same, but callers may read the cache before then).
    pub fn remove_body(&mut self, id: EntityId) {
        self.manifolds.retain(|_, m| m.body_a != id && m.body_b != id);
    }

    pub fn get(&self, a: EntityId, b: EntityId) -> Option<&PersistentManifold> {
        self.manifolds.get(&canonical_key(a, b))
    }

    pub fn get_mut(&mut self, a: EntityId, b: EntityId) -> Option<&mut PersistentManifold> {
        self.manifolds.get_mut(&canonical_key(a, b))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersistentManifold> {
        self.manifolds.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PersistentManifold> {
        self.manifolds.values_mut()
    }

    pub fn len(&self) -> usize {
        self.manifolds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifolds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BodyKind, ColliderShape, RigidBody};

    #[test]
    fn overlapping_circles_produce_a_manifold() {
        let mut bodies = BodiesSoA::new();
        let mut a = RigidBody::new(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(1.0));
        a.transform.position = DVec2::ZERO;
        let mut b = RigidBody::new(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(1.0));
        b.transform.position = DVec2::new(1.5, 0.0);

        let id_a = bodies.insert(a);
        let id_b = bodies.insert(b);

        let mut cache = ManifoldCache::new();
        cache.refresh(&bodies, &[(id_a, id_b)]);
        assert_eq!(cache.len(), 1);
        let manifold = cache.get(id_a, id_b).unwrap();
        assert_eq!(manifold.points.len(), 1);
    }

    #[test]
    fn warm_start_impulse_survives_small_position_change() {
        let mut bodies = BodiesSoA::new();
        let mut a = RigidBody::new(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(1.0));
        a.transform.position = DVec2::ZERO;
        let mut b = RigidBody::new(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(1.0));
        b.transform.position = DVec2::new(1.5, 0.0);

        let id_a = bodies.insert(a);
        let id_b = bodies.insert(b);

        let mut cache = ManifoldCache::new();
        cache.refresh(&bodies, &[(id_a, id_b)]);
        cache.get_mut(id_a, id_b).unwrap().points[0].normal_impulse = 3.0;

        if let Some(mut body_b) = bodies.get_mut(id_b) {
            body_b.transform.position.x -= 0.01;
        }

        cache.refresh(&bodies, &[(id_a, id_b)]);
        let manifold = cache.get(id_a, id_b).unwrap();
        assert!((manifold.points[0].normal_impulse - 3.0).abs() < 1e-9);
    }
}
