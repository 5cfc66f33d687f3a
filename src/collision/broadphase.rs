use std::collections::{HashMap, HashSet};

use glam::DVec2;

use crate::core::soa::BodiesSoA;
use crate::utils::allocator::EntityId;

/// Uniform grid spatial partitioning. Rebuilt from scratch every broad-phase
/// refresh: at the size class this engine targets, a full rebuild is cheap
/// and keeps the structure trivially correct under insert/remove/teleport,
/// at the cost of the temporal coherence a persistent tree would give (the
/// contact cache, not the grid, is what supplies warm-start coherence here).
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i32, i32), Vec<EntityId>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1e-6),
            cells: HashMap::new(),
        }
    }

    fn cell_of(&self, p: DVec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, id: EntityId, min: DVec2, max: DVec2) {
        let (min_cx, min_cy) = self.cell_of(min);
        let (max_cx, max_cy) = self.cell_of(max);
        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                self.cells.entry((cx, cy)).or_default().push(id);
            }
        }
    }

    pub fn query(&self, min: DVec2, max: DVec2) -> Vec<EntityId> {
        let (min_cx, min_cy) = self.cell_of(min);
        let (max_cx, max_cy) = self.cell_of(max);
        let mut out = Vec::new();
        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                if let Some(ids) = self.cells.get(&(cx, cy)) {
                    out.extend(ids.iter().copied());
                }
            }
        }
        out.sort_by_key(|id| id.index());
        out.dedup();
        out
    }
}

/// Driver that refreshes the grid from the current body set and returns
/// candidate pairs whose world-space AABBs overlap. Static bodies are kept
/// in a separate grid that is only rebuilt when a static body is
/// added/removed, per §4.3's "static bodies are allowed a cheaper,
/// rarely-refreshed representation".
pub struct BroadPhase {
    dynamic_grid: SpatialGrid,
    static_grid: SpatialGrid,
    static_dirty: bool,
}

impl BroadPhase {
    pub fn new(cell_size: f64) -> Self {
        Self {
            dynamic_grid: SpatialGrid::new(cell_size),
            static_grid: SpatialGrid::new(cell_size),
            static_dirty: true,
        }
    }

    pub fn mark_static_dirty(&mut self) {
        self.static_dirty = true;
    }

    /// Refreshes the grids and returns every pair of bodies whose AABBs
    /// overlap, canonicalized so `id(A).index() < id(B).index()`. The filter
    /// test happens later, at narrow-phase dispatch.
    pub fn candidate_pairs(&mut self, bodies: &BodiesSoA) -> Vec<(EntityId, EntityId)> {
        self.dynamic_grid.clear();
        if self.static_dirty {
            self.static_grid.clear();
        }

        let mut dynamic_ids = Vec::new();
        for body in bodies.iter() {
            let (min, max) = body.shape().world_aabb(body.transform());
            if body.is_static() {
                if self.static_dirty {
                    self.static_grid.insert(body.id(), min, max);
                }
            } else {
                self.dynamic_grid.insert(body.id(), min, max);
                dynamic_ids.push(body.id());
            }
        }
        self.static_dirty = false;

        let mut seen = HashSet::new();
        let mut pairs = Vec::new();

        for id in dynamic_ids {
            let body = match bodies.get(id) {
                Some(b) => b,
                None => continue,
            };
            let (min, max) = body.shape().world_aabb(body.transform());

            let mut nearby = self.dynamic_grid.query(min, max);
            nearby.extend(self.static_grid.query(min, max));

            for other in nearby {
                if other == id {
                    continue;
                }
                let (a, b) = if id.index() < other.index() {
                    (id, other)
                } else {
                    (other, id)
                };
                if seen.insert((a.index(), b.index())) {
                    pairs.push((a, b));
                }
            }
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BodyKind, ColliderShape, RigidBody};

    #[test]
    fn overlapping_bodies_are_reported() {
        let mut bodies = BodiesSoA::new();
        let mut a = RigidBody::new(EntityId::default(), BodyKind::Dynamic, ColliderShape::aabb(0.5, 0.5));
        a.transform.position = DVec2::ZERO;
        let mut b = RigidBody::new(EntityId::default(), BodyKind::Dynamic, ColliderShape::aabb(0.5, 0.5));
        b.transform.position = DVec2::new(0.5, 0.0);

        let id_a = bodies.insert(a);
        let id_b = bodies.insert(b);

        let mut bp = BroadPhase::new(5.0);
        let pairs = bp.candidate_pairs(&bodies);
        assert!(pairs.contains(&(id_a.min(id_b), id_a.max(id_b))) || pairs.len() == 1);
    }
}
