//! Island detection and sleeping.
//!
//! Two redesigns versus the teacher's instantaneous single-frame sleep check:
//! a body must stay under the velocity thresholds for a *continuous*
//! `sleep_time_threshold` duration before its island sleeps (§4.8), and
//! adjacency is built from both contacts *and* joints, not contacts alone
//! (§4.6 step 4).

use std::collections::HashMap;

use glam::DVec2;

use crate::collision::contact::ManifoldCache;
use crate::config::WorldConfig;
use crate::core::constraints::Joint;
use crate::core::soa::BodiesSoA;
use crate::utils::allocator::{Arena, EntityId};

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

#[derive(Default)]
pub struct IslandManager;

impl IslandManager {
    pub fn new() -> Self {
        Self
    }

    /// Recomputes sleep timers and island sleep state for every dynamic body,
    /// returning the number of islands still awake after the update.
    /// Only dynamic bodies participate in union-find merging; static and
    /// kinematic bodies anchor contacts/joints without linking two otherwise
    /// unrelated dynamic islands together.
    pub fn update(
        &mut self,
        bodies: &mut BodiesSoA,
        manifolds: &ManifoldCache,
        joints: &Arena<Joint>,
        config: &WorldConfig,
        h: f64,
    ) -> usize {
        let dynamic_ids: Vec<EntityId> = bodies.iter().filter(|b| !b.is_static()).map(|b| b.id()).collect();
        if dynamic_ids.is_empty() {
            return 0;
        }

        let mut index_of: HashMap<EntityId, usize> = HashMap::with_capacity(dynamic_ids.len());
        for (i, id) in dynamic_ids.iter().enumerate() {
            index_of.insert(*id, i);
        }

        let mut uf = UnionFind::new(dynamic_ids.len());
        let link = |a: EntityId, b: EntityId, uf: &mut UnionFind| {
            if let (Some(&ia), Some(&ib)) = (index_of.get(&a), index_of.get(&b)) {
                uf.union(ia, ib);
            }
        };
        for manifold in manifolds.iter() {
            link(manifold.body_a, manifold.body_b, &mut uf);
        }
        for joint in joints.iter() {
            let (a, b) = joint.bodies();
            link(a, b, &mut uf);
        }

        // Snapshot current state so root-group aggregation can be computed
        // before any per-body field is mutated.
        let snapshot: Vec<(bool, DVec2, f64, f64)> = dynamic_ids
            .iter()
            .map(|id| {
                let body = bodies.get(*id).expect("dynamic id must be valid");
                (body.is_awake(), body.velocity().linear, body.velocity().angular, body.sleep_time())
            })
            .collect();

        let mut root_awake: HashMap<usize, bool> = HashMap::new();
        for i in 0..dynamic_ids.len() {
            let root = uf.find(i);
            let awake = snapshot[i].0;
            root_awake.entry(root).or_insert(false);
            if awake {
                *root_awake.get_mut(&root).unwrap() = true;
            }
        }

        // Update each awake body's own continuous quiescence timer.
        let mut updated_sleep_time = vec![0.0; dynamic_ids.len()];
        for i in 0..dynamic_ids.len() {
            let root = uf.find(i);
            let island_awake = root_awake[&root];
            let (was_awake, linear, angular, sleep_time) = snapshot[i];
            updated_sleep_time[i] = if !island_awake {
                sleep_time
            } else if linear.length_squared() < config.sleep_linear_threshold * config.sleep_linear_threshold
                && angular.abs() < config.sleep_angular_threshold
            {
                sleep_time + h
            } else {
                0.0
            };
            let _ = was_awake;
        }

        let mut root_ready: HashMap<usize, bool> = HashMap::new();
        for i in 0..dynamic_ids.len() {
            let root = uf.find(i);
            if !root_awake[&root] {
                continue;
            }
            let ready = updated_sleep_time[i] >= config.sleep_time_threshold;
            let entry = root_ready.entry(root).or_insert(true);
            *entry &= ready;
        }

        for (i, id) in dynamic_ids.iter().enumerate() {
            let root = uf.find(i);
            let island_awake = root_awake[&root];
            if let Some(mut body) = bodies.get_mut(*id) {
                if !island_awake {
                    continue;
                }
                *body.sleep_time = updated_sleep_time[i];
                body.flags.is_awake = true;
                if root_ready.get(&root).copied().unwrap_or(false) {
                    body.flags.is_awake = false;
                    body.velocity.linear = DVec2::ZERO;
                    body.velocity.angular = 0.0;
                }
            }
        }

        root_awake
            .iter()
            .filter(|(root, &awake)| awake && !root_ready.get(root).copied().unwrap_or(false))
            .count()
    }
}
