use std::collections::VecDeque;

use glam::DVec2;

use super::rigidbody::{BodyKind, RigidBody};
use super::shape::{CollisionFilter, ColliderShape};
use super::types::{MassProperties, Material, Transform2, Velocity2};
use crate::utils::allocator::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyFlags {
    pub kind: BodyKind,
    pub is_awake: bool,
}

/// Structure-of-Arrays storage for bodies, replacing `Arena<RigidBody>` for
/// cache locality. Validity of a slot is tracked purely via `generations`;
/// freed slots keep stale data rather than being wrapped in `Option`.
#[derive(Default)]
pub struct BodiesSoA {
    pub generations: Vec<u32>,
    pub free_list: VecDeque<usize>,

    pub ids: Vec<EntityId>,
    pub transforms: Vec<Transform2>,
    pub velocities: Vec<Velocity2>,
    pub force_accums: Vec<DVec2>,
    pub torque_accums: Vec<f64>,

    pub shapes: Vec<ColliderShape>,
    pub inverse_masses: Vec<f64>,
    pub inverse_inertias: Vec<f64>,
    pub mass_properties: Vec<MassProperties>,

    pub materials: Vec<Material>,
    pub filters: Vec<CollisionFilter>,
    pub flags: Vec<BodyFlags>,
    pub sleep_times: Vec<f64>,
}

impl BodiesSoA {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: RigidBody) -> EntityId {
        if let Some(index) = self.free_list.pop_front() {
            let generation = self.generations[index];
            let id = EntityId::new(index, generation);
            self.write_at(index, id, body);
            id
        } else {
            let index = self.generations.len();
            self.generations.push(0);
            let id = EntityId::new(index, 0);
            self.push(id, body);
            id
        }
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        if !self.is_valid(id) {
            return false;
        }
        let index = id.index();
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_list.push_back(index);
        true
    }

    pub fn is_valid(&self, id: EntityId) -> bool {
        self.generations
            .get(id.index())
            .map(|&gen| gen == id.generation())
            .unwrap_or(false)
    }

    pub fn get(&self, id: EntityId) -> Option<BodyRef<'_>> {
        if self.is_valid(id) {
            Some(BodyRef {
                soa: self,
                index: id.index(),
            })
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<BodyMut<'_>> {
        if !self.is_valid(id) {
            return None;
        }
        let i = id.index();
        Some(BodyMut {
            id,
            transform: &mut self.transforms[i],
            velocity: &mut self.velocities[i],
            force_accum: &mut self.force_accums[i],
            torque_accum: &mut self.torque_accums[i],
            inverse_mass: &mut self.inverse_masses[i],
            inverse_inertia: &mut self.inverse_inertias[i],
            mass_properties: &mut self.mass_properties[i],
            material: &mut self.materials[i],
            filter: &mut self.filters[i],
            flags: &mut self.flags[i],
            sleep_time: &mut self.sleep_times[i],
        })
    }

    /// Disjoint mutable access to two bodies, needed by the solver to apply
    /// opposing impulses to both sides of a contact/joint in one borrow.
    pub fn get2_mut(&mut self, id_a: EntityId, id_b: EntityId) -> Option<(BodyMut<'_>, BodyMut<'_>)> {
        if id_a == id_b || !self.is_valid(id_a) || !self.is_valid(id_b) {
            return None;
        }

        let i_a = id_a.index();
        let i_b = id_b.index();

        // SAFETY: i_a != i_b (checked above), so the two BodyMuts below never
        // alias the same element of any column.
        unsafe {
            let ptr_trans = self.transforms.as_mut_ptr();
            let ptr_vel = self.velocities.as_mut_ptr();
            let ptr_force = self.force_accums.as_mut_ptr();
            let ptr_torque = self.torque_accums.as_mut_ptr();
            let ptr_im = self.inverse_masses.as_mut_ptr();
            let ptr_ii = self.inverse_inertias.as_mut_ptr();
            let ptr_mp = self.mass_properties.as_mut_ptr();
            let ptr_mat = self.materials.as_mut_ptr();
            let ptr_filter = self.filters.as_mut_ptr();
            let ptr_flags = self.flags.as_mut_ptr();
            let ptr_sleep = self.sleep_times.as_mut_ptr();

            let a = BodyMut {
                id: id_a,
                transform: &mut *ptr_trans.add(i_a),
                velocity: &mut *ptr_vel.add(i_a),
                force_accum: &mut *ptr_force.add(i_a),
                torque_accum: &mut *ptr_torque.add(i_a),
                inverse_mass: &mut *ptr_im.add(i_a),
                inverse_inertia: &mut *ptr_ii.add(i_a),
                mass_properties: &mut *ptr_mp.add(i_a),
                material: &mut *ptr_mat.add(i_a),
                filter: &mut *ptr_filter.add(i_a),
                flags: &mut *ptr_flags.add(i_a),
                sleep_time: &mut *ptr_sleep.add(i_a),
            };
            let b = BodyMut {
                id: id_b,
                transform: &mut *ptr_trans.add(i_b),
                velocity: &mut *ptr_vel.add(i_b),
                force_accum: &mut *ptr_force.add(i_b),
                torque_accum: &mut *ptr_torque.add(i_b),
                inverse_mass: &mut *ptr_im.add(i_b),
                inverse_inertia: &mut *ptr_ii.add(i_b),
                mass_properties: &mut *ptr_mp.add(i_b),
                material: &mut *ptr_mat.add(i_b),
                filter: &mut *ptr_filter.add(i_b),
                flags: &mut *ptr_flags.add(i_b),
                sleep_time: &mut *ptr_sleep.add(i_b),
            };
            Some((a, b))
        }
    }

    pub fn len(&self) -> usize {
        self.generations.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.generations
            .iter()
            .enumerate()
            .filter_map(|(idx, &gen)| {
                if self.ids[idx].generation() == gen {
                    Some(EntityId::new(idx, gen))
                } else {
                    None
                }
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = BodyRef<'_>> {
        self.ids().map(move |id| BodyRef {
            soa: self,
            index: id.index(),
        })
    }

    fn write_at(&mut self, index: usize, id: EntityId, body: RigidBody) {
        self.ids[index] = id;
        self.transforms[index] = body.transform;
        self.velocities[index] = body.velocity;
        self.force_accums[index] = body.force_accum;
        self.torque_accums[index] = body.torque_accum;
        self.shapes[index] = body.shape;
        self.inverse_masses[index] = body.inverse_mass;
        self.inverse_inertias[index] = body.inverse_inertia;
        self.mass_properties[index] = body.mass_properties;
        self.materials[index] = body.material;
        self.filters[index] = body.filter;
        self.flags[index] = BodyFlags {
            kind: body.kind,
            is_awake: body.is_awake,
        };
        self.sleep_times[index] = body.sleep_time;
    }

    fn push(&mut self, id: EntityId, body: RigidBody) {
        self.ids.push(id);
        self.transforms.push(body.transform);
        self.velocities.push(body.velocity);
        self.force_accums.push(body.force_accum);
        self.torque_accums.push(body.torque_accum);
        self.shapes.push(body.shape);
        self.inverse_masses.push(body.inverse_mass);
        self.inverse_inertias.push(body.inverse_inertia);
        self.mass_properties.push(body.mass_properties);
        self.materials.push(body.material);
        self.filters.push(body.filter);
        self.flags.push(BodyFlags {
            kind: body.kind,
            is_awake: body.is_awake,
        });
        self.sleep_times.push(body.sleep_time);
    }
}

/// Read-only proxy over one SoA slot.
pub struct BodyRef<'a> {
    soa: &'a BodiesSoA,
    index: usize,
}

impl<'a> BodyRef<'a> {
    pub fn id(&self) -> EntityId {
        self.soa.ids[self.index]
    }
    pub fn transform(&self) -> &Transform2 {
        &self.soa.transforms[self.index]
    }
    pub fn velocity(&self) -> &Velocity2 {
        &self.soa.velocities[self.index]
    }
    pub fn shape(&self) -> &ColliderShape {
        &self.soa.shapes[self.index]
    }
    pub fn material(&self) -> &Material {
        &self.soa.materials[self.index]
    }
    pub fn filter(&self) -> &CollisionFilter {
        &self.soa.filters[self.index]
    }
    pub fn inverse_mass(&self) -> f64 {
        self.soa.inverse_masses[self.index]
    }
    pub fn inverse_inertia(&self) -> f64 {
        self.soa.inverse_inertias[self.index]
    }
    pub fn kind(&self) -> BodyKind {
        self.soa.flags[self.index].kind
    }
    pub fn is_static(&self) -> bool {
        self.kind() == BodyKind::Static
    }
    pub fn is_awake(&self) -> bool {
        self.soa.flags[self.index].is_awake
    }
    pub fn sleep_time(&self) -> f64 {
        self.soa.sleep_times[self.index]
    }
}

/// Mutable proxy holding disjoint borrows into the SoA columns.
pub struct BodyMut<'a> {
    pub id: EntityId,
    pub transform: &'a mut Transform2,
    pub velocity: &'a mut Velocity2,
    pub force_accum: &'a mut DVec2,
    pub torque_accum: &'a mut f64,
    pub inverse_mass: &'a mut f64,
    pub inverse_inertia: &'a mut f64,
    pub mass_properties: &'a mut MassProperties,
    pub material: &'a mut Material,
    pub filter: &'a mut CollisionFilter,
    pub flags: &'a mut BodyFlags,
    pub sleep_time: &'a mut f64,
}

impl<'a> BodyMut<'a> {
    pub fn is_static(&self) -> bool {
        self.flags.kind == BodyKind::Static
    }
    pub fn is_dynamic(&self) -> bool {
        self.flags.kind == BodyKind::Dynamic
    }
    pub fn is_kinematic(&self) -> bool {
        self.flags.kind == BodyKind::Kinematic
    }

    pub fn apply_force(&mut self, force: DVec2) {
        if !self.is_dynamic() {
            return;
        }
        *self.force_accum += force;
        self.wake();
    }

    pub fn apply_impulse(&mut self, impulse: DVec2) {
        if !self.is_dynamic() {
            return;
        }
        self.velocity.linear += impulse * (*self.inverse_mass);
        self.wake();
    }

    /// Applies an impulse at a world-space point, producing the matching
    /// angular impulse via the 2D cross product of the moment arm.
    pub fn apply_impulse_at(&mut self, impulse: DVec2, world_point: DVec2) {
        if !self.is_dynamic() {
            return;
        }
        self.velocity.linear += impulse * (*self.inverse_mass);
        let r = world_point - self.transform.position;
        self.velocity.angular += (*self.inverse_inertia) * r.perp_dot(impulse);
        self.wake();
    }

    pub fn wake(&mut self) {
        self.flags.is_awake = true;
        *self.sleep_time = 0.0;
    }
}
