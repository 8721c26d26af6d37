//! Per-shard rigid-body simulations and the table that owns them.

use std::collections::{BTreeMap, HashMap};

use rapier3d::prelude::*;

use stardeck_core::components::Size;
use stardeck_core::entity::EntityId;

/// One shard's rigid-body simulation, in shard-local km.
pub struct RigidBodyWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl RigidBodyWorld {
    pub fn new() -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Advance the simulation by `dt` seconds. No gravity.
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        self.params.dt = dt as Real;
        self.pipeline.step(
            &vector![0.0, 0.0, 0.0],
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    pub fn insert(&mut self, body: RigidBody, collider: Collider) -> RigidBodyHandle {
        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    pub fn remove(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl Default for RigidBodyWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Where an entity's rigid body lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLink {
    pub world: EntityId,
    pub handle: RigidBodyHandle,
    /// Planets and stars: placed once, never driven or copied back.
    pub fixed: bool,
}

/// Every shard's rigid-body simulation, keyed by physics-world entity, plus
/// the entity → body links and cached ship collider shapes.
#[derive(Default)]
pub struct ShardTable {
    worlds: BTreeMap<EntityId, RigidBodyWorld>,
    links: BTreeMap<EntityId, BodyLink>,
    shapes: HashMap<[u64; 3], SharedShape>,
}

impl ShardTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_world(&mut self, id: EntityId, world: RigidBodyWorld) {
        self.worlds.insert(id, world);
    }

    pub fn has_world(&self, id: EntityId) -> bool {
        self.worlds.contains_key(&id)
    }

    pub fn world(&self, id: EntityId) -> Option<&RigidBodyWorld> {
        self.worlds.get(&id)
    }

    pub fn world_mut(&mut self, id: EntityId) -> Option<&mut RigidBodyWorld> {
        self.worlds.get_mut(&id)
    }

    /// Drop a shard and forget every body that lived in it.
    pub fn remove_world(&mut self, id: EntityId) -> bool {
        self.links.retain(|_, link| link.world != id);
        self.worlds.remove(&id).is_some()
    }

    pub fn world_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.worlds.keys().copied()
    }

    pub fn world_count(&self) -> usize {
        self.worlds.len()
    }

    pub fn body_of(&self, entity: EntityId) -> Option<BodyLink> {
        self.links.get(&entity).copied()
    }

    pub fn links(&self) -> impl Iterator<Item = (EntityId, BodyLink)> + '_ {
        self.links.iter().map(|(&id, &link)| (id, link))
    }

    /// Bodies linked into `world`.
    pub fn body_count(&self, world: EntityId) -> usize {
        self.worlds.get(&world).map_or(0, RigidBodyWorld::body_count)
    }

    /// Insert a body for `entity` into `world`. Returns `None` if the world
    /// does not exist.
    pub fn attach(
        &mut self,
        entity: EntityId,
        world: EntityId,
        body: RigidBody,
        collider: Collider,
    ) -> Option<BodyLink> {
        self.detach(entity);
        let fixed = body.is_fixed();
        let handle = self.worlds.get_mut(&world)?.insert(body, collider);
        let link = BodyLink {
            world,
            handle,
            fixed,
        };
        self.links.insert(entity, link);
        Some(link)
    }

    /// Remove an entity's body, if it has one.
    pub fn detach(&mut self, entity: EntityId) -> bool {
        let Some(link) = self.links.remove(&entity) else {
            return false;
        };
        if let Some(world) = self.worlds.get_mut(&link.world) {
            world.remove(link.handle);
        }
        true
    }

    pub fn rigid_body(&self, entity: EntityId) -> Option<&RigidBody> {
        let link = self.links.get(&entity)?;
        self.worlds.get(&link.world)?.bodies.get(link.handle)
    }

    pub fn rigid_body_mut(&mut self, entity: EntityId) -> Option<&mut RigidBody> {
        let link = self.links.get(&entity)?;
        self.worlds.get_mut(&link.world)?.bodies.get_mut(link.handle)
    }

    /// Cuboid collider shape for a hull, shared between ships of equal size.
    pub fn ship_shape(&mut self, size: &Size) -> SharedShape {
        let key = [
            size.width.to_bits(),
            size.height.to_bits(),
            size.length.to_bits(),
        ];
        self.shapes
            .entry(key)
            .or_insert_with(|| {
                let half = |extent: f64| (extent.abs() * 0.5).max(1e-3) as Real;
                SharedShape::cuboid(half(size.width), half(size.height), half(size.length))
            })
            .clone()
    }

    pub fn cached_shape_count(&self) -> usize {
        self.shapes.len()
    }
}
