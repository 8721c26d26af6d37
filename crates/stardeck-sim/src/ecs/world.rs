//! The entity registry: allocator, component columns, component cache and
//! the dirty/removed queues the scheduler drains each tick.

use std::collections::{BTreeSet, HashMap};

use log::{debug, warn};
use serde_json::{Map, Value};

use stardeck_core::components::{ShipSystemLink, ShipSystems};
use stardeck_core::entity::{EntityAllocator, EntityId};
use stardeck_core::enums::ComponentKind;
use stardeck_core::error::EcsError;

use super::store::{Component, ComponentStore};

/// Entity registry and component storage.
///
/// All presence changes go through `add_component`, `update_component`,
/// `merge_component_json` and `remove_component`, which keep the component
/// cache current and queue the entity for a membership re-test. Mutating a
/// component in place through `get_mut` changes no memberships.
#[derive(Debug, Default)]
pub struct Ecs {
    allocator: EntityAllocator,
    /// Live id per slot.
    slots: Vec<Option<EntityId>>,
    store: ComponentStore,
    cache: HashMap<ComponentKind, BTreeSet<EntityId>>,
    /// Bumped on every write or presence change of a kind.
    versions: HashMap<ComponentKind, u64>,
    dirty: Vec<EntityId>,
    dirty_flags: Vec<bool>,
    removed: Vec<EntityId>,
}

impl Ecs {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Lifecycle ---

    pub fn create_entity(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        let slot = id.slot();
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, None);
            self.dirty_flags.resize(slot + 1, false);
            self.store.grow_to(slot + 1);
        }
        self.slots[slot] = Some(id);
        self.mark_dirty(id);
        id
    }

    /// Create an entity and attach components fluently.
    pub fn add_entity(&mut self) -> EntityBuilder<'_> {
        let id = self.create_entity();
        EntityBuilder { ecs: self, id }
    }

    /// Destroy an entity. Subsystem links pointing at it are dropped from
    /// their ship.
    pub fn remove_entity_by_id(&mut self, id: EntityId) -> Result<(), EcsError> {
        self.check(id)?;
        let slot = id.slot();
        for kind in ComponentKind::ALL {
            if self.store.has(slot, kind) {
                if let Some(set) = self.cache.get_mut(&kind) {
                    set.remove(&id);
                }
                self.bump(kind);
            }
        }
        self.store.clear_slot(slot);
        self.slots[slot] = None;
        self.dirty_flags[slot] = false;
        self.allocator.deallocate(id);
        self.removed.push(id);

        if let Some(ship) = self.ship_of(id) {
            self.unlink_ship_system(ship, id);
        }
        debug!("removed entity {id}");
        Ok(())
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots.get(id.slot()).copied().flatten() == Some(id)
    }

    pub fn entity_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }

    pub fn get_entity_by_id(&self, id: EntityId) -> Option<EntityView<'_>> {
        self.is_alive(id).then_some(EntityView { ecs: self, id })
    }

    // --- Components ---

    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        if !self.is_alive(id) {
            return None;
        }
        T::column(&self.store).get(id.slot())?.as_ref()
    }

    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        if !self.is_alive(id) {
            return None;
        }
        T::column_mut(&mut self.store).get_mut(id.slot())?.as_mut()
    }

    pub fn has(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.is_alive(id) && self.store.has(id.slot(), kind)
    }

    /// Attach or replace a component.
    pub fn add_component<T: Component>(&mut self, id: EntityId, component: T) -> Result<(), EcsError> {
        self.check(id)?;
        let cell = &mut T::column_mut(&mut self.store)[id.slot()];
        let created = cell.is_none();
        *cell = Some(component);
        if created {
            self.on_added(id, T::KIND);
        }
        self.after_write(id, T::KIND);
        Ok(())
    }

    /// Apply `f` to a component, creating it with its default first if absent.
    pub fn update_component<T: Component>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut T),
    ) -> Result<(), EcsError> {
        self.check(id)?;
        let cell = &mut T::column_mut(&mut self.store)[id.slot()];
        let created = cell.is_none();
        f(cell.get_or_insert_with(T::default));
        if created {
            self.on_added(id, T::KIND);
        }
        self.after_write(id, T::KIND);
        Ok(())
    }

    /// Shallow per-key merge of a JSON object into a component by kind.
    pub fn merge_component_json(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
        data: &Value,
    ) -> Result<(), EcsError> {
        self.check(id)?;
        let patch: Map<String, Value> = serde_json::from_value(data.clone())?;
        if self.store.merge_json(id.slot(), kind, &patch)? {
            self.on_added(id, kind);
        }
        self.after_write(id, kind);
        Ok(())
    }

    pub fn remove_component<T: Component>(&mut self, id: EntityId) -> Option<T> {
        if !self.is_alive(id) {
            return None;
        }
        let removed = T::column_mut(&mut self.store).get_mut(id.slot())?.take();
        if removed.is_some() {
            self.on_removed(id, T::KIND);
        }
        removed
    }

    /// Remove a component by kind. Returns whether it was present.
    pub fn remove_component_kind(&mut self, id: EntityId, kind: ComponentKind) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let removed = self.store.remove(id.slot(), kind);
        if removed {
            self.on_removed(id, kind);
        }
        removed
    }

    /// Component cache: entities holding `kind`, ordered by id.
    pub fn entities_with(&self, kind: ComponentKind) -> impl Iterator<Item = EntityId> + '_ {
        self.cache.get(&kind).into_iter().flatten().copied()
    }

    pub fn count_with(&self, kind: ComponentKind) -> usize {
        self.cache.get(&kind).map_or(0, BTreeSet::len)
    }

    /// Changes whenever a `kind` component is attached, written through
    /// this API, or removed. In-place `get_mut` edits do not count.
    pub fn kind_version(&self, kind: ComponentKind) -> u64 {
        self.versions.get(&kind).copied().unwrap_or(0)
    }

    // --- Ship subsystems ---

    /// Install `system` on `ship`. A subsystem belongs to at most one ship.
    pub fn link_ship_system(
        &mut self,
        ship: EntityId,
        system: EntityId,
        room: Option<String>,
    ) -> Result<(), EcsError> {
        self.check(ship)?;
        self.check(system)?;
        match self.ship_of(system) {
            Some(owner) if owner == ship => return Ok(()),
            Some(owner) => {
                return Err(EcsError::SystemAlreadyAssigned {
                    system,
                    ship: owner,
                })
            }
            None => {}
        }
        self.update_component::<ShipSystems>(ship, |systems| {
            systems.systems.push(ShipSystemLink { system, room });
        })?;
        // Subsystem memberships depend on their ship's components.
        self.mark_dirty(system);
        Ok(())
    }

    /// Returns whether a link was removed.
    pub fn unlink_ship_system(&mut self, ship: EntityId, system: EntityId) -> bool {
        let Some(systems) = self.get_mut::<ShipSystems>(ship) else {
            return false;
        };
        let before = systems.systems.len();
        systems.systems.retain(|link| link.system != system);
        let removed = systems.systems.len() != before;
        if removed && self.is_alive(system) {
            self.mark_dirty(system);
        }
        removed
    }

    /// Ship that has `system` installed, if any.
    pub fn ship_of(&self, system: EntityId) -> Option<EntityId> {
        self.entities_with(ComponentKind::ShipSystems).find(|&ship| {
            self.get::<ShipSystems>(ship)
                .is_some_and(|systems| systems.contains(system))
        })
    }

    /// Ship other than `ship` that has `system` installed.
    fn other_owner(&self, system: EntityId, ship: EntityId) -> Option<EntityId> {
        self.entities_with(ComponentKind::ShipSystems)
            .filter(|&other| other != ship)
            .find(|&other| {
                self.get::<ShipSystems>(other)
                    .is_some_and(|systems| systems.contains(system))
            })
    }

    /// Drop links on `ship` to subsystems another ship already owns, along
    /// with repeated links. The first owner keeps the subsystem.
    fn enforce_single_owner(&mut self, ship: EntityId) {
        let Some(systems) = self.get::<ShipSystems>(ship) else {
            return;
        };
        let mut seen = BTreeSet::new();
        let mut kept = Vec::with_capacity(systems.systems.len());
        for link in &systems.systems {
            if !seen.insert(link.system) {
                continue;
            }
            match self.other_owner(link.system, ship) {
                Some(owner) => warn!(
                    "dropped link from {ship} to {}, already installed on {owner}",
                    link.system
                ),
                None => kept.push(link.clone()),
            }
        }
        let ids: Vec<EntityId> = kept.iter().map(|link| link.system).collect();
        if let Some(systems) = self.get_mut::<ShipSystems>(ship) {
            systems.systems = kept;
        }
        for system in ids {
            if self.is_alive(system) {
                self.mark_dirty(system);
            }
        }
    }

    // --- Scheduler queues ---

    /// Queue an entity for a membership re-test. Idempotent within a tick.
    pub fn mark_dirty(&mut self, id: EntityId) {
        if let Some(flag) = self.dirty_flags.get_mut(id.slot()) {
            if !*flag {
                *flag = true;
                self.dirty.push(id);
            }
        }
    }

    pub(crate) fn take_dirty(&mut self) -> Vec<EntityId> {
        let dirty = std::mem::take(&mut self.dirty);
        for id in &dirty {
            if let Some(flag) = self.dirty_flags.get_mut(id.slot()) {
                *flag = false;
            }
        }
        dirty
    }

    pub(crate) fn take_removed(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.removed)
    }

    fn check(&self, id: EntityId) -> Result<(), EcsError> {
        if self.is_alive(id) {
            Ok(())
        } else {
            Err(EcsError::UnknownEntity(id))
        }
    }

    /// Invariants that every component write must uphold.
    fn after_write(&mut self, id: EntityId, kind: ComponentKind) {
        self.bump(kind);
        if kind == ComponentKind::ShipSystems {
            self.enforce_single_owner(id);
        }
    }

    fn bump(&mut self, kind: ComponentKind) {
        *self.versions.entry(kind).or_insert(0) += 1;
    }

    fn on_added(&mut self, id: EntityId, kind: ComponentKind) {
        self.cache.entry(kind).or_default().insert(id);
        self.mark_dirty(id);
    }

    fn on_removed(&mut self, id: EntityId, kind: ComponentKind) {
        if let Some(set) = self.cache.get_mut(&kind) {
            set.remove(&id);
        }
        self.bump(kind);
        self.mark_dirty(id);
    }
}

/// Fluent entity construction returned by [`Ecs::add_entity`].
pub struct EntityBuilder<'a> {
    ecs: &'a mut Ecs,
    id: EntityId,
}

impl EntityBuilder<'_> {
    pub fn with<T: Component>(self, component: T) -> Self {
        // The id was allocated by this builder and is alive.
        let _ = self.ecs.add_component(self.id, component);
        self
    }

    pub fn id(self) -> EntityId {
        self.id
    }
}

/// Read-only view of one live entity.
#[derive(Clone, Copy)]
pub struct EntityView<'a> {
    ecs: &'a Ecs,
    id: EntityId,
}

impl<'a> EntityView<'a> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn get<T: Component>(&self) -> Option<&'a T> {
        self.ecs.get::<T>(self.id)
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.ecs.has(self.id, kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + 'a {
        let (ecs, id) = (self.ecs, self.id);
        ComponentKind::ALL
            .into_iter()
            .filter(move |&kind| ecs.has(id, kind))
    }

    /// All components keyed by kind name.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        let mut out = Map::new();
        for kind in self.kinds() {
            if let Some(value) = self.ecs.store.to_json(self.id.slot(), kind) {
                out.insert(kind.to_string(), value?);
            }
        }
        Ok(Value::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardeck_core::components::*;
    use stardeck_core::types::Position;

    #[test]
    fn create_and_remove() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity();
        assert!(ecs.is_alive(e));
        assert_eq!(ecs.entity_count(), 1);

        ecs.remove_entity_by_id(e).unwrap();
        assert!(!ecs.is_alive(e));
        assert_eq!(ecs.entity_count(), 0);
        assert!(matches!(
            ecs.remove_entity_by_id(e),
            Err(EcsError::UnknownEntity(_))
        ));

        let reused = ecs.create_entity();
        assert_eq!(reused.index, e.index);
        assert!(!ecs.is_alive(e), "stale id must not alias the new entity");
    }

    #[test]
    fn component_cache_tracks_presence() {
        let mut ecs = Ecs::new();
        let a = ecs.add_entity().with(Mass::default()).id();
        let b = ecs.add_entity().with(Mass::default()).with(Size::default()).id();
        assert_eq!(ecs.entities_with(ComponentKind::Mass).collect::<Vec<_>>(), vec![a, b]);

        ecs.remove_component::<Mass>(a);
        assert_eq!(ecs.entities_with(ComponentKind::Mass).collect::<Vec<_>>(), vec![b]);

        ecs.remove_entity_by_id(b).unwrap();
        assert_eq!(ecs.count_with(ComponentKind::Mass), 0);
        assert_eq!(ecs.count_with(ComponentKind::Size), 0);
    }

    #[test]
    fn update_component_creates_default() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity();
        ecs.update_component::<ImpulseEngines>(e, |engines| engines.target_speed = 42.0)
            .unwrap();
        let engines = ecs.get::<ImpulseEngines>(e).unwrap();
        assert_eq!(engines.target_speed, 42.0);
        assert_eq!(engines.thrust, ImpulseEngines::default().thrust);
        assert!(ecs.has(e, ComponentKind::ImpulseEngines));
    }

    #[test]
    fn merge_json_rejects_non_objects() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity();
        let err = ecs.merge_component_json(e, ComponentKind::Mass, &Value::from(3.0));
        assert!(matches!(err, Err(EcsError::Json(_))));
        assert!(!ecs.has(e, ComponentKind::Mass));

        ecs.merge_component_json(e, ComponentKind::Mass, &serde_json::json!({ "mass": 7.0 }))
            .unwrap();
        assert_eq!(ecs.get::<Mass>(e).unwrap().mass, 7.0);
    }

    #[test]
    fn dirty_queue_is_idempotent() {
        let mut ecs = Ecs::new();
        let e = ecs.create_entity();
        ecs.add_component(e, Position::default()).unwrap();
        ecs.add_component(e, Velocity::default()).unwrap();
        ecs.mark_dirty(e);
        assert_eq!(ecs.take_dirty(), vec![e]);
        assert!(ecs.take_dirty().is_empty());

        // Replacing an existing component is not a presence change.
        ecs.add_component(e, Position::default()).unwrap();
        assert!(ecs.take_dirty().is_empty());
    }

    #[test]
    fn subsystem_belongs_to_one_ship() {
        let mut ecs = Ecs::new();
        let ship_a = ecs.add_entity().with(IsShip::default()).id();
        let ship_b = ecs.add_entity().with(IsShip::default()).id();
        let reactor = ecs.add_entity().with(Reactor::default()).id();

        ecs.link_ship_system(ship_a, reactor, Some("engineering".into()))
            .unwrap();
        ecs.link_ship_system(ship_a, reactor, None).unwrap();
        assert_eq!(ecs.get::<ShipSystems>(ship_a).unwrap().systems.len(), 1);

        let err = ecs.link_ship_system(ship_b, reactor, None);
        assert!(matches!(
            err,
            Err(EcsError::SystemAlreadyAssigned { ship, .. }) if ship == ship_a
        ));

        assert!(ecs.unlink_ship_system(ship_a, reactor));
        ecs.link_ship_system(ship_b, reactor, None).unwrap();
        assert_eq!(ecs.ship_of(reactor), Some(ship_b));

        ecs.remove_entity_by_id(reactor).unwrap();
        assert!(ecs.get::<ShipSystems>(ship_b).unwrap().systems.is_empty());
    }

    #[test]
    fn raw_writes_cannot_claim_an_owned_subsystem() {
        let mut ecs = Ecs::new();
        let ship_a = ecs.add_entity().with(IsShip::default()).id();
        let ship_b = ecs.add_entity().with(IsShip::default()).id();
        let reactor = ecs.add_entity().with(Reactor::default()).id();
        let battery = ecs.add_entity().with(Battery::default()).id();
        ecs.link_ship_system(ship_a, reactor, None).unwrap();

        let link = |system| ShipSystemLink { system, room: None };
        ecs.add_component(
            ship_b,
            ShipSystems {
                systems: vec![link(reactor), link(battery), link(battery)],
            },
        )
        .unwrap();
        let ids: Vec<_> = ecs.get::<ShipSystems>(ship_b).unwrap().ids().collect();
        assert_eq!(ids, vec![battery]);

        ecs.update_component::<ShipSystems>(ship_b, |systems| systems.systems.push(link(reactor)))
            .unwrap();
        assert!(!ecs.get::<ShipSystems>(ship_b).unwrap().contains(reactor));

        let patch = serde_json::json!({ "systems": [{ "system": reactor, "room": null }] });
        ecs.merge_component_json(ship_b, ComponentKind::ShipSystems, &patch)
            .unwrap();
        assert!(ecs.get::<ShipSystems>(ship_b).unwrap().systems.is_empty());
        assert_eq!(ecs.ship_of(reactor), Some(ship_a));
    }

    #[test]
    fn entity_view_serializes_components() {
        let mut ecs = Ecs::new();
        let e = ecs
            .add_entity()
            .with(IsShip { name: "Hermes".into() })
            .with(Mass { mass: 5.0 })
            .id();
        let view = ecs.get_entity_by_id(e).unwrap();
        assert_eq!(view.kinds().count(), 2);
        let json = view.to_json().unwrap();
        assert_eq!(json["IsShip"]["name"], "Hermes");
        assert_eq!(json["Mass"]["mass"], 5.0);
    }
}
