//! Component columns.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use stardeck_core::components::*;
use stardeck_core::enums::ComponentKind;
use stardeck_core::types::Position;

/// A type that lives in exactly one column of the [`ComponentStore`].
pub trait Component: Default + Serialize + DeserializeOwned + 'static {
    const KIND: ComponentKind;

    fn column(store: &ComponentStore) -> &Vec<Option<Self>>;
    fn column_mut(store: &mut ComponentStore) -> &mut Vec<Option<Self>>;
}

macro_rules! component_store {
    ($($field:ident: $ty:ty => $kind:ident),* $(,)?) => {
        /// One column per component type, indexed by entity slot.
        #[derive(Debug, Default)]
        pub struct ComponentStore {
            $(pub $field: Vec<Option<$ty>>,)*
        }

        impl ComponentStore {
            /// Grow every column to hold at least `len` slots.
            pub fn grow_to(&mut self, len: usize) {
                $(
                    if self.$field.len() < len {
                        self.$field.resize_with(len, || None);
                    }
                )*
            }

            /// Drop every component in a slot.
            pub fn clear_slot(&mut self, slot: usize) {
                $(
                    if let Some(cell) = self.$field.get_mut(slot) {
                        *cell = None;
                    }
                )*
            }

            pub fn has(&self, slot: usize, kind: ComponentKind) -> bool {
                match kind {
                    $(ComponentKind::$kind => {
                        self.$field.get(slot).is_some_and(Option::is_some)
                    })*
                }
            }

            /// Remove one component by kind. Returns whether it was present.
            pub fn remove(&mut self, slot: usize, kind: ComponentKind) -> bool {
                match kind {
                    $(ComponentKind::$kind => {
                        self.$field.get_mut(slot).and_then(Option::take).is_some()
                    })*
                }
            }

            pub fn to_json(
                &self,
                slot: usize,
                kind: ComponentKind,
            ) -> Option<Result<Value, serde_json::Error>> {
                match kind {
                    $(ComponentKind::$kind => self
                        .$field
                        .get(slot)
                        .and_then(Option::as_ref)
                        .map(serde_json::to_value),)*
                }
            }

            /// Shallow per-key merge of `patch` over the component in `slot`,
            /// starting from the type's default when absent. Returns true if
            /// the component was newly created.
            pub fn merge_json(
                &mut self,
                slot: usize,
                kind: ComponentKind,
                patch: &Map<String, Value>,
            ) -> Result<bool, serde_json::Error> {
                match kind {
                    $(ComponentKind::$kind => merge_into(&mut self.$field, slot, patch),)*
                }
            }
        }

        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$kind;

                fn column(store: &ComponentStore) -> &Vec<Option<Self>> {
                    &store.$field
                }

                fn column_mut(store: &mut ComponentStore) -> &mut Vec<Option<Self>> {
                    &mut store.$field
                }
            }
        )*
    };
}

component_store! {
    positions: Position => Position,
    velocities: Velocity => Velocity,
    rotations: Rotation => Rotation,
    rotation_velocities: RotationVelocity => RotationVelocity,
    masses: Mass => Mass,
    sizes: Size => Size,
    ships: IsShip => IsShip,
    planets: IsPlanet => IsPlanet,
    stars: IsStar => IsStar,
    torpedoes: IsTorpedo => IsTorpedo,
    solar_systems: SolarSystem => SolarSystem,
    powers: Power => Power,
    reactors: Reactor => Reactor,
    batteries: Battery => Battery,
    power_nodes: PowerNode => PowerNode,
    impulse_engines: ImpulseEngines => ImpulseEngines,
    warp_engines: WarpEngines => WarpEngines,
    thrusters: Thrusters => Thrusters,
    inertial_dampeners: InertialDampeners => InertialDampeners,
    physics_worlds: PhysicsWorld => PhysicsWorld,
    autopilots: Autopilot => Autopilot,
    ship_systems: ShipSystems => ShipSystems,
}

fn merge_into<T: Component>(
    column: &mut [Option<T>],
    slot: usize,
    patch: &Map<String, Value>,
) -> Result<bool, serde_json::Error> {
    let Some(cell) = column.get_mut(slot) else {
        return Ok(false);
    };
    let created = cell.is_none();
    let base = match cell.as_ref() {
        Some(existing) => serde_json::to_value(existing)?,
        None => serde_json::to_value(T::default())?,
    };
    let mut fields = match base {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    for (key, value) in patch {
        fields.insert(key.clone(), value.clone());
    }
    *cell = Some(serde_json::from_value(Value::Object(fields))?);
    Ok(created)
}
