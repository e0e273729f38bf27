//! The component store.
//!
//! A table of tables: one sparse [`Storage`] per component kind, each keyed
//! by [`Entity`]. The store exclusively owns every component; systems
//! borrow for the duration of one pass.
//!
//! Multi-kind views are intersections computed by [`join`], a merge over
//! two entity-ordered storages, so a pass only visits entities that carry
//! every requested kind.

use crate::components::{
    AlarmResponse, Alarmable, ComponentKind, HeatExchanger, HumanFactors, Pid, Pipe, Pump,
    SiteKpi, Tank, ValveActuator,
};
use crate::entity::{Entity, EntityAllocator};
use crate::error::CoreError;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::iter::Peekable;

/// Sparse storage for one component kind, ordered by entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Storage<T> {
    items: BTreeMap<Entity, T>,
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T> Storage<T> {
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.items.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.items.get_mut(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.items.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates `(entity, component)` in entity order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.items.iter().map(|(entity, item)| (*entity, item))
    }

    /// Iterates `(entity, component)` mutably in entity order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.items.iter_mut().map(|(entity, item)| (*entity, item))
    }

    /// First owner in entity order.
    pub fn first(&self) -> Option<(Entity, &T)> {
        self.iter().next()
    }

    pub(crate) fn insert(&mut self, entity: Entity, item: T) -> Option<T> {
        self.items.insert(entity, item)
    }

    pub(crate) fn remove(&mut self, entity: Entity) -> Option<T> {
        self.items.remove(&entity)
    }
}

/// Merge-join of two entity-ordered iterators.
pub struct Join<A: Iterator, B: Iterator> {
    left: Peekable<A>,
    right: Peekable<B>,
}

impl<A, B, X, Y> Iterator for Join<A, B>
where
    A: Iterator<Item = (Entity, X)>,
    B: Iterator<Item = (Entity, Y)>,
{
    type Item = (Entity, X, Y);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let left = self.left.peek()?.0;
            let right = self.right.peek()?.0;
            match left.cmp(&right) {
                Ordering::Less => {
                    self.left.next();
                }
                Ordering::Greater => {
                    self.right.next();
                }
                Ordering::Equal => {
                    let (entity, x) = self.left.next()?;
                    let (_, y) = self.right.next()?;
                    return Some((entity, x, y));
                }
            }
        }
    }
}

/// Yields only the entities present in both inputs.
///
/// Both inputs must be in ascending entity order, which every
/// `Storage::iter`/`iter_mut` guarantees. Mixing shared and mutable
/// iterators over *different* storages is fine.
pub fn join<A, B, X, Y>(left: A, right: B) -> Join<A::IntoIter, B::IntoIter>
where
    A: IntoIterator<Item = (Entity, X)>,
    B: IntoIterator<Item = (Entity, Y)>,
{
    Join {
        left: left.into_iter().peekable(),
        right: right.into_iter().peekable(),
    }
}

/// A type that can be stored in the [`Registry`].
pub trait Component: Sized + 'static {
    /// Kind tag of this component type.
    const KIND: ComponentKind;

    fn storage(registry: &Registry) -> &Storage<Self>;

    fn storage_mut(registry: &mut Registry) -> &mut Storage<Self>;
}

macro_rules! impl_component {
    ($ty:ty, $field:ident, $kind:expr) => {
        impl Component for $ty {
            const KIND: ComponentKind = $kind;

            fn storage(registry: &Registry) -> &Storage<Self> {
                &registry.$field
            }

            fn storage_mut(registry: &mut Registry) -> &mut Storage<Self> {
                &mut registry.$field
            }
        }
    };
}

impl_component!(Pump, pumps, ComponentKind::Pump);
impl_component!(ValveActuator, valves, ComponentKind::ValveActuator);
impl_component!(Tank, tanks, ComponentKind::Tank);
impl_component!(Pipe, pipes, ComponentKind::Pipe);
impl_component!(Pid, pids, ComponentKind::Pid);
impl_component!(Alarmable, alarms, ComponentKind::Alarmable);
impl_component!(HeatExchanger, heat_exchangers, ComponentKind::HeatExchanger);
impl_component!(HumanFactors, human_factors, ComponentKind::HumanFactors);
impl_component!(AlarmResponse, responses, ComponentKind::AlarmResponse);
impl_component!(SiteKpi, site_kpis, ComponentKind::SiteKpi);

/// Entity/component store for the whole plant.
///
/// Cloning yields a complete, independent snapshot of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    entities: EntityAllocator,
    pub(crate) pumps: Storage<Pump>,
    pub(crate) valves: Storage<ValveActuator>,
    pub(crate) tanks: Storage<Tank>,
    pub(crate) pipes: Storage<Pipe>,
    pub(crate) pids: Storage<Pid>,
    pub(crate) alarms: Storage<Alarmable>,
    pub(crate) heat_exchangers: Storage<HeatExchanger>,
    pub(crate) human_factors: Storage<HumanFactors>,
    pub(crate) responses: Storage<AlarmResponse>,
    pub(crate) site_kpis: Storage<SiteKpi>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new entity with no components.
    pub fn create(&mut self) -> Entity {
        self.entities.allocate()
    }

    /// Destroys an entity and drops all of its components.
    ///
    /// Returns false if the handle was already dead.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.entities.free(entity) {
            return false;
        }
        self.pumps.remove(entity);
        self.valves.remove(entity);
        self.tanks.remove(entity);
        self.pipes.remove(entity);
        self.pids.remove(entity);
        self.alarms.remove(entity);
        self.heat_exchangers.remove(entity);
        self.human_factors.remove(entity);
        self.responses.remove(entity);
        self.site_kpis.remove(entity);
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.live_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates live entities in index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    /// Attaches (or replaces) a component, returning the previous one.
    pub fn insert<T: Component>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<Option<T>, CoreError> {
        if !self.is_alive(entity) {
            return Err(CoreError::DeadEntity(entity));
        }
        Ok(T::storage_mut(self).insert(entity, component))
    }

    /// Creates an entity and attaches one component to it.
    pub fn spawn<T: Component>(&mut self, component: T) -> Entity {
        let entity = self.create();
        T::storage_mut(self).insert(entity, component);
        entity
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        T::storage(self).contains(entity)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        T::storage(self).get(entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        T::storage_mut(self).get_mut(entity)
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        T::storage_mut(self).remove(entity)
    }

    /// Read-only iteration over every entity carrying `T`.
    pub fn view<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        T::storage(self).iter()
    }

    pub fn count<T: Component>(&self) -> usize {
        T::storage(self).len()
    }

    /// The site-scope owner of `T`, if any.
    ///
    /// Zero-or-one cardinality is expected; with several owners the first in
    /// entity order wins.
    pub fn unique<T: Component>(&self) -> Option<Entity> {
        T::storage(self).first().map(|(entity, _)| entity)
    }

    /// Kinds attached to an entity, in declaration order.
    pub fn kinds_of(&self, entity: Entity) -> Vec<ComponentKind> {
        let present = [
            self.pumps.contains(entity),
            self.valves.contains(entity),
            self.tanks.contains(entity),
            self.pipes.contains(entity),
            self.pids.contains(entity),
            self.alarms.contains(entity),
            self.heat_exchangers.contains(entity),
            self.human_factors.contains(entity),
            self.responses.contains(entity),
            self.site_kpis.contains(entity),
        ];
        ComponentKind::all()
            .into_iter()
            .zip(present)
            .filter_map(|(kind, has)| has.then_some(kind))
            .collect()
    }
}
