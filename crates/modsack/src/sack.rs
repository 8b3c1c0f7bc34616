use std::rc::Rc;

use crate::error::{Result, SackError};
use crate::handle::{AliasHandle, HandleGuard, OwningHandle};
use crate::id_set::{IdSet, UnitId};
use crate::query::Query;

/// Owns the canonical collection of units for one generation.
///
/// Unit ids are dense indexes into the collection and are only meaningful
/// within the generation they came from: [`Sack::rebuild`] replaces the
/// collection wholesale and invalidates every outstanding query and handle
/// through the sack's guard.
///
/// Two overlay sets bias what [`Sack::new_query`] returns without touching
/// the canonical collection: `includes` narrows (only when `use_includes`
/// is on), `excludes` always prunes last. The overlays may reference ids
/// not currently present.
#[derive(Debug)]
pub struct Sack<T> {
    units: Rc<Vec<T>>,
    guard: HandleGuard,
    includes: IdSet,
    excludes: IdSet,
    use_includes: bool,
}

impl<T> Sack<T> {
    pub fn new() -> Self {
        Self::with_units(Vec::new())
    }

    pub fn with_units(units: Vec<T>) -> Self {
        let capacity = units.len() as u32;
        Self {
            units: Rc::new(units),
            guard: HandleGuard::new(),
            includes: IdSet::new(capacity),
            excludes: IdSet::new(capacity),
            use_includes: false,
        }
    }

    /// Replace the canonical collection with a new generation.
    ///
    /// Every query and handle into the previous generation is invalidated;
    /// the overlays are reset to the new capacity, since their bits indexed
    /// the old generation.
    pub fn rebuild(&mut self, units: Vec<T>) {
        self.guard.clear();
        let capacity = units.len() as u32;
        self.units = Rc::new(units);
        self.includes = IdSet::new(capacity);
        self.excludes = IdSet::new(capacity);
        log::debug!("rebuilt sack with {} units", capacity);
    }

    /// Upper bound on unit ids in this generation.
    pub fn capacity(&self) -> u32 {
        self.units.len() as u32
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit(&self, id: UnitId) -> Option<&T> {
        self.units.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &T)> {
        self.units
            .iter()
            .enumerate()
            .map(|(id, unit)| (id as UnitId, unit))
    }

    /// Build a query view over the current generation.
    ///
    /// The view starts from the canonical set, is narrowed to `includes`
    /// when `use_includes` is on, and then always has `excludes` removed —
    /// in that fixed order, so an id present in both overlays ends up
    /// excluded.
    pub fn new_query(&self) -> Query<T> {
        let mut matches = IdSet::full(self.capacity());
        if self.use_includes {
            matches.intersect_with(&self.includes);
        }
        matches.difference_from(&self.excludes);
        Query::new(
            AliasHandle::new(Rc::clone(&self.units), &self.guard),
            matches,
        )
    }

    // INCLUDES

    pub fn includes(&self) -> &IdSet {
        &self.includes
    }

    pub fn add_includes(&mut self, value: &IdSet) {
        self.includes.union_with(value);
    }

    pub fn remove_includes(&mut self, value: &IdSet) {
        self.includes.difference_from(value);
    }

    pub fn set_includes(&mut self, value: &IdSet) {
        self.includes.clear();
        self.includes.union_with(value);
    }

    pub fn use_includes(&self) -> bool {
        self.use_includes
    }

    pub fn set_use_includes(&mut self, value: bool) {
        self.use_includes = value;
    }

    // EXCLUDES

    pub fn excludes(&self) -> &IdSet {
        &self.excludes
    }

    pub fn add_excludes(&mut self, value: &IdSet) {
        self.excludes.union_with(value);
    }

    pub fn remove_excludes(&mut self, value: &IdSet) {
        self.excludes.difference_from(value);
    }

    pub fn set_excludes(&mut self, value: &IdSet) {
        self.excludes.clear();
        self.excludes.union_with(value);
    }

    /// A handle carrying a private copy of one unit, vouched for by this
    /// generation's guard.
    pub fn owning_unit(&self, id: UnitId) -> Result<OwningHandle<T>>
    where
        T: Clone,
    {
        let unit = self.unit(id).ok_or(SackError::IdOutOfRange {
            id,
            capacity: self.capacity(),
        })?;
        Ok(OwningHandle::new(unit.clone(), &self.guard))
    }

    /// The guard vouching for this generation. Callers holding their own
    /// long-lived references into the sack register them here.
    pub fn guard(&self) -> &HandleGuard {
        &self.guard
    }
}

impl<T> Default for Sack<T> {
    fn default() -> Self {
        Self::new()
    }
}
