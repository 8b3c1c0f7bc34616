use crate::error::{Result, SackError};
use crate::handle::AliasHandle;
use crate::id_set::{IdSet, Ids, UnitId};

/// Filtering seam for queries: anything that can judge a unit.
///
/// Closures of shape `Fn(&T) -> bool` implement it, so call sites can pass
/// ad hoc filters; external matchers (name, version, arch evaluation) plug
/// in by implementing the trait.
pub trait Predicate<T> {
    fn matches(&self, unit: &T) -> bool;
}

impl<T, F> Predicate<T> for F
where
    F: Fn(&T) -> bool,
{
    fn matches(&self, unit: &T) -> bool {
        self(unit)
    }
}

/// A snapshot view over one sack generation.
///
/// Holds the ids matching the filters applied so far plus a handle to the
/// generation's unit collection. Pure set reads (`len`, `contains`, `ids`)
/// keep working after the sack was rebuilt; anything resolving ids back to
/// units fails with [`SackError::InvalidHandle`] instead of reading stale
/// data. Subsequent sack mutation never updates an existing query.
#[derive(Debug)]
pub struct Query<T> {
    units: AliasHandle<Vec<T>>,
    matches: IdSet,
}

impl<T> Query<T> {
    pub(crate) fn new(units: AliasHandle<Vec<T>>, matches: IdSet) -> Self {
        Self { units, matches }
    }

    /// Whether this query's generation is still alive.
    pub fn is_valid(&self) -> bool {
        self.units.is_valid()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Membership test; an id outside the generation's range is simply not
    /// a member.
    pub fn contains(&self, id: UnitId) -> bool {
        self.matches.contains(id).unwrap_or(false)
    }

    /// Ascending iterator over the matching ids.
    pub fn ids(&self) -> Ids<'_> {
        self.matches.ids()
    }

    /// The matching ids as a plain set.
    pub fn as_set(&self) -> &IdSet {
        &self.matches
    }

    pub fn into_set(self) -> IdSet {
        self.matches
    }

    /// Resolve an id of this generation to its unit.
    pub fn unit(&self, id: UnitId) -> Result<&T> {
        let units = self.units.get()?;
        units.get(id as usize).ok_or(SackError::IdOutOfRange {
            id,
            capacity: units.len() as u32,
        })
    }

    /// Iterate the matching units together with their ids.
    pub fn iter(&self) -> Result<impl Iterator<Item = (UnitId, &T)>> {
        let units = self.units.get()?;
        Ok(self.matches.ids().map(move |id| (id, &units[id as usize])))
    }

    /// Narrow the match set to units accepted by `predicate`.
    pub fn filter<P>(&mut self, predicate: &P) -> Result<&mut Self>
    where
        P: Predicate<T> + ?Sized,
    {
        let units = self.units.get()?;
        let mut kept = IdSet::new(self.matches.capacity());
        for id in self.matches.ids() {
            if predicate.matches(&units[id as usize]) {
                kept.add_unchecked(id);
            }
        }
        self.matches = kept;
        Ok(self)
    }

    fn check_same_generation(&self, other: &Query<T>) -> Result<()> {
        if self.units != other.units {
            return Err(SackError::GenerationMismatch);
        }
        Ok(())
    }

    /// Union with another query of the same generation.
    pub fn union(&mut self, other: &Query<T>) -> Result<&mut Self> {
        self.check_same_generation(other)?;
        self.matches.union_with(&other.matches);
        Ok(self)
    }

    /// Intersection with another query of the same generation.
    pub fn intersect(&mut self, other: &Query<T>) -> Result<&mut Self> {
        self.check_same_generation(other)?;
        self.matches.intersect_with(&other.matches);
        Ok(self)
    }

    /// Difference with another query of the same generation.
    pub fn difference(&mut self, other: &Query<T>) -> Result<&mut Self> {
        self.check_same_generation(other)?;
        self.matches.difference_from(&other.matches);
        Ok(self)
    }

    // Ad hoc sets carry no generation tag; the caller vouches that the ids
    // were produced by this query's generation.

    pub fn union_set(&mut self, set: &IdSet) -> &mut Self {
        self.matches.union_with(set);
        self
    }

    pub fn intersect_set(&mut self, set: &IdSet) -> &mut Self {
        self.matches.intersect_with(set);
        self
    }

    pub fn difference_set(&mut self, set: &IdSet) -> &mut Self {
        self.matches.difference_from(set);
        self
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            units: self.units.clone(),
            matches: self.matches.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sack::Sack;

    fn sack_of_names() -> Sack<String> {
        Sack::with_units(
            ["alpha", "beta", "gamma", "beta-devel"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    fn ids<T>(query: &Query<T>) -> Vec<UnitId> {
        query.ids().collect()
    }

    #[test]
    fn test_filter_narrows_by_predicate() {
        let sack = sack_of_names();
        let mut query = sack.new_query();
        query.filter(&|unit: &String| unit.starts_with("beta")).unwrap();
        assert_eq!(ids(&query), vec![1, 3]);

        // filters compose
        query.filter(&|unit: &String| !unit.ends_with("devel")).unwrap();
        assert_eq!(ids(&query), vec![1]);
    }

    #[test]
    fn test_combinators_within_one_generation() {
        let sack = sack_of_names();
        let mut betas = sack.new_query();
        betas.filter(&|unit: &String| unit.starts_with("beta")).unwrap();
        let mut devels = sack.new_query();
        devels.filter(&|unit: &String| unit.ends_with("devel")).unwrap();

        let mut union = betas.clone();
        union.union(&devels).unwrap();
        assert_eq!(ids(&union), vec![1, 3]);

        let mut inter = betas.clone();
        inter.intersect(&devels).unwrap();
        assert_eq!(ids(&inter), vec![3]);

        let mut diff = betas;
        diff.difference(&devels).unwrap();
        assert_eq!(ids(&diff), vec![1]);
    }

    #[test]
    fn test_combining_queries_across_generations_fails() {
        let sack = sack_of_names();
        let other_sack = sack_of_names();
        let mut query = sack.new_query();
        let foreign = other_sack.new_query();

        assert!(matches!(
            query.union(&foreign),
            Err(SackError::GenerationMismatch)
        ));
        // the left operand is unchanged
        assert_eq!(query.len(), 4);
    }

    #[test]
    fn test_ad_hoc_set_combinators() {
        let sack = sack_of_names();
        let mut query = sack.new_query();
        let mut picks = IdSet::new(4);
        picks.add(0).unwrap();
        picks.add(2).unwrap();

        query.intersect_set(&picks);
        assert_eq!(ids(&query), vec![0, 2]);

        query.difference_set(&picks);
        assert!(query.is_empty());

        query.union_set(&picks);
        assert_eq!(ids(&query), vec![0, 2]);
    }

    #[test]
    fn test_iter_pairs_ids_with_units() {
        let sack = sack_of_names();
        let mut query = sack.new_query();
        query.filter(&|unit: &String| unit.contains('m')).unwrap();
        let collected: Vec<_> = query
            .iter()
            .unwrap()
            .map(|(id, unit)| (id, unit.clone()))
            .collect();
        assert_eq!(collected, vec![(2, String::from("gamma"))]);
    }

    #[test]
    fn test_dead_generation_set_reads_work_unit_reads_fail() {
        let mut sack = sack_of_names();
        let query = sack.new_query();
        sack.rebuild(Vec::new());

        // the snapshot's set algebra is still answerable
        assert_eq!(query.len(), 4);
        assert!(query.contains(2));

        // but nothing may read through to the old generation's units
        assert!(matches!(query.unit(2), Err(SackError::InvalidHandle)));
        assert!(query.iter().is_err());
        let mut stale = query.clone();
        assert!(matches!(
            stale.filter(&|_: &String| true),
            Err(SackError::InvalidHandle)
        ));
    }

    #[test]
    fn test_unit_rejects_id_beyond_generation() {
        let sack = sack_of_names();
        let query = sack.new_query();
        assert!(matches!(
            query.unit(4),
            Err(SackError::IdOutOfRange { id: 4, capacity: 4 })
        ));
    }
}
