use crate::{Mergeable, ModelMerger, identity::Slot};
use alloc::sync::Arc;
use core::{
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
    slice,
};
use indexmap::{IndexMap, IndexSet};
use std::{collections::HashMap, hash::DefaultHasher};

/// A merged model object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Merged<T: Mergeable> {
    /// A single implementation.
    Single(T),
    /// A merged view over multiple implementations.
    View(MergedView<T>),
}

impl<T: Mergeable> Merged<T> {
    /// Returns underlying implementations.
    pub fn implementations(&self) -> &[T] {
        match self {
            Self::Single(implementation) => slice::from_ref(implementation),
            Self::View(view) => view.implementations(),
        }
    }

    /// Returns a single implementation if the object is not a view.
    pub const fn as_single(&self) -> Option<&T> {
        match self {
            Self::Single(implementation) => Some(implementation),
            Self::View(_) => None,
        }
    }

    /// Returns a modeled single value merged across implementations.
    ///
    /// Values are grouped by their identities and the first group wins.
    pub fn single<U: Mergeable>(&self, get: impl Fn(&T) -> Option<U>) -> Option<Merged<U>> {
        match self {
            Self::Single(implementation) => get(implementation).map(Merged::Single),
            Self::View(view) => view
                .merge_children(
                    view.implementations.iter().map(|item| get(item).into_iter().collect()),
                    true,
                    false,
                )
                .into_iter()
                .next(),
        }
    }

    /// Returns a plain value of the first implementation that has one.
    pub fn value<V>(&self, get: impl Fn(&T) -> Option<V>) -> Option<V> {
        self.implementations().iter().find_map(get)
    }

    /// Returns modeled children grouped by their identities.
    ///
    /// Children without identities are returned first as they are.
    pub fn collection<U: Mergeable>(&self, get: impl Fn(&T) -> Vec<U>) -> Vec<Merged<U>> {
        self.children(get, false)
    }

    /// Returns modeled children grouped by their identities with intersection
    /// semantics.
    ///
    /// Children sharing an identity in one implementation are merged into the
    /// same group instead of occupying consecutive slots.
    pub fn intersection<U: Mergeable>(&self, get: impl Fn(&T) -> Vec<U>) -> Vec<Merged<U>> {
        self.children(get, true)
    }

    /// Returns an ordered union of plain values.
    pub fn values<V: Eq + Hash>(&self, get: impl Fn(&T) -> Vec<V>) -> Vec<V> {
        self.implementations()
            .iter()
            .flat_map(get)
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Applies a mutation to every implementation.
    pub fn broadcast(&mut self, mut mutate: impl FnMut(&mut T)) {
        match self {
            Self::Single(implementation) => mutate(implementation),
            Self::View(view) => view.implementations.iter_mut().for_each(mutate),
        }
    }

    /// Returns `true` if a predicate holds for all implementations.
    pub fn all(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.implementations().iter().all(predicate)
    }

    fn children<U: Mergeable>(&self, get: impl Fn(&T) -> Vec<U>, intersect: bool) -> Vec<Merged<U>> {
        match self {
            Self::Single(implementation) => {
                get(implementation).into_iter().map(Merged::Single).collect()
            }
            Self::View(view) => view.merge_children(
                view.implementations.iter().map(get),
                false,
                intersect,
            ),
        }
    }
}

/// A merged view over multiple implementations.
///
/// Two views are equal if they wrap the same multiset of implementations.
#[derive(Clone)]
pub struct MergedView<T: Mergeable> {
    implementations: Vec<T>,
    merger: Arc<ModelMerger>,
}

impl<T: Mergeable> MergedView<T> {
    pub(crate) const fn new(implementations: Vec<T>, merger: Arc<ModelMerger>) -> Self {
        Self {
            implementations,
            merger,
        }
    }

    /// Returns underlying implementations.
    pub fn implementations(&self) -> &[T] {
        &self.implementations
    }

    fn merge_children<U: Mergeable>(
        &self,
        children: impl IntoIterator<Item = Vec<U>>,
        single_valued: bool,
        intersect: bool,
    ) -> Vec<Merged<U>> {
        let mut results = vec![];
        let mut groups = IndexMap::<Slot<U::Key>, Vec<IndexSet<U>>>::new();
        let mut counts = HashMap::<Slot<U::Key>, Vec<usize>>::new();

        for (index, children) in children.into_iter().enumerate() {
            for child in children {
                let Some(slot) = Slot::new(child.identity(), single_valued) else {
                    results.push(Merged::Single(child));
                    continue;
                };
                let count = &mut counts
                    .entry(slot.clone())
                    .or_insert_with(|| vec![0; self.implementations.len()])[index];
                let position = *count;

                if !intersect {
                    *count += 1;
                }

                let group = groups.entry(slot).or_default();

                if group.len() <= position {
                    group.push(IndexSet::new());
                }

                group[position].insert(child);
            }
        }

        results.extend(
            groups
                .into_values()
                .flatten()
                .map(|group| self.merger.merge_implementations(group.into_iter().collect())),
        );

        results
    }

    fn counts(&self) -> HashMap<&T, usize> {
        let mut counts = HashMap::new();

        for implementation in &self.implementations {
            *counts.entry(implementation).or_default() += 1;
        }

        counts
    }
}

impl<T: Mergeable> PartialEq for MergedView<T> {
    fn eq(&self, other: &Self) -> bool {
        self.implementations.len() == other.implementations.len() && self.counts() == other.counts()
    }
}

impl<T: Mergeable> Eq for MergedView<T> {}

impl<T: Mergeable> Hash for MergedView<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sum = 0u64;

        for implementation in &self.implementations {
            let mut hasher = DefaultHasher::new();
            implementation.hash(&mut hasher);
            sum = sum.wrapping_add(hasher.finish());
        }

        self.implementations.len().hash(state);
        sum.hash(state);
    }
}

impl<T: Mergeable + Debug> Debug for MergedView<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("MergedView")
            .field(&self.implementations)
            .finish()
    }
}
