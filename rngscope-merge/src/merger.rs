use crate::{Merged, MergedView, Mergeable, MergingStrategy};
use alloc::sync::Arc;
use core::{
    any::{Any, TypeId},
    fmt::{self, Debug, Formatter},
};
use log::trace;
use std::collections::HashMap;

type Strategy<T> = Arc<dyn MergingStrategy<T>>;

/// A model merger.
#[derive(Default)]
pub struct ModelMerger {
    strategies: HashMap<TypeId, Vec<Box<dyn Any + Send + Sync>>>,
}

impl ModelMerger {
    /// Creates a model merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a merging strategy for a model type.
    ///
    /// Strategies added later take precedence.
    pub fn add_merging_strategy<T: Mergeable>(
        mut self,
        strategy: impl MergingStrategy<T> + 'static,
    ) -> Self {
        self.strategies
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Box::new(Arc::new(strategy) as Strategy<T>));
        self
    }

    /// Merges implementations of one logical model object.
    ///
    /// Returns `None` for no implementation and the implementation itself for a
    /// single one.
    pub fn merge_models<T: Mergeable>(
        self: &Arc<Self>,
        mut implementations: Vec<T>,
    ) -> Option<Merged<T>> {
        match implementations.len() {
            0 => None,
            1 => implementations.pop().map(Merged::Single),
            count => {
                trace!("merging {count} implementations");
                Some(Merged::View(MergedView::new(implementations, self.clone())))
            }
        }
    }

    pub(crate) fn merge_implementations<T: Mergeable>(
        self: &Arc<Self>,
        implementations: Vec<T>,
    ) -> Merged<T> {
        for strategy in self.strategies_of::<T>().rev() {
            if let Some(merged) = strategy.merge_children(&implementations) {
                return Merged::Single(merged);
            }
        }

        match <[T; 1]>::try_from(implementations) {
            Ok([implementation]) => Merged::Single(implementation),
            Err(implementations) => {
                Merged::View(MergedView::new(implementations, self.clone()))
            }
        }
    }

    fn strategies_of<T: Mergeable>(&self) -> impl DoubleEndedIterator<Item = &Strategy<T>> {
        self.strategies
            .get(&TypeId::of::<T>())
            .into_iter()
            .flatten()
            .filter_map(|strategy| strategy.downcast_ref::<Strategy<T>>())
    }
}

impl Debug for ModelMerger {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ModelMerger")
            .field(
                "strategies",
                &self.strategies.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}
