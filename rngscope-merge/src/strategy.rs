use crate::Mergeable;

/// A strategy to merge a group of implementations into one.
///
/// Strategies are consulted before the merger falls back to a merged view.
pub trait MergingStrategy<T: Mergeable>: Send + Sync {
    /// Merges implementations.
    ///
    /// Returns `None` if the strategy does not apply to them.
    fn merge_children(&self, implementations: &[T]) -> Option<T>;
}

impl<T: Mergeable, F: Fn(&[T]) -> Option<T> + Send + Sync> MergingStrategy<T> for F {
    fn merge_children(&self, implementations: &[T]) -> Option<T> {
        self(implementations)
    }
}
