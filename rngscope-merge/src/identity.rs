use core::hash::Hash;

/// An identity of a model object used to group objects from different
/// implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identity<K> {
    /// A primary key.
    PrimaryKey(K),
    /// A value of a value holder.
    ///
    /// Single-valued holders are grouped by presence and holders in
    /// collections by their values.
    Value(K),
    /// No identity.
    None,
}

/// A model object that can be merged with other representations of itself.
pub trait Mergeable: Clone + Eq + Hash + Send + Sync + 'static {
    /// A key type.
    type Key: Clone + Eq + Hash;

    /// Returns an identity.
    fn identity(&self) -> Identity<Self::Key>;
}

// A group slot of a child object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Slot<K> {
    Key(K),
    Present,
    Absent,
}

impl<K> Slot<K> {
    pub fn new(identity: Identity<K>, single_valued: bool) -> Option<Self> {
        match identity {
            Identity::PrimaryKey(key) => Some(Self::Key(key)),
            Identity::Value(_) if single_valued => Some(Self::Present),
            Identity::Value(value) => Some(Self::Key(value)),
            Identity::None if single_valued => Some(Self::Absent),
            Identity::None => None,
        }
    }
}
