//! Merged views over several representations of one logical model entity.
//!
//! A schema construct can be described by more than one model object at once.
//! [`ModelMerger`] wraps those objects into a [`Merged`] view whose accessors
//! delegate to every underlying implementation and group child objects by
//! their [`Identity`].

extern crate alloc;

mod identity;
mod merged;
mod merger;
mod strategy;

pub use self::{
    identity::{Identity, Mergeable},
    merged::{Merged, MergedView},
    merger::ModelMerger,
    strategy::MergingStrategy,
};
