//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stores key rows by `Entity::id`, so two records with the same id are the
/// same row regardless of their other attributes.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
