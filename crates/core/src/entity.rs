//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stock records, orders and order line items are all addressed by identity
/// (never by position), so every one of them implements this.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
