//! Entity handle exposed by the content store collaborator

use crate::core::field::FieldValue;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a fetched entity
pub type EntityRef = Arc<dyn Entity>;

/// An opaque entity returned by an [`EntitySource`](crate::core::EntitySource)
///
/// The projection engine only ever reads through these accessors. A `None`
/// means the entity does not carry that property, field or reference at
/// all; it is rendered as `null` rather than failing the row.
pub trait Entity: Send + Sync + fmt::Debug {
    /// Read a base property (`nid`, `title`, `created`, ...)
    fn property(&self, name: &str) -> Option<FieldValue>;

    /// Read an attached field (`field_short_title`, ...)
    ///
    /// Multi-valued fields return a [`FieldValue::List`].
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Entities referenced by an entity-reference field, in delta order
    fn referenced(&self, field: &str) -> Option<Vec<EntityRef>>;

    /// URL alias of the entity
    ///
    /// Default implementation reads the `path` property.
    fn path(&self) -> Option<String> {
        self.property("path")
            .and_then(|value| value.as_string().map(str::to_string))
    }
}
