//! Collaborator implementations
//!
//! Production deployments plug their own [`EntitySource`](crate::core::EntitySource),
//! [`ImageStyles`](crate::core::ImageStyles) and
//! [`VariableStore`](crate::core::VariableStore). The in-memory versions back
//! tests and demos.

pub mod in_memory;

pub use in_memory::{InMemoryEntitySource, InMemoryVariableStore, PrefixImageStyles, StoredEntity};
