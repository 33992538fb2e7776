//! Collaborator traits for the host content store
//!
//! The framework never stores content itself. It plans a [`FetchRequest`] and
//! hands it to an [`EntitySource`]; image URLs and site variables come from
//! their own collaborators.

use crate::core::entity::EntityRef;
use crate::core::field::ImageValue;
use crate::core::query::FetchRequest;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Source of raw entities matching a planned fetch
///
/// Implementations are expected to honour every condition, the sort order
/// and the limit/offset window of the request. Retries, if any, belong
/// here and not in the caller.
#[async_trait]
pub trait EntitySource: Send + Sync {
    async fn fetch_entities(&self, request: &FetchRequest) -> Result<Vec<EntityRef>>;
}

/// Resolves derived image URLs
pub trait ImageStyles: Send + Sync {
    /// URL of `image` rendered through the named style, or `None` when the
    /// style does not exist
    fn resolve(&self, image: &ImageValue, style: &str) -> Option<String>;
}

/// Store of site-wide variables (site name, slogan, ...)
#[async_trait]
pub trait VariableStore: Send + Sync {
    async fn variable(&self, name: &str) -> Result<Option<Value>>;
}
