//! Endpoint sources
//!
//! A source is anything that contributes endpoint definitions at startup: a
//! feature module, a YAML file, a test fixture. Each definition category has
//! its own method so a source only implements what it exposes.

use crate::core::definition::EndpointDefinition;
use crate::core::query::QueryBuilder;
use anyhow::Result;

/// Trait for a registrant of endpoint definitions
pub trait EndpointSource: Send + Sync {
    /// Unique source name, used in startup logs
    fn name(&self) -> &str;

    /// Content-type-backed endpoints
    fn content_types(&self) -> Result<Vec<EndpointDefinition>> {
        Ok(Vec::new())
    }

    /// Curated-list-backed endpoints
    fn curated_lists(&self) -> Result<Vec<EndpointDefinition>> {
        Ok(Vec::new())
    }

    /// Menu-backed endpoints
    fn menus(&self) -> Result<Vec<EndpointDefinition>> {
        Ok(Vec::new())
    }

    /// Custom-entity-backed endpoints
    fn custom_entities(&self) -> Result<Vec<EndpointDefinition>> {
        Ok(Vec::new())
    }

    /// Base-query builder for one of this source's custom-entity endpoints
    ///
    /// # Arguments
    /// * `endpoint_id` - The id the custom endpoint was declared under
    fn custom_query(&self, _endpoint_id: &str) -> Option<QueryBuilder> {
        None
    }

    /// Variable-backed endpoints
    fn variables(&self) -> Result<Vec<EndpointDefinition>> {
        Ok(Vec::new())
    }

    /// Script paths to inject into pages embedding widgets, per API version
    fn script_whitelist(&self) -> Vec<(String, Vec<String>)> {
        Vec::new()
    }
}
