//! Server host for transport-agnostic API exposure
//!
//! The host holds the validated registry and the collaborators. It is built
//! once by the [`ServerBuilder`](super::ServerBuilder) and then shared
//! read-only by every exposure.

use crate::core::service::{EntitySource, ImageStyles, VariableStore};
use crate::endpoints::assembler::ScriptWhitelist;
use crate::endpoints::handlers::AppState;
use crate::endpoints::registry::SchemaRegistry;
use std::sync::Arc;
use std::time::Duration;

/// Host context containing all framework state
pub struct ServerHost {
    /// Every registered endpoint
    pub registry: Arc<SchemaRegistry>,

    /// Supplies entities for list endpoints
    pub entity_source: Arc<dyn EntitySource>,

    /// Derives image style URLs
    pub image_styles: Arc<dyn ImageStyles>,

    /// Supplies site variables
    pub variables: Arc<dyn VariableStore>,

    /// Script paths per API version
    pub scripts: Arc<ScriptWhitelist>,

    /// Upper bound on each collaborator call
    pub fetch_timeout: Duration,
}

impl ServerHost {
    /// Build the host from builder components
    pub fn from_builder_components(
        registry: SchemaRegistry,
        entity_source: Arc<dyn EntitySource>,
        image_styles: Arc<dyn ImageStyles>,
        variables: Arc<dyn VariableStore>,
        scripts: ScriptWhitelist,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            entity_source,
            image_styles,
            variables,
            scripts: Arc::new(scripts),
            fetch_timeout,
        }
    }

    /// Handler state sharing this host's registry and collaborators
    pub fn app_state(&self) -> AppState {
        AppState {
            registry: self.registry.clone(),
            entity_source: self.entity_source.clone(),
            image_styles: self.image_styles.clone(),
            variables: self.variables.clone(),
            scripts: self.scripts.clone(),
            fetch_timeout: self.fetch_timeout,
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.registry.len()
    }

    /// Check if any endpoint is exposed
    pub fn is_ready(&self) -> bool {
        !self.registry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::definition::{EndpointDefinition, ProjectionSpec};
    use crate::storage::in_memory::{InMemoryEntitySource, InMemoryVariableStore, PrefixImageStyles};

    fn make_host(registry: SchemaRegistry) -> ServerHost {
        ServerHost::from_builder_components(
            registry,
            Arc::new(InMemoryEntitySource::new()),
            Arc::new(PrefixImageStyles::new("/files", ["thumbnail"])),
            Arc::new(InMemoryVariableStore::new()),
            ScriptWhitelist::new(),
            Duration::from_secs(2),
        )
    }

    #[test]
    fn test_empty_registry_is_not_ready() {
        let host = make_host(SchemaRegistry::new());
        assert!(!host.is_ready());
        assert_eq!(host.endpoint_count(), 0);
    }

    #[test]
    fn test_app_state_shares_registry() {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                EndpointDefinition::variables("site-information")
                    .version("1.0")
                    .path("site-information.json")
                    .projection(ProjectionSpec::new().variable("site_name", "site_name")),
            )
            .unwrap();

        let host = make_host(registry);
        let state = host.app_state();
        assert!(host.is_ready());
        assert!(Arc::ptr_eq(&state.registry, &host.registry));
        assert_eq!(state.fetch_timeout, Duration::from_secs(2));
    }
}
