//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::host::ServerHost;
use crate::config::EndpointsConfig;
use crate::core::query::QueryBuilder;
use crate::core::service::{EntitySource, ImageStyles, VariableStore};
use crate::core::source::EndpointSource;
use crate::endpoints::assembler::ScriptWhitelist;
use crate::endpoints::registry::SchemaRegistry;
use anyhow::Result;
use axum::Router;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Builder for creating HTTP servers exposing declared endpoints
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_entity_source(InMemoryEntitySource::new())
///     .with_image_styles(PrefixImageStyles::new("/files", ["thumbnail"]))
///     .with_variable_store(InMemoryVariableStore::new())
///     .register_config("endpoints.yaml")?
///     .build()?;
/// ```
pub struct ServerBuilder {
    entity_source: Option<Arc<dyn EntitySource>>,
    image_styles: Option<Arc<dyn ImageStyles>>,
    variable_store: Option<Arc<dyn VariableStore>>,
    fetch_timeout: Option<Duration>,
    sources: Vec<Arc<dyn EndpointSource>>,
    configs: Vec<EndpointsConfig>,
    custom_queries: HashMap<String, QueryBuilder>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            entity_source: None,
            image_styles: None,
            variable_store: None,
            fetch_timeout: None,
            sources: Vec::new(),
            configs: Vec::new(),
            custom_queries: HashMap::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Set the entity source (required)
    pub fn with_entity_source(mut self, source: impl EntitySource + 'static) -> Self {
        self.entity_source = Some(Arc::new(source));
        self
    }

    /// Set the image style resolver (required)
    pub fn with_image_styles(mut self, styles: impl ImageStyles + 'static) -> Self {
        self.image_styles = Some(Arc::new(styles));
        self
    }

    /// Set the variable store (required)
    pub fn with_variable_store(mut self, store: impl VariableStore + 'static) -> Self {
        self.variable_store = Some(Arc::new(store));
        self
    }

    /// Override the collaborator timeout
    ///
    /// Takes precedence over `settings.fetch_timeout_ms` in configuration.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Add custom routes to the server
    ///
    /// # Example
    ///
    /// ```ignore
    /// use axum::{Router, routing::get};
    ///
    /// let extra = Router::new().route("/version", get(version_handler));
    ///
    /// ServerBuilder::new()
    ///     .with_entity_source(source)
    ///     .with_custom_routes(extra)
    ///     .build()?;
    /// ```
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Register a source of endpoint definitions
    pub fn register_source(mut self, source: impl EndpointSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Register endpoint definitions from an in-memory configuration
    pub fn with_config(mut self, config: EndpointsConfig) -> Self {
        self.configs.push(config);
        self
    }

    /// Register endpoint definitions from a YAML file
    pub fn register_config(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let config = EndpointsConfig::from_yaml_file(path)?;
        self.configs.push(config);
        Ok(self)
    }

    /// Provide the base-query builder of a custom-entity endpoint
    ///
    /// Used when the endpoint's own source supplies none.
    pub fn with_custom_query(mut self, endpoint_id: impl Into<String>, builder: QueryBuilder) -> Self {
        self.custom_queries.insert(endpoint_id.into(), builder);
        self
    }

    /// Build the transport-agnostic host
    ///
    /// Every source is drained into a fresh registry; the first invalid or
    /// duplicate definition aborts startup.
    pub fn build_host(mut self) -> Result<ServerHost> {
        let entity_source = self
            .entity_source
            .take()
            .ok_or_else(|| anyhow::anyhow!("EntitySource is required. Call .with_entity_source()"))?;
        let image_styles = self
            .image_styles
            .take()
            .ok_or_else(|| anyhow::anyhow!("ImageStyles is required. Call .with_image_styles()"))?;
        let variable_store = self.variable_store.take().ok_or_else(|| {
            anyhow::anyhow!("VariableStore is required. Call .with_variable_store()")
        })?;

        let configs = std::mem::take(&mut self.configs);
        let fetch_timeout = self
            .fetch_timeout
            .unwrap_or_else(|| EndpointsConfig::merged_timeout(&configs));

        let mut sources = std::mem::take(&mut self.sources);
        sources.extend(
            configs
                .into_iter()
                .map(|config| Arc::new(config) as Arc<dyn EndpointSource>),
        );

        let mut registry = SchemaRegistry::new();
        let mut scripts = ScriptWhitelist::new();
        for source in &sources {
            self.register_definitions(&mut registry, source.as_ref())?;
            for (version, paths) in source.script_whitelist() {
                scripts.extend(version, paths);
            }
        }

        tracing::info!(
            endpoints = registry.len(),
            timeout_ms = fetch_timeout.as_millis() as u64,
            "Endpoint registry built"
        );

        Ok(ServerHost::from_builder_components(
            registry,
            entity_source,
            image_styles,
            variable_store,
            scripts,
            fetch_timeout,
        ))
    }

    fn register_definitions(
        &self,
        registry: &mut SchemaRegistry,
        source: &dyn EndpointSource,
    ) -> Result<()> {
        tracing::debug!(source = source.name(), "Registering endpoint source");

        for definition in source.content_types()? {
            registry.register_content_type(definition)?;
        }
        for definition in source.curated_lists()? {
            registry.register_curated_list(definition)?;
        }
        for definition in source.menus()? {
            registry.register_menu(definition)?;
        }
        for definition in source.custom_entities()? {
            let builder = source
                .custom_query(&definition.id)
                .or_else(|| self.custom_queries.get(&definition.id).cloned());
            registry.register_custom_entity(definition, builder)?;
        }
        for definition in source.variables()? {
            registry.register_variables(definition)?;
        }

        Ok(())
    }

    /// Build the final REST router
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let host = Arc::new(self.build_host()?);
        RestExposure::build_router(host, custom_routes)
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
