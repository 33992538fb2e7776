//! HTTP handlers for exposed endpoints
//!
//! One generic handler serves every registered endpoint; the registry lookup
//! decides which definition drives the request.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::core::definition::SourceRef;
use crate::core::error::{ApiError, FetchError};
use crate::core::service::{EntitySource, ImageStyles, VariableStore};
use crate::endpoints::registry::{RegisteredEndpoint, SchemaRegistry};
use crate::endpoints::{assembler, filters, planner, projection};
use crate::endpoints::assembler::ScriptWhitelist;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SchemaRegistry>,
    pub entity_source: Arc<dyn EntitySource>,
    pub image_styles: Arc<dyn ImageStyles>,
    pub variables: Arc<dyn VariableStore>,
    pub scripts: Arc<ScriptWhitelist>,
    /// Upper bound on the collaborator work of one request
    pub fetch_timeout: Duration,
}

impl AppState {
    /// Run one request through the full pipeline
    ///
    /// lookup → parse filters → plan → fetch → project each row → assemble
    pub async fn handle(
        &self,
        version: &str,
        path: &str,
        params: &HashMap<String, String>,
    ) -> Result<Value, ApiError> {
        let endpoint = self.registry.lookup(version, path)?;
        let definition = &endpoint.definition;

        if !definition.category.is_list() {
            let row = self.with_timeout(self.read_variables(endpoint)).await?;
            return Ok(assembler::assemble(definition, vec![row]));
        }

        let filter_set = filters::parse(&definition.filters, params)?;
        let request = planner::plan(endpoint, &filter_set);

        let entities = self
            .with_timeout(self.entity_source.fetch_entities(&request))
            .await?;

        let rows = entities
            .iter()
            .map(|entity| {
                projection::project(&definition.projection, entity.as_ref(), self.image_styles.as_ref())
            })
            .collect();

        Ok(assembler::assemble(definition, rows))
    }

    async fn read_variables(&self, endpoint: &RegisteredEndpoint) -> anyhow::Result<Map<String, Value>> {
        let mut row = Map::new();
        for entry in endpoint.definition.projection.entries() {
            if let SourceRef::Variable(name) = &entry.source {
                let value = self.variables.variable(name).await?;
                row.insert(entry.alias.clone(), value.unwrap_or(Value::Null));
            }
        }
        Ok(row)
    }

    /// Await a collaborator call under the configured timeout
    ///
    /// Failures are surfaced as they are; nothing is retried here.
    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, FetchError> {
        match tokio::time::timeout(self.fetch_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => {
                tracing::error!(error = %source, "Collaborator call failed");
                Err(FetchError::Failed { source })
            }
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.fetch_timeout.as_millis() as u64,
                    "Collaborator call timed out"
                );
                Err(FetchError::Timeout {
                    timeout: self.fetch_timeout,
                })
            }
        }
    }
}

/// Serve a registered endpoint
///
/// GET /api/{version}/{*path}
pub async fn get_endpoint(
    State(state): State<AppState>,
    Path((version, path)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let body = state.handle(&version, &path, &params).await.inspect_err(|e| {
        tracing::debug!(%version, %path, code = e.error_code(), "Request failed: {}", e)
    })?;
    Ok(Json(body))
}

/// One entry of the endpoint listing
#[derive(Debug, Serialize)]
pub struct EndpointSummary {
    pub id: String,
    pub category: &'static str,
    pub version: String,
    pub path: String,
}

/// Response for the endpoint listing
#[derive(Debug, Serialize)]
pub struct ListEndpointsResponse {
    pub endpoints: Vec<EndpointSummary>,
    pub count: usize,
}

/// List every registered endpoint in registration order
///
/// GET /api
pub async fn list_endpoints(State(state): State<AppState>) -> Json<ListEndpointsResponse> {
    let endpoints: Vec<EndpointSummary> = state
        .registry
        .endpoints()
        .map(|endpoint| EndpointSummary {
            id: endpoint.definition.id.clone(),
            category: endpoint.definition.category.name(),
            version: endpoint.definition.version.clone(),
            path: endpoint.definition.path.clone(),
        })
        .collect();
    let count = endpoints.len();

    Json(ListEndpointsResponse { endpoints, count })
}

/// Response for the script whitelist
#[derive(Debug, Serialize)]
pub struct ScriptsResponse {
    pub version: String,
    pub scripts: Vec<String>,
}

/// Script paths for pages embedding widgets of an API version
///
/// GET /scripts/{version}
pub async fn get_scripts(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> Json<ScriptsResponse> {
    let scripts = state.scripts.scripts(&version).to_vec();
    Json(ScriptsResponse { version, scripts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::definition::{EndpointDefinition, FilterSpec, ImageSource, ProjectionSpec};
    use crate::core::entity::EntityRef;
    use crate::core::error::RequestError;
    use crate::core::query::FetchRequest;
    use crate::storage::in_memory::{
        InMemoryEntitySource, InMemoryVariableStore, PrefixImageStyles, StoredEntity,
    };
    use async_trait::async_trait;
    use serde_json::json;

    fn topics() -> EndpointDefinition {
        EndpointDefinition::content_type("topic")
            .version("1.0")
            .path("topics.json")
            .wrapper("topics")
            .row("topic")
            .projection(
                ProjectionSpec::new().property("id", "nid").image(
                    "teaser_image",
                    ImageSource::new("field_teaser_image")
                        .style("thumbnail", "thumbnail")
                        .style("medium", "medium"),
                ),
            )
            .filters(FilterSpec::new().range("count").offset("offset"))
    }

    fn state_with(source: impl EntitySource + 'static, timeout: Duration) -> AppState {
        let mut registry = SchemaRegistry::new();
        registry.register(topics()).unwrap();
        registry
            .register(
                EndpointDefinition::variables("site-information")
                    .version("1.0")
                    .path("site-information.json")
                    .projection(
                        ProjectionSpec::new()
                            .variable("site_name", "site_name")
                            .variable("slogan", "site_slogan"),
                    ),
            )
            .unwrap();

        let variables = InMemoryVariableStore::new();
        variables.set("site_name", json!("Example"));

        AppState {
            registry: Arc::new(registry),
            entity_source: Arc::new(source),
            image_styles: Arc::new(PrefixImageStyles::new("/files", ["thumbnail", "medium"])),
            variables: Arc::new(variables),
            scripts: Arc::new(ScriptWhitelist::new()),
            fetch_timeout: timeout,
        }
    }

    struct SlowSource;

    #[async_trait]
    impl EntitySource for SlowSource {
        async fn fetch_entities(&self, _request: &FetchRequest) -> anyhow::Result<Vec<EntityRef>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl EntitySource for BrokenSource {
        async fn fetch_entities(&self, _request: &FetchRequest) -> anyhow::Result<Vec<EntityRef>> {
            Err(anyhow::anyhow!("database unavailable"))
        }
    }

    #[tokio::test]
    async fn test_empty_source_yields_empty_wrapper() {
        let state = state_with(InMemoryEntitySource::new(), Duration::from_secs(1));
        let body = state.handle("1.0", "topics.json", &HashMap::new()).await.unwrap();
        assert_eq!(body, json!({"topics": []}));
    }

    #[tokio::test]
    async fn test_entity_without_image_renders_null() {
        let source = InMemoryEntitySource::new();
        source.insert("node", "topic", StoredEntity::new().with_property("nid", 1).with_property("status", 1));
        let state = state_with(source, Duration::from_secs(1));

        let body = state.handle("1.0", "topics.json", &HashMap::new()).await.unwrap();
        assert_eq!(body, json!({"topics": [{"topic": {"id": 1, "teaser_image": null}}]}));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_not_found() {
        let state = state_with(InMemoryEntitySource::new(), Duration::from_secs(1));
        let err = state.handle("2.0", "topics.json", &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Request(RequestError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_bad_filter_fails_before_fetch() {
        let state = state_with(BrokenSource, Duration::from_secs(1));
        let params = HashMap::from([("count".to_string(), "lots".to_string())]);
        let err = state.handle("1.0", "topics.json", &params).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_FILTER");
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let state = state_with(SlowSource, Duration::from_millis(100));
        let err = state.handle("1.0", "topics.json", &HashMap::new()).await.unwrap_err();
        assert_eq!(err.error_code(), "FETCH_TIMEOUT");
    }

    #[tokio::test]
    async fn test_source_failure_is_fetch_failed() {
        let state = state_with(BrokenSource, Duration::from_secs(1));
        let err = state.handle("1.0", "topics.json", &HashMap::new()).await.unwrap_err();
        assert_eq!(err.error_code(), "FETCH_FAILED");
    }

    #[tokio::test]
    async fn test_variables_render_flat_with_nulls() {
        let state = state_with(InMemoryEntitySource::new(), Duration::from_secs(1));
        let body = state
            .handle("1.0", "site-information.json", &HashMap::new())
            .await
            .unwrap();
        assert_eq!(body, json!({"site_name": "Example", "slogan": null}));
    }

    struct SlowVariables;

    #[async_trait]
    impl VariableStore for SlowVariables {
        async fn variable(&self, name: &str) -> anyhow::Result<Option<Value>> {
            tokio::time::sleep(Duration::from_millis(60)).await;
            Ok(Some(json!(name)))
        }
    }

    #[tokio::test]
    async fn test_variable_reads_share_one_timeout() {
        let mut state = state_with(InMemoryEntitySource::new(), Duration::from_millis(100));
        state.variables = Arc::new(SlowVariables);

        // two reads of 60ms each fit under the per-call bound but not the request bound
        let err = state
            .handle("1.0", "site-information.json", &HashMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "FETCH_TIMEOUT");
    }
}
