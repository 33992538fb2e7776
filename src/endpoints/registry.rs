//! Schema registry for exposed endpoints
//!
//! Holds every endpoint definition keyed by `(version, path)` and validates
//! each one as it is registered. The registry is filled during a single
//! startup phase and then shared read-only behind an `Arc`.

use crate::core::definition::{
    Category, EndpointDefinition, FilterSpec, ProjectionSpec, SourceRef,
};
use crate::core::error::{DefinitionError, RequestError};
use crate::core::query::QueryBuilder;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

/// Deepest allowed chain of nested reference projections
pub const MAX_NESTING_DEPTH: usize = 3;

/// A validated endpoint together with its injected base query, if any
#[derive(Debug, Clone)]
pub struct RegisteredEndpoint {
    pub definition: Arc<EndpointDefinition>,
    pub query_builder: Option<QueryBuilder>,
}

/// Registry for all exposed endpoints
///
/// Lookup is by `(version, path)`; iteration follows registration order.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    endpoints: IndexMap<(String, String), RegisteredEndpoint>,
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            endpoints: IndexMap::new(),
        }
    }

    /// Register a definition of any category
    ///
    /// Custom-entity definitions registered this way fall back to the entity
    /// type of their custom query spec.
    pub fn register(&mut self, definition: EndpointDefinition) -> Result<(), DefinitionError> {
        self.insert(definition, None)
    }

    /// Register a content-type-backed definition
    pub fn register_content_type(
        &mut self,
        definition: EndpointDefinition,
    ) -> Result<(), DefinitionError> {
        expect_category(&definition, "content_type")?;
        self.insert(definition, None)
    }

    /// Register a curated-list-backed definition
    pub fn register_curated_list(
        &mut self,
        definition: EndpointDefinition,
    ) -> Result<(), DefinitionError> {
        expect_category(&definition, "curated_list")?;
        self.insert(definition, None)
    }

    /// Register a menu-backed definition
    pub fn register_menu(&mut self, definition: EndpointDefinition) -> Result<(), DefinitionError> {
        expect_category(&definition, "menu")?;
        self.insert(definition, None)
    }

    /// Register a custom-entity-backed definition with its base-query builder
    pub fn register_custom_entity(
        &mut self,
        definition: EndpointDefinition,
        query_builder: Option<QueryBuilder>,
    ) -> Result<(), DefinitionError> {
        expect_category(&definition, "custom_entity")?;
        self.insert(definition, query_builder)
    }

    /// Register a variable-backed definition
    pub fn register_variables(
        &mut self,
        definition: EndpointDefinition,
    ) -> Result<(), DefinitionError> {
        expect_category(&definition, "variables")?;
        self.insert(definition, None)
    }

    fn insert(
        &mut self,
        definition: EndpointDefinition,
        query_builder: Option<QueryBuilder>,
    ) -> Result<(), DefinitionError> {
        let mut definition = definition;
        if matches!(definition.category, Category::Menu { .. }) && definition.projection.is_empty() {
            definition.projection = ProjectionSpec::menu_link();
        }
        validate(&definition, query_builder.is_some())?;

        let key = (definition.version.clone(), definition.path.clone());
        if self.endpoints.contains_key(&key) {
            return Err(DefinitionError::Duplicate {
                version: key.0,
                path: key.1,
            });
        }

        tracing::info!(
            endpoint = %definition.id,
            category = definition.category.name(),
            "Registered /api/{}/{}",
            definition.version,
            definition.path
        );

        self.endpoints.insert(
            key,
            RegisteredEndpoint {
                definition: Arc::new(definition),
                query_builder,
            },
        );
        Ok(())
    }

    /// Resolve an endpoint by version and path
    pub fn lookup(&self, version: &str, path: &str) -> Result<&RegisteredEndpoint, RequestError> {
        self.endpoints
            .get(&(version.to_string(), path.to_string()))
            .ok_or_else(|| RequestError::NotFound {
                version: version.to_string(),
                path: path.to_string(),
            })
    }

    /// All endpoints in registration order
    pub fn endpoints(&self) -> impl Iterator<Item = &RegisteredEndpoint> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

fn expect_category(definition: &EndpointDefinition, expected: &str) -> Result<(), DefinitionError> {
    if definition.category.name() == expected {
        Ok(())
    } else {
        Err(DefinitionError::invalid(
            &definition.id,
            format!(
                "expected a {} definition, got {}",
                expected,
                definition.category.name()
            ),
        ))
    }
}

fn version_pattern() -> &'static Regex {
    static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();
    VERSION_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

fn path_pattern() -> &'static Regex {
    static PATH_REGEX: OnceLock<Regex> = OnceLock::new();
    PATH_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$").unwrap())
}

/// Structural validation of a definition
fn validate(definition: &EndpointDefinition, has_query_builder: bool) -> Result<(), DefinitionError> {
    let invalid = |message: String| DefinitionError::invalid(&definition.id, message);

    if definition.version.is_empty() {
        return Err(invalid("missing version".to_string()));
    }
    if !version_pattern().is_match(&definition.version) {
        return Err(invalid(format!("malformed version '{}'", definition.version)));
    }
    if definition.path.is_empty() {
        return Err(invalid("missing path".to_string()));
    }
    if !path_pattern().is_match(&definition.path)
        || definition.path.contains("..")
        || definition.path.ends_with('/')
    {
        return Err(invalid(format!("malformed path '{}'", definition.path)));
    }

    if definition.category.is_list() {
        if definition.wrapper.as_deref().is_none_or(str::is_empty) {
            return Err(invalid("missing wrapper".to_string()));
        }
        if definition.row.as_deref().is_none_or(str::is_empty) {
            return Err(invalid("missing row".to_string()));
        }
    }

    match &definition.category {
        Category::Variables => {
            if definition.projection.is_empty() {
                return Err(invalid("variable endpoints need at least one variable".to_string()));
            }
            if let Some(entry) = definition
                .projection
                .entries()
                .iter()
                .find(|entry| !matches!(entry.source, SourceRef::Variable(_)))
            {
                return Err(invalid(format!(
                    "alias '{}' is not a variable; variable endpoints only expose variables",
                    entry.alias
                )));
            }
            if !definition.filters.is_empty() {
                return Err(invalid("variable endpoints do not accept filters".to_string()));
            }
        }
        Category::Menu { .. } => {
            if !definition.filters.is_empty() {
                return Err(invalid("menu endpoints do not accept filters".to_string()));
            }
        }
        Category::CuratedList { .. } => {
            if !definition.filters.fields.is_empty() || definition.filters.start_end.is_some() {
                return Err(invalid(
                    "curated lists only support property, path, range and offset filters"
                        .to_string(),
                ));
            }
        }
        Category::CustomEntity { custom_query } => {
            if !has_query_builder && custom_query.entity_type.is_none() {
                return Err(invalid(
                    "custom entity endpoints need a query builder or an entity_type".to_string(),
                ));
            }
        }
        Category::ContentType { .. } => {}
    }

    if definition.category.is_list() {
        validate_projection(&definition.projection, 0).map_err(invalid)?;
    }
    validate_filters(&definition.id, &definition.filters).map_err(invalid)?;

    Ok(())
}

fn validate_projection(spec: &ProjectionSpec, depth: usize) -> Result<(), String> {
    if depth > MAX_NESTING_DEPTH {
        return Err(format!(
            "projection nests deeper than {} levels",
            MAX_NESTING_DEPTH
        ));
    }

    let mut aliases = HashSet::new();
    for entry in spec.entries() {
        if entry.alias.is_empty() {
            return Err("empty output alias".to_string());
        }
        if !aliases.insert(entry.alias.as_str()) {
            return Err(format!("alias '{}' is declared twice", entry.alias));
        }

        match &entry.source {
            SourceRef::Variable(_) => {
                return Err(format!(
                    "alias '{}' reads a variable outside a variable endpoint",
                    entry.alias
                ));
            }
            SourceRef::Image(image) => {
                if image.styles.is_empty() {
                    return Err(format!("image alias '{}' declares no styles", entry.alias));
                }
                if let Some(alias) = image.fields.keys().find(|a| image.styles.contains_key(*a)) {
                    return Err(format!(
                        "image alias '{}' uses '{}' for both a style and a sub-field",
                        entry.alias, alias
                    ));
                }
            }
            SourceRef::Reference(reference) => {
                validate_projection(&reference.projection, depth + 1)
                    .map_err(|e| format!("{} (in '{}')", e, entry.alias))?;
            }
            SourceRef::Property(_) | SourceRef::Field(_) | SourceRef::Path => {}
        }
    }
    Ok(())
}

fn validate_filters(endpoint: &str, filters: &FilterSpec) -> Result<(), String> {
    let mut params: Vec<&str> = filters.properties.keys().map(String::as_str).collect();

    for param in filters.fields.keys() {
        if filters.properties.contains_key(param) {
            tracing::warn!(
                endpoint,
                parameter = %param,
                "Parameter bound to both a property and a field; the property filter wins"
            );
        } else {
            params.push(param);
        }
    }
    params.extend(filters.path.as_deref());
    if let Some(start_end) = &filters.start_end {
        params.push(&start_end.start);
        params.push(&start_end.end);
    }
    params.extend(filters.range.as_deref());
    params.extend(filters.offset.as_deref());

    let mut seen = HashSet::new();
    for param in params {
        if param.is_empty() {
            return Err("empty filter parameter name".to_string());
        }
        if !seen.insert(param) {
            return Err(format!("filter parameter '{}' is bound twice", param));
        }
    }
    Ok(())
}
