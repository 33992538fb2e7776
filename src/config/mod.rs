//! Configuration loading and management
//!
//! Endpoints can be declared in YAML instead of code. A document mirrors the
//! definition categories:
//!
//! ```yaml
//! content_types:
//!   topic:
//!     version: "1.0"
//!     path: topics.json
//!     wrapper: topics
//!     row: topic
//!     data:
//!       properties: { id: nid, title: title }
//!       fields:
//!         short_title: field_short_title
//!         teaser_image:
//!           image:
//!             field: field_teaser_image
//!             styles: { thumbnail: thumbnail }
//!             fields: { alt: field_file_image_alt_text }
//!       path: path
//!     filters:
//!       properties: { id: nid }
//!       range: count
//!       offset: offset
//! js_whitelist:
//!   "1.0": [/js/embed.js]
//! settings:
//!   fetch_timeout_ms: 5000
//! ```

use crate::core::definition::{
    CustomQuerySpec, EndpointDefinition, FieldFilter, FilterSpec, ImageSource, Multiplicity,
    ProjectionSpec, RangeTarget, ReferenceSource, StartEndFilter,
};
use crate::core::error::{ConfigError, DefinitionError};
use crate::core::query::SortOrder;
use crate::core::source::EndpointSource;
use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Collaborator timeout used when no configuration sets one
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5_000;

/// Output shape of a list endpoint
///
/// Rendered in the order properties, fields, path; within each section the
/// declared order is kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    /// Output alias → property name
    #[serde(default)]
    pub properties: IndexMap<String, String>,

    /// Output alias → field source
    #[serde(default)]
    pub fields: IndexMap<String, FieldSourceConfig>,

    /// Output alias of the URL alias
    #[serde(default)]
    pub path: Option<String>,
}

/// A field source: a plain field name, an image or a reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldSourceConfig {
    Field(String),
    Image { image: ImageConfig },
    Reference { reference: ReferenceConfig },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    pub field: String,

    /// Output alias → image style
    #[serde(default)]
    pub styles: IndexMap<String, String>,

    /// Output alias → sub-field (alt, title, caption)
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceConfig {
    pub field: String,

    #[serde(default)]
    pub multiplicity: Multiplicity,

    #[serde(default)]
    pub data: DataConfig,
}

/// Start/end range binding
///
/// When both are given the property overrides the field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartEndConfig {
    #[serde(default)]
    pub property: Option<String>,

    #[serde(default)]
    pub field: Option<String>,

    #[serde(default = "default_column")]
    pub column: String,

    pub start: String,
    pub end: String,
}

fn default_column() -> String {
    "value".to_string()
}

/// URL filters accepted by an endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FiltersConfig {
    /// URL parameter → property
    #[serde(default)]
    pub properties: IndexMap<String, String>,

    /// URL parameter → field column
    #[serde(default)]
    pub fields: IndexMap<String, FieldFilter>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub start_end: Option<StartEndConfig>,

    #[serde(default)]
    pub range: Option<String>,

    #[serde(default)]
    pub offset: Option<String>,
}

/// Configuration of a list endpoint (content type, nodequeue, menu, custom
/// entity)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    pub version: String,
    pub path: String,

    #[serde(default)]
    pub wrapper: Option<String>,

    #[serde(default)]
    pub row: Option<String>,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub filters: FiltersConfig,

    /// Sort override; the category default applies when empty
    #[serde(default)]
    pub order: Vec<SortOrder>,

    /// Only read for custom entities
    #[serde(default)]
    pub custom_query: Option<CustomQuerySpec>,
}

/// Configuration of a variable endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariablesConfig {
    pub version: String,
    pub path: String,

    /// Accepted for symmetry with list endpoints; the response is flat
    #[serde(default)]
    pub wrapper: Option<String>,

    /// Output alias → variable name
    #[serde(default)]
    pub data: IndexMap<String, String>,
}

/// Runtime settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Upper bound on each collaborator call, in milliseconds
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
}

/// Complete configuration for exposed endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EndpointsConfig {
    #[serde(default)]
    pub content_types: IndexMap<String, EndpointConfig>,

    #[serde(default)]
    pub nodequeues: IndexMap<String, EndpointConfig>,

    #[serde(default)]
    pub menus: IndexMap<String, EndpointConfig>,

    #[serde(default)]
    pub custom_entities: IndexMap<String, EndpointConfig>,

    #[serde(default)]
    pub variables: IndexMap<String, VariablesConfig>,

    /// API version → script paths
    #[serde(default)]
    pub js_whitelist: IndexMap<String, Vec<String>>,

    #[serde(default)]
    pub settings: Settings,
}

impl EndpointsConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.display().to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })
    }

    /// Collaborator timeout across several configuration files
    ///
    /// The last file with an explicit `fetch_timeout_ms` wins. Endpoint
    /// declarations are not merged; each file is registered as its own source.
    pub fn merged_timeout(configs: &[EndpointsConfig]) -> Duration {
        configs
            .iter()
            .rev()
            .find(|config| config.settings.fetch_timeout_ms.is_some())
            .map_or(Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS), Self::fetch_timeout)
    }

    /// Configured collaborator timeout, or the default
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(
            self.settings
                .fetch_timeout_ms
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_MS),
        )
    }
}

impl EndpointSource for EndpointsConfig {
    fn name(&self) -> &str {
        "yaml"
    }

    fn content_types(&self) -> Result<Vec<EndpointDefinition>> {
        self.content_types
            .iter()
            .map(|(bundle, config)| {
                config
                    .apply(EndpointDefinition::content_type(bundle))
                    .map_err(anyhow::Error::from)
            })
            .collect()
    }

    fn curated_lists(&self) -> Result<Vec<EndpointDefinition>> {
        self.nodequeues
            .iter()
            .map(|(queue, config)| {
                config
                    .apply(EndpointDefinition::curated_list(queue))
                    .map_err(anyhow::Error::from)
            })
            .collect()
    }

    fn menus(&self) -> Result<Vec<EndpointDefinition>> {
        self.menus
            .iter()
            .map(|(menu, config)| {
                config
                    .apply(EndpointDefinition::menu(menu))
                    .map_err(anyhow::Error::from)
            })
            .collect()
    }

    fn custom_entities(&self) -> Result<Vec<EndpointDefinition>> {
        self.custom_entities
            .iter()
            .map(|(id, config)| {
                let custom_query = config.custom_query.clone().unwrap_or_default();
                config
                    .apply(EndpointDefinition::custom_entity(id, custom_query))
                    .map_err(anyhow::Error::from)
            })
            .collect()
    }

    fn variables(&self) -> Result<Vec<EndpointDefinition>> {
        Ok(self
            .variables
            .iter()
            .map(|(id, config)| {
                let projection = config
                    .data
                    .iter()
                    .fold(ProjectionSpec::new(), |spec, (alias, name)| spec.variable(alias, name));
                let definition = EndpointDefinition::variables(id)
                    .version(&config.version)
                    .path(&config.path)
                    .projection(projection);
                match &config.wrapper {
                    Some(wrapper) => definition.wrapper(wrapper),
                    None => definition,
                }
            })
            .collect())
    }

    fn script_whitelist(&self) -> Vec<(String, Vec<String>)> {
        self.js_whitelist
            .iter()
            .map(|(version, scripts)| (version.clone(), scripts.clone()))
            .collect()
    }
}

impl EndpointConfig {
    /// Fill a category-specific definition from this configuration
    fn apply(&self, mut definition: EndpointDefinition) -> Result<EndpointDefinition, DefinitionError> {
        definition = definition.version(&self.version).path(&self.path);
        definition.wrapper = self.wrapper.clone();
        definition.row = self.row.clone();
        definition.projection = self.data.to_projection();
        definition.filters = self.filters.to_filter_spec(&definition.id)?;
        definition.order = self.order.clone();
        Ok(definition)
    }
}

impl DataConfig {
    fn to_projection(&self) -> ProjectionSpec {
        let mut spec = ProjectionSpec::new();

        for (alias, property) in &self.properties {
            spec = spec.property(alias, property);
        }
        for (alias, source) in &self.fields {
            spec = match source {
                FieldSourceConfig::Field(field) => spec.field(alias, field),
                FieldSourceConfig::Image { image } => {
                    let mut source = ImageSource::new(&image.field);
                    for (style_alias, style) in &image.styles {
                        source = source.style(style_alias, style);
                    }
                    for (field_alias, field) in &image.fields {
                        source = source.sub_field(field_alias, field);
                    }
                    spec.image(alias, source)
                }
                FieldSourceConfig::Reference { reference } => spec.reference(
                    alias,
                    ReferenceSource {
                        field: reference.field.clone(),
                        multiplicity: reference.multiplicity,
                        projection: reference.data.to_projection(),
                    },
                ),
            };
        }
        if let Some(alias) = &self.path {
            spec = spec.path(alias);
        }

        spec
    }
}

impl FiltersConfig {
    fn to_filter_spec(&self, endpoint: &str) -> Result<FilterSpec, DefinitionError> {
        let start_end = match &self.start_end {
            None => None,
            Some(config) => {
                let target = match (&config.property, &config.field) {
                    (Some(property), field) => {
                        if field.is_some() {
                            tracing::warn!(
                                endpoint,
                                property = %property,
                                "start_end declares both a property and a field; the property wins"
                            );
                        }
                        RangeTarget::Property(property.clone())
                    }
                    (None, Some(field)) => RangeTarget::Field {
                        field: field.clone(),
                        column: config.column.clone(),
                    },
                    (None, None) => {
                        return Err(DefinitionError::invalid(
                            endpoint,
                            "start_end needs a property or a field",
                        ));
                    }
                };
                Some(StartEndFilter {
                    target,
                    start: config.start.clone(),
                    end: config.end.clone(),
                })
            }
        };

        Ok(FilterSpec {
            properties: self.properties.clone(),
            fields: self.fields.clone(),
            path: self.path.clone(),
            start_end,
            range: self.range.clone(),
            offset: self.offset.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::definition::{Category, SourceRef};

    const TOPICS_YAML: &str = r#"
content_types:
  topic:
    version: "1.0"
    path: topics.json
    wrapper: topics
    row: topic
    data:
      properties:
        id: nid
        title: title
      fields:
        short_title: field_short_title
        teaser_image:
          image:
            field: field_teaser_image
            styles:
              thumbnail: thumbnail
            fields:
              alt: field_file_image_alt_text
        assets:
          reference:
            field: field_asset_reference
            data:
              properties:
                title: title
              path: path
      path: path
    filters:
      properties:
        id: nid
      fields:
        person:
          field: field_person
          column: target_id
      path: path
      start_end:
        property: created
        start: start
        end: end
      range: count
      offset: offset
nodequeues:
  trending_topics:
    version: "1.0"
    path: trending-topics.json
    wrapper: topics
    row: topic
    data:
      properties:
        id: nid
menus:
  main-menu:
    version: "1.0"
    path: main-menu.json
    wrapper: links
    row: link
variables:
  site-information:
    version: "1.0"
    path: site-information.json
    wrapper: variables
    data:
      site_name: site_name
js_whitelist:
  "1.0":
    - /js/embed.js
settings:
  fetch_timeout_ms: 750
"#;

    #[test]
    fn test_parses_every_section() {
        let config = EndpointsConfig::from_yaml_str(TOPICS_YAML).unwrap();

        assert_eq!(config.content_types.len(), 1);
        assert_eq!(config.nodequeues.len(), 1);
        assert_eq!(config.menus.len(), 1);
        assert_eq!(config.variables.len(), 1);
        assert_eq!(config.fetch_timeout(), Duration::from_millis(750));
        assert_eq!(
            config.script_whitelist(),
            vec![("1.0".to_string(), vec!["/js/embed.js".to_string()])]
        );
    }

    #[test]
    fn test_content_type_definition() {
        let config = EndpointsConfig::from_yaml_str(TOPICS_YAML).unwrap();
        let defs = config.content_types().unwrap();
        let topic = &defs[0];

        assert_eq!(topic.category, Category::ContentType { bundle: "topic".to_string() });
        assert_eq!(topic.wrapper.as_deref(), Some("topics"));

        let aliases: Vec<&str> = topic.projection.entries().iter().map(|e| e.alias.as_str()).collect();
        assert_eq!(aliases, vec!["id", "title", "short_title", "teaser_image", "assets", "path"]);

        match &topic.projection.entries()[4].source {
            SourceRef::Reference(reference) => {
                assert_eq!(reference.multiplicity, Multiplicity::Many);
                assert_eq!(reference.projection.len(), 2);
            }
            other => panic!("expected reference, got {:?}", other),
        }

        let filters = &topic.filters;
        assert_eq!(filters.properties.get("id").map(String::as_str), Some("nid"));
        assert_eq!(filters.fields["person"].column, "target_id");
        assert_eq!(
            filters.start_end.as_ref().map(|s| &s.target),
            Some(&RangeTarget::Property("created".to_string()))
        );
    }

    #[test]
    fn test_start_end_property_overrides_field() {
        let filters = FiltersConfig {
            start_end: Some(StartEndConfig {
                property: Some("created".to_string()),
                field: Some("field_date".to_string()),
                column: default_column(),
                start: "start".to_string(),
                end: "end".to_string(),
            }),
            ..Default::default()
        };
        let spec = filters.to_filter_spec("topic").unwrap();
        assert_eq!(
            spec.start_end.map(|s| s.target),
            Some(RangeTarget::Property("created".to_string()))
        );
    }

    #[test]
    fn test_start_end_without_target_is_invalid() {
        let filters = FiltersConfig {
            start_end: Some(StartEndConfig {
                property: None,
                field: None,
                column: default_column(),
                start: "start".to_string(),
                end: "end".to_string(),
            }),
            ..Default::default()
        };
        assert!(filters.to_filter_spec("topic").is_err());
    }

    #[test]
    fn test_variables_and_menus() {
        let config = EndpointsConfig::from_yaml_str(TOPICS_YAML).unwrap();

        let variables = config.variables().unwrap();
        assert_eq!(variables[0].projection.entries()[0].source, SourceRef::Variable("site_name".to_string()));

        let menus = config.menus().unwrap();
        assert!(menus[0].projection.is_empty());
    }

    #[test]
    fn test_merged_timeout_last_explicit_wins() {
        let first = EndpointsConfig::from_yaml_str(TOPICS_YAML).unwrap();
        let second = EndpointsConfig::from_yaml_str("settings:\n  fetch_timeout_ms: 1200\n").unwrap();
        let third = EndpointsConfig::from_yaml_str("js_whitelist:\n  \"1.0\": [/js/widgets.js]\n").unwrap();

        let configs = vec![first, second, third];
        assert_eq!(EndpointsConfig::merged_timeout(&configs), Duration::from_millis(1200));
        assert_eq!(EndpointsConfig::merged_timeout(&configs[..1]), Duration::from_millis(750));
        assert_eq!(
            EndpointsConfig::merged_timeout(&[]),
            Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_default_timeout() {
        let config = EndpointsConfig::default();
        assert_eq!(config.fetch_timeout(), Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS));
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let err = EndpointsConfig::from_yaml_str("content_types: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { file: None, .. }));
    }
}
