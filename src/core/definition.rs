//! Endpoint definitions: what an endpoint fetches, how it filters and what
//! JSON shape it produces
//!
//! Definitions are plain immutable values. They are built either through the
//! fluent constructors below or from YAML via [`crate::config`], and are only
//! trusted once the [`SchemaRegistry`](crate::endpoints::SchemaRegistry) has
//! validated them.
//!
//! # Example
//!
//! ```rust
//! use expose::prelude::*;
//!
//! let topics = EndpointDefinition::content_type("topic")
//!     .version("1.0")
//!     .path("topics.json")
//!     .wrapper("topics")
//!     .row("topic")
//!     .projection(
//!         ProjectionSpec::new()
//!             .property("id", "nid")
//!             .field("short_title", "field_short_title")
//!             .path("path"),
//!     )
//!     .filters(FilterSpec::new().property("id", "nid").range("count").offset("offset"));
//!
//! assert_eq!(topics.id_property(), "nid");
//! ```

use crate::core::query::SortOrder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The kind of content backing an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    /// All published nodes of one content type
    ContentType { bundle: String },
    /// An editor-ordered nodequeue
    CuratedList { queue: String },
    /// The links of one menu
    Menu { menu: String },
    /// Any entity type, fetched through an injected base query
    CustomEntity { custom_query: CustomQuerySpec },
    /// Site variables, rendered as a flat object
    Variables,
}

impl Category {
    /// Stable category name used in listings and logs
    pub fn name(&self) -> &'static str {
        match self {
            Category::ContentType { .. } => "content_type",
            Category::CuratedList { .. } => "curated_list",
            Category::Menu { .. } => "menu",
            Category::CustomEntity { .. } => "custom_entity",
            Category::Variables => "variables",
        }
    }

    /// Whether responses are a wrapped list of rows
    pub fn is_list(&self) -> bool {
        !matches!(self, Category::Variables)
    }
}

/// Extra information for custom-entity endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomQuerySpec {
    /// Entity type queried when no query builder is registered
    #[serde(default)]
    pub entity_type: Option<String>,

    /// Name of the identifier property in the query; needed for path filtering
    #[serde(default)]
    pub nid_alias: Option<String>,
}

/// A declared endpoint, identified by `(version, path)`
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDefinition {
    /// Machine name the endpoint was declared under
    pub id: String,
    pub category: Category,
    pub version: String,
    pub path: String,
    pub wrapper: Option<String>,
    pub row: Option<String>,
    pub projection: ProjectionSpec,
    pub filters: FilterSpec,
    /// Sort override; empty means the category default
    pub order: Vec<SortOrder>,
}

impl EndpointDefinition {
    fn new(id: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            category,
            version: String::new(),
            path: String::new(),
            wrapper: None,
            row: None,
            projection: ProjectionSpec::new(),
            filters: FilterSpec::new(),
            order: Vec::new(),
        }
    }

    /// Endpoint over the nodes of a content type
    pub fn content_type(bundle: impl Into<String>) -> Self {
        let bundle = bundle.into();
        Self::new(bundle.clone(), Category::ContentType { bundle })
    }

    /// Endpoint over a curated list (nodequeue)
    pub fn curated_list(queue: impl Into<String>) -> Self {
        let queue = queue.into();
        Self::new(queue.clone(), Category::CuratedList { queue })
    }

    /// Endpoint over the links of a menu
    pub fn menu(menu: impl Into<String>) -> Self {
        let menu = menu.into();
        Self::new(menu.clone(), Category::Menu { menu })
    }

    /// Endpoint over arbitrary entities
    pub fn custom_entity(id: impl Into<String>, custom_query: CustomQuerySpec) -> Self {
        Self::new(id, Category::CustomEntity { custom_query })
    }

    /// Endpoint exposing site variables
    pub fn variables(id: impl Into<String>) -> Self {
        Self::new(id, Category::Variables)
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn wrapper(mut self, wrapper: impl Into<String>) -> Self {
        self.wrapper = Some(wrapper.into());
        self
    }

    pub fn row(mut self, row: impl Into<String>) -> Self {
        self.row = Some(row.into());
        self
    }

    pub fn projection(mut self, projection: ProjectionSpec) -> Self {
        self.projection = projection;
        self
    }

    pub fn filters(mut self, filters: FilterSpec) -> Self {
        self.filters = filters;
        self
    }

    pub fn order_by(mut self, order: SortOrder) -> Self {
        self.order.push(order);
        self
    }

    /// Property holding the entity identifier for this endpoint
    pub fn id_property(&self) -> &str {
        match &self.category {
            Category::ContentType { .. } | Category::CuratedList { .. } => "nid",
            Category::Menu { .. } => "mlid",
            Category::CustomEntity { custom_query } => {
                custom_query.nid_alias.as_deref().unwrap_or("nid")
            }
            Category::Variables => "",
        }
    }
}

// =============================================================================
// Projection
// =============================================================================

/// How many referenced entities a reference projection renders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    Single,
    #[default]
    Many,
}

/// Image field rendered as derived style URLs plus sub-fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub field: String,
    /// Output alias → image style name
    pub styles: IndexMap<String, String>,
    /// Output alias → sub-field name (alt, title, caption)
    pub fields: IndexMap<String, String>,
}

impl ImageSource {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            styles: IndexMap::new(),
            fields: IndexMap::new(),
        }
    }

    pub fn style(mut self, alias: impl Into<String>, style: impl Into<String>) -> Self {
        self.styles.insert(alias.into(), style.into());
        self
    }

    pub fn sub_field(mut self, alias: impl Into<String>, field: impl Into<String>) -> Self {
        self.fields.insert(alias.into(), field.into());
        self
    }
}

/// Entity-reference field rendered through a nested projection
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSource {
    pub field: String,
    pub multiplicity: Multiplicity,
    pub projection: ProjectionSpec,
}

impl ReferenceSource {
    pub fn many(field: impl Into<String>, projection: ProjectionSpec) -> Self {
        Self {
            field: field.into(),
            multiplicity: Multiplicity::Many,
            projection,
        }
    }

    pub fn single(field: impl Into<String>, projection: ProjectionSpec) -> Self {
        Self {
            field: field.into(),
            multiplicity: Multiplicity::Single,
            projection,
        }
    }
}

/// Where a projected value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRef {
    Property(String),
    Field(String),
    Path,
    Image(ImageSource),
    Reference(ReferenceSource),
    Variable(String),
}

/// One output alias and its source
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub alias: String,
    pub source: SourceRef,
}

/// Ordered mapping from output alias to source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionSpec {
    entries: Vec<Projection>,
}

impl ProjectionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; alias uniqueness is checked at registration
    pub fn push(mut self, alias: impl Into<String>, source: SourceRef) -> Self {
        self.entries.push(Projection {
            alias: alias.into(),
            source,
        });
        self
    }

    pub fn property(self, alias: impl Into<String>, property: impl Into<String>) -> Self {
        self.push(alias, SourceRef::Property(property.into()))
    }

    pub fn field(self, alias: impl Into<String>, field: impl Into<String>) -> Self {
        self.push(alias, SourceRef::Field(field.into()))
    }

    pub fn path(self, alias: impl Into<String>) -> Self {
        self.push(alias, SourceRef::Path)
    }

    pub fn image(self, alias: impl Into<String>, image: ImageSource) -> Self {
        self.push(alias, SourceRef::Image(image))
    }

    pub fn reference(self, alias: impl Into<String>, reference: ReferenceSource) -> Self {
        self.push(alias, SourceRef::Reference(reference))
    }

    pub fn variable(self, alias: impl Into<String>, name: impl Into<String>) -> Self {
        self.push(alias, SourceRef::Variable(name.into()))
    }

    pub fn entries(&self) -> &[Projection] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Levels of reference nesting below this projection (0 when flat)
    pub fn depth(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.source {
                SourceRef::Reference(reference) => Some(1 + reference.projection.depth()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Default shape of a menu link row
    pub fn menu_link() -> Self {
        Self::new()
            .property("title", "link_title")
            .property("path", "link_path")
            .property("weight", "weight")
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Field equality filter binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub column: String,
}

/// What a start/end range filter constrains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeTarget {
    Property(String),
    Field { field: String, column: String },
}

/// Start/end range filter binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartEndFilter {
    pub target: RangeTarget,
    /// URL parameter carrying the lower bound
    pub start: String,
    /// URL parameter carrying the upper bound
    pub end: String,
}

/// URL parameters an endpoint accepts and what they bind to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// URL parameter → property
    pub properties: IndexMap<String, String>,
    /// URL parameter → field column
    pub fields: IndexMap<String, FieldFilter>,
    /// URL parameter of the path filter
    pub path: Option<String>,
    pub start_end: Option<StartEndFilter>,
    /// URL parameter of the row limit
    pub range: Option<String>,
    /// URL parameter of the row offset
    pub offset: Option<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, param: impl Into<String>, property: impl Into<String>) -> Self {
        self.properties.insert(param.into(), property.into());
        self
    }

    pub fn field(
        mut self,
        param: impl Into<String>,
        field: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        self.fields.insert(
            param.into(),
            FieldFilter {
                field: field.into(),
                column: column.into(),
            },
        );
        self
    }

    pub fn path(mut self, param: impl Into<String>) -> Self {
        self.path = Some(param.into());
        self
    }

    pub fn start_end(
        mut self,
        target: RangeTarget,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        self.start_end = Some(StartEndFilter {
            target,
            start: start.into(),
            end: end.into(),
        });
        self
    }

    pub fn range(mut self, param: impl Into<String>) -> Self {
        self.range = Some(param.into());
        self
    }

    pub fn offset(mut self, param: impl Into<String>) -> Self {
        self.offset = Some(param.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.fields.is_empty()
            && self.path.is_none()
            && self.start_end.is_none()
            && self.range.is_none()
            && self.offset.is_none()
    }
}
