//! Core module containing fundamental traits and types for the framework

pub mod definition;
pub mod entity;
pub mod error;
pub mod field;
pub mod query;
pub mod service;
pub mod source;

pub use definition::{
    Category, CustomQuerySpec, EndpointDefinition, FieldFilter, FilterSpec, ImageSource,
    Multiplicity, Projection, ProjectionSpec, RangeTarget, ReferenceSource, SourceRef,
    StartEndFilter,
};
pub use entity::{Entity, EntityRef};
pub use error::{ApiError, ConfigError, DefinitionError, FetchError, RequestError};
pub use field::{FieldValue, ImageValue};
pub use query::{
    BaseQuery, Condition, ConditionTarget, DEFAULT_RANGE, FetchRequest, MAX_RANGE, Operator,
    QueryBuilder, SortDirection, SortOrder,
};
pub use service::{EntitySource, ImageStyles, VariableStore};
pub use source::EndpointSource;
