//! # Expose-RS
//!
//! Declarative read-only JSON endpoints for content stored behind an entity
//! store.
//!
//! ## Features
//!
//! - **Declarative endpoints**: content types, curated lists, menus, custom
//!   entities and site variables exposed from plain definitions
//! - **URL filters**: property, field, path and start/end filters plus a
//!   capped range and offset
//! - **Nested projections**: images with derived style URLs and entity
//!   references rendered through their own projections
//! - **Configuration-Based**: declare endpoints in YAML or in code
//! - **Fail fast**: every definition is validated once at startup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use expose::prelude::*;
//!
//! let app = ServerBuilder::new()
//!     .with_entity_source(InMemoryEntitySource::new())
//!     .with_image_styles(PrefixImageStyles::new("/files", ["thumbnail"]))
//!     .with_variable_store(InMemoryVariableStore::new())
//!     .register_config("endpoints.yaml")?
//!     .build()?;
//!
//! // GET /api/1.0/topics.json?count=10
//! ```

pub mod config;
pub mod core;
pub mod endpoints;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Definitions ===
    pub use crate::core::{
        Category, CustomQuerySpec, EndpointDefinition, FieldFilter, FilterSpec, ImageSource,
        Multiplicity, ProjectionSpec, RangeTarget, ReferenceSource, SourceRef,
    };

    // === Queries ===
    pub use crate::core::{
        BaseQuery, Condition, ConditionTarget, DEFAULT_RANGE, FetchRequest, MAX_RANGE, Operator,
        QueryBuilder, SortDirection, SortOrder,
    };

    // === Collaborators ===
    pub use crate::core::{
        EndpointSource, Entity, EntityRef, EntitySource, FieldValue, ImageStyles, ImageValue,
        VariableStore,
    };

    // === Errors ===
    pub use crate::core::{ApiError, ConfigError, DefinitionError, FetchError, RequestError};

    // === Endpoints ===
    pub use crate::endpoints::{AppState, FilterSet, RegisteredEndpoint, SchemaRegistry, ScriptWhitelist};

    // === Configuration ===
    pub use crate::config::EndpointsConfig;

    // === Server ===
    pub use crate::server::{RestExposure, ServerBuilder, ServerHost};

    // === Storage ===
    pub use crate::storage::{
        InMemoryEntitySource, InMemoryVariableStore, PrefixImageStyles, StoredEntity,
    };

    // === External re-exports ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use axum::Router;
}
