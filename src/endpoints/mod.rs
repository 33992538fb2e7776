//! Endpoint compilation and serving
//!
//! Definitions are validated into a [`SchemaRegistry`] once at startup. Each
//! request then flows through the filter parser, the query planner, the
//! entity source, the projection engine and the response assembler.

pub mod assembler;
pub mod filters;
pub mod handlers;
pub mod planner;
pub mod projection;
pub mod registry;

pub use assembler::{ScriptWhitelist, assemble};
pub use filters::{FieldFilterValue, FilterSet, PropertyFilterValue, RangeFilterValue};
pub use handlers::{
    AppState, EndpointSummary, ListEndpointsResponse, ScriptsResponse, get_endpoint, get_scripts,
    list_endpoints,
};
pub use planner::{base_query, plan};
pub use projection::project;
pub use registry::{MAX_NESTING_DEPTH, RegisteredEndpoint, SchemaRegistry};
