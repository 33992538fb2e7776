//! Server module for building HTTP servers with auto-registered routes
//!
//! This module provides a `ServerBuilder` that collects endpoint definitions
//! from every registered source, validates them into a registry and exposes
//! them as read-only JSON routes.

pub mod builder;
pub mod exposure;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use host::ServerHost;
