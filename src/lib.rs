//! Indigo MCP bridge
//!
//! Exposes Indigo home automation folders, devices and logs as Model Context
//! Protocol tools. Each host-backed tool renders a script, runs it inside the
//! `indigo-host` process and decodes the JSON document it prints.
//!
//! # Layers
//!
//! - [`host`]: script rendering and bounded process execution
//! - [`tools`]: tool endpoints and result shaping
//! - [`server`]: registry, process-wide context, the MCP framework backend
//!   and its stdio transport

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod server;
pub mod tools;
pub mod validation;

// Test support modules - available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use error::{IndigoError, Result};
pub use server::{BridgeContext, IndigoBackend};
