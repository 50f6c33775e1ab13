//! Server module for MCP components
//!
//! The context, tool registry and prompt templates, the framework backend
//! that exposes them, and the stdio transport it is served on.

pub mod backend;
pub mod context;
pub mod models;
pub mod prompts;
pub mod registry;
pub mod transport;

pub use backend::IndigoBackend;
pub use context::{BridgeContext, ResourceText};
pub use registry::{ToolInvocation, ToolRegistry};
pub use transport::{serve_stdio, LineTransport};
