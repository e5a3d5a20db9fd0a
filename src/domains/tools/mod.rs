//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to
//! inspect tabular datasets or run local model inference.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool),
//!   grouped by domain prefix (`data/`, `ml/`)
//! - `router.rs` - Dynamic ToolRouter builder for STDIO transport
//! - `registry.rs` - Central tool registry and prefix dispatch
//! - `envelope.rs` - The uniform success/failure result envelope
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/data/` or `definitions/ml/`
//! 2. Define params, execute(), to_tool(), and create_route()
//! 3. Export it in the domain's `mod.rs` and add it to its `dispatch()`
//! 4. Add a route in `router.rs` using `with_route()`
//! 5. Register it in `registry.rs`
//!
//! **No need to modify `server.rs`!** The router is built dynamically.

pub mod definitions;
pub mod envelope;
mod error;
mod registry;
pub mod router;

pub use error::ToolError;
pub use registry::{DATA_PREFIX, ML_PREFIX, ToolRegistry};
pub use router::build_tool_router;
