//! Insight MCP Server Library
//!
//! This crate provides a Model Context Protocol (MCP) server exposing
//! tabular data inspection and local ML inference tools, with a modular
//! architecture organized by domains.
//!
//! # Architecture
//!
//! The server is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling, and the main server
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: MCP tools that can be executed by clients, grouped by name
//!     prefix (`data_*` for CSV dataset queries, `ml_*` for model inference)
//!
//! # Example
//!
//! ```rust,no_run
//! use insight_mcp_server::{core::Config, core::McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config);
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
