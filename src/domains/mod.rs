//! Domain modules for the MCP server.
//!
//! Each domain owns one slice of server functionality. Tools are the only
//! capability this server advertises.

pub mod tools;
