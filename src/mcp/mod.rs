//! Model Context Protocol plumbing: wire types, stdio server, stdio client.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{McpClient, McpServerConfig, McpToolSet};
pub use server::McpServer;
