//! MCP Cockpit
//!
//! A desktop novelty: the human plays the LLM agent. The app connects to
//! Model Context Protocol servers, lists their tools in a loopback HTML GUI,
//! and lets you fill in arguments and invoke them by hand.
//!
//! # Architecture
//!
//! - **Config**: layered application settings plus an `mcp.json` server file
//! - **MCP client**: one `rmcp` connection per server (stdio or HTTP)
//! - **Mock server**: bundled in-process MCP server for dependency-free demos
//! - **GUI**: axum-served, server-rendered HTML; plain forms, no client JS
//!
//! # Modules
//!
//! - [`config`]: application configuration
//! - [`mcp`]: server file, client registry, form schema, bundled mock
//! - [`server`]: router and handlers
//! - [`ui`]: page rendering

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod mcp;
pub mod server;
pub mod ui;

use crate::config::AppConfig;
use crate::mcp::registry::McpRegistry;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// MCP server registry for tool discovery and invocation.
    pub registry: Arc<McpRegistry>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}
