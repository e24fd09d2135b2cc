//! Model Context Protocol (MCP) client plumbing.
//!
//! One connection per configured server, over one of two transports:
//! subprocess stdio pipes or streamable HTTP. The registry performs the
//! protocol handshake, keeps each server's tool catalog, and forwards
//! single tool invocations.
//!
//! # Configuration
//!
//! Servers are configured via `mcp.json`:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "time": {
//!       "command": "npx",
//!       "args": ["-y", "@mcpcentral/mcp-time"]
//!     },
//!     "local": {
//!       "url": "http://127.0.0.1:9100/mcp"
//!     }
//!   }
//! }
//! ```
//!
//! The bundled mock server is injected under the reserved name `mock` and
//! reached over the same HTTP path as any external server.

pub mod config;
pub mod mock;
pub mod registry;
pub mod schema;
