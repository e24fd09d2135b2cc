//! Bundled mock MCP server.
//!
//! A small in-process server used for demoing tool invocation without any
//! external dependencies. It is served over the streamable-HTTP transport on
//! a loopback port and the app connects to it exactly like any other HTTP
//! server, so the whole client path gets exercised end to end.

use anyhow::Context as _;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::streamable_http_server::{
        StreamableHttpService, session::local::LocalSessionManager,
    },
};
use serde_json::json;
use std::{net::SocketAddr, time::Duration};
use tracing::info;

/// Path the streamable-HTTP service is mounted on.
const MOCK_PATH: &str = "/mcp";

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct EchoArgs {
    /// The message to echo back.
    pub message: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AddArgs {
    pub number1: i64,
    pub number2: i64,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct WebSearchArgs {
    /// Search query.
    pub query: String,
    /// How many dummy results to produce (default 5).
    pub num_results: Option<u32>,
}

/// The mock server itself. Tools mirror the original demo set.
#[derive(Clone)]
pub struct MockServer {
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer").finish_non_exhaustive()
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl MockServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Echoes back the input message. Useful for testing.")]
    async fn echo(
        &self,
        Parameters(EchoArgs { message }): Parameters<EchoArgs>,
    ) -> Result<CallToolResult, McpError> {
        // Simulated latency so the GUI's in-flight state is visible.
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    #[tool(description = "Adds two numbers together.")]
    async fn add(
        &self,
        Parameters(AddArgs { number1, number2 }): Parameters<AddArgs>,
    ) -> Result<CallToolResult, McpError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(CallToolResult::success(vec![Content::text(
            (number1 + number2).to_string(),
        )]))
    }

    #[tool(description = "Performs a mock web search and returns dummy results.")]
    async fn web_search(
        &self,
        Parameters(WebSearchArgs { query, num_results }): Parameters<WebSearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        tokio::time::sleep(Duration::from_millis(800)).await;
        // Zero means "use the default count".
        let num = num_results.filter(|n| *n > 0).unwrap_or(5);
        let results: Vec<serde_json::Value> = (1..=num)
            .map(|i| {
                json!({
                    "title": format!("Mock Result {i} for '{query}'"),
                    "url": format!("http://example.com/search?q={query}&page={i}"),
                    "snippet": format!("This is a dummy snippet for result {i} about {query}."),
                })
            })
            .collect();
        let body = serde_json::to_string_pretty(&results)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(body)]))
    }
}

#[tool_handler]
impl ServerHandler for MockServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Bundled mock server with demo tools (echo, add, web_search).".to_string(),
            ),
            ..Default::default()
        }
    }
}

/// Bind the mock server on a loopback port and serve it from a background
/// task. Returns the bound address (port 0 picks a free one).
pub async fn spawn(port: u16) -> anyhow::Result<SocketAddr> {
    let service = StreamableHttpService::new(
        || Ok(MockServer::new()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service(MOCK_PATH, service);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, port))
        .await
        .with_context(|| format!("failed to bind mock MCP server on 127.0.0.1:{port}"))?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(name: "mock.server.exited", error = %e, "Mock MCP server exited");
        }
    });

    info!(
        name: "mock.server.started",
        address = %format!("http://{addr}{MOCK_PATH}"),
        "Mock MCP server started"
    );
    Ok(addr)
}

/// Client-side endpoint for a spawned mock server.
pub fn endpoint(addr: SocketAddr) -> String {
    format!("http://{addr}{MOCK_PATH}")
}
