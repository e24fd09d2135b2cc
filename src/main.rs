//! MCP Cockpit entry point.

use mimalloc::MiMalloc;

/// Global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use mcp_cockpit::config::AppConfig;
use mcp_cockpit::mcp::config::{McpConfig, McpServerEntry, load_mcp_config};
use mcp_cockpit::mcp::{mock, registry::McpRegistry};
use mcp_cockpit::server::start_server;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        mock_enabled = config.mock.enabled,
        mcp_config = %config.mcp.config_path,
        "Configuration loaded"
    );

    // External servers. A missing file just means zero of them.
    let mut mcp_config = match load_mcp_config(&config.mcp.config_path) {
        Ok(cfg) => cfg,
        Err(e) if e.downcast_ref::<std::io::Error>().is_some_and(|io| {
            io.kind() == std::io::ErrorKind::NotFound
        }) =>
        {
            info!(
                name: "mcp.config.missing",
                path = %config.mcp.config_path,
                "No MCP server file; continuing with zero external servers"
            );
            McpConfig::default()
        }
        Err(e) => {
            return Err(e.context(format!(
                "failed to load MCP server file '{}'",
                config.mcp.config_path
            )));
        }
    };

    // Bundled mock server, injected under the reserved name `mock`.
    if config.mock.enabled {
        let addr = mock::spawn(config.mock.port).await?;
        mcp_config.mcp_servers.insert(
            "mock".to_string(),
            McpServerEntry::Http {
                url: mock::endpoint(addr),
                env: std::collections::HashMap::new(),
            },
        );
    }

    // Connect once at startup; failures become GUI state, not exits.
    let registry = Arc::new(McpRegistry::connect_all(&mcp_config).await);

    start_server(config, registry).await
}
