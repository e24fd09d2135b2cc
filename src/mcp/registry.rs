use crate::mcp::config::{McpConfig, McpServerEntry, expand_env_map, expand_env_placeholders};
use crate::mcp::schema::{Invocation, ToolDescriptor};
use anyhow::{Context, anyhow, bail};
use rmcp::{
    model::CallToolRequestParam,
    service::ServiceExt,
    transport::{StreamableHttpClientTransport, TokioChildProcess},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::{collections::BTreeMap, path::Path, sync::Arc};
use tokio::{process::Command, sync::RwLock};
use url::Url;

type DynClientService = rmcp::service::RunningService<
    rmcp::service::RoleClient,
    Box<dyn rmcp::service::DynService<rmcp::service::RoleClient>>,
>;

/// One connection per configured server.
///
/// Connections are established once at startup; a failed server keeps its
/// launch spec and error text around so the GUI can display it and offer a
/// reconnect.
#[derive(Clone, Default)]
pub struct McpRegistry {
    servers: Arc<RwLock<BTreeMap<String, ServerHandle>>>,
}

struct ServerHandle {
    entry: McpServerEntry,
    state: ConnectionState,
}

enum ConnectionState {
    Connected {
        service: Arc<DynClientService>,
        tools: Vec<ToolDescriptor>,
    },
    Failed {
        error: String,
    },
    /// Backed by no transport; tool calls echo their arguments. Used by the
    /// HTTP-surface tests.
    Stub {
        tools: Vec<ToolDescriptor>,
    },
}

/// GUI-facing snapshot of one server.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCatalog {
    pub name: String,
    pub transport: &'static str,
    pub summary: String,
    pub status: ServerStatus,
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServerStatus {
    Connected { tool_count: usize },
    Failed { error: String },
}

impl std::fmt::Debug for McpRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpRegistry").finish_non_exhaustive()
    }
}

impl McpRegistry {
    /// Connect to every configured server concurrently. Failures are
    /// recorded, never propagated; a dead server is a row in the GUI, not a
    /// startup abort.
    pub async fn connect_all(cfg: &McpConfig) -> Self {
        let connects = cfg.mcp_servers.iter().map(|(name, entry)| async move {
            let outcome = connect(name, entry).await;
            (name.clone(), entry.clone(), outcome)
        });

        let mut servers = BTreeMap::new();
        for (name, entry, outcome) in futures::future::join_all(connects).await {
            let state = match outcome {
                Ok((service, tools)) => {
                    tracing::info!(
                        name: "mcp.server.connected",
                        server = %name,
                        tool_count = tools.len(),
                        "MCP server connected"
                    );
                    for tool in &tools {
                        tracing::info!(
                            name: "mcp.tool.discovered",
                            server = %name,
                            tool = %tool.name,
                            "MCP tool discovered"
                        );
                    }
                    ConnectionState::Connected {
                        service: Arc::new(service),
                        tools,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        name: "mcp.server.failed",
                        server = %name,
                        error = %format!("{e:#}"),
                        "MCP server connection failed"
                    );
                    ConnectionState::Failed {
                        error: format!("{e:#}"),
                    }
                }
            };
            servers.insert(name, ServerHandle { entry, state });
        }

        Self {
            servers: Arc::new(RwLock::new(servers)),
        }
    }

    /// Registry with no servers at all.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Registry with a single stub server exposing one tool; calls echo
    /// their arguments back. Backing for the handler tests.
    pub fn new_with_stub_tool(server: &str, tool: rmcp::model::Tool) -> Self {
        let descriptor = ToolDescriptor::from_tool(&tool);
        let mut servers = BTreeMap::new();
        servers.insert(
            server.to_string(),
            ServerHandle {
                entry: McpServerEntry::Http {
                    url: "stub://local".to_string(),
                    env: std::collections::HashMap::new(),
                },
                state: ConnectionState::Stub {
                    tools: vec![descriptor],
                },
            },
        );
        Self {
            servers: Arc::new(RwLock::new(servers)),
        }
    }

    /// Ordered snapshot of every server and its catalog.
    pub async fn catalog(&self) -> Vec<ServerCatalog> {
        let servers = self.servers.read().await;
        servers
            .iter()
            .map(|(name, handle)| {
                let (status, tools) = match &handle.state {
                    ConnectionState::Connected { tools, .. }
                    | ConnectionState::Stub { tools } => (
                        ServerStatus::Connected {
                            tool_count: tools.len(),
                        },
                        tools.clone(),
                    ),
                    ConnectionState::Failed { error } => (
                        ServerStatus::Failed {
                            error: error.clone(),
                        },
                        Vec::new(),
                    ),
                };
                ServerCatalog {
                    name: name.clone(),
                    transport: handle.entry.transport_kind(),
                    summary: handle.entry.summary(),
                    status,
                    tools,
                }
            })
            .collect()
    }

    /// Look up one tool's descriptor.
    pub async fn tool(&self, server: &str, tool: &str) -> Option<ToolDescriptor> {
        let servers = self.servers.read().await;
        let handle = servers.get(server)?;
        let tools = match &handle.state {
            ConnectionState::Connected { tools, .. } | ConnectionState::Stub { tools } => tools,
            ConnectionState::Failed { .. } => return None,
        };
        tools.iter().find(|t| t.name == tool).cloned()
    }

    /// One tools/call round trip. One in-flight call per user action; the
    /// GUI serializes submissions, nothing here queues.
    pub async fn call_tool(
        &self,
        server: &str,
        tool: &str,
        arguments: Map<String, Value>,
    ) -> anyhow::Result<Invocation> {
        let service = {
            let servers = self.servers.read().await;
            let handle = servers
                .get(server)
                .ok_or_else(|| anyhow!("unknown server '{server}'"))?;
            match &handle.state {
                ConnectionState::Connected { service, .. } => Arc::clone(service),
                ConnectionState::Stub { .. } => {
                    return Ok(Invocation {
                        content: vec![format!(
                            "stub tool '{tool}' called with {}",
                            Value::Object(arguments)
                        )],
                        structured: None,
                        is_error: false,
                    });
                }
                ConnectionState::Failed { error } => {
                    bail!("server '{server}' is not connected: {error}");
                }
            }
        };

        let res = service
            .call_tool(CallToolRequestParam {
                name: tool.to_string().into(),
                arguments: Some(arguments),
            })
            .await
            .with_context(|| format!("tools/call failed for {server}::{tool}"))?;

        let value = serde_json::to_value(res)?;
        Ok(Invocation::from_call_result(&value))
    }

    /// Drop the server's connection (if any), re-establish it, and refresh
    /// its tool catalog. The launch spec itself never changes.
    pub async fn reconnect(&self, server: &str) -> anyhow::Result<()> {
        let entry = {
            let servers = self.servers.read().await;
            servers
                .get(server)
                .map(|h| h.entry.clone())
                .ok_or_else(|| anyhow!("unknown server '{server}'"))?
        };

        tracing::info!(name: "mcp.server.reconnecting", server = %server, "Reconnecting MCP server");
        let outcome = connect(server, &entry).await;

        let mut servers = self.servers.write().await;
        let handle = servers
            .get_mut(server)
            .ok_or_else(|| anyhow!("unknown server '{server}'"))?;
        match outcome {
            Ok((service, tools)) => {
                tracing::info!(
                    name: "mcp.server.connected",
                    server = %server,
                    tool_count = tools.len(),
                    "MCP server reconnected"
                );
                // The previous RunningService is dropped here; rmcp tears
                // down the transport (and any child process) with it.
                handle.state = ConnectionState::Connected {
                    service: Arc::new(service),
                    tools,
                };
                Ok(())
            }
            Err(e) => {
                let error = format!("{e:#}");
                tracing::warn!(
                    name: "mcp.server.failed",
                    server = %server,
                    error = %error,
                    "MCP server reconnection failed"
                );
                handle.state = ConnectionState::Failed {
                    error: error.clone(),
                };
                Err(anyhow!(error))
            }
        }
    }
}

/// Build the transport, perform the handshake, list the catalog.
async fn connect(
    name: &str,
    entry: &McpServerEntry,
) -> anyhow::Result<(DynClientService, Vec<ToolDescriptor>)> {
    let svc = match entry {
        McpServerEntry::Stdio {
            command,
            args,
            env,
            cwd,
        } => {
            let env = expand_env_map(env);

            let mut cmd = Command::new(command);
            cmd.args(args);
            for (k, v) in env {
                cmd.env(k, v);
            }
            if let Some(cwd) = cwd {
                let dir = Path::new(cwd);
                if !dir.is_dir() {
                    bail!("cwd '{cwd}' for server '{name}' is not a directory");
                }
                cmd.current_dir(dir);
            }

            let transport = TokioChildProcess::new(cmd)
                .with_context(|| format!("failed to spawn command for MCP server '{name}'"))?;
            ().into_dyn()
                .serve(transport)
                .await
                .with_context(|| format!("failed to connect stdio MCP server '{name}'"))?
        }

        McpServerEntry::Http { url, env } => {
            // Entry-level env values (API keys and the like) may feed URL
            // placeholders; the process environment fills in the rest.
            let env = expand_env_map(env);
            let mut url = url.clone();
            for (k, v) in &env {
                url = url.replace(&format!("${{{k}}}"), v);
            }
            let url = expand_env_placeholders(&url);
            let parsed = Url::parse(&url)
                .with_context(|| format!("invalid url for MCP server '{name}': {url}"))?;

            let transport = StreamableHttpClientTransport::from_uri(parsed.to_string());
            ().into_dyn()
                .serve(transport)
                .await
                .with_context(|| format!("failed to connect http MCP server '{name}'"))?
        }
    };

    let result = svc
        .list_tools(Default::default())
        .await
        .with_context(|| format!("tools/list failed for MCP server '{name}'"))?;

    let tools = result.tools.iter().map(ToolDescriptor::from_tool).collect();
    Ok((svc, tools))
}
