use axum::{
    Json, Router,
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::mcp::registry::{McpRegistry, ServerCatalog};
use crate::mcp::schema::Invocation;
use crate::ui::pages::{self, ToolPageView};

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // HTML pages
        .route("/", get(index_handler))
        .route("/servers", get(servers_handler))
        .route("/servers/{name}/reconnect", post(reconnect_handler))
        .route("/tools/{server}/{tool}", get(tool_form_handler))
        .route("/tools/{server}/{tool}", post(tool_invoke_handler))
        // JSON API
        .route("/api/servers", get(api_servers))
        .route("/api/tools/call", post(api_call_tool))
        // Static assets
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the GUI.
pub async fn start_server(config: Arc<AppConfig>, registry: Arc<McpRegistry>) -> anyhow::Result<()> {
    let state = AppState {
        registry,
        config: Arc::clone(&config),
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;

    info!(
        name: "server.started",
        address = %format!("http://{addr}"),
        "GUI available"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - tool catalog grouped by server.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let catalog = state.registry.catalog().await;
    Html(pages::home_page(&catalog))
}

/// GET /servers - server overview.
async fn servers_handler(State(state): State<AppState>) -> Html<String> {
    let catalog = state.registry.catalog().await;
    Html(pages::servers_page(&catalog))
}

/// POST /servers/:name/reconnect - re-establish one connection, then go back.
///
/// The outcome lands in the server's status either way; the page shows it.
async fn reconnect_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Redirect {
    if let Err(e) = state.registry.reconnect(&name).await {
        tracing::warn!(
            name: "server.reconnect.failed",
            server = %name,
            error = %e,
            "Reconnect request failed"
        );
    }
    Redirect::to("/servers")
}

/// GET /tools/:server/:tool - invocation form.
async fn tool_form_handler(
    State(state): State<AppState>,
    Path((server, tool)): Path<(String, String)>,
) -> Response {
    match state.registry.tool(&server, &tool).await {
        Some(descriptor) => {
            Html(pages::tool_page(&server, &descriptor, &ToolPageView::default()))
                .into_response()
        }
        None => tool_not_found(&server, &tool),
    }
}

/// POST /tools/:server/:tool - validate the form, invoke, render the outcome.
async fn tool_invoke_handler(
    State(state): State<AppState>,
    Path((server, tool)): Path<(String, String)>,
    Form(form): Form<BTreeMap<String, String>>,
) -> Response {
    let Some(descriptor) = state.registry.tool(&server, &tool).await else {
        return tool_not_found(&server, &tool);
    };

    let mut view = ToolPageView {
        values: form,
        ..Default::default()
    };

    let arguments = match descriptor.coerce_arguments(&view.values) {
        Ok(args) => args,
        Err(errors) => {
            tracing::debug!(
                name: "tool.call.rejected",
                server = %server,
                tool = %tool,
                errors = errors.len(),
                "Form validation failed"
            );
            view.field_errors = errors;
            return Html(pages::tool_page(&server, &descriptor, &view)).into_response();
        }
    };

    view.call_error = match invoke(&state.registry, &server, &tool, arguments).await {
        Ok(result) => {
            view.result = Some(result);
            None
        }
        Err(e) => Some(format!("{e:#}")),
    };

    Html(pages::tool_page(&server, &descriptor, &view)).into_response()
}

fn tool_not_found(server: &str, tool: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(pages::not_found_page(&format!(
            "No tool '{tool}' on server '{server}'. The catalog may have changed on reconnect."
        ))),
    )
        .into_response()
}

/// One tools/call round trip with per-call logging.
async fn invoke(
    registry: &McpRegistry,
    server: &str,
    tool: &str,
    arguments: Map<String, Value>,
) -> anyhow::Result<Invocation> {
    let call_id = uuid::Uuid::new_v4().to_string();
    info!(
        name: "tool.call.started",
        call_id = %call_id,
        server = %server,
        tool = %tool,
        argument_count = arguments.len(),
        "Invoking tool"
    );

    match registry.call_tool(server, tool, arguments).await {
        Ok(result) => {
            info!(
                name: "tool.call.completed",
                call_id = %call_id,
                server = %server,
                tool = %tool,
                is_error = result.is_error,
                content_blocks = result.content.len(),
                "Tool call completed"
            );
            Ok(result)
        }
        Err(e) => {
            tracing::error!(
                name: "tool.call.failed",
                call_id = %call_id,
                server = %server,
                tool = %tool,
                error = %format!("{e:#}"),
                "Tool call failed"
            );
            Err(e)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/servers - catalog snapshot.
async fn api_servers(State(state): State<AppState>) -> Json<Vec<ServerCatalog>> {
    Json(state.registry.catalog().await)
}

/// Request body for the tool-call API.
#[derive(Debug, Deserialize)]
struct CallRequest {
    server: String,
    tool: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

/// POST /api/tools/call - invoke with already-typed JSON arguments.
async fn api_call_tool(
    State(state): State<AppState>,
    Json(req): Json<CallRequest>,
) -> Result<Json<Invocation>, (StatusCode, String)> {
    if state.registry.tool(&req.server, &req.tool).await.is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("no tool '{}' on server '{}'", req.tool, req.server),
        ));
    }

    invoke(&state.registry, &req.server, &req.tool, req.arguments)
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))
}
