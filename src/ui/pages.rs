//! Page rendering.
//!
//! Three screens, mirroring the GUI flow: the tool catalog (home), the tool
//! invocation form, and the server overview.

use crate::mcp::registry::{ServerCatalog, ServerStatus};
use crate::mcp::schema::{FieldError, Invocation, ParamKind, ToolDescriptor};
use crate::ui::{encode_segment, escape};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Document shell shared by every page.
pub fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - MCP Cockpit</title>
    <link rel="stylesheet" href="/static/app.css">
</head>
<body>
    <header class="topbar">
        <a class="brand" href="/">MCP Cockpit</a>
        <nav>
            <a href="/">Tools</a>
            <a href="/servers">Servers</a>
        </nav>
    </header>
    <main>
{content}
    </main>
    <footer>
        <p>You are the agent. Pick a tool, fill in the arguments, run it.</p>
    </footer>
</body>
</html>"#,
        title = escape(title),
    )
}

/// Home: every server as a card, its tools as links.
pub fn home_page(catalog: &[ServerCatalog]) -> String {
    if catalog.is_empty() {
        return html_shell(
            "Tools",
            r#"<div class="empty">
            <h1>No MCP servers configured</h1>
            <p>Add servers to <code>mcp.json</code> or enable the bundled mock server, then restart.</p>
        </div>"#,
        );
    }

    let mut content = String::from("<h1>Available MCP tools</h1>\n");
    for server in catalog {
        let _ = write!(
            content,
            r#"<section class="card">
            <h2>{name} {badge}</h2>"#,
            name = escape(&server.name),
            badge = status_badge(&server.status),
        );

        match &server.status {
            ServerStatus::Failed { error } => {
                let _ = write!(
                    content,
                    r#"<p class="error">Connection failed: {}</p>"#,
                    escape(error)
                );
            }
            ServerStatus::Connected { .. } if server.tools.is_empty() => {
                content.push_str(r#"<p class="muted">No tools available on this server.</p>"#);
            }
            ServerStatus::Connected { .. } => {
                content.push_str("<ul class=\"tool-list\">\n");
                for tool in &server.tools {
                    let _ = write!(
                        content,
                        r#"<li><a href="/tools/{server}/{tool}">{label}</a><span class="muted">{desc}</span></li>
"#,
                        server = escape(&encode_segment(&server.name)),
                        tool = escape(&encode_segment(&tool.name)),
                        label = escape(tool.title.as_deref().unwrap_or(&tool.name)),
                        desc = escape(tool.description.as_deref().unwrap_or("No description.")),
                    );
                }
                content.push_str("</ul>\n");
            }
        }
        content.push_str("</section>\n");
    }

    html_shell("Tools", &content)
}

/// Everything the tool page needs besides the descriptor.
#[derive(Debug, Default)]
pub struct ToolPageView {
    /// Previously submitted values, re-filled on validation failure.
    pub values: BTreeMap<String, String>,
    pub field_errors: Vec<FieldError>,
    pub result: Option<Invocation>,
    pub call_error: Option<String>,
}

/// Tool invocation form plus (after a submit) the outcome.
pub fn tool_page(server: &str, tool: &ToolDescriptor, view: &ToolPageView) -> String {
    let mut content = String::new();
    let _ = write!(
        content,
        r#"<p class="breadcrumb"><a href="/">&larr; back to tools</a></p>
<h1>{server} / {name}</h1>
<p class="description">{desc}</p>
"#,
        server = escape(server),
        name = escape(tool.title.as_deref().unwrap_or(&tool.name)),
        desc = escape(tool.description.as_deref().unwrap_or("No description.")),
    );

    if !view.field_errors.is_empty() {
        content.push_str("<div class=\"error\"><p>Input errors:</p><ul>\n");
        for err in &view.field_errors {
            let _ = write!(content, "<li>{}</li>\n", escape(&err.to_string()));
        }
        content.push_str("</ul></div>\n");
    }

    let _ = write!(
        content,
        r#"<form class="card" method="post" action="/tools/{server}/{tool}">
"#,
        server = escape(&encode_segment(server)),
        tool = escape(&encode_segment(&tool.name)),
    );
    if tool.params.is_empty() {
        content.push_str("<p class=\"muted\">This tool takes no input.</p>\n");
    } else {
        for param in &tool.params {
            content.push_str(&field_html(param, view.values.get(&param.name)));
        }
    }
    content.push_str("<button type=\"submit\" class=\"btn\">Run</button>\n</form>\n");

    content.push_str("<section class=\"card output\">\n<h2>Output</h2>\n");
    match (&view.result, &view.call_error) {
        (_, Some(error)) => {
            let _ = write!(
                content,
                "<p class=\"error\">Tool call failed:</p><pre class=\"error\">{}</pre>\n",
                escape(error)
            );
        }
        (Some(result), None) => {
            if result.is_error {
                content.push_str("<p class=\"error\">The server reported an error:</p>\n");
            } else {
                content.push_str("<p class=\"ok\">Call completed.</p>\n");
            }
            for block in &result.content {
                let _ = write!(content, "<pre>{}</pre>\n", escape(block));
            }
            if let Some(structured) = &result.structured {
                let pretty = serde_json::to_string_pretty(structured)
                    .unwrap_or_else(|_| structured.to_string());
                let _ = write!(
                    content,
                    "<h3>Structured content</h3><pre>{}</pre>\n",
                    escape(&pretty)
                );
            }
        }
        (None, None) => {
            content.push_str("<p class=\"muted\">Results will appear here.</p>\n");
        }
    }
    content.push_str("</section>\n");

    html_shell(&tool.name, &content)
}

/// Server overview: transport summary, status, reconnect.
pub fn servers_page(catalog: &[ServerCatalog]) -> String {
    let mut content = String::from("<h1>Servers</h1>\n");
    if catalog.is_empty() {
        content.push_str("<p class=\"muted\">No servers configured.</p>\n");
    }
    for server in catalog {
        let _ = write!(
            content,
            r#"<section class="card">
<h2>{name} {badge}</h2>
<p class="muted">{summary}</p>
"#,
            name = escape(&server.name),
            badge = status_badge(&server.status),
            summary = escape(&server.summary),
        );
        match &server.status {
            ServerStatus::Connected { tool_count } => {
                let _ = write!(content, "<p>{tool_count} tool(s) available.</p>\n");
            }
            ServerStatus::Failed { error } => {
                let _ = write!(content, "<p class=\"error\">{}</p>\n", escape(error));
            }
        }
        let _ = write!(
            content,
            r#"<form method="post" action="/servers/{name}/reconnect">
<button type="submit" class="btn">Reconnect</button>
</form>
</section>
"#,
            name = escape(&encode_segment(&server.name)),
        );
    }
    html_shell("Servers", &content)
}

pub fn not_found_page(message: &str) -> String {
    let content = format!(
        r#"<div class="empty">
<h1>Not found</h1>
<p>{}</p>
<p><a href="/">Back to the tool list</a></p>
</div>"#,
        escape(message)
    );
    html_shell("Not found", &content)
}

fn status_badge(status: &ServerStatus) -> &'static str {
    match status {
        ServerStatus::Connected { .. } => r#"<span class="badge ok">connected</span>"#,
        ServerStatus::Failed { .. } => r#"<span class="badge err">failed</span>"#,
    }
}

fn field_html(param: &crate::mcp::schema::ParamField, previous: Option<&String>) -> String {
    let label = if param.required {
        format!("{} *", param.label)
    } else {
        param.label.clone()
    };
    let hint = param
        .description
        .as_deref()
        .map(|d| format!("<p class=\"hint\">{}</p>\n", escape(d)))
        .unwrap_or_default();
    let value = previous
        .map(String::as_str)
        .map(str::to_string)
        .or_else(|| param.default.as_ref().map(default_as_string));
    let required_attr = if param.required { " required" } else { "" };

    match &param.kind {
        ParamKind::Text { multiline: false } => format!(
            r#"<label>{label}
<input type="text" name="{name}" value="{value}"{required_attr}>
</label>
{hint}"#,
            label = escape(&label),
            name = escape(&param.name),
            value = escape(value.as_deref().unwrap_or("")),
        ),
        ParamKind::Text { multiline: true } => format!(
            r#"<label>{label}
<textarea name="{name}" rows="4"{required_attr}>{value}</textarea>
</label>
{hint}"#,
            label = escape(&label),
            name = escape(&param.name),
            value = escape(value.as_deref().unwrap_or("")),
        ),
        ParamKind::Integer => format!(
            r#"<label>{label}
<input type="number" step="1" name="{name}" value="{value}"{required_attr}>
</label>
{hint}"#,
            label = escape(&label),
            name = escape(&param.name),
            value = escape(value.as_deref().unwrap_or("")),
        ),
        ParamKind::Number => format!(
            r#"<label>{label}
<input type="number" step="any" name="{name}" value="{value}"{required_attr}>
</label>
{hint}"#,
            label = escape(&label),
            name = escape(&param.name),
            value = escape(value.as_deref().unwrap_or("")),
        ),
        ParamKind::Boolean => {
            let checked = match value.as_deref() {
                Some("on" | "true") => " checked",
                _ => "",
            };
            format!(
                r#"<label class="checkbox">
<input type="checkbox" name="{name}"{checked}> {label}
</label>
{hint}"#,
                name = escape(&param.name),
                label = escape(&label),
            )
        }
        ParamKind::StringEnum { variants } => {
            let mut options = String::new();
            if !param.required {
                options.push_str("<option value=\"\"></option>\n");
            }
            for variant in variants {
                let selected = if value.as_deref() == Some(variant.as_str()) {
                    " selected"
                } else {
                    ""
                };
                let _ = write!(
                    options,
                    "<option value=\"{v}\"{selected}>{v}</option>\n",
                    v = escape(variant),
                );
            }
            format!(
                r#"<label>{label}
<select name="{name}"{required_attr}>
{options}</select>
</label>
{hint}"#,
                label = escape(&label),
                name = escape(&param.name),
            )
        }
        ParamKind::Unsupported { type_name } => format!(
            r#"<p class="warning">Unsupported input type '{ty}' for '{name}'.</p>
"#,
            ty = escape(type_name),
            name = escape(&param.name),
        ),
    }
}

fn default_as_string(default: &Value) -> String {
    match default {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
