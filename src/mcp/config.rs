use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

/// Contents of the MCP server file (`mcp.json` by default):
///
/// ```json
/// {
///   "mcpServers": {
///     "time": { "command": "npx", "args": ["-y", "@mcpcentral/mcp-time"] },
///     "local": { "url": "http://127.0.0.1:9100/mcp" }
///   }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct McpConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: HashMap<String, McpServerEntry>,
}

/// Launch spec for one MCP server. Immutable after load.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum McpServerEntry {
    /// Subprocess reached over stdin/stdout pipes.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default)]
        cwd: Option<String>,
    },
    /// Streamable-HTTP endpoint (the bundled mock uses this shape too).
    Http {
        url: String,
        #[serde(default)]
        env: HashMap<String, String>,
    },
}

impl McpServerEntry {
    /// One-line transport summary for the servers page.
    pub fn summary(&self) -> String {
        match self {
            Self::Stdio { command, args, .. } => {
                if args.is_empty() {
                    format!("stdio: {command}")
                } else {
                    format!("stdio: {command} {}", args.join(" "))
                }
            }
            Self::Http { url, .. } => format!("http: {url}"),
        }
    }

    pub fn transport_kind(&self) -> &'static str {
        match self {
            Self::Stdio { .. } => "stdio",
            Self::Http { .. } => "http",
        }
    }
}

pub fn load_mcp_config(path: impl AsRef<Path>) -> anyhow::Result<McpConfig> {
    let txt = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&txt)?)
}

/// Expand "${VAR}" placeholders from the process environment.
/// A placeholder whose variable is unset is left unchanged.
pub fn expand_env_placeholders(input: &str) -> String {
    let mut out = input.to_string();
    for (k, v) in std::env::vars() {
        let needle = format!("${{{k}}}");
        if out.contains(&needle) {
            out = out.replace(&needle, &v);
        }
    }
    out
}

pub fn expand_env_map(map: &HashMap<String, String>) -> HashMap<String, String> {
    map.iter()
        .map(|(k, v)| (k.clone(), expand_env_placeholders(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stdio_and_http_entries() {
        let json = r#"{
            "mcpServers": {
                "time": { "command": "npx", "args": ["-y", "mcp-time"], "cwd": "/tmp" },
                "remote": { "url": "http://127.0.0.1:9100/mcp" }
            }
        }"#;
        let cfg: McpConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.mcp_servers.len(), 2);

        match &cfg.mcp_servers["time"] {
            McpServerEntry::Stdio {
                command, args, cwd, ..
            } => {
                assert_eq!(command, "npx");
                assert_eq!(args, &["-y".to_string(), "mcp-time".to_string()]);
                assert_eq!(cwd.as_deref(), Some("/tmp"));
            }
            McpServerEntry::Http { .. } => panic!("expected stdio entry"),
        }
        match &cfg.mcp_servers["remote"] {
            McpServerEntry::Http { url, .. } => assert_eq!(url, "http://127.0.0.1:9100/mcp"),
            McpServerEntry::Stdio { .. } => panic!("expected http entry"),
        }
    }

    #[test]
    fn empty_file_means_zero_servers() {
        let cfg: McpConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.mcp_servers.is_empty());
    }

    #[test]
    fn expands_known_placeholders_and_keeps_unknown() {
        // SAFETY: test-only variable name that nothing else reads.
        unsafe {
            std::env::set_var("COCKPIT_TEST_TOKEN", "sekrit");
        }
        let expanded = expand_env_placeholders("${COCKPIT_TEST_TOKEN}/${COCKPIT_TEST_MISSING}");
        assert_eq!(expanded, "sekrit/${COCKPIT_TEST_MISSING}");
    }

    #[test]
    fn summary_formats_both_transports() {
        let stdio = McpServerEntry::Stdio {
            command: "uvx".into(),
            args: vec!["mcp-server-git".into()],
            env: HashMap::new(),
            cwd: None,
        };
        assert_eq!(stdio.summary(), "stdio: uvx mcp-server-git");

        let http = McpServerEntry::Http {
            url: "http://127.0.0.1:8001/mcp".into(),
            env: HashMap::new(),
        };
        assert_eq!(http.summary(), "http: http://127.0.0.1:8001/mcp");
    }
}
