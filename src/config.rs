use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Host for the GUI listener
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port for the GUI listener
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to the MCP server file
    #[arg(long, env = "MCP_CONFIG")]
    pub mcp_config: Option<String>,

    /// Disable the bundled mock server
    #[arg(long, env = "MOCK_DISABLED")]
    pub mock_disabled: bool,

    /// Port for the bundled mock server
    #[arg(long, env = "MOCK_PORT")]
    pub mock_port: Option<u16>,
}

/// Application configuration. Loaded once at startup, immutable afterward.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mock: MockConfig,
    pub mcp: McpSettings,
}

/// GUI listener. Loopback by default; this is a single-user desktop tool.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MockConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct McpSettings {
    /// Path to the JSON file listing external MCP servers.
    pub config_path: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Layering: defaults -> optional config file -> `COCKPIT_*` env vars ->
    /// CLI flags (clap also resolves per-flag env fallbacks).
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("mock.enabled", true)?
            .set_default("mock.port", 8001)?
            .set_default("mcp.config_path", "mcp.json")?;

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config").required(false));
        }

        // E.g. COCKPIT_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("COCKPIT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(path) = cli.mcp_config {
            builder = builder.set_override("mcp.config_path", path)?;
        }
        if cli.mock_disabled {
            builder = builder.set_override("mock.enabled", false)?;
        }
        if let Some(port) = cli.mock_port {
            builder = builder.set_override("mock.port", i64::from(port))?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
