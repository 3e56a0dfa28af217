use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Environment prefix for layered settings, e.g. `PORTAL_SERVER__PORT=8000`.
const ENV_PREFIX: &str = "PORTAL";

/// Config file picked up from the working directory when none is given.
const CWD_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Identity backend: `firebase` or `memory`
    #[arg(long, env = "IDENTITY_PROVIDER")]
    pub identity_provider: Option<String>,

    /// Chat completion endpoint
    #[arg(long, env = "CHAT_ENDPOINT")]
    pub chat_endpoint: Option<String>,

    /// Enable rate limiting on credential submissions
    #[arg(long, env = "RATE_LIMIT_ENABLED")]
    pub rate_limit_enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub chat: ChatConfig,
    pub crypto: CryptoConfig,
    pub session: SessionConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    /// `firebase` or `memory`.
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    pub auth_base_url: String,
    pub firestore_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_upload_bytes: usize,
}

#[derive(Deserialize, Clone)]
pub struct CryptoConfig {
    /// Base64 encoded 32-byte secretbox key shared with the chat backend.
    pub role_key: String,
}

impl std::fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("role_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_minutes: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub rate_limit_enabled: bool,
    /// Per client address.
    pub requests_per_second: u32,
    pub burst_size: u32,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "static")?
            .set_default("identity.provider", "firebase")?
            .set_default(
                "identity.auth_base_url",
                "https://identitytoolkit.googleapis.com/v1",
            )?
            .set_default(
                "identity.firestore_base_url",
                "https://firestore.googleapis.com/v1",
            )?
            .set_default("chat.endpoint", "http://localhost:5000/generate-query")?
            .set_default("chat.timeout_secs", 120)?
            .set_default("chat.max_upload_bytes", 10 * 1024 * 1024)?
            .set_default("session.cookie_name", "portal_session")?
            .set_default("session.ttl_minutes", 30)?
            .set_default("resilience.rate_limit_enabled", true)?
            .set_default("resilience.requests_per_second", 5)?
            .set_default("resilience.burst_size", 10)?
            .set_default("resilience.request_timeout_secs", 150)?;

        // Explicit file wins over ./config.yaml
        match &cli.config {
            Some(path) => {
                builder = builder.add_source(File::new(path, FileFormat::Yaml).required(true));
            }
            None if Path::new(CWD_CONFIG_FILE).exists() => {
                builder = builder
                    .add_source(File::new(CWD_CONFIG_FILE, FileFormat::Yaml).required(false));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags (and their plain env aliases) take priority over everything else
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(provider) = cli.identity_provider {
            builder = builder.set_override("identity.provider", provider)?;
        }
        if let Some(endpoint) = cli.chat_endpoint {
            builder = builder.set_override("chat.endpoint", endpoint)?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("resilience.rate_limit_enabled", rl)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        match self.identity.provider.as_str() {
            "memory" => {}
            "firebase" => {
                if self.identity.api_key.trim().is_empty() {
                    return Err(config::ConfigError::Message(
                        "identity.api_key is required for the firebase provider".to_string(),
                    ));
                }
                if self.identity.project_id.trim().is_empty() {
                    return Err(config::ConfigError::Message(
                        "identity.project_id is required for the firebase provider".to_string(),
                    ));
                }
            }
            other => {
                return Err(config::ConfigError::Message(format!(
                    "unknown identity.provider: {other}"
                )));
            }
        }
        if self.resilience.requests_per_second == 0 || self.resilience.burst_size == 0 {
            return Err(config::ConfigError::Message(
                "resilience.requests_per_second and resilience.burst_size must be positive"
                    .to_string(),
            ));
        }
        if self.chat.endpoint.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "chat.endpoint cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
