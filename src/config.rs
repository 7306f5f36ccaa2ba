use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the editorial workflow
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EditorialConfig {
    /// Headless content store connection
    pub content_store: ContentStoreConfig,
    /// Workflow behaviour
    pub workflow: WorkflowConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Front-end revalidation webhook settings
    pub revalidation: RevalidationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentStoreConfig {
    /// Project identifier, used as the API host prefix
    pub project_id: String,
    /// Dataset holding the documents
    pub dataset: String,
    /// Dated API version, e.g. 2024-01-01
    pub api_version: String,
    /// Write token (can be set via SANITY_API_TOKEN)
    pub token: Option<String>,
    /// Serve reads from the CDN host. Writes always go to the API host.
    pub use_cdn: bool,
    /// Per-request timeout
    pub request_timeout_seconds: u64,
    /// Outgoing request rate limiting
    pub rate_limit: RateLimitConfig,
    /// How long dashboard listings stay cached
    pub list_cache_ttl_seconds: u64,
    /// Base URL replacing both derived hosts, e.g. a local proxy
    #[serde(default)]
    pub api_host: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Recorded as `changedBy` when the caller supplies no identity
    pub placeholder_actor: String,
    /// Capacity of the completion broadcast channel
    pub completion_channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RevalidationConfig {
    /// Shared webhook secret (can be set via SANITY_REVALIDATE_SECRET)
    pub secret: Option<String>,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            project_id: "irtwns5j".to_string(),
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            token: None, // Read from env var or config file
            use_cdn: false,
            request_timeout_seconds: 30,
            rate_limit: RateLimitConfig {
                requests_per_second: 10,
                burst_capacity: 25,
            },
            list_cache_ttl_seconds: 30,
            api_host: None,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            placeholder_actor: "Unknown Editor".to_string(),
            completion_channel_capacity: 64,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl Default for EditorialConfig {
    fn default() -> Self {
        Self {
            content_store: ContentStoreConfig::default(),
            workflow: WorkflowConfig::default(),
            observability: ObservabilityConfig::default(),
            revalidation: RevalidationConfig::default(),
        }
    }
}

impl EditorialConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (editorial-workflow.toml, .editorial-workflow-rc)
    /// 3. Environment variables (prefixed with EDITORIAL_WORKFLOW__)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as `load`, resolving configuration files relative to `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let toml_path = dir.join("editorial-workflow.toml");
        if toml_path.exists() {
            builder = builder.add_source(File::from(toml_path));
        }

        let rc_path = dir.join(".editorial-workflow-rc");
        if rc_path.exists() {
            builder = builder.add_source(File::from(rc_path).format(config::FileFormat::Toml));
        }

        // Nested keys use a double underscore: EDITORIAL_WORKFLOW__CONTENT_STORE__DATASET
        builder = builder.add_source(
            Environment::with_prefix("EDITORIAL_WORKFLOW")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut editorial_config: EditorialConfig = builder.build()?.try_deserialize()?;

        // Conventional variable names used by the rest of the site
        if editorial_config.content_store.token.is_none() {
            if let Ok(token) = std::env::var("SANITY_API_TOKEN") {
                editorial_config.content_store.token = Some(token);
            }
        }
        if editorial_config.revalidation.secret.is_none() {
            if let Ok(secret) = std::env::var("SANITY_REVALIDATE_SECRET") {
                editorial_config.revalidation.secret = Some(secret);
            }
        }

        Ok(editorial_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<EditorialConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = EditorialConfig::load_env_file();
        EditorialConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static EditorialConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
