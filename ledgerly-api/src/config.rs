use config::ConfigError;
use ledgerly_agents::settings::{build_config, default_config_path};
use ledgerly_agents::LlmSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub cors: Option<CorsConfig>,
    pub llm: LlmSettings,
    pub storage: StorageConfig,
    pub frontend: Option<FrontendConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Scratch space for uploads while they are processed
    pub uploads_dir: PathBuf,
    /// Generated CSV files, served under `/downloads`
    pub downloads_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            downloads_dir: PathBuf::from("downloads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FrontendConfig {
    pub build_dir: PathBuf,
}

const DEFAULT_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 5000

# Leave unset (or empty) to allow any origin
# [cors]
# allowed_origins = ["http://localhost:3000"]

[llm]
base_url = "https://openrouter.ai/api/v1"
# api_key = "sk-or-..."  (falls back to OPENROUTER_API_KEY)
# model = "qwen/qwen3-235b-a22b-2507"  (falls back to OPENROUTER_MODEL)
temperature = 0.2
max_tokens = 4096
json_mode = true

[storage]
uploads_dir = "uploads"
downloads_dir = "downloads"
max_upload_bytes = 20971520

# [frontend]
# build_dir = "frontend/build"
"#;

impl ApiConfig {
    /// Loads the config at `path` (or the default location), writing a
    /// commented default file first if none exists.
    pub fn load(path: Option<PathBuf>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.unwrap_or_else(default_config_path);

        if !config_path.exists() {
            write_default_config(&config_path)?;
        }

        let mut config: ApiConfig = build_config(&config_path)?.try_deserialize()?;
        config.llm = config.llm.with_env_fallbacks();

        Ok((config, config_path))
    }
}

fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::Message(format!("Failed to create config directory: {e}"))
        })?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| ConfigError::Message(format!("Failed to write default config: {e}")))
}
