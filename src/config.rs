use std::env;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

/// Runtime configuration for the Q&A service.
///
/// Loaded from a TOML file (path taken from `DIANLI_QA_CONFIG`, falling back
/// to `config.toml` in the working directory); a missing file yields the
/// defaults. API keys and model names are never process-wide constants: the
/// relevant section is handed to each component at construction time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub agent: AgentConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub api_key: String,
    pub base_url: String,
    pub generation_model: String,
    pub rerank_model: String,
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.siliconflow.cn/v1".to_string(),
            generation_model: "deepseek-ai/DeepSeek-R1-Distill-Qwen-32B".to_string(),
            rerank_model: "Qwen/Qwen3-Reranker-8B".to_string(),
            top_k: 3,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/dianli_jiaoyi.db"),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var("DIANLI_QA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            toml::from_str::<AppConfig>(&raw)?
        } else {
            AppConfig::default()
        };

        if let Ok(key) = env::var("DIANLI_QA_API_KEY") {
            config.agent.api_key = key;
        }
        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.server.port = port;
            }
        }

        if config.agent.top_k == 0 {
            anyhow::bail!("agent.top_k must be at least 1");
        }

        Ok(config)
    }
}

/// Filesystem locations owned by the service process.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let log_dir = env::var("DIANLI_QA_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));
        let _ = fs::create_dir_all(&log_dir);
        AppPaths { log_dir }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
