use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub crud: CrudConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for request bodies. Uploads carry base64 image data, so
    /// this is well above axum's 2 MiB default.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_body_bytes() -> usize {
    32 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory holding one subdirectory per entity plus `default/default.png`
    #[serde(default = "default_resources_path")]
    pub resources_path: PathBuf,
}

fn default_resources_path() -> PathBuf {
    PathBuf::from("./resources")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            resources_path: default_resources_path(),
        }
    }
}

/// Location of the metadata (CRUD) service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrudConfig {
    #[serde(default = "default_crud_host")]
    pub host: String,

    #[serde(default = "default_crud_port")]
    pub port: u16,

    /// Request timeout in seconds. Unset means requests wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_crud_host() -> String {
    "localhost".to_string()
}
fn default_crud_port() -> u16 {
    8081
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            host: default_crud_host(),
            port: default_crud_port(),
            timeout_secs: None,
        }
    }
}

impl CrudConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Values supplied on the command line or through the environment that take
/// precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub resources_path: Option<PathBuf>,
    pub crud_host: Option<String>,
    pub crud_port: Option<u16>,
}
