//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a temporary resources root holding
//! the default image, a `wiremock` stand-in for the metadata service, and the
//! full router served on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{extract::Request, ServiceExt};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tempfile::TempDir;
use wiremock::MockServer;

use file_manager::config::{Config, CrudConfig, ServerConfig, StorageConfig};
use file_manager::server::{create_router, AppContext};

/// Content of `default/default.png` in every harness.
pub const DEFAULT_IMAGE: &[u8] = b"\x89PNG\r\n\x1a\n default image";

pub struct TestHarness {
    pub resources: TempDir,
    pub crud: MockServer,
    pub addr: SocketAddr,
}

impl TestHarness {
    /// Start a mock metadata service and the file manager on random ports.
    pub async fn start() -> Self {
        let resources = tempfile::tempdir().expect("failed to create resources dir");
        std::fs::create_dir_all(resources.path().join("default")).unwrap();
        std::fs::write(resources.path().join("default/default.png"), DEFAULT_IMAGE).unwrap();

        let crud = MockServer::start().await;
        let config = Self::config_for(&resources, &crud);
        let app = create_router(AppContext::new(config).expect("failed to build app context"));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
                .await
                .ok();
        });

        Self {
            resources,
            crud,
            addr,
        }
    }

    /// Configuration pointing at the temporary root and the mock service.
    pub fn config_for(resources: &TempDir, crud: &MockServer) -> Config {
        let crud_addr = crud.address();
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_body_bytes: 4 * 1024 * 1024,
            },
            storage: StorageConfig {
                resources_path: resources.path().to_path_buf(),
            },
            crud: CrudConfig {
                host: crud_addr.ip().to_string(),
                port: crud_addr.port(),
                timeout_secs: Some(5),
            },
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Place an image file at `{root}/{entity_id}/{file_path}`.
    pub fn write_image(&self, entity_id: &str, file_path: &str, data: &[u8]) {
        let dir = self.resources.path().join(entity_id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file_path), data).unwrap();
    }

    /// Number of requests the mock metadata service has received.
    pub async fn crud_calls(&self) -> usize {
        self.crud
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

pub fn b64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn unb64(value: &serde_json::Value) -> Vec<u8> {
    STANDARD
        .decode(value.as_str().expect("imagebytes should be a string"))
        .expect("imagebytes should be base64")
}
