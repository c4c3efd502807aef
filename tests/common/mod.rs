//! Shared helpers for integration tests.

use std::net::SocketAddr;

use data_ingest::config::AppConfig;
use data_ingest::lifecycle::startup::build_state;
use data_ingest::{HttpServer, Shutdown};
use tokio::net::TcpListener;

pub const API_TOKEN: &str = "test-api-token";
pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "123456";

/// A running server on an ephemeral port with an in-memory database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.database.url = ":memory:".into();
    config.auth.api_token = API_TOKEN.into();
    config.auth.secret_key = "integration-test-secret-key".into();
    config
}

/// Start the service with one account (`admin` / `123456`).
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: AppConfig) -> TestApp {
    let state = build_state(config).expect("state builds");
    state
        .users
        .upsert_user(USERNAME, PASSWORD)
        .await
        .expect("seed user");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(state);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestApp { addr, shutdown }
}

/// Client that keeps cookies and does not follow redirects.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
