//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use site_forms::config::AppConfig;
use site_forms::http::{ApiResponse, HttpServer};
use site_forms::lifecycle::Shutdown;
use site_forms::notifications::CaptureMailer;
use site_forms::storage::MemoryStore;

/// A server running on an ephemeral port with in-memory collaborators.
pub struct TestApp {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<CaptureMailer>,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST an urlencoded form to `/api/forms?action=<action>`.
    pub async fn submit(&self, action: &str, fields: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/forms?action={action}")))
            .form(fields)
            .send()
            .await
            .unwrap()
    }
}

/// Start the server with the given config and return its handles.
pub async fn spawn_app(config: AppConfig) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(CaptureMailer::new());
    let server = HttpServer::new(config, store.clone(), mailer.clone());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestApp {
        addr,
        store,
        mailer,
        shutdown,
        client: reqwest::Client::new(),
    }
}

/// Status and decoded body of a reply.
#[allow(dead_code)]
pub async fn reply(response: reqwest::Response) -> (u16, ApiResponse) {
    let status = response.status().as_u16();
    let body = response.json::<ApiResponse>().await.unwrap();
    (status, body)
}
