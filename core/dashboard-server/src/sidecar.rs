//! Proxy to the claude-mem sidecar's HTTP API.
//!
//! The sidecar is optional. Every call is bounded by the client timeout and
//! callers fall back to a `disconnected` shape when it is unreachable.

use std::time::Duration;

use axum::body::Bytes;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SidecarError {
    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

pub type SidecarResult<T> = std::result::Result<T, SidecarError>;

#[derive(Debug, Clone)]
pub struct SidecarClient {
    http: reqwest::Client,
    base_url: String,
}

impl SidecarClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SidecarResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GETs `path`. A non-JSON body comes back as a JSON string.
    pub async fn get(&self, path: &str) -> SidecarResult<Value> {
        let response = self.http.get(self.url(path)).send().await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// POSTs a JSON body and returns the upstream status and raw body.
    pub async fn post(&self, path: &str, body: &Value) -> SidecarResult<(StatusCode, Bytes)> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok((status, bytes))
    }

    /// Health, observations and projects fetched concurrently, each with its
    /// own fallback.
    pub async fn overview(&self) -> Value {
        let (health, observations, projects) = tokio::join!(
            self.get("/api/health"),
            self.get("/api/observations"),
            self.get("/api/projects"),
        );
        json!({
            "status": "connected",
            "health": health.unwrap_or_else(|err| {
                debug!(error = %err, "claude-mem health unavailable");
                json!({ "status": "disconnected" })
            }),
            "observations": observations.unwrap_or_else(|_| json!([])),
            "projects": projects.unwrap_or_else(|_| json!([])),
        })
    }

    pub async fn timeline(&self, anchor: Option<&str>) -> Value {
        let path = match anchor.filter(|anchor| !anchor.is_empty()) {
            Some(anchor) => format!("/api/timeline?anchor={}", urlencoding::encode(anchor)),
            None => "/api/timeline".to_string(),
        };
        self.get(&path).await.unwrap_or_else(disconnected)
    }

    /// Dispatches a GET under `/api/brain/claude-mem/`.
    pub async fn dispatch(&self, sub_path: &str, anchor: Option<&str>) -> Value {
        if sub_path.is_empty() {
            self.overview().await
        } else if sub_path.starts_with("timeline") {
            self.timeline(anchor).await
        } else if sub_path == "save" {
            json!({ "error": "Use POST method" })
        } else {
            json!({ "error": "Unknown claude-mem endpoint" })
        }
    }

    /// Forwards a memory to `/api/memory/save`.
    pub async fn save(&self, body: &Value) -> SidecarResult<Bytes> {
        let (status, bytes) = self.post("/api/memory/save", body).await?;
        debug!(status = %status, "claude-mem save relayed");
        Ok(bytes)
    }
}

fn disconnected(err: SidecarError) -> Value {
    json!({ "error": err.to_string(), "status": "disconnected" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::{Json, Router};

    async fn spawn_sidecar() -> String {
        let app = Router::new()
            .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
            .route("/api/observations", get(|| async { Json(json!([{ "id": 1 }])) }))
            .route("/api/projects", get(|| async { "not json" }))
            .route(
                "/api/timeline",
                get(|axum::extract::RawQuery(query): axum::extract::RawQuery| async move {
                    Json(json!({ "query": query }))
                }),
            )
            .route(
                "/api/memory/save",
                post(|Json(body): Json<Value>| async move { Json(json!({ "saved": body })) }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// A base URL nothing listens on.
    async fn dead_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn client(base: String) -> SidecarClient {
        SidecarClient::new(base, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_overview_combines_endpoints() {
        let sidecar = client(spawn_sidecar().await);

        let overview = sidecar.dispatch("", None).await;

        assert_eq!(overview["status"], "connected");
        assert_eq!(overview["health"], json!({ "status": "ok" }));
        assert_eq!(overview["observations"], json!([{ "id": 1 }]));
        assert_eq!(overview["projects"], "not json");
    }

    #[tokio::test]
    async fn test_overview_falls_back_when_unreachable() {
        let sidecar = client(dead_url().await);

        let overview = sidecar.overview().await;

        assert_eq!(
            overview,
            json!({
                "status": "connected",
                "health": { "status": "disconnected" },
                "observations": [],
                "projects": []
            })
        );
    }

    #[tokio::test]
    async fn test_timeline_encodes_anchor() {
        let sidecar = client(spawn_sidecar().await);

        let timeline = sidecar.dispatch("timeline", Some("a b")).await;

        assert_eq!(timeline["query"], "anchor=a%20b");
    }

    #[tokio::test]
    async fn test_timeline_unreachable_is_disconnected() {
        let sidecar = client(dead_url().await);

        let timeline = sidecar.timeline(None).await;

        assert_eq!(timeline["status"], "disconnected");
        assert!(timeline["error"].is_string());
    }

    #[tokio::test]
    async fn test_static_sub_paths() {
        let sidecar = client(dead_url().await);

        assert_eq!(sidecar.dispatch("save", None).await, json!({ "error": "Use POST method" }));
        assert_eq!(
            sidecar.dispatch("other", None).await,
            json!({ "error": "Unknown claude-mem endpoint" })
        );
    }

    #[tokio::test]
    async fn test_save_relays_body() {
        let sidecar = client(spawn_sidecar().await);

        let bytes = sidecar.save(&json!({ "text": "hi" })).await.unwrap();

        let relayed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(relayed, json!({ "saved": { "text": "hi" } }));
    }
}
