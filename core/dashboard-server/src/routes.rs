//! HTTP route table and handlers.
//!
//! Every response carries permissive CORS headers and `Cache-Control:
//! no-cache`; any `OPTIONS` request is answered with an empty 200 before
//! routing. Unknown paths and unsupported methods answer 404 `Not found`.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use claude_dashboard_protocol::{
    ErrorResponse, GuardianActionRequest, LaunchRequest, ProjectRegistry,
    SuccessResponse, MAX_REQUEST_BYTES,
};
use dashboard_core::{
    aggregate_agent_sessions, list_reports, read_brain, read_guardian_status, BrainEndpoint,
    DashboardError, StateDocument,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::broadcast;
use crate::context::SharedContext;
use crate::launcher::{guardian_command, terminal_command};
use crate::static_files::{serve_file, NOT_FOUND_BODY, SERVER_ERROR_BODY};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const BAD_REQUEST_BODY: &str = "Bad request";

type HandlerResult = Result<Response, Response>;

pub fn build_router(ctx: SharedContext) -> Router {
    Router::new()
        // Pages and raw documents
        .route("/", only(get(index_page)))
        .route("/index.html", only(get(index_page)))
        .route("/brain", only(get(brain_page)))
        .route("/brain/", only(get(brain_page)))
        .route("/reports", only(get(reports_page)))
        .route("/reports/", only(get(reports_page)))
        .route("/projects-registry.json", only(get(registry_file)))
        .route("/token-usage.json", only(get(token_usage_file)))
        .route("/manifest.json", only(get(manifest_file)))
        .route("/sw.js", only(get(service_worker_file)))
        // State writes
        .route("/save-registry", only(post(save_registry)))
        .route("/update-tokens", only(post(update_tokens)))
        // Launching
        .route("/launch", only(post(launch)))
        .route("/api/guardian", only(get(guardian_status)))
        .route("/api/guardian/action", only(post(guardian_action)))
        // Second brain and sidecar
        .route(
            "/api/brain/claude-mem/save",
            only(get(claude_mem_save_get).post(claude_mem_save)),
        )
        .route("/api/brain/", only(get(brain_api_root)))
        .route("/api/brain/*endpoint", only(get(brain_api)))
        // Reports
        .route("/api/reports/list", only(get(reports_list)))
        .route("/api/reports/content", only(get(report_content)))
        .route("/api/agent-sessions", only(get(agent_sessions)))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(middleware::from_fn(cors_headers))
        .with_state(ctx)
}

/// Live-update listener: every path upgrades to a WebSocket.
pub fn build_live_router(ctx: SharedContext) -> Router {
    Router::new().fallback(broadcast::ws_route).with_state(ctx)
}

fn only(method_router: MethodRouter<SharedContext>) -> MethodRouter<SharedContext> {
    method_router.fallback(not_found)
}

async fn cors_headers(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], bytes).into_response(),
        Err(err) => {
            error!(error = %err, "Failed to serialize response");
            (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY).into_response()
        }
    }
}

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, BAD_REQUEST_BODY).into_response()
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|err| {
        warn!(error = %err, "POST error");
        bad_request()
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Static pages
// ═══════════════════════════════════════════════════════════════════════════════

async fn index_page(State(ctx): State<SharedContext>) -> Response {
    serve_file(&ctx.storage().dashboard_index()).await
}

async fn brain_page(State(ctx): State<SharedContext>) -> Response {
    serve_file(&ctx.storage().brain_index()).await
}

async fn reports_page(State(ctx): State<SharedContext>) -> Response {
    serve_file(&ctx.storage().reports_index()).await
}

async fn registry_file(State(ctx): State<SharedContext>) -> Response {
    serve_file(&ctx.storage().registry_file()).await
}

async fn token_usage_file(State(ctx): State<SharedContext>) -> Response {
    serve_file(&ctx.storage().token_usage_file()).await
}

async fn manifest_file(State(ctx): State<SharedContext>) -> Response {
    serve_file(&ctx.storage().manifest_file()).await
}

async fn service_worker_file(State(ctx): State<SharedContext>) -> Response {
    serve_file(&ctx.storage().service_worker_file()).await
}

// ═══════════════════════════════════════════════════════════════════════════════
// State writes
// ═══════════════════════════════════════════════════════════════════════════════

async fn save_registry(State(ctx): State<SharedContext>, body: Bytes) -> HandlerResult {
    save_document(&ctx, StateDocument::Registry, &body)
}

async fn update_tokens(State(ctx): State<SharedContext>, body: Bytes) -> HandlerResult {
    save_document(&ctx, StateDocument::TokenUsage, &body)
}

/// Replaces a document wholesale, then pushes a snapshot to live clients.
fn save_document(ctx: &SharedContext, document: StateDocument, body: &Bytes) -> HandlerResult {
    let value: Value = parse_body(body)?;

    if let Err(err) = ctx.store.save(document, &value) {
        error!(document = document.label(), error = %err, "Failed to save state document");
        return Err(json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse::new(err.to_string()),
        ));
    }

    info!(document = document.label(), "State document saved");
    ctx.broadcaster.notify_all();
    Ok(json_response(StatusCode::OK, &SuccessResponse::ok()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Launching
// ═══════════════════════════════════════════════════════════════════════════════

async fn launch(State(ctx): State<SharedContext>, body: Bytes) -> HandlerResult {
    let request: LaunchRequest = parse_body(&body)?;
    info!(command = %request.command, "Launching in terminal");
    ctx.launcher.spawn(terminal_command(ctx.platform, &request.command));
    Ok(json_response(StatusCode::OK, &SuccessResponse::ok()))
}

async fn guardian_action(State(ctx): State<SharedContext>, body: Bytes) -> HandlerResult {
    let request: GuardianActionRequest = parse_body(&body)?;
    let action = request.parse_action().map_err(|err| {
        warn!(action = %request.action, "Unknown guardian action");
        json_response(StatusCode::BAD_REQUEST, &ErrorResponse::new(err.to_string()))
    })?;

    let command = guardian_command(
        ctx.platform,
        action,
        request.folder.as_deref(),
        &ctx.guardian_paths(),
    );
    info!(action = %action, program = %command.program, "Running guardian action");
    ctx.launcher.spawn(command);
    Ok(json_response(StatusCode::OK, &SuccessResponse::for_action(action)))
}

async fn guardian_status(State(ctx): State<SharedContext>) -> Response {
    json_response(StatusCode::OK, &read_guardian_status(ctx.storage()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Second brain
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
struct AnchorQuery {
    anchor: Option<String>,
}

async fn brain_api(
    State(ctx): State<SharedContext>,
    Path(endpoint): Path<String>,
    Query(query): Query<AnchorQuery>,
) -> Response {
    let data = match BrainEndpoint::parse(&endpoint) {
        BrainEndpoint::ClaudeMem(sub_path) => {
            ctx.sidecar.dispatch(sub_path, query.anchor.as_deref()).await
        }
        local => read_brain(ctx.storage(), local),
    };
    json_response(StatusCode::OK, &data)
}

/// Empty endpoint name: nothing to read.
async fn brain_api_root() -> Response {
    json_response(StatusCode::OK, &json!({}))
}

async fn claude_mem_save_get(State(ctx): State<SharedContext>) -> Response {
    json_response(StatusCode::OK, &ctx.sidecar.dispatch("save", None).await)
}

async fn claude_mem_save(State(ctx): State<SharedContext>, body: Bytes) -> HandlerResult {
    let memory: Value = parse_body(&body)?;
    match ctx.sidecar.save(&memory).await {
        Ok(upstream) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
            upstream,
        )
            .into_response()),
        Err(err) => {
            warn!(error = %err, "claude-mem save failed");
            Err(json_response(
                StatusCode::BAD_GATEWAY,
                &ErrorResponse::new(format!("Claude-Mem unavailable: {err}")),
            ))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Reports
// ═══════════════════════════════════════════════════════════════════════════════

async fn reports_list(State(ctx): State<SharedContext>) -> Response {
    json_response(StatusCode::OK, &list_reports(ctx.storage()))
}

#[derive(Debug, Default, Deserialize)]
struct ReportQuery {
    file: Option<String>,
}

async fn report_content(State(ctx): State<SharedContext>, Query(query): Query<ReportQuery>) -> Response {
    let requested = query.file.unwrap_or_default();
    match ctx.reports.read_report(&requested) {
        Ok(content) => json_response(StatusCode::OK, &json!({ "content": content })),
        Err(DashboardError::AccessDenied { path, reason }) => {
            warn!(path = %path.display(), reason = %reason, "Report access denied");
            json_response(StatusCode::FORBIDDEN, &ErrorResponse::new("Access denied"))
        }
        Err(err) => {
            if !matches!(err, DashboardError::FileNotFound(_)) {
                warn!(error = %err, "Failed to read report");
            }
            json_response(StatusCode::NOT_FOUND, &ErrorResponse::new("File not found"))
        }
    }
}

async fn agent_sessions(State(ctx): State<SharedContext>) -> Response {
    let registry = ctx.store.load_registry().unwrap_or_else(|err| {
        warn!(error = %err, "Registry unreadable, skipping progress updates");
        ProjectRegistry::default()
    });
    let today = chrono::Utc::now().date_naive();
    json_response(
        StatusCode::OK,
        &aggregate_agent_sessions(ctx.storage(), &registry, today),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use dashboard_core::StorageConfig;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::ServerConfig;
    use crate::context::ServerContext;
    use crate::launcher::RecordingLauncher;
    use crate::sidecar::SidecarClient;

    struct Harness {
        temp: TempDir,
        ctx: SharedContext,
        launcher: Arc<RecordingLauncher>,
    }

    impl Harness {
        async fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let storage = StorageConfig::with_home(temp.path().to_path_buf());

            // Reserve then release a port so sidecar calls are refused.
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let sidecar_url = format!("http://{}", listener.local_addr().unwrap());
            drop(listener);

            let config = ServerConfig {
                http_addr: "127.0.0.1:0".parse().unwrap(),
                ws_addr: "127.0.0.1:0".parse().unwrap(),
                sidecar_url: sidecar_url.clone(),
                sidecar_timeout: Duration::from_secs(2),
                storage,
            };
            let launcher = Arc::new(RecordingLauncher::default());
            let sidecar = SidecarClient::new(sidecar_url, Duration::from_secs(2)).unwrap();
            let ctx = Arc::new(ServerContext::new(config, launcher.clone(), sidecar));
            Self { temp, ctx, launcher }
        }

        fn storage(&self) -> &StorageConfig {
            self.ctx.storage()
        }

        fn write(&self, path: &std::path::Path, content: &str) {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        async fn send(&self, request: HttpRequest<Body>) -> Response {
            build_router(self.ctx.clone()).oneshot(request).await.unwrap()
        }

        async fn get(&self, uri: &str) -> Response {
            self.send(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn post(&self, uri: &str, body: &str) -> Response {
            self.send(
                HttpRequest::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response.headers()[header::CONTENT_TYPE].to_str().unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Static + headers
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_index_served_with_cors_headers() {
        let h = Harness::new().await;
        h.write(&h.storage().dashboard_index(), "<h1>dash</h1>");

        let response = h.get("/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "text/html; charset=utf-8");
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
        assert_eq!(headers["cache-control"], "no-cache");
        assert_eq!(body_text(response).await, "<h1>dash</h1>");
    }

    #[tokio::test]
    async fn test_brain_and_reports_pages() {
        let h = Harness::new().await;
        h.write(&h.storage().brain_index(), "brain");
        h.write(&h.storage().reports_index(), "reports");

        assert_eq!(body_text(h.get("/brain/").await).await, "brain");
        assert_eq!(body_text(h.get("/reports").await).await, "reports");
    }

    #[tokio::test]
    async fn test_missing_page_is_not_found() {
        let h = Harness::new().await;

        let response = h.get("/index.html").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Not found");
    }

    #[tokio::test]
    async fn test_missing_json_documents_are_empty_objects() {
        let h = Harness::new().await;

        for uri in ["/projects-registry.json", "/token-usage.json", "/manifest.json"] {
            let response = h.get(uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert_eq!(content_type(&response), "application/json; charset=utf-8");
            assert_eq!(body_text(response).await, "{}");
        }
    }

    #[tokio::test]
    async fn test_service_worker_content_type() {
        let h = Harness::new().await;
        h.write(&h.storage().service_worker_file(), "self.addEventListener('x', () => {});");

        let response = h.get("/sw.js").await;

        assert_eq!(content_type(&response), "application/javascript");
    }

    #[tokio::test]
    async fn test_options_is_empty_ok() {
        let h = Harness::new().await;

        let response = h
            .send(
                HttpRequest::builder()
                    .method("OPTIONS")
                    .uri("/save-registry")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn test_unknown_path_and_wrong_method_are_not_found() {
        let h = Harness::new().await;

        let unknown = h.get("/does-not-exist").await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
        assert_eq!(unknown.headers()["cache-control"], "no-cache");

        let wrong_method = h.get("/save-registry").await;
        assert_eq!(wrong_method.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(wrong_method).await, "Not found");
    }

    // ─────────────────────────────────────────────────────────────────────
    // State writes
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_save_registry_persists_and_broadcasts() {
        let h = Harness::new().await;
        let (_id, mut rx) = h.ctx.broadcaster.register();
        let registry = json!({"projects": [{"id": "p1", "name": "Demo", "status": "active"}]});

        let response = h.post("/save-registry", &registry.to_string()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "application/json; charset=utf-8");
        assert_eq!(body_json(response).await, json!({"success": true}));

        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(h.storage().registry_file()).unwrap()).unwrap();
        assert_eq!(on_disk, registry);

        let update: Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(
            update,
            json!({"type": "update", "projects": registry["projects"], "tokens": {}})
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_malformed_save_is_bad_request_without_change() {
        let h = Harness::new().await;
        let (_id, mut rx) = h.ctx.broadcaster.register();

        let response = h.post("/save-registry", "{\"projects\": [").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Bad request");
        assert!(!h.storage().registry_file().exists());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_saved_registry_is_served_back_exactly() {
        let h = Harness::new().await;
        h.write(
            &h.storage().registry_file(),
            r#"{"projects": [{"id": "old", "status": "active"}]}"#,
        );
        let replacement = json!({
            "projects": [
                {"id": "a", "name": "Alpha", "status": "active"},
                {"id": "b", "name": "Beta", "status": "paused"}
            ]
        });

        let response = h.post("/save-registry", &replacement.to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let served = body_json(h.get("/projects-registry.json").await).await;
        assert_eq!(served, replacement);
    }

    #[tokio::test]
    async fn test_update_tokens_replaces_document() {
        let h = Harness::new().await;
        h.post("/update-tokens", r#"{"today": 5, "week": 9}"#).await;

        let response = h.post("/update-tokens", r#"{"today": 6}"#).await;
        assert_eq!(response.status(), StatusCode::OK);

        let served = body_json(h.get("/token-usage.json").await).await;
        assert_eq!(served, json!({"today": 6}));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Launching
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_launch_spawns_terminal_command() {
        let h = Harness::new().await;

        let response = h.post("/launch", r#"{"command": "cd ~/p && claude"}"#).await;

        assert_eq!(body_json(response).await, json!({"success": true}));
        let commands = h.launcher.commands();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].args.iter().any(|arg| arg.contains("cd ~/p && claude")));
        assert_eq!(commands[0].timeout, None);
    }

    #[tokio::test]
    async fn test_launch_without_command_is_bad_request() {
        let h = Harness::new().await;

        let response = h.post("/launch", r#"{"cmd": "x"}"#).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.launcher.commands().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_guardian_action_spawns_nothing() {
        let h = Harness::new().await;

        let response = h.post("/api/guardian/action", r#"{"action": "format-disk"}"#).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "Unknown action: format-disk"}));
        assert!(h.launcher.commands().is_empty());
    }

    #[tokio::test]
    async fn test_non_string_guardian_action_is_echoed() {
        let h = Harness::new().await;

        let numeric = h.post("/api/guardian/action", r#"{"action": 5}"#).await;
        assert_eq!(numeric.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(numeric).await, json!({"error": "Unknown action: 5"}));

        let missing = h.post("/api/guardian/action", r#"{"folder": "/tmp"}"#).await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(missing).await,
            json!({"error": "Unknown action: undefined"})
        );
        assert!(h.launcher.commands().is_empty());
    }

    #[tokio::test]
    async fn test_known_guardian_action_spawns_with_timeout() {
        let h = Harness::new().await;

        let response = h.post("/api/guardian/action", r#"{"action": "cleanup"}"#).await;

        assert_eq!(
            body_json(response).await,
            json!({"success": true, "action": "cleanup"})
        );
        let commands = h.launcher.commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].label, "cleanup");
        assert!(commands[0].args.iter().any(|arg| arg.ends_with("cleanup-all.ps1")));
        assert_eq!(commands[0].timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_guardian_status_shape() {
        let h = Harness::new().await;
        h.write(&h.storage().guardian_state_file(), r#"{"sessionCount": 4}"#);

        let status = body_json(h.get("/api/guardian").await).await;

        assert_eq!(status["sessionCount"], 4);
        assert_eq!(status["running"], false);
        assert!(status["recentLog"].is_array());
        assert!(status["freeRAMMB"].is_u64());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Second brain + sidecar
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_brain_profile_and_unknown() {
        let h = Harness::new().await;
        h.write(&h.storage().profile_dir().join("me.md"), "# Me");

        assert_eq!(body_json(h.get("/api/brain/profile").await).await, json!({"me": "# Me"}));
        assert_eq!(body_json(h.get("/api/brain/whatever").await).await, json!({}));
    }

    #[tokio::test]
    async fn test_brain_without_endpoint_is_empty() {
        let h = Harness::new().await;

        let response = h.get("/api/brain/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({}));
    }

    #[tokio::test]
    async fn test_claude_mem_overview_when_sidecar_down() {
        let h = Harness::new().await;

        let response = h.get("/api/brain/claude-mem").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "connected");
        assert_eq!(body["health"], json!({"status": "disconnected"}));
        assert_eq!(body["observations"], json!([]));
    }

    #[tokio::test]
    async fn test_claude_mem_save_via_get() {
        let h = Harness::new().await;

        let body = body_json(h.get("/api/brain/claude-mem/save").await).await;

        assert_eq!(body, json!({"error": "Use POST method"}));
    }

    #[tokio::test]
    async fn test_claude_mem_save_when_sidecar_down_is_bad_gateway() {
        let h = Harness::new().await;

        let response = h.post("/api/brain/claude-mem/save", r#"{"text": "remember"}"#).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Claude-Mem unavailable: "));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reports
    // ─────────────────────────────────────────────────────────────────────

    fn content_uri(path: &std::path::Path) -> String {
        format!(
            "/api/reports/content?file={}",
            urlencoding::encode(&path.to_string_lossy())
        )
    }

    #[tokio::test]
    async fn test_reports_list_sorted() {
        let h = Harness::new().await;
        h.write(&h.storage().daily_dir().join("daily-2024-03-01.md"), "a");
        h.write(&h.storage().daily_dir().join("daily-2024-03-05.md"), "b");

        let list = body_json(h.get("/api/reports/list").await).await;

        assert_eq!(list["missions"], json!([]));
        assert_eq!(list["daily"][0]["date"], "2024-03-05");
        assert_eq!(list["daily"][0]["name"], "סיכום יומי 2024-03-05");
        assert_eq!(list["daily"][1]["date"], "2024-03-01");
    }

    #[tokio::test]
    async fn test_report_content_allowed() {
        let h = Harness::new().await;
        let file = h.storage().weekly_dir().join("synthesis-2024-03-03.md");
        h.write(&file, "# Weekly");

        let response = h.get(&content_uri(&file)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"content": "# Weekly"}));
    }

    #[tokio::test]
    async fn test_report_content_traversal_denied() {
        let h = Harness::new().await;
        h.write(&h.temp.path().join("secret.md"), "secret");
        let sneaky = h.storage().daily_dir().join("../../../secret.md");

        let response = h.get(&content_uri(&sneaky)).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await, json!({"error": "Access denied"}));
    }

    #[tokio::test]
    async fn test_report_content_wrong_extension_denied() {
        let h = Harness::new().await;
        let file = h.storage().daily_dir().join("daily-2024-03-01.txt");
        h.write(&file, "plain text");

        let response = h.get(&content_uri(&file)).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await, json!({"error": "Access denied"}));
    }

    #[tokio::test]
    async fn test_report_content_without_file_denied() {
        let h = Harness::new().await;

        let response = h.get("/api/reports/content").await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_report_content_missing_file() {
        let h = Harness::new().await;
        let file = h.storage().documents_dir().join("night-mission-report-2024-01-01.md");

        let response = h.get(&content_uri(&file)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "File not found"}));
    }

    #[tokio::test]
    async fn test_agent_sessions_keep_progress_beside_malformed_entries() {
        let h = Harness::new().await;
        let folder = h.temp.path().join("work").join("alpha");
        h.write(
            &folder.join("PROGRESS.md"),
            "Last Updated: 2024-05-01\n\n## Current State\nShipping\n",
        );
        let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let registry = json!({
            "projects": [
                {
                    "id": "alpha",
                    "name": "Alpha",
                    "status": "active",
                    "folder": folder.to_string_lossy(),
                    "lastSession": today
                },
                {"id": 7, "status": null},
                "garbage"
            ]
        });
        h.write(&h.storage().registry_file(), &registry.to_string());

        let sessions = body_json(h.get("/api/agent-sessions").await).await;

        let updates = sessions["progressUpdates"].as_array().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0]["projectId"], "alpha");
        assert_eq!(updates[0]["lastUpdated"], "2024-05-01");
    }

    #[tokio::test]
    async fn test_agent_sessions_shape() {
        let h = Harness::new().await;

        let sessions = body_json(h.get("/api/agent-sessions").await).await;

        assert_eq!(
            sessions,
            json!({
                "sessions": [],
                "lastMission": null,
                "stats": {"totalMissions": 0, "totalAgents": 0, "totalSuccess": 0},
                "progressUpdates": []
            })
        );
    }
}
