use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use starke_auth::{AuthSettings, Authenticator, TokenStore};
use starke_db::{ConnectionSettings, StorageLayout, StorageLocator};
use starke_server::{app, AppState};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestServer {
    _dir: TempDir,
    app: Router,
    token: String,
}

/// Scratch-only server. The schema is left uninitialized when `init` is
/// false so tests can observe a missing database file.
fn start(init: bool) -> TestServer {
    start_with_limit(init, starke_server::DEFAULT_MAX_BACKUP_BYTES)
}

fn start_with_limit(init: bool, max_backup_bytes: usize) -> TestServer {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let storage = StorageLocator::new(
        StorageLayout::scratch_only(dir.path().join("scratch")),
        ConnectionSettings::default(),
    );
    std::fs::create_dir_all(dir.path().join("scratch")).expect("should create scratch dir");
    if init {
        storage.initialize_schema().expect("schema should initialize");
    }

    let auth = Authenticator::new(
        AuthSettings {
            admin_password: "pw".to_string(),
            jwt_secret: "test-signing-key".to_string(),
            ..Default::default()
        },
        TokenStore::new(dir.path().join("tokens.json")),
    );
    let token = auth
        .login("Superadm@starkeST.com", "pw")
        .expect("login should succeed");

    let state = AppState {
        storage: Arc::new(storage),
        auth: Arc::new(auth),
        allowed_origins: vec!["https://starkest.vercel.app".to_string()],
        max_backup_bytes,
    };

    TestServer {
        _dir: dir,
        app: app(state),
        token,
    }
}

impl TestServer {
    async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("Authorization", format!("Bearer {}", self.token));
        let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));

        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn submit_message(&self, name: &str) {
        let (status, _) = self
            .request(
                "POST",
                "/api/messages",
                Some(json!({
                    "name": name,
                    "email": "a@example.com",
                    "subject": "s",
                    "message": "m"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn message_names(&self) -> Vec<String> {
        let (status, json) = self.request("GET", "/api/messages?page_size=100", None).await;
        assert_eq!(status, StatusCode::OK);
        let mut names: Vec<String> = json["items"]
            .as_array()
            .expect("items should be an array")
            .iter()
            .map(|m| m["name"].as_str().unwrap_or_default().to_string())
            .collect();
        names.sort();
        names
    }
}

#[tokio::test]
async fn info_reports_ephemeral_location_and_counts() {
    let server = start(true);
    server.submit_message("Ana").await;

    let (status, json) = server.request("GET", "/api/db-admin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let info = &json["info"];
    assert_eq!(info["exists"], true);
    assert_eq!(info["environment"], "ephemeral");
    assert!(info["size"].as_u64().unwrap_or_default() > 0);
    assert_eq!(info["tables"]["messages"]["count"], 1);
    assert_eq!(info["tables"]["budgets"]["count"], 0);
    assert!(info.get("error").is_none());
}

#[tokio::test]
async fn backup_of_missing_database_is_not_found() {
    let server = start(false);

    let (status, json) = server.request("GET", "/api/db-admin/backup", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());

    let (status, json) = server.request("GET", "/api/db-admin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["info"]["exists"], false);
    assert!(json["info"].get("tables").is_none());
}

#[tokio::test]
async fn backup_then_restore_rolls_data_back() {
    let server = start(true);
    server.submit_message("before backup").await;

    let (status, json) = server.request("GET", "/api/db-admin/backup", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let encoded = json["backup"].as_str().expect("backup should be a string").to_string();
    let image = STANDARD.decode(&encoded).expect("backup should be base64");
    assert_eq!(json["size"].as_u64(), Some(image.len() as u64));
    assert_eq!(json["restorable"], true);
    assert!(image.starts_with(b"SQLite format 3\0"));

    server.submit_message("after backup").await;
    assert_eq!(
        server.message_names().await,
        vec!["after backup", "before backup"]
    );

    let (status, json) = server
        .request("POST", "/api/db-admin/restore", Some(json!({ "backup": encoded })))
        .await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {json}");
    assert_eq!(json["success"], true);

    assert_eq!(server.message_names().await, vec!["before backup"]);
}

#[tokio::test]
async fn restore_rejects_bad_payloads() {
    let server = start(true);
    server.submit_message("survivor").await;

    let (status, json) = server
        .request("POST", "/api/db-admin/restore", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());

    let (status, _) = server
        .request(
            "POST",
            "/api/db-admin/restore",
            Some(json!({ "backup": "%%% not base64 %%%" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut corrupt = b"SQLite format 3\0".to_vec();
    corrupt.extend(std::iter::repeat(0x5A).take(2048));
    let (status, json) = server
        .request(
            "POST",
            "/api/db-admin/restore",
            Some(json!({ "backup": STANDARD.encode(&corrupt) })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].is_string());

    assert_eq!(server.message_names().await, vec!["survivor"]);
}

#[tokio::test]
async fn init_creates_schema_and_returns_info() {
    let server = start(false);

    let (status, json) = server.request("POST", "/api/db-admin/init", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["info"]["exists"], true);
    assert_eq!(json["info"]["tables"]["messages"]["count"], 0);

    // Running it again keeps existing rows.
    server.submit_message("kept").await;
    let (status, json) = server.request("POST", "/api/db-admin/init", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["info"]["tables"]["messages"]["count"], 1);
}

#[tokio::test]
async fn oversized_backup_is_flagged_and_its_restore_refused() {
    let server = start_with_limit(true, 1024);
    server.submit_message("kept").await;

    let (status, json) = server.request("GET", "/api/db-admin/backup", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["max_size"], 1024);
    assert_eq!(json["restorable"], false);
    let encoded = json["backup"].as_str().expect("backup should be a string").to_string();

    let (status, json) = server
        .request("POST", "/api/db-admin/restore", Some(json!({ "backup": encoded })))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json["error"].is_string(), "413 should carry a JSON error: {json}");

    assert_eq!(server.message_names().await, vec!["kept"]);
}
