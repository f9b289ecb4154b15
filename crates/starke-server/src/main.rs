//! Starke server binary.
//!
//! Starts an axum HTTP server with structured logging, database
//! initialization, and graceful shutdown on SIGTERM/SIGINT.

use starke_auth::{Authenticator, TokenStore};
use starke_db::{ConnectionSettings, StorageLayout, StorageLocator};
use starke_server::config::{self, Config};
use starke_server::{app, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("STARKE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

/// An empty `root_dir` means there is no durable location. Relative paths
/// are anchored at the working directory; if that cannot be determined the
/// server runs from scratch only.
fn storage_layout(config: &Config) -> StorageLayout {
    let db = &config.database;
    let root_dir = match db.root_dir.trim() {
        "" => None,
        dir if PathBuf::from(dir).is_absolute() => Some(PathBuf::from(dir)),
        dir => match std::env::current_dir() {
            Ok(cwd) => Some(cwd.join(dir)),
            Err(e) => {
                tracing::warn!(error = %e, "cannot determine working directory, running without a durable database");
                None
            }
        },
    };

    let layout = match root_dir {
        Some(root) => StorageLayout::new(root, &db.scratch_dir),
        None => StorageLayout::scratch_only(&db.scratch_dir),
    };
    layout.with_file_name(&db.file_name)
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration: the server cannot start without valid config");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let storage = Arc::new(StorageLocator::new(
        storage_layout(&config),
        ConnectionSettings {
            busy_timeout: Duration::from_millis(config.database.busy_timeout_ms),
        },
    ));

    storage
        .initialize_schema()
        .expect("failed to initialize database schema, check database settings in config");
    tracing::info!(path = %storage.resolve_path().display(), "database ready");

    let auth = Arc::new(Authenticator::new(
        config.auth.clone(),
        TokenStore::new(config.token_file()),
    ));

    let state = AppState {
        storage,
        auth,
        allowed_origins: config.cors.allowed_origins.clone(),
        max_backup_bytes: config.database.max_backup_bytes,
    };

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting starke server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address, is another process using this port?");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("starke server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_root_dir_means_scratch_only() {
        let mut config = Config::default();
        config.database.root_dir = "  ".to_string();
        config.database.scratch_dir = PathBuf::from("/var/tmp");

        let layout = storage_layout(&config);
        assert!(layout.root_dir().is_none());
        assert_eq!(
            layout.scratch_path(),
            PathBuf::from("/var/tmp/database.sqlite3")
        );
    }

    #[test]
    fn relative_root_dir_is_anchored_at_working_directory() {
        let mut config = Config::default();
        config.database.root_dir = "data".to_string();
        config.database.file_name = "site.sqlite3".to_string();

        let layout = storage_layout(&config);
        let cwd = std::env::current_dir().expect("cwd");
        assert_eq!(layout.root_path(), Some(cwd.join("data").join("site.sqlite3")));
    }
}
