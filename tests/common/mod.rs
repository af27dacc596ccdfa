use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use justice_sync::config::{AgentConfig, ChatConfig};
use justice_sync::remote::FakeSessionService;
use justice_sync::storage::SqliteChatStore;
use justice_sync::SessionReconciler;

#[allow(dead_code)]
pub const TEST_USER: &str = "user-demo";

#[allow(dead_code)]
pub fn create_temp_store() -> (Arc<SqliteChatStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("cache.db");
    let store =
        SqliteChatStore::new_with_path(db_path).expect("failed to create sqlite store with path");
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn reopen_store(dir: &TempDir) -> Arc<SqliteChatStore> {
    Arc::new(
        SqliteChatStore::new_with_path(dir.path().join("cache.db"))
            .expect("failed to reopen sqlite store"),
    )
}

#[allow(dead_code)]
pub fn reconciler(
    store: Arc<SqliteChatStore>,
    remote: Arc<FakeSessionService>,
) -> SessionReconciler {
    SessionReconciler::new(store, remote, TEST_USER, ChatConfig::default())
}

#[allow(dead_code)]
pub fn agent_config(base_url: &str) -> AgentConfig {
    AgentConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
    }
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Base URL of a local port nothing listens on
#[allow(dead_code)]
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let port = listener.local_addr().expect("no local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
