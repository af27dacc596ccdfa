//! Test utilities for Justice Sync
//!
//! Temporary directories, configuration fixtures, and builders for the
//! remote descriptors and cache records most tests start from.

use crate::config::Config;
use crate::remote::SessionDescriptor;
use crate::session::{ChatMessage, ChatRecord, ChatSession};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Default configuration with the cache placed in `dir`
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.path = Some(dir.path().join("cache.db"));
    config
}

/// A complete configuration file
pub fn test_config_yaml() -> String {
    r#"
agent:
  base_url: http://localhost:18010
  timeout_seconds: 5

api:
  base_url: http://localhost:18000/api
  token: test-token

user:
  id: user-test

chat:
  placeholder_title: Novo Chat
  title_max_chars: 30
  concurrent_history_fetch: true

polling:
  interval_seconds: 2
"#
    .to_string()
}

/// Remote session descriptor owned by `user-demo`
pub fn descriptor(id: &str, created_at: serde_json::Value) -> SessionDescriptor {
    SessionDescriptor {
        session_id: id.to_string(),
        user_id: "user-demo".to_string(),
        session_name: None,
        created_at: Some(created_at),
        message_count: 0,
    }
}

/// Cache record holding one user message per entry of `messages`
pub fn cached_record(id: &str, title: &str, last_activity: i64, messages: &[&str]) -> ChatRecord {
    let mut session = ChatSession::new(id, title, last_activity);
    for content in messages {
        session
            .messages
            .push(ChatMessage::user(*content, last_activity));
    }
    ChatRecord::from_session(&session, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JusticeSyncError;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: crate::error::Result<()> =
            Err(JusticeSyncError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: crate::error::Result<()> =
            Err(JusticeSyncError::Config("different error".to_string()).into());
        assert_error_contains(result, "not present");
    }

    #[test]
    fn test_test_config_points_cache_into_dir() {
        let dir = temp_dir();
        let config = test_config(&dir);
        assert!(config.storage.path.unwrap().starts_with(dir.path()));
    }

    #[test]
    fn test_test_config_yaml_is_valid() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.user.id, "user-test");
    }

    #[test]
    fn test_cached_record_builder() {
        let record = cached_record("local-1", "A", 10, &["x", "y"]);
        assert_eq!(record.messages.len(), 2);
        assert!(!record.synced);
    }
}
