use super::*;
use std::time::Duration;

use novachat_common::ConfigError;

#[tokio::test]
async fn start_creates_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("novachat").join("config.toml");

    let (config, rx) = ReloadManager::start(path.clone()).await.unwrap();

    assert!(path.exists());
    assert_eq!(config.agent.bot_name, "Sofia - TechNova");
    assert_eq!(rx.borrow().agent.project_api_key, config.agent.project_api_key);
}

#[tokio::test]
async fn start_with_partial_config_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[agent]\nwelcome_message = \"Oi!\"\nproject_api_key = \"pk_live_tn_abcdefgh\"\n",
    )
    .unwrap();

    let (config, rx) = ReloadManager::start(path).await.unwrap();
    assert_eq!(config.agent.welcome_message, "Oi!");
    assert_eq!(config.agent.bot_name, "Sofia - TechNova");
    assert_eq!(rx.borrow().agent.welcome_message, "Oi!");
}

#[tokio::test]
async fn start_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[session]\nstall_timeout_secs = 0\n").unwrap();

    let err = ReloadManager::start(path).await.unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn reload_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[model]\ntemperature = 9.0\n").unwrap();

    let manager = ReloadManager { config_path: path };
    let err = manager.reload_config().unwrap_err();
    assert!(err.to_string().contains("model.temperature"));
}

#[tokio::test]
async fn edited_file_is_published() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[agent]\nwelcome_message = \"Oi!\"\nproject_api_key = \"pk_live_tn_abcdefgh\"\n",
    )
    .unwrap();

    let (_config, mut rx) = ReloadManager::start(path.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    std::fs::write(
        &path,
        "[agent]\nwelcome_message = \"Olá de novo!\"\nproject_api_key = \"pk_live_tn_abcdefgh\"\n",
    )
    .unwrap();

    let changed = tokio::time::timeout(Duration::from_secs(5), rx.changed()).await;
    assert!(matches!(changed, Ok(Ok(()))));
    assert_eq!(rx.borrow().agent.welcome_message, "Olá de novo!");
}

#[tokio::test]
async fn invalid_edit_keeps_previous_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let valid = "[agent]\nwelcome_message = \"Oi!\"\nproject_api_key = \"pk_live_tn_abcdefgh\"\n";
    std::fs::write(&path, valid).unwrap();

    let (_config, mut rx) = ReloadManager::start(path.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    std::fs::write(&path, "[model]\ntemperature = 9.0\n").unwrap();
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(!rx.has_changed().unwrap());
    assert_eq!(rx.borrow().agent.welcome_message, "Oi!");

    std::fs::write(&path, valid.replace("Oi!", "Voltei")).unwrap();
    let changed = tokio::time::timeout(Duration::from_secs(5), rx.changed()).await;
    assert!(matches!(changed, Ok(Ok(()))));
    assert_eq!(rx.borrow().agent.welcome_message, "Voltei");
}
