//! Restart behaviour against a file-backed database.

use opsdesk::config::Config;
use opsdesk::constants::{admin, options};
use opsdesk::state::SharedState;

fn file_config(db_path: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.jwt_secret = "bootstrap-test-secret".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

fn temp_db() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("opsdesk-bootstrap-{}.db", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn restart_keeps_one_admin_and_changed_settings() {
    let db_path = temp_db();

    {
        let state = SharedState::new(file_config(&db_path)).await.unwrap();
        state
            .settings
            .update(options::SYSTEM_NAME, "Ops Console")
            .await
            .unwrap();
        state
            .settings
            .update(options::ALLOW_REGISTRATION, options::TRUE)
            .await
            .unwrap();
        state.store.conn.clone().close().await.unwrap();
    }

    let state = SharedState::new(file_config(&db_path)).await.unwrap();

    let admins: Vec<_> = state
        .store
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .filter(|u| u.username == admin::USERNAME)
        .collect();
    assert_eq!(admins.len(), 1);

    let all = state.settings.list(false).await.unwrap();
    assert_eq!(all.len(), options::DEFAULTS.len());

    let name = state.settings.get(options::SYSTEM_NAME).await.unwrap();
    assert_eq!(name.option_value, "Ops Console");

    // The cache is rebuilt from the store on startup
    assert!(state.settings.allow_registration().await);
    assert_eq!(
        state.settings.snapshot().await.get(options::SYSTEM_NAME),
        Some("Ops Console")
    );

    state.store.conn.clone().close().await.unwrap();
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn changed_admin_password_survives_restart() {
    let db_path = temp_db();

    {
        let state = SharedState::new(file_config(&db_path)).await.unwrap();
        let admin_user = state
            .store
            .get_user_by_username(admin::USERNAME)
            .await
            .unwrap()
            .unwrap();
        state
            .auth_service
            .change_password(admin_user.id, admin::DEFAULT_PASSWORD, "rotated-secret")
            .await
            .unwrap();
        state.store.conn.clone().close().await.unwrap();
    }

    let state = SharedState::new(file_config(&db_path)).await.unwrap();
    assert!(state
        .auth_service
        .login(admin::USERNAME, "rotated-secret")
        .await
        .is_ok());
    assert!(state
        .auth_service
        .login(admin::USERNAME, admin::DEFAULT_PASSWORD)
        .await
        .is_err());

    state.store.conn.clone().close().await.unwrap();
    let _ = std::fs::remove_file(&db_path);
}
