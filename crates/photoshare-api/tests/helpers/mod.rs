//! Test helpers: build AppState and router over the in-memory engine.
//!
//! Run from workspace root: `cargo test -p photoshare-api`.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use photoshare_api::setup::routes;
use photoshare_api::{AppState, FeedService};
use photoshare_core::models::Media;
use photoshare_core::Config;
use photoshare_db::{IdentityStore, InMemoryStore, Repositories};
use photoshare_storage::MemoryStorage;

/// Test application: server plus handles on the engine behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: InMemoryStore,
    pub blobs: Arc<MemoryStorage>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn create_user(&self, username: &str) -> i64 {
        self.store
            .create_user(username)
            .await
            .expect("Failed to create test user")
            .id
    }

    /// Upload `data` as `file_name` and return the created media.
    pub async fn upload(&self, user_id: i64, file_name: &str, data: &[u8]) -> Media {
        let response = self
            .server
            .post(&format!("/{}/media", user_id))
            .multipart(file_form(file_name, data))
            .await;
        response.assert_status_ok();
        response.json::<Media>()
    }
}

pub fn file_form(file_name: &str, data: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data.to_vec())
            .file_name(file_name)
            .mime_type("image/png"),
    )
}

pub fn test_config() -> Config {
    Config::from_source(|key| match key {
        "DATABASE_URL" => Some("memory://".to_string()),
        "STORAGE_BACKEND" => Some("memory".to_string()),
        "MAX_FILE_SIZE_MB" => Some("1".to_string()),
        "FEED_DEFAULT_LIMIT" => Some("3".to_string()),
        "FEED_MAX_LIMIT" => Some("5".to_string()),
        "COMMENT_MAX_LENGTH" => Some("50".to_string()),
        _ => None,
    })
    .expect("Failed to build test config")
}

/// Setup a test app with an isolated in-memory engine and blob store.
pub async fn setup_test_app() -> TestApp {
    let config = test_config();
    let store = InMemoryStore::new(&config.feed);
    let blobs = Arc::new(MemoryStorage::new(config.local_storage_base_url.clone()));

    let feed = FeedService::new(
        Repositories::in_memory(store.clone()),
        blobs.clone(),
        &config,
    );
    let state = Arc::new(AppState::new(config.clone(), feed));
    let router = routes::setup_routes(&config, state.clone()).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        store,
        blobs,
    }
}
