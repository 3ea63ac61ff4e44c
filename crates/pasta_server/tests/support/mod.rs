//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use pasta_server::{create_app, open_store, AppState, Config};
use std::path::Path;
use tempfile::TempDir;

pub(crate) const BASE_URL: &str = "https://paste.test";
pub(crate) const SECRET: &str = "integration-secret";

pub(crate) fn test_config_for_data_dir(data_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_str().expect("data dir").to_string(),
        port: 0,
        base_url: Some(BASE_URL.to_string()),
        ..Config::default()
    }
}

pub(crate) fn test_server_for_config(config: Config) -> TestServer {
    let store = open_store(&config).expect("open store");
    let state = AppState::new(config, store);
    TestServer::new(create_app(state)).expect("server")
}

pub(crate) fn setup_test_server_with(configure: impl FnOnce(&mut Config)) -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let mut config = test_config_for_data_dir(temp_dir.path());
    configure(&mut config);
    (test_server_for_config(config), temp_dir)
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir) {
    setup_test_server_with(|_| {})
}

/// Strip the base URL and trailing newline from a create response.
pub(crate) fn id_from_url(body: &str) -> String {
    body.trim_end()
        .strip_prefix(&format!("{}/data/", BASE_URL))
        .expect("paste url")
        .to_string()
}
