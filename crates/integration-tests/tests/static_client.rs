//! Integration tests for serving the browser client from a static directory.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use catalog_integration_tests::{TestContext, test_config};
use tempfile::TempDir;

const INDEX_HTML: &str = "<html>catalog client</html>";

fn client_build() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/app.js"), "console.log('catalog');").unwrap();
    dir
}

fn context_serving(dir: &TempDir) -> TestContext {
    let mut config = test_config();
    config.static_dir = Some(dir.path().to_path_buf());
    TestContext::with_config(config)
}

#[tokio::test]
async fn test_existing_file_is_served() {
    let dir = client_build();
    let ctx = context_serving(&dir);

    let resp = ctx.get("/assets/app.js").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "console.log('catalog');");
}

#[tokio::test]
async fn test_client_routes_fall_back_to_index() {
    let dir = client_build();
    let ctx = context_serving(&dir);

    for path in ["/", "/products/edit/3", "/login"] {
        let resp = ctx.get(path).await;
        assert_eq!(resp.status, StatusCode::OK, "{path}");
        assert_eq!(resp.body, INDEX_HTML, "{path}");
    }
}

#[tokio::test]
async fn test_api_paths_stay_json() {
    let dir = client_build();
    let ctx = context_serving(&dir);

    let unknown = ctx.get("/api/nope").await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["error"]["type"], "NotFoundError");

    let products = ctx.get("/api/products").await;
    assert_eq!(products.status, StatusCode::OK);
    assert!(products.body.is_array());
}

#[tokio::test]
async fn test_without_static_dir_unknown_paths_are_404() {
    let ctx = TestContext::new();

    let resp = ctx.get("/products/edit/3").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
