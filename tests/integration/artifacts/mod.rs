//! Public artifact serving through the composed router

use axum::http::{header, Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use stencil_render::mock::{SAMPLE_PNG, SAMPLE_WEBP};

use crate::common::{body_bytes, parse_body, request, TestApp};

#[test_log::test(tokio::test)]
async fn test_health_check() {
    let app = TestApp::new().unwrap();

    let response = app
        .test_router()
        .oneshot(request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[test_log::test(tokio::test)]
async fn test_created_images_are_served_with_their_content_type() {
    let app = TestApp::new().unwrap();

    let response = app
        .test_router()
        .oneshot(request(
            Method::POST,
            "/artwork/create",
            Some(json!({ "title": "Lighthouse", "prompt": "storm" })),
        ))
        .await
        .unwrap();
    let created = parse_body(response).await;
    let url = created["stencils"][1]["images"][0]["url"].as_str().unwrap();

    let response = app
        .test_router()
        .oneshot(request(Method::GET, url, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/webp");
    assert_eq!(body_bytes(response).await, SAMPLE_WEBP);
}

#[test_log::test(tokio::test)]
async fn test_directly_saved_png_is_served() {
    let app = TestApp::new().unwrap();
    let path = app
        .store
        .save_artifact(SAMPLE_PNG, "stencil", "logo.png")
        .await
        .unwrap();

    let response = app
        .test_router()
        .oneshot(request(Method::GET, &format!("/public/{}", path), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(body_bytes(response).await, SAMPLE_PNG);
}

#[test_log::test(tokio::test)]
async fn test_encoded_traversal_is_rejected() {
    let app = TestApp::new().unwrap();
    std::fs::write(app.root.path().join("x.png"), SAMPLE_PNG).unwrap();

    let response = app
        .test_router()
        .oneshot(request(Method::GET, "/public/stencil/..%2Fx.png", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_staging_area_is_not_served() {
    let app = TestApp::new().unwrap();
    std::fs::write(app.root.path().join("temp").join("staged.png"), SAMPLE_PNG).unwrap();

    let response = app
        .test_router()
        .oneshot(request(Method::GET, "/public/temp/staged.png", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test_log::test(tokio::test)]
async fn test_missing_artifact_is_not_found() {
    let app = TestApp::new().unwrap();

    let response = app
        .test_router()
        .oneshot(request(Method::GET, "/public/stencil/absent.webp", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
