//! Artwork endpoints driven through the composed router

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{parse_body, request, TestApp};

async fn create(app: &TestApp, title: &str, prompt: &str) -> serde_json::Value {
    let response = app
        .test_router()
        .oneshot(request(
            Method::POST,
            "/artwork/create",
            Some(json!({ "title": title, "prompt": prompt })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_body(response).await
}

mod test_create_endpoint {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_create_returns_artwork_with_public_urls() {
        let app = TestApp::new().unwrap();

        let body = create(&app, "Lighthouse", "a lighthouse in a storm").await;

        assert!(Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
        assert_eq!(body["title"], "Lighthouse");
        assert_eq!(body["prompt"], "a lighthouse in a storm");
        assert_eq!(body["strokes"], json!([]));
        assert!(body["updatedAt"].is_string());

        let stencils = body["stencils"].as_array().unwrap();
        assert_eq!(stencils.len(), 3);
        for stencil in stencils {
            assert!(stencil["subPrompt"].as_str().unwrap().contains(" - "));
            let image = &stencil["images"][0];
            let path = image["path"].as_str().unwrap();
            assert!(path.starts_with("stencil/"));
            assert_eq!(image["url"], format!("/public/{}", path));
            assert_eq!(image["mimeType"], "image/webp");
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_create_without_prompt_is_rejected() {
        let app = TestApp::new().unwrap();

        let response = app
            .test_router()
            .oneshot(request(
                Method::POST,
                "/artwork/create",
                Some(json!({ "title": "Lighthouse" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = parse_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(app.llm.recorded_requests().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_create_with_unknown_field_is_rejected() {
        let app = TestApp::new().unwrap();

        let response = app
            .test_router()
            .oneshot(request(
                Method::POST,
                "/artwork/create",
                Some(json!({ "title": "Lighthouse", "prompt": "storm", "style": "noir" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_create_with_overlong_title_is_rejected() {
        let app = TestApp::new().unwrap();

        let response = app
            .test_router()
            .oneshot(request(
                Method::POST,
                "/artwork/create",
                Some(json!({ "title": "t".repeat(201), "prompt": "storm" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.bucket_file_count(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_persistence_hides_internal_detail() {
        let app = TestApp::new().unwrap();
        app.repo.set_fail_inserts(true);

        let response = app
            .test_router()
            .oneshot(request(
                Method::POST,
                "/artwork/create",
                Some(json!({ "title": "Lighthouse", "prompt": "storm" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = parse_body(response).await;
        assert_eq!(body["error"]["message"], "Internal server error");
        assert_eq!(app.bucket_file_count(), 0);
    }
}

mod test_fetch_endpoints {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_fetch_all_lists_created_artworks() {
        let app = TestApp::new().unwrap();
        create(&app, "First", "a quiet harbor").await;
        create(&app, "Second", "a busy market").await;

        let response = app
            .test_router()
            .oneshot(request(Method::GET, "/artwork/fetchAll", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_body(response).await;
        let titles: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"First"));
        assert!(titles.contains(&"Second"));
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_all_honors_limit() {
        let app = TestApp::new().unwrap();
        create(&app, "First", "a quiet harbor").await;
        create(&app, "Second", "a busy market").await;

        let response = app
            .test_router()
            .oneshot(request(Method::GET, "/artwork/fetchAll?limit=1", None))
            .await
            .unwrap();

        let body = parse_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_by_id() {
        let app = TestApp::new().unwrap();
        let created = create(&app, "Lighthouse", "storm").await;
        let id = created["id"].as_str().unwrap();

        let response = app
            .test_router()
            .oneshot(request(Method::GET, &format!("/artwork/fetch/{}", id), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(parse_body(response).await, created);
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_unknown_id_is_not_found() {
        let app = TestApp::new().unwrap();

        let response = app
            .test_router()
            .oneshot(request(
                Method::GET,
                &format!("/artwork/fetch/{}", Uuid::new_v4()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = parse_body(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[test_log::test(tokio::test)]
    async fn test_fetch_malformed_id_is_bad_request() {
        let app = TestApp::new().unwrap();

        let response = app
            .test_router()
            .oneshot(request(Method::GET, "/artwork/fetch/not-a-uuid", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

mod test_save_endpoint {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_save_updates_title_and_strokes_only() {
        let app = TestApp::new().unwrap();
        let created = create(&app, "Lighthouse", "storm").await;

        let mut edited = created.clone();
        edited["title"] = json!("Lighthouse at dusk");
        edited["prompt"] = json!("ignored");
        edited["strokes"] = json!([{
            "points": [{ "dx": 1.0, "dy": 2.0 }, { "dx": 3.5, "dy": 4.0 }],
            "color": 4278190080i64,
            "brushSize": 6.0
        }]);

        let response = app
            .test_router()
            .oneshot(request(
                Method::POST,
                "/artwork/save",
                Some(json!({ "artwork": edited })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = parse_body(response).await;
        assert_eq!(body["title"], "Lighthouse at dusk");
        assert_eq!(body["prompt"], "storm");
        assert_eq!(body["stencils"], created["stencils"]);
        assert_eq!(body["strokes"][0]["brushSize"], 6.0);
        assert_eq!(body["strokes"][0]["points"][1]["dx"], 3.5);
    }

    #[test_log::test(tokio::test)]
    async fn test_save_unknown_artwork_is_not_found() {
        let app = TestApp::new().unwrap();

        let response = app
            .test_router()
            .oneshot(request(
                Method::POST,
                "/artwork/save",
                Some(json!({ "artwork": { "id": Uuid::new_v4(), "title": "Ghost" } })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_save_blank_title_is_rejected() {
        let app = TestApp::new().unwrap();
        let created = create(&app, "Lighthouse", "storm").await;

        let response = app
            .test_router()
            .oneshot(request(
                Method::POST,
                "/artwork/save",
                Some(json!({ "artwork": { "id": created["id"], "title": "   " } })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

mod test_delete_endpoint {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_delete_removes_artwork_and_public_images() {
        let app = TestApp::new().unwrap();
        let created = create(&app, "Lighthouse", "storm").await;
        let id = created["id"].as_str().unwrap().to_string();
        let url = created["stencils"][0]["images"][0]["url"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .test_router()
            .oneshot(request(
                Method::POST,
                "/artwork/delete",
                Some(json!({ "artworkId": id })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .test_router()
            .oneshot(request(Method::GET, &format!("/artwork/fetch/{}", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .test_router()
            .oneshot(request(Method::GET, &url, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(app.bucket_file_count(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_unknown_artwork_is_not_found() {
        let app = TestApp::new().unwrap();

        let response = app
            .test_router()
            .oneshot(request(
                Method::POST,
                "/artwork/delete",
                Some(json!({ "artwork_id": Uuid::new_v4() })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(app.storage.delete_calls(), 0);
    }
}
