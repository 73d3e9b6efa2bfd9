mod common;

use axum::http::StatusCode;
use common::TestApp;
use mytone_web::models::Role;
use serde_json::json;

#[tokio::test]
async fn test_list_is_public_and_idempotent() {
    let app = TestApp::local().await;
    let admin = app.cookie_for(Role::Admin);
    app.post_json(
        "/news",
        &json!({ "title_en": "Launch", "description_en": "MyTone is live" }),
        Some(&admin),
    )
    .await;

    let first = app.get("/news", None).await;
    let second = app.get("/news", None).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
    assert_eq!(first.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_english_only_post_stores_empty_pairs() {
    let app = TestApp::local().await;
    let admin = app.cookie_for(Role::Admin);

    let res = app
        .post_json(
            "/news",
            &json!({ "title_en": "Update", "description_en": "Bug fixes" }),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["news_title_en"], "Update");
    for lang in ["fr", "es", "it", "de", "zh"] {
        assert_eq!(res.body[format!("news_title_{}", lang)], "");
        assert_eq!(res.body[format!("news_description_{}", lang)], "");
    }
    assert!(res.body["created_at"].is_string());
}

#[tokio::test]
async fn test_missing_english_is_rejected() {
    let app = TestApp::local().await;
    let admin = app.cookie_for(Role::Admin);

    let res = app
        .post_json(
            "/news",
            &json!({ "title_en": "Update", "title_fr": "Mise à jour", "description_fr": "Corrections" }),
            Some(&admin),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body,
        json!({ "error": "English title and description are required" })
    );
    assert_eq!(app.get("/news", None).await.body, json!([]));
}

#[tokio::test]
async fn test_posting_requires_admin() {
    let app = TestApp::local().await;
    let body = json!({ "title_en": "T", "description_en": "D" });

    let anonymous = app.post_json("/news", &body, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let user = app.cookie_for(Role::User);
    let forbidden = app.post_json("/news", &body, Some(&user)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body, json!({ "error": "Not authorized" }));
}

#[tokio::test]
async fn test_localized_listing_with_fallback() {
    let app = TestApp::local().await;
    let admin = app.cookie_for(Role::Admin);
    app.post_json(
        "/news",
        &json!({
            "title_en": "Release",
            "description_en": "New version",
            "title_fr": "Version",
            "description_fr": "Nouvelle version"
        }),
        Some(&admin),
    )
    .await;

    let fr = app.get("/news?lang=fr", None).await;
    assert_eq!(fr.body[0]["lang"], "fr");
    assert_eq!(fr.body[0]["title"], "Version");

    let de = app.get("/news?lang=de", None).await;
    assert_eq!(de.body[0]["lang"], "en");
    assert_eq!(de.body[0]["title"], "Release");

    let unknown = app.get("/news?lang=pt", None).await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_newest_first() {
    let app = TestApp::local().await;
    let admin = app.cookie_for(Role::Admin);
    for title in ["older", "newer"] {
        app.post_json(
            "/news",
            &json!({ "title_en": title, "description_en": "x" }),
            Some(&admin),
        )
        .await;
    }

    let res = app.get("/news", None).await;
    assert_eq!(res.body[0]["news_title_en"], "newer");
    assert_eq!(res.body[1]["news_title_en"], "older");
}

#[tokio::test]
async fn test_malformed_query_uses_error_envelope() {
    let app = TestApp::local().await;

    let res = app.get("/news?lang=fr&lang=de", None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["error"].is_string(), "{:?}", res.bytes);
}
