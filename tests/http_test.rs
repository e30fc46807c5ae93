mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use kitlast::core::shared::models::User;
use kitlast::web::auth::{issue_token, AUTH_COOKIE};
use kitlast::{create_router, AppState};

fn bearer(state: &AppState, user: &User) -> String {
    format!("Bearer {}", issue_token(&state.auth, user.id).unwrap())
}

fn professional(state: &Arc<AppState>) -> User {
    let mut conn = state.conn.get().unwrap();
    common::professional(&mut conn, "Alice")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn app(state: &Arc<AppState>) -> Router {
    create_router(Arc::clone(state))
}

#[tokio::test]
async fn test_health() {
    let Some(state) = common::test_state() else {
        return;
    };

    let response = app(&state)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("healthy"));
}

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_login() {
    let Some(state) = common::test_state() else {
        return;
    };

    let response = app(&state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login/?next=/");
}

#[tokio::test]
async fn test_dashboard_renders_for_professional() {
    let Some(state) = common::test_state() else {
        return;
    };
    let pro = professional(&state);

    let response = app(&state)
        .oneshot(
            Request::get("/?section=planning&week_offset=1")
                .header(header::AUTHORIZATION, bearer(&state, &pro))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("Semaine"));
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let Some(state) = common::test_state() else {
        return;
    };
    let pro = professional(&state);
    let token = issue_token(&state.auth, pro.id).unwrap();

    let response = app(&state)
        .oneshot(
            Request::get("/")
                .header(header::COOKIE, format!("{AUTH_COOKIE}={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_add_category_redirects_to_services() {
    let Some(state) = common::test_state() else {
        return;
    };
    let pro = professional(&state);
    let name = format!("Réflexologie {}", uuid::Uuid::new_v4().simple());

    let response = app(&state)
        .oneshot(
            Request::post("/")
                .header(header::AUTHORIZATION, bearer(&state, &pro))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "action=add_category&name={}",
                    urlencoding::encode(&name)
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?section=services");
}

#[tokio::test]
async fn test_invalid_category_renders_errors() {
    let Some(state) = common::test_state() else {
        return;
    };
    let pro = professional(&state);

    let response = app(&state)
        .oneshot(
            Request::post("/")
                .header(header::AUTHORIZATION, bearer(&state, &pro))
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("action=add_category&name=+++"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Veuillez saisir un nom de catégorie."));
}

#[tokio::test]
async fn test_anonymous_planning_returns_sample_week() {
    let Some(state) = common::test_state() else {
        return;
    };

    let response = app(&state)
        .oneshot(Request::get("/planning/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["days"].as_array().map(Vec::len), Some(7));
    assert_eq!(json["days"][0]["date"], "08/01");
}

#[tokio::test]
async fn test_unknown_workshop_is_not_found() {
    let Some(state) = common::test_state() else {
        return;
    };

    for path in [
        format!("/workshops/{}/", uuid::Uuid::new_v4()),
        "/workshops/not-a-uuid/".to_string(),
    ] {
        let response = app(&state)
            .oneshot(Request::get(path.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let Some(state) = common::test_state() else {
        return;
    };

    let response = app(&state)
        .oneshot(
            Request::post("/logout/")
                .header(header::COOKIE, format!("{AUTH_COOKIE}=stale"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login/");
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with(&format!("{AUTH_COOKIE}=")));
}
