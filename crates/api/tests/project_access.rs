//! Visibility and permission checks on the project endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

#[tokio::test]
async fn outsider_gets_forbidden_and_empty_list() {
    let app = TestApp::new();
    let id = app.create_two_stage_project().await;

    let (status, json) = app
        .get(&format!("/api/v1/projects/{id}"), app.users.outsider)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");

    let (status, json) = app.get("/api/v1/projects", app.users.outsider).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn queued_assignee_sees_project() {
    let app = TestApp::new();
    let id = app.create_two_stage_project().await;

    let (status, _) = app
        .get(&format!("/api/v1/projects/{id}"), app.users.writer)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = app.get("/api/v1/projects", app.users.writer).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], id);
}

#[tokio::test]
async fn completed_assignee_keeps_visibility() {
    let app = TestApp::new();
    let id = app.create_two_stage_project().await;
    app.post(&format!("/api/v1/projects/{id}/submit"), app.users.designer, json!({}))
        .await;
    app.post(&format!("/api/v1/projects/{id}/approve"), app.users.reviewer, json!({}))
        .await;

    let (status, json) = app
        .get(&format!("/api/v1/projects/{id}"), app.users.designer)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["completed_stages"][0]["assigned_to"], app.users.designer);
}

#[tokio::test]
async fn see_all_capability_lists_everything() {
    let app = TestApp::new();
    let first = app.create_two_stage_project().await;
    let second = app.create_two_stage_project().await;

    let (_, json) = app.get("/api/v1/projects", app.users.admin).await;
    let ids: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn unknown_project_is_not_found_before_access_check() {
    let app = TestApp::new();
    let (status, json) = app.get("/api/v1/projects/12345", app.users.outsider).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Project with id 12345 not found");
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_requires_add_project() {
    let app = TestApp::new();
    let (status, json) = app
        .post("/api/v1/projects", app.users.designer, common::two_stage_body(&app.users))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json["error"].as_str().unwrap().contains("can_add_project"));
}

#[tokio::test]
async fn only_current_assignee_may_submit() {
    let app = TestApp::new();
    let id = app.create_two_stage_project().await;
    let submit = format!("/api/v1/projects/{id}/submit");

    // Queued assignee.
    let (status, _) = app.post(&submit, app.users.writer, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Capabilities do not stand in for assignment.
    let (status, _) = app.post(&submit, app.users.admin, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn review_actions_require_approve_capability() {
    let app = TestApp::new();
    let id = app.create_two_stage_project().await;
    app.post(&format!("/api/v1/projects/{id}/submit"), app.users.designer, json!({}))
        .await;

    let (status, _) = app
        .post(&format!("/api/v1/projects/{id}/approve"), app.users.designer, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            &format!("/api/v1/projects/{id}/revision"),
            app.users.manager,
            json!({ "notes": "nope" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reviewer_can_approve_without_visibility() {
    let app = TestApp::new();
    let id = app.create_two_stage_project().await;
    app.post(&format!("/api/v1/projects/{id}/submit"), app.users.designer, json!({}))
        .await;

    let (status, _) = app
        .get(&format!("/api/v1/projects/{id}"), app.users.reviewer)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(&format!("/api/v1/projects/{id}/approve"), app.users.reviewer, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn assignee_cannot_edit_project() {
    let app = TestApp::new();
    let id = app.create_two_stage_project().await;

    let (status, _) = app
        .put(
            &format!("/api/v1/projects/{id}"),
            app.users.designer,
            json!({ "name": "Mine" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new();
    let response = app.send(Method::GET, "/api/v1/projects", None, None).await;
    let (status, json) = common::split(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn token_for_unknown_user_is_unauthorized() {
    let app = TestApp::new();
    let (status, json) = app.get("/api/v1/projects", 999).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "User no longer exists");
}
