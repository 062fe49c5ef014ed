//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server needed.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use sonaa_api::error::AppError;
use sonaa_core::error::CoreError;
use sonaa_db::store::StoreError;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Core errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Project",
        id: 42,
    });
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project with id 42 not found");
}

#[tokio::test]
async fn no_current_stage_returns_404_with_its_own_code() {
    let err = AppError::Core(CoreError::NoCurrentStage { project_id: 9 });
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NO_CURRENT_STAGE");
    assert_eq!(json["error"], "Project 9 has no current stage");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict(
        "Invalid stage transition: in_progress -> completed".into(),
    ));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn validation_and_bad_request_return_400() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Validation("name is required".into()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "name is required");

    let (status, json) = error_to_response(AppError::BadRequest("bad".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn auth_errors_map_to_401_and_403() {
    let (status, _) =
        error_to_response(AppError::Core(CoreError::Unauthorized("no token".into()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) =
        error_to_response(AppError::Core(CoreError::Forbidden("Access denied".into()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

// ---------------------------------------------------------------------------
// Internal errors are sanitized
// ---------------------------------------------------------------------------

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let (status, json) =
        error_to_response(AppError::InternalError("secret database credentials".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json.to_string().contains("secret"));
}

#[tokio::test]
async fn corrupt_record_is_sanitized_500() {
    let err = AppError::Store(StoreError::Corrupt("project 3: bad status".into()));
    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn store_row_not_found_maps_to_404() {
    let err = AppError::Store(StoreError::Database(sqlx::Error::RowNotFound));
    let (status, _) = error_to_response(err).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn core_errors_convert_with_question_mark() {
    fn fails() -> Result<(), AppError> {
        let denied: Result<(), CoreError> = Err(CoreError::Forbidden("nope".into()));
        denied?;
        Ok(())
    }
    assert_matches!(fails(), Err(AppError::Core(CoreError::Forbidden(_))));
}
