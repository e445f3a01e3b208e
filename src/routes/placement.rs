use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    dto::placement_dto::{SubmitPlacementRequest, SubmitPlacementResponse},
    error::Result,
    middleware::auth::Claims,
    models::placement_result::PlacementResult,
    services::eligibility_service::EligibilityStatus,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/placement/submit",
    request_body = SubmitPlacementRequest,
    responses(
        (status = 201, description = "Attempt scored and stored", body = SubmitPlacementResponse),
        (status = 403, description = "Submitting for another student"),
        (status = 404, description = "Test or student not found"),
        (status = 409, description = "Student already submitted this test")
    )
)]
#[axum::debug_handler]
pub async fn submit_placement(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitPlacementRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;
    claims.ensure_student_access(req.student_id)?;

    let submission = state
        .attempt_service
        .submit(req.student_id, req.test_id, req.answers)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitPlacementResponse::from(submission)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/results",
    params(
        ("id" = i64, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student's placement results, newest first", body = Vec<PlacementResult>),
        (status = 403, description = "Not the owning student")
    )
)]
#[axum::debug_handler]
pub async fn student_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse> {
    claims.ensure_student_access(student_id)?;
    let results = state.attempt_service.results_for_student(student_id).await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/tests/{test_id}/eligibility",
    params(
        ("id" = i64, Path, description = "Student ID"),
        ("test_id" = i64, Path, description = "Test ID")
    ),
    responses(
        (status = 200, description = "Whether the student may start the test", body = EligibilityStatus),
        (status = 403, description = "Not the owning student"),
        (status = 404, description = "Student not found")
    )
)]
#[axum::debug_handler]
pub async fn eligibility(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((student_id, test_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse> {
    claims.ensure_student_access(student_id)?;
    let status = state
        .eligibility_service
        .check(student_id, test_id, Utc::now())
        .await?;
    Ok(Json(status))
}
