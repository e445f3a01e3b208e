use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::test_dto::{CreateTestPayload, TestListQuery, UpdateTestPayload},
    error::Result,
    models::{
        placement_result::{PlacementResult, PlacementResultWithNames},
        test::Test,
    },
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/results",
    responses(
        (status = 200, description = "All results with student and test names", body = Vec<PlacementResultWithNames>)
    )
)]
#[axum::debug_handler]
pub async fn list_results(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let results = state.attempt_service.all_results().await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/admin/results/{id}",
    params(
        ("id" = Uuid, Path, description = "Result ID")
    ),
    responses(
        (status = 200, description = "Result found", body = PlacementResult),
        (status = 404, description = "Result not found")
    )
)]
#[axum::debug_handler]
pub async fn get_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let result = state.attempt_service.result_by_id(id).await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/admin/tests",
    params(
        ("status" = Option<String>, Query, description = "Filter by status (active or inactive)")
    ),
    responses(
        (status = 200, description = "Tests including answer keys", body = Vec<Test>)
    )
)]
#[axum::debug_handler]
pub async fn list_tests(
    State(state): State<AppState>,
    Query(query): Query<TestListQuery>,
) -> Result<impl IntoResponse> {
    let tests = state.test_service.list_tests(query.status).await?;
    Ok(Json(tests))
}

#[utoipa::path(
    post,
    path = "/api/admin/tests",
    request_body = CreateTestPayload,
    responses(
        (status = 201, description = "Test created", body = Test),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_test(
    State(state): State<AppState>,
    Json(payload): Json<CreateTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let test = state.test_service.create_test(payload).await?;
    Ok((StatusCode::CREATED, Json(test)))
}

#[utoipa::path(
    get,
    path = "/api/admin/tests/{id}",
    params(
        ("id" = i64, Path, description = "Test ID")
    ),
    responses(
        (status = 200, description = "Test found", body = Test),
        (status = 404, description = "Test not found")
    )
)]
#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let test = state.test_service.get_test(id).await?;
    Ok(Json(test))
}

#[utoipa::path(
    patch,
    path = "/api/admin/tests/{id}",
    params(
        ("id" = i64, Path, description = "Test ID")
    ),
    request_body = UpdateTestPayload,
    responses(
        (status = 200, description = "Test updated", body = Test),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Test not found")
    )
)]
#[axum::debug_handler]
pub async fn update_test(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let test = state.test_service.update_test(id, payload).await?;
    Ok(Json(test))
}

#[utoipa::path(
    delete,
    path = "/api/admin/tests/{id}",
    params(
        ("id" = i64, Path, description = "Test ID")
    ),
    responses(
        (status = 204, description = "Test deleted"),
        (status = 404, description = "Test not found"),
        (status = 409, description = "Test already has results")
    )
)]
#[axum::debug_handler]
pub async fn delete_test(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.test_service.delete_test(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
