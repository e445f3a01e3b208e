use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::routes::{admin, health, placement, tests};

#[derive(OpenApi)]
#[openapi(
    info(title = "Placement API", description = "Placement test scoring and eligibility"),
    paths(
        health::health,
        tests::list_active_tests,
        tests::get_test,
        placement::submit_placement,
        placement::student_results,
        placement::eligibility,
        admin::list_results,
        admin::get_result,
        admin::list_tests,
        admin::create_test,
        admin::get_test,
        admin::update_test,
        admin::delete_test,
    )
)]
pub struct ApiDoc;

#[axum::debug_handler]
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
