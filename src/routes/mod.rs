pub mod admin;
pub mod docs;
pub mod health;
pub mod placement;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::auth::{require_admin, require_bearer_auth};
use crate::AppState;

/// Builds the full API. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let base_routes = Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(docs::openapi_json));

    let student_api = Router::new()
        .route("/api/tests", get(tests::list_active_tests))
        .route("/api/tests/:id", get(tests::get_test))
        .route("/api/placement/submit", post(placement::submit_placement))
        .route(
            "/api/students/:id/results",
            get(placement::student_results),
        )
        .route(
            "/api/students/:id/tests/:test_id/eligibility",
            get(placement::eligibility),
        )
        .layer(from_fn_with_state(state.clone(), require_bearer_auth));

    let admin_api = Router::new()
        .route("/api/admin/results", get(admin::list_results))
        .route("/api/admin/results/:id", get(admin::get_result))
        .route(
            "/api/admin/tests",
            get(admin::list_tests).post(admin::create_test),
        )
        .route(
            "/api/admin/tests/:id",
            get(admin::get_test)
                .patch(admin::update_test)
                .delete(admin::delete_test),
        )
        .layer(from_fn_with_state(state.clone(), require_admin));

    base_routes
        .merge(student_api)
        .merge(admin_api)
        .with_state(state)
}
