use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers;
use super::types::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/courses", get(handlers::courses::list_courses))
        .route("/students", get(handlers::students::list_students))
        .route("/assignments", get(handlers::assignments::list_assignments))
        .route("/submissions", get(handlers::submissions::list_submissions))
        .route("/leaderboard", get(handlers::leaderboard::leaderboard))
        .route(
            "/push_students_to_sheet",
            post(handlers::ledger_push::push_students),
        )
        .route("/update-grades", post(handlers::ledger_push::update_grades))
        // Earlier revisions of the API exposed grade posting here.
        .route("/grades", post(handlers::ledger_push::update_grades))
        .route("/push_attendance", post(handlers::ledger_push::push_attendance))
        .route(
            "/credentials",
            get(handlers::auth::credentials_status).post(handlers::auth::upload_credentials),
        )
        .route("/authenticate_google", get(handlers::auth::authenticate))
        .route("/oauth2callback", get(handlers::auth::oauth2_callback))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
