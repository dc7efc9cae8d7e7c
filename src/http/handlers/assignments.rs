use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::{ensure_session, require};
use crate::classroom::ClassroomClient;
use crate::creds;
use crate::error::ApiError;
use crate::http::types::AppState;

#[derive(Deserialize)]
pub struct AssignmentsQuery {
    course_id: Option<String>,
}

/// GET /assignments — coursework list for a course.
pub async fn list_assignments(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<AssignmentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = require(query.course_id, "course_id")?;
    let (jar, session_id) = ensure_session(jar);
    let token = creds::access_token(&state.http, &state.store, &session_id).await?;
    let client = ClassroomClient::new(&state.http, token);

    let assignments = client.list_coursework(&course_id).await?;
    Ok((jar, Json(assignments)))
}
