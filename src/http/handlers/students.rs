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
pub struct StudentsQuery {
    course_id: Option<String>,
}

/// GET /students — the complete, de-paginated roster for a course.
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<StudentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = require(query.course_id, "course_id")?;
    let (jar, session_id) = ensure_session(jar);
    let token = creds::access_token(&state.http, &state.store, &session_id).await?;
    let client = ClassroomClient::new(&state.http, token);

    let roster = client.list_students(&course_id).await?;
    log::info!("fetched {} students for course {}", roster.len(), course_id);
    Ok((jar, Json(roster)))
}
