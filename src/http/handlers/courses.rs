use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::ensure_session;
use crate::classroom::ClassroomClient;
use crate::creds;
use crate::error::ApiError;
use crate::http::types::AppState;

#[derive(Deserialize)]
pub struct CoursesQuery {
    course_name: Option<String>,
}

/// GET /courses — all courses, optionally filtered by a case-insensitive
/// substring match on the name.
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<CoursesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (jar, session_id) = ensure_session(jar);
    let token = creds::access_token(&state.http, &state.store, &session_id).await?;
    let client = ClassroomClient::new(&state.http, token);

    let mut courses = client.list_courses().await?;
    if let Some(filter) = query.course_name.filter(|f| !f.trim().is_empty()) {
        let needle = filter.to_lowercase();
        courses.retain(|c| c.name.to_lowercase().contains(&needle));
    }
    Ok((jar, Json(courses)))
}
