use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::{ensure_session, require};
use crate::classroom::{self, ClassroomClient};
use crate::creds;
use crate::error::ApiError;
use crate::http::types::AppState;

#[derive(Deserialize)]
pub struct SubmissionsQuery {
    course_id: Option<String>,
    assignment_id: Option<String>,
    state: Option<String>,
}

/// GET /submissions — submissions for one assignment, joined with student
/// name/email from the course roster and carrying normalized attachments.
/// The workflow-state filter applies only when supplied.
pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<SubmissionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = require(query.course_id, "course_id")?;
    let assignment_id = require(query.assignment_id, "assignment_id")?;
    let state_filter = query.state.filter(|s| !s.trim().is_empty());

    let (jar, session_id) = ensure_session(jar);
    let token = creds::access_token(&state.http, &state.store, &session_id).await?;
    let client = ClassroomClient::new(&state.http, token);

    let roster = client.list_students(&course_id).await?;
    let submissions = client.list_submissions(&course_id, &assignment_id).await?;
    let submissions = classroom::filter_by_state(submissions, state_filter.as_deref());
    let joined = classroom::join_submissions(submissions, &roster);
    Ok((jar, Json(joined)))
}
