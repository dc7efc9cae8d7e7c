use std::collections::HashMap;
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
pub struct LeaderboardQuery {
    course_id: Option<String>,
}

/// GET /leaderboard — assigned grades accumulated per student across all
/// coursework in the course, sorted descending by total.
pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = require(query.course_id, "course_id")?;
    let (jar, session_id) = ensure_session(jar);
    let token = creds::access_token(&state.http, &state.store, &session_id).await?;
    let client = ClassroomClient::new(&state.http, token);

    let coursework = client.list_coursework(&course_id).await?;
    let mut totals: HashMap<String, f64> = HashMap::new();
    for assignment in &coursework {
        let submissions = client.list_submissions(&course_id, &assignment.id).await?;
        classroom::accumulate_grades(&mut totals, &submissions);
    }
    Ok((jar, Json(classroom::sorted_leaderboard(totals))))
}
