use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use super::{ensure_session, require};
use crate::classroom::ClassroomClient;
use crate::creds;
use crate::error::ApiError;
use crate::http::types::AppState;
use crate::ledger::{self, Ledger, CANONICAL_HEADER};
use crate::sheets::{block_range, SheetsClient, LEDGER_TAB};

#[derive(Deserialize)]
pub struct PushStudentsQuery {
    course_id: Option<String>,
    spreadsheet_id: Option<String>,
}

/// POST /push_students_to_sheet — bulk student import. New roster entries
/// are appended with zero points and a freshly computed rank; rows already
/// in the ledger are left exactly as they are. The canonical header cells
/// are rewritten on every call, which writes the same constant each time.
pub async fn push_students(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PushStudentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = require(query.course_id, "course_id")?;
    let spreadsheet_id = require(query.spreadsheet_id, "spreadsheet_id")?;
    let (jar, session_id) = ensure_session(jar);
    let token = creds::access_token(&state.http, &state.store, &session_id).await?;

    let classroom = ClassroomClient::new(&state.http, token.clone());
    let sheets = SheetsClient::new(&state.http, token);

    let roster = classroom.list_students(&course_id).await?;
    let existing = sheets
        .values_get(&spreadsheet_id, &format!("{}!A2:F", LEDGER_TAB))
        .await?;

    let mut working = Ledger {
        header: CANONICAL_HEADER.iter().map(|s| s.to_string()).collect(),
        rows: existing,
    };
    let appended = ledger::import_students(&mut working, &roster);

    if !appended.is_empty() {
        sheets
            .values_append(&spreadsheet_id, &format!("{}!A2", LEDGER_TAB), &appended)
            .await?;
    }
    let header: Vec<String> = CANONICAL_HEADER.iter().map(|s| s.to_string()).collect();
    sheets
        .values_update(
            &spreadsheet_id,
            &block_range(LEDGER_TAB, CANONICAL_HEADER.len(), 1, 1),
            std::slice::from_ref(&header),
        )
        .await?;

    log::info!(
        "pushed {} new of {} fetched students to spreadsheet {}",
        appended.len(),
        roster.len(),
        spreadsheet_id
    );
    Ok((
        jar,
        Json(json!({
            "message": "Student data successfully pushed to the spreadsheet with ranks.",
            "fetched": roster.len(),
            "appended": appended.len(),
        })),
    ))
}

#[derive(Deserialize)]
pub struct UpdateGradesQuery {
    course_id: Option<String>,
    assignment_id: Option<String>,
    spreadsheet_id: Option<String>,
}

/// POST /update-grades — per-assignment grade posting into the ledger
/// column `<assignment_title>_state`. Rows whose state cell is already
/// non-empty are never re-processed; first successful grade wins.
pub async fn update_grades(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<UpdateGradesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let course_id = require(query.course_id, "course_id")?;
    let assignment_id = require(query.assignment_id, "assignment_id")?;
    let spreadsheet_id = require(query.spreadsheet_id, "spreadsheet_id")?;
    let (jar, session_id) = ensure_session(jar);
    let token = creds::access_token(&state.http, &state.store, &session_id).await?;

    let classroom = ClassroomClient::new(&state.http, token.clone());
    let sheets = SheetsClient::new(&state.http, token);

    let coursework = classroom.list_coursework(&course_id).await?;
    let title = coursework
        .iter()
        .find(|a| a.id == assignment_id)
        .map(|a| a.title.clone())
        .ok_or_else(|| {
            ApiError::RemoteApi(format!(
                "assignment {} not found in course {}",
                assignment_id, course_id
            ))
        })?;
    let grades = classroom.grade_map(&course_id, &assignment_id).await?;

    let values = sheets.values_get(&spreadsheet_id, LEDGER_TAB).await?;
    let mut working = Ledger::from_values(values);
    let outcome = ledger::post_grades(&mut working, &title, &grades)?;
    write_whole_ledger(&sheets, &spreadsheet_id, &working).await?;

    log::info!(
        "posted grades for '{}': {} credited, {} already marked",
        title,
        outcome.credited,
        outcome.skipped
    );
    Ok((
        jar,
        Json(json!({
            "message": "Grades successfully posted to the spreadsheet.",
            "assignment": title,
            "credited": outcome.credited,
            "alreadyMarked": outcome.skipped,
        })),
    ))
}

#[derive(Deserialize)]
pub struct PushAttendanceQuery {
    spreadsheet_id: Option<String>,
    sheet_name: Option<String>,
}

/// POST /push_attendance — grants the fixed attendance bonus to ledger rows
/// whose email appears in the source tab, once per ledger column
/// `<sheet_name>`.
pub async fn push_attendance(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<PushAttendanceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let spreadsheet_id = require(query.spreadsheet_id, "spreadsheet_id")?;
    let sheet_name = require(query.sheet_name, "sheet_name")?;
    let (jar, session_id) = ensure_session(jar);
    let token = creds::access_token(&state.http, &state.store, &session_id).await?;

    let sheets = SheetsClient::new(&state.http, token);

    let source = sheets.values_get(&spreadsheet_id, &sheet_name).await?;
    let present = ledger::attendance_email_set(&source)?;

    let values = sheets.values_get(&spreadsheet_id, LEDGER_TAB).await?;
    let mut working = Ledger::from_values(values);
    let outcome = ledger::grant_attendance(&mut working, &sheet_name, &present)?;
    write_whole_ledger(&sheets, &spreadsheet_id, &working).await?;

    log::info!(
        "attendance '{}': {} granted, {} already marked",
        sheet_name,
        outcome.granted,
        outcome.already_marked
    );
    Ok((
        jar,
        Json(json!({
            "message": "Attendance successfully pushed to the spreadsheet.",
            "sheet": sheet_name,
            "granted": outcome.granted,
            "alreadyMarked": outcome.already_marked,
        })),
    ))
}

/// Full-sheet write-back: header plus every data row in one update. Not
/// transactional against concurrent edits; the later writer wins.
async fn write_whole_ledger(
    sheets: &SheetsClient<'_>,
    spreadsheet_id: &str,
    working: &Ledger,
) -> Result<(), ApiError> {
    let values = working.to_values();
    let range = block_range(LEDGER_TAB, working.header.len(), 1, values.len());
    sheets.values_update(spreadsheet_id, &range, &values).await
}
