use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::classroom::Student;
use crate::error::ApiError;

/// Canonical first five ledger columns. Rewritten on every bulk import.
pub const CANONICAL_HEADER: [&str; 5] = ["google_classroom_Id", "name", "email", "points", "rank"];

pub const ID_COLUMN: &str = "google_classroom_Id";
pub const EMAIL_COLUMN: &str = "email";
pub const POINTS_COLUMN: &str = "points";

pub const ATTENDANCE_POINTS: i64 = 20;
const SENIOR_THRESHOLD: i64 = 600;
const JUNIOR_THRESHOLD: i64 = 400;
const STATE_COLUMN_MAX: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rank {
    Cadet,
    Junior,
    Senior,
}

impl Rank {
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Cadet => "Cadet",
            Rank::Junior => "Junior",
            Rank::Senior => "Senior",
        }
    }
}

pub fn rank_for_points(points: i64) -> Rank {
    if points >= SENIOR_THRESHOLD {
        Rank::Senior
    } else if points >= JUNIOR_THRESHOLD {
        Rank::Junior
    } else {
        Rank::Cadet
    }
}

/// The whole ledger sheet held in memory: one header row plus data rows,
/// all cells as strings. Fetched wholesale, merged in place, written back
/// wholesale; nothing here touches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Ledger {
    /// First fetched row is the header; the rest are data rows. An empty
    /// fetch yields an empty ledger (the bulk import will seed the header).
    pub fn from_values(mut values: Vec<Vec<String>>) -> Ledger {
        if values.is_empty() {
            return Ledger {
                header: Vec::new(),
                rows: Vec::new(),
            };
        }
        let header = values.remove(0);
        Ledger {
            header,
            rows: values,
        }
    }

    pub fn to_values(&self) -> Vec<Vec<String>> {
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.header.clone());
        values.extend(self.rows.iter().cloned());
        values
    }

    /// Columns are addressed by header-name scan, never by fixed offset.
    pub fn column(&self, name: &str) -> Result<usize, ApiError> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ApiError::missing_column(name))
    }

    /// Finds the column or appends it to the header, then re-pads all rows.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        let idx = match self.header.iter().position(|h| h == name) {
            Some(idx) => idx,
            None => {
                self.header.push(name.to_string());
                self.header.len() - 1
            }
        };
        self.pad_rows();
        idx
    }

    /// Rows fetched from the remote store may be shorter than the header
    /// when trailing cells were never written; pad before indexing.
    pub fn pad_rows(&mut self) {
        let width = self.header.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
    }

    fn points_at(row: &[String], idx: usize) -> i64 {
        row.get(idx)
            .map(|cell| cell.trim().parse::<i64>().unwrap_or(0))
            .unwrap_or(0)
    }
}

/// Bulk student import. Synthesizes a `[id, name, email, 0, Cadet]` row for
/// every fetched student not already present (keyed by column 0), replaces
/// commas in names with spaces, and recomputes rank for the new rows only.
/// Existing rows, their points, and their ranks are never touched. Returns
/// the appended rows so the caller can push exactly those to the sheet.
pub fn import_students(ledger: &mut Ledger, roster: &[Student]) -> Vec<Vec<String>> {
    if ledger.header.len() < CANONICAL_HEADER.len() {
        ledger.header.resize(CANONICAL_HEADER.len(), String::new());
    }
    for (i, name) in CANONICAL_HEADER.iter().enumerate() {
        ledger.header[i] = name.to_string();
    }
    ledger.pad_rows();

    let existing: HashSet<&str> = ledger
        .rows
        .iter()
        .filter_map(|row| row.first())
        .map(String::as_str)
        .collect();

    let mut appended = Vec::new();
    for student in roster {
        if existing.contains(student.id.as_str()) {
            continue;
        }
        let points: i64 = 0;
        let row = vec![
            student.id.clone(),
            student.name.replace(',', " "),
            student.email_for_display().to_string(),
            points.to_string(),
            rank_for_points(points).as_str().to_string(),
        ];
        appended.push(row);
    }

    for row in &appended {
        let mut padded = row.clone();
        padded.resize(ledger.header.len(), String::new());
        ledger.rows.push(padded);
    }
    appended
}

/// Assignment title -> state-column name: strip everything that is not a
/// word character or whitespace, collapse whitespace runs to underscores,
/// truncate to 50 chars, then append the literal `_state` suffix.
pub fn state_column_name(title: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^\w\s]").expect("static pattern"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"));

    let stripped = non_word.replace_all(title, "");
    let underscored = whitespace.replace_all(stripped.trim(), "_");
    let truncated: String = underscored.chars().take(STATE_COLUMN_MAX).collect();
    format!("{}_state", truncated)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeOutcome {
    pub credited: usize,
    pub skipped: usize,
}

/// Per-assignment grade posting. Rows whose state cell is already non-empty
/// are skipped outright, even when the remote grade changed since the last
/// run: first successful grade wins. Rows with an empty state cell gain the
/// student's non-zero grade in `points` and the grade value in the state
/// cell, which is what makes a second run a no-op for them.
pub fn post_grades(
    ledger: &mut Ledger,
    assignment_title: &str,
    grades: &HashMap<String, f64>,
) -> Result<GradeOutcome, ApiError> {
    let id_idx = ledger.column(ID_COLUMN)?;
    let points_idx = ledger.column(POINTS_COLUMN)?;
    let state_idx = ledger.ensure_column(&state_column_name(assignment_title));

    let mut outcome = GradeOutcome::default();
    for row in &mut ledger.rows {
        if !row[state_idx].trim().is_empty() {
            outcome.skipped += 1;
            continue;
        }
        let Some(grade) = grades.get(row[id_idx].trim()).copied() else {
            continue;
        };
        if grade == 0.0 {
            continue;
        }
        let points = Ledger::points_at(row, points_idx) + grade.round() as i64;
        row[points_idx] = points.to_string();
        row[state_idx] = format_grade(grade);
        outcome.credited += 1;
    }
    Ok(outcome)
}

fn format_grade(grade: f64) -> String {
    if grade.fract() == 0.0 {
        format!("{}", grade as i64)
    } else {
        format!("{}", grade)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceOutcome {
    pub granted: usize,
    pub already_marked: usize,
}

/// Attendance import. Cells already holding a mark are never overwritten or
/// double-counted. Rows with an empty mark whose ledger email appears in the
/// source set (both sides lower-cased and trimmed) gain a fixed 20 points
/// and the mark `20`; non-matching rows keep an empty mark.
pub fn grant_attendance(
    ledger: &mut Ledger,
    column: &str,
    present: &HashSet<String>,
) -> Result<AttendanceOutcome, ApiError> {
    let email_idx = ledger.column(EMAIL_COLUMN)?;
    let points_idx = ledger.column(POINTS_COLUMN)?;
    let mark_idx = ledger.ensure_column(column);

    let mut outcome = AttendanceOutcome::default();
    for row in &mut ledger.rows {
        if !row[mark_idx].trim().is_empty() {
            outcome.already_marked += 1;
            continue;
        }
        let email = row[email_idx].trim().to_lowercase();
        if !email.is_empty() && present.contains(&email) {
            let points = Ledger::points_at(row, points_idx) + ATTENDANCE_POINTS;
            row[points_idx] = points.to_string();
            row[mark_idx] = ATTENDANCE_POINTS.to_string();
            outcome.granted += 1;
        } else {
            row[mark_idx] = String::new();
        }
    }
    Ok(outcome)
}

/// Lower-cased, trimmed emails from an attendance source tab. The email
/// column is located by a case-insensitive header scan for `email` or
/// `Username`; a source tab without one is a schema failure, not a guess.
pub fn attendance_email_set(values: &[Vec<String>]) -> Result<HashSet<String>, ApiError> {
    let header = values
        .first()
        .ok_or_else(|| ApiError::Schema("attendance sheet is empty".to_string()))?;
    let email_idx = header
        .iter()
        .position(|h| {
            let h = h.trim().to_lowercase();
            h == "email" || h == "username"
        })
        .ok_or_else(|| {
            ApiError::Schema(
                "attendance sheet header must contain an 'email' or 'Username' column".to_string(),
            )
        })?;

    let mut present = HashSet::new();
    for row in &values[1..] {
        if let Some(cell) = row.get(email_idx) {
            let email = cell.trim().to_lowercase();
            if !email.is_empty() {
                present.insert(email);
            }
        }
    }
    Ok(present)
}
