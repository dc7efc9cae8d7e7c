use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::attachments::{self, Attachment};
use crate::error::ApiError;

pub const CLASSROOM_BASE: &str = "https://classroom.googleapis.com/v1";

/// Marker used when the roster entry carries no email address. Kept distinct
/// from an empty string so "present but blank" never reads as "unavailable".
pub const EMAIL_UNAVAILABLE: &str = "No email available";
/// Marker for submissions whose author is no longer on the roster.
pub const UNKNOWN_STUDENT: &str = "Unknown";

const NO_DESCRIPTION: &str = "No description provided";
const NO_DUE_DATE: &str = "No due date";
const STATE_UNKNOWN: &str = "UNKNOWN";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "email_or_marker")]
    pub email: Option<String>,
}

impl Student {
    pub fn email_for_display(&self) -> &str {
        self.email.as_deref().unwrap_or(EMAIL_UNAVAILABLE)
    }
}

fn email_or_marker<S>(email: &Option<String>, ser: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    ser.serialize_str(email.as_deref().unwrap_or(EMAIL_UNAVAILABLE))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: Value,
    pub creation_time: String,
    pub alternate_link: String,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    pub state: String,
    pub assigned_grade: Option<f64>,
    pub attachments: Vec<Attachment>,
}

/// A submission joined with the student identity from a roster snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedSubmission {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub state: String,
    pub assigned_grade: Option<f64>,
    pub attachments: Vec<Attachment>,
}

pub fn parse_courses(body: &Value) -> Vec<Course> {
    body.get("courses")
        .and_then(|v| v.as_array())
        .map(|courses| {
            courses
                .iter()
                .filter_map(|c| {
                    Some(Course {
                        id: str_of(c, "id")?,
                        name: str_of(c, "name")?,
                        section: str_of(c, "section"),
                        alternate_link: str_of(c, "alternateLink"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// One page of a roster listing: the students plus the continuation token,
/// which is `None` exactly when the listing is exhausted.
pub fn parse_students_page(body: &Value) -> (Vec<Student>, Option<String>) {
    let students = body
        .get("students")
        .and_then(|v| v.as_array())
        .map(|students| {
            students
                .iter()
                .filter_map(|s| {
                    let profile = s.get("profile")?;
                    Some(Student {
                        id: str_of(s, "userId")?,
                        name: profile
                            .pointer("/name/fullName")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                        email: str_of(profile, "emailAddress").filter(|e| !e.trim().is_empty()),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    (students, str_of(body, "nextPageToken"))
}

pub fn parse_coursework(body: &Value) -> Vec<Assignment> {
    body.get("courseWork")
        .and_then(|v| v.as_array())
        .map(|work| {
            work.iter()
                .filter_map(|w| {
                    Some(Assignment {
                        id: str_of(w, "id")?,
                        title: str_of(w, "title")?,
                        description: str_of(w, "description")
                            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
                        due_date: w
                            .get("dueDate")
                            .cloned()
                            .unwrap_or_else(|| Value::String(NO_DUE_DATE.to_string())),
                        creation_time: str_of(w, "creationTime").unwrap_or_default(),
                        alternate_link: str_of(w, "alternateLink").unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_submissions_page(body: &Value) -> (Vec<Submission>, Option<String>) {
    let submissions = body
        .get("studentSubmissions")
        .and_then(|v| v.as_array())
        .map(|subs| {
            subs.iter()
                .filter_map(|s| {
                    let raw_attachments = s
                        .pointer("/assignmentSubmission/attachments")
                        .and_then(|v| v.as_array())
                        .cloned()
                        .unwrap_or_default();
                    Some(Submission {
                        id: str_of(s, "id")?,
                        user_id: str_of(s, "userId")?,
                        state: str_of(s, "state").unwrap_or_else(|| STATE_UNKNOWN.to_string()),
                        assigned_grade: s.get("assignedGrade").and_then(|v| v.as_f64()),
                        attachments: attachments::normalize(&raw_attachments),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    (submissions, str_of(body, "nextPageToken"))
}

/// First occurrence wins; page order and intra-page order are preserved.
pub fn dedup_students(students: Vec<Student>) -> Vec<Student> {
    let mut seen = HashSet::new();
    students
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect()
}

/// Applied only when a filter value was supplied; absence means "all states".
pub fn filter_by_state(submissions: Vec<Submission>, state: Option<&str>) -> Vec<Submission> {
    match state {
        Some(wanted) => submissions
            .into_iter()
            .filter(|s| s.state == wanted)
            .collect(),
        None => submissions,
    }
}

/// Joins each submission with `{name, email}` from the roster snapshot.
/// Students removed after submitting resolve to `Unknown`/`Unknown` rather
/// than failing the request.
pub fn join_submissions(submissions: Vec<Submission>, roster: &[Student]) -> Vec<JoinedSubmission> {
    let by_id: HashMap<&str, &Student> = roster.iter().map(|s| (s.id.as_str(), s)).collect();
    submissions
        .into_iter()
        .map(|s| {
            let (name, email) = match by_id.get(s.user_id.as_str()) {
                Some(student) => (
                    student.name.clone(),
                    student.email_for_display().to_string(),
                ),
                None => (UNKNOWN_STUDENT.to_string(), UNKNOWN_STUDENT.to_string()),
            };
            JoinedSubmission {
                id: s.id,
                user_id: s.user_id,
                name,
                email,
                state: s.state,
                assigned_grade: s.assigned_grade,
                attachments: s.attachments,
            }
        })
        .collect()
}

/// Accumulates assigned grades per student id. Ungraded submissions
/// contribute nothing; a grade of 0 still counts as graded.
pub fn accumulate_grades(totals: &mut HashMap<String, f64>, submissions: &[Submission]) {
    for s in submissions {
        if let Some(grade) = s.assigned_grade {
            *totals.entry(s.user_id.clone()).or_insert(0.0) += grade;
        }
    }
}

pub fn sorted_leaderboard(totals: HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = totals.into_iter().collect();
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    rows
}

fn str_of(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|t| t.as_str()).map(|s| s.to_string())
}

pub struct ClassroomClient<'a> {
    http: &'a reqwest::Client,
    token: String,
}

impl<'a> ClassroomClient<'a> {
    pub fn new(http: &'a reqwest::Client, token: String) -> Self {
        Self { http, token }
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::RemoteApi(format!(
                "classroom request failed with {}: {}",
                status, body
            )));
        }
        Ok(resp.json().await?)
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>, ApiError> {
        let body = self
            .get_json(&format!("{}/courses", CLASSROOM_BASE), &[])
            .await?;
        Ok(parse_courses(&body))
    }

    /// The complete, de-paginated roster for a course. Fetching continues
    /// while a continuation token is present and stops exactly when absent;
    /// any page failure aborts the whole fetch.
    pub async fn list_students(&self, course_id: &str) -> Result<Vec<Student>, ApiError> {
        let url = format!("{}/courses/{}/students", CLASSROOM_BASE, course_id);
        let mut all = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let body = match page_token.as_deref() {
                Some(token) => self.get_json(&url, &[("pageToken", token)]).await?,
                None => self.get_json(&url, &[]).await?,
            };
            let (students, next) = parse_students_page(&body);
            all.extend(students);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(dedup_students(all))
    }

    pub async fn list_coursework(&self, course_id: &str) -> Result<Vec<Assignment>, ApiError> {
        let url = format!("{}/courses/{}/courseWork", CLASSROOM_BASE, course_id);
        let body = self.get_json(&url, &[]).await?;
        Ok(parse_coursework(&body))
    }

    pub async fn list_submissions(
        &self,
        course_id: &str,
        assignment_id: &str,
    ) -> Result<Vec<Submission>, ApiError> {
        let url = format!(
            "{}/courses/{}/courseWork/{}/studentSubmissions",
            CLASSROOM_BASE, course_id, assignment_id
        );
        let mut all = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let body = match page_token.as_deref() {
                Some(token) => self.get_json(&url, &[("pageToken", token)]).await?,
                None => self.get_json(&url, &[]).await?,
            };
            let (submissions, next) = parse_submissions_page(&body);
            all.extend(submissions);
            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(all)
    }

    /// Student id -> assigned grade for one assignment. Ungraded submissions
    /// are absent from the map; 0 is a valid grade and is kept.
    pub async fn grade_map(
        &self,
        course_id: &str,
        assignment_id: &str,
    ) -> Result<HashMap<String, f64>, ApiError> {
        let submissions = self.list_submissions(course_id, assignment_id).await?;
        let mut grades = HashMap::new();
        for s in submissions {
            if let Some(grade) = s.assigned_grade {
                grades.insert(s.user_id, grade);
            }
        }
        Ok(grades)
    }
}
