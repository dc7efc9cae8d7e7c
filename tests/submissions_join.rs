
use classledgerd::classroom::{
    dedup_students, filter_by_state, join_submissions, parse_students_page,
    parse_submissions_page,
};
use serde_json::json;
use test_support::{student, submission};

#[test]
fn missing_roster_entries_join_as_unknown() {
    let roster = vec![student("s1", "Alice", Some("alice@x.com"))];
    let submissions = vec![
        submission("sub1", "s1", "TURNED_IN", Some(90.0)),
        submission("sub2", "ghost", "TURNED_IN", None),
    ];

    let joined = join_submissions(submissions, &roster);

    assert_eq!(joined[0].name, "Alice");
    assert_eq!(joined[0].email, "alice@x.com");
    assert_eq!(joined[1].name, "Unknown");
    assert_eq!(joined[1].email, "Unknown");
}

#[test]
fn joined_email_uses_the_unavailable_marker() {
    let roster = vec![student("s1", "Alice", None)];
    let joined = join_submissions(vec![submission("sub1", "s1", "CREATED", None)], &roster);
    assert_eq!(joined[0].email, "No email available");
}

#[test]
fn state_filter_applies_only_when_supplied() {
    let submissions = vec![
        submission("a", "s1", "TURNED_IN", None),
        submission("b", "s2", "CREATED", None),
        submission("c", "s3", "TURNED_IN", None),
    ];

    let all = filter_by_state(submissions.clone(), None);
    assert_eq!(all.len(), 3);

    let turned_in = filter_by_state(submissions, Some("TURNED_IN"));
    assert_eq!(turned_in.len(), 2);
    assert!(turned_in.iter().all(|s| s.state == "TURNED_IN"));
}

#[test]
fn dedup_keeps_the_first_occurrence_in_order() {
    let students = vec![
        student("s1", "Alice", None),
        student("s2", "Bob", None),
        student("s1", "Alice Again", None),
        student("s3", "Carol", None),
    ];

    let deduped = dedup_students(students);

    let ids: Vec<&str> = deduped.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2", "s3"]);
    assert_eq!(deduped[0].name, "Alice");
}

#[test]
fn roster_page_parsing_distinguishes_missing_email() {
    let page = json!({
        "students": [
            { "userId": "s1", "profile": { "name": { "fullName": "Alice" },
                                           "emailAddress": "alice@x.com" } },
            { "userId": "s2", "profile": { "name": { "fullName": "Bob" } } }
        ],
        "nextPageToken": "tok-2"
    });

    let (students, next) = parse_students_page(&page);

    assert_eq!(students.len(), 2);
    assert_eq!(students[0].email.as_deref(), Some("alice@x.com"));
    assert_eq!(students[1].email, None);
    assert_eq!(next.as_deref(), Some("tok-2"));
}

#[test]
fn pagination_stops_exactly_when_the_token_is_absent() {
    let last_page = json!({ "students": [] });
    let (_, next) = parse_students_page(&last_page);
    assert!(next.is_none());
}

#[test]
fn submission_parsing_keeps_zero_grades_and_absent_grades_apart() {
    let page = json!({
        "studentSubmissions": [
            { "id": "a", "userId": "s1", "state": "RETURNED", "assignedGrade": 0 },
            { "id": "b", "userId": "s2", "state": "TURNED_IN" }
        ]
    });

    let (submissions, _) = parse_submissions_page(&page);

    assert_eq!(submissions[0].assigned_grade, Some(0.0));
    assert_eq!(submissions[1].assigned_grade, None);
}

#[test]
fn submission_parsing_normalizes_attachments_in_order() {
    let page = json!({
        "studentSubmissions": [{
            "id": "a",
            "userId": "s1",
            "state": "TURNED_IN",
            "assignmentSubmission": { "attachments": [
                { "youTubeVideo": { "id": "zzz" } },
                { "driveFile": { "title": "Essay", "alternateLink": "https://drive/1" } },
                { "link": { "url": "https://example.com" } }
            ]}
        }]
    });

    let (submissions, _) = parse_submissions_page(&page);

    let titles: Vec<&str> = submissions[0]
        .attachments
        .iter()
        .map(|a| a.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Essay", "Untitled Link"]);
}
