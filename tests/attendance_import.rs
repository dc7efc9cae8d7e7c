
use classledgerd::error::ApiError;
use classledgerd::ledger::{attendance_email_set, grant_attendance};
use test_support::{ledger, row, values};

#[test]
fn matching_email_is_case_insensitive_and_trimmed() {
    let source = values(&[&["Username", "points"], &["alice@x.com"]]);
    let present = attendance_email_set(&source).unwrap();

    let mut working = ledger(&[
        &["google_classroom_Id", "name", "email", "points", "rank"],
        &["s1", "Alice", " Alice@X.com ", "100", "Cadet"],
    ]);

    let outcome = grant_attendance(&mut working, "week1", &present).unwrap();

    assert_eq!(outcome.granted, 1);
    assert_eq!(working.rows[0], row(&["s1", "Alice", " Alice@X.com ", "120", "Cadet", "20"]));
}

#[test]
fn second_import_never_double_counts() {
    let source = values(&[&["email"], &["alice@x.com"]]);
    let present = attendance_email_set(&source).unwrap();

    let mut working = ledger(&[
        &["google_classroom_Id", "name", "email", "points", "rank"],
        &["s1", "Alice", "alice@x.com", "0", "Cadet"],
    ]);

    grant_attendance(&mut working, "week1", &present).unwrap();
    let snapshot = working.clone();

    let outcome = grant_attendance(&mut working, "week1", &present).unwrap();
    assert_eq!(outcome.granted, 0);
    assert_eq!(outcome.already_marked, 1);
    assert_eq!(working, snapshot);
}

#[test]
fn absent_students_get_an_empty_mark_and_no_points() {
    let source = values(&[&["email"], &["bob@x.com"]]);
    let present = attendance_email_set(&source).unwrap();

    let mut working = ledger(&[
        &["google_classroom_Id", "name", "email", "points", "rank"],
        &["s1", "Alice", "alice@x.com", "40", "Cadet"],
    ]);

    let outcome = grant_attendance(&mut working, "week1", &present).unwrap();

    assert_eq!(outcome.granted, 0);
    assert_eq!(working.rows[0][3], "40");
    assert_eq!(working.rows[0][5], "");
}

#[test]
fn existing_marks_survive_a_changed_source_sheet() {
    let mut working = ledger(&[
        &["google_classroom_Id", "name", "email", "points", "rank", "week1"],
        &["s1", "Alice", "alice@x.com", "120", "Cadet", "20"],
    ]);

    // Alice dropped out of the source sheet; her mark and points stay.
    let present = attendance_email_set(&values(&[&["email"], &["bob@x.com"]])).unwrap();
    let outcome = grant_attendance(&mut working, "week1", &present).unwrap();

    assert_eq!(outcome.already_marked, 1);
    assert_eq!(working.rows[0][3], "120");
    assert_eq!(working.rows[0][5], "20");
}

#[test]
fn crossing_a_rank_threshold_never_promotes() {
    let present = attendance_email_set(&values(&[&["email"], &["alice@x.com"]])).unwrap();
    let mut working = ledger(&[
        &["google_classroom_Id", "name", "email", "points", "rank"],
        &["s1", "Alice", "alice@x.com", "590", "Junior"],
    ]);

    grant_attendance(&mut working, "week1", &present).unwrap();

    assert_eq!(working.rows[0][3], "610");
    assert_eq!(working.rows[0][4], "Junior");
}

#[test]
fn source_sheet_without_an_email_column_is_a_schema_error() {
    let source = values(&[&["Name", "Grade"], &["Alice", "A"]]);
    let err = attendance_email_set(&source).unwrap_err();
    assert!(matches!(err, ApiError::Schema(_)));
}

#[test]
fn ledger_without_an_email_column_is_a_schema_error() {
    let present = attendance_email_set(&values(&[&["email"], &["a@x.com"]])).unwrap();
    let mut working = ledger(&[
        &["google_classroom_Id", "name", "points", "rank"],
        &["s1", "Alice", "0", "Cadet"],
    ]);
    let err = grant_attendance(&mut working, "week1", &present).unwrap_err();
    assert!(matches!(err, ApiError::Schema(_)));
}

#[test]
fn source_email_column_is_located_by_header_not_position() {
    let source = values(&[
        &["Timestamp", "Username", "Score"],
        &["2024-01-01", "carol@x.com", "10"],
    ]);
    let present = attendance_email_set(&source).unwrap();
    assert!(present.contains("carol@x.com"));
    assert!(!present.contains("2024-01-01"));
}
