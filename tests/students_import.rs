
use classledgerd::ledger::{import_students, Ledger, CANONICAL_HEADER};
use test_support::{ledger, row, student};

#[test]
fn empty_ledger_gets_canonical_header_and_row() {
    let mut working = Ledger::from_values(Vec::new());
    let roster = vec![student("s1", "A, B", Some("a@x.com"))];

    let appended = import_students(&mut working, &roster);

    assert_eq!(working.header, CANONICAL_HEADER.to_vec());
    assert_eq!(appended, vec![row(&["s1", "A B", "a@x.com", "0", "Cadet"])]);
    assert_eq!(working.rows.len(), 1);
}

#[test]
fn import_twice_with_unchanged_roster_is_idempotent() {
    let mut working = Ledger::from_values(Vec::new());
    let roster = vec![
        student("s1", "Alice Smith", Some("alice@x.com")),
        student("s2", "Bob Jones", Some("bob@x.com")),
    ];

    let first = import_students(&mut working, &roster);
    assert_eq!(first.len(), 2);
    let snapshot = working.clone();

    let second = import_students(&mut working, &roster);
    assert!(second.is_empty(), "no rows may be appended on the second run");
    assert_eq!(working, snapshot);
}

#[test]
fn existing_rows_points_and_ranks_are_never_touched() {
    let mut working = ledger(&[
        &["google_classroom_Id", "name", "email", "points", "rank"],
        &["s1", "Old Hand", "old@x.com", "650", "Junior"],
    ]);
    let roster = vec![
        student("s1", "Old Hand", Some("old@x.com")),
        student("s2", "New Kid", Some("new@x.com")),
    ];

    let appended = import_students(&mut working, &roster);

    assert_eq!(appended, vec![row(&["s2", "New Kid", "new@x.com", "0", "Cadet"])]);
    // The stale Junior at 650 points is deliberately left alone: bulk
    // import assigns rank only to the rows it adds.
    assert_eq!(working.rows[0], row(&["s1", "Old Hand", "old@x.com", "650", "Junior"]));
}

#[test]
fn missing_email_becomes_the_unavailable_marker() {
    let mut working = Ledger::from_values(Vec::new());
    let appended = import_students(&mut working, &[student("s1", "No Mail", None)]);
    assert_eq!(appended[0][2], "No email available");
}

#[test]
fn header_is_rewritten_without_clobbering_dynamic_columns() {
    let mut working = ledger(&[
        &["google_classroom_Id", "name", "email", "points", "rank", "Homework_1_state"],
        &["s1", "Alice", "alice@x.com", "95", "Cadet", "95"],
    ]);

    import_students(&mut working, &[student("s2", "Bob", Some("bob@x.com"))]);

    assert_eq!(working.header.len(), 6);
    assert_eq!(working.header[5], "Homework_1_state");
    assert_eq!(working.rows[0][5], "95");
}
