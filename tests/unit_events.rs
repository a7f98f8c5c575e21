use qrschool_models::{AttendanceEvent, AttendanceMap, AttendanceStatus, EventRejection};

fn message(student: &str, status: &str) -> String {
    format!(
        r#"{{"type":"attendance_update","studentId":"{student}","scheduleId":"7","date":"2024-03-04","status":"{status}"}}"#
    )
}

fn apply(map: &mut AttendanceMap, text: &str) -> Option<AttendanceEvent> {
    let event = AttendanceEvent::parse(text, "42").ok()?;
    map.apply(event.key(), event.status);
    Some(event)
}

#[test]
fn test_known_codes_normalise_into_canonical_set() {
    let cases = [
        ("present", AttendanceStatus::Present),
        ("absent", AttendanceStatus::Absent),
        ("retard", AttendanceStatus::Late),
        ("late", AttendanceStatus::Late),
        ("att", AttendanceStatus::Pending),
        ("pending", AttendanceStatus::Pending),
        ("PENDING", AttendanceStatus::Pending),
        ("not_set", AttendanceStatus::Unset),
        ("bogus", AttendanceStatus::Unset),
    ];
    for (code, expected) in cases {
        let event = AttendanceEvent::parse(&message("42", code), "42").unwrap();
        assert_eq!(event.status, expected, "code {code}");
        assert_eq!(event.raw_status.as_deref(), Some(code));
    }
}

#[test]
fn test_unset_event_is_idempotent() {
    let mut map = AttendanceMap::new();
    apply(&mut map, &message("42", "present")).unwrap();
    assert_eq!(map.len(), 1);

    apply(&mut map, &message("42", "bogus")).unwrap();
    let after_first = map.clone();
    apply(&mut map, &message("42", "bogus")).unwrap();

    assert!(map.is_empty());
    assert_eq!(map, after_first);
}

#[test]
fn test_present_keys_always_hold_a_set_status() {
    let mut map = AttendanceMap::new();
    for code in ["present", "bogus", "retard", "", "att", "absent", "not_set"] {
        apply(&mut map, &message("42", code));
        assert!(map.iter().all(|(_, status)| status.is_set()));
    }
}

#[test]
fn test_foreign_student_leaves_map_unchanged() {
    let mut map = AttendanceMap::new();
    apply(&mut map, &message("42", "present")).unwrap();
    let before = map.clone();

    let rejected = AttendanceEvent::parse(&message("7", "absent"), "42").unwrap_err();
    assert_eq!(rejected, EventRejection::ForeignStudent);
    assert!(apply(&mut map, &message("7", "absent")).is_none());
    assert_eq!(map, before);
}
