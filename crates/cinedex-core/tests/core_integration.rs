#![allow(clippy::unwrap_used, clippy::expect_used)]

use cinedex_core::*;

// ---------------------------------------------------------------------------
// 1. Domain event names
// ---------------------------------------------------------------------------

#[test]
fn event_names_parse_into_change_events() {
    let updated = ChangeEvent::from_event_name("movies.updated", 12).unwrap();
    assert_eq!(updated.collection, EntityType::Movies);
    assert_eq!(updated.entity_id, 12);
    assert_eq!(updated.kind, ChangeKind::Updated);
    assert!(!updated.is_deletion());

    let deleted = ChangeEvent::from_event_name("promotion.deleted", 3).unwrap();
    assert_eq!(deleted.collection, EntityType::Promotions);
    assert!(deleted.is_deletion());
}

#[test]
fn malformed_event_names_are_rejected() {
    assert!(ChangeEvent::from_event_name("movies", 1).is_err());
    assert!(ChangeEvent::from_event_name("movies.archived", 1).is_err());
    assert!(ChangeEvent::from_event_name("bookings.created", 1).is_err());
}

// ---------------------------------------------------------------------------
// 2. Record payloads
// ---------------------------------------------------------------------------

#[test]
fn cinema_record_deserializes_with_defaults() {
    let json = serde_json::json!({
        "type": "cinema",
        "id": 4,
        "name": "Galaxy Nguyễn Du"
    });
    let record: EntityRecord = serde_json::from_value(json).unwrap();

    match &record {
        EntityRecord::Cinema(c) => {
            assert_eq!(c.name, "Galaxy Nguyễn Du");
            assert!(c.is_active);
            assert!(c.address.is_none());
        }
        other => panic!("expected cinema, got {other:?}"),
    }
    assert_eq!(record.id(), 4);
    assert!(RecordFilter::Active.matches(&record));
}

#[test]
fn keyword_fields_cover_descriptions() {
    let json = serde_json::json!({
        "type": "movie",
        "id": 1,
        "title": "Mai",
        "original_title": "Mai (2024)",
        "description": "Một câu chuyện tình",
        "director": "Trấn Thành"
    });
    let record: EntityRecord = serde_json::from_value(json).unwrap();
    let fields = record.keyword_fields();

    assert!(fields.contains(&"Mai"));
    assert!(fields.contains(&"Mai (2024)"));
    assert!(fields.contains(&"Một câu chuyện tình"));
    assert!(fields.contains(&"Trấn Thành"));
}

// ---------------------------------------------------------------------------
// 3. Errors
// ---------------------------------------------------------------------------

#[test]
fn error_display_and_classification() {
    let err = CinedexError::Config("missing API key".into());
    assert_eq!(err.to_string(), "Config error: missing API key");
    assert!(err.is_config());

    let err = CinedexError::VectorStore("connection refused".into());
    assert!(!err.is_config());

    let json_err = serde_json::from_str::<EntityRecord>("{").unwrap_err();
    let err: CinedexError = json_err.into();
    assert!(matches!(err, CinedexError::Json(_)));
}
