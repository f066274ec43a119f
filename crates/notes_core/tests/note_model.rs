use notes_core::{Note, NoteStatus, NoteType, NoteValidationError, PinnedStatus, Timestamp};
use uuid::Uuid;

fn at(millis: i64) -> Timestamp {
    Timestamp::from_millis(millis).unwrap()
}

#[test]
fn note_new_sets_defaults() {
    let note = Note::new(NoteType::Text, "title", "body", at(1_000));

    assert!(!note.uuid.is_nil());
    assert_eq!(note.status, NoteStatus::Active);
    assert_eq!(note.pinned, PinnedStatus::Unpinned);
    assert_eq!(note.added_date, note.modified_date);
    assert!(note.validate().is_ok());
}

#[test]
fn with_id_rejects_nil_uuid() {
    let err = Note::with_id(Uuid::nil(), NoteType::Text, "", "", at(0)).unwrap_err();
    assert_eq!(err, NoteValidationError::NilUuid);
}

#[test]
fn status_changes_keep_pinned_consistent() {
    let mut note = Note::new(NoteType::Text, "", "", at(1_000));
    note.set_pinned(PinnedStatus::Pinned, at(1_500)).unwrap();
    assert!(note.is_pinned());

    note.change_status(NoteStatus::Deleted, at(2_000));
    assert_eq!(note.pinned, PinnedStatus::CantPin);
    assert_eq!(note.modified_date, at(2_000));
    assert!(note.validate().is_ok());

    note.change_status(NoteStatus::Active, at(3_000));
    assert_eq!(note.pinned, PinnedStatus::Unpinned);
    assert!(note.validate().is_ok());
}

#[test]
fn pinning_is_limited_to_active_notes() {
    let mut note = Note::new(NoteType::Text, "", "", at(1_000));
    assert_eq!(
        note.set_pinned(PinnedStatus::CantPin, at(1_000)),
        Err(NoteValidationError::UnpinnableWhileActive)
    );

    note.change_status(NoteStatus::Archived, at(2_000));
    assert_eq!(
        note.set_pinned(PinnedStatus::Pinned, at(3_000)),
        Err(NoteValidationError::PinnedWhileInactive {
            status: NoteStatus::Archived,
            pinned: PinnedStatus::Pinned,
        })
    );
    assert_eq!(note.modified_date, at(2_000));
}

#[test]
fn validate_rejects_inconsistent_pinned_state() {
    let mut note = Note::new(NoteType::Text, "", "", at(1_000));
    note.pinned = PinnedStatus::CantPin;
    assert_eq!(
        note.validate(),
        Err(NoteValidationError::UnpinnableWhileActive)
    );

    note.status = NoteStatus::Archived;
    note.pinned = PinnedStatus::Unpinned;
    assert!(matches!(
        note.validate(),
        Err(NoteValidationError::PinnedWhileInactive { .. })
    ));
}

#[test]
fn note_serialization_uses_expected_wire_fields() {
    let note_id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let mut note = Note::with_id(
        note_id,
        NoteType::List,
        "groceries",
        "milk",
        at(1_587_230_071_650),
    )
    .unwrap();
    note.set_pinned(PinnedStatus::Pinned, at(1_587_230_072_000))
        .unwrap();

    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["uuid"], note_id.to_string());
    assert_eq!(json["type"], 1);
    assert_eq!(json["title"], "groceries");
    assert_eq!(json["content"], "milk");
    assert_eq!(json["added"], "2020-04-18T17:14:31.650Z");
    assert_eq!(json["modified"], "2020-04-18T17:14:32.000Z");
    assert_eq!(json["status"], 0);
    assert_eq!(json["pinned"], 2);

    let decoded: Note = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, note);
}

#[test]
fn deserialize_rejects_invalid_note() {
    let value = serde_json::json!({
        "uuid": "11111111-2222-4333-8444-555555555555",
        "type": 0,
        "title": "",
        "content": "",
        "added": "2020-04-18T17:14:31.650Z",
        "modified": "2020-04-18T17:14:31.650Z",
        "status": 1,
        "pinned": 2
    });

    let err = serde_json::from_value::<Note>(value).unwrap_err();
    assert!(
        err.to_string().contains("must be CantPin"),
        "unexpected error: {err}"
    );
}
