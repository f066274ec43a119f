use notes_core::db::open_db_in_memory;
use notes_core::{
    decode_notes, encode_notes, export_notes, import_notes, Note, NoteListQuery, NoteRepository,
    NoteStatus, NoteType, PinnedStatus, SqliteNoteRepository, SyncError, Timestamp,
};

fn at(millis: i64) -> Timestamp {
    Timestamp::from_millis(millis).unwrap()
}

fn sample_notes() -> Vec<Note> {
    let mut pinned = Note::new(NoteType::Text, "pinned", "first", at(1_587_230_071_650));
    pinned
        .set_pinned(PinnedStatus::Pinned, at(1_587_230_071_700))
        .unwrap();
    let mut trashed = Note::new(NoteType::List, "trashed", "a\nb", at(1_587_230_000_000));
    trashed.change_status(NoteStatus::Deleted, at(1_587_230_050_000));
    vec![pinned, trashed]
}

#[test]
fn payload_round_trips_notes() {
    let notes = sample_notes();
    let payload = encode_notes(&notes).unwrap();

    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["notes"][0]["added"], "2020-04-18T17:14:31.650Z");
    assert_eq!(value["notes"][0]["pinned"], 2);
    assert_eq!(value["notes"][1]["status"], 2);
    assert_eq!(value["notes"][1]["pinned"], 0);

    assert_eq!(decode_notes(&payload).unwrap(), notes);
}

#[test]
fn unrecognized_code_in_payload_is_a_data_error() {
    let payload = r#"{"version":1,"notes":[{
        "uuid":"11111111-2222-4333-8444-555555555555",
        "type":0,"title":"","content":"",
        "added":"2020-04-18T17:14:31.650Z",
        "modified":"2020-04-18T17:14:31.650Z",
        "status":0,"pinned":9}]}"#;

    let err = decode_notes(payload).unwrap_err();
    assert!(matches!(err, SyncError::Data(_)), "unexpected error: {err}");
    assert!(err.to_string().contains("unrecognized PinnedStatus code: 9"));
}

#[test]
fn malformed_date_in_payload_is_a_data_error() {
    let payload = r#"{"version":1,"notes":[{
        "uuid":"11111111-2222-4333-8444-555555555555",
        "type":0,"title":"","content":"",
        "added":"not-a-date",
        "modified":"2020-04-18T17:14:31.650Z",
        "status":0,"pinned":1}]}"#;

    let err = decode_notes(payload).unwrap_err();
    assert!(matches!(err, SyncError::Data(_)), "unexpected error: {err}");
    assert!(err.to_string().contains("malformed timestamp `not-a-date`"));
}

#[test]
fn envelope_problems_are_reported_distinctly() {
    assert!(matches!(
        decode_notes(r#"{"version":2,"notes":[]}"#),
        Err(SyncError::UnsupportedVersion(2))
    ));
    assert!(matches!(
        decode_notes(r#"{"version":-1,"notes":[]}"#),
        Err(SyncError::UnsupportedVersion(-1))
    ));
    assert!(matches!(
        decode_notes(r#"{"version":4294967296,"notes":[]}"#),
        Err(SyncError::UnsupportedVersion(4_294_967_296))
    ));
    assert!(matches!(
        decode_notes(r#"{"version":1,"notes":["#),
        Err(SyncError::Json(_))
    ));
    assert!(decode_notes(r#"{"version":1,"notes":[]}"#)
        .unwrap()
        .is_empty());
}

#[test]
fn encode_rejects_invalid_notes() {
    let mut notes = sample_notes();
    notes[0].pinned = PinnedStatus::CantPin;

    assert!(matches!(
        encode_notes(&notes),
        Err(SyncError::Validation(_))
    ));
}

#[test]
fn export_then_import_restores_repository_contents() {
    let notes = sample_notes();

    let mut source_conn = open_db_in_memory().unwrap();
    let mut source = SqliteNoteRepository::new(&mut source_conn);
    source.replace_all(&notes).unwrap();
    let payload = export_notes(&source).unwrap();

    let mut target_conn = open_db_in_memory().unwrap();
    let mut target = SqliteNoteRepository::new(&mut target_conn);
    target
        .create_note(&Note::new(NoteType::Text, "local only", "", at(0)))
        .unwrap();

    assert_eq!(import_notes(&mut target, &payload).unwrap(), 2);
    let restored = target.list_notes(&NoteListQuery::default()).unwrap();
    assert_eq!(restored, notes);

    let before = target.list_notes(&NoteListQuery::default()).unwrap();
    assert!(import_notes(&mut target, r#"{"version":1,"notes":[{"uuid":"x"}]}"#).is_err());
    assert_eq!(target.list_notes(&NoteListQuery::default()).unwrap(), before);
}
