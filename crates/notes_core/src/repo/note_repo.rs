//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and listing over the `notes` table.
//! - Bind and read typed columns through the conversion-layer shims.
//!
//! # Invariants
//! - Write paths call `Note::validate()` before SQL mutations.
//! - Read paths reject undecodable or invalid rows instead of masking them.
//! - Listing order is `pinned DESC, modified_date DESC, uuid ASC`.

use crate::convert::{encode_code, ConvertError};
use crate::db::DbError;
use crate::model::note::{Note, NoteId, NoteStatus, NoteValidationError};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    uuid,
    type,
    title,
    content,
    added_date,
    modified_date,
    status,
    pinned
FROM notes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(NoteValidationError),
    Db(DbError),
    NotFound(NoteId),
    /// A stored code or date failed to decode: the row is corrupt or was
    /// written by a newer schema.
    Integrity(ConvertError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::Integrity(err) => write!(f, "stored note data failed integrity check: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Integrity(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<NoteValidationError> for RepoError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::FromSqlConversionFailure(_, _, source) = &value {
            if let Some(err) = source.downcast_ref::<ConvertError>() {
                return Self::Integrity(err.clone());
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Only notes in this status; all statuses when `None`.
    pub status: Option<NoteStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for note persistence.
pub trait NoteRepository {
    fn create_note(&self, note: &Note) -> RepoResult<NoteId>;
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Permanently removes one note.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    /// Replaces the whole table with `notes` in one transaction.
    fn replace_all(&mut self, notes: &[Note]) -> RepoResult<()>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;
        insert_note(&*self.conn, note)?;
        Ok(note.uuid)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        note.validate()?;

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                type = ?1,
                title = ?2,
                content = ?3,
                added_date = ?4,
                modified_date = ?5,
                status = ?6,
                pinned = ?7
             WHERE uuid = ?8;",
            params![
                note.kind,
                note.title.as_str(),
                note.content.as_str(),
                note.added_date,
                note.modified_date,
                note.status,
                note.pinned,
                note.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(note.uuid));
        }

        Ok(())
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }

        Ok(None)
    }

    fn list_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Integer(i64::from(encode_code(status))));
        }

        sql.push_str(" ORDER BY pinned DESC, modified_date DESC, uuid ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();

        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }

        Ok(notes)
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn replace_all(&mut self, notes: &[Note]) -> RepoResult<()> {
        for note in notes {
            note.validate()?;
        }

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM notes;", [])?;
        for note in notes {
            insert_note(&tx, note)?;
        }
        tx.commit()?;

        info!(
            "event=notes_replace module=repo status=ok count={}",
            notes.len()
        );
        Ok(())
    }
}

fn insert_note(conn: &Connection, note: &Note) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO notes (
            uuid,
            type,
            title,
            content,
            added_date,
            modified_date,
            status,
            pinned
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            note.uuid.to_string(),
            note.kind,
            note.title.as_str(),
            note.content.as_str(),
            note.added_date,
            note.modified_date,
            note.status,
            note.pinned,
        ],
    )?;
    Ok(())
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in notes.uuid"))
    })?;

    decode_note_columns(row, uuid).map_err(|err| {
        if let RepoError::Integrity(cause) = &err {
            warn!(
                "event=note_read module=repo status=error error_code=integrity_fault uuid={uuid} error={cause}"
            );
        }
        err
    })
}

fn decode_note_columns(row: &Row<'_>, uuid: Uuid) -> RepoResult<Note> {
    let note = Note {
        uuid,
        kind: row.get("type")?,
        title: row.get("title")?,
        content: row.get("content")?,
        added_date: row.get("added_date")?,
        modified_date: row.get("modified_date")?,
        status: row.get("status")?,
        pinned: row.get("pinned")?,
    };
    note.validate()?;
    Ok(note)
}
