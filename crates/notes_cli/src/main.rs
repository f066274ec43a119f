//! Command-line probe for `notes_core`.
//!
//! # Responsibility
//! - Exercise the conversion layer from a shell.
//! - Drive note persistence and sync import/export against a database file.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use notes_core::db::open_db;
use notes_core::{
    decode_code, encode_code, export_notes, format_timestamp, import_notes, init_logging,
    parse_timestamp, CoreConfig, Note, NoteListQuery, NoteRepository, NoteStatus, NoteType,
    PinnedStatus, SqliteNoteRepository, Timestamp,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notes-cli", version, about = "Notes core probe")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prints core linkage information.
    Ping,
    /// Converts pinned statuses to and from stored codes.
    Pinned {
        #[command(subcommand)]
        action: PinnedAction,
    },
    /// Converts timestamps to and from canonical text.
    Date {
        #[command(subcommand)]
        action: DateAction,
    },
    /// Works with notes stored in a database file.
    Note {
        /// Database path; defaults to NOTES_DB_PATH or `notes.sqlite3`.
        #[arg(long, global = true)]
        db: Option<PathBuf>,
        #[command(subcommand)]
        action: NoteAction,
    },
}

#[derive(Subcommand)]
enum PinnedAction {
    Encode { status: PinnedArg },
    Decode {
        #[arg(allow_negative_numbers = true)]
        code: i32,
    },
}

#[derive(Subcommand)]
enum DateAction {
    /// Epoch milliseconds to canonical text.
    Format {
        #[arg(allow_negative_numbers = true)]
        millis: i64,
    },
    /// Canonical text to epoch milliseconds.
    Parse { text: String },
}

#[derive(Subcommand)]
enum NoteAction {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        list: bool,
        #[arg(long)]
        pinned: bool,
    },
    List {
        #[arg(long)]
        status: Option<StatusArg>,
    },
    /// Writes a sync payload of every note to stdout.
    Export,
    /// Replaces every note with the contents of a sync payload file.
    Import { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum PinnedArg {
    CantPin,
    Unpinned,
    Pinned,
}

impl From<PinnedArg> for PinnedStatus {
    fn from(value: PinnedArg) -> Self {
        match value {
            PinnedArg::CantPin => Self::CantPin,
            PinnedArg::Unpinned => Self::Unpinned,
            PinnedArg::Pinned => Self::Pinned,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Active,
    Archived,
    Deleted,
}

impl From<StatusArg> for NoteStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Active => Self::Active,
            StatusArg::Archived => Self::Archived,
            StatusArg::Deleted => Self::Deleted,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CoreConfig::from_env().context("invalid environment configuration")?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(config.log_level, log_dir).context("failed to initialize logging")?;
    }

    match cli.command {
        Command::Ping => {
            println!("notes_core ping={}", notes_core::ping());
            println!("notes_core version={}", notes_core::core_version());
        }
        Command::Pinned { action } => run_pinned(action)?,
        Command::Date { action } => run_date(action)?,
        Command::Note { db, action } => {
            let path = db.unwrap_or(config.db_path);
            run_note(path, action)?;
        }
    }
    Ok(())
}

fn run_pinned(action: PinnedAction) -> Result<()> {
    match action {
        PinnedAction::Encode { status } => {
            println!("{}", encode_code(PinnedStatus::from(status)));
        }
        PinnedAction::Decode { code } => {
            let status: PinnedStatus = decode_code(code)?;
            println!("{status:?}");
        }
    }
    Ok(())
}

fn run_date(action: DateAction) -> Result<()> {
    match action {
        DateAction::Format { millis } => {
            let Some(value) = Timestamp::from_millis(millis) else {
                bail!("{millis} ms is outside years 0000-9999");
            };
            println!("{}", format_timestamp(&value));
        }
        DateAction::Parse { text } => {
            println!("{}", parse_timestamp(&text)?.as_millis());
        }
    }
    Ok(())
}

fn run_note(path: PathBuf, action: NoteAction) -> Result<()> {
    let mut conn =
        open_db(&path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let mut repo = SqliteNoteRepository::new(&mut conn);

    match action {
        NoteAction::Add {
            title,
            content,
            list,
            pinned,
        } => {
            let kind = if list { NoteType::List } else { NoteType::Text };
            let now = Timestamp::now();
            let mut note = Note::new(kind, title, content, now);
            if pinned {
                note.set_pinned(PinnedStatus::Pinned, now)?;
            }
            println!("{}", repo.create_note(&note)?);
        }
        NoteAction::List { status } => {
            let query = NoteListQuery {
                status: status.map(NoteStatus::from),
                ..NoteListQuery::default()
            };
            for note in repo.list_notes(&query)? {
                println!(
                    "{}\t{:?}\t{:?}\t{}\t{}",
                    note.uuid, note.status, note.pinned, note.modified_date, note.title
                );
            }
        }
        NoteAction::Export => println!("{}", export_notes(&repo)?),
        NoteAction::Import { file } => {
            let payload = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read `{}`", file.display()))?;
            let count = import_notes(&mut repo, &payload)?;
            println!("imported {count} notes");
        }
    }
    Ok(())
}
