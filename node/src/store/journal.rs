// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only State Journal
//!
//! The canonical durability layer for tasks and users:
//! - Records are written to disk BEFORE the in-memory state changes
//! - Every append is fsync'd for crash safety
//! - No truncation or rewriting allowed
//! - One JSON record per line; replay rebuilds the full state
//!
//! A torn final line (crash mid-append) is tolerated on replay: the record
//! never became truth because the in-memory apply happens after the fsync.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use taskanchor_core::task::{OwnerId, Task, TaskId};

use crate::users::UserRecord;

const JOURNAL_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid journal header")]
    InvalidHeader,
}

pub type Result<T> = std::result::Result<T, JournalError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalRecord {
    Header { version: u32 },
    UserCreated { user: UserRecord },
    TaskCreated { task: Task },
    TaskEdited { task: Task },
    TaskDeleted { owner: OwnerId, id: TaskId },
    TaskCompleted { task: Task },
}

/// Append-only journal writer.
///
/// # Safety Guarantees
/// - Write + fsync before returning
/// - No buffering without explicit flush
pub struct JournalWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl JournalWriter {
    /// Open for appending, writing the header if the file is new.
    pub fn open(path: &Path) -> Result<Self> {
        let exists = path.exists() && std::fs::metadata(path)?.len() > 0;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut journal = Self { writer: BufWriter::new(file), path: path.to_path_buf() };
        if !exists {
            journal.append(&JournalRecord::Header { version: JOURNAL_VERSION })?;
        }
        Ok(journal)
    }

    pub fn append(&mut self, record: &JournalRecord) -> Result<()> {
        let line = serde_json::to_string(record).map_err(|e| JournalError::Serialization(e.to_string()))?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        // Durability barrier: the record must be on disk before the in-memory
        // state is allowed to reflect it.
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub struct Replayed {
    pub records: Vec<JournalRecord>,
    /// Byte length of the cleanly parsed prefix. Shorter than the file when
    /// the final record is torn.
    pub valid_len: u64,
}

/// Replay a journal file into its record sequence.
///
/// Stops cleanly at a torn final line (crash mid-append); any earlier
/// malformed line means real corruption and is an error. Callers must
/// truncate the file to `valid_len` before appending again, otherwise the
/// next record would be glued onto the torn bytes.
pub fn replay(path: &Path) -> Result<Replayed> {
    let mut raw = String::new();
    File::open(path)?.read_to_string(&mut raw)?;

    let mut records = Vec::new();
    let mut valid_len = 0u64;
    let mut lines = raw.split_inclusive('\n').peekable();
    let mut first = true;
    while let Some(line) = lines.next() {
        let terminated = line.ends_with('\n');
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            valid_len += line.len() as u64;
            continue;
        }
        match serde_json::from_str::<JournalRecord>(trimmed) {
            Ok(JournalRecord::Header { version }) if first => {
                if version != JOURNAL_VERSION {
                    return Err(JournalError::InvalidHeader);
                }
            }
            Ok(_) if first => return Err(JournalError::InvalidHeader),
            Ok(record) => records.push(record),
            Err(err) => {
                if lines.peek().is_none() && !terminated {
                    tracing::warn!("journal ends in a torn record; dropping it");
                    break;
                }
                return Err(JournalError::Serialization(err.to_string()));
            }
        }
        valid_len += line.len() as u64;
        first = false;
    }
    Ok(Replayed { records, valid_len })
}
