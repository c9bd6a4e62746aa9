use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::board::TaskBoard;
use crate::error::{Result, StoreError};
use crate::models::Task;

/// On-disk layout. The id counter is saved so deleted ids stay retired.
#[derive(Serialize)]
struct Snapshot<'a> {
    next_id: u64,
    tasks: &'a [Task],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Board { next_id: u64, tasks: Vec<Task> },
    /// Files written before the counter existed are a bare task array.
    Legacy(Vec<Task>),
}

/// JSON file holding every task on the board.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the board.
    ///
    /// A missing file is an empty board; an unreadable or malformed one is an error.
    pub fn load(&self) -> Result<TaskBoard> {
        let mut f = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TaskBoard::default()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let mut s = String::new();
        f.read_to_string(&mut s).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        if s.trim().is_empty() {
            return Ok(TaskBoard::default());
        }
        let stored = serde_json::from_str(&s).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "loaded task database");
        Ok(match stored {
            Stored::Board { next_id, tasks } => TaskBoard::with_next_id(tasks, next_id),
            Stored::Legacy(tasks) => TaskBoard::from_tasks(tasks),
        })
    }

    /// Saves the board, overwriting the existing file.
    pub fn save(&self, board: &TaskBoard) -> Result<()> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(write_err)?;
            }
        }
        let s = serde_json::to_string_pretty(&Snapshot {
            next_id: board.next_id(),
            tasks: board.tasks(),
        })?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(write_err)?;
        f.write_all(s.as_bytes()).map_err(write_err)?;
        Ok(())
    }

    /// Deletes the database file if present.
    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
