//! Project store bootstrap.
//!
//! # Responsibility
//! - Hand out SQLite connections ready to hold projects and their events.
//! - Bring the project store schema up to date before first use.
//!
//! # Invariants
//! - The store schema version lives in `PRAGMA user_version`.
//! - A store written by a newer build is refused, never downgraded.
//! - Repositories only see connections whose migrations succeeded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The store's schema is ahead of every migration this build knows.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "project store error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "project store schema v{found} was written by a newer build; this build reads up to v{supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
