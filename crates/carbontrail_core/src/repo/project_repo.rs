//! Project repository over SQLite.
//!
//! # Responsibility
//! - Persist whole projects (metadata plus ordered events).
//! - Serve persisted projects through the `ProjectProvider` contract.
//!
//! # Invariants
//! - Writes call `Project::validate()` before any SQL mutation.
//! - Saving replaces the previous rows for the same id in one transaction.
//! - Reads re-validate and reject invalid persisted data instead of masking it.

use crate::catalog::ProjectProvider;
use crate::db::DbError;
use crate::model::event::LifecycleEvent;
use crate::model::project::{Methodology, Project, ProjectValidationError};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ProjectValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted project data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ProjectValidationError> for RepoError {
    fn from(value: ProjectValidationError) -> Self {
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
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQLite-backed project store.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Writes `project`, replacing any stored project with the same id.
    pub fn save_project(&mut self, project: &Project) -> RepoResult<()> {
        project.validate()?;

        // Events live in their own rows; the project payload omits them.
        let mut header = project.clone();
        header.events = Vec::new();
        let payload = to_json(&header)?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM projects WHERE id = ?1;", [project.id.as_str()])?;
        tx.execute(
            "INSERT INTO projects (id, name, methodology, home_lat, home_lng, co2_quantity, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                project.id.as_str(),
                project.name.as_str(),
                project.methodology.as_str(),
                project.location.lat,
                project.location.lng,
                project.co2_quantity,
                payload,
            ],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO project_events (
                    project_id, position, event_id, category, lat, lng, occurred_at, co2_impact, payload
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            )?;
            for (position, event) in project.events.iter().enumerate() {
                let position = i64::try_from(position).map_err(|_| {
                    RepoError::InvalidData(format!("event position {position} overflows"))
                })?;
                insert.execute(params![
                    project.id.as_str(),
                    position,
                    event.id.as_str(),
                    event.category.as_str(),
                    event.coordinate.lat,
                    event.coordinate.lng,
                    event.timestamp.to_rfc3339(),
                    event.co2_impact,
                    to_json(event)?,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "event=project_save module=repo status=ok project_id={} events={}",
            project.id,
            project.events.len()
        );
        Ok(())
    }

    /// Deletes a project and its events; `false` when nothing was stored.
    pub fn delete_project(&mut self, id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    /// Reads a project back in event order.
    pub fn load_project(&self, id: &str) -> RepoResult<Option<Project>> {
        let row = self
            .conn
            .query_row(
                "SELECT methodology, payload FROM projects WHERE id = ?1;",
                [id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((methodology_text, payload)) = row else {
            return Ok(None);
        };

        let methodology = Methodology::parse(&methodology_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid methodology `{methodology_text}` in projects.methodology"
            ))
        })?;
        let mut project: Project = serde_json::from_str(&payload).map_err(|err| {
            RepoError::InvalidData(format!("projects.payload for `{id}`: {err}"))
        })?;
        if project.id != id || project.methodology != methodology {
            return Err(RepoError::InvalidData(format!(
                "projects.payload for `{id}` disagrees with its row"
            )));
        }
        project.events = self.load_events(id)?;

        project
            .validate()
            .map_err(|err| RepoError::InvalidData(format!("project `{id}`: {err}")))?;
        Ok(Some(project))
    }

    /// Stored ids in ascending order.
    pub fn list_project_ids(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT id FROM projects ORDER BY id ASC;")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn load_events(&self, id: &str) -> RepoResult<Vec<LifecycleEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT position, payload FROM project_events
             WHERE project_id = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([id])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            let position: i64 = row.get("position")?;
            let payload: String = row.get("payload")?;
            let event = serde_json::from_str::<LifecycleEvent>(&payload).map_err(|err| {
                RepoError::InvalidData(format!(
                    "project_events.payload at {id}#{position}: {err}"
                ))
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

impl ProjectProvider for SqliteProjectRepository<'_> {
    type Error = RepoError;

    fn project(&self, id: &str) -> RepoResult<Option<Project>> {
        self.load_project(id)
    }

    fn project_ids(&self) -> RepoResult<Vec<String>> {
        self.list_project_ids()
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode payload: {err}")))
}
