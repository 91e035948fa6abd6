//! Project data providers.
//!
//! # Responsibility
//! - Define the lookup contract the map layer loads projects through.
//! - Provide an in-memory catalog loaded from the JSON project listing.
//!
//! # Invariants
//! - Every project handed out has passed `Project::validate()`.
//! - Project ids are unique within one catalog.
//! - "Not found" is `Ok(None)`, never an error.

use crate::model::project::{Project, ProjectValidationError};
use log::{info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Lookup contract for immutable projects.
pub trait ProjectProvider {
    type Error: Error;

    fn project(&self, id: &str) -> Result<Option<Project>, Self::Error>;

    /// Ids in provider order.
    fn project_ids(&self) -> Result<Vec<String>, Self::Error>;
}

#[derive(Debug)]
pub enum CatalogError {
    Parse(serde_json::Error),
    InvalidProject {
        id: String,
        source: ProjectValidationError,
    },
    DuplicateProjectId(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid project catalog json: {err}"),
            Self::InvalidProject { id, source } => write!(f, "project `{id}` is invalid: {source}"),
            Self::DuplicateProjectId(id) => write!(f, "duplicate project id `{id}`"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidProject { source, .. } => Some(source),
            Self::DuplicateProjectId(_) => None,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Validated projects held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectCatalog {
    projects: Vec<Project>,
    by_id: HashMap<String, usize>,
}

impl InMemoryProjectCatalog {
    pub fn new(projects: Vec<Project>) -> CatalogResult<Self> {
        let mut by_id = HashMap::with_capacity(projects.len());
        for (position, project) in projects.iter().enumerate() {
            project
                .validate()
                .map_err(|source| CatalogError::InvalidProject {
                    id: project.id.clone(),
                    source,
                })?;
            if by_id.insert(project.id.clone(), position).is_some() {
                warn!(
                    "event=catalog_load module=catalog status=error error_code=duplicate_project_id project_id={}",
                    project.id
                );
                return Err(CatalogError::DuplicateProjectId(project.id.clone()));
            }
        }

        info!(
            "event=catalog_load module=catalog status=ok projects={} events={}",
            projects.len(),
            projects.iter().map(|project| project.events.len()).sum::<usize>()
        );
        Ok(Self { projects, by_id })
    }

    /// Loads a JSON array of projects.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        let projects: Vec<Project> = serde_json::from_str(json).map_err(|err| {
            warn!(
                "event=catalog_load module=catalog status=error error_code=parse_failed line={} column={}",
                err.line(),
                err.column()
            );
            CatalogError::Parse(err)
        })?;
        Self::new(projects)
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.by_id.get(id).map(|&position| &self.projects[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl ProjectProvider for InMemoryProjectCatalog {
    type Error = CatalogError;

    fn project(&self, id: &str) -> CatalogResult<Option<Project>> {
        Ok(self.get(id).cloned())
    }

    fn project_ids(&self) -> CatalogResult<Vec<String>> {
        Ok(self.projects.iter().map(|project| project.id.clone()).collect())
    }
}
