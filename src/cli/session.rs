//! Per-command context: the open project and who is acting

use anyhow::Result;

use crate::domain::Actor;
use crate::service::{CatalogService, ReservationService};
use crate::storage::{JsonlTaskRepository, Project};

pub struct Session {
    pub project: Project,
    pub catalog: CatalogService<JsonlTaskRepository>,
    pub actor: Actor,
}

impl Session {
    /// Opens the current project and resolves the acting user
    ///
    /// `as_user` (the `--as` flag or `LEND_USER`) wins over the configured
    /// identity; with neither set the command runs anonymously.
    pub fn open(as_user: Option<&str>) -> Result<Self> {
        let project = Project::open_current()?;
        let catalog = CatalogService::for_project(&project);

        let reference = as_user
            .map(str::to_string)
            .or_else(|| project.config().effective_user());
        let actor = catalog.resolve_actor(reference.as_deref())?;
        tracing::debug!(root = %project.root().display(), %actor, "session opened");

        Ok(Self {
            project,
            catalog,
            actor,
        })
    }

    pub fn reservations(&self) -> ReservationService<&JsonlTaskRepository> {
        ReservationService::new(self.catalog.tasks())
    }
}
