//! Storage seams used by the API layer.
//!
//! [`ProjectStore`] persists project aggregates and [`ActorDirectory`]
//! resolves users and their role capabilities. Both have a Postgres
//! implementation here and an in-memory one in [`crate::memory`].

use async_trait::async_trait;
use sonaa_core::access::Actor;
use sonaa_core::project::{NewProject, Project};
use sonaa_core::types::DbId;

use crate::models::project::ProjectRow;
use crate::models::user::UserAccount;
use crate::repositories::{ProjectRepo, UserRepo};
use crate::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be rebuilt into a valid aggregate.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Persist a new project and return it with its assigned id.
    async fn insert(&self, project: NewProject) -> Result<Project, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<Project>, StoreError>;

    /// Every project, newest first.
    async fn list_all(&self) -> Result<Vec<Project>, StoreError>;

    /// Projects created by, or assigned in any position to, `user_id`.
    async fn list_involving(&self, user_id: DbId) -> Result<Vec<Project>, StoreError>;

    /// Write the whole project back in one step. `None` if it no longer exists.
    async fn save(&self, project: &Project) -> Result<Option<Project>, StoreError>;

    /// Check the backing storage is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ActorDirectory: Send + Sync {
    async fn find_by_id(&self, user_id: DbId) -> Result<Option<UserAccount>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError>;

    /// Resolve a user id into an actor carrying its current capabilities.
    async fn resolve_actor(&self, user_id: DbId) -> Result<Option<Actor>, StoreError> {
        Ok(self.find_by_id(user_id).await?.map(|account| account.actor()))
    }
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

fn rebuild(row: ProjectRow) -> Result<Project, StoreError> {
    let id = row.id;
    row.into_project().map_err(|e| {
        tracing::error!(project_id = id, error = %e, "Stored project failed validation");
        StoreError::Corrupt(format!("project {id}: {e}"))
    })
}

fn rebuild_all(rows: Vec<ProjectRow>) -> Result<Vec<Project>, StoreError> {
    rows.into_iter().map(rebuild).collect()
}

#[derive(Clone)]
pub struct PgProjectStore {
    pool: DbPool,
}

impl PgProjectStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn insert(&self, project: NewProject) -> Result<Project, StoreError> {
        let row = ProjectRepo::create(&self.pool, &project).await?;
        rebuild(row)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Project>, StoreError> {
        ProjectRepo::find_by_id(&self.pool, id)
            .await?
            .map(rebuild)
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<Project>, StoreError> {
        rebuild_all(ProjectRepo::list(&self.pool).await?)
    }

    async fn list_involving(&self, user_id: DbId) -> Result<Vec<Project>, StoreError> {
        rebuild_all(ProjectRepo::list_involving(&self.pool, user_id).await?)
    }

    async fn save(&self, project: &Project) -> Result<Option<Project>, StoreError> {
        ProjectRepo::save(&self.pool, project)
            .await?
            .map(rebuild)
            .transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

#[derive(Clone)]
pub struct PgActorDirectory {
    pool: DbPool,
}

impl PgActorDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActorDirectory for PgActorDirectory {
    async fn find_by_id(&self, user_id: DbId) -> Result<Option<UserAccount>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, user_id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }
}
