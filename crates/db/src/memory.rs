//! In-memory store implementations.
//!
//! Used by the API integration tests and for running the service without a
//! database. Locks are held only for the duration of a single call, so each
//! `save` replaces the whole aggregate at once.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sonaa_core::access::Capabilities;
use sonaa_core::project::{NewProject, Project};
use sonaa_core::types::DbId;

use crate::models::user::UserAccount;
use crate::store::{ActorDirectory, ProjectStore, StoreError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct ProjectTable {
    next_id: DbId,
    rows: BTreeMap<DbId, Project>,
}

#[derive(Default)]
pub struct InMemoryProjectStore {
    table: Mutex<ProjectTable>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut projects: Vec<Project>) -> Vec<Project> {
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    projects
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn insert(&self, project: NewProject) -> Result<Project, StoreError> {
        let mut table = lock(&self.table);
        table.next_id += 1;
        let project = project.into_project(table.next_id, Utc::now());
        table.rows.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<Project>, StoreError> {
        Ok(lock(&self.table).rows.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Project>, StoreError> {
        let rows = lock(&self.table).rows.values().cloned().collect();
        Ok(newest_first(rows))
    }

    async fn list_involving(&self, user_id: DbId) -> Result<Vec<Project>, StoreError> {
        let rows = lock(&self.table)
            .rows
            .values()
            .filter(|p| p.involves(user_id))
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn save(&self, project: &Project) -> Result<Option<Project>, StoreError> {
        let mut table = lock(&self.table);
        match table.rows.get_mut(&project.id) {
            Some(slot) => {
                let mut saved = project.clone();
                saved.updated_at = Utc::now();
                *slot = saved.clone();
                Ok(Some(saved))
            }
            None => Ok(None),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    accounts: Mutex<Vec<UserAccount>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user holding `capabilities`, returning its id.
    pub fn add_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role_name: Option<&str>,
        capabilities: Capabilities,
    ) -> DbId {
        let mut accounts = lock(&self.accounts);
        let id = accounts.len() as DbId + 1;
        accounts.push(UserAccount {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role_id: role_name.map(|_| id),
            role_name: role_name.map(str::to_string),
            can_see_all_projects: capabilities.can_see_all_projects,
            can_add_project: capabilities.can_add_project,
            can_add_client: capabilities.can_add_client,
            can_approve_stages: capabilities.can_approve_stages,
            can_manage_team: capabilities.can_manage_team,
            can_see_reports: capabilities.can_see_reports,
            can_manage_sales: capabilities.can_manage_sales,
            created_at: Utc::now(),
        });
        id
    }
}

#[async_trait]
impl ActorDirectory for InMemoryDirectory {
    async fn find_by_id(&self, user_id: DbId) -> Result<Option<UserAccount>, StoreError> {
        Ok(lock(&self.accounts)
            .iter()
            .find(|a| a.id == user_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(lock(&self.accounts)
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}
