//! Collaborator lookups: job postings, applications, and user profiles.
//!
//! These records are owned by subsystems outside the engine; the traits
//! here are the boundary, with in-memory implementations for embedding
//! and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: Uuid,
    pub title: String,
    pub posted_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub job_id: Uuid,
    pub worker_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Existence and ownership checks against the job subsystem.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn job(&self, id: Uuid) -> Option<JobRecord>;
    async fn application(&self, id: Uuid) -> Option<ApplicationRecord>;
}

/// Names and emails for notifications and exports.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user(&self, id: Uuid) -> Option<UserRecord>;
}

#[derive(Debug, Default)]
pub struct InMemoryJobs {
    jobs: RwLock<HashMap<Uuid, JobRecord>>,
    applications: RwLock<HashMap<Uuid, ApplicationRecord>>,
}

impl InMemoryJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_job(&self, job: JobRecord) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn add_application(&self, application: ApplicationRecord) {
        self.applications
            .write()
            .await
            .insert(application.id, application);
    }
}

#[async_trait]
impl JobRepository for InMemoryJobs {
    async fn job(&self, id: Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(&id).cloned()
    }

    async fn application(&self, id: Uuid) -> Option<ApplicationRecord> {
        self.applications.read().await.get(&id).cloned()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUsers {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: UserRecord) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUsers {
    async fn user(&self, id: Uuid) -> Option<UserRecord> {
        self.users.read().await.get(&id).cloned()
    }
}
