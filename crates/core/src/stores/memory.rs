use crate::traits::VectorGateway;
use crate::{DocumentKind, EntityId, FeatureVector, GatewayError, StoredVector};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// On-disk layout of a [`MemoryGateway`] snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<StoredVector>,
    #[serde(default)]
    pub jobs: Vec<StoredVector>,
    #[serde(default)]
    pub problems: Vec<StoredVector>,
}

impl Snapshot {
    fn rows(&self, kind: DocumentKind) -> &Vec<StoredVector> {
        match kind {
            DocumentKind::User => &self.users,
            DocumentKind::Job => &self.jobs,
            DocumentKind::Problem => &self.problems,
        }
    }

    fn rows_mut(&mut self, kind: DocumentKind) -> &mut Vec<StoredVector> {
        match kind {
            DocumentKind::User => &mut self.users,
            DocumentKind::Job => &mut self.jobs,
            DocumentKind::Problem => &mut self.problems,
        }
    }

    /// Replaces the row with the same id in place, or appends.
    fn upsert(&mut self, kind: DocumentKind, row: StoredVector) {
        let rows = self.rows_mut(kind);
        match rows.iter_mut().find(|existing| existing.id.same_as(&row.id)) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
    }
}

/// In-process gateway keeping rows in insertion order, optionally mirrored
/// to a JSON snapshot file after every write.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    rows: RwLock<Snapshot>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `path` when it exists and keeps writing back to it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if tokio::fs::try_exists(&path).await? {
            let raw = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&raw)?
        } else {
            Snapshot::default()
        };

        Ok(Self {
            rows: RwLock::new(snapshot),
            snapshot_path: Some(path),
        })
    }

    /// Writes the snapshot next to its target and renames it into place, so
    /// a failed write leaves the previous file intact.
    async fn persist(&self, snapshot: &Snapshot) -> Result<(), GatewayError> {
        if let Some(path) = &self.snapshot_path {
            let raw = serde_json::to_string_pretty(snapshot)?;
            let mut staging = path.as_os_str().to_owned();
            staging.push(".tmp");
            let staging = PathBuf::from(staging);

            tokio::fs::write(&staging, raw).await?;
            tokio::fs::rename(&staging, path).await?;
            debug!(path = %path.display(), "vector snapshot written");
        }
        Ok(())
    }
}

#[async_trait]
impl VectorGateway for MemoryGateway {
    async fn fetch_user_vector(&self, user_id: &EntityId) -> Result<Option<StoredVector>, GatewayError> {
        let rows = self.rows.read().await;
        Ok(rows
            .rows(DocumentKind::User)
            .iter()
            .find(|row| row.id.same_as(user_id))
            .cloned())
    }

    async fn fetch_all(&self, kind: DocumentKind) -> Result<Vec<StoredVector>, GatewayError> {
        Ok(self.rows.read().await.rows(kind).clone())
    }

    async fn store_vector(
        &self,
        kind: DocumentKind,
        id: &EntityId,
        vector: &FeatureVector,
    ) -> Result<(), GatewayError> {
        let mut rows = self.rows.write().await;
        let mut next = rows.clone();
        next.upsert(kind, StoredVector::new(id.clone(), vector));
        self.persist(&next).await?;
        *rows = next;
        Ok(())
    }
}
