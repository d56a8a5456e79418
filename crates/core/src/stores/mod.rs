pub mod http;
pub mod memory;

pub use http::{HttpGateway, DEFAULT_GATEWAY_TIMEOUT};
pub use memory::{MemoryGateway, Snapshot};

use crate::traits::VectorGateway;
use crate::{DocumentKind, EntityId, FeatureVector, GatewayError, StoredVector};
use async_trait::async_trait;

/// Gateway backend selected from configuration.
pub enum AnyGateway {
    Memory(MemoryGateway),
    Http(HttpGateway),
}

#[async_trait]
impl VectorGateway for AnyGateway {
    async fn fetch_user_vector(&self, user_id: &EntityId) -> Result<Option<StoredVector>, GatewayError> {
        match self {
            Self::Memory(inner) => inner.fetch_user_vector(user_id).await,
            Self::Http(inner) => inner.fetch_user_vector(user_id).await,
        }
    }

    async fn fetch_all(&self, kind: DocumentKind) -> Result<Vec<StoredVector>, GatewayError> {
        match self {
            Self::Memory(inner) => inner.fetch_all(kind).await,
            Self::Http(inner) => inner.fetch_all(kind).await,
        }
    }

    async fn store_vector(
        &self,
        kind: DocumentKind,
        id: &EntityId,
        vector: &FeatureVector,
    ) -> Result<(), GatewayError> {
        match self {
            Self::Memory(inner) => inner.store_vector(kind, id, vector).await,
            Self::Http(inner) => inner.store_vector(kind, id, vector).await,
        }
    }
}
