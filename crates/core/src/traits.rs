use crate::{DocumentKind, EntityId, FeatureVector, GatewayError, StoredVector};
use async_trait::async_trait;

/// Storage for computed vectors. Vectors travel as JSON text; decoding and
/// validation happen in the caller.
#[async_trait]
pub trait VectorGateway {
    async fn fetch_user_vector(&self, user_id: &EntityId) -> Result<Option<StoredVector>, GatewayError>;

    /// Every stored vector of `kind`, in storage order.
    async fn fetch_all(&self, kind: DocumentKind) -> Result<Vec<StoredVector>, GatewayError>;

    async fn store_vector(
        &self,
        kind: DocumentKind,
        id: &EntityId,
        vector: &FeatureVector,
    ) -> Result<(), GatewayError>;
}
