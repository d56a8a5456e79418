use crate::traits::VectorGateway;
use crate::{DocumentKind, EntityId, FeatureVector, GatewayError, StoredVector};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;
use url::Url;

/// Per-request timeout used by [`HttpGateway::new`].
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway backed by a REST vector store.
///
/// `GET {base}/{collection}/{id}` returns one row (404 when absent),
/// `GET {base}/{collection}` returns every row and
/// `PUT {base}/{collection}/{id}` upserts one. Rows are `{"id", "vector"}`
/// objects whose `vector` is a JSON-encoded array held as a string. Ids are
/// sent as single percent-encoded path segments.
pub struct HttpGateway {
    base: Url,
    client: Client,
}

impl HttpGateway {
    pub fn new(endpoint: &str) -> Result<Self, GatewayError> {
        Self::with_timeout(endpoint, DEFAULT_GATEWAY_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base = Url::parse(endpoint)?;
        if base.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }

        Ok(Self {
            base,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut target = self.base.clone();
        target
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(target)
    }

    fn collection_url(&self, kind: DocumentKind) -> Result<Url, GatewayError> {
        self.url_for(&[kind.collection()])
    }

    fn row_url(&self, kind: DocumentKind, id: &EntityId) -> Result<Url, GatewayError> {
        let segment = id.to_string();
        // dot segments are dropped by the url crate and would address the collection
        if segment == "." || segment == ".." {
            return Err(GatewayError::InvalidId(id.clone()));
        }
        self.url_for(&[kind.collection(), segment.as_str()])
    }

    fn backend_error(status: StatusCode) -> GatewayError {
        GatewayError::BackendResponse {
            backend: "http".to_string(),
            details: status.to_string(),
        }
    }
}

#[async_trait]
impl VectorGateway for HttpGateway {
    async fn fetch_user_vector(&self, user_id: &EntityId) -> Result<Option<StoredVector>, GatewayError> {
        let response = self
            .client
            .get(self.row_url(DocumentKind::User, user_id)?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::backend_error(response.status()));
        }

        Ok(Some(response.json::<StoredVector>().await?))
    }

    async fn fetch_all(&self, kind: DocumentKind) -> Result<Vec<StoredVector>, GatewayError> {
        let response = self
            .client
            .get(self.collection_url(kind)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response.status()));
        }

        Ok(response.json::<Vec<StoredVector>>().await?)
    }

    async fn store_vector(
        &self,
        kind: DocumentKind,
        id: &EntityId,
        vector: &FeatureVector,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .put(self.row_url(kind, id)?)
            .json(&json!({
                "id": id,
                "vector": vector.encode(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response.status()));
        }

        Ok(())
    }
}
