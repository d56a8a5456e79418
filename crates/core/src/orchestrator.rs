use crate::error::{RecommendError, Result};
use crate::ranker::Ranker;
use crate::traits::VectorGateway;
use crate::vectorizer::Vectorizer;
use crate::{
    CandidateVector, Document, DocumentKind, EntityId, FeatureVector, RecommendationOptions,
    Recommendations, RecommendationsRequest, StoredVector, VectorizeJobRequest,
    VectorizeProblemRequest, VectorizeUserRequest, VectorizedEntity, VectorizedUser,
};
use tracing::{debug, info, warn};

/// Runs normalization, vectorization and ranking for each request.
///
/// Holds no mutable state: every call builds its own document and vector.
pub struct Recommender<G, V>
where
    G: VectorGateway,
    V: Vectorizer,
{
    gateway: G,
    vectorizer: V,
    ranker: Ranker,
}

impl<G, V> Recommender<G, V>
where
    G: VectorGateway + Send + Sync,
    V: Vectorizer + Send + Sync,
{
    pub fn new(gateway: G, vectorizer: V, options: RecommendationOptions) -> Self {
        Self {
            gateway,
            vectorizer,
            ranker: Ranker::new(options.top_k, options.on_dimension_mismatch),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn vectorizer(&self) -> &V {
        &self.vectorizer
    }

    pub fn vectorize_document(&self, document: &Document) -> Result<FeatureVector> {
        let vector = self.vectorizer.vectorize(document.text())?;
        debug!(
            kind = %document.kind(),
            id = %document.id(),
            dimensions = vector.len(),
            "document vectorized"
        );
        Ok(vector)
    }

    pub fn vectorize_user(&self, request: &VectorizeUserRequest) -> Result<VectorizedUser> {
        let (Some(user_id), Some(bio), Some(profession)) = (
            present_id(&request.user_id),
            present_text(&request.bio),
            present_text(&request.profession),
        ) else {
            return Err(RecommendError::Validation(
                "User ID, bio, and profession are required.".to_string(),
            ));
        };

        let document = Document::from_fields(DocumentKind::User, user_id.clone(), &[bio, profession]);
        Ok(VectorizedUser {
            vector: self.vectorize_document(&document)?,
            user_id,
        })
    }

    pub fn vectorize_job(&self, request: &VectorizeJobRequest) -> Result<VectorizedEntity> {
        let (Some(id), Some(title), Some(description)) = (
            present_id(&request.id),
            present_text(&request.name),
            present_text(&request.description),
        ) else {
            return Err(RecommendError::Validation(
                "ID, name, and description are required.".to_string(),
            ));
        };

        let document = Document::from_fields(DocumentKind::Job, id.clone(), &[title, description]);
        Ok(VectorizedEntity {
            vector: self.vectorize_document(&document)?,
            id,
        })
    }

    pub fn vectorize_problem(&self, request: &VectorizeProblemRequest) -> Result<VectorizedEntity> {
        let (Some(id), Some(name), Some(description)) = (
            present_id(&request.id),
            present_text(&request.name),
            present_text(&request.description),
        ) else {
            return Err(RecommendError::Validation(
                "Problem ID, name, and description are required.".to_string(),
            ));
        };

        let document = Document::from_fields(DocumentKind::Problem, id.clone(), &[name, description]);
        Ok(VectorizedEntity {
            vector: self.vectorize_document(&document)?,
            id,
        })
    }

    /// Hands a computed vector to the gateway.
    pub async fn store(&self, kind: DocumentKind, id: &EntityId, vector: &FeatureVector) -> Result<()> {
        self.gateway.store_vector(kind, id, vector).await?;
        info!(kind = %kind, id = %id, dimensions = vector.len(), "vector stored");
        Ok(())
    }

    pub async fn recommendations(&self, request: &RecommendationsRequest) -> Result<Recommendations> {
        let Some(user_id) = present_id(&request.user_id) else {
            return Err(RecommendError::Validation("User ID is required.".to_string()));
        };

        let user_vector = self.user_vector(&user_id).await?;

        let (job_rows, problem_rows) = tokio::try_join!(
            self.gateway.fetch_all(DocumentKind::Job),
            self.gateway.fetch_all(DocumentKind::Problem)
        )?;

        let jobs = decode_candidates(DocumentKind::Job, job_rows);
        let problems = decode_candidates(DocumentKind::Problem, problem_rows);

        let top_job_recommendations = self.ranker.rank(&user_vector, &jobs)?;
        let top_problem_recommendations = self.ranker.rank(&user_vector, &problems)?;

        info!(
            user_id = %user_id,
            jobs = jobs.len(),
            problems = problems.len(),
            "recommendations ranked"
        );

        Ok(Recommendations {
            user_id,
            top_job_recommendations,
            top_problem_recommendations,
        })
    }

    async fn user_vector(&self, user_id: &EntityId) -> Result<FeatureVector> {
        let Some(row) = self.gateway.fetch_user_vector(user_id).await? else {
            return Err(RecommendError::UserVectorNotFound {
                user_id: user_id.clone(),
                reason: "no stored vector".to_string(),
            });
        };

        let vector = FeatureVector::decode(&row.vector).map_err(|reason| {
            RecommendError::UserVectorNotFound {
                user_id: user_id.clone(),
                reason,
            }
        })?;

        if vector.is_empty() {
            return Err(RecommendError::UserVectorNotFound {
                user_id: user_id.clone(),
                reason: "stored vector is empty".to_string(),
            });
        }

        Ok(vector)
    }
}

fn present_id(id: &Option<EntityId>) -> Option<EntityId> {
    id.as_ref().filter(|id| !id.is_blank()).cloned()
}

fn present_text(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|text| !text.is_empty())
}

/// Decodes stored rows, dropping and logging the ones that are not valid
/// vectors so one bad row cannot fail the whole request.
pub fn decode_candidates(kind: DocumentKind, rows: Vec<StoredVector>) -> Vec<CandidateVector> {
    rows.into_iter()
        .filter_map(|row| match FeatureVector::decode(&row.vector) {
            Ok(vector) => Some(CandidateVector { id: row.id, vector }),
            Err(reason) => {
                let error = RecommendError::InvalidVectorData {
                    kind,
                    id: row.id,
                    reason,
                };
                warn!(%error, "skipping stored vector");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::vectorizer::{ConfiguredVectorizer, CorpusTfIdf, TfIdfOptions};
    use crate::{MismatchPolicy, RankError, VectorizeError};
    use async_trait::async_trait;

    #[derive(Default)]
    struct FakeGateway {
        users: Vec<StoredVector>,
        jobs: Vec<StoredVector>,
        problems: Vec<StoredVector>,
        fail_fetch: bool,
    }

    #[async_trait]
    impl VectorGateway for FakeGateway {
        async fn fetch_user_vector(
            &self,
            user_id: &EntityId,
        ) -> std::result::Result<Option<StoredVector>, GatewayError> {
            Ok(self.users.iter().find(|row| &row.id == user_id).cloned())
        }

        async fn fetch_all(
            &self,
            kind: DocumentKind,
        ) -> std::result::Result<Vec<StoredVector>, GatewayError> {
            if self.fail_fetch {
                return Err(GatewayError::BackendResponse {
                    backend: "fake".to_string(),
                    details: "connection refused".to_string(),
                });
            }
            Ok(match kind {
                DocumentKind::User => self.users.clone(),
                DocumentKind::Job => self.jobs.clone(),
                DocumentKind::Problem => self.problems.clone(),
            })
        }

        async fn store_vector(
            &self,
            _kind: DocumentKind,
            _id: &EntityId,
            _vector: &FeatureVector,
        ) -> std::result::Result<(), GatewayError> {
            Ok(())
        }
    }

    fn row(id: impl Into<EntityId>, vector: &str) -> StoredVector {
        StoredVector {
            id: id.into(),
            vector: vector.to_string(),
        }
    }

    fn recommender(gateway: FakeGateway) -> Recommender<FakeGateway, ConfiguredVectorizer> {
        Recommender::new(
            gateway,
            ConfiguredVectorizer::per_document().unwrap(),
            RecommendationOptions::default(),
        )
    }

    #[test]
    fn vectorize_user_joins_bio_and_profession() {
        let recommender = recommender(FakeGateway::default());
        let request = VectorizeUserRequest {
            user_id: Some(EntityId::from("u1")),
            bio: Some("Software engineer".to_string()),
            profession: Some("developer".to_string()),
        };

        let result = recommender.vectorize_user(&request).unwrap();
        assert_eq!(result.user_id, EntityId::from("u1"));
        assert_eq!(result.vector.len(), 3);
    }

    #[test]
    fn missing_fields_fail_validation_before_vectorizing() {
        let recommender = recommender(FakeGateway::default());

        let user = VectorizeUserRequest {
            user_id: Some(EntityId::from("u1")),
            bio: None,
            profession: Some("developer".to_string()),
        };
        assert!(matches!(
            recommender.vectorize_user(&user),
            Err(RecommendError::Validation(_))
        ));

        let job = VectorizeJobRequest {
            id: Some(EntityId::from("")),
            name: Some("Welder".to_string()),
            description: Some("Pipe welding".to_string()),
        };
        assert!(matches!(
            recommender.vectorize_job(&job),
            Err(RecommendError::Validation(_))
        ));

        let problem = VectorizeProblemRequest::default();
        assert!(matches!(
            recommender.vectorize_problem(&problem),
            Err(RecommendError::Validation(_))
        ));
    }

    #[test]
    fn stopword_only_text_is_an_empty_document() {
        let recommender = recommender(FakeGateway::default());
        let problem = VectorizeProblemRequest {
            id: Some(EntityId::Number(3)),
            name: Some("The".to_string()),
            description: Some("and of 123".to_string()),
        };
        assert!(matches!(
            recommender.vectorize_problem(&problem),
            Err(RecommendError::Vectorize(VectorizeError::EmptyDocument))
        ));
    }

    #[test]
    fn identical_job_requests_give_identical_vectors() {
        let recommender = recommender(FakeGateway::default());
        let job = VectorizeJobRequest {
            id: Some(EntityId::Number(9)),
            name: Some("Data analyst".to_string()),
            description: Some("Analyse sales data and build dashboards".to_string()),
        };
        let first = recommender.vectorize_job(&job).unwrap();
        let second = recommender.vectorize_job(&job).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let recommender = recommender(FakeGateway::default());
        let request = RecommendationsRequest {
            user_id: Some(EntityId::from("missing")),
        };
        assert!(matches!(
            recommender.recommendations(&request).await,
            Err(RecommendError::UserVectorNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn undecodable_user_vector_is_not_found() {
        let recommender = recommender(FakeGateway {
            users: vec![row("u1", "[NaN, 1.0]")],
            ..FakeGateway::default()
        });
        let request = RecommendationsRequest {
            user_id: Some(EntityId::from("u1")),
        };
        assert!(matches!(
            recommender.recommendations(&request).await,
            Err(RecommendError::UserVectorNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn missing_user_id_fails_validation() {
        let recommender = recommender(FakeGateway::default());
        assert!(matches!(
            recommender
                .recommendations(&RecommendationsRequest::default())
                .await,
            Err(RecommendError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn malformed_candidates_are_skipped() {
        let recommender = recommender(FakeGateway {
            users: vec![row("u1", "[1.0, 0.0]")],
            jobs: vec![
                row(1i64, "[0.0, 1.0]"),
                row(2i64, "not json"),
                row(3i64, "[1.0, 0.0]"),
            ],
            problems: vec![row("p1", "[0.5, 0.5]"), row("p2", "[NaN, 0.5]")],
            ..FakeGateway::default()
        });
        let request = RecommendationsRequest {
            user_id: Some(EntityId::from("u1")),
        };

        let result = recommender.recommendations(&request).await.unwrap();
        assert_eq!(result.user_id, EntityId::from("u1"));
        assert_eq!(
            result.top_job_recommendations.ids(),
            vec![EntityId::Number(3), EntityId::Number(1)]
        );
        assert_eq!(result.top_problem_recommendations.ids(), vec![EntityId::from("p1")]);
    }

    #[tokio::test]
    async fn results_are_truncated_to_top_k() {
        let jobs = (0..15i64).map(|id| row(id, "[1.0, 0.0]")).collect();
        let recommender = recommender(FakeGateway {
            users: vec![row("u1", "[1.0, 0.0]")],
            jobs,
            ..FakeGateway::default()
        });
        let request = RecommendationsRequest {
            user_id: Some(EntityId::from("u1")),
        };

        let result = recommender.recommendations(&request).await.unwrap();
        assert_eq!(result.top_job_recommendations.len(), 10);
        assert_eq!(result.top_job_recommendations.ids()[0], EntityId::Number(0));
        assert!(result.top_problem_recommendations.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_surfaces_unless_skipped() {
        let gateway = || FakeGateway {
            users: vec![row("u1", "[1.0, 0.0]")],
            jobs: vec![row(1i64, "[1.0]"), row(2i64, "[1.0, 0.0]")],
            ..FakeGateway::default()
        };
        let request = RecommendationsRequest {
            user_id: Some(EntityId::from("u1")),
        };

        let strict = recommender(gateway());
        assert!(matches!(
            strict.recommendations(&request).await,
            Err(RecommendError::Rank(RankError::DimensionMismatch { .. }))
        ));

        let lenient = Recommender::new(
            gateway(),
            ConfiguredVectorizer::per_document().unwrap(),
            RecommendationOptions {
                top_k: 10,
                on_dimension_mismatch: MismatchPolicy::Skip,
            },
        );
        let result = lenient.recommendations(&request).await.unwrap();
        assert_eq!(result.top_job_recommendations.ids(), vec![EntityId::Number(2)]);
    }

    #[tokio::test]
    async fn gateway_failures_are_not_swallowed() {
        let recommender = recommender(FakeGateway {
            users: vec![row("u1", "[1.0]")],
            fail_fetch: true,
            ..FakeGateway::default()
        });
        let request = RecommendationsRequest {
            user_id: Some(EntityId::from("u1")),
        };
        assert!(matches!(
            recommender.recommendations(&request).await,
            Err(RecommendError::Gateway(_))
        ));
    }

    #[tokio::test]
    async fn corpus_mode_vectors_are_comparable() {
        let corpus = [
            "Rust backend engineer",
            "Kitchen porter washing dishes",
            "Backend developer building APIs",
        ];
        let vectorizer = ConfiguredVectorizer::corpus(
            CorpusTfIdf::fit(&corpus, TfIdfOptions::default()).unwrap(),
        );
        let embed = |text: &str| vectorizer.vectorize(text).unwrap();
        let gateway = FakeGateway {
            users: vec![StoredVector::new("u1", &embed("backend engineer with Rust"))],
            jobs: vec![
                StoredVector::new(1i64, &embed("Kitchen porter washing dishes")),
                StoredVector::new(2i64, &embed("Rust backend engineer")),
            ],
            ..FakeGateway::default()
        };
        let recommender = Recommender::new(gateway, vectorizer.clone(), RecommendationOptions::default());

        let result = recommender
            .recommendations(&RecommendationsRequest {
                user_id: Some(EntityId::from("u1")),
            })
            .await
            .unwrap();
        assert_eq!(
            result.top_job_recommendations.ids(),
            vec![EntityId::Number(2), EntityId::Number(1)]
        );
    }
}
