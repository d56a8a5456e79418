pub mod error;
pub mod lemmatizer;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod ranker;
pub mod stores;
pub mod traits;
pub mod vectorizer;

pub use error::{GatewayError, RankError, RecommendError, VectorizeError};
pub use lemmatizer::lemmatize;
pub use models::{
    CandidateVector, Document, DocumentKind, EntityId, FeatureVector, MismatchPolicy,
    RankedResult, RecommendationOptions, Recommendations, RecommendationsRequest,
    ScoredCandidate, StoredVector, VectorizeJobRequest, VectorizeProblemRequest,
    VectorizeUserRequest, VectorizedEntity, VectorizedUser, VectorizerMode, DEFAULT_TOP_K,
};
pub use normalize::{normalize, normalize_text, ENGLISH_STOPWORDS};
pub use orchestrator::Recommender;
pub use ranker::{cosine_similarity, rank, Ranker};
pub use stores::{AnyGateway, HttpGateway, MemoryGateway, Snapshot, DEFAULT_GATEWAY_TIMEOUT};
pub use traits::VectorGateway;
pub use vectorizer::{
    ConfiguredVectorizer, CorpusTfIdf, PerDocumentTfIdf, TfIdfOptions, Vectorizer,
    DEFAULT_TOKEN_PATTERN,
};
