use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    User,
    Job,
    Problem,
}

impl DocumentKind {
    /// Plural name used for storage collections and REST paths.
    pub fn collection(self) -> &'static str {
        match self {
            DocumentKind::User => "users",
            DocumentKind::Job => "jobs",
            DocumentKind::Problem => "problems",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentKind::User => "user",
            DocumentKind::Job => "job",
            DocumentKind::Problem => "problem",
        };
        f.write_str(name)
    }
}

/// Identifier of a user, job or problem. Accepted as a JSON integer or string
/// and written back in the same form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    pub fn is_blank(&self) -> bool {
        matches!(self, EntityId::Text(text) if text.is_empty())
    }

    /// Whether both ids address the same row. Numbers and numeric strings
    /// match, so `42` and `"42"` are the same id.
    pub fn same_as(&self, other: &EntityId) -> bool {
        match (self, other) {
            (EntityId::Number(left), EntityId::Number(right)) => left == right,
            (EntityId::Text(left), EntityId::Text(right)) => left == right,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(value) => write!(f, "{value}"),
            EntityId::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Text(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::Text(value)
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Number(value)
    }
}

impl FromStr for EntityId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Err("identifier must not be empty".to_string());
        }
        Ok(value
            .parse::<i64>()
            .map(EntityId::Number)
            .unwrap_or_else(|_| EntityId::Text(value.to_string())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    kind: DocumentKind,
    id: EntityId,
    text: String,
}

impl Document {
    pub fn new(kind: DocumentKind, id: EntityId, text: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            text: text.into(),
        }
    }

    /// Builds the document text by joining the fields with single spaces.
    pub fn from_fields(kind: DocumentKind, id: EntityId, fields: &[&str]) -> Self {
        Self::new(kind, id, fields.join(" "))
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Dense TF-IDF weights indexed by vocabulary position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FeatureVector(pub Vec<f64>);

impl FeatureVector {
    pub fn new(weights: Vec<f64>) -> Self {
        Self(weights)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn has_nan(&self) -> bool {
        self.0.iter().any(|value| value.is_nan())
    }

    pub fn norm(&self) -> f64 {
        self.0.iter().map(|value| value * value).sum::<f64>().sqrt()
    }

    /// Decodes a vector stored as a JSON numeric array.
    pub fn decode(text: &str) -> Result<Self, String> {
        let weights: Vec<f64> =
            serde_json::from_str(text).map_err(|error| format!("malformed vector json: {error}"))?;
        let vector = Self(weights);
        if vector.has_nan() {
            return Err("vector contains NaN".to_string());
        }
        Ok(vector)
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateVector {
    pub id: EntityId,
    pub vector: FeatureVector,
}

impl CandidateVector {
    pub fn new(id: impl Into<EntityId>, weights: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            vector: FeatureVector(weights),
        }
    }
}

/// A vector row as handed out by a gateway: the id plus the JSON text the
/// vector was stored as.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredVector {
    pub id: EntityId,
    pub vector: String,
}

impl StoredVector {
    pub fn new(id: impl Into<EntityId>, vector: &FeatureVector) -> Self {
        Self {
            id: id.into(),
            vector: vector.encode(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(EntityId, f64)", into = "(EntityId, f64)")]
pub struct ScoredCandidate {
    pub id: EntityId,
    pub score: f64,
}

impl From<(EntityId, f64)> for ScoredCandidate {
    fn from((id, score): (EntityId, f64)) -> Self {
        Self { id, score }
    }
}

impl From<ScoredCandidate> for (EntityId, f64) {
    fn from(value: ScoredCandidate) -> Self {
        (value.id, value.score)
    }
}

/// Candidates ordered by descending similarity, serialized as `[[id, score], ...]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedResult(pub Vec<ScoredCandidate>);

impl RankedResult {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.0.iter()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.0.iter().map(|hit| hit.id.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchPolicy {
    /// Abort the ranking with `DimensionMismatch`.
    #[default]
    Fail,
    /// Drop the candidate and log it.
    Skip,
}

impl FromStr for MismatchPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown mismatch policy `{other}` (expected fail or skip)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VectorizerMode {
    /// Fit a fresh model on every document. Vectors from different calls do
    /// not share a vocabulary.
    #[default]
    PerDocument,
    /// Fit once over a corpus; every vector shares that vocabulary.
    Corpus,
}

impl FromStr for VectorizerMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "per-document" | "per_document" => Ok(Self::PerDocument),
            "corpus" => Ok(Self::Corpus),
            other => Err(format!(
                "unknown vectorizer mode `{other}` (expected per-document or corpus)"
            )),
        }
    }
}

impl fmt::Display for VectorizerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorizerMode::PerDocument => f.write_str("per-document"),
            VectorizerMode::Corpus => f.write_str("corpus"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationOptions {
    pub top_k: usize,
    pub on_dimension_mismatch: MismatchPolicy,
}

impl Default for RecommendationOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            on_dimension_mismatch: MismatchPolicy::Fail,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorizeUserRequest {
    #[serde(default)]
    pub user_id: Option<EntityId>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub bio: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub profession: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorizeJobRequest {
    #[serde(default, alias = "job_id")]
    pub id: Option<EntityId>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, alias = "title")]
    pub name: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub description: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorizeProblemRequest {
    #[serde(default, alias = "problem_id")]
    pub id: Option<EntityId>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub name: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationsRequest {
    #[serde(default)]
    pub user_id: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorizedUser {
    pub user_id: EntityId,
    pub vector: FeatureVector,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorizedEntity {
    pub id: EntityId,
    pub vector: FeatureVector,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendations {
    pub user_id: EntityId,
    pub top_job_recommendations: RankedResult,
    pub top_problem_recommendations: RankedResult,
}
