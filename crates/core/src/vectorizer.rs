use crate::error::VectorizeError;
use crate::models::{FeatureVector, VectorizerMode};
use crate::normalize::normalize_text;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Word pattern applied to normalized text; drops single-character tokens.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

pub trait Vectorizer {
    fn mode(&self) -> VectorizerMode;

    /// Fixed output length, when the vocabulary is shared across calls.
    fn dimensions(&self) -> Option<usize>;

    fn vectorize(&self, text: &str) -> Result<FeatureVector, VectorizeError>;
}

#[derive(Debug, Clone, Copy)]
pub struct TfIdfOptions {
    pub token_pattern: &'static str,
    pub smooth_idf: bool,
    pub sublinear_tf: bool,
    pub l2_normalize: bool,
}

impl Default for TfIdfOptions {
    fn default() -> Self {
        Self {
            token_pattern: DEFAULT_TOKEN_PATTERN,
            smooth_idf: true,
            sublinear_tf: false,
            l2_normalize: true,
        }
    }
}

#[derive(Debug, Clone)]
struct TokenAnalyzer {
    pattern: Regex,
}

impl TokenAnalyzer {
    fn new(pattern: &str) -> Result<Self, VectorizeError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Normalizes `text` and splits the result into vocabulary terms.
    fn analyze(&self, text: &str) -> Vec<String> {
        let normalized = normalize_text(text);
        self.pattern
            .find_iter(&normalized)
            .map(|found| found.as_str().to_string())
            .collect()
    }

    /// Term counts in lexicographic order.
    fn count_terms(&self, text: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for term in self.analyze(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }
}

fn inverse_document_frequency(documents: usize, document_frequency: usize, smooth: bool) -> f64 {
    let (n, df) = if smooth {
        (documents as f64 + 1.0, document_frequency as f64 + 1.0)
    } else {
        (documents as f64, document_frequency.max(1) as f64)
    };
    (n / df).ln() + 1.0
}

fn term_frequency(count: usize, sublinear: bool) -> f64 {
    if sublinear {
        1.0 + (count as f64).ln()
    } else {
        count as f64
    }
}

fn l2_normalize(weights: &mut [f64]) {
    let magnitude = weights.iter().map(|value| value * value).sum::<f64>().sqrt();
    if magnitude > 0.0 {
        for value in weights.iter_mut() {
            *value /= magnitude;
        }
    }
}

/// Fits a fresh TF-IDF model on each document it vectorizes.
///
/// Every term of a single-document fit has document frequency 1, so the IDF
/// is constant and weights are the (normalized) term counts. The vocabulary
/// is the sorted set of distinct terms of that one document; vectors from two
/// calls only line up when the documents share exactly the same terms.
#[derive(Debug, Clone)]
pub struct PerDocumentTfIdf {
    analyzer: TokenAnalyzer,
    options: TfIdfOptions,
}

impl PerDocumentTfIdf {
    pub fn new(options: TfIdfOptions) -> Result<Self, VectorizeError> {
        Ok(Self {
            analyzer: TokenAnalyzer::new(options.token_pattern)?,
            options,
        })
    }

    /// The sorted vocabulary a call on `text` would use.
    pub fn vocabulary(&self, text: &str) -> Vec<String> {
        self.analyzer.count_terms(text).into_keys().collect()
    }
}

impl Vectorizer for PerDocumentTfIdf {
    fn mode(&self) -> VectorizerMode {
        VectorizerMode::PerDocument
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    fn vectorize(&self, text: &str) -> Result<FeatureVector, VectorizeError> {
        let counts = self.analyzer.count_terms(text);
        if counts.is_empty() {
            return Err(VectorizeError::EmptyDocument);
        }

        let idf = inverse_document_frequency(1, 1, self.options.smooth_idf);
        let mut weights: Vec<f64> = counts
            .values()
            .map(|count| term_frequency(*count, self.options.sublinear_tf) * idf)
            .collect();

        if self.options.l2_normalize {
            l2_normalize(&mut weights);
        }

        Ok(FeatureVector(weights))
    }
}

/// TF-IDF model fit once over a corpus. All vectors share its vocabulary;
/// terms outside the vocabulary are ignored.
#[derive(Debug, Clone)]
pub struct CorpusTfIdf {
    analyzer: TokenAnalyzer,
    options: TfIdfOptions,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    documents: usize,
}

impl CorpusTfIdf {
    pub fn fit<S: AsRef<str>>(documents: &[S], options: TfIdfOptions) -> Result<Self, VectorizeError> {
        let analyzer = TokenAnalyzer::new(options.token_pattern)?;

        let mut document_frequency = BTreeMap::<String, usize>::new();
        for document in documents {
            for term in analyzer.count_terms(document.as_ref()).into_keys() {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(VectorizeError::EmptyCorpus);
        }

        let mut vocabulary = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (position, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(inverse_document_frequency(documents.len(), df, options.smooth_idf));
            vocabulary.insert(term, position);
        }

        Ok(Self {
            analyzer,
            options,
            vocabulary,
            idf,
            documents: documents.len(),
        })
    }

    /// Loads a corpus file and fits on it. The file is either a JSON array of
    /// strings or plain text with one document per non-empty line.
    pub fn from_file(path: &Path, options: TfIdfOptions) -> Result<Self, VectorizeError> {
        let raw = std::fs::read_to_string(path)?;
        let documents = parse_corpus(&raw)?;
        Self::fit(&documents, options)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }
}

fn parse_corpus(raw: &str) -> Result<Vec<String>, VectorizeError> {
    if raw.trim_start().starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw)
            .map_err(|error| VectorizeError::CorpusParse(error.to_string()));
    }

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

impl Vectorizer for CorpusTfIdf {
    fn mode(&self) -> VectorizerMode {
        VectorizerMode::Corpus
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.vocabulary_len())
    }

    fn vectorize(&self, text: &str) -> Result<FeatureVector, VectorizeError> {
        let counts = self.analyzer.count_terms(text);
        if counts.is_empty() {
            return Err(VectorizeError::EmptyDocument);
        }

        let mut weights = vec![0f64; self.vocabulary_len()];
        for (term, count) in counts {
            if let Some(&position) = self.vocabulary.get(&term) {
                weights[position] = term_frequency(count, self.options.sublinear_tf) * self.idf[position];
            }
        }

        if self.options.l2_normalize {
            l2_normalize(&mut weights);
        }

        Ok(FeatureVector(weights))
    }
}

/// Vectorizer chosen at start-up from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredVectorizer {
    PerDocument(PerDocumentTfIdf),
    Corpus(Arc<CorpusTfIdf>),
}

impl ConfiguredVectorizer {
    pub fn per_document() -> Result<Self, VectorizeError> {
        Ok(Self::PerDocument(PerDocumentTfIdf::new(TfIdfOptions::default())?))
    }

    pub fn corpus(model: CorpusTfIdf) -> Self {
        Self::Corpus(Arc::new(model))
    }
}

impl Vectorizer for ConfiguredVectorizer {
    fn mode(&self) -> VectorizerMode {
        match self {
            Self::PerDocument(inner) => inner.mode(),
            Self::Corpus(inner) => inner.mode(),
        }
    }

    fn dimensions(&self) -> Option<usize> {
        match self {
            Self::PerDocument(inner) => inner.dimensions(),
            Self::Corpus(inner) => inner.dimensions(),
        }
    }

    fn vectorize(&self, text: &str) -> Result<FeatureVector, VectorizeError> {
        match self {
            Self::PerDocument(inner) => inner.vectorize(text),
            Self::Corpus(inner) => inner.vectorize(text),
        }
    }
}
