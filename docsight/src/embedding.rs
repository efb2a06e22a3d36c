//! Text embeddings for similarity search.
//!
//! [`EmbeddingProvider`] is the seam between the processing pipeline and an
//! embedding service. Two providers ship with the crate:
//!
//! - [`HashingEmbedder`]: a local, deterministic bag-of-words hashing model
//! - `OpenAiEmbeddings`: the OpenAI embeddings API (requires the `openai` feature)
//!
//! All providers embed [`prepare_text`]-normalized input.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::error::{DocsightError, Result};
use crate::security::SecureString;

/// Default OpenAI embedding model.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Default OpenAI embeddings endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";

/// Characters kept after normalization.
pub const DEFAULT_MAX_CHARS: usize = 8000;

/// An embedding vector with the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub model: String,
    /// Characters of normalized text that were embedded
    pub text_length: usize,
}

/// Produces embeddings for text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds one text. Implementations normalize with [`prepare_text`].
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Model identifier recorded alongside stored vectors.
    fn model(&self) -> &str;
}

/// Configuration for embedding generation.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: SecureString,
    pub endpoint: String,
    pub model: String,
    pub max_chars: usize,
    pub timeout: Duration,
    pub batch_size: usize,
    /// Pause between batches in [`batch_embed`]
    pub batch_delay: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: SecureString::new(""),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_chars: DEFAULT_MAX_CHARS,
            timeout: Duration::from_secs(30),
            batch_size: 10,
            batch_delay: Duration::from_secs(1),
        }
    }
}

impl EmbeddingConfig {
    pub fn new(api_key: impl Into<SecureString>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Reads `OPENAI_API_KEY`, `OPENAI_EMBEDDING_MODEL` and `EMBEDDING_BATCH_SIZE`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DocsightError::Configuration("OpenAI API key not configured".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("OPENAI_EMBEDDING_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Ok(size) = std::env::var("EMBEDDING_BATCH_SIZE") {
            config.batch_size = size.trim().parse().map_err(|_| {
                DocsightError::Configuration(format!("Invalid EMBEDDING_BATCH_SIZE: {size}"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DocsightError::Configuration("batch size must be at least 1".to_string()));
        }
        if self.max_chars == 0 {
            return Err(DocsightError::Configuration("max_chars must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Collapses whitespace runs to one space, trims and keeps the first
/// `max_chars` characters.
///
/// ```rust
/// use docsight::embedding::prepare_text;
///
/// assert_eq!(prepare_text("  two\n\n words ", 100).unwrap(), "two words");
/// assert!(prepare_text(" \t\n", 100).is_err());
/// ```
pub fn prepare_text(text: &str, max_chars: usize) -> Result<String> {
    let cleaned: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max_chars)
        .collect();

    if cleaned.is_empty() {
        return Err(DocsightError::EmptyInput(
            "Text content is empty after cleaning".to_string(),
        ));
    }
    Ok(cleaned)
}

/// Cosine similarity of two vectors; 0 when dimensions differ or either is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        dot / denominator
    }
}

/// Outcome for one input of [`batch_embed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of [`batch_embed`], ordered by input index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BatchItem>,
}

/// Embeds `texts` in chunks of `config.batch_size`, concurrently within a chunk.
///
/// A failing text is recorded in its [`BatchItem`] and does not abort the batch.
#[instrument(skip(provider, texts, config), fields(total = texts.len()))]
pub async fn batch_embed(
    provider: Arc<dyn EmbeddingProvider>,
    texts: Vec<String>,
    config: &EmbeddingConfig,
) -> Result<BatchReport> {
    config.validate()?;
    let total = texts.len();
    let mut results = Vec::with_capacity(total);

    for (chunk_index, chunk) in texts.chunks(config.batch_size).enumerate() {
        let offset = chunk_index * config.batch_size;
        let mut tasks = JoinSet::new();
        let mut indices = HashMap::with_capacity(chunk.len());
        for (i, text) in chunk.iter().enumerate() {
            let provider = Arc::clone(&provider);
            let text = text.clone();
            let handle = tasks.spawn(async move { provider.embed(&text).await });
            indices.insert(handle.id(), offset + i);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome.map_err(|err| err.to_string())),
                Err(join_err) => (join_err.id(), Err(format!("embedding task failed: {join_err}"))),
            };
            let Some(&index) = indices.get(&id) else {
                continue;
            };
            results.push(match outcome {
                Ok(embedding) => BatchItem {
                    index,
                    embedding: Some(embedding.vector),
                    error: None,
                },
                Err(error) => {
                    warn!(index, error = %error, "Embedding failed");
                    BatchItem {
                        index,
                        embedding: None,
                        error: Some(error),
                    }
                }
            });
        }

        if offset + config.batch_size < total && !config.batch_delay.is_zero() {
            tokio::time::sleep(config.batch_delay).await;
        }
    }

    results.sort_by_key(|item| item.index);
    let successful = results.iter().filter(|item| item.embedding.is_some()).count();
    debug!(total, successful, "Batch embedding finished");

    Ok(BatchReport {
        total,
        successful,
        failed: total - successful,
        results,
    })
}

/// Local embedding model: each token is hashed into one of `dimensions` buckets
/// and the counts are L2-normalized.
///
/// Texts sharing vocabulary score high under [`cosine_similarity`]. Useful
/// offline and in tests; not a semantic model.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    max_chars: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(prefix) % self.dimensions as u64) as usize
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let cleaned = prepare_text(text, self.max_chars)?;
        let mut vector = vec![0.0f32; self.dimensions];
        for token in cleaned.split(' ') {
            let token = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if !token.is_empty() {
                vector[self.bucket(&token)] += 1.0;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        Ok(Embedding {
            vector,
            model: self.model().to_string(),
            text_length: cleaned.chars().count(),
        })
    }

    fn model(&self) -> &str {
        "hashing"
    }
}

#[cfg(feature = "openai")]
pub use openai::OpenAiEmbeddings;

#[cfg(feature = "openai")]
mod openai {
    use std::sync::Arc;

    use async_trait::async_trait;
    use reqwest::Client;
    use serde::{Deserialize, Serialize};
    use tracing::{debug, instrument};

    use super::{prepare_text, Embedding, EmbeddingConfig, EmbeddingProvider};
    use crate::error::{DocsightError, Result};

    #[derive(Serialize)]
    struct EmbeddingRequest<'a> {
        input: &'a str,
        model: &'a str,
    }

    #[derive(Deserialize)]
    struct EmbeddingResponse {
        data: Vec<EmbeddingData>,
    }

    #[derive(Deserialize)]
    struct EmbeddingData {
        embedding: Vec<f32>,
    }

    /// HTTP client for the OpenAI embeddings API.
    #[derive(Clone)]
    pub struct OpenAiEmbeddings {
        config: Arc<EmbeddingConfig>,
        client: Client,
    }

    impl std::fmt::Debug for OpenAiEmbeddings {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("OpenAiEmbeddings")
                .field("endpoint", &self.config.endpoint)
                .field("model", &self.config.model)
                .field("api_key", &self.config.api_key.masked())
                .finish()
        }
    }

    impl OpenAiEmbeddings {
        pub fn new(config: EmbeddingConfig) -> Result<Self> {
            config.validate()?;
            if config.api_key.is_empty() {
                return Err(DocsightError::Configuration(
                    "OpenAI API key not configured".to_string(),
                ));
            }
            let client = Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| {
                    DocsightError::Configuration(format!("Failed to create HTTP client: {e}"))
                })?;

            Ok(Self {
                config: Arc::new(config),
                client,
            })
        }

        pub fn config(&self) -> &EmbeddingConfig {
            &self.config
        }

        async fn error_for(response: reqwest::Response) -> DocsightError {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = format!("OpenAI API error: {status} - {body}");
            if status.as_u16() == 429 || status.is_server_error() {
                DocsightError::embedding_transient(message)
            } else {
                DocsightError::embedding(message)
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for OpenAiEmbeddings {
        #[instrument(skip(self, text), fields(model = %self.config.model))]
        async fn embed(&self, text: &str) -> Result<Embedding> {
            let cleaned = prepare_text(text, self.config.max_chars)?;

            let response = self
                .client
                .post(&self.config.endpoint)
                .bearer_auth(self.config.api_key.expose())
                .json(&EmbeddingRequest {
                    input: &cleaned,
                    model: &self.config.model,
                })
                .send()
                .await
                .map_err(|e| DocsightError::embedding_transient(e.to_string()))?;

            if !response.status().is_success() {
                return Err(Self::error_for(response).await);
            }

            let body: EmbeddingResponse = response
                .json()
                .await
                .map_err(|e| DocsightError::embedding(format!("Invalid response from OpenAI embeddings API: {e}")))?;
            let vector = body
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| DocsightError::embedding("Invalid response from OpenAI embeddings API"))?;

            debug!(dimensions = vector.len(), "Generated embedding");
            Ok(Embedding {
                vector,
                model: self.config.model.clone(),
                text_length: cleaned.chars().count(),
            })
        }

        fn model(&self) -> &str {
            &self.config.model
        }
    }

}
