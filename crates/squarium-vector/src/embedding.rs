//! Embedding service trait and implementations.
//!
//! - `GeminiEmbedding` calls the Gemini `embedContent` endpoint. This is the
//!   production backend.
//! - `MockEmbedding` provides deterministic hash-based vectors for testing.
//! - `EmbeddingProvider` wraps any backend and substitutes a zero vector on
//!   failure, reporting the substitution as a degraded outcome.
//!
//! Vectors are stored alongside each problem for later use; nothing in the
//! pipeline searches them yet.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use squarium_core::error::SquariumError;
use tracing::{debug, warn};

/// Dimension of `embedding-001` vectors.
pub const DEFAULT_DIMENSIONS: usize = 768;

/// Service for generating text embeddings.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, SquariumError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// `EmbeddingService::embed` returns `impl Future`, which is not object-safe.
/// This trait boxes the future so `Arc<dyn DynEmbeddingService>` can be
/// injected without generics. Every `EmbeddingService` gets it for free.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, SquariumError>> + Send + 'a>,
    >;

    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, SquariumError>> + Send + 'a>,
    > {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// GeminiEmbedding - remote embedding model
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: [EmbedPart<'a>; 1],
}

#[derive(Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbedValues,
}

#[derive(Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

/// Gemini `embedContent` client.
pub struct GeminiEmbedding {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    dimensions: usize,
}

impl std::fmt::Debug for GeminiEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiEmbedding")
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl GeminiEmbedding {
    pub fn new(base_url: &str, model: &str, api_key: &str, dimensions: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            dimensions,
        }
    }
}

impl EmbeddingService for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SquariumError> {
        let url = format!(
            "{}/v1beta/models/{}:embedContent",
            self.base_url, self.model
        );
        let request = EmbedRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: [EmbedPart { text }],
            },
        };

        debug!(model = %self.model, text_len = text.len(), "Gemini embedding request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| SquariumError::Embedding(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SquariumError::Embedding(format!(
                "Gemini embedding error ({}): {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| SquariumError::Embedding(format!("invalid response: {}", e)))?;
        Ok(parsed.embedding.values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock embedding service returning deterministic unit vectors.
///
/// The output is derived from a hash of the input text, so identical inputs
/// always produce identical outputs.
#[derive(Debug, Clone)]
pub struct MockEmbedding {
    dimensions: usize,
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }
        result
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SquariumError> {
        if text.is_empty() {
            return Err(SquariumError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }
        Ok(self.hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ---------------------------------------------------------------------------
// EmbeddingProvider - zero-vector fallback
// ---------------------------------------------------------------------------

/// Result of embedding one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutcome {
    Embedded(Vec<f32>),
    /// The backend failed; `vector` is all zeros of the expected dimension.
    ZeroFallback { vector: Vec<f32>, reason: String },
}

impl EmbeddingOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::ZeroFallback { .. })
    }

    pub fn into_vector(self) -> Vec<f32> {
        match self {
            Self::Embedded(vector) | Self::ZeroFallback { vector, .. } => vector,
        }
    }
}

/// Embeds statements without ever failing.
#[derive(Clone)]
pub struct EmbeddingProvider {
    service: Arc<dyn DynEmbeddingService>,
}

impl EmbeddingProvider {
    pub fn new(service: Arc<dyn DynEmbeddingService>) -> Self {
        Self { service }
    }

    pub fn dimensions(&self) -> usize {
        self.service.dimensions()
    }

    /// Embed `text`, substituting a zero vector when the backend errors or
    /// returns a vector of the wrong dimension.
    pub async fn embed(&self, text: &str) -> EmbeddingOutcome {
        let dims = self.service.dimensions();
        let reason = match self.service.embed_boxed(text).await {
            Ok(vector) if vector.len() == dims => return EmbeddingOutcome::Embedded(vector),
            Ok(vector) => format!("expected {} dimensions, got {}", dims, vector.len()),
            Err(e) => e.to_string(),
        };

        warn!(reason = %reason, "Embedding failed, storing zero vector");
        EmbeddingOutcome::ZeroFallback {
            vector: vec![0.0; dims],
            reason,
        }
    }
}
