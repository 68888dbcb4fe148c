//! Vertex AI embedding provider.
//!
//! This module is only available when the `vertex` feature is enabled.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{EmbeddingFault, RagError, Result};

/// Hard upper bound on inputs per call imposed by the remote endpoint.
const MAX_INSTANCES_PER_REQUEST: usize = 20;

/// Default Vertex region.
const DEFAULT_LOCATION: &str = "us-central1";

/// Default embedding model path on Vertex.
const DEFAULT_MODEL_ID: &str = "publishers/google/models/gemini-embedding-001";

/// Default dimensionality for `gemini-embedding-001`.
const DEFAULT_DIMENSIONS: usize = 3072;

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Supplies short-lived OAuth bearer tokens for Vertex calls.
///
/// Production deployments plug in a provider backed by application-default
/// credentials; scripts and tests can use [`StaticTokenProvider`]. A failed
/// token acquisition surfaces as an auth fault and is never retried.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Return a bearer token valid for the next request.
    async fn access_token(&self) -> Result<String>;
}

/// An [`AccessTokenProvider`] that always returns one fixed token.
pub struct StaticTokenProvider(String);

impl StaticTokenProvider {
    /// Wrap an already-acquired token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// An [`EmbeddingProvider`] backed by the Vertex AI embedding endpoint.
///
/// Requests go to
/// `https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/{model}:embed`
/// with a bearer token from the injected [`AccessTokenProvider`]. Batches
/// larger than the endpoint's per-call limit are split into sub-requests,
/// order preserved.
///
/// # Example
///
/// ```rust,ignore
/// use studykit_rag::vertex::{StaticTokenProvider, VertexEmbeddingProvider};
///
/// let provider = VertexEmbeddingProvider::new(
///     "my-gcp-project",
///     Arc::new(StaticTokenProvider::new(token)),
/// )?;
/// let embedding = provider.embed("What is momentum?").await?;
/// ```
pub struct VertexEmbeddingProvider {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
    project: String,
    location: String,
    model_id: String,
    dimensions: usize,
    output_dimension: Option<usize>,
    request_timeout: Duration,
}

impl VertexEmbeddingProvider {
    /// Create a new provider for the given GCP project.
    ///
    /// Uses the default region (`us-central1`) and model
    /// (`gemini-embedding-001`).
    pub fn new(project: impl Into<String>, tokens: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        let project = project.into();
        if project.is_empty() {
            return Err(RagError::InvalidConfiguration(
                "GCP project id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            tokens,
            project,
            location: DEFAULT_LOCATION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            output_dimension: None,
            request_timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Create a new provider from the `GCP_PROJECT` and `VERTEX_LOCATION`
    /// environment variables (`VERTEX_LOCATION` defaults to `us-central1`).
    pub fn from_env(tokens: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        let project = std::env::var("GCP_PROJECT").map_err(|_| {
            RagError::InvalidConfiguration("GCP_PROJECT environment variable not set".to_string())
        })?;
        let mut provider = Self::new(project, tokens)?;
        if let Ok(location) = std::env::var("VERTEX_LOCATION") {
            provider.location = location;
        }
        Ok(provider)
    }

    /// Set the Vertex region.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the model path (e.g. `publishers/google/models/text-embedding-004`).
    pub fn with_model(mut self, model_id: impl Into<String>, dimensions: usize) -> Self {
        self.model_id = model_id.into();
        self.dimensions = dimensions;
        self
    }

    /// Ask the endpoint to truncate output vectors to this size.
    ///
    /// Also updates the value reported by
    /// [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_output_dimension(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.output_dimension = Some(dims);
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn endpoint_url(&self) -> String {
        format!(
            "https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/{model}:embed",
            location = self.location,
            project = self.project,
            model = self.model_id,
        )
    }

    fn fault(fault: EmbeddingFault, message: impl Into<String>) -> RagError {
        RagError::EmbeddingUnavailable {
            provider: "Vertex".to_string(),
            fault,
            message: message.into(),
        }
    }

    /// Embed one sub-batch, already within the per-call instance limit.
    async fn embed_group(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let token = self.tokens.access_token().await?;

        let request_body = EmbedRequest {
            instances: texts.iter().map(|text| Instance { content: *text }).collect(),
            parameters: Parameters {
                output_dimension: self.output_dimension,
            },
        };

        let response = self
            .client
            .post(self.endpoint_url())
            .bearer_auth(&token)
            .timeout(self.request_timeout)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Vertex", error = %e, "embed request failed");
                Self::fault(EmbeddingFault::Transport, format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(provider = "Vertex", %status, "embed API error");
            let fault = match status.as_u16() {
                401 | 403 => EmbeddingFault::Auth,
                429 => EmbeddingFault::RateLimited,
                _ => EmbeddingFault::Transport,
            };
            return Err(Self::fault(fault, format!("API returned {status}: {body}")));
        }

        let value: Value = response.json().await.map_err(|e| {
            error!(provider = "Vertex", error = %e, "failed to read embed response");
            Self::fault(EmbeddingFault::MalformedResponse, format!("unreadable response: {e}"))
        })?;

        let vectors = extract_vectors(&value).ok_or_else(|| {
            error!(provider = "Vertex", "unrecognized embed response shape");
            Self::fault(
                EmbeddingFault::MalformedResponse,
                "response matched no recognized prediction shape",
            )
        })?;

        if vectors.len() != texts.len() {
            return Err(Self::fault(
                EmbeddingFault::MalformedResponse,
                format!("expected {} embeddings, got {}", texts.len(), vectors.len()),
            ));
        }

        Ok(vectors)
    }
}

// ── Vertex API request types ───────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    instances: Vec<Instance<'a>>,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Instance<'a> {
    content: &'a str,
}

#[derive(Serialize)]
struct Parameters {
    #[serde(rename = "outputDimension", skip_serializing_if = "Option::is_none")]
    output_dimension: Option<usize>,
}

/// Pull embedding vectors out of the response, tolerating the shape
/// variants the endpoint is known to produce:
/// `predictions[].embeddings.values`, `predictions[].embedding`, or a
/// top-level `embeddings` array.
fn extract_vectors(value: &Value) -> Option<Vec<Vec<f32>>> {
    let candidates: Vec<Value> = if let Some(predictions) =
        value.get("predictions").and_then(Value::as_array)
    {
        predictions
            .iter()
            .map(|p| {
                p.get("embeddings")
                    .or_else(|| p.get("embedding"))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect()
    } else if let Some(embeddings) = value.get("embeddings").and_then(Value::as_array) {
        embeddings.to_vec()
    } else {
        return None;
    };

    candidates.iter().map(extract_one).collect()
}

/// A single embedding is either a bare number array or an object with a
/// `values` array.
fn extract_one(value: &Value) -> Option<Vec<f32>> {
    let array = match value {
        Value::Array(items) => items,
        Value::Object(_) => value.get("values")?.as_array()?,
        _ => return None,
    };
    array
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for VertexEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Vertex", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| {
            Self::fault(EmbeddingFault::MalformedResponse, "API returned empty response")
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "Vertex",
            batch_size = texts.len(),
            model = %self.model_id,
            "embedding batch"
        );

        let mut vectors = Vec::with_capacity(texts.len());
        for group in texts.chunks(MAX_INSTANCES_PER_REQUEST) {
            vectors.extend(self.embed_group(group).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "Vertex"
    }
}
