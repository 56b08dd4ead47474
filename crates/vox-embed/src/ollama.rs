use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, Result};
use crate::http::trim_base_url;
use crate::provider::EmbeddingProvider;

const PROVIDER: &str = "ollama";

/// Embeddings from a local Ollama daemon via `POST /api/embed`.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: String, model: String) -> Self {
        Self {
            client,
            base_url: trim_base_url(base_url),
            model,
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint();
        let body = EmbedRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbedError::transport(PROVIDER, &self.base_url, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EmbedError::transport(PROVIDER, &self.base_url, &e))?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), model = %self.model, "ollama embed failed: {text}");
            return Err(EmbedError::Rejected {
                provider: PROVIDER,
                status: status.as_u16(),
                body: text,
            });
        }

        let resp: EmbedResponse = serde_json::from_str(&text)?;
        resp.embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(EmbedError::EmptyResponse { provider: PROVIDER })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
