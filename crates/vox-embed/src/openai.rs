use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, Result};
use crate::http::trim_base_url;
use crate::provider::EmbeddingProvider;

const PROVIDER: &str = "openai";

/// Any server speaking the OpenAI `POST /embeddings` dialect.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OpenAiEmbedder {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        model: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: trim_base_url(base_url),
            model,
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }
}

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

impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            input: text,
            model: &self.model,
        };

        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbedError::transport(PROVIDER, &self.base_url, &e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EmbedError::transport(PROVIDER, &self.base_url, &e))?;

        if !status.is_success() {
            tracing::error!("OpenAI embedding API error {status}: {text}");
            return Err(EmbedError::Rejected {
                provider: PROVIDER,
                status: status.as_u16(),
                body: text,
            });
        }

        let resp: EmbeddingResponse = serde_json::from_str(&text)?;
        resp.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or(EmbedError::EmptyResponse { provider: PROVIDER })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::default_client;

    fn embedder(base_url: &str, key: Option<&str>) -> OpenAiEmbedder {
        OpenAiEmbedder::new(
            default_client(Duration::from_secs(5)).unwrap(),
            base_url.into(),
            "text-embedding-3-small".into(),
            key.map(str::to_owned),
        )
    }

    #[test]
    fn embedding_response_deserializes() {
        let json = r#"{"data":[{"embedding":[0.1,0.2,0.3],"index":0}]}"#;
        let resp: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].embedding, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn debug_redacts_api_key() {
        let p = embedder("http://localhost", Some("sk-secret"));
        let dbg = format!("{p:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [1.0, 0.0], "index": 0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/v1/", server.uri());
        let v = embedder(&url, Some("sk-test")).embed("q").await.unwrap();
        assert_eq!(v, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn server_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = embedder(&server.uri(), None).embed("q").await.unwrap_err();
        assert!(matches!(err, EmbedError::Rejected { status: 500, .. }));
        assert!(err.to_string().contains("boom"));
    }
}
