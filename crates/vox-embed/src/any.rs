#[cfg(feature = "mock")]
use crate::mock::MockEmbedder;
use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAiEmbedder;

use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;

/// Generates a match over all `AnyEmbedder` variants, binding the inner provider
/// and evaluating the given closure for each arm.
macro_rules! delegate_embedder {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyEmbedder::Ollama($p) => $expr,
            AnyEmbedder::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyEmbedder::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    Ollama(OllamaEmbedder),
    OpenAi(OpenAiEmbedder),
    #[cfg(feature = "mock")]
    Mock(MockEmbedder),
}

impl EmbeddingProvider for AnyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        delegate_embedder!(self, |p| p.embed(text).await)
    }

    fn name(&self) -> &'static str {
        delegate_embedder!(self, |p| p.name())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::http::default_client;

    #[test]
    fn any_ollama_name() {
        let p = AnyEmbedder::Ollama(OllamaEmbedder::new(
            default_client(Duration::from_secs(1)).unwrap(),
            "http://localhost:11434".into(),
            "nomic-embed-text".into(),
        ));
        assert_eq!(p.name(), "ollama");
    }

    #[test]
    fn any_openai_name() {
        let p = AnyEmbedder::OpenAi(OpenAiEmbedder::new(
            default_client(Duration::from_secs(1)).unwrap(),
            "https://api.openai.com/v1".into(),
            "text-embedding-3-small".into(),
            None,
        ));
        assert_eq!(p.name(), "openai");
    }

    #[tokio::test]
    async fn any_ollama_unreachable_propagates() {
        let p = AnyEmbedder::Ollama(OllamaEmbedder::new(
            default_client(Duration::from_secs(1)).unwrap(),
            "http://127.0.0.1:1".into(),
            "m".into(),
        ));
        assert!(p.embed("x").await.is_err());
    }
}
