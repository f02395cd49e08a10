use super::Embedder;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::openai_backend::OpenAiClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Retries for transient embedding failures
const EMBED_RETRIES: usize = 2;

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl EmbeddingResponse {
    /// Vectors in input order. When the provider numbers its results, the
    /// numbers must be exactly `0..n`.
    fn into_embeddings(self) -> Result<Vec<Vec<f32>>> {
        let mut data = self.data;
        if data.iter().all(|d| d.index.is_none()) {
            return Ok(data.into_iter().map(|d| d.embedding).collect());
        }

        data.sort_by_key(|d| d.index);
        if let Some((position, bad)) = data
            .iter()
            .enumerate()
            .find(|(i, d)| d.index != Some(*i))
        {
            return Err(Error::Embedding(format!(
                "Embedding response has index {:?} at position {} of {}",
                bad.index,
                position,
                data.len()
            )));
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint
pub struct HttpEmbedder {
    client: OpenAiClient,
    model_id: String,
}

impl HttpEmbedder {
    pub fn new(config: &Config) -> Result<Self> {
        let client = OpenAiClient::new(
            &config.api_base_url,
            &config.api_key,
            config.request_timeout(),
        )?;
        Ok(Self {
            client,
            model_id: config.embedding.model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model_id,
            input: &texts,
        };
        let parsed: EmbeddingResponse = self
            .client
            .post_json("embeddings", &request, EMBED_RETRIES, Error::Embedding)
            .await?;
        parsed.into_embeddings()
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        Config {
            api_key: "sk-test".to_string(),
            api_base_url: format!("{}/v1", server.uri()),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_embed_orders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "text-embedding-ada-002",
                "input": ["first", "second"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config_for(&server)).unwrap();
        let vectors = embedder
            .embed(vec!["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_duplicate_indices_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 0, "embedding": [1.0, 0.0]},
                    {"index": 0, "embedding": [0.0, 1.0]}
                ]
            })))
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config_for(&server)).unwrap();
        let result = embedder
            .embed(vec!["first".to_string(), "second".to_string()])
            .await;

        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let response: EmbeddingResponse = serde_json::from_value(json!({
            "data": [
                {"index": 0, "embedding": [1.0]},
                {"index": 5, "embedding": [2.0]}
            ]
        }))
        .unwrap();
        assert!(matches!(response.into_embeddings(), Err(Error::Embedding(_))));

        let unnumbered: EmbeddingResponse = serde_json::from_value(json!({
            "data": [{"embedding": [1.0]}, {"embedding": [2.0]}]
        }))
        .unwrap();
        assert_eq!(unnumbered.into_embeddings().unwrap(), vec![vec![1.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn test_auth_failure_is_embedding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config_for(&server)).unwrap();
        let err = embedder.embed(vec!["x".to_string()]).await.unwrap_err();

        match err {
            Error::Embedding(msg) => assert!(msg.contains("401")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_input_skips_request() {
        let server = MockServer::start().await;
        let embedder = HttpEmbedder::new(&config_for(&server)).unwrap();
        assert!(embedder.embed(Vec::new()).await.unwrap().is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
