use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

pub const DEFAULT_GENERATION_MODEL: &str = "llama3.2";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Boundary to the external language model: one synchronous call, prompt in,
/// raw answer text out. Errors propagate, no retry.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Completion client for an Ollama-compatible endpoint. Low temperature by
/// default, favoring reproducible answers over variation.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    endpoint: Url,
    model: String,
    temperature: f32,
    client: Client,
}

impl OllamaGenerator {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, GenerationError> {
        let endpoint = Url::parse(base_url)?.join("api/generate")?;
        Ok(Self {
            endpoint,
            model: model.into(),
            temperature,
            client: Client::new(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: self.temperature,
                },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::Backend {
                status: response.status().to_string(),
                details: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|error| GenerationError::MalformedResponse(error.to_string()))?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::{Generator, OllamaGenerator};
    use crate::error::GenerationError;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn generate_returns_the_raw_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llama3.2",
                "stream": false,
                "options": { "temperature": 0.1 }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "response": "A try is worth five points." })),
            )
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(&server.uri(), "llama3.2", 0.1).expect("valid url");
        let answer = generator.generate("What is a try?").await.expect("answer");
        assert_eq!(answer, "A try is worth five points.");
    }

    #[tokio::test]
    async fn unreachable_model_is_a_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(&server.uri(), "llama3.2", 0.1).expect("valid url");
        let result = generator.generate("prompt").await;
        assert!(matches!(result, Err(GenerationError::Backend { .. })));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
            .mount(&server)
            .await;

        let generator = OllamaGenerator::new(&server.uri(), "llama3.2", 0.1).expect("valid url");
        let result = generator.generate("prompt").await;
        assert!(matches!(result, Err(GenerationError::MalformedResponse(_))));
    }
}
