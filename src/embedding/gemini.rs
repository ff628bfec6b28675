//! Google Gemini `embedContent` client.
//!
//! Gemini has no batch endpoint here, so `embed_batch` uses the trait's
//! sequential default.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::post_json;
use super::{DEFAULT_MODEL, EmbeddingProvider, ProviderKind};
use crate::errors::Error;

const GEMINI_DEFAULT_MODEL: &str = "models/embedding-001";

fn resolve_model(model: &str) -> String {
    if model == DEFAULT_MODEL {
        GEMINI_DEFAULT_MODEL.to_string()
    } else if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

pub struct GeminiProvider {
    agent: ureq::Agent,
    api_key: SecretString,
    endpoint: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(agent: ureq::Agent, api_key: SecretString, base_url: &str, model: &str) -> Self {
        let model = resolve_model(model);
        Self {
            agent,
            api_key,
            endpoint: format!(
                "{}/v1beta/{model}:embedContent",
                base_url.trim_end_matches('/')
            ),
            model,
        }
    }
}

impl EmbeddingProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, Error> {
        debug!(provider = "gemini", model = %self.model, "Requesting embedding");
        let request = self
            .agent
            .post(&self.endpoint)
            .query("key", self.api_key.expose_secret());
        let response: EmbedContentResponse = post_json(
            self.kind(),
            request,
            &EmbedContentRequest {
                model: &self.model,
                content: Content {
                    parts: [Part { text }],
                },
            },
        )?;

        if response.embedding.values.is_empty() {
            return Err(Error::provider(self.kind(), "empty embedding in response"));
        }
        Ok(response.embedding.values)
    }
}
