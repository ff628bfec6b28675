//! Voyage AI embeddings client (OpenAI-compatible wire shape).

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::http::post_json;
use super::openai::{EmbeddingRequest, EmbeddingResponse};
use super::{DEFAULT_MODEL, EmbeddingProvider, ProviderKind};
use crate::errors::Error;

const VOYAGE_DEFAULT_MODEL: &str = "voyage-2";

fn resolve_model(model: &str) -> String {
    if model == DEFAULT_MODEL {
        VOYAGE_DEFAULT_MODEL.to_string()
    } else {
        model.to_string()
    }
}

pub struct VoyageProvider {
    agent: ureq::Agent,
    api_key: SecretString,
    endpoint: String,
    model: String,
}

impl VoyageProvider {
    pub fn new(agent: ureq::Agent, api_key: SecretString, base_url: &str, model: &str) -> Self {
        Self {
            agent,
            api_key,
            endpoint: format!("{}/v1/embeddings", base_url.trim_end_matches('/')),
            model: resolve_model(model),
        }
    }
}

impl EmbeddingProvider for VoyageProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Voyage
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, Error> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::provider(self.kind(), "empty response"))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Error> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "voyage", model = %self.model, batch = texts.len(), "Requesting embeddings");
        let request = self
            .agent
            .post(&self.endpoint)
            .set(
                "Authorization",
                &format!("Bearer {}", self.api_key.expose_secret()),
            );
        let response: EmbeddingResponse = post_json(
            self.kind(),
            request,
            &EmbeddingRequest {
                model: &self.model,
                input: texts,
            },
        )?;

        response.into_ordered(self.kind(), texts.len())
    }
}
