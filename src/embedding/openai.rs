//! OpenAI embeddings API client.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{order_by_index, post_json};
use super::{EmbeddingProvider, ProviderKind};
use crate::errors::Error;

/// Request body shared by OpenAI-compatible embedding endpoints.
#[derive(Serialize)]
pub(super) struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
}

#[derive(Deserialize)]
pub(super) struct EmbeddingResponse {
    pub data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
pub(super) struct EmbeddingItem {
    pub index: usize,
    pub embedding: Vec<f32>,
}

impl EmbeddingResponse {
    pub(super) fn into_ordered(
        self,
        kind: ProviderKind,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, Error> {
        let items = self
            .data
            .into_iter()
            .map(|item| (item.index, item.embedding))
            .collect();
        order_by_index(kind, items, expected)
    }
}

pub struct OpenAiProvider {
    agent: ureq::Agent,
    api_key: SecretString,
    endpoint: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(agent: ureq::Agent, api_key: SecretString, base_url: &str, model: &str) -> Self {
        Self {
            agent,
            api_key,
            endpoint: format!("{}/v1/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
        }
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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

        debug!(provider = "openai", model = %self.model, batch = texts.len(), "Requesting embeddings");
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
