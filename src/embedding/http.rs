//! Blocking HTTP plumbing shared by the embedding providers.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ProviderKind;
use crate::errors::Error;

const MAX_ERROR_BODY_CHARS: usize = 300;

pub(super) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Send a JSON body and decode the JSON response, mapping every failure
/// (transport, non-2xx status, malformed body) to a provider error.
pub(super) fn post_json<T: DeserializeOwned>(
    kind: ProviderKind,
    request: ureq::Request,
    body: &impl Serialize,
) -> Result<T, Error> {
    match request.send_json(body) {
        Ok(response) => response
            .into_json::<T>()
            .map_err(|e| Error::provider(kind, format!("invalid response body: {e}"))),
        Err(ureq::Error::Status(code, response)) => {
            let detail = response.into_string().unwrap_or_default();
            Err(Error::provider(
                kind,
                format!("HTTP {code}: {}", truncate(detail.trim())),
            ))
        }
        Err(ureq::Error::Transport(transport)) => Err(Error::provider(
            kind,
            format!("request failed: {transport}"),
        )),
    }
}

/// Restore input order from `(index, vector)` pairs.
///
/// Fails unless the indices are exactly `0..expected`.
pub(super) fn order_by_index(
    kind: ProviderKind,
    mut items: Vec<(usize, Vec<f32>)>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, Error> {
    if items.len() != expected {
        return Err(Error::provider(
            kind,
            format!("expected {expected} embeddings, got {}", items.len()),
        ));
    }

    items.sort_by_key(|(index, _)| *index);
    if items.iter().enumerate().any(|(i, (index, _))| i != *index) {
        return Err(Error::provider(kind, "response indices do not match inputs"));
    }

    Ok(items.into_iter().map(|(_, vector)| vector).collect())
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_BODY_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
    out.push_str("...");
    out
}
