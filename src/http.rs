//! Shared JSON-over-HTTP plumbing for the embedding and LLM providers.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Every failure is reported as [`RagError::Provider`].

use std::time::Duration;

use anyhow::Result;
use docintel_core::error::RagError;

/// Default OpenAI API root; `OPENAI_BASE_URL` overrides it.
pub const OPENAI_DEFAULT_BASE: &str = "https://api.openai.com/v1";

/// Default Ollama root for providers without an explicit `url`.
pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

pub fn client(timeout_secs: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RagError::config(format!("failed to build HTTP client: {}", e)))?;
    Ok(client)
}

/// Read `OPENAI_API_KEY`, failing with a configuration error when unset.
pub fn openai_api_key() -> Result<String> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(RagError::config("OPENAI_API_KEY environment variable not set").into()),
    }
}

pub fn openai_base_url() -> String {
    std::env::var("OPENAI_BASE_URL")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .map(|u| u.trim_end_matches('/').to_string())
        .unwrap_or_else(|| OPENAI_DEFAULT_BASE.to_string())
}

/// POST `body` to `url` and return the parsed JSON response.
///
/// `label` names the backend in error messages (e.g. `"OpenAI"`).
pub async fn post_json_with_retry(
    client: &reqwest::Client,
    url: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
    max_retries: u32,
    label: &str,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tracing::warn!(backend = label, attempt, ?delay, "retrying provider request");
            tokio::time::sleep(delay).await;
        }

        let mut request = client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response.json::<serde_json::Value>().await.map_err(|e| {
                        RagError::provider(format!("{} returned invalid JSON: {}", label, e))
                            .into()
                    });
                }

                let body_text = response.text().await.unwrap_or_default();
                let err = RagError::provider(format!(
                    "{} API error {}: {}",
                    label, status, body_text
                ));

                // Rate limited or server error, retry
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(err);
                    continue;
                }

                return Err(err.into());
            }
            Err(e) => {
                last_err = Some(RagError::provider(format!(
                    "{} connection error ({}): {}",
                    label, url, e
                )));
                continue;
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| RagError::provider(format!("{} request failed after retries", label)))
        .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docintel_core::error::{classify, ErrorKind};

    #[tokio::test]
    async fn test_connection_error_is_provider() {
        let client = client(2).unwrap();
        // Nothing listens on the discard port.
        let err = post_json_with_retry(
            &client,
            "http://127.0.0.1:9/api/embed",
            None,
            &serde_json::json!({}),
            0,
            "Test",
        )
        .await
        .unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Provider);
        assert!(err.to_string().contains("Test connection error"));
    }
}
