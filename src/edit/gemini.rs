use std::time::Duration;

use reqwest::blocking::Client as HttpClient;

use super::error::{EditError, EditResult};
use super::wire::{GenerateRequest, GenerateResponse};
use super::EditTransport;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_ERROR_BODY_CHARS: usize = 600;

/// Blocking `generateContent` transport.
pub struct GeminiTransport {
    api_base: String,
    api_key: String,
    timeout: Duration,
    http: HttpClient,
}

impl GeminiTransport {
    pub fn new(api_base: &str, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            http: HttpClient::new(),
        }
    }

    pub fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

impl std::fmt::Debug for GeminiTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiTransport")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl EditTransport for GeminiTransport {
    fn generate(&self, model: &str, request: &GenerateRequest) -> EditResult<GenerateResponse> {
        let endpoint = self.endpoint_for_model(model);
        tracing::debug!(%endpoint, "sending generateContent request");

        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.timeout)
            .json(request)
            .send()
            .map_err(|err| EditError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(EditError::Service {
                status: status.as_u16(),
                message: truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
            });
        }

        response
            .json::<GenerateResponse>()
            .map_err(|err| EditError::InvalidResponse {
                message: err.to_string(),
            })
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_prefixes_models_path_once() {
        let transport = GeminiTransport::new(
            "https://example.test/v1beta/",
            "key",
            Duration::from_secs(5),
        );
        assert_eq!(
            transport.endpoint_for_model("gemini-2.5-flash-image"),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(
            transport.endpoint_for_model("models/custom"),
            "https://example.test/v1beta/models/custom:generateContent"
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let transport =
            GeminiTransport::new(DEFAULT_API_BASE, "secret-key", Duration::from_secs(5));
        assert!(!format!("{transport:?}").contains("secret-key"));
    }

    #[test]
    fn truncate_chars_keeps_short_text_and_cuts_long_text() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }
}
