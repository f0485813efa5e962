use async_trait::async_trait;
use launchkit_core::GenerationError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{GenerationRequest, GenerativeBackend};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini `generateContent` client
///
/// No request timeout is set: a slow generation is left to finish and the
/// caller decides whether the late result is still wanted.
pub struct GeminiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    status: Option<String>,
    message: String,
}

impl GeminiBackend {
    /// Create new Gemini client
    pub fn new(api_key: &str, endpoint: &str, model: &str) -> Result<Self, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::Backend(
                "no API key configured (set LAUNCHKIT_API_KEY or generator.api_key)".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| GenerationError::Backend(format!("invalid API key: {}", e)))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

fn build_body(request: &GenerationRequest) -> GeminiRequest<'_> {
    GeminiRequest {
        system_instruction: GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: &request.system_instruction,
            }],
        },
        contents: vec![GeminiContent {
            role: Some("user"),
            parts: vec![GeminiPart {
                text: &request.contents,
            }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: &request.schema,
        },
    }
}

/// Describe a non-success response, preferring the API's own message
fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("HTTP {} ({}): {}", status, code, envelope.error.message),
            None => format!("HTTP {}: {}", status, envelope.error.message),
        },
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}

/// Pull the generated JSON text out of a successful response body
fn extract_text(body: &str) -> Result<String, GenerationError> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Backend(format!("unreadable response: {}", e)))?;

    if let Some(usage) = &response.usage_metadata {
        info!(
            prompt_tokens = ?usage.prompt_token_count,
            response_tokens = ?usage.candidates_token_count,
            "gemini usage"
        );
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Backend("no candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(GenerationError::Backend(format!(
            "empty candidate (finish reason: {})",
            reason
        )));
    }

    Ok(text)
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = self.url();
        debug!(%url, "sending generation request");

        let response = self
            .client
            .post(&url)
            .json(&build_body(request))
            .send()
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Backend(e.to_string()))?;

        debug!(%status, bytes = body.len(), "generation response received");

        if !status.is_success() {
            return Err(GenerationError::Backend(describe_failure(status, &body)));
        }

        extract_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> GenerationRequest {
        GenerationRequest {
            contents: "Create landing page for: \"x\"".to_string(),
            schema: json!({ "type": "OBJECT" }),
            system_instruction: "be good".to_string(),
        }
    }

    #[test]
    fn test_body_shape() {
        let req = request();
        let body = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be good");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 20 }
        });
        assert_eq!(extract_text(&body.to_string()).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let err = extract_text(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, GenerationError::Backend(msg) if msg.contains("no candidates")));
    }

    #[test]
    fn test_extract_text_blocked_candidate() {
        let body = json!({ "candidates": [{ "finishReason": "SAFETY" }] });
        let err = extract_text(&body.to_string()).unwrap_err();
        assert!(matches!(err, GenerationError::Backend(msg) if msg.contains("SAFETY")));
    }

    #[test]
    fn test_describe_failure_uses_api_message() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let msg = describe_failure(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert!(msg.contains("RESOURCE_EXHAUSTED"));
        assert!(msg.contains("Quota exceeded"));

        let msg = describe_failure(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(msg, "HTTP 502 Bad Gateway: upstream down");
    }

    #[test]
    fn test_new_requires_key() {
        assert!(GeminiBackend::new("  ", "https://x.test", "m").is_err());
        let backend =
            GeminiBackend::new("k", "https://x.test/v1beta/", "gemini-2.5-flash").unwrap();
        assert_eq!(
            backend.url(),
            "https://x.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
