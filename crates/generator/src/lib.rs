//! Site generation from a free-text prompt.
//!
//! [`Generator`] frames the prompt, attaches the response schema and system
//! instruction, hands the request to a [`GenerativeBackend`] and validates the
//! returned JSON into a [`SiteContent`]. Nothing is retried: every failure is
//! reported to the caller as a [`GenerationError`].

pub mod gemini;
pub mod instruction;
pub mod presets;

use async_trait::async_trait;
use launchkit_core::{GenerationError, SiteContent};
use launchkit_validator::{parse_generation_result, site_content_schema};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub use gemini::GeminiBackend;
pub use presets::{PRESETS, Preset, find_preset};

/// One constrained generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// User contents, already framed
    pub contents: String,
    /// Response schema in the backend's dialect
    pub schema: Value,
    pub system_instruction: String,
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Return the raw JSON text produced under `request.schema`
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn GenerativeBackend>,
}

impl Generator {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// Build the request for `prompt` without sending it
    pub fn request_for(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest {
            contents: instruction::frame_prompt(prompt.trim()),
            schema: site_content_schema().to_json(),
            system_instruction: instruction::SYSTEM_INSTRUCTION.to_string(),
        }
    }

    /// Generate validated site content for `prompt`.
    ///
    /// Empty or whitespace-only prompts fail before any backend call.
    pub async fn generate(&self, prompt: &str) -> Result<SiteContent, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let request = self.request_for(prompt);
        let raw = self.backend.generate(&request).await.inspect_err(|e| {
            warn!(error = %e, "generation request failed");
        })?;

        let content = parse_generation_result(&raw).inspect_err(|e| {
            warn!(error = %e, "generation result rejected");
        })?;

        info!(title = %content.title, slug = %content.slug, "site content generated");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend returning a fixed reply and recording requests
    struct ScriptedBackend {
        reply: Result<String, GenerationError>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedBackend {
        fn new(reply: Result<String, GenerationError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerativeBackend for ScriptedBackend {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    const COFFEE: &str = r#"{
        "title": "Bean There",
        "slug": "bean-there",
        "html": "<main><h1>Bean There</h1></main>",
        "css": "h1 { font-family: serif; }",
        "tailwind": true
    }"#;

    #[tokio::test]
    async fn test_generate_success() {
        let backend = ScriptedBackend::new(Ok(COFFEE.to_string()));
        let generator = Generator::new(backend.clone());

        let content = generator.generate("Coffee shop landing page").await.unwrap();
        assert_eq!(content.title, "Bean There");
        assert!(content.tailwind_enabled);
        assert_eq!(backend.calls(), 1);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(
            seen[0].contents,
            r#"Create landing page for: "Coffee shop landing page""#
        );
        assert_eq!(seen[0].schema["type"], "OBJECT");
        assert!(seen[0].system_instruction.contains("JSON"));
    }

    #[tokio::test]
    async fn test_empty_prompt_skips_backend() {
        let backend = ScriptedBackend::new(Ok(COFFEE.to_string()));
        let generator = Generator::new(backend.clone());

        for prompt in ["", "   ", "\n\t"] {
            let err = generator.generate(prompt).await.unwrap_err();
            assert_eq!(err, GenerationError::EmptyPrompt);
        }
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces() {
        let backend = ScriptedBackend::new(Err(GenerationError::Backend(
            "HTTP 429: quota exceeded".to_string(),
        )));
        let generator = Generator::new(backend.clone());

        let err = generator.generate("Waitlist page").await.unwrap_err();
        assert!(matches!(err, GenerationError::Backend(msg) if msg.contains("429")));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_result_fails_atomically() {
        let backend = ScriptedBackend::new(Ok(r#"{"title": "Half", "html": "<p>"}"#.to_string()));
        let generator = Generator::new(backend);

        let err = generator.generate("Agency portfolio").await.unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }
}
