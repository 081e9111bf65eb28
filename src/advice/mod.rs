//! Generative nutrition advice
//!
//! A single-prompt text generation service. The server talks to it only
//! through [`AdviceService`], so the Gemini client can be swapped for a stub.

pub mod gemini;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

pub use gemini::GeminiClient;

/// Text shown to the user when generation fails
pub const FALLBACK_ADVICE: &str =
    "Sorry, I couldn't generate nutrition advice at this time. Please try again later.";

/// Advice service error types
#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("AI service not configured: set {0}")]
    NotConfigured(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse Gemini response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No content in Gemini response")]
    EmptyResponse,
}

/// Prompt in, free text out
#[async_trait]
pub trait AdviceService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AdviceError>;
}

/// Stand-in used when no API key is configured
#[derive(Debug, Default, Clone)]
pub struct Unconfigured;

#[async_trait]
impl AdviceService for Unconfigured {
    async fn generate(&self, _prompt: &str) -> Result<String, AdviceError> {
        Err(AdviceError::NotConfigured(crate::config::GEMINI_API_KEY_ENV))
    }
}

/// Generate advice, replacing runtime failures with [`FALLBACK_ADVICE`].
///
/// A missing API key is returned as an error so the caller can report it.
pub async fn advise_or_fallback(service: &dyn AdviceService, prompt: &str) -> Result<String, AdviceError> {
    match service.generate(prompt).await {
        Ok(text) => Ok(text),
        Err(e @ AdviceError::NotConfigured(_)) => Err(e),
        Err(e) => {
            error!(error = %e, "Error getting nutrition advice");
            Ok(FALLBACK_ADVICE.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl AdviceService for Echo {
        async fn generate(&self, prompt: &str) -> Result<String, AdviceError> {
            Ok(format!("echo: {}", prompt))
        }
    }

    struct Failing;

    #[async_trait]
    impl AdviceService for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String, AdviceError> {
            Err(AdviceError::EmptyResponse)
        }
    }

    #[tokio::test]
    async fn test_advise_passes_text_through() {
        assert_eq!(advise_or_fallback(&Echo, "hi").await.unwrap(), "echo: hi");
    }

    #[tokio::test]
    async fn test_advise_falls_back_on_error() {
        assert_eq!(advise_or_fallback(&Failing, "hi").await.unwrap(), FALLBACK_ADVICE);
    }

    #[tokio::test]
    async fn test_advise_reports_missing_key() {
        let err = advise_or_fallback(&Unconfigured, "hi").await.unwrap_err();
        assert!(matches!(err, AdviceError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_names_the_variable() {
        let err = Unconfigured.generate("hi").await.unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
