use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::{ChatMessage, StructuredOutputFormat};

use dimov_core::settings::ai_configured;
use dimov_core::AiSettings;

use crate::UpdateFailed;

/// A one-shot completion endpoint that can be constrained to a JSON schema.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short name for logs, e.g. "google (gemini-2.5-flash)".
    fn describe(&self) -> String;

    /// Send one prompt and return the reply text.
    async fn complete(
        &self,
        system: &str,
        user_msg: &str,
        schema: &serde_json::Value,
    ) -> Result<String, UpdateFailed>;

    /// Use `settings` for every later call.
    fn reconfigure(&self, _settings: &AiSettings) {}
}

/// Provider names accepted in `AiSettings::provider`.
pub const PROVIDERS: [&str; 7] = [
    "google",
    "openai",
    "anthropic",
    "ollama",
    "groq",
    "mistral",
    "deepseek",
];

fn map_backend(provider: &str) -> Result<LLMBackend, UpdateFailed> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(UpdateFailed::Transport(format!("unknown provider: {other}"))),
    }
}

/// `CompletionBackend` over the `llm` crate. A client is built per call from
/// the settings current at that moment.
#[derive(Debug)]
pub struct LlmBackend {
    settings: RwLock<AiSettings>,
}

impl LlmBackend {
    pub fn new(settings: AiSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    fn current(&self) -> AiSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn structured_output(schema: &serde_json::Value) -> Result<StructuredOutputFormat, UpdateFailed> {
    serde_json::from_value(serde_json::json!({
        "name": "card_record",
        "description": "The complete updated business card",
        "schema": schema,
        "strict": true,
    }))
    .map_err(|e| UpdateFailed::Transport(format!("build response schema: {e}")))
}

#[async_trait]
impl CompletionBackend for LlmBackend {
    fn describe(&self) -> String {
        let settings = self.current();
        format!("{} ({})", settings.provider, settings.model)
    }

    fn reconfigure(&self, settings: &AiSettings) {
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings.clone();
    }

    async fn complete(
        &self,
        system: &str,
        user_msg: &str,
        schema: &serde_json::Value,
    ) -> Result<String, UpdateFailed> {
        let settings = self.current();
        if !ai_configured(&settings) {
            return Err(UpdateFailed::NotConfigured);
        }
        let backend = map_backend(&settings.provider)?;

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&settings.model)
            .system(system)
            .schema(structured_output(schema)?);

        if !settings.api_key.is_empty() {
            builder = builder.api_key(&settings.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| UpdateFailed::Transport(format!("build LLM: {e}")))?;

        let messages = vec![ChatMessage::user().content(user_msg).build()];

        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| UpdateFailed::Transport(format!("chat: {e}")))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(UpdateFailed::EmptyReply),
        }
    }
}
