pub mod engine;
mod parse;
mod prompt;

use dimov_core::CardRecord;
use thiserror::Error;

pub use engine::{CompletionBackend, LlmBackend, PROVIDERS};
pub use prompt::response_schema;

/// Every way an AI update can fail. None of them leaves a partial record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateFailed {
    #[error("AI provider is not configured (missing provider, model or API key)")]
    NotConfigured,
    #[error("instruction is empty")]
    EmptyInstruction,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("model returned an empty reply")]
    EmptyReply,
    #[error("model reply is not a card object: {0}")]
    Malformed(String),
    #[error("model reply is missing keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

/// Ask the model to apply `instruction` to `current` and return the complete
/// replacement record.
///
/// The reply must carry all fourteen keys; a reply that omits any of them is
/// rejected rather than merged.
pub async fn request_update(
    backend: &dyn CompletionBackend,
    current: &CardRecord,
    instruction: &str,
) -> Result<CardRecord, UpdateFailed> {
    if instruction.trim().is_empty() {
        return Err(UpdateFailed::EmptyInstruction);
    }

    let system = prompt::system_prompt();
    let user_msg = prompt::user_message(current, instruction);
    let schema = prompt::response_schema();

    log::info!("[dimov-assist] sending edit request to {}", backend.describe());

    let raw = backend
        .complete(&system, &user_msg, &schema)
        .await
        .inspect_err(|e| log::error!("[dimov-assist] completion failed: {}", e))?;
    log::debug!("[dimov-assist] raw model output:\n{}", raw);

    let updated = parse::parse_reply(&raw)
        .inspect_err(|e| log::error!("[dimov-assist] rejected reply: {}", e))?;

    let changed: Vec<&str> = current.diff(&updated).into_iter().map(|f| f.key()).collect();
    log::info!("[dimov-assist] reply accepted, changed fields: [{}]", changed.join(", "));

    Ok(updated)
}
