use std::path::PathBuf;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use base64::Engine as _;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Deserialize;

use dimov_assist::{request_update, CompletionBackend, LlmBackend, PROVIDERS};
use dimov_core::settings::{ai_configured, apply_env, read_settings_from, write_settings_to};
use dimov_core::{AiSettings, CardField, CardRecord, Editor, Settings};
use dimov_render::{CardStyle, ExportFormat, FontSet};

/// Shown to the user for any AI failure; the cause is only logged.
pub const AI_FAILURE_NOTICE: &str = "Възникна грешка при обработката с AI. Моля опитайте отново.";
/// Shown to the user for any export failure; the cause is only logged.
pub const EXPORT_FAILURE_NOTICE: &str = "Неуспешно запазване на изображението.";

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SetFieldRequest {
    /// Field key, e.g. "phone1" or "companyNameMain". See list_fields.
    field: String,
    /// New text. Empty clears the field. No format checks are applied.
    value: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SetCardRequest {
    /// The complete card as a JSON object with all 14 string fields (see get_card).
    data: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AiEditRequest {
    /// What to change, in Bulgarian or English, e.g. "Смени телефона на Пламен с 0888000000"
    instruction: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ConfigureAiRequest {
    /// One of: google, openai, anthropic, ollama, groq, mistral, deepseek
    provider: Option<String>,
    /// Model identifier, e.g. "gemini-2.5-flash"
    model: Option<String>,
    /// API key. API_KEY or GEMINI_API_KEY in the environment still takes precedence.
    api_key: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct PreviewRequest {
    /// Width of the display area. The card scales by min(width / 2243, 1). Omit for full size.
    viewport_width: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ExportRequest {
    /// "png" or "jpeg" (also "jpg")
    format: String,
    /// Directory to write dimov-logo.<ext> into. Defaults to the configured export directory, then the current directory.
    directory: Option<String>,
}

// --- Server ---

#[derive(Clone)]
pub struct CardServer {
    editor: Arc<Editor>,
    assistant: Arc<dyn CompletionBackend>,
    settings: Arc<RwLock<Settings>>,
    settings_path: Arc<PathBuf>,
    style: Arc<CardStyle>,
    fonts: Arc<OnceLock<FontSet>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CardServer {
    /// `settings_path` is where `configure_ai` persists changes.
    pub fn new(settings: Settings, settings_path: PathBuf) -> Self {
        let assistant = Arc::new(LlmBackend::new(settings.ai.clone()));
        Self::with_backend(settings, settings_path, assistant)
    }

    pub fn with_backend(
        settings: Settings,
        settings_path: PathBuf,
        assistant: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            editor: Arc::new(Editor::default()),
            assistant,
            settings: Arc::new(RwLock::new(settings)),
            settings_path: Arc::new(settings_path),
            style: Arc::new(CardStyle::default()),
            fonts: Arc::new(OnceLock::new()),
            tool_router: Self::tool_router(),
        }
    }

    fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn ai_status_text(&self, ai: &AiSettings) -> String {
        serde_json::json!({
            "pending": self.editor.is_update_pending(),
            "configured": ai_configured(ai),
            "provider": ai.provider,
            "model": ai.model,
        })
        .to_string()
    }

    fn card_result(record: &CardRecord) -> CallToolResult {
        CallToolResult::success(vec![Content::text(record.to_json_pretty())])
    }

    #[tool(description = "Get the current business card as a JSON object with all 14 fields")]
    fn get_card(&self) -> Result<CallToolResult, McpError> {
        Ok(Self::card_result(&self.editor.snapshot()))
    }

    #[tool(description = "List the editable card fields: key and label, in display order")]
    fn list_fields(&self) -> Result<CallToolResult, McpError> {
        let text = CardField::ALL
            .iter()
            .map(|f| format!("{}: {}", f.key(), f.label()))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Set one card field to a new text value. All other fields stay unchanged. Works even while an AI edit is running, but the AI result will overwrite it when it arrives."
    )]
    fn set_field(
        &self,
        Parameters(req): Parameters<SetFieldRequest>,
    ) -> Result<CallToolResult, McpError> {
        let field: CardField = match req.field.parse() {
            Ok(f) => f,
            Err(e) => {
                let keys: Vec<&str> = CardField::ALL.iter().map(|f| f.key()).collect();
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "{}. Valid fields: {}",
                    e,
                    keys.join(", ")
                ))]));
            }
        };
        let record = self.editor.patch_field(field, req.value);
        log::debug!("field {} set manually", field);
        Ok(Self::card_result(&record))
    }

    #[tool(
        description = "Replace the whole card. The data must be a JSON object containing every one of the 14 string fields; a payload with any field missing is rejected and nothing changes."
    )]
    fn set_card(
        &self,
        Parameters(req): Parameters<SetCardRequest>,
    ) -> Result<CallToolResult, McpError> {
        match CardRecord::from_complete_json(&req.data) {
            Ok(record) => Ok(Self::card_result(&self.editor.replace_all(record))),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Card not changed: {}",
                e
            ))])),
        }
    }

    #[tool(description = "Restore the card to its initial content")]
    fn reset_card(&self) -> Result<CallToolResult, McpError> {
        Ok(Self::card_result(&self.editor.reset()))
    }

    #[tool(
        description = "Apply a natural-language change to the card using the configured AI model. The model returns the complete updated card, which replaces the current one. Only one AI edit can run at a time."
    )]
    async fn ai_edit(
        &self,
        Parameters(req): Parameters<AiEditRequest>,
    ) -> Result<CallToolResult, McpError> {
        if req.instruction.trim().is_empty() {
            return Ok(CallToolResult::error(vec![Content::text(
                "Instruction is empty.",
            )]));
        }

        let Some(pending) = self.editor.begin_update() else {
            return Ok(CallToolResult::error(vec![Content::text(
                "An AI edit is already in progress. Wait for it to finish.",
            )]));
        };

        match request_update(self.assistant.as_ref(), pending.base(), &req.instruction).await {
            Ok(updated) => {
                let changed: Vec<&str> = pending
                    .base()
                    .diff(&updated)
                    .into_iter()
                    .map(CardField::key)
                    .collect();
                let record = pending.commit(updated);
                let summary = if changed.is_empty() {
                    "No fields changed.".to_string()
                } else {
                    format!("Changed: {}", changed.join(", "))
                };
                Ok(CallToolResult::success(vec![
                    Content::text(summary),
                    Content::text(record.to_json_pretty()),
                ]))
            }
            Err(e) => {
                log::error!("AI edit failed: {}", e);
                Ok(CallToolResult::error(vec![Content::text(AI_FAILURE_NOTICE)]))
            }
        }
    }

    #[tool(description = "Report whether an AI edit is running and which model is configured")]
    fn ai_status(&self) -> Result<CallToolResult, McpError> {
        let status = self.ai_status_text(&self.settings().ai);
        Ok(CallToolResult::success(vec![Content::text(status)]))
    }

    #[tool(
        description = "Change the AI provider, model or API key. Omitted values stay as they are. The change is saved to the settings file and used by the next ai_edit."
    )]
    fn configure_ai(
        &self,
        Parameters(req): Parameters<ConfigureAiRequest>,
    ) -> Result<CallToolResult, McpError> {
        if let Some(provider) = req.provider.as_deref() {
            if !PROVIDERS.contains(&provider) {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Unknown provider '{}'. Use one of: {}",
                    provider,
                    PROVIDERS.join(", ")
                ))]));
            }
        }

        // Start from the file so an environment key is never written back.
        let mut stored = read_settings_from(&self.settings_path);
        if let Some(provider) = req.provider {
            stored.ai.provider = provider;
        }
        if let Some(model) = req.model {
            stored.ai.model = model.trim().to_string();
        }
        if let Some(api_key) = req.api_key {
            stored.ai.api_key = api_key.trim().to_string();
        }

        if let Err(e) = write_settings_to(&self.settings_path, &stored) {
            log::error!("saving {} failed: {}", self.settings_path.display(), e);
            return Ok(CallToolResult::error(vec![Content::text(format!(
                "Settings not saved: {}",
                e
            ))]));
        }

        let mut live = stored;
        apply_env(&mut live, |name| std::env::var(name).ok());
        self.assistant.reconfigure(&live.ai);
        log::info!("AI edits now via {}", self.assistant.describe());

        let status = self.ai_status_text(&live.ai);
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = live;
        Ok(CallToolResult::success(vec![Content::text(status)]))
    }

    #[tool(
        description = "Render the current card as SVG markup. With viewport_width the card is uniformly scaled to fit (never enlarged); layout and wrapping never change."
    )]
    fn preview(
        &self,
        Parameters(req): Parameters<PreviewRequest>,
    ) -> Result<CallToolResult, McpError> {
        let scale = req.viewport_width.map(dimov_render::display_scale).unwrap_or(1.0);
        let svg = dimov_render::preview_svg(&self.editor.snapshot(), &self.style, scale);
        Ok(CallToolResult::success(vec![Content::text(svg)]))
    }

    #[tool(
        description = "Export the current card as dimov-logo.png or dimov-logo.jpg at its full 2243x341 resolution on a white background. Returns the written path and the image."
    )]
    async fn export_card(
        &self,
        Parameters(req): Parameters<ExportRequest>,
    ) -> Result<CallToolResult, McpError> {
        let Some(format) = ExportFormat::parse(&req.format) else {
            return Ok(CallToolResult::error(vec![Content::text(format!(
                "Unknown format '{}'. Use png or jpeg.",
                req.format
            ))]));
        };

        let settings = self.settings();
        let dir = req
            .directory
            .map(PathBuf::from)
            .or(settings.export_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        // Exports read whatever the card holds now, even mid AI edit.
        let record = self.editor.snapshot();
        let style = Arc::clone(&self.style);
        let fonts = Arc::clone(&self.fonts);
        let font_dirs = settings.font_dirs;

        let job = tokio::task::spawn_blocking(move || {
            let fonts = fonts.get_or_init(|| FontSet::load(&font_dirs));
            let bytes = dimov_render::export(&record, &style, format, fonts)?;
            let path = dimov_render::save(&dir, format, &bytes)?;
            Ok::<_, dimov_render::ExportFailed>((path, bytes))
        })
        .await;

        match job {
            Ok(Ok((path, bytes))) => {
                log::info!("exported {}", path.display());
                let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
                Ok(CallToolResult::success(vec![
                    Content::text(path.display().to_string()),
                    Content::image(data, format.mime_type()),
                ]))
            }
            Ok(Err(e)) => {
                log::error!("export failed: {}", e);
                Ok(CallToolResult::error(vec![Content::text(EXPORT_FAILURE_NOTICE)]))
            }
            Err(e) => {
                log::error!("export task failed: {}", e);
                Ok(CallToolResult::error(vec![Content::text(EXPORT_FAILURE_NOTICE)]))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for CardServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"Dimov card editor. One business card is held in memory for this session; nothing is saved between sessions.

## Editing
- `get_card` shows the 14 text fields. `list_fields` lists their keys and labels.
- `set_field` changes exactly one field. `set_card` replaces the whole card and requires all 14 fields.
- `configure_ai` sets the provider, model or API key and saves them.
- `ai_edit` sends a free-text instruction (Bulgarian or English) to the configured model, which returns the complete card. Only one AI edit runs at a time. Manual edits made while it runs are overwritten when it finishes.

## Output
- `preview` returns SVG markup, optionally scaled for a viewport width.
- `export_card` writes dimov-logo.png or dimov-logo.jpg at full resolution."#;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dimov_assist::UpdateFailed;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Waits for `gate` (if any), then replies with `outcome`.
    struct FakeBackend {
        outcome: Result<String, UpdateFailed>,
        gate: Option<Notify>,
        calls: AtomicUsize,
        configured: Mutex<Option<AiSettings>>,
    }

    impl FakeBackend {
        fn new(outcome: Result<String, UpdateFailed>) -> Self {
            Self {
                outcome,
                gate: None,
                calls: AtomicUsize::new(0),
                configured: Mutex::new(None),
            }
        }

        fn gated(outcome: Result<String, UpdateFailed>) -> Self {
            Self {
                gate: Some(Notify::new()),
                ..Self::new(outcome)
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for FakeBackend {
        fn describe(&self) -> String {
            "fake".to_string()
        }

        async fn complete(
            &self,
            _system: &str,
            _user_msg: &str,
            _schema: &serde_json::Value,
        ) -> Result<String, UpdateFailed> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.outcome.clone()
        }

        fn reconfigure(&self, settings: &AiSettings) {
            *self.configured.lock().unwrap() = Some(settings.clone());
        }
    }

    fn reply(record: &CardRecord) -> Result<String, UpdateFailed> {
        Ok(serde_json::to_string(record).unwrap())
    }

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("dimov-mcp-{}-{}", name, std::process::id()))
    }

    fn server_at(backend: Arc<FakeBackend>, settings_path: PathBuf) -> CardServer {
        let server = CardServer::with_backend(Settings::default(), settings_path, backend);
        server.fonts.get_or_init(FontSet::empty);
        server
    }

    fn server_with(backend: Arc<FakeBackend>) -> CardServer {
        server_at(backend, scratch("unused").join("settings.json"))
    }

    fn text(result: &CallToolResult, i: usize) -> &str {
        result.content[i].as_text().map(|t| t.text.as_str()).unwrap_or("")
    }

    fn is_error(result: &CallToolResult) -> bool {
        result.is_error == Some(true)
    }

    #[test]
    fn set_field_patches_one_field() {
        let server = server_with(Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply))));
        let res = server
            .set_field(Parameters(SetFieldRequest {
                field: "email2".to_string(),
                value: "office@dimov.bg".to_string(),
            }))
            .unwrap();
        assert!(!is_error(&res));
        assert_eq!(
            server.editor.snapshot().diff(&CardRecord::default()),
            vec![CardField::Email2]
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let server = server_with(Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply))));
        let res = server
            .set_field(Parameters(SetFieldRequest {
                field: "fax".to_string(),
                value: "1".to_string(),
            }))
            .unwrap();
        assert!(is_error(&res));
        assert_eq!(server.editor.snapshot(), CardRecord::default());
    }

    #[test]
    fn incomplete_card_is_rejected_whole() {
        let server = server_with(Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply))));
        let mut value = serde_json::to_value(CardRecord::blank()).unwrap();
        value.as_object_mut().unwrap().remove("slogan");
        let res = server
            .set_card(Parameters(SetCardRequest {
                data: value.to_string(),
            }))
            .unwrap();
        assert!(is_error(&res));
        assert_eq!(server.editor.snapshot(), CardRecord::default());
    }

    #[tokio::test]
    async fn ai_edit_replaces_the_card() {
        let wanted = CardRecord::default().with_field(CardField::Phone1, "0888000000");
        let server = server_with(Arc::new(FakeBackend::new(reply(&wanted))));

        let res = server
            .ai_edit(Parameters(AiEditRequest {
                instruction: "change Plamen's phone to 0888000000".to_string(),
            }))
            .await
            .unwrap();

        assert!(!is_error(&res));
        assert_eq!(server.editor.snapshot(), wanted);
        assert!(!server.editor.is_update_pending());
    }

    #[test_log::test(tokio::test)]
    async fn transport_failure_keeps_card_and_reports_once() {
        let backend = Arc::new(FakeBackend::new(Err(UpdateFailed::Transport("timeout".into()))));
        let server = server_with(backend.clone());
        server.editor.patch_field(CardField::Slogan, "before");
        let before = server.editor.snapshot();

        let res = server
            .ai_edit(Parameters(AiEditRequest {
                instruction: "make it blue".to_string(),
            }))
            .await
            .unwrap();

        assert!(is_error(&res));
        assert_eq!(res.content.len(), 1);
        assert_eq!(text(&res, 0), AI_FAILURE_NOTICE);
        assert_eq!(server.editor.snapshot(), before);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(!server.editor.is_update_pending());
    }

    #[tokio::test]
    async fn incomplete_ai_reply_keeps_card() {
        let mut value = serde_json::to_value(CardRecord::blank()).unwrap();
        value.as_object_mut().unwrap().remove("phone3");
        let server = server_with(Arc::new(FakeBackend::new(Ok(value.to_string()))));

        let res = server
            .ai_edit(Parameters(AiEditRequest {
                instruction: "clear everything".to_string(),
            }))
            .await
            .unwrap();

        assert!(is_error(&res));
        assert_eq!(server.editor.snapshot(), CardRecord::default());
    }

    #[tokio::test]
    async fn ai_edit_is_single_flight() {
        let backend = Arc::new(FakeBackend::new(reply(&CardRecord::blank())));
        let server = server_with(backend.clone());
        let held = server.editor.begin_update().unwrap();

        let res = server
            .ai_edit(Parameters(AiEditRequest {
                instruction: "anything".to_string(),
            }))
            .await
            .unwrap();

        assert!(is_error(&res));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        drop(held);
        assert_eq!(server.editor.snapshot(), CardRecord::default());
    }

    #[tokio::test]
    async fn blank_instruction_is_not_sent() {
        let backend = Arc::new(FakeBackend::new(reply(&CardRecord::blank())));
        let server = server_with(backend.clone());
        let res = server
            .ai_edit(Parameters(AiEditRequest {
                instruction: " \n".to_string(),
            }))
            .await
            .unwrap();
        assert!(is_error(&res));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ai_result_overwrites_manual_edit_made_while_pending() {
        let from_ai = CardRecord::default().with_field(CardField::Person1, "инж. П. Димов");
        let backend = Arc::new(FakeBackend::gated(reply(&from_ai)));
        let server = server_with(backend.clone());

        let task = {
            let server = server.clone();
            tokio::spawn(async move {
                server
                    .ai_edit(Parameters(AiEditRequest {
                        instruction: "shorten Plamen's name".to_string(),
                    }))
                    .await
            })
        };
        while !server.editor.is_update_pending() {
            tokio::task::yield_now().await;
        }

        let manual = server
            .set_field(Parameters(SetFieldRequest {
                field: "slogan".to_string(),
                value: "manual".to_string(),
            }))
            .unwrap();
        assert!(!is_error(&manual));
        assert_eq!(server.editor.snapshot().slogan, "manual");

        backend.gate.as_ref().unwrap().notify_one();
        let res = task.await.unwrap().unwrap();

        assert!(!is_error(&res));
        assert_eq!(server.editor.snapshot(), from_ai);
    }

    #[test]
    fn preview_scales_to_viewport() {
        let server = server_with(Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply))));
        let svg_at = |width: Option<f64>| {
            let res = server
                .preview(Parameters(PreviewRequest {
                    viewport_width: width,
                }))
                .unwrap();
            assert!(!is_error(&res));
            text(&res, 0).to_string()
        };

        let half = svg_at(Some(1121.5));
        assert!(half.contains("width=\"1121.5\""), "{}", &half[..120]);
        assert!(half.contains("viewBox=\"0 0 2243 341\""));
        assert!(svg_at(Some(0.0)).contains("width=\"0\""));
        assert!(svg_at(Some(5000.0)).contains("width=\"2243\""));
        assert!(svg_at(None).contains("width=\"2243\""));
    }

    #[test_log::test]
    fn configure_ai_saves_and_applies() {
        let backend = Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply)));
        let dir = scratch("configure");
        let path = dir.join("settings.json");
        let server = server_at(backend.clone(), path.clone());

        let res = server
            .configure_ai(Parameters(ConfigureAiRequest {
                provider: Some("openai".to_string()),
                model: Some(" gpt-4o-mini ".to_string()),
                api_key: Some("sk-test".to_string()),
            }))
            .unwrap();
        assert!(!is_error(&res));
        assert!(!text(&res, 0).contains("sk-test"));

        let stored = read_settings_from(&path);
        assert_eq!(stored.ai.provider, "openai");
        assert_eq!(stored.ai.model, "gpt-4o-mini");
        assert_eq!(stored.ai.api_key, "sk-test");

        let applied = backend.configured.lock().unwrap().clone().unwrap();
        assert_eq!(applied.provider, "openai");
        assert_eq!(applied.model, "gpt-4o-mini");

        let status = server.ai_status().unwrap();
        assert!(text(&status, 0).contains("gpt-4o-mini"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn configure_ai_keeps_omitted_values() {
        let dir = scratch("configure-partial");
        let path = dir.join("settings.json");
        let server = server_at(Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply))), path.clone());

        let res = server
            .configure_ai(Parameters(ConfigureAiRequest {
                provider: None,
                model: Some("gemini-2.5-pro".to_string()),
                api_key: None,
            }))
            .unwrap();
        assert!(!is_error(&res));
        let stored = read_settings_from(&path);
        assert_eq!(stored.ai.provider, "google");
        assert_eq!(stored.ai.model, "gemini-2.5-pro");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn configure_ai_rejects_unknown_provider() {
        let backend = Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply)));
        let dir = scratch("configure-unknown");
        let path = dir.join("settings.json");
        let server = server_at(backend.clone(), path.clone());

        let res = server
            .configure_ai(Parameters(ConfigureAiRequest {
                provider: Some("watson".to_string()),
                model: None,
                api_key: None,
            }))
            .unwrap();
        assert!(is_error(&res));
        assert!(!path.exists());
        assert!(backend.configured.lock().unwrap().is_none());
    }

    #[test]
    fn configure_ai_save_failure_changes_nothing() {
        let backend = Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply)));
        let dir = scratch("configure-blocked");
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let server = server_at(backend.clone(), blocker.join("settings.json"));

        let res = server
            .configure_ai(Parameters(ConfigureAiRequest {
                provider: None,
                model: Some("other-model".to_string()),
                api_key: None,
            }))
            .unwrap();
        assert!(is_error(&res));
        assert!(backend.configured.lock().unwrap().is_none());
        assert!(text(&server.ai_status().unwrap(), 0).contains("gemini-2.5-flash"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn export_writes_file() {
        let server = server_with(Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply))));
        let dir = std::env::temp_dir().join(format!("dimov-mcp-export-{}", std::process::id()));

        let res = server
            .export_card(Parameters(ExportRequest {
                format: "jpeg".to_string(),
                directory: Some(dir.display().to_string()),
            }))
            .await
            .unwrap();

        assert!(!is_error(&res));
        assert_eq!(res.content.len(), 2);
        let bytes = std::fs::read(dir.join("dimov-logo.jpg")).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unknown_export_format_is_rejected() {
        let server = server_with(Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply))));
        let res = server
            .export_card(Parameters(ExportRequest {
                format: "gif".to_string(),
                directory: None,
            }))
            .await
            .unwrap();
        assert!(is_error(&res));
    }

    #[test_log::test(tokio::test)]
    async fn export_failure_reports_one_notice_and_leaves_no_file() {
        let server = server_with(Arc::new(FakeBackend::new(Err(UpdateFailed::EmptyReply))));
        let dir = scratch("export-blocked");
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let res = server
            .export_card(Parameters(ExportRequest {
                format: "png".to_string(),
                directory: Some(blocker.display().to_string()),
            }))
            .await
            .unwrap();

        assert!(is_error(&res));
        assert_eq!(res.content.len(), 1);
        assert_eq!(text(&res, 0), EXPORT_FAILURE_NOTICE);

        let left: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(left, vec!["not-a-dir".to_string()]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
