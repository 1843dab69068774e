mod server;

use rmcp::ServiceExt;

use dimov_core::settings;

use crate::server::CardServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the MCP transport; logs go to stderr.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let settings = settings::read_settings();
    if settings::ai_configured(&settings.ai) {
        log::info!("AI edits via {} ({})", settings.ai.provider, settings.ai.model);
    } else {
        log::warn!(
            "AI edits disabled: set API_KEY or edit {}",
            settings::settings_path().display()
        );
    }

    let service = CardServer::new(settings, settings::settings_path())
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| log::error!("MCP server error: {}", e))?;
    service.waiting().await?;
    Ok(())
}
