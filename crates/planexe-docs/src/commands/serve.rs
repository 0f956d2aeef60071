//! Preview server command.

use anyhow::Result;
use planexe_docs_server::StaticServer;

use crate::output::Output;
use crate::settings::Settings;

/// Run the serve command until Ctrl+C.
pub async fn run(settings: &Settings) -> Result<()> {
    let output = Output::new();

    let server = StaticServer::new(settings.server_config()).bind()?;
    let port = server.port();

    output.success(&format!("Serving documentation at http://127.0.0.1:{}/", port));
    output.info(&format!("Or http://localhost:{}/", port));
    output.info("Press Ctrl+C to stop the server");

    server.serve(shutdown_signal()).await?;

    output.info("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    Output::new().info("\nStopping server and releasing port...");
}
