//! MCP server initialization for the stdio transport.
//!
//! [`serve_stdio`] wires the case file, the oracle and the session registry
//! into the MCP tool handler and runs it until the client disconnects.

use crate::agent::SessionRegistry;
use crate::case::CaseFile;
use crate::config::WatsonConfig;
use crate::oracle;
use crate::tools::WatsonTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared setup: load the case and build the oracle. Returns the session
/// registry every tool call goes through.
pub fn setup_registry(config: &WatsonConfig) -> Result<Arc<Mutex<SessionRegistry>>> {
    let case = CaseFile::load_or_default(config.case.path.as_deref())?;
    tracing::info!(
        title = %case.title,
        suspects = case.characters.len(),
        "case ready"
    );

    let oracle = oracle::create_oracle(&config.oracle)?;
    let registry = SessionRegistry::new(Arc::new(case), oracle, config.analysis.clone());

    Ok(Arc::new(Mutex::new(registry)))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: WatsonConfig) -> Result<()> {
    tracing::info!("starting Watson MCP server on stdio");

    let registry = setup_registry(&config)?;

    let tools = WatsonTools::new(registry);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
