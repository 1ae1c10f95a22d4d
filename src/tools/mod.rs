pub mod evaluate_theory;
pub mod process_statement;
pub mod queries;

use evaluate_theory::EvaluateTheoryParams;
use process_statement::ProcessStatementParams;
use queries::{ContradictionsParams, SessionParams, StatementsParams, SuspectSummaryParams};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::agent::{ProcessOptions, SessionRegistry, SharedAgent, DEFAULT_SESSION};

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

fn session_of(session: &Option<String>) -> &str {
    session.as_deref().unwrap_or(DEFAULT_SESSION)
}

/// The Watson MCP tool handler. Holds the session registry and exposes the
/// investigation API via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct WatsonTools {
    tool_router: ToolRouter<Self>,
    registry: Arc<Mutex<SessionRegistry>>,
}

#[tool_router]
impl WatsonTools {
    pub fn new(registry: Arc<Mutex<SessionRegistry>>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            registry,
        }
    }

    /// Look up (or open) a session. The registry lock is released on return.
    async fn session(&self, session: &Option<String>) -> SharedAgent {
        self.registry.lock().await.agent(session_of(session))
    }

    /// Analyse one suspect answer.
    #[tool(description = "Record a suspect's answer and analyse it: extracted facts, new contradictions with other suspects, observations, suggested next steps and timeline updates.")]
    async fn process_statement(
        &self,
        Parameters(params): Parameters<ProcessStatementParams>,
    ) -> Result<String, String> {
        if params.character_id.trim().is_empty() {
            return Err("character_id must not be empty".into());
        }
        if let Some(p) = params.pressure {
            if !(0.0..=1.0).contains(&p) {
                return Err("pressure must be between 0.0 and 1.0".into());
            }
        }

        tracing::info!(
            character = %params.character_id,
            response_len = params.response.len(),
            session = %session_of(&params.session),
            "process_statement called"
        );

        let agent = self.session(&params.session).await;
        let analysis = agent
            .lock()
            .await
            .process_statement(
                &params.character_id,
                params.character_name.as_deref().unwrap_or(""),
                &params.response,
                ProcessOptions {
                    question: params.question.unwrap_or_default(),
                    pressure: params.pressure,
                },
            )
            .await;
        to_json(&analysis)
    }

    /// Full theory evaluation.
    #[tool(description = "Evaluate an accusation: score 0-100, grade A-F, verdict, sub-scores, strengths, weaknesses, follow-up questions and Watson's commentary. The result is stored by theory ID.")]
    async fn evaluate_theory(
        &self,
        Parameters(params): Parameters<EvaluateTheoryParams>,
    ) -> Result<String, String> {
        if params.suspect.trim().is_empty() {
            return Err("suspect must not be empty".into());
        }
        tracing::info!(suspect = %params.suspect, "evaluate_theory called");

        let theory = params.to_theory();
        let agent = self.session(&params.session).await;
        let evaluation = agent
            .lock()
            .await
            .evaluate_theory(&theory)
            .await;
        to_json(&evaluation)
    }

    #[tool(description = "Score an accusation without commentary and without storing it. Returns score, grade and verdict.")]
    async fn quick_evaluate_theory(
        &self,
        Parameters(params): Parameters<EvaluateTheoryParams>,
    ) -> Result<String, String> {
        let theory = params.to_theory();
        let agent = self.session(&params.session).await;
        let quick = agent.lock().await.quick_evaluate_theory(&theory);
        to_json(&quick)
    }

    #[tool(description = "Current investigative suggestions, highest priority first.")]
    async fn get_suggestions(
        &self,
        Parameters(params): Parameters<SessionParams>,
    ) -> Result<String, String> {
        let agent = self.session(&params.session).await;
        let suggestions = agent.lock().await.get_suggestions();
        to_json(&suggestions)
    }

    #[tool(description = "Contradictions found so far, optionally only those involving one character. Includes detected suspicion patterns.")]
    async fn get_contradictions(
        &self,
        Parameters(params): Parameters<ContradictionsParams>,
    ) -> Result<String, String> {
        let agent = self.session(&params.session).await;
        let agent = agent.lock().await;
        let contradictions = match params.character_id.as_deref() {
            Some(id) => agent.get_contradictions_for(id),
            None => agent.get_contradictions().iter().collect(),
        };
        Ok(serde_json::json!({
            "contradictions": contradictions,
            "patterns": agent.get_patterns(),
        })
        .to_string())
    }

    #[tool(description = "Reconstructed timeline of the night, with confirmed and disputed events.")]
    async fn get_timeline(
        &self,
        Parameters(params): Parameters<SessionParams>,
    ) -> Result<String, String> {
        let agent = self.session(&params.session).await;
        let agent = agent.lock().await;
        to_json(agent.get_timeline())
    }

    #[tool(description = "Everything known about one suspect: profile, recent statements, contradictions and patterns.")]
    async fn get_suspect_summary(
        &self,
        Parameters(params): Parameters<SuspectSummaryParams>,
    ) -> Result<String, String> {
        let agent = self.session(&params.session).await;
        let summary = agent
            .lock()
            .await
            .get_suspect_summary(params.character_id.trim());
        to_json(&summary)
    }

    #[tool(description = "Overall investigation totals: statements, suspects interviewed, contradictions by severity, patterns, unquestioned suspects.")]
    async fn get_investigation_summary(
        &self,
        Parameters(params): Parameters<SessionParams>,
    ) -> Result<String, String> {
        let agent = self.session(&params.session).await;
        let summary = agent.lock().await.get_investigation_summary();
        to_json(&summary)
    }

    #[tool(description = "Recorded statements with their extracted facts, oldest first.")]
    async fn get_statements(
        &self,
        Parameters(params): Parameters<StatementsParams>,
    ) -> Result<String, String> {
        let agent = self.session(&params.session).await;
        let agent = agent.lock().await;
        let mut statements: Vec<_> = agent
            .get_all_statements()
            .iter()
            .filter(|s| {
                params
                    .character_id
                    .as_deref()
                    .map_or(true, |id| s.character_id == id)
            })
            .collect();
        if let Some(limit) = params.limit {
            let skip = statements.len().saturating_sub(limit);
            statements.drain(..skip);
        }
        to_json(&statements)
    }

    #[tool(description = "Wipe the session's investigation: statements, contradictions, theories and suggestions.")]
    async fn reset_investigation(
        &self,
        Parameters(params): Parameters<SessionParams>,
    ) -> Result<String, String> {
        let session = session_of(&params.session);
        tracing::info!(session = %session, "reset_investigation called");
        let agent = self.session(&params.session).await;
        agent.lock().await.reset();
        Ok(serde_json::json!({ "status": "reset", "session": session }).to_string())
    }
}

#[tool_handler]
impl ServerHandler for WatsonTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Watson analyses a murder-mystery interrogation. Send each suspect answer to \
                 process_statement, check get_contradictions and get_suggestions for leads, and \
                 test an accusation with quick_evaluate_theory or evaluate_theory."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
