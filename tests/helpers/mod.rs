#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use watson::agent::{ProcessOptions, TurnAnalysis, WatsonAgent};
use watson::case::CaseFile;
use watson::config::AnalysisConfig;
use watson::investigation::contradiction::{ContradictionVerdict, JudgmentRequest};
use watson::investigation::extract::{StatementExtractor, StatementInput};
use watson::investigation::types::TrackedStatement;
use watson::oracle::{DisabledOracle, Oracle, OracleError};

/// Oracle that answers judgments from a script and summaries with a fixed reply.
///
/// When the script runs out, every further judgment gets `fallback`.
pub struct ScriptedOracle {
    verdicts: Mutex<VecDeque<ContradictionVerdict>>,
    fallback: ContradictionVerdict,
    summary: String,
    pub judgments: AtomicUsize,
    pub summaries: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(verdicts: Vec<ContradictionVerdict>) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into()),
            fallback: ContradictionVerdict::no(),
            summary: String::new(),
            judgments: AtomicUsize::new(0),
            summaries: AtomicUsize::new(0),
        }
    }

    /// Every judgment returns the same verdict.
    pub fn always(verdict: ContradictionVerdict) -> Self {
        Self {
            fallback: verdict,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn judgment_count(&self) -> usize {
        self.judgments.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn summarize(&self, _prompt: &str) -> Result<String, OracleError> {
        self.summaries.fetch_add(1, Ordering::SeqCst);
        Ok(self.summary.clone())
    }

    async fn judge_contradiction(
        &self,
        _request: &JudgmentRequest,
    ) -> Result<ContradictionVerdict, OracleError> {
        self.judgments.fetch_add(1, Ordering::SeqCst);
        let next = self.verdicts.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Oracle whose every call fails.
pub struct FailingOracle {
    pub calls: AtomicUsize,
}

impl FailingOracle {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Oracle for FailingOracle {
    async fn summarize(&self, _prompt: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(OracleError::Unavailable("connection refused".into()))
    }
}

/// Oracle that never answers in time.
pub struct SlowOracle;

#[async_trait]
impl Oracle for SlowOracle {
    async fn summarize(&self, _prompt: &str) -> Result<String, OracleError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".into())
    }
}

/// A yes-verdict in the oracle's wire shape.
pub fn verdict(kind: &str, severity: &str, confidence: f64) -> ContradictionVerdict {
    ContradictionVerdict {
        is_contradiction: true,
        contradiction_type: Some(kind.into()),
        severity: Some(severity.into()),
        explanation: Some("They place themselves in different rooms at the same time.".into()),
        implication: Some("One of them is lying about the murder window.".into()),
        suggested_questions: Some(vec!["Who else saw you there?".into()]),
        confidence: Some(confidence),
    }
}

pub fn test_settings() -> AnalysisConfig {
    AnalysisConfig {
        oracle_timeout_secs: 1,
        ..AnalysisConfig::default()
    }
}

pub fn agent_with(oracle: Arc<dyn Oracle>) -> WatsonAgent {
    WatsonAgent::new(Arc::new(CaseFile::default()), oracle, test_settings())
}

pub fn offline_agent() -> WatsonAgent {
    agent_with(Arc::new(DisabledOracle))
}

/// Process one answer with a question and no display name.
pub async fn ask(agent: &mut WatsonAgent, who: &str, question: &str, answer: &str) -> TurnAnalysis {
    agent
        .process_statement(
            who,
            "",
            answer,
            ProcessOptions {
                question: question.into(),
                pressure: None,
            },
        )
        .await
}

/// Extract a statement outside any agent.
pub fn statement(who: &str, question: &str, answer: &str) -> TrackedStatement {
    let case = CaseFile::default();
    let extractor = StatementExtractor::new(&case);
    extractor.extract(
        &StatementInput {
            character_id: who,
            character_name: case.display_name(who),
            question,
            response: answer,
        },
        None,
    )
}
