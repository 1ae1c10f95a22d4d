//! Turn orchestration and the external entry points.
//!
//! A turn runs extract → shortlist → judge → store → pattern-check → suggest →
//! summarize, strictly in that order. Oracle failures of any kind degrade to
//! "no result" and never escape [`WatsonAgent::process_statement`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::case::CaseFile;
use crate::config::AnalysisConfig;
use crate::investigation::contradiction::{interpret_verdict, JudgmentRequest};
use crate::investigation::extract::{StatementExtractor, StatementInput};
use crate::investigation::summary::{self, InvestigationSummary, SuspectSummary};
use crate::investigation::types::{
    CharacterProfile, ContradictionPattern, ConversationTurn, Mood, PlayerTheory,
    QuickEvaluation, Suggestion, TheoryEvaluation, TimelineEvent, TrackedStatement,
    WatsonContradiction,
};
use crate::investigation::{relevance, suggest, theory, InvestigationState};
use crate::oracle::{self, prompts, Oracle};

/// Optional per-turn context.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub question: String,
    /// How hard the player leaned on the suspect, `0.0..=1.0`. Recorded only.
    pub pressure: Option<f64>,
}

/// Everything one turn produced.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnAnalysis {
    /// `None` when the response was blank and nothing was recorded.
    pub statement: Option<TrackedStatement>,
    pub new_contradictions: Vec<WatsonContradiction>,
    pub observations: Vec<String>,
    pub suggestions: Vec<Suggestion>,
    pub timeline_updates: Vec<TimelineEvent>,
}

/// One investigation: state, case and oracle.
pub struct WatsonAgent {
    case: Arc<CaseFile>,
    extractor: Arc<StatementExtractor>,
    oracle: Arc<dyn Oracle>,
    settings: AnalysisConfig,
    state: InvestigationState,
}

impl WatsonAgent {
    pub fn new(case: Arc<CaseFile>, oracle: Arc<dyn Oracle>, settings: AnalysisConfig) -> Self {
        let extractor = Arc::new(StatementExtractor::new(&case));
        Self::with_extractor(case, extractor, oracle, settings)
    }

    fn with_extractor(
        case: Arc<CaseFile>,
        extractor: Arc<StatementExtractor>,
        oracle: Arc<dyn Oracle>,
        settings: AnalysisConfig,
    ) -> Self {
        Self {
            case,
            extractor,
            oracle,
            settings,
            state: InvestigationState::new(),
        }
    }

    pub fn case(&self) -> &CaseFile {
        &self.case
    }

    pub fn state(&self) -> &InvestigationState {
        &self.state
    }

    /// Run one full turn for a suspect's answer.
    pub async fn process_statement(
        &mut self,
        character_id: &str,
        character_name: &str,
        text: &str,
        options: ProcessOptions,
    ) -> TurnAnalysis {
        let character_id = character_id.trim();
        if text.trim().is_empty() || character_id.is_empty() {
            debug!(character = %character_id, "blank statement ignored");
            return TurnAnalysis::default();
        }
        let name = match character_name.trim() {
            "" => self.case.display_name(character_id).to_string(),
            n => n.to_string(),
        };

        let prev = self.state.last_statement_time(character_id);
        let stmt = self.extractor.extract(
            &StatementInput {
                character_id,
                character_name: &name,
                question: &options.question,
                response: text,
            },
            prev,
        );
        let stmt = self.state.record_statement(stmt).clone();
        debug!(
            id = %stmt.id,
            topic = %stmt.topic,
            mood = %stmt.emotional_state.primary,
            evasive = stmt.is_evasive,
            "statement extracted"
        );

        let new_contradictions = self.judge_against_history(&stmt).await;
        let observations = self.observe(&stmt, &new_contradictions).await;
        let suggestions = self.refresh_suggestions().await;
        let timeline_updates = self.state.refresh_timeline(&stmt.id);

        self.state.log_turn(ConversationTurn {
            character_id: stmt.character_id.clone(),
            question: options.question,
            response: stmt.content.clone(),
            pressure: options.pressure.map(|p| p.clamp(0.0, 1.0)),
            statement_id: stmt.id.clone(),
            timestamp: stmt.timestamp,
        });

        info!(
            character = %stmt.character_id,
            statement = %stmt.id,
            contradictions = new_contradictions.len(),
            suggestions = suggestions.len(),
            "turn processed"
        );

        TurnAnalysis {
            statement: Some(stmt),
            new_contradictions,
            observations,
            suggestions,
            timeline_updates,
        }
    }

    /// Shortlist prior statements and ask the oracle about each, sequentially.
    async fn judge_against_history(&mut self, stmt: &TrackedStatement) -> Vec<WatsonContradiction> {
        let pending: Vec<TrackedStatement> = relevance::rank_candidates(
            stmt,
            self.state.statements(),
            self.settings.candidate_threshold,
            self.settings.max_candidates,
        )
        .into_iter()
        .filter(|c| !self.state.contradiction_store().is_judged(&c.statement.id, &stmt.id))
        .take(self.settings.max_judgments_per_turn)
        .map(|c| c.statement.clone())
        .collect();

        let mut found = Vec::new();
        for prior in pending {
            // marked before dispatch so a failed call is never retried
            if !self
                .state
                .contradiction_store_mut()
                .begin_judgment(&prior.id, &stmt.id)
            {
                continue;
            }
            let request = JudgmentRequest::new(&prior, stmt);
            let verdict = oracle::with_timeout(
                self.settings.oracle_timeout(),
                self.oracle.judge_contradiction(&request),
            )
            .await;

            let verdict = match verdict {
                Ok(v) => v,
                Err(e) => {
                    debug!(error = %e, prior = %prior.id, "no judgment");
                    continue;
                }
            };
            let Some(contradiction) = interpret_verdict(verdict, &prior, stmt) else {
                continue;
            };
            if self.state.add_contradiction(contradiction.clone()) {
                found.push(contradiction);
            }
        }
        found
    }

    async fn observe(
        &self,
        stmt: &TrackedStatement,
        new_contradictions: &[WatsonContradiction],
    ) -> Vec<String> {
        let name = &stmt.character_name;
        let mut notes = Vec::new();

        if stmt.is_evasive {
            notes.push(format!("{name} is avoiding the question."));
        }
        if matches!(stmt.emotional_state.primary, Mood::Nervous | Mood::Fearful)
            && stmt.emotional_state.intensity >= 0.7
        {
            notes.push(format!("{name} seems distinctly {}.", stmt.emotional_state.primary));
        }
        if stmt.confidence < 0.5 {
            notes.push(format!("{name} does not sound sure of this."));
        }
        for c in new_contradictions {
            let other = c
                .affected_characters
                .iter()
                .find(|id| **id != stmt.character_id)
                .and_then(|id| c.name_of(id))
                .unwrap_or("another witness");
            notes.push(format!("This conflicts with what {other} told us: {}", c.explanation));
        }
        if !new_contradictions.is_empty() {
            notes.extend(
                self.state
                    .patterns()
                    .iter()
                    .filter(|p| p.suspect_characters.contains(&stmt.character_id))
                    .map(|p| p.description.clone()),
            );
        }

        let prompt = prompts::observation_prompt(stmt, new_contradictions);
        match oracle::with_timeout(self.settings.oracle_timeout(), self.oracle.summarize(&prompt)).await
        {
            Ok(text) if !text.trim().is_empty() => notes.push(text.trim().to_string()),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "no oracle observation"),
        }
        notes
    }

    async fn refresh_suggestions(&mut self) -> Vec<Suggestion> {
        let rules = suggest::rule_based(&self.state, &self.case);
        let mut extra = Vec::new();
        if self.state.statements().len() >= self.settings.oracle_suggestion_min_statements {
            let prompt = suggest::oracle_prompt(&self.state, &self.case);
            match oracle::with_timeout(self.settings.oracle_timeout(), self.oracle.summarize(&prompt))
                .await
            {
                Ok(reply) => extra = suggest::parse_oracle_suggestions(&reply, &self.case),
                Err(e) => debug!(error = %e, "no oracle suggestions"),
            }
        }
        let rules = self.state.remember_suggestions(rules);
        let extra = self.state.remember_suggestions(extra);
        suggest::merge(rules, extra, self.settings.max_suggestions)
    }

    /// Score a theory, ask the oracle for commentary, and store the result.
    pub async fn evaluate_theory(&mut self, theory: &PlayerTheory) -> TheoryEvaluation {
        let mut evaluation = theory::evaluate(theory, &self.state, &self.case);
        let prompt = prompts::theory_prompt(&evaluation);
        match oracle::with_timeout(self.settings.oracle_timeout(), self.oracle.summarize(&prompt)).await
        {
            Ok(text) if !text.trim().is_empty() => evaluation.watson_notes = text.trim().to_string(),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "theory commentary unavailable, using rule-based note"),
        }
        self.state.store_theory(evaluation.clone());
        evaluation
    }

    /// Score only; no oracle call, nothing stored.
    pub fn quick_evaluate_theory(&self, theory: &PlayerTheory) -> QuickEvaluation {
        theory::quick_evaluate(theory, &self.state, &self.case)
    }

    /// Every hint made since the last reset, highest priority first.
    pub fn get_suggestions(&self) -> Vec<Suggestion> {
        let mut all = self.state.suggestions().to_vec();
        all.sort_by_key(|s| s.priority);
        all
    }

    pub fn get_contradictions(&self) -> &[WatsonContradiction] {
        self.state.contradictions()
    }

    pub fn get_contradictions_for(&self, character_id: &str) -> Vec<&WatsonContradiction> {
        self.state
            .contradictions()
            .iter()
            .filter(|c| c.involves(character_id))
            .collect()
    }

    pub fn get_patterns(&self) -> &[ContradictionPattern] {
        self.state.patterns()
    }

    pub fn get_timeline(&self) -> &[TimelineEvent] {
        self.state.timeline()
    }

    pub fn get_profile(&self, character_id: &str) -> Option<&CharacterProfile> {
        self.state.profile(character_id)
    }

    pub fn get_suspect_summary(&self, character_id: &str) -> SuspectSummary {
        summary::suspect_summary(&self.state, &self.case, character_id)
    }

    pub fn get_investigation_summary(&self) -> InvestigationSummary {
        summary::investigation_summary(&self.state, &self.case)
    }

    pub fn get_all_statements(&self) -> &[TrackedStatement] {
        self.state.statements()
    }

    pub fn get_theory(&self, id: &str) -> Option<&TheoryEvaluation> {
        self.state.theory(id)
    }

    pub fn get_conversation(&self) -> &[ConversationTurn] {
        self.state.conversation()
    }

    pub fn reset(&mut self) {
        self.state.reset();
        info!("investigation reset");
    }
}

/// One session's agent. Each session locks on its own, so a slow turn in one
/// game never holds up another.
pub type SharedAgent = Arc<Mutex<WatsonAgent>>;

/// Maps session ids to independent agents sharing one case and oracle.
pub struct SessionRegistry {
    case: Arc<CaseFile>,
    extractor: Arc<StatementExtractor>,
    oracle: Arc<dyn Oracle>,
    settings: AnalysisConfig,
    sessions: HashMap<String, SharedAgent>,
}

pub const DEFAULT_SESSION: &str = "default";

fn session_key(session: &str) -> &str {
    match session.trim() {
        "" => DEFAULT_SESSION,
        s => s,
    }
}

impl SessionRegistry {
    pub fn new(case: Arc<CaseFile>, oracle: Arc<dyn Oracle>, settings: AnalysisConfig) -> Self {
        let extractor = Arc::new(StatementExtractor::new(&case));
        Self {
            case,
            extractor,
            oracle,
            settings,
            sessions: HashMap::new(),
        }
    }

    pub fn case(&self) -> &CaseFile {
        &self.case
    }

    /// The agent for a session, created on first use. Lock the registry only
    /// long enough to call this, then lock the returned agent for the work.
    pub fn agent(&mut self, session: &str) -> SharedAgent {
        let session = session_key(session);
        let agent = self.sessions.entry(session.to_string()).or_insert_with(|| {
            info!(session = %session, "new investigation session");
            Arc::new(Mutex::new(WatsonAgent::with_extractor(
                Arc::clone(&self.case),
                Arc::clone(&self.extractor),
                Arc::clone(&self.oracle),
                self.settings.clone(),
            )))
        });
        Arc::clone(agent)
    }

    pub fn remove(&mut self, session: &str) -> bool {
        self.sessions.remove(session_key(session)).is_some()
    }

    pub fn session_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sessions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
