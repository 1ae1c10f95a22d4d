//! Investigation state and the analysis pipeline stages.
//!
//! Each stage lives in its own module and is a plain function or small struct
//! over [`InvestigationState`]; [`crate::agent::WatsonAgent`] strings them
//! together into a turn.

pub mod contradiction;
pub mod extract;
pub mod patterns;
pub mod profile;
pub mod relevance;
pub mod rules;
pub mod suggest;
pub mod summary;
pub mod theory;
pub mod timeline;
pub mod types;

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use contradiction::ContradictionStore;
use types::{
    CharacterProfile, ContradictionPattern, ConversationTurn, Suggestion, TheoryEvaluation,
    TimelineEvent, TrackedStatement, WatsonContradiction,
};

/// Everything one investigation has accumulated.
///
/// Statements are append-only. The per-character index holds positions into
/// `statements` in insertion order, so "the last five" is a slice tail.
#[derive(Debug, Default)]
pub struct InvestigationState {
    statements: Vec<TrackedStatement>,
    by_character: HashMap<String, Vec<usize>>,
    profiles: BTreeMap<String, CharacterProfile>,
    contradictions: ContradictionStore,
    theories: BTreeMap<String, TheoryEvaluation>,
    suggestions: Vec<Suggestion>,
    /// dedup key -> position in `suggestions`
    suggestion_keys: HashMap<String, usize>,
    timeline: Vec<TimelineEvent>,
    conversation: Vec<ConversationTurn>,
}

impl InvestigationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement and fold it into its speaker's profile.
    pub fn record_statement(&mut self, stmt: TrackedStatement) -> &TrackedStatement {
        let index = self.statements.len();
        let positions = self.by_character.entry(stmt.character_id.clone()).or_default();
        positions.push(index);

        let profile = self
            .profiles
            .entry(stmt.character_id.clone())
            .or_insert_with(|| {
                CharacterProfile::new(&stmt.character_id, &stmt.character_name, stmt.timestamp)
            });

        let start = positions.len().saturating_sub(profile::TREND_WINDOW + 1);
        let mut recent: Vec<&TrackedStatement> = positions[start..positions.len() - 1]
            .iter()
            .map(|&i| &self.statements[i])
            .collect();
        recent.push(&stmt);
        profile::apply_statement(profile, &stmt, &recent);

        self.statements.push(stmt);
        &self.statements[index]
    }

    pub fn statements(&self) -> &[TrackedStatement] {
        &self.statements
    }

    pub fn statement(&self, id: &str) -> Option<&TrackedStatement> {
        self.statements.iter().find(|s| s.id == id)
    }

    /// A character's statements, oldest first.
    pub fn statements_by<'a>(
        &'a self,
        character_id: &str,
    ) -> impl DoubleEndedIterator<Item = &'a TrackedStatement> + 'a {
        self.by_character
            .get(character_id)
            .map(|v| v.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |&i| &self.statements[i])
    }

    pub fn last_statement_time(&self, character_id: &str) -> Option<DateTime<Utc>> {
        self.statements_by(character_id).next_back().map(|s| s.timestamp)
    }

    pub fn profile(&self, character_id: &str) -> Option<&CharacterProfile> {
        self.profiles.get(character_id)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &CharacterProfile> {
        self.profiles.values()
    }

    /// Store a confirmed contradiction and penalise both characters' consistency.
    /// Returns `false` when the pair was already on record.
    pub fn add_contradiction(&mut self, contradiction: WatsonContradiction) -> bool {
        let severity = contradiction.severity;
        let affected = contradiction.affected_characters.clone();
        if !self.contradictions.record(contradiction) {
            return false;
        }
        for id in affected.iter() {
            if let Some(profile) = self.profiles.get_mut(id) {
                profile::apply_contradiction(profile, severity);
            }
        }
        true
    }

    pub fn contradiction_store(&self) -> &ContradictionStore {
        &self.contradictions
    }

    pub fn contradiction_store_mut(&mut self) -> &mut ContradictionStore {
        &mut self.contradictions
    }

    pub fn contradictions(&self) -> &[WatsonContradiction] {
        self.contradictions.all()
    }

    pub fn patterns(&self) -> &[ContradictionPattern] {
        self.contradictions.patterns()
    }

    pub fn store_theory(&mut self, evaluation: TheoryEvaluation) {
        self.theories.insert(evaluation.id.clone(), evaluation);
    }

    pub fn theory(&self, id: &str) -> Option<&TheoryEvaluation> {
        self.theories.get(id)
    }

    pub fn theory_count(&self) -> usize {
        self.theories.len()
    }

    /// Every distinct suggestion made this session, oldest first.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// Fold a batch of hints into the session store. A hint whose dedup key is
    /// already on record comes back as the stored copy, keeping its original id.
    pub fn remember_suggestions(&mut self, fresh: Vec<Suggestion>) -> Vec<Suggestion> {
        fresh
            .into_iter()
            .map(|s| match self.suggestion_keys.get(&s.dedup_key()) {
                Some(&i) => self.suggestions[i].clone(),
                None => {
                    self.suggestion_keys.insert(s.dedup_key(), self.suggestions.len());
                    self.suggestions.push(s.clone());
                    s
                }
            })
            .collect()
    }

    pub fn timeline(&self) -> &[TimelineEvent] {
        &self.timeline
    }

    /// Rebuild the timeline and return the events the given statement feeds.
    pub fn refresh_timeline(&mut self, statement_id: &str) -> Vec<TimelineEvent> {
        self.timeline = timeline::build_timeline(&self.statements);
        self.timeline
            .iter()
            .filter(|e| e.statement_ids.iter().any(|id| id == statement_id))
            .cloned()
            .collect()
    }

    pub fn log_turn(&mut self, turn: ConversationTurn) {
        self.conversation.push(turn);
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    /// Drop everything.
    pub fn reset(&mut self) {
        self.statements.clear();
        self.by_character.clear();
        self.profiles.clear();
        self.contradictions.clear();
        self.theories.clear();
        self.suggestions.clear();
        self.suggestion_keys.clear();
        self.timeline.clear();
        self.conversation.clear();
    }
}
