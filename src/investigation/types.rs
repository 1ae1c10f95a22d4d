//! Core investigation record definitions.
//!
//! Defines [`TrackedStatement`] (one suspect utterance with its extracted facts),
//! [`CharacterProfile`] (rolling per-character summary), [`WatsonContradiction`]
//! and [`ContradictionPattern`] (conflict records), the theory types, and
//! [`Suggestion`] / [`TimelineEvent`] projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Implements `as_str`, `Display` and `FromStr` for a unit-only enum.
macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("unknown ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

/// What a question/answer exchange is mostly about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Whereabouts,
    Timeline,
    Relationship,
    Actions,
    Knowledge,
    Observations,
    Possessions,
    Emotions,
    Motive,
    Secrets,
    General,
}

string_enum!(Topic {
    Whereabouts => "whereabouts",
    Timeline => "timeline",
    Relationship => "relationship",
    Actions => "actions",
    Knowledge => "knowledge",
    Observations => "observations",
    Possessions => "possessions",
    Emotions => "emotions",
    Motive => "motive",
    Secrets => "secrets",
    General => "general",
});

impl Topic {
    /// Topics every investigation should eventually cover.
    pub const IMPORTANT: [Topic; 4] = [
        Topic::Whereabouts,
        Topic::Timeline,
        Topic::Observations,
        Topic::Relationship,
    ];
}

/// Kind of atomic assertion inside a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Location,
    Time,
    Action,
    Witness,
    Possession,
    Knowledge,
    Relationship,
}

string_enum!(ClaimType {
    Location => "location",
    Time => "time",
    Action => "action",
    Witness => "witness",
    Possession => "possession",
    Knowledge => "knowledge",
    Relationship => "relationship",
});

/// One atomic assertion parsed from a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    /// Who the claim is about. `"self"` unless the speaker names someone else.
    pub subject: String,
    pub predicate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    pub negated: bool,
    /// Time token mentioned in the same clause, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Claim {
    pub fn new(claim_type: ClaimType, predicate: impl Into<String>) -> Self {
        Self {
            claim_type,
            subject: "self".into(),
            predicate: predicate.into(),
            object: None,
            negated: false,
            timestamp: None,
        }
    }
}

/// Inferred affect of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Calm,
    Nervous,
    Defensive,
    Angry,
    Evasive,
    Sad,
    Fearful,
    Confident,
}

string_enum!(Mood {
    Calm => "calm",
    Nervous => "nervous",
    Defensive => "defensive",
    Angry => "angry",
    Evasive => "evasive",
    Sad => "sad",
    Fearful => "fearful",
    Confident => "confident",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub primary: Mood,
    /// Clamped to `[0.0, 1.0]`.
    pub intensity: f64,
    pub indicators: Vec<String>,
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self {
            primary: Mood::Calm,
            intensity: 0.3,
            indicators: Vec::new(),
        }
    }
}

/// Named things mentioned in a statement, by canonical label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    pub people: BTreeSet<String>,
    pub places: BTreeSet<String>,
    pub times: BTreeSet<String>,
    pub objects: BTreeSet<String>,
}

/// One suspect utterance plus everything extracted from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedStatement {
    /// UUID v7 (time-sortable).
    pub id: String,
    pub character_id: String,
    pub character_name: String,
    pub topic: Topic,
    pub content: String,
    pub player_question: String,
    pub timestamp: DateTime<Utc>,
    pub entities: Entities,
    pub claims: Vec<Claim>,
    pub emotional_state: EmotionalState,
    /// Speaker certainty in `[0.0, 1.0]`.
    pub confidence: f64,
    pub is_evasive: bool,
    pub keywords: Vec<String>,
}

impl TrackedStatement {
    /// Distinct claim types present in this statement.
    pub fn claim_types(&self) -> BTreeSet<ClaimType> {
        self.claims.iter().map(|c| c.claim_type).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmotionalTrend {
    Stable,
    IncreasinglyNervous,
    IncreasinglyDefensive,
    Erratic,
}

string_enum!(EmotionalTrend {
    Stable => "stable",
    IncreasinglyNervous => "increasingly-nervous",
    IncreasinglyDefensive => "increasingly-defensive",
    Erratic => "erratic",
});

/// A claim pinned to the statement it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyClaim {
    pub claim: Claim,
    pub statement_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Rolling per-character summary, updated on every statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    pub character_id: String,
    pub character_name: String,
    pub total_statements: usize,
    pub topics_covered: Vec<Topic>,
    pub emotional_trend: EmotionalTrend,
    /// 1.0 for a clean record; lowered by each contradiction.
    pub consistency_score: f64,
    pub cooperation_level: f64,
    pub last_interaction: DateTime<Utc>,
    pub key_claims_timeline: Vec<KeyClaim>,
}

impl CharacterProfile {
    pub fn new(character_id: &str, character_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            character_id: character_id.to_string(),
            character_name: character_name.to_string(),
            total_statements: 0,
            topics_covered: Vec::new(),
            emotional_trend: EmotionalTrend::Stable,
            consistency_score: 1.0,
            cooperation_level: 0.5,
            last_interaction: now,
            key_claims_timeline: Vec::new(),
        }
    }

    pub fn has_covered(&self, topic: Topic) -> bool {
        self.topics_covered.contains(&topic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionType {
    Direct,
    Timeline,
    Location,
    Witness,
    Behavioral,
    Logical,
}

string_enum!(ContradictionType {
    Direct => "direct",
    Timeline => "timeline",
    Location => "location",
    Witness => "witness",
    Behavioral => "behavioral",
    Logical => "logical",
});

/// Ordered from least to most serious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Significant,
    Major,
    Critical,
}

string_enum!(Severity {
    Minor => "minor",
    Significant => "significant",
    Major => "major",
    Critical => "critical",
});

/// A confirmed conflict between two statements from different characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatsonContradiction {
    pub id: String,
    #[serde(rename = "type")]
    pub contradiction_type: ContradictionType,
    pub severity: Severity,
    pub statement1: TrackedStatement,
    pub statement2: TrackedStatement,
    pub explanation: String,
    pub implication: String,
    pub suggested_questions: Vec<String>,
    pub affected_characters: [String; 2],
    pub discovered_at: DateTime<Utc>,
    pub confidence: f64,
}

impl WatsonContradiction {
    pub fn involves(&self, character_id: &str) -> bool {
        self.affected_characters.iter().any(|c| c == character_id)
    }

    /// Display name for one of the affected characters.
    pub fn name_of(&self, character_id: &str) -> Option<&str> {
        [&self.statement1, &self.statement2]
            .into_iter()
            .find(|s| s.character_id == character_id)
            .map(|s| s.character_name.as_str())
    }
}

/// Aggregate suspicion signal derived from several contradictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContradictionPattern {
    /// Stable per pattern kind, e.g. `pattern-victoria-multiple`.
    pub id: String,
    pub name: String,
    pub description: String,
    pub involved_statements: Vec<String>,
    pub suspect_characters: Vec<String>,
    pub likelihood: f64,
}

/// A player's accusation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerTheory {
    /// Generated when absent.
    pub id: Option<String>,
    pub suspect: String,
    pub motive: String,
    pub opportunity: String,
    pub method: Option<String>,
    /// Statement IDs offered as evidence.
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 85.0 => Self::A,
            s if s >= 70.0 => Self::B,
            s if s >= 55.0 => Self::C,
            s if s >= 40.0 => Self::D,
            _ => Self::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TheoryVerdict {
    Compelling,
    Plausible,
    Weak,
    Flawed,
    Dismissed,
}

string_enum!(TheoryVerdict {
    Compelling => "compelling",
    Plausible => "plausible",
    Weak => "weak",
    Flawed => "flawed",
    Dismissed => "dismissed",
});

impl TheoryVerdict {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Self::Compelling,
            s if s >= 60.0 => Self::Plausible,
            s if s >= 40.0 => Self::Weak,
            s if s >= 20.0 => Self::Flawed,
            _ => Self::Dismissed,
        }
    }
}

/// The five independently computed sub-scores of a theory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheoryAnalysis {
    pub motive_strength: f64,
    pub opportunity_strength: f64,
    pub evidence_strength: f64,
    pub consistency_score: f64,
    pub contradiction_impact: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheoryEvaluation {
    pub id: String,
    pub theory: PlayerTheory,
    /// In `[0, 100]`.
    pub score: f64,
    pub grade: Grade,
    pub verdict: TheoryVerdict,
    pub analysis: TheoryAnalysis,
    pub supporting_evidence: Vec<String>,
    pub weaknesses: Vec<String>,
    pub strengths: Vec<String>,
    pub follow_up_questions: Vec<String>,
    pub watson_notes: String,
}

/// Synchronous score-only evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuickEvaluation {
    pub score: f64,
    pub grade: Grade,
    pub verdict: TheoryVerdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionType {
    Question,
    Confront,
    Investigate,
    CrossReference,
}

string_enum!(SuggestionType {
    Question => "question",
    Confront => "confront",
    Investigate => "investigate",
    CrossReference => "cross-reference",
});

/// `High` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

string_enum!(Priority {
    High => "high",
    Medium => "medium",
    Low => "low",
});

/// An investigative hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub priority: Priority,
    pub text: String,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_character: Option<String>,
}

impl Suggestion {
    /// Dedup key: type + target + first 30 characters of the text.
    pub fn dedup_key(&self) -> String {
        let prefix: String = self.text.chars().take(30).collect::<String>().to_lowercase();
        format!(
            "{}|{}|{}",
            self.suggestion_type,
            self.target_character.as_deref().unwrap_or("-"),
            prefix
        )
    }
}

/// A time-anchored activity inferred from statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub time: String,
    pub location: String,
    pub description: String,
    /// Character IDs that placed something at this time and location.
    pub sources: Vec<String>,
    pub statement_ids: Vec<String>,
    pub confirmed: bool,
    pub disputed: bool,
}

/// One recorded question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub character_id: String,
    pub question: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    pub statement_id: String,
    pub timestamp: DateTime<Utc>,
}
