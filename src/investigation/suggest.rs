//! Next-step hints.
//!
//! The rule-based pass always runs. When enough has been said, the agent also
//! asks the oracle for a few more lines of inquiry; those are parsed here and
//! merged after the rule-based ones under the same dedup key.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Write as _;

use serde::Deserialize;

use super::types::{
    EmotionalTrend, Priority, Severity, Suggestion, SuggestionType, Topic, WatsonContradiction,
};
use super::InvestigationState;
use crate::case::CaseFile;
use crate::oracle::json;

/// Suggestions returned per turn.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;
/// Most lines of inquiry accepted from one oracle reply.
const MAX_ORACLE_SUGGESTIONS: usize = 3;
const LOW_CONFIDENCE: f64 = 0.5;
const SHALLOW_PROFILE: usize = 3;

fn suggestion(
    suggestion_type: SuggestionType,
    priority: Priority,
    text: String,
    reasoning: String,
    target: Option<&str>,
) -> Suggestion {
    Suggestion {
        id: uuid::Uuid::now_v7().to_string(),
        suggestion_type,
        priority,
        text,
        reasoning,
        target_character: target.map(str::to_string),
    }
}

/// True while neither party has spoken since the contradiction was found.
pub fn is_unresolved(c: &WatsonContradiction, state: &InvestigationState) -> bool {
    c.affected_characters.iter().all(|id| {
        state
            .last_statement_time(id)
            .map_or(true, |t| t <= c.discovered_at)
    })
}

fn severity_priority(severity: Severity) -> Priority {
    match severity {
        Severity::Critical | Severity::Major => Priority::High,
        Severity::Significant => Priority::Medium,
        Severity::Minor => Priority::Low,
    }
}

fn topic_prompt(topic: Topic) -> &'static str {
    match topic {
        Topic::Whereabouts => "where exactly they were during the evening",
        Topic::Timeline => "the order of events and the times involved",
        Topic::Observations => "what they saw or heard that night",
        Topic::Relationship => "their relationship with the victim",
        _ => "what they know",
    }
}

/// Every rule-based suggestion for the current state, unsorted.
pub fn rule_based(state: &InvestigationState, case: &CaseFile) -> Vec<Suggestion> {
    let mut out = Vec::new();

    for character in &case.characters {
        if state.profile(&character.id).is_none() {
            out.push(suggestion(
                SuggestionType::Question,
                Priority::High,
                format!("Question {} ({})", character.name, character.role),
                format!("{} has not been interviewed yet.", character.name),
                Some(&character.id),
            ));
        }
    }

    for c in state.contradictions() {
        if !is_unresolved(c, state) {
            continue;
        }
        let [first, second] = &c.affected_characters;
        let first_name = c.name_of(first).unwrap_or(first.as_str());
        let second_name = c.name_of(second).unwrap_or(second.as_str());
        out.push(suggestion(
            SuggestionType::Confront,
            severity_priority(c.severity),
            format!("Confront {first_name} with {second_name}'s account"),
            c.explanation.clone(),
            Some(first.as_str()),
        ));
    }

    for profile in state.profiles() {
        let name = &profile.character_name;
        let id = profile.character_id.as_str();

        if profile.total_statements < SHALLOW_PROFILE {
            out.push(suggestion(
                SuggestionType::Question,
                Priority::Medium,
                format!("Press {name} for more detail"),
                format!(
                    "Only {} statement{} from {name} so far.",
                    profile.total_statements,
                    if profile.total_statements == 1 { "" } else { "s" }
                ),
                Some(id),
            ));
        }

        if let Some(topic) = Topic::IMPORTANT.iter().find(|t| !profile.has_covered(**t)) {
            out.push(suggestion(
                SuggestionType::Question,
                Priority::Medium,
                format!("Ask {name} about {}", topic_prompt(*topic)),
                format!("{name} has not yet been asked about {topic}."),
                Some(id),
            ));
        }

        if matches!(
            profile.emotional_trend,
            EmotionalTrend::IncreasinglyNervous | EmotionalTrend::Erratic
        ) {
            out.push(suggestion(
                SuggestionType::Confront,
                Priority::High,
                format!("Keep the pressure on {name}"),
                format!("{name} has been {} under questioning.", profile.emotional_trend),
                Some(id),
            ));
        }

        if let Some(stmt) = state
            .statements_by(id)
            .rev()
            .find(|s| s.is_evasive && s.confidence < LOW_CONFIDENCE)
        {
            let about = if stmt.player_question.trim().is_empty() {
                "their last answer".to_string()
            } else {
                format!("\"{}\"", stmt.player_question.trim())
            };
            out.push(suggestion(
                SuggestionType::Question,
                Priority::Medium,
                format!("Return to what {name} avoided: {about}"),
                format!("{name} was evasive and unsure when answering."),
                Some(id),
            ));
        }
    }

    // keyword -> characters who used it
    let mut shared: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for stmt in state.statements() {
        for kw in &stmt.keywords {
            shared
                .entry(kw.as_str())
                .or_default()
                .insert(stmt.character_id.as_str());
        }
    }
    for (keyword, characters) in shared {
        if characters.len() < 2 {
            continue;
        }
        let names: Vec<&str> = characters.iter().map(|id| case.display_name(id)).collect();
        out.push(suggestion(
            SuggestionType::CrossReference,
            Priority::Medium,
            format!("Compare what {} said about \"{keyword}\"", names.join(" and ")),
            format!("{} characters mentioned {keyword}.", names.len()),
            None,
        ));
    }

    out
}

/// Compact digest of the investigation used when asking the oracle for ideas.
pub fn oracle_prompt(state: &InvestigationState, case: &CaseFile) -> String {
    let mut out = format!(
        "You are Watson, assisting a detective investigating {}. {}\n\n",
        case.title, case.crime.description
    );
    out.push_str("Suspects questioned so far:\n");
    for p in state.profiles() {
        let _ = writeln!(
            out,
            "- {} ({} statements, trend {}, cooperation {:.2})",
            p.character_name, p.total_statements, p.emotional_trend, p.cooperation_level
        );
    }
    out.push_str("\nRecent testimony:\n");
    for s in state.statements().iter().rev().take(8).rev() {
        let _ = writeln!(out, "- {}: \"{}\"", s.character_name, s.content);
    }
    if !state.contradictions().is_empty() {
        out.push_str("\nKnown contradictions:\n");
        for c in state.contradictions() {
            let _ = writeln!(out, "- [{}] {}", c.severity, c.explanation);
        }
    }
    out.push_str(
        "\nSuggest 2 or 3 new lines of inquiry. Reply with a JSON array of objects: \
         [{\"type\": \"question|confront|investigate|cross-reference\", \
         \"priority\": \"high|medium|low\", \"text\": string, \"reasoning\": string, \
         \"targetCharacter\": character id or null}]",
    );
    out
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OracleItem {
    Text(String),
    Full(OracleSuggestion),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OracleSuggestion {
    #[serde(rename = "type")]
    kind: Option<String>,
    priority: Option<String>,
    text: String,
    reasoning: Option<String>,
    target_character: Option<String>,
}

/// Parse the oracle's reply. Anything unusable yields an empty list.
pub fn parse_oracle_suggestions(reply: &str, case: &CaseFile) -> Vec<Suggestion> {
    let Some(items) = json::parse_first::<Vec<OracleItem>>(reply) else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| {
            let raw = match item {
                OracleItem::Text(text) => OracleSuggestion {
                    text,
                    ..Default::default()
                },
                OracleItem::Full(raw) => raw,
            };
            let text = raw.text.trim();
            if text.is_empty() {
                return None;
            }
            let target = raw
                .target_character
                .as_deref()
                .map(str::trim)
                .filter(|t| case.character(t).is_some());
            Some(suggestion(
                raw.kind
                    .as_deref()
                    .and_then(|k| k.parse().ok())
                    .unwrap_or(SuggestionType::Investigate),
                raw.priority
                    .as_deref()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(Priority::Medium),
                text.to_string(),
                raw.reasoning.unwrap_or_else(|| "Suggested by Watson.".to_string()),
                target,
            ))
        })
        .take(MAX_ORACLE_SUGGESTIONS)
        .collect()
}

/// Dedup, stable-sort by priority, and keep the top `max`.
pub fn merge(rule_based: Vec<Suggestion>, oracle: Vec<Suggestion>, max: usize) -> Vec<Suggestion> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Suggestion> = rule_based
        .into_iter()
        .chain(oracle)
        .filter(|s| seen.insert(s.dedup_key()))
        .collect();
    merged.sort_by_key(|s| s.priority);
    merged.truncate(max);
    merged
}
