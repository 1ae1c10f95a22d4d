//! Statement extraction: turns a (question, response) pair into a [`TrackedStatement`].
//!
//! Every stage is independent: topic, entities, claims, emotion, confidence,
//! evasiveness and keywords each read the raw text and never see another
//! stage's output. Only the people table depends on the case; everything else
//! comes from the static tables in [`super::rules`].

use chrono::{DateTime, Utc};

use super::rules::{self, LabelRule};
use super::types::{Claim, ClaimType, EmotionalState, Entities, Mood, Topic, TrackedStatement};
use crate::case::CaseFile;

/// Raw input for one statement.
#[derive(Debug, Clone)]
pub struct StatementInput<'a> {
    pub character_id: &'a str,
    pub character_name: &'a str,
    pub question: &'a str,
    pub response: &'a str,
}

/// Compiled extractor for one case.
pub struct StatementExtractor {
    people: Vec<LabelRule<String>>,
}

impl StatementExtractor {
    /// Build the people table from the case's characters and victim.
    pub fn new(case: &CaseFile) -> Self {
        let mut table: Vec<(String, String)> = Vec::new();
        for character in &case.characters {
            let mut names = character.aliases.clone();
            names.push(character.name.to_lowercase());
            for name in names {
                table.push((alias_pattern(&name), character.id.clone()));
            }
        }
        for alias in &case.victim.aliases {
            table.push((alias_pattern(alias), case.victim.id.clone()));
        }
        table.push((alias_pattern(&case.victim.name.to_lowercase()), case.victim.id.clone()));

        let borrowed: Vec<(&str, String)> =
            table.iter().map(|(p, l)| (p.as_str(), l.clone())).collect();
        Self {
            people: rules::compile(&borrowed),
        }
    }

    /// Run the full pipeline. `not_before` is the speaker's previous statement
    /// time, which keeps each character's history monotonic.
    pub fn extract(
        &self,
        input: &StatementInput<'_>,
        not_before: Option<DateTime<Utc>>,
    ) -> TrackedStatement {
        let now = Utc::now();
        let timestamp = match not_before {
            Some(prev) if prev > now => prev,
            _ => now,
        };

        let response = input.response.trim();
        let confidence = score_confidence(response);

        TrackedStatement {
            id: uuid::Uuid::now_v7().to_string(),
            character_id: input.character_id.to_string(),
            character_name: input.character_name.to_string(),
            topic: classify_topic(input.question, response),
            content: response.to_string(),
            player_question: input.question.to_string(),
            timestamp,
            entities: self.extract_entities(response),
            claims: extract_claims(response),
            emotional_state: infer_emotion(response),
            confidence,
            is_evasive: is_evasive(response),
            keywords: rules::extract_keywords(response),
        }
    }

    /// Four independent passes; the speaker's own name is not filtered out.
    pub fn extract_entities(&self, text: &str) -> Entities {
        Entities {
            people: self
                .people
                .iter()
                .filter(|r| r.regex.is_match(text))
                .map(|r| r.label.clone())
                .collect(),
            places: labels(&rules::PLACE_RULES, text),
            times: rules::extract_times(text),
            objects: labels(&rules::OBJECT_RULES, text),
        }
    }
}

fn alias_pattern(alias: &str) -> String {
    format!(r"(?i)\b{}\b", regex::escape(alias.trim()))
}

fn labels(rules: &[LabelRule<&'static str>], text: &str) -> std::collections::BTreeSet<String> {
    rules::all_labels(rules, text)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Single label, first match wins over question then answer.
pub fn classify_topic(question: &str, response: &str) -> Topic {
    rules::first_label(&rules::TOPIC_RULES, question)
        .or_else(|| rules::first_label(&rules::TOPIC_RULES, response))
        .unwrap_or(Topic::General)
}

/// Run the six claim probes. Each contributes at most one claim.
pub fn extract_claims(text: &str) -> Vec<Claim> {
    let mut claims = Vec::new();
    for probe in rules::CLAIM_PROBES.iter() {
        let Some(caps) = probe.regex.captures(text) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let clause = clause_around(text, whole.start(), whole.end());

        let mut claim = Claim::new(probe.claim_type, probe.predicate);
        match probe.claim_type {
            ClaimType::Action => {
                if let Some(verb) = caps.get(1) {
                    claim.predicate = verb.as_str().to_lowercase();
                }
                claim.object = caps.get(2).and_then(|m| tidy_object(m.as_str()));
            }
            ClaimType::Location => {
                // label from the whole phrase so "my room" reads as the bedroom
                claim.object = caps
                    .get(1)
                    .map(|m| canonical_place(&text[whole.start()..m.end()], m.as_str()));
            }
            ClaimType::Time => {
                let token = caps.get(1).map(|m| rules::normalize_time(m.as_str()));
                claim.timestamp = token.clone();
                claim.object = token;
            }
            _ => {
                claim.object = caps.get(1).and_then(|m| tidy_object(m.as_str()));
            }
        }
        claim.negated = rules::is_negated(clause);
        if claim.timestamp.is_none() {
            claim.timestamp = rules::primary_time(&rules::extract_times(clause));
        }
        claims.push(claim);
    }
    claims
}

/// The sentence-ish clause containing `[start, end)`.
fn clause_around(text: &str, start: usize, end: usize) -> &str {
    let is_break = |c: char| matches!(c, '.' | ';' | '!' | '?' | '\n');
    let begin = text[..start]
        .rfind(is_break)
        .map(|i| i + 1)
        .unwrap_or(0);
    let finish = text[end..]
        .find(is_break)
        .map(|i| end + i)
        .unwrap_or(text.len());
    text[begin..finish].trim()
}

fn canonical_place(phrase: &str, head: &str) -> String {
    rules::first_label(&rules::PLACE_RULES, phrase)
        .map(str::to_string)
        .unwrap_or_else(|| head.trim().to_lowercase())
}

/// Trim and cap a captured phrase at six words.
fn tidy_object(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().take(6).collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" ").to_lowercase())
    }
}

/// Families are checked in priority order; the first one that fires sets the
/// primary mood and every firing family raises intensity.
pub fn infer_emotion(text: &str) -> EmotionalState {
    let mut state = EmotionalState::default();
    let mut primary: Option<Mood> = None;
    for (mood, family) in rules::EMOTION_FAMILIES.iter() {
        let hits: Vec<&str> = family
            .iter()
            .filter(|r| r.regex.is_match(text))
            .map(|r| r.label)
            .collect();
        if hits.is_empty() {
            continue;
        }
        if primary.is_none() {
            primary = Some(*mood);
        }
        state.intensity = (state.intensity + 0.2).min(1.0);
        state.indicators.extend(hits.into_iter().map(str::to_string));
    }
    if let Some(mood) = primary {
        state.primary = mood;
    }
    state
}

/// 0.7 baseline, −0.1 per uncertainty marker, +0.1 per certainty marker.
pub fn score_confidence(text: &str) -> f64 {
    let down = rules::count_matches(&rules::UNCERTAINTY_MARKERS, text) as f64;
    let up = rules::count_matches(&rules::CERTAINTY_MARKERS, text) as f64;
    (0.7 - 0.1 * down + 0.1 * up).clamp(0.0, 1.0)
}

pub fn is_evasive(text: &str) -> bool {
    rules::any_match(&rules::EVASION_RULES, text)
}
