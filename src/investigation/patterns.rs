//! Pattern detection over the full contradiction list.
//!
//! Recomputed from scratch after every stored contradiction. Pattern ids are
//! stable per kind, so re-detection replaces the previous record in place.

use std::collections::BTreeMap;

use super::types::{ContradictionPattern, ContradictionType, WatsonContradiction};

/// Contradictions a single character needs before they become a repeat offender.
pub const REPEAT_OFFENDER_MIN: usize = 3;
/// Timeline contradictions needed for the chaos pattern.
pub const TIMELINE_CHAOS_MIN: usize = 2;

const TIMELINE_CHAOS_ID: &str = "pattern-timeline-chaos";
const TIMELINE_CHAOS_LIKELIHOOD: f64 = 0.7;

/// Likelihood for a character involved in `count` contradictions.
pub fn repeat_offender_likelihood(count: usize) -> f64 {
    (0.5 + 0.1 * count as f64).min(0.95)
}

/// Derive every pattern from `contradictions` and upsert it into `patterns`.
pub fn detect(contradictions: &[WatsonContradiction], patterns: &mut Vec<ContradictionPattern>) {
    // character id -> (display name, statement ids)
    let mut per_character: BTreeMap<&str, (&str, Vec<String>)> = BTreeMap::new();
    for c in contradictions {
        for id in &c.affected_characters {
            let entry = per_character
                .entry(id.as_str())
                .or_insert_with(|| (c.name_of(id).unwrap_or(id.as_str()), Vec::new()));
            for s in [&c.statement1, &c.statement2] {
                if s.character_id == *id && !entry.1.contains(&s.id) {
                    entry.1.push(s.id.clone());
                }
            }
            entry.1.sort();
        }
    }

    for (id, (name, statements)) in &per_character {
        let count = contradictions.iter().filter(|c| c.involves(id)).count();
        if count < REPEAT_OFFENDER_MIN {
            continue;
        }
        upsert(
            patterns,
            ContradictionPattern {
                id: format!("pattern-{id}-multiple"),
                name: "Repeated contradictions".into(),
                description: format!(
                    "{name} has been caught in {count} contradictions. Their account keeps shifting."
                ),
                involved_statements: statements.clone(),
                suspect_characters: vec![id.to_string()],
                likelihood: repeat_offender_likelihood(count),
            },
        );
    }

    let timeline: Vec<&WatsonContradiction> = contradictions
        .iter()
        .filter(|c| c.contradiction_type == ContradictionType::Timeline)
        .collect();
    if timeline.len() >= TIMELINE_CHAOS_MIN {
        let mut statements: Vec<String> = Vec::new();
        let mut characters: Vec<String> = Vec::new();
        for c in &timeline {
            for s in [&c.statement1, &c.statement2] {
                if !statements.contains(&s.id) {
                    statements.push(s.id.clone());
                }
                if !characters.contains(&s.character_id) {
                    characters.push(s.character_id.clone());
                }
            }
        }
        upsert(
            patterns,
            ContradictionPattern {
                id: TIMELINE_CHAOS_ID.into(),
                name: "Timeline chaos".into(),
                description: format!(
                    "{} timeline contradictions. The sequence of events that night does not hold together.",
                    timeline.len()
                ),
                involved_statements: statements,
                suspect_characters: characters,
                likelihood: TIMELINE_CHAOS_LIKELIHOOD,
            },
        );
    }
}

fn upsert(patterns: &mut Vec<ContradictionPattern>, pattern: ContradictionPattern) {
    match patterns.iter_mut().find(|p| p.id == pattern.id) {
        Some(existing) => *existing = pattern,
        None => {
            tracing::info!(pattern = %pattern.id, likelihood = pattern.likelihood, "pattern detected");
            patterns.push(pattern);
        }
    }
}
