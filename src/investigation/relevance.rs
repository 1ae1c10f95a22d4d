//! Pairwise relevance scoring, a cheap shortlist before the oracle is asked.
//!
//! The score is built only from symmetric terms (topic equality or group
//! membership, set intersections) so `relevance_score(a, b) == relevance_score(b, a)`.

use std::collections::BTreeSet;

use super::rules;
use super::types::TrackedStatement;

/// Minimum score for a statement to be worth comparing.
pub const DEFAULT_THRESHOLD: f64 = 1.5;
/// Candidates kept per new statement.
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

const SAME_TOPIC: f64 = 2.0;
const RELATED_TOPIC: f64 = 1.0;
const SHARED_PERSON: f64 = 0.5;
const SHARED_PLACE: f64 = 0.75;
const SHARED_TIME: f64 = 1.0;
const SHARED_CLAIM_TYPE: f64 = 0.5;
const SHARED_KEYWORD: f64 = 0.25;

/// A prior statement worth comparing, with its score.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub statement: &'a TrackedStatement,
    pub score: f64,
}

fn shared<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    a.intersection(b).count() as f64
}

/// Additive relevance between two statements.
pub fn relevance_score(a: &TrackedStatement, b: &TrackedStatement) -> f64 {
    let mut score = 0.0;

    if a.topic == b.topic {
        score += SAME_TOPIC;
    } else if rules::topics_related(a.topic, b.topic) {
        score += RELATED_TOPIC;
    }

    score += SHARED_PERSON * shared(&a.entities.people, &b.entities.people);
    score += SHARED_PLACE * shared(&a.entities.places, &b.entities.places);
    score += SHARED_TIME * shared(&a.entities.times, &b.entities.times);
    score += SHARED_CLAIM_TYPE * shared(&a.claim_types(), &b.claim_types());

    let kw_a: BTreeSet<&str> = a.keywords.iter().map(String::as_str).collect();
    let kw_b: BTreeSet<&str> = b.keywords.iter().map(String::as_str).collect();
    score += SHARED_KEYWORD * shared(&kw_a, &kw_b);

    score
}

/// Rank prior statements from other characters by relevance to `new`.
///
/// Excludes `new` itself and everything said by the same character. Results are
/// sorted by score (highest first), ties broken by recency, and cut to
/// `max_candidates`.
pub fn rank_candidates<'a>(
    new: &TrackedStatement,
    history: &'a [TrackedStatement],
    threshold: f64,
    max_candidates: usize,
) -> Vec<Candidate<'a>> {
    let mut candidates: Vec<Candidate<'a>> = history
        .iter()
        .filter(|s| s.id != new.id && s.character_id != new.character_id)
        .map(|s| Candidate {
            statement: s,
            score: relevance_score(new, s),
        })
        .filter(|c| c.score >= threshold)
        .collect();

    candidates.sort_by(|x, y| {
        y.score
            .total_cmp(&x.score)
            .then_with(|| y.statement.timestamp.cmp(&x.statement.timestamp))
    });
    candidates.truncate(max_candidates);

    tracing::debug!(
        statement = %new.id,
        candidates = candidates.len(),
        "relevance shortlist built"
    );
    candidates
}
