//! Rolling character profiles.
//!
//! [`apply_statement`] is the side effect of extraction: it bumps counters,
//! appends claims, nudges cooperation, and recomputes the emotional trend from
//! the speaker's most recent statements.

use super::types::{
    CharacterProfile, EmotionalTrend, KeyClaim, Mood, Severity, TrackedStatement,
};

/// How many recent statements feed the emotional trend.
pub const TREND_WINDOW: usize = 5;

/// Fold a new statement into its speaker's profile.
///
/// `recent` holds the speaker's statements in insertion order, already including
/// `stmt`; only the last [`TREND_WINDOW`] are read.
pub fn apply_statement(
    profile: &mut CharacterProfile,
    stmt: &TrackedStatement,
    recent: &[&TrackedStatement],
) {
    profile.total_statements += 1;
    profile.last_interaction = stmt.timestamp;
    if !stmt.character_name.is_empty() {
        profile.character_name = stmt.character_name.clone();
    }
    if !profile.topics_covered.contains(&stmt.topic) {
        profile.topics_covered.push(stmt.topic);
    }

    profile
        .key_claims_timeline
        .extend(stmt.claims.iter().cloned().map(|claim| KeyClaim {
            claim,
            statement_id: stmt.id.clone(),
            timestamp: stmt.timestamp,
        }));

    let nudge = if stmt.is_evasive {
        -0.05
    } else if stmt.confidence >= 0.8 {
        0.03
    } else if stmt.confidence < 0.5 {
        -0.02
    } else {
        0.02
    };
    profile.cooperation_level = (profile.cooperation_level + nudge).clamp(0.0, 1.0);

    let start = recent.len().saturating_sub(TREND_WINDOW);
    profile.emotional_trend = emotional_trend(&recent[start..]);
}

/// Classify the trend of a window of statements.
pub fn emotional_trend(window: &[&TrackedStatement]) -> EmotionalTrend {
    let nervous = window
        .iter()
        .filter(|s| matches!(s.emotional_state.primary, Mood::Nervous | Mood::Fearful))
        .count();
    let defensive = window
        .iter()
        .filter(|s| matches!(s.emotional_state.primary, Mood::Defensive | Mood::Angry))
        .count();

    if nervous >= 2 {
        EmotionalTrend::IncreasinglyNervous
    } else if defensive >= 2 {
        EmotionalTrend::IncreasinglyDefensive
    } else if nervous + defensive >= 3 {
        // unreachable with these counts: three of either kind already has two
        // of one. Kept so a lowered single-kind threshold still has a fallback.
        EmotionalTrend::Erratic
    } else {
        EmotionalTrend::Stable
    }
}

/// Consistency penalty for one contradiction of the given severity.
pub fn consistency_penalty(severity: Severity) -> f64 {
    match severity {
        Severity::Minor => 0.05,
        Severity::Significant => 0.10,
        Severity::Major => 0.15,
        Severity::Critical => 0.20,
    }
}

/// Lower a profile's consistency after a contradiction involving it.
pub fn apply_contradiction(profile: &mut CharacterProfile, severity: Severity) {
    profile.consistency_score = (profile.consistency_score - consistency_penalty(severity)).max(0.0);
}
