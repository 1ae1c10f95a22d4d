//! Theory scoring.
//!
//! Five sub-scores are computed independently from the case file and the
//! accumulated state, then combined with fixed weights:
//!
//! ```text
//! base  = motive*2 + opportunity*2 + evidence*3 + consistency*2 + impact
//! score = clamp(base + (10 if suspect is the culprit), 0, 100)
//! ```
//!
//! Strengths, weaknesses and follow-up questions are templated sentences gated
//! on the same sub-scores plus a few structural checks.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{
    ClaimType, EmotionalTrend, Grade, Mood, PlayerTheory, QuickEvaluation, Severity,
    TheoryAnalysis, TheoryEvaluation, TheoryVerdict, Topic, TrackedStatement,
    WatsonContradiction,
};
use super::InvestigationState;
use crate::case::{CaseCharacter, CaseFile};

const CULPRIT_BONUS: f64 = 10.0;
const UNKNOWN_SUSPECT_MOTIVE: f64 = 3.0;
const BASE_MOTIVE: f64 = 5.0;
const GENERIC_MOTIVE: f64 = 5.5;
const CULPRIT_MOTIVE: f64 = 9.0;
const BASE_OPPORTUNITY: f64 = 5.0;
const CULPRIT_OPPORTUNITY_FLOOR: f64 = 9.0;
const BASE_CONSISTENCY: f64 = 7.0;
/// Below this many statements a suspect has not really been questioned.
const WELL_QUESTIONED: usize = 3;

static GENERIC_MOTIVE_WORDS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:money|greed|revenge|jealous(?:y)?|hatred|hate|love|power|fear|anger|rage|protect|secret|inherit\w*|debt|spite)\b",
    )
    .ok()
});

/// Inputs shared by every sub-score.
struct Context<'a> {
    theory: &'a PlayerTheory,
    case: &'a CaseFile,
    state: &'a InvestigationState,
    suspect: String,
    character: Option<&'a CaseCharacter>,
    own: Vec<&'a WatsonContradiction>,
    others: usize,
}

impl<'a> Context<'a> {
    fn new(theory: &'a PlayerTheory, state: &'a InvestigationState, case: &'a CaseFile) -> Self {
        let suspect = theory.suspect.trim().to_lowercase();
        let character = case
            .characters
            .iter()
            .find(|c| c.id.eq_ignore_ascii_case(&suspect) || c.name.eq_ignore_ascii_case(&suspect));
        let suspect = character.map(|c| c.id.clone()).unwrap_or(suspect);
        let own: Vec<&WatsonContradiction> = state
            .contradictions()
            .iter()
            .filter(|c| c.involves(&suspect))
            .collect();
        let others = state.contradictions().len() - own.len();
        Self {
            theory,
            case,
            state,
            suspect,
            character,
            own,
            others,
        }
    }

    fn is_culprit(&self) -> bool {
        self.character.is_some() && self.case.is_killer(&self.suspect)
    }

    fn display_name(&self) -> &str {
        match self.character {
            Some(c) => &c.name,
            None if self.theory.suspect.trim().is_empty() => "the accused",
            None => self.theory.suspect.trim(),
        }
    }

    fn own_statements(&self) -> impl Iterator<Item = &'a TrackedStatement> + '_ {
        self.state.statements_by(&self.suspect)
    }

    fn evidence(&self) -> (Vec<&'a TrackedStatement>, usize) {
        let mut found = Vec::new();
        let mut missing = 0;
        for id in &self.theory.evidence {
            match self.state.statement(id) {
                Some(s) => found.push(s),
                None => missing += 1,
            }
        }
        (found, missing)
    }

    fn mentions_suspect(&self, stmt: &TrackedStatement) -> bool {
        if stmt.entities.people.contains(&self.suspect) {
            return true;
        }
        let content = stmt.content.to_lowercase();
        self.character
            .is_some_and(|c| content.contains(&c.name.to_lowercase()))
    }
}

fn contains_any(text: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|n| !n.is_empty() && text.contains(&n.to_lowercase()))
}

fn motive_strength(ctx: &Context<'_>) -> f64 {
    let Some(character) = ctx.character else {
        return UNKNOWN_SUSPECT_MOTIVE;
    };
    let motive = ctx.theory.motive.to_lowercase();
    let score = if contains_any(&motive, &character.motive_keywords) {
        if ctx.is_culprit() {
            CULPRIT_MOTIVE.max(character.motive_ceiling)
        } else {
            character.motive_ceiling
        }
    } else if GENERIC_MOTIVE_WORDS
        .as_ref()
        .is_some_and(|re| re.is_match(&motive))
    {
        GENERIC_MOTIVE
    } else {
        BASE_MOTIVE
    };
    score.clamp(0.0, 10.0)
}

fn opportunity_strength(ctx: &Context<'_>) -> f64 {
    let crime = &ctx.case.crime;
    let text = ctx.theory.opportunity.to_lowercase();
    let mut score = BASE_OPPORTUNITY;

    if contains_any(&text, &crime.locations) {
        score += 2.0;
    }
    if contains_any(&text, &crime.time_markers) {
        score += 2.0;
    } else if contains_any(&text, &crime.vague_time_markers) {
        score += 1.0;
    }

    let located: Vec<(&str, bool)> = ctx
        .own_statements()
        .flat_map(|s| s.claims.iter())
        .filter(|c| c.claim_type == ClaimType::Location && !c.negated)
        .filter_map(|c| c.object.as_deref().map(|o| (o, c.timestamp.is_some())))
        .collect();
    let at_scene = |place: &str| crime.locations.iter().any(|l| l.eq_ignore_ascii_case(place));
    if located.iter().any(|(place, _)| at_scene(place)) {
        score += 1.0;
    }
    if located.iter().any(|(place, timed)| *timed && !at_scene(place)) {
        score -= 1.0;
    }

    if ctx.is_culprit()
        && !crime.confrontation_keywords.is_empty()
        && crime
            .confrontation_keywords
            .iter()
            .all(|k| text.contains(&k.to_lowercase()))
    {
        score = score.max(CULPRIT_OPPORTUNITY_FLOOR);
    }
    score.clamp(0.0, 10.0)
}

fn evidence_strength(ctx: &Context<'_>) -> f64 {
    let (found, _) = ctx.evidence();
    let mut score: f64 = 0.0;
    for stmt in found {
        if ctx.mentions_suspect(stmt) {
            score += 2.0;
        }
        if matches!(stmt.topic, Topic::Timeline | Topic::Whereabouts) {
            score += 1.5;
        }
        if stmt.character_id == ctx.suspect {
            if stmt.is_evasive {
                score += 3.0;
            }
            if stmt.emotional_state.primary == Mood::Nervous {
                score += 1.0;
            }
        }
    }
    for c in &ctx.own {
        score += match c.severity {
            Severity::Critical => 4.0,
            Severity::Major => 3.0,
            _ => 2.0,
        };
    }
    score.clamp(0.0, 10.0)
}

fn consistency_score(ctx: &Context<'_>) -> f64 {
    let own = ctx.own.len() as f64;
    let others = ctx.others as f64;
    let mut score = BASE_CONSISTENCY + (0.5 * own).min(3.0) - (0.25 * others).min(2.0);
    if let Some(profile) = ctx.state.profile(&ctx.suspect) {
        if profile.consistency_score < 0.5
            || profile.emotional_trend == EmotionalTrend::IncreasinglyNervous
        {
            score += 1.0;
        }
        if profile.cooperation_level < 0.5 {
            score += 0.5;
        }
    }
    score.clamp(1.0, 10.0)
}

fn contradiction_impact(ctx: &Context<'_>) -> f64 {
    let mut impact: f64 = ctx
        .own
        .iter()
        .map(|c| match c.severity {
            Severity::Critical => 3.0,
            Severity::Major => 2.0,
            Severity::Significant => 1.0,
            Severity::Minor => 0.5,
        })
        .sum();
    if ctx.others > 2 * ctx.own.len() {
        impact -= 2.0;
    }
    impact.clamp(-10.0, 10.0)
}

fn analyse(ctx: &Context<'_>) -> TheoryAnalysis {
    TheoryAnalysis {
        motive_strength: motive_strength(ctx),
        opportunity_strength: opportunity_strength(ctx),
        evidence_strength: evidence_strength(ctx),
        consistency_score: consistency_score(ctx),
        contradiction_impact: contradiction_impact(ctx),
    }
}

/// Combine sub-scores into the final `[0, 100]` score.
pub fn combine(analysis: &TheoryAnalysis, culprit: bool) -> f64 {
    let base = analysis.motive_strength * 2.0
        + analysis.opportunity_strength * 2.0
        + analysis.evidence_strength * 3.0
        + analysis.consistency_score * 2.0
        + analysis.contradiction_impact;
    let bonus = if culprit { CULPRIT_BONUS } else { 0.0 };
    (base + bonus).clamp(0.0, 100.0)
}

/// Score only. Never touches the oracle and never stores anything.
pub fn quick_evaluate(
    theory: &PlayerTheory,
    state: &InvestigationState,
    case: &CaseFile,
) -> QuickEvaluation {
    let ctx = Context::new(theory, state, case);
    let score = combine(&analyse(&ctx), ctx.is_culprit());
    QuickEvaluation {
        score,
        grade: Grade::from_score(score),
        verdict: TheoryVerdict::from_score(score),
    }
}

/// Full evaluation with narrative. `watson_notes` is the rule-based note; the
/// agent may replace it with oracle commentary.
pub fn evaluate(
    theory: &PlayerTheory,
    state: &InvestigationState,
    case: &CaseFile,
) -> TheoryEvaluation {
    let ctx = Context::new(theory, state, case);
    let analysis = analyse(&ctx);
    let score = combine(&analysis, ctx.is_culprit());
    let verdict = TheoryVerdict::from_score(score);
    let name = ctx.display_name().to_string();

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    let mut follow_ups = Vec::new();

    if ctx.character.is_none() {
        weaknesses.push(format!("{name} is not one of the people we have been investigating."));
    }

    if theory.motive.trim().is_empty() {
        weaknesses.push("No motive has been put forward.".to_string());
        follow_ups.push(format!(
            "What did {name} stand to gain from {}'s death?",
            case.victim.name
        ));
    } else if analysis.motive_strength >= 7.0 {
        strengths.push(format!("The motive is compelling: {}.", theory.motive.trim()));
    } else if analysis.motive_strength <= 5.0 {
        weaknesses.push("The stated motive is not backed by anything we know about them.".to_string());
    }

    if analysis.opportunity_strength >= 8.0 {
        strengths.push(format!("{name} had a clear opportunity at the scene and the time of the murder."));
    } else if analysis.opportunity_strength <= 5.0 {
        weaknesses.push(format!("Nothing yet places {name} at the scene when it happened."));
        follow_ups.push(format!("Who can confirm where {name} was at the time of the murder?"));
    }

    let (found, missing) = ctx.evidence();
    if analysis.evidence_strength >= 6.0 {
        strengths.push("The supporting evidence points firmly in their direction.".to_string());
    } else if analysis.evidence_strength < 3.0 {
        weaknesses.push("The evidence offered is thin.".to_string());
    }
    if missing > 0 {
        weaknesses.push(format!(
            "{missing} of the cited statements could not be found in the record."
        ));
    }

    if analysis.consistency_score >= 8.0 {
        strengths.push(format!("{name}'s testimony has not held together."));
    }
    if analysis.contradiction_impact > 0.0 {
        strengths.push(format!(
            "{name} has been caught in {} contradiction{}.",
            ctx.own.len(),
            if ctx.own.len() == 1 { "" } else { "s" }
        ));
    } else if analysis.contradiction_impact < 0.0 {
        weaknesses.push("Other witnesses have contradicted themselves far more often.".to_string());
    }

    if ctx.character.is_some() {
        let profile = state.profile(&ctx.suspect);
        let questioned = profile.map(|p| p.total_statements).unwrap_or(0);
        if questioned < WELL_QUESTIONED {
            weaknesses.push(format!("{name} has barely been questioned."));
            follow_ups.push(format!("Interview {name} further before making the accusation."));
        }
        if !profile.is_some_and(|p| p.has_covered(Topic::Whereabouts)) {
            follow_ups.push(format!("Ask {name} exactly where they were that night."));
        }
        if !profile.is_some_and(|p| p.has_covered(Topic::Timeline)) {
            follow_ups.push(format!("Have {name} walk through the timeline of the evening."));
        }
    }

    for c in &ctx.own {
        for q in c.suggested_questions.iter().take(2) {
            if !follow_ups.contains(q) {
                follow_ups.push(q.clone());
            }
        }
    }

    let mut supporting_evidence: Vec<String> = found
        .iter()
        .map(|s| format!("{}: \"{}\"", s.character_name, s.content))
        .collect();
    supporting_evidence.extend(ctx.own.iter().map(|c| c.explanation.clone()));

    let watson_notes = rule_based_note(&name, verdict);

    tracing::info!(
        suspect = %ctx.suspect,
        score,
        grade = %Grade::from_score(score),
        verdict = %verdict,
        "theory evaluated"
    );

    TheoryEvaluation {
        id: theory
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::now_v7().to_string()),
        theory: theory.clone(),
        score,
        grade: Grade::from_score(score),
        verdict,
        analysis,
        supporting_evidence,
        weaknesses,
        strengths,
        follow_up_questions: follow_ups,
        watson_notes,
    }
}

fn rule_based_note(name: &str, verdict: TheoryVerdict) -> String {
    match verdict {
        TheoryVerdict::Compelling => {
            format!("The pieces fit remarkably well. I believe you have found our murderer in {name}.")
        }
        TheoryVerdict::Plausible => {
            format!("A reasonable case against {name}, though I would want more before we act on it.")
        }
        TheoryVerdict::Weak => {
            format!("There is something in this, but the case against {name} has real gaps.")
        }
        TheoryVerdict::Flawed => {
            format!("I am not persuaded. Too much of this theory about {name} rests on supposition.")
        }
        TheoryVerdict::Dismissed => {
            format!("I'm afraid the facts simply do not support accusing {name}.")
        }
    }
}
