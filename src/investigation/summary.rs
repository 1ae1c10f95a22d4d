//! Read-only projections over the state.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::{
    CharacterProfile, ContradictionPattern, Severity, Topic, TrackedStatement, WatsonContradiction,
};
use super::InvestigationState;
use crate::case::CaseFile;

const RECENT_STATEMENTS: usize = 3;

/// Everything known about one suspect.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspectSummary {
    pub character_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub profile: Option<CharacterProfile>,
    pub statement_count: usize,
    pub evasive_count: usize,
    pub recent_statements: Vec<TrackedStatement>,
    pub contradictions: Vec<WatsonContradiction>,
    pub patterns: Vec<ContradictionPattern>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeverityCounts {
    pub minor: usize,
    pub significant: usize,
    pub major: usize,
    pub critical: usize,
}

impl SeverityCounts {
    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Minor => self.minor += 1,
            Severity::Significant => self.significant += 1,
            Severity::Major => self.major += 1,
            Severity::Critical => self.critical += 1,
        }
    }
}

/// Whole-investigation totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationSummary {
    pub case_title: String,
    pub total_statements: usize,
    pub characters_interviewed: usize,
    pub total_contradictions: usize,
    pub contradictions_by_severity: SeverityCounts,
    pub pattern_count: usize,
    pub theories_evaluated: usize,
    pub unquestioned_suspects: Vec<String>,
    pub topics_covered: Vec<Topic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_contradicted: Option<String>,
    pub timeline_events: usize,
    pub confirmed_events: usize,
}

pub fn suspect_summary(
    state: &InvestigationState,
    case: &CaseFile,
    character_id: &str,
) -> SuspectSummary {
    let profile = state.profile(character_id).cloned();
    let statements: Vec<&TrackedStatement> = state.statements_by(character_id).collect();
    let start = statements.len().saturating_sub(RECENT_STATEMENTS);

    let display_name = match &profile {
        Some(p) if !p.character_name.is_empty() && p.character_name != character_id => {
            p.character_name.clone()
        }
        _ => case.display_name(character_id).to_string(),
    };

    SuspectSummary {
        character_id: character_id.to_string(),
        display_name,
        role: case.character(character_id).map(|c| c.role.clone()),
        profile,
        statement_count: statements.len(),
        evasive_count: statements.iter().filter(|s| s.is_evasive).count(),
        recent_statements: statements[start..].iter().map(|s| (*s).clone()).collect(),
        contradictions: state
            .contradiction_store()
            .for_character(character_id)
            .cloned()
            .collect(),
        patterns: state
            .patterns()
            .iter()
            .filter(|p| p.suspect_characters.iter().any(|c| c == character_id))
            .cloned()
            .collect(),
    }
}

pub fn investigation_summary(state: &InvestigationState, case: &CaseFile) -> InvestigationSummary {
    let mut by_severity = SeverityCounts::default();
    let mut per_character: BTreeMap<&str, usize> = BTreeMap::new();
    for c in state.contradictions() {
        by_severity.add(c.severity);
        for id in &c.affected_characters {
            *per_character.entry(id.as_str()).or_default() += 1;
        }
    }
    // ties go to the alphabetically first id
    let most_contradicted = per_character
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(id, _)| case.display_name(id).to_string());

    let mut topics: Vec<Topic> = Vec::new();
    for profile in state.profiles() {
        for topic in &profile.topics_covered {
            if !topics.contains(topic) {
                topics.push(*topic);
            }
        }
    }
    topics.sort();

    InvestigationSummary {
        case_title: case.title.clone(),
        total_statements: state.statements().len(),
        characters_interviewed: state.profiles().count(),
        total_contradictions: state.contradictions().len(),
        contradictions_by_severity: by_severity,
        pattern_count: state.patterns().len(),
        theories_evaluated: state.theory_count(),
        unquestioned_suspects: case
            .characters
            .iter()
            .filter(|c| state.profile(&c.id).is_none())
            .map(|c| c.name.clone())
            .collect(),
        topics_covered: topics,
        most_contradicted,
        timeline_events: state.timeline().len(),
        confirmed_events: state.timeline().iter().filter(|e| e.confirmed).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investigation::extract::{StatementExtractor, StatementInput};

    #[test]
    fn summaries_of_a_small_investigation() {
        let case = CaseFile::default();
        let ex = StatementExtractor::new(&case);
        let mut state = InvestigationState::new();
        for (q, a) in [
            ("Where were you?", "I was in the kitchen."),
            ("What time did you retire?", "I'd rather not say."),
            ("Did you see anyone?", "Nobody."),
            ("Did you hear anything?", "Nothing at all."),
        ] {
            let prev = state.last_statement_time("james");
            let stmt = ex.extract(
                &StatementInput {
                    character_id: "james",
                    character_name: "James Hartley",
                    question: q,
                    response: a,
                },
                prev,
            );
            state.record_statement(stmt);
        }

        let james = suspect_summary(&state, &case, "james");
        assert_eq!(james.display_name, "James Hartley");
        assert_eq!(james.role.as_deref(), Some("the butler"));
        assert_eq!(james.statement_count, 4);
        assert_eq!(james.recent_statements.len(), 3);
        assert_eq!(james.recent_statements[2].content, "Nothing at all.");
        assert_eq!(james.evasive_count, 1);

        let stranger = suspect_summary(&state, &case, "stranger");
        assert!(stranger.profile.is_none());
        assert_eq!(stranger.display_name, "stranger");

        let overall = investigation_summary(&state, &case);
        assert_eq!(overall.total_statements, 4);
        assert_eq!(overall.characters_interviewed, 1);
        assert_eq!(overall.unquestioned_suspects.len(), 4);
        assert!(!overall.unquestioned_suspects.contains(&"James Hartley".to_string()));
        assert!(overall.topics_covered.contains(&Topic::Whereabouts));
        assert!(overall.most_contradicted.is_none());
    }
}
