//! Prompt builders for the free-form oracle calls. The contradiction and
//! suggestion prompts live next to the code that parses their replies.

use std::fmt::Write as _;

use crate::investigation::types::{TheoryEvaluation, TrackedStatement, WatsonContradiction};

/// Ask for one or two short observations about a fresh statement.
pub fn observation_prompt(stmt: &TrackedStatement, new_contradictions: &[WatsonContradiction]) -> String {
    let mut out = format!(
        "You are Dr. Watson, observing an interrogation.\n\
         Question: {}\n\
         {} answered: \"{}\"\n\
         Demeanour: {} (intensity {:.1}), confidence {:.1}{}.\n",
        stmt.player_question,
        stmt.character_name,
        stmt.content,
        stmt.emotional_state.primary,
        stmt.emotional_state.intensity,
        stmt.confidence,
        if stmt.is_evasive { ", evasive" } else { "" },
    );
    if !new_contradictions.is_empty() {
        out.push_str("This answer conflicts with earlier testimony:\n");
        for c in new_contradictions {
            let _ = writeln!(out, "- {}", c.explanation);
        }
    }
    out.push_str(
        "\nIn one or two short sentences, note anything the detective should pay attention to. \
         Plain text, no lists.",
    );
    out
}

/// Ask for a brief commentary on an evaluated theory.
pub fn theory_prompt(evaluation: &TheoryEvaluation) -> String {
    let t = &evaluation.theory;
    let mut out = format!(
        "You are Dr. Watson. The detective accuses {}.\n\
         Motive: {}\nOpportunity: {}\n",
        t.suspect, t.motive, t.opportunity
    );
    if let Some(method) = t.method.as_deref().filter(|m| !m.trim().is_empty()) {
        let _ = writeln!(out, "Method: {method}");
    }
    let _ = writeln!(
        out,
        "Assessment: score {:.0}/100, grade {}, verdict {}.",
        evaluation.score, evaluation.grade, evaluation.verdict
    );
    for s in &evaluation.strengths {
        let _ = writeln!(out, "+ {s}");
    }
    for w in &evaluation.weaknesses {
        let _ = writeln!(out, "- {w}");
    }
    out.push_str(
        "\nGive your honest opinion of this theory in two or three sentences, in character. \
         Do not reveal who the murderer is.",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseFile;
    use crate::investigation::extract::{StatementExtractor, StatementInput};
    use crate::investigation::{theory, InvestigationState};
    use crate::investigation::types::PlayerTheory;

    #[test]
    fn observation_prompt_mentions_speaker() {
        let ex = StatementExtractor::new(&CaseFile::default());
        let stmt = ex.extract(
            &StatementInput {
                character_id: "victoria",
                character_name: "Victoria Ashford",
                question: "Where were you?",
                response: "I'd rather not say.",
            },
            None,
        );
        let prompt = observation_prompt(&stmt, &[]);
        assert!(prompt.contains("Victoria Ashford answered"));
        assert!(prompt.contains("evasive"));
    }

    #[test]
    fn theory_prompt_lists_assessment() {
        let case = CaseFile::default();
        let state = InvestigationState::new();
        let eval = theory::evaluate(
            &PlayerTheory {
                suspect: "james".into(),
                motive: "pension".into(),
                opportunity: "kitchen".into(),
                method: Some("poker".into()),
                ..Default::default()
            },
            &state,
            &case,
        );
        let prompt = theory_prompt(&eval);
        assert!(prompt.contains("accuses james"));
        assert!(prompt.contains("Method: poker"));
        assert!(prompt.contains(&format!("grade {}", eval.grade)));
    }
}
