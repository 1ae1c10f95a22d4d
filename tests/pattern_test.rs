mod helpers;

use std::sync::Arc;

use async_trait::async_trait;
use helpers::{agent_with, ask};
use watson::investigation::contradiction::{ContradictionVerdict, JudgmentRequest};
use watson::investigation::patterns;
use watson::oracle::{Oracle, OracleError};

/// Confirms every pair that involves `target`, and nothing else.
struct Accuses {
    target: &'static str,
    kind: &'static str,
}

#[async_trait]
impl Oracle for Accuses {
    async fn summarize(&self, _prompt: &str) -> Result<String, OracleError> {
        Ok(String::new())
    }

    async fn judge_contradiction(
        &self,
        request: &JudgmentRequest,
    ) -> Result<ContradictionVerdict, OracleError> {
        let involved = request.statement1.character_id == self.target
            || request.statement2.character_id == self.target;
        if !involved {
            return Ok(ContradictionVerdict::no());
        }
        Ok(ContradictionVerdict {
            is_contradiction: true,
            contradiction_type: Some(self.kind.into()),
            severity: Some("significant".into()),
            explanation: Some("They cannot both be right about who was where.".into()),
            ..Default::default()
        })
    }
}

const WHERE: &str = "Where were you at 11:15?";

#[tokio::test]
async fn four_contradictions_make_a_repeat_offender() {
    let oracle = Arc::new(Accuses {
        target: "victoria",
        kind: "location",
    });
    let mut agent = agent_with(oracle);

    ask(&mut agent, "victoria", WHERE, "I was in the drawing room at 11:15.").await;
    ask(&mut agent, "thomas", WHERE, "I was in the library at 11:15.").await;
    ask(&mut agent, "james", WHERE, "I was in the kitchen at 11:15.").await;
    assert!(agent.get_patterns().is_empty());

    let third = ask(&mut agent, "eleanor", WHERE, "I was in the hallway at 11:15.").await;
    assert_eq!(third.new_contradictions.len(), 1);
    assert_eq!(agent.get_patterns().len(), 1);
    assert!((agent.get_patterns()[0].likelihood - 0.8).abs() < 1e-9);

    ask(&mut agent, "marcus", WHERE, "I was in the conservatory at 11:15.").await;
    assert_eq!(agent.get_contradictions().len(), 4);
    assert_eq!(agent.get_contradictions_for("victoria").len(), 4);

    let found = agent.get_patterns();
    assert_eq!(found.len(), 1);
    let pattern = &found[0];
    assert_eq!(pattern.id, "pattern-victoria-multiple");
    assert!((pattern.likelihood - 0.9).abs() < 1e-9);
    assert_eq!(pattern.suspect_characters, vec!["victoria".to_string()]);
    assert_eq!(pattern.involved_statements.len(), 1);
    assert!(pattern.description.contains("Victoria Ashford"));
}

#[tokio::test]
async fn detection_is_idempotent() {
    let oracle = Arc::new(Accuses {
        target: "victoria",
        kind: "timeline",
    });
    let mut agent = agent_with(oracle);

    ask(&mut agent, "victoria", WHERE, "I was in the drawing room at 11:15.").await;
    for (who, place) in [("thomas", "library"), ("james", "kitchen"), ("eleanor", "hallway")] {
        ask(&mut agent, who, WHERE, &format!("I was in the {place} at 11:15.")).await;
    }

    let before = agent.get_patterns().to_vec();
    let ids: Vec<&str> = before.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["pattern-timeline-chaos", "pattern-victoria-multiple"]);

    let mut again = before.clone();
    patterns::detect(agent.get_contradictions(), &mut again);
    patterns::detect(agent.get_contradictions(), &mut again);
    assert_eq!(again.len(), before.len());
    for (a, b) in again.iter().zip(&before) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.likelihood, b.likelihood);
        assert_eq!(a.involved_statements, b.involved_statements);
    }
}
