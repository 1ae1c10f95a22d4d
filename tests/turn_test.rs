mod helpers;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use helpers::{agent_with, ask, offline_agent, verdict, FailingOracle, ScriptedOracle, SlowOracle};
use watson::investigation::contradiction::{ContradictionVerdict, JudgmentRequest};
use watson::investigation::types::{ContradictionType, Priority, Severity, Topic};
use watson::oracle::{Oracle, OracleError};

#[tokio::test]
async fn direct_answer_is_recorded_and_classified() {
    let mut agent = offline_agent();
    let turn = ask(
        &mut agent,
        "thomas",
        "Where were you at 11:30 PM?",
        "I was in the library at 11:30 PM, reading by the fire.",
    )
    .await;

    let stmt = turn.statement.expect("statement recorded");
    assert_eq!(stmt.topic, Topic::Whereabouts);
    assert_eq!(stmt.character_name, "Thomas Ashford");
    assert!(!stmt.entities.times.is_empty());
    assert!(stmt.entities.places.contains("library"));
    assert!(!stmt.is_evasive);
    assert!(turn.new_contradictions.is_empty());

    assert_eq!(agent.get_all_statements().len(), 1);
    let profile = agent.get_profile("thomas").unwrap();
    assert_eq!(profile.total_statements, 1);
    assert!(profile.topics_covered.contains(&Topic::Whereabouts));
    assert_eq!(agent.get_conversation().len(), 1);
}

#[tokio::test]
async fn conflicting_whereabouts_produce_one_contradiction() {
    let oracle = Arc::new(ScriptedOracle::always(verdict("timeline", "major", 0.9)));
    let mut agent = agent_with(oracle.clone());

    let first = ask(&mut agent, "thomas", "Where were you at 11:15?", "I was in the library at 11:15.").await;
    assert!(first.new_contradictions.is_empty());

    let second = ask(&mut agent, "james", "Where were you at 11:15?", "I was in the study at 11:15.").await;
    assert_eq!(second.new_contradictions.len(), 1);
    assert_eq!(oracle.judgment_count(), 1);

    let c = &second.new_contradictions[0];
    assert_eq!(c.contradiction_type, ContradictionType::Timeline);
    assert_eq!(c.severity, Severity::Major);
    assert_eq!(c.confidence, 0.9);
    assert!(c.involves("thomas"));
    assert!(c.involves("james"));
    // earlier statement first
    assert_eq!(c.statement1.character_id, "thomas");
    assert_eq!(c.statement2.character_id, "james");

    assert_eq!(agent.get_contradictions().len(), 1);
    assert_eq!(agent.get_contradictions_for("james").len(), 1);
    assert!(agent.get_contradictions_for("victoria").is_empty());

    assert!(second
        .observations
        .iter()
        .any(|o| o.contains("Thomas Ashford")));

    // both profiles lose consistency
    assert!(agent.get_profile("thomas").unwrap().consistency_score < 1.0);
    assert!(agent.get_profile("james").unwrap().consistency_score < 1.0);

    let disputed = agent.get_timeline().iter().filter(|e| e.disputed).count();
    assert_eq!(disputed, 2);
}

#[tokio::test]
async fn same_character_is_never_judged() {
    let oracle = Arc::new(ScriptedOracle::always(verdict("direct", "critical", 1.0)));
    let mut agent = agent_with(oracle.clone());

    ask(&mut agent, "thomas", "Where were you at 11:15?", "I was in the library at 11:15.").await;
    let turn = ask(&mut agent, "thomas", "Where were you at 11:15?", "I was in the study at 11:15.").await;

    assert!(turn.new_contradictions.is_empty());
    assert_eq!(oracle.judgment_count(), 0);
    assert!(agent.get_contradictions().is_empty());
}

#[tokio::test]
async fn each_pair_is_judged_once() {
    let oracle = Arc::new(ScriptedOracle::new(Vec::new()));
    let mut agent = agent_with(oracle.clone());

    ask(&mut agent, "thomas", "Where were you at 11:15?", "I was in the library at 11:15.").await;
    ask(&mut agent, "james", "Where were you at 11:15?", "I was in the study at 11:15.").await;
    assert_eq!(oracle.judgment_count(), 1);

    // a third speaker is compared with both earlier statements, and nothing is re-asked
    ask(&mut agent, "eleanor", "Where were you at 11:15?", "I was in the hallway at 11:15.").await;
    assert_eq!(oracle.judgment_count(), 3);
    assert!(agent.get_contradictions().is_empty());
}

#[tokio::test]
async fn blank_response_changes_nothing() {
    let oracle = Arc::new(ScriptedOracle::always(verdict("timeline", "major", 0.9)));
    let mut agent = agent_with(oracle.clone());

    let turn = ask(&mut agent, "thomas", "Where were you?", "   \n ").await;
    assert!(turn.statement.is_none());
    assert!(turn.new_contradictions.is_empty());
    assert!(turn.suggestions.is_empty());
    assert!(agent.get_all_statements().is_empty());
    assert!(agent.get_profile("thomas").is_none());
    assert_eq!(oracle.judgment_count(), 0);
}

#[tokio::test]
async fn failing_oracle_degrades_to_rules() {
    let oracle = Arc::new(FailingOracle::new());
    let mut agent = agent_with(oracle.clone());

    ask(&mut agent, "thomas", "Where were you at 11:15?", "I was in the library at 11:15.").await;
    let turn = ask(
        &mut agent,
        "james",
        "Where were you at 11:15?",
        "Um, I'd rather not say. I was in the study at 11:15, I think.",
    )
    .await;

    let stmt = turn.statement.expect("statement still recorded");
    assert!(stmt.is_evasive);
    assert!(turn.new_contradictions.is_empty());
    assert!(turn.observations.iter().any(|o| o.contains("avoiding the question")));
    assert!(!turn.suggestions.is_empty());
    assert!(oracle.calls.load(std::sync::atomic::Ordering::SeqCst) > 0);

    let prior = &agent.get_all_statements()[0];
    assert!(agent
        .state()
        .contradiction_store()
        .is_judged(&prior.id, &stmt.id));
}

#[tokio::test]
async fn slow_oracle_times_out() {
    let mut agent = agent_with(Arc::new(SlowOracle));
    let turn = ask(&mut agent, "victoria", "Where were you?", "I was in the drawing room.").await;
    assert!(turn.statement.is_some());
    assert!(turn.observations.iter().all(|o| o != "too late"));
}

#[tokio::test]
async fn oracle_observation_is_appended() {
    let oracle = Arc::new(ScriptedOracle::new(Vec::new()).with_summary("Note the library door."));
    let mut agent = agent_with(oracle);
    let turn = ask(&mut agent, "thomas", "Where were you?", "I was in the library.").await;
    assert_eq!(turn.observations.last().map(String::as_str), Some("Note the library door."));
}

#[tokio::test]
async fn unquestioned_suspects_are_suggested_first() {
    let mut agent = offline_agent();
    let turn = ask(&mut agent, "thomas", "Where were you?", "I was in the library.").await;

    assert!(!turn.suggestions.is_empty());
    assert!(turn.suggestions.len() <= 5);
    assert_eq!(turn.suggestions[0].priority, Priority::High);
    assert!(turn
        .suggestions
        .iter()
        .all(|s| s.target_character.as_deref() != Some("thomas") || s.priority != Priority::High));
    let stored = agent.get_suggestions();
    assert!(stored.len() >= turn.suggestions.len());
    assert!(turn.suggestions.iter().all(|s| stored.contains(s)));
    assert!(stored.windows(2).all(|w| w[0].priority <= w[1].priority));
}

/// Offers one line of inquiry the first time it is asked for ideas, then nothing.
struct OneHint {
    given: AtomicBool,
}

#[async_trait]
impl Oracle for OneHint {
    async fn summarize(&self, prompt: &str) -> Result<String, OracleError> {
        if prompt.contains("lines of inquiry") && !self.given.swap(true, Ordering::SeqCst) {
            return Ok(r#"[{"type": "investigate", "priority": "low",
                "text": "Search the study fireplace for burnt paper"}]"#
                .into());
        }
        Ok(String::new())
    }

    async fn judge_contradiction(
        &self,
        _request: &JudgmentRequest,
    ) -> Result<ContradictionVerdict, OracleError> {
        Ok(ContradictionVerdict::no())
    }
}

#[tokio::test]
async fn oracle_hints_outlive_their_turn() {
    let mut agent = agent_with(Arc::new(OneHint {
        given: AtomicBool::new(false),
    }));
    let hint = "Search the study fireplace for burnt paper";

    ask(&mut agent, "thomas", "Where were you?", "I was in the library.").await;
    ask(&mut agent, "james", "Where were you?", "In the pantry.").await;
    let third = ask(&mut agent, "eleanor", "Where were you?", "In the hallway.").await;
    // low priority, so it loses the turn's top five to the rule-based hints
    assert!(third.suggestions.iter().all(|s| s.text != hint));
    assert!(agent.get_suggestions().iter().any(|s| s.text == hint));

    ask(&mut agent, "victoria", "Where were you?", "In the drawing room.").await;
    let stored = agent.get_suggestions();
    assert_eq!(stored.iter().filter(|s| s.text == hint).count(), 1);
    assert_eq!(stored.last().map(|s| s.text.as_str()), Some(hint));

    agent.reset();
    assert!(agent.get_suggestions().is_empty());
}

#[tokio::test]
async fn reset_clears_the_investigation() {
    let oracle = Arc::new(ScriptedOracle::always(verdict("timeline", "major", 0.9)));
    let mut agent = agent_with(oracle);

    ask(&mut agent, "thomas", "Where were you at 11:15?", "I was in the library at 11:15.").await;
    ask(&mut agent, "james", "Where were you at 11:15?", "I was in the study at 11:15.").await;
    assert_eq!(agent.get_contradictions().len(), 1);

    agent.reset();

    assert!(agent.get_all_statements().is_empty());
    assert!(agent.get_contradictions().is_empty());
    assert!(agent.get_patterns().is_empty());
    assert!(agent.get_suggestions().is_empty());
    assert!(agent.get_timeline().is_empty());
    assert!(agent.get_profile("thomas").is_none());
    assert_eq!(agent.get_investigation_summary().total_statements, 0);
}
