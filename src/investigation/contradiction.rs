//! Contradiction judging and storage.
//!
//! A [`JudgmentRequest`] packages two statements plus the context they share.
//! The oracle answers with a [`ContradictionVerdict`], which
//! [`interpret_verdict`] turns into a [`WatsonContradiction`] (or nothing).
//! [`ContradictionStore`] owns confirmed contradictions, the set of already
//! judged pairs, and the derived patterns.

use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::patterns;
use super::rules::{self, LabelRule};
use super::types::{
    ContradictionPattern, ContradictionType, Severity, TrackedStatement, WatsonContradiction,
};

const DEFAULT_CONFIDENCE: f64 = 0.7;

/// Unordered pair key for two statement ids.
pub fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// The per-statement fields the oracle sees.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementDigest {
    pub id: String,
    pub character_id: String,
    pub character_name: String,
    pub question: String,
    pub content: String,
    pub emotional_state: String,
    pub confidence: f64,
    pub is_evasive: bool,
}

impl From<&TrackedStatement> for StatementDigest {
    fn from(s: &TrackedStatement) -> Self {
        Self {
            id: s.id.clone(),
            character_id: s.character_id.clone(),
            character_name: s.character_name.clone(),
            question: s.player_question.clone(),
            content: s.content.clone(),
            emotional_state: format!(
                "{} ({:.1})",
                s.emotional_state.primary, s.emotional_state.intensity
            ),
            confidence: s.confidence,
            is_evasive: s.is_evasive,
        }
    }
}

/// Entities both statements mention.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SharedContext {
    pub people: Vec<String>,
    pub places: Vec<String>,
    pub times: Vec<String>,
}

impl SharedContext {
    pub fn between(a: &TrackedStatement, b: &TrackedStatement) -> Self {
        fn overlap(x: &BTreeSet<String>, y: &BTreeSet<String>) -> Vec<String> {
            x.intersection(y).cloned().collect()
        }
        Self {
            people: overlap(&a.entities.people, &b.entities.people),
            places: overlap(&a.entities.places, &b.entities.places),
            times: overlap(&a.entities.times, &b.entities.times),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty() && self.places.is_empty() && self.times.is_empty()
    }
}

/// Everything the oracle needs to judge one pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentRequest {
    pub statement1: StatementDigest,
    pub statement2: StatementDigest,
    pub shared_context: SharedContext,
}

impl JudgmentRequest {
    pub fn new(a: &TrackedStatement, b: &TrackedStatement) -> Self {
        Self {
            statement1: a.into(),
            statement2: b.into(),
            shared_context: SharedContext::between(a, b),
        }
    }

    /// Natural-language prompt with the structured fields embedded.
    pub fn to_prompt(&self) -> String {
        let mut out = String::from(
            "You are Watson, assisting a detective. Decide whether these two witness \
             statements genuinely contradict each other.\n\n",
        );
        for (label, s) in [("STATEMENT 1", &self.statement1), ("STATEMENT 2", &self.statement2)] {
            let _ = writeln!(out, "{label} ({}):", s.character_name);
            let _ = writeln!(out, "  Question: {}", s.question);
            let _ = writeln!(out, "  Answer: \"{}\"", s.content);
            let _ = writeln!(
                out,
                "  Demeanour: {}, confidence {:.1}{}",
                s.emotional_state,
                s.confidence,
                if s.is_evasive { ", evasive" } else { "" }
            );
            out.push('\n');
        }
        if !self.shared_context.is_empty() {
            out.push_str("Shared context:\n");
            for (label, items) in [
                ("people", &self.shared_context.people),
                ("places", &self.shared_context.places),
                ("times", &self.shared_context.times),
            ] {
                if !items.is_empty() {
                    let _ = writeln!(out, "  {label}: {}", items.join(", "));
                }
            }
            out.push('\n');
        }
        out.push_str(
            "Reply with a single JSON object:\n\
             {\"isContradiction\": bool, \"type\": \"direct|timeline|location|witness|behavioral|logical\", \
             \"severity\": \"minor|significant|major|critical\", \"explanation\": string, \
             \"implication\": string, \"suggestedQuestions\": [string], \"confidence\": number}\n\
             Only flag real conflicts, not differences in detail.",
        );
        out
    }
}

/// The oracle's structured answer. Every field except the flag is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContradictionVerdict {
    pub is_contradiction: bool,
    #[serde(rename = "type")]
    pub contradiction_type: Option<String>,
    pub severity: Option<String>,
    pub explanation: Option<String>,
    pub implication: Option<String>,
    pub suggested_questions: Option<Vec<String>>,
    pub confidence: Option<f64>,
}

impl ContradictionVerdict {
    pub fn no() -> Self {
        Self::default()
    }
}

static FALLBACK_TYPE_RULES: std::sync::LazyLock<Vec<LabelRule<ContradictionType>>> =
    std::sync::LazyLock::new(|| {
        rules::compile(&[
            (r"(?i)\b(?:time|times|timing|hour|o'clock|clock|when|earlier|later|before|after)\b", ContradictionType::Timeline),
            (r"(?i)\b(?:location|place|room|where|whereabouts|elsewhere)\b", ContradictionType::Location),
            (r"(?i)\b(?:saw|seen|witness(?:ed)?|heard|observed)\b", ContradictionType::Witness),
            (r"(?i)\b(?:behavio(?:u)?r|demeanou?r|nervous|evasive|reaction|acted)\b", ContradictionType::Behavioral),
            (r"(?i)\b(?:logic(?:al|ally)?|impossible|inconsistent|cannot both)\b", ContradictionType::Logical),
        ])
    });

/// Classify a contradiction from its explanation when the oracle gave no usable type.
pub fn classify_from_explanation(explanation: &str) -> ContradictionType {
    rules::first_label(&FALLBACK_TYPE_RULES, explanation).unwrap_or(ContradictionType::Direct)
}

/// Turn a verdict into a contradiction record. `None` when the oracle said no.
pub fn interpret_verdict(
    verdict: ContradictionVerdict,
    a: &TrackedStatement,
    b: &TrackedStatement,
) -> Option<WatsonContradiction> {
    if !verdict.is_contradiction {
        return None;
    }

    let explanation = verdict
        .explanation
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "{} and {} gave accounts that cannot both be true.",
                a.character_name, b.character_name
            )
        });

    let contradiction_type = verdict
        .contradiction_type
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or_else(|| classify_from_explanation(&explanation));

    let severity = verdict
        .severity
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Severity::Significant);

    let confidence = verdict
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let implication = verdict
        .implication
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| "At least one of them is not telling the whole truth.".to_string());

    Some(WatsonContradiction {
        id: uuid::Uuid::now_v7().to_string(),
        contradiction_type,
        severity,
        statement1: a.clone(),
        statement2: b.clone(),
        explanation,
        implication,
        suggested_questions: verdict.suggested_questions.unwrap_or_default(),
        affected_characters: [a.character_id.clone(), b.character_id.clone()],
        discovered_at: Utc::now(),
        confidence,
    })
}

/// Confirmed contradictions, judged pairs, and derived patterns.
#[derive(Debug, Default)]
pub struct ContradictionStore {
    contradictions: Vec<WatsonContradiction>,
    judged: HashSet<(String, String)>,
    patterns: Vec<ContradictionPattern>,
}

impl ContradictionStore {
    /// Mark a pair as judged. Returns `false` if it already was, in which case
    /// the caller must not ask the oracle again.
    pub fn begin_judgment(&mut self, a: &str, b: &str) -> bool {
        self.judged.insert(pair_key(a, b))
    }

    pub fn is_judged(&self, a: &str, b: &str) -> bool {
        self.judged.contains(&pair_key(a, b))
    }

    /// Store a contradiction and recompute patterns. Returns `false` if the
    /// pair already has one.
    pub fn record(&mut self, contradiction: WatsonContradiction) -> bool {
        let key = pair_key(&contradiction.statement1.id, &contradiction.statement2.id);
        let exists = self
            .contradictions
            .iter()
            .any(|c| pair_key(&c.statement1.id, &c.statement2.id) == key);
        if exists {
            debug!(pair = ?key, "contradiction already recorded");
            return false;
        }

        info!(
            id = %contradiction.id,
            kind = %contradiction.contradiction_type,
            severity = %contradiction.severity,
            between = ?contradiction.affected_characters,
            "contradiction recorded"
        );
        self.judged.insert(key);
        self.contradictions.push(contradiction);
        patterns::detect(&self.contradictions, &mut self.patterns);
        true
    }

    pub fn all(&self) -> &[WatsonContradiction] {
        &self.contradictions
    }

    pub fn for_character<'a>(
        &'a self,
        character_id: &'a str,
    ) -> impl Iterator<Item = &'a WatsonContradiction> + 'a {
        self.contradictions.iter().filter(move |c| c.involves(character_id))
    }

    pub fn patterns(&self) -> &[ContradictionPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.contradictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contradictions.is_empty()
    }

    pub fn clear(&mut self) {
        self.contradictions.clear();
        self.judged.clear();
        self.patterns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseFile;
    use crate::investigation::extract::{StatementExtractor, StatementInput};

    fn pair() -> (TrackedStatement, TrackedStatement) {
        let ex = StatementExtractor::new(&CaseFile::default());
        let a = ex.extract(
            &StatementInput {
                character_id: "thomas",
                character_name: "Thomas Ashford",
                question: "Where were you at 11:15?",
                response: "I was in the library at 11:15.",
            },
            None,
        );
        let b = ex.extract(
            &StatementInput {
                character_id: "james",
                character_name: "James Hartley",
                question: "Did you see anyone at 11:15?",
                response: "I saw Master Thomas leaving the study at 11:15.",
            },
            None,
        );
        (a, b)
    }

    #[test]
    fn pair_key_is_unordered() {
        assert_eq!(pair_key("b", "a"), pair_key("a", "b"));
    }

    #[test]
    fn prompt_carries_both_statements_and_context() {
        let (a, b) = pair();
        let request = JudgmentRequest::new(&a, &b);
        assert!(request.shared_context.times.contains(&"11:15".to_string()));
        let prompt = request.to_prompt();
        assert!(prompt.contains("Thomas Ashford"));
        assert!(prompt.contains("leaving the study"));
        assert!(prompt.contains("isContradiction"));
        assert!(prompt.contains("times: 11:15"));
    }

    #[test]
    fn negative_verdict_records_nothing() {
        let (a, b) = pair();
        assert!(interpret_verdict(ContradictionVerdict::no(), &a, &b).is_none());
    }

    #[test]
    fn verdict_fields_and_defaults() {
        let (a, b) = pair();
        let verdict: ContradictionVerdict = serde_json::from_str(
            r#"{"isContradiction": true, "type": "timeline", "severity": "major", "confidence": 0.9}"#,
        )
        .unwrap();
        let c = interpret_verdict(verdict, &a, &b).unwrap();
        assert_eq!(c.contradiction_type, ContradictionType::Timeline);
        assert_eq!(c.severity, Severity::Major);
        assert_eq!(c.confidence, 0.9);
        assert_eq!(c.affected_characters, ["thomas".to_string(), "james".to_string()]);

        let sparse = ContradictionVerdict {
            is_contradiction: true,
            contradiction_type: Some("nonsense".into()),
            explanation: Some("He claims the library but was seen in another room.".into()),
            ..Default::default()
        };
        let c = interpret_verdict(sparse, &a, &b).unwrap();
        assert_eq!(c.contradiction_type, ContradictionType::Location);
        assert_eq!(c.severity, Severity::Significant);
        assert_eq!(c.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn fallback_classifier_order() {
        assert_eq!(classify_from_explanation("the times do not line up"), ContradictionType::Timeline);
        assert_eq!(classify_from_explanation("one of them saw something else"), ContradictionType::Witness);
        assert_eq!(classify_from_explanation("their demeanour changed"), ContradictionType::Behavioral);
        assert_eq!(classify_from_explanation("that is impossible"), ContradictionType::Logical);
        assert_eq!(classify_from_explanation("they disagree"), ContradictionType::Direct);
    }

    #[test]
    fn store_dedups_by_pair() {
        let (a, b) = pair();
        let mut store = ContradictionStore::default();
        assert!(store.begin_judgment(&a.id, &b.id));
        assert!(!store.begin_judgment(&b.id, &a.id));

        let verdict = ContradictionVerdict {
            is_contradiction: true,
            ..Default::default()
        };
        let first = interpret_verdict(verdict.clone(), &a, &b).unwrap();
        let mirrored = interpret_verdict(verdict, &b, &a).unwrap();
        assert!(store.record(first));
        assert!(!store.record(mirrored));
        assert_eq!(store.len(), 1);
        assert_eq!(store.for_character("james").count(), 1);
        assert_eq!(store.for_character("victoria").count(), 0);

        store.clear();
        assert!(store.is_empty());
        assert!(!store.is_judged(&a.id, &b.id));
    }
}
