use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use watson::agent::{ProcessOptions, TurnAnalysis, WatsonAgent};
use watson::case::CaseFile;
use watson::config::WatsonConfig;
use watson::investigation::types::{PlayerTheory, TheoryEvaluation};
use watson::oracle;

/// One recorded question and answer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptTurn {
    pub character_id: String,
    #[serde(default)]
    pub character_name: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    pub response: String,
    #[serde(default)]
    pub pressure: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Bare(Vec<TranscriptTurn>),
    Wrapped { turns: Vec<TranscriptTurn> },
}

/// Accepts either a bare list of turns or `{"turns": [...]}`.
pub fn parse_transcript(text: &str) -> Result<Vec<TranscriptTurn>> {
    let file: TranscriptFile =
        serde_json::from_str(text).context("transcript is not a list of turns")?;
    Ok(match file {
        TranscriptFile::Bare(turns) | TranscriptFile::Wrapped { turns } => turns,
    })
}

/// Replay a transcript through a fresh agent and print what Watson made of it.
pub async fn replay(
    config: &WatsonConfig,
    transcript: &Path,
    theory: Option<&Path>,
    json: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(transcript)
        .with_context(|| format!("failed to read transcript {}", transcript.display()))?;
    let turns = parse_transcript(&text)?;

    let theory: Option<PlayerTheory> = match theory {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read theory {}", path.display()))?;
            Some(serde_json::from_str(&raw).context("failed to parse theory JSON")?)
        }
        None => None,
    };

    let case = Arc::new(CaseFile::load_or_default(config.case.path.as_deref())?);
    let oracle = oracle::create_oracle(&config.oracle)?;
    let mut agent = WatsonAgent::new(case, oracle, config.analysis.clone());

    tracing::info!(turns = turns.len(), "replaying transcript");

    let mut analyses = Vec::with_capacity(turns.len());
    for turn in turns {
        let analysis = agent
            .process_statement(
                &turn.character_id,
                turn.character_name.as_deref().unwrap_or(""),
                &turn.response,
                ProcessOptions {
                    question: turn.question.unwrap_or_default(),
                    pressure: turn.pressure,
                },
            )
            .await;
        if !json {
            print_turn(&analysis);
        }
        analyses.push(analysis);
    }

    let evaluation = match theory {
        Some(t) => Some(agent.evaluate_theory(&t).await),
        None => None,
    };

    if json {
        let out = serde_json::json!({
            "turns": analyses,
            "summary": agent.get_investigation_summary(),
            "theory": evaluation,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let summary = agent.get_investigation_summary();
    println!("Investigation Summary");
    println!("{}", "=".repeat(40));
    println!("  Statements:          {}", summary.total_statements);
    println!("  Suspects interviewed: {}", summary.characters_interviewed);
    println!("  Contradictions:      {}", summary.total_contradictions);
    println!("  Patterns:            {}", summary.pattern_count);
    if !summary.unquestioned_suspects.is_empty() {
        println!("  Not yet questioned:  {}", summary.unquestioned_suspects.join(", "));
    }

    if let Some(evaluation) = evaluation {
        println!();
        print_evaluation(&evaluation);
    }

    Ok(())
}

fn print_turn(analysis: &TurnAnalysis) {
    let Some(stmt) = &analysis.statement else {
        println!("(blank response skipped)");
        println!();
        return;
    };
    println!("[{}] {}: {}", stmt.topic, stmt.character_name, stmt.content);
    for c in &analysis.new_contradictions {
        println!("  ! {} ({}, {}): {}", c.contradiction_type, c.severity, c.id, c.explanation);
    }
    for note in &analysis.observations {
        println!("  - {note}");
    }
    if let Some(top) = analysis.suggestions.first() {
        println!("  > next: {}", top.text);
    }
    println!();
}

fn print_evaluation(evaluation: &TheoryEvaluation) {
    println!(
        "Theory: {} (score {:.0}, grade {}, {})",
        evaluation.theory.suspect, evaluation.score, evaluation.grade, evaluation.verdict
    );
    for s in &evaluation.strengths {
        println!("  + {s}");
    }
    for w in &evaluation.weaknesses {
        println!("  - {w}");
    }
    for q in &evaluation.follow_up_questions {
        println!("  ? {q}");
    }
    if !evaluation.watson_notes.is_empty() {
        println!();
        println!("{}", evaluation.watson_notes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_transcript_parses() {
        let turns = parse_transcript(
            r#"[{"characterId": "thomas", "response": "I was in the library."}]"#,
        )
        .unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].character_id, "thomas");
        assert!(turns[0].question.is_none());
    }

    #[test]
    fn wrapped_transcript_parses() {
        let turns = parse_transcript(
            r#"{"turns": [
                {"characterId": "thomas", "question": "Where?", "response": "Library.", "pressure": 0.4},
                {"characterId": "james", "characterName": "James Hartley", "response": "Garden."}
            ]}"#,
        )
        .unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].pressure, Some(0.4));
        assert_eq!(turns[1].character_name.as_deref(), Some("James Hartley"));
    }

    #[test]
    fn malformed_transcript_is_an_error() {
        assert!(parse_transcript(r#"{"nope": 1}"#).is_err());
    }
}
