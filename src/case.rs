//! Case configuration: who the suspects are, what happened, and who did it.
//!
//! A [`CaseFile`] is plain data loaded from TOML so a new mystery can be played
//! without touching the heuristics. [`CaseFile::default`] is the built-in
//! "Ashford Affair" scenario.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseFile {
    pub title: String,
    pub victim: Victim,
    /// Character ID of the culprit. Never exposed through the public view.
    pub actual_killer: String,
    pub crime: CrimeScene,
    pub characters: Vec<CaseCharacter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Victim {
    pub id: String,
    pub name: String,
    /// Lowercase phrases that refer to the victim in testimony.
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrimeScene {
    pub description: String,
    /// Canonical place labels where the crime happened (e.g. `"study"`).
    pub locations: Vec<String>,
    /// Tokens that pin down the crime window (e.g. `"11:15"`).
    pub time_markers: Vec<String>,
    /// Looser references to the night of the crime.
    pub vague_time_markers: Vec<String>,
    /// All of these must appear in an opportunity text for it to describe the
    /// actual confrontation.
    pub confrontation_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseCharacter {
    pub id: String,
    pub name: String,
    pub role: String,
    /// Lowercase phrases that refer to this character in testimony.
    pub aliases: Vec<String>,
    pub motive_keywords: Vec<String>,
    /// Motive strength reached when a theory names a known motive.
    pub motive_ceiling: f64,
}

impl Default for CaseCharacter {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            role: String::new(),
            aliases: Vec::new(),
            motive_keywords: Vec::new(),
            motive_ceiling: 6.0,
        }
    }
}

impl Default for Victim {
    fn default() -> Self {
        Self {
            id: "edmund".into(),
            name: "Lord Edmund Ashford".into(),
            aliases: strings(&["edmund", "lord ashford", "his lordship", "father", "my husband"]),
        }
    }
}

impl Default for CrimeScene {
    fn default() -> Self {
        Self {
            description: "Lord Ashford was struck down in his study at a quarter past eleven."
                .into(),
            locations: strings(&["study"]),
            time_markers: strings(&["11:15", "11:00", "11:30", "11 pm", "11pm", "eleven"]),
            vague_time_markers: strings(&["that night", "late", "evening", "after dinner"]),
            confrontation_keywords: strings(&["study", "11:15"]),
        }
    }
}

impl Default for CaseFile {
    fn default() -> Self {
        Self {
            title: "The Ashford Affair".into(),
            victim: Victim::default(),
            actual_killer: "thomas".into(),
            crime: CrimeScene::default(),
            characters: vec![
                CaseCharacter {
                    id: "thomas".into(),
                    name: "Thomas Ashford".into(),
                    role: "the victim's son".into(),
                    aliases: strings(&["thomas", "tom", "master thomas"]),
                    motive_keywords: strings(&[
                        "disinherit", "inheritance", "debt", "gambling", "financial",
                        "money", "allowance",
                    ]),
                    motive_ceiling: 9.0,
                },
                CaseCharacter {
                    id: "victoria".into(),
                    name: "Victoria Ashford".into(),
                    role: "the victim's wife".into(),
                    aliases: strings(&["victoria", "lady ashford", "lady victoria"]),
                    motive_keywords: strings(&[
                        "affair", "divorce", "insurance", "jealous", "marriage",
                    ]),
                    motive_ceiling: 7.0,
                },
                CaseCharacter {
                    id: "james".into(),
                    name: "James Hartley".into(),
                    role: "the butler".into(),
                    aliases: strings(&["james", "hartley", "the butler"]),
                    motive_keywords: strings(&["dismiss", "fired", "pension", "grudge", "resent"]),
                    motive_ceiling: 6.0,
                },
                CaseCharacter {
                    id: "eleanor".into(),
                    name: "Eleanor Price".into(),
                    role: "the secretary".into(),
                    aliases: strings(&["eleanor", "miss price", "the secretary"]),
                    motive_keywords: strings(&["blackmail", "embezzle", "ledger", "fraud"]),
                    motive_ceiling: 7.0,
                },
                CaseCharacter {
                    id: "marcus".into(),
                    name: "Dr. Marcus Webb".into(),
                    role: "the family physician".into(),
                    aliases: strings(&["marcus", "dr. webb", "doctor webb", "the doctor"]),
                    motive_keywords: strings(&["loan", "partnership", "malpractice", "poison"]),
                    motive_ceiling: 6.0,
                },
            ],
        }
    }
}

/// The case as the player may see it: no culprit.
#[derive(Debug, Clone, Serialize)]
pub struct PublicCaseView<'a> {
    pub title: &'a str,
    pub victim: &'a str,
    pub crime: &'a str,
    pub suspects: Vec<PublicSuspect<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicSuspect<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub role: &'a str,
}

impl CaseFile {
    /// Load a case from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read case file {}", path.display()))?;
        let case: CaseFile = toml::from_str(&contents).context("failed to parse case TOML")?;
        info!(title = %case.title, suspects = case.characters.len(), "case loaded");
        Ok(case)
    }

    /// Load the configured case, or fall back to the built-in one.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::load(crate::config::expand_tilde(p)),
            None => Ok(Self::default()),
        }
    }

    pub fn character(&self, id: &str) -> Option<&CaseCharacter> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Display name for a character ID, falling back to the raw ID.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        if id == self.victim.id {
            return &self.victim.name;
        }
        self.character(id).map(|c| c.name.as_str()).unwrap_or(id)
    }

    pub fn is_killer(&self, id: &str) -> bool {
        !self.actual_killer.is_empty() && self.actual_killer.eq_ignore_ascii_case(id.trim())
    }

    pub fn public_view(&self) -> PublicCaseView<'_> {
        PublicCaseView {
            title: &self.title,
            victim: &self.victim.name,
            crime: &self.crime.description,
            suspects: self
                .characters
                .iter()
                .map(|c| PublicSuspect {
                    id: &c.id,
                    name: &c.name,
                    role: &c.role,
                })
                .collect(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_case_is_consistent() {
        let case = CaseFile::default();
        assert!(case.character(&case.actual_killer).is_some());
        assert_eq!(case.display_name("victoria"), "Victoria Ashford");
        assert_eq!(case.display_name("stranger"), "stranger");
        assert_eq!(case.display_name("edmund"), "Lord Edmund Ashford");
        assert!(case.is_killer("thomas"));
        assert!(!case.is_killer("james"));
    }

    #[test]
    fn public_view_hides_culprit() {
        let case = CaseFile::default();
        let json = serde_json::to_string(&case.public_view()).unwrap();
        assert!(!json.contains("actual_killer"));
        assert!(json.contains("Eleanor Price"));
    }

    #[test]
    fn parse_partial_case_toml() {
        let toml_str = r#"
title = "Murder at the Lighthouse"
actual_killer = "keeper"

[crime]
locations = ["lamp room"]

[[characters]]
id = "keeper"
name = "Old Nell"
aliases = ["nell", "the keeper"]
motive_keywords = ["salvage"]
motive_ceiling = 8.5
"#;
        let case: CaseFile = toml::from_str(toml_str).unwrap();
        assert_eq!(case.title, "Murder at the Lighthouse");
        assert_eq!(case.characters.len(), 1);
        assert_eq!(case.characters[0].motive_ceiling, 8.5);
        assert_eq!(case.crime.locations, vec!["lamp room"]);
        // unset sections keep defaults
        assert_eq!(case.victim.id, "edmund");
        assert!(!case.crime.time_markers.is_empty());
    }

    #[test]
    fn load_case_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("case.toml");
        std::fs::write(&path, "title = \"On Disk\"\nactual_killer = \"victoria\"\n").unwrap();
        let case = CaseFile::load(&path).unwrap();
        assert_eq!(case.title, "On Disk");
        assert!(case.is_killer("victoria"));
        // characters default to the built-in cast
        assert_eq!(case.characters.len(), 5);

        assert!(CaseFile::load(dir.path().join("missing.toml")).is_err());
    }
}
