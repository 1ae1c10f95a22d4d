//! MCP theory tool parameter definition, shared by `evaluate_theory` and
//! `quick_evaluate_theory`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::investigation::types::PlayerTheory;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EvaluateTheoryParams {
    #[schemars(description = "Character ID or name of the accused")]
    pub suspect: String,

    #[schemars(description = "Why they did it")]
    pub motive: Option<String>,

    #[schemars(description = "When and where they had the chance")]
    pub opportunity: Option<String>,

    #[schemars(description = "How it was done")]
    pub method: Option<String>,

    #[schemars(description = "IDs of statements that support the theory")]
    pub evidence: Option<Vec<String>>,

    #[schemars(description = "Optional theory ID; re-evaluating the same ID replaces the stored result")]
    pub theory_id: Option<String>,

    #[schemars(description = "Investigation session ID. Defaults to 'default'.")]
    pub session: Option<String>,
}

impl EvaluateTheoryParams {
    pub fn to_theory(&self) -> PlayerTheory {
        PlayerTheory {
            id: self.theory_id.clone(),
            suspect: self.suspect.clone(),
            motive: self.motive.clone().unwrap_or_default(),
            opportunity: self.opportunity.clone().unwrap_or_default(),
            method: self.method.clone(),
            evidence: self.evidence.clone().unwrap_or_default(),
        }
    }
}
