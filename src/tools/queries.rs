//! Parameter definitions for the read-only and reset tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for tools that only need a session.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SessionParams {
    #[schemars(description = "Investigation session ID. Defaults to 'default'.")]
    pub session: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ContradictionsParams {
    #[schemars(description = "Only contradictions involving this character ID")]
    pub character_id: Option<String>,

    #[schemars(description = "Investigation session ID. Defaults to 'default'.")]
    pub session: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SuspectSummaryParams {
    #[schemars(description = "Character ID of the suspect")]
    pub character_id: String,

    #[schemars(description = "Investigation session ID. Defaults to 'default'.")]
    pub session: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatementsParams {
    #[schemars(description = "Only statements by this character ID")]
    pub character_id: Option<String>,

    #[schemars(description = "Return at most this many of the most recent statements")]
    pub limit: Option<usize>,

    #[schemars(description = "Investigation session ID. Defaults to 'default'.")]
    pub session: Option<String>,
}
