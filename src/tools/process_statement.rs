//! MCP `process_statement` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProcessStatementParams {
    #[schemars(description = "ID of the character who answered, e.g. 'thomas'")]
    pub character_id: String,

    #[schemars(description = "Display name of the character. Looked up from the case when omitted.")]
    pub character_name: Option<String>,

    #[schemars(description = "The character's answer, verbatim")]
    pub response: String,

    #[schemars(description = "The question the player asked")]
    pub question: Option<String>,

    #[schemars(description = "How hard the player pressed, 0.0-1.0")]
    pub pressure: Option<f64>,

    #[schemars(description = "Investigation session ID. Defaults to 'default'.")]
    pub session: Option<String>,
}
