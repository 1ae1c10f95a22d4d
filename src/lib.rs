//! Watson: the analysis core of a murder-mystery investigation.
//!
//! Watson listens to a player interrogating suspects. Every answer is turned
//! into a structured statement, compared against what the other suspects have
//! said, and folded into a running picture of the case: contradictions,
//! suspicion patterns, a reconstructed timeline and suggestions for what to
//! ask next. When the player names a culprit, Watson scores the accusation.
//!
//! Semantic judgment (does statement A really contradict statement B?) is
//! delegated to an [`oracle::Oracle`], normally a hosted LLM. Everything else
//! is deterministic and rule-based, and the engine keeps working when the
//! oracle is slow, broken or switched off.
//!
//! # Architecture
//!
//! - **Extraction**: declarative regex tables classify topic, claims, mood and
//!   entities
//! - **Contradictions**: relevance shortlist, then oracle judgment, then
//!   dedup and pattern detection
//! - **Theories**: five sub-scores combined into a 0-100 score and a grade
//! - **Transport**: MCP over stdio, one investigation per session id
//!
//! # Modules
//!
//! - [`agent`]: turn orchestration and the session registry
//! - [`case`]: case configuration (suspects, victim, culprit)
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`investigation`]: extraction, profiles, contradictions, patterns,
//!   timeline, suggestions and theory scoring
//! - [`oracle`]: the semantic-judgment capability and its HTTP client
//! - [`server`] / [`tools`]: the MCP surface

pub mod agent;
pub mod case;
pub mod config;
pub mod investigation;
pub mod oracle;
pub mod server;
pub mod tools;
