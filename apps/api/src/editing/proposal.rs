//! Edit proposals and the validation of raw generator output into them.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::editing::prompts::system_prompt;
use crate::errors::AppError;
use crate::llm_client::TextGenerator;

pub const DEFAULT_RATIONALE: &str = "No rationale provided";

/// An unapplied, AI-generated patch set. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProposal {
    /// RFC 6902 operations, unvalidated against the document.
    pub patches: Vec<Value>,
    pub rationale: String,
    pub warnings: Vec<String>,
    /// Set when `patches` paths are relative to a section or entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

/// Ways the generator's reply can break the `{patches, rationale, warnings}` contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalParseError {
    #[error("reply is not a JSON object")]
    NotAnObject,
    #[error("reply is missing 'patches'")]
    MissingPatches,
    #[error("'patches' is not an array")]
    PatchesNotArray,
    #[error("'rationale' is not a string")]
    RationaleNotString,
    #[error("'warnings' is not an array")]
    WarningsNotArray,
    #[error("warning {0} is not a string")]
    WarningNotString(usize),
}

/// Validates the shape of a generator reply. Patch semantics are not checked here.
pub fn parse_proposal(reply: Value) -> Result<EditProposal, ProposalParseError> {
    let Value::Object(mut obj) = reply else {
        return Err(ProposalParseError::NotAnObject);
    };

    let patches = match obj.remove("patches") {
        None | Some(Value::Null) => return Err(ProposalParseError::MissingPatches),
        Some(Value::Array(patches)) => patches,
        Some(_) => return Err(ProposalParseError::PatchesNotArray),
    };

    let rationale = match obj.remove("rationale") {
        None | Some(Value::Null) => DEFAULT_RATIONALE.to_string(),
        Some(Value::String(s)) => s,
        Some(_) => return Err(ProposalParseError::RationaleNotString),
    };

    let warnings = match obj.remove("warnings") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, w)| match w {
                Value::String(s) => Ok(s),
                _ => Err(ProposalParseError::WarningNotString(i)),
            })
            .collect::<Result<Vec<String>, _>>()?,
        Some(_) => return Err(ProposalParseError::WarningsNotArray),
    };

    Ok(EditProposal {
        patches,
        rationale,
        warnings,
        base_path: None,
    })
}

/// Sends one prompt and turns the reply into a proposal.
/// Every failure collapses into `AppError::AiEditingFailed`; there are no retries.
pub async fn request_proposal(
    llm: &dyn TextGenerator,
    prompt: &str,
) -> Result<EditProposal, AppError> {
    let reply = llm
        .generate_json(&system_prompt(), prompt)
        .await
        .map_err(|e| AppError::AiEditingFailed(e.to_string()))?;

    let proposal = parse_proposal(reply).map_err(|e| {
        warn!("Generator reply violated the proposal contract: {e}");
        AppError::AiEditingFailed(e.to_string())
    })?;

    info!(
        "Received proposal with {} patches and {} warnings",
        proposal.patches.len(),
        proposal.warnings.len()
    );
    Ok(proposal)
}
