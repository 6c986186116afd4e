/// Result assembly
///
/// Deduplicates the final candidates in first-seen order, caps the list and
/// packages the outcome as the single JSON object the tool prints.
use serde::Serialize;
use std::collections::HashSet;

use crate::error::NicknameError;

use super::validation::NicknameValidator;

/// Maximum number of nicknames reported
pub const MAX_NICKNAMES: usize = 10;

/// Deduplicated, capped nickname list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NicknameList {
    pub nicknames: Vec<String>,
    /// Distinct nicknames before truncation
    pub total_found: usize,
}

/// Deduplicate by exact string equality, re-check validity and cap at
/// `MAX_NICKNAMES`.
///
/// # Errors
/// `EmptyResult` when nothing survives; an empty list is never a success.
pub fn assemble(
    candidates: Vec<String>,
    validator: &NicknameValidator,
) -> Result<NicknameList, NicknameError> {
    let mut seen = HashSet::new();
    let mut unique: Vec<String> = candidates
        .into_iter()
        .filter(|candidate| validator.is_valid(candidate))
        .filter(|candidate| seen.insert(candidate.clone()))
        .collect();

    if unique.is_empty() {
        return Err(NicknameError::EmptyResult);
    }

    let total_found = unique.len();
    unique.truncate(MAX_NICKNAMES);

    Ok(NicknameList {
        nicknames: unique,
        total_found,
    })
}

/// The externally observable outcome of one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NicknameReport {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nicknames: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_found: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NicknameReport {
    pub fn success(list: NicknameList) -> Self {
        Self {
            success: true,
            nicknames: Some(list.nicknames),
            total_found: Some(list.total_found),
            error: None,
        }
    }

    pub fn failure(error: &NicknameError) -> Self {
        Self {
            success: false,
            nicknames: None,
            total_found: None,
            error: Some(error.describe()),
        }
    }

    pub fn from_outcome(outcome: Result<NicknameList, NicknameError>) -> Self {
        match outcome {
            Ok(list) => Self::success(list),
            Err(e) => Self::failure(&e),
        }
    }

    /// Serialize as one line of JSON with non-ASCII left unescaped
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"success":false,"error":"failed to serialize result: {}"}}"#,
                e.to_string().replace('"', "'")
            )
        })
    }
}
