//! Typed failures the CLI maps to stable exit codes.
//!
//! Everything else travels as a contextual [`anyhow::Error`]; these variants
//! are the conditions a caller is expected to act on.

use thiserror::Error;

use crate::core::types::Platform;
use crate::exit_codes;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("test case has no title (add a `Title:` line or a leading heading)")]
    MissingTitle,

    #[error("missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    #[error("automation endpoint {endpoint} is unreachable: {reason}")]
    EndpointUnreachable { endpoint: String, reason: String },

    #[error("no online {platform} device: {detail}")]
    NoDevice { platform: Platform, detail: String },

    #[error("generation response violated the artifact contract: {reason}\n--- response excerpt ---\n{excerpt}")]
    ContractViolation { reason: String, excerpt: String },
}

impl ScaffoldError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ScaffoldError::MissingTitle
            | ScaffoldError::MissingCredential { .. }
            | ScaffoldError::EndpointUnreachable { .. }
            | ScaffoldError::NoDevice { .. } => exit_codes::PRECONDITION,
            ScaffoldError::ContractViolation { .. } => exit_codes::CONTRACT,
        }
    }
}

/// Exit code for an error chain: the first [`ScaffoldError`] found decides,
/// anything else is a generic failure.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ScaffoldError>())
        .map_or(exit_codes::FAILED, ScaffoldError::exit_code)
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn wrapped_scaffold_error_keeps_its_exit_code() {
        let err = Err::<(), _>(ScaffoldError::MissingTitle)
            .context("parse tests/login.md")
            .unwrap_err();
        assert_eq!(exit_code_for(&err), exit_codes::PRECONDITION);
    }

    #[test]
    fn contract_violation_maps_to_contract_code() {
        let err = anyhow::Error::new(ScaffoldError::ContractViolation {
            reason: "missing pagePath".to_string(),
            excerpt: "{}".to_string(),
        });
        assert_eq!(exit_code_for(&err), exit_codes::CONTRACT);
    }

    #[test]
    fn plain_errors_are_generic_failures() {
        let err = anyhow::anyhow!("disk full");
        assert_eq!(exit_code_for(&err), exit_codes::FAILED);
    }
}
