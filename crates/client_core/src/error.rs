use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryOperation {
    Create,
    Accept,
    Decline,
    Finalize,
    AssociateTicket,
}

impl fmt::Display for RegistryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistryOperation::Create => "create",
            RegistryOperation::Accept => "accept",
            RegistryOperation::Decline => "decline",
            RegistryOperation::Finalize => "finalize",
            RegistryOperation::AssociateTicket => "associate-ticket",
        };
        f.write_str(name)
    }
}

/// Any failure reported by the call registry, whatever the transport said.
#[derive(Debug, Error)]
#[error("call registry {operation} failed: {source}")]
pub struct RegistryOperationFailed {
    pub operation: RegistryOperation,
    #[source]
    pub source: anyhow::Error,
}

impl RegistryOperationFailed {
    pub fn new(operation: RegistryOperation, source: anyhow::Error) -> Self {
        Self { operation, source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("operator id must be positive, got {0}")]
    InvalidOperator(i64),
    #[error("min delay {min_ms}ms exceeds max delay {max_ms}ms")]
    InvertedDelayRange { min_ms: u128, max_ms: u128 },
}
