//! Error types for SpendGate
//!
//! Every terminal outcome a caller can observe is explicit: configuration
//! errors, policy rejections, and settlement failures are distinct variants
//! so upstream dispatchers can react to each differently.

use thiserror::Error;

/// Result type for SpendGate operations
pub type Result<T> = std::result::Result<T, SpendgateError>;

/// SpendGate error types
#[derive(Debug, Clone, Error)]
pub enum SpendgateError {
    /// Unknown agent id
    #[error("Agent {agent_id} not found")]
    AgentNotFound { agent_id: String },

    /// Unknown service id
    #[error("Service {service_id} not found")]
    ServiceNotFound { service_id: String },

    /// Reference data failed validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The policy engine rejected the request (expected, recoverable)
    #[error("Policy rejected: {reason}")]
    PolicyRejected { reason: String },

    /// The settlement channel reported a failure
    #[error("Settlement failed: {reason}")]
    SettlementFailed { reason: String },

    /// The settlement channel did not answer within the timeout
    #[error("Settlement timed out after {timeout_ms}ms")]
    SettlementTimeout { timeout_ms: u64 },

    /// The agent's settlement balance cannot cover the transfer
    #[error("Insufficient settlement funds for {agent_id}: requested {requested}, available {available}")]
    InsufficientSettlementFunds {
        agent_id: String,
        requested: f64,
        available: f64,
    },

    /// Amount overflow during arithmetic
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,
}

impl SpendgateError {
    /// Whether this error is a policy rejection rather than a failure
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, Self::PolicyRejected { .. })
    }

    /// Whether this error came from the settlement phase
    pub fn is_settlement_error(&self) -> bool {
        matches!(
            self,
            Self::SettlementFailed { .. }
                | Self::SettlementTimeout { .. }
                | Self::InsufficientSettlementFunds { .. }
        )
    }
}
