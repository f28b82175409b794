//! Policy decision and transaction records
//!
//! Both record kinds are immutable once created and correlate through the
//! request's [`CorrelationId`]. A transaction exists only for decisions that
//! were not rejected, and only once settlement has been attempted.

use crate::{AgentId, Amount, CorrelationId, ServiceId, SettlementRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitration outcome for one requested paid call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyOutcome {
    /// The request proceeds at the requested amount
    Allowed,
    /// The request proceeds at a reduced amount
    Downgraded,
    /// The request does not proceed
    Rejected,
}

impl fmt::Display for PolicyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allowed => write!(f, "ALLOWED"),
            Self::Downgraded => write!(f, "DOWNGRADED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// The arbitration record for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
    /// Request correlation id
    pub correlation_id: CorrelationId,
    /// Requesting agent
    pub agent_id: AgentId,
    /// Requested service
    pub service_id: ServiceId,
    /// Amount the caller asked to spend
    pub requested_amount: Amount,
    /// Arbitration outcome
    pub outcome: PolicyOutcome,
    /// Amount actually authorized (zero when rejected)
    pub effective_amount: Amount,
    /// Human-readable reason
    pub reason: String,
}

impl PolicyDecision {
    /// Whether the request was rejected
    pub fn is_rejected(&self) -> bool {
        self.outcome == PolicyOutcome::Rejected
    }
}

/// Status of one settlement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// The transfer settled
    Success,
    /// The transfer failed or timed out
    Failed,
    /// The transfer settled on a deterministic stand-in channel
    Mock,
}

impl TransactionStatus {
    /// Whether the settlement attempt moved money (mock channels count)
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success | Self::Mock)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
            Self::Mock => write!(f, "MOCK"),
        }
    }
}

/// The money-movement record for one settlement attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// When the attempt concluded
    pub timestamp: DateTime<Utc>,
    /// Request correlation id
    pub correlation_id: CorrelationId,
    /// Paying agent
    pub agent_id: AgentId,
    /// Paid service
    pub service_id: ServiceId,
    /// Amount of the attempted transfer
    pub amount: Amount,
    /// Outcome of the attempt
    pub status: TransactionStatus,
    /// Channel reference (absent when the attempt failed)
    pub settlement_ref: Option<SettlementRef>,
    /// Hash binding this record to the gated invocation
    pub call_hash: String,
}

impl TransactionRecord {
    /// Whether this record represents settled money movement
    pub fn is_settled(&self) -> bool {
        self.status.is_settled()
    }
}
