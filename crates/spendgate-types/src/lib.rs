//! SpendGate Types - Canonical domain types for budget arbitration
//!
//! This crate contains all foundational types for SpendGate with zero
//! dependencies on other spendgate crates:
//!
//! - Identity types (AgentId, ServiceId, CorrelationId, SettlementRef)
//! - Fixed-point Amount with 6-decimal precision
//! - Agent and service reference records plus the reservation policy
//! - Policy decision and transaction records
//! - The shared error type
//!
//! # Architectural Invariants
//!
//! These types support the core SpendGate guarantees:
//!
//! 1. Spend counters are mutated only through the policy engine's
//!    evaluate-then-commit transaction
//! 2. Decisions and transactions are immutable once created and correlate
//!    through a shared CorrelationId
//! 3. A Rejected decision never has a correlated transaction

pub mod amount;
pub mod decision;
pub mod error;
pub mod identity;
pub mod record;

pub use amount::*;
pub use decision::*;
pub use error::*;
pub use identity::*;
pub use record::*;

/// Version of the SpendGate types schema
pub const TYPES_VERSION: &str = "0.1.0";
