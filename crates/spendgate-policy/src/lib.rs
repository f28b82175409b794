//! SpendGate Policy - Budget arbitration engine
//!
//! The policy engine holds agent and service reference data plus live
//! per-agent spend counters, and evaluates every requested paid call into an
//! outcome (allowed / downgraded / rejected).
//!
//! # Invariants
//!
//! 1. Committed spend never exceeds an agent's daily budget
//! 2. Evaluation and commit execute as one atomic transaction relative to
//!    every other evaluation or commit: evaluation *reserves* the effective
//!    amount inside the same critical section that computed the decision
//! 3. The cross-agent reservation rule sees a globally consistent view of
//!    all agents' remaining budgets, so the ledger is a single serialization
//!    point rather than per-agent shards
//! 4. Spend counters are never exposed for direct mutation

mod engine;
mod ledger;

pub use engine::{PolicyEngine, Reservation};
pub use ledger::AgentUsage;
