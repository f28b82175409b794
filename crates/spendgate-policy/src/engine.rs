//! The policy engine: serialized access to the budget ledger
//!
//! Evaluation and commit for any agent share one mutex because the
//! cross-agent reservation rule must see every agent's remaining budget in
//! one consistent snapshot. Settlement never happens under this lock; the
//! pipeline re-enters it only to commit or release.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use spendgate_types::{
    AgentId, AgentRecord, Amount, PolicyDecision, ReservationPolicy, Result, ServiceId,
    ServiceRecord,
};

use crate::ledger::{AgentUsage, BudgetLedger};

pub use crate::ledger::Reservation;

/// Shared-state policy engine gating every paid call
///
/// Cheap to clone; all clones arbitrate over the same ledger.
#[derive(Clone)]
pub struct PolicyEngine {
    ledger: Arc<Mutex<BudgetLedger>>,
}

impl PolicyEngine {
    /// Build an engine from validated reference data
    pub fn new(
        agents: Vec<AgentRecord>,
        services: Vec<ServiceRecord>,
        reservation: ReservationPolicy,
    ) -> Result<Self> {
        let ledger = BudgetLedger::new(agents, services, reservation)?;
        Ok(Self {
            ledger: Arc::new(Mutex::new(ledger)),
        })
    }

    /// Evaluate one requested paid call
    ///
    /// For non-rejected outcomes the effective amount is reserved before the
    /// lock is dropped; the returned [`Reservation`] must be handed back via
    /// [`commit`](Self::commit) or [`release`](Self::release).
    pub async fn evaluate(
        &self,
        agent_id: &AgentId,
        service_id: &ServiceId,
        requested: Amount,
    ) -> Result<(PolicyDecision, Option<Reservation>)> {
        let mut ledger = self.ledger.lock().await;
        let (decision, reservation) = ledger.evaluate(agent_id, service_id, requested)?;
        info!(
            agent = %decision.agent_id,
            service = %decision.service_id,
            outcome = %decision.outcome,
            requested = %decision.requested_amount,
            effective = %decision.effective_amount,
            reason = %decision.reason,
            "policy decision"
        );
        Ok((decision, reservation))
    }

    /// Convert a reservation into committed spend after settlement success
    pub async fn commit(&self, reservation: Reservation) {
        let mut ledger = self.ledger.lock().await;
        if ledger.commit(&reservation.agent_id, reservation.amount) {
            debug!(
                agent = %reservation.agent_id,
                amount = %reservation.amount,
                correlation = %reservation.correlation_id,
                "spend committed"
            );
        } else {
            warn!(
                agent = %reservation.agent_id,
                amount = %reservation.amount,
                "commit for agent no longer in ledger; spend not tracked"
            );
        }
    }

    /// Return a reservation to headroom after settlement failure
    pub async fn release(&self, reservation: Reservation) {
        let mut ledger = self.ledger.lock().await;
        if !ledger.release(&reservation.agent_id, reservation.amount) {
            warn!(
                agent = %reservation.agent_id,
                amount = %reservation.amount,
                "release for agent no longer in ledger"
            );
        }
    }

    /// Zero every agent's committed spend; idempotent within one rollover
    pub async fn reset_budgets(&self) {
        let mut ledger = self.ledger.lock().await;
        ledger.reset_all(Utc::now());
        info!("daily budgets reset");
    }

    /// Replace reference data, preserving live counters for surviving agents
    pub async fn reload(
        &self,
        agents: Vec<AgentRecord>,
        services: Vec<ServiceRecord>,
    ) -> Result<()> {
        let mut ledger = self.ledger.lock().await;
        let orphaned = ledger.reload(agents, services)?;
        for agent_id in orphaned {
            warn!(%agent_id, "agent removed by reload while holding a reservation");
        }
        info!("reference data reloaded");
        Ok(())
    }

    /// Committed spend for one agent
    pub async fn agent_spend(&self, agent_id: &AgentId) -> Result<Amount> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.account(agent_id)?.committed)
    }

    /// Budget still available to one agent
    pub async fn agent_remaining(&self, agent_id: &AgentId) -> Result<Amount> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.account(agent_id)?.remaining())
    }

    /// Snapshot of every agent's budget state, sorted by agent id
    pub async fn usage(&self) -> Vec<AgentUsage> {
        let ledger = self.ledger.lock().await;
        ledger.usage()
    }
}
