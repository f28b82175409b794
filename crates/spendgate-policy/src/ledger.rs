//! Per-agent budget ledger
//!
//! The ledger is the only place spend counters live. Every mutation happens
//! through [`crate::PolicyEngine`], which serializes access; the ledger
//! itself is plain synchronous state so the arbitration rules stay easy to
//! test in isolation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spendgate_types::{
    AgentId, AgentRecord, Amount, CorrelationId, PolicyDecision, PolicyOutcome, Priority,
    ReservationPolicy, Result, ServiceId, ServiceRecord, SpendgateError,
};

/// Claim on an agent's budget held while a settlement attempt is in flight
///
/// A reservation is handed out by evaluation and must be consumed by exactly
/// one of commit or release. It is deliberately neither `Clone` nor `Copy`:
/// consuming it by value is what makes double-commit unrepresentable.
#[must_use = "a reservation must be committed or released"]
#[derive(Debug)]
pub struct Reservation {
    pub(crate) correlation_id: CorrelationId,
    pub(crate) agent_id: AgentId,
    pub(crate) amount: Amount,
}

impl Reservation {
    /// Request this reservation belongs to
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Agent whose budget is reserved
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Reserved amount
    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// Live budget state for one agent
#[derive(Debug, Clone)]
pub(crate) struct AgentAccount {
    pub(crate) record: AgentRecord,
    pub(crate) committed: Amount,
    pub(crate) reserved: Amount,
    pub(crate) last_reset: DateTime<Utc>,
}

impl AgentAccount {
    fn new(record: AgentRecord, now: DateTime<Utc>) -> Self {
        Self {
            record,
            committed: Amount::zero(),
            reserved: Amount::zero(),
            last_reset: now,
        }
    }

    /// Budget still available to new requests
    pub(crate) fn remaining(&self) -> Amount {
        self.record
            .daily_budget
            .saturating_sub(self.committed)
            .saturating_sub(self.reserved)
    }
}

/// Read-only snapshot of one agent's budget state for reporting surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentUsage {
    pub agent_id: AgentId,
    pub priority: Priority,
    pub daily_budget: Amount,
    pub committed: Amount,
    pub reserved: Amount,
    pub remaining: Amount,
    pub last_reset: DateTime<Utc>,
}

/// The budget ledger: all accounts, service reference data, and the
/// reservation policy, behind one serialization point.
#[derive(Debug)]
pub(crate) struct BudgetLedger {
    accounts: HashMap<AgentId, AgentAccount>,
    services: HashMap<ServiceId, ServiceRecord>,
    reservation: ReservationPolicy,
}

impl BudgetLedger {
    pub(crate) fn new(
        agents: Vec<AgentRecord>,
        services: Vec<ServiceRecord>,
        reservation: ReservationPolicy,
    ) -> Result<Self> {
        reservation.validate()?;
        let now = Utc::now();
        let mut ledger = Self {
            accounts: HashMap::new(),
            services: HashMap::new(),
            reservation,
        };
        ledger.install(agents, services, now)?;
        Ok(ledger)
    }

    fn install(
        &mut self,
        agents: Vec<AgentRecord>,
        services: Vec<ServiceRecord>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        for agent in &agents {
            agent.validate()?;
        }
        for service in &services {
            service.validate()?;
        }
        self.accounts = agents
            .into_iter()
            .map(|record| (record.id.clone(), AgentAccount::new(record, now)))
            .collect();
        self.services = services
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Ok(())
    }

    /// Evaluate one request and, for non-rejected outcomes, reserve the
    /// effective amount. Both happen under the caller's single lock hold.
    pub(crate) fn evaluate(
        &mut self,
        agent_id: &AgentId,
        service_id: &ServiceId,
        requested: Amount,
    ) -> Result<(PolicyDecision, Option<Reservation>)> {
        let account = self
            .accounts
            .get(agent_id)
            .ok_or_else(|| SpendgateError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })?;
        let service = self
            .services
            .get(service_id)
            .ok_or_else(|| SpendgateError::ServiceNotFound {
                service_id: service_id.to_string(),
            })?;

        let correlation_id = CorrelationId::new();
        let record = &account.record;
        let remaining = account.remaining();

        if !service.active {
            return Ok((
                rejected(
                    correlation_id,
                    agent_id,
                    service_id,
                    requested,
                    format!("service {service_id} is inactive"),
                ),
                None,
            ));
        }

        if !requested.is_positive() {
            return Ok((
                rejected(
                    correlation_id,
                    agent_id,
                    service_id,
                    requested,
                    "requested amount must be positive".to_string(),
                ),
                None,
            ));
        }

        let (outcome, effective, reason) = if requested > record.per_call_max {
            let downgrade = service
                .downgrade_price
                .filter(|_| service.supports_downgrade)
                .map(|price| record.per_call_max.min(price));
            match downgrade {
                Some(downgrade) if downgrade <= remaining => (
                    PolicyOutcome::Downgraded,
                    downgrade,
                    format!(
                        "requested {requested} exceeds per-call max {}; downgraded to {downgrade}",
                        record.per_call_max
                    ),
                ),
                _ => {
                    return Ok((
                        rejected(
                            correlation_id,
                            agent_id,
                            service_id,
                            requested,
                            "exceeds per-call max, no affordable downgrade".to_string(),
                        ),
                        None,
                    ));
                }
            }
        } else if requested > remaining {
            return Ok((
                rejected(
                    correlation_id,
                    agent_id,
                    service_id,
                    requested,
                    "insufficient daily budget".to_string(),
                ),
                None,
            ));
        } else if record.priority == Priority::Low && self.violates_reservation(requested) {
            return Ok((
                rejected(
                    correlation_id,
                    agent_id,
                    service_id,
                    requested,
                    "reserved for higher-priority interactive traffic".to_string(),
                ),
                None,
            ));
        } else {
            (PolicyOutcome::Allowed, requested, "approved".to_string())
        };

        let account = self
            .accounts
            .get_mut(agent_id)
            .ok_or_else(|| SpendgateError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })?;
        account.reserved = account.reserved.checked_add(effective)?;

        let decision = PolicyDecision {
            timestamp: Utc::now(),
            correlation_id,
            agent_id: agent_id.clone(),
            service_id: service_id.clone(),
            requested_amount: requested,
            outcome,
            effective_amount: effective,
            reason,
        };
        let reservation = Reservation {
            correlation_id,
            agent_id: agent_id.clone(),
            amount: effective,
        };
        Ok((decision, Some(reservation)))
    }

    /// System-wide headroom check protecting high-priority budget.
    ///
    /// Floor = `reserve_bps` of the sum of high-priority daily budgets;
    /// headroom = sum of all agents' remaining budgets.
    fn violates_reservation(&self, amount: Amount) -> bool {
        if !self.reservation.is_enabled() {
            return false;
        }
        let mut protected_base = Amount::zero();
        let mut headroom = Amount::zero();
        for account in self.accounts.values() {
            if account.record.priority == Priority::High {
                protected_base = match protected_base.checked_add(account.record.daily_budget) {
                    Ok(sum) => sum,
                    Err(_) => return true,
                };
            }
            headroom = match headroom.checked_add(account.remaining()) {
                Ok(sum) => sum,
                Err(_) => return true,
            };
        }
        let floor = protected_base.fraction_bps(self.reservation.reserve_bps);
        if floor.is_zero() {
            return false;
        }
        headroom.saturating_sub(amount) < floor
    }

    /// Convert a reservation into committed spend. Returns false when the
    /// agent vanished from the ledger (removed by a reload mid-flight).
    pub(crate) fn commit(&mut self, agent_id: &AgentId, amount: Amount) -> bool {
        match self.accounts.get_mut(agent_id) {
            Some(account) => {
                account.reserved = account.reserved.saturating_sub(amount);
                // reservation guaranteed headroom, so this cannot pass the budget
                account.committed = account
                    .committed
                    .checked_add(amount)
                    .unwrap_or(account.record.daily_budget);
                true
            }
            None => false,
        }
    }

    /// Return a reservation to headroom after a failed settlement.
    pub(crate) fn release(&mut self, agent_id: &AgentId, amount: Amount) -> bool {
        match self.accounts.get_mut(agent_id) {
            Some(account) => {
                account.reserved = account.reserved.saturating_sub(amount);
                true
            }
            None => false,
        }
    }

    /// Zero committed spend for every agent. In-flight reservations stay.
    pub(crate) fn reset_all(&mut self, now: DateTime<Utc>) {
        for account in self.accounts.values_mut() {
            account.committed = Amount::zero();
            account.last_reset = now;
        }
    }

    /// Replace reference data, preserving live counters for surviving agents.
    /// Returns the ids dropped while still holding reservations.
    pub(crate) fn reload(
        &mut self,
        agents: Vec<AgentRecord>,
        services: Vec<ServiceRecord>,
    ) -> Result<Vec<AgentId>> {
        for agent in &agents {
            agent.validate()?;
        }
        for service in &services {
            service.validate()?;
        }

        let now = Utc::now();
        let mut old_accounts = std::mem::take(&mut self.accounts);
        self.accounts = agents
            .into_iter()
            .map(|record| {
                let account = match old_accounts.remove(&record.id) {
                    Some(mut existing) => {
                        existing.record = record.clone();
                        existing
                    }
                    None => AgentAccount::new(record.clone(), now),
                };
                (record.id, account)
            })
            .collect();
        self.services = services
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();

        let orphaned = old_accounts
            .into_iter()
            .filter(|(_, account)| account.reserved.is_positive())
            .map(|(id, _)| id)
            .collect();
        Ok(orphaned)
    }

    pub(crate) fn account(&self, agent_id: &AgentId) -> Result<&AgentAccount> {
        self.accounts
            .get(agent_id)
            .ok_or_else(|| SpendgateError::AgentNotFound {
                agent_id: agent_id.to_string(),
            })
    }

    pub(crate) fn usage(&self) -> Vec<AgentUsage> {
        let mut rows: Vec<AgentUsage> = self
            .accounts
            .values()
            .map(|account| AgentUsage {
                agent_id: account.record.id.clone(),
                priority: account.record.priority,
                daily_budget: account.record.daily_budget,
                committed: account.committed,
                reserved: account.reserved,
                remaining: account.remaining(),
                last_reset: account.last_reset,
            })
            .collect();
        rows.sort_by(|a, b| a.agent_id.as_str().cmp(b.agent_id.as_str()));
        rows
    }
}

fn rejected(
    correlation_id: CorrelationId,
    agent_id: &AgentId,
    service_id: &ServiceId,
    requested: Amount,
    reason: String,
) -> PolicyDecision {
    PolicyDecision {
        timestamp: Utc::now(),
        correlation_id,
        agent_id: agent_id.clone(),
        service_id: service_id.clone(),
        requested_amount: requested,
        outcome: PolicyOutcome::Rejected,
        effective_amount: Amount::zero(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, budget: f64, per_call: f64, priority: Priority) -> AgentRecord {
        AgentRecord::new(
            id,
            Amount::from_human(budget),
            Amount::from_human(per_call),
            priority,
        )
    }

    fn service(id: &str, base: f64) -> ServiceRecord {
        ServiceRecord::new(
            id,
            Amount::from_human(base),
            Amount::from_human(base / 10.0),
            Priority::Normal,
        )
    }

    fn ledger(agents: Vec<AgentRecord>, services: Vec<ServiceRecord>) -> BudgetLedger {
        BudgetLedger::new(agents, services, ReservationPolicy::disabled()).unwrap()
    }

    #[test]
    fn within_budget_request_is_allowed_at_requested_amount() {
        let mut ledger = ledger(
            vec![agent("user-agent", 5.0, 2.0, Priority::Normal)],
            vec![service("price_oracle", 1.0)],
        );

        let (decision, reservation) = ledger
            .evaluate(
                &AgentId::new("user-agent"),
                &ServiceId::new("price_oracle"),
                Amount::from_human(1.0),
            )
            .unwrap();

        assert_eq!(decision.outcome, PolicyOutcome::Allowed);
        assert_eq!(decision.effective_amount, Amount::from_human(1.0));
        assert_eq!(reservation.unwrap().amount(), Amount::from_human(1.0));
    }

    #[test]
    fn over_cap_request_downgrades_when_affordable() {
        let mut ledger = ledger(
            vec![agent("user-agent", 5.0, 2.0, Priority::Normal)],
            vec![service("imagegen", 3.0).with_downgrade(Amount::from_human(1.5))],
        );

        let (decision, reservation) = ledger
            .evaluate(
                &AgentId::new("user-agent"),
                &ServiceId::new("imagegen"),
                Amount::from_human(3.0),
            )
            .unwrap();

        assert_eq!(decision.outcome, PolicyOutcome::Downgraded);
        assert_eq!(decision.effective_amount, Amount::from_human(1.5));
        assert!(reservation.is_some());
    }

    #[test]
    fn downgrade_amount_is_clamped_to_per_call_max() {
        let mut ledger = ledger(
            vec![agent("user-agent", 5.0, 1.0, Priority::Normal)],
            vec![service("imagegen", 3.0).with_downgrade(Amount::from_human(1.5))],
        );

        let (decision, _) = ledger
            .evaluate(
                &AgentId::new("user-agent"),
                &ServiceId::new("imagegen"),
                Amount::from_human(3.0),
            )
            .unwrap();

        assert_eq!(decision.outcome, PolicyOutcome::Downgraded);
        assert_eq!(decision.effective_amount, Amount::from_human(1.0));
    }

    #[test]
    fn over_cap_without_downgrade_is_rejected() {
        let mut ledger = ledger(
            vec![agent("batch-agent", 5.0, 2.0, Priority::Low)],
            vec![service("batch_compute", 3.0)],
        );

        let (decision, reservation) = ledger
            .evaluate(
                &AgentId::new("batch-agent"),
                &ServiceId::new("batch_compute"),
                Amount::from_human(3.0),
            )
            .unwrap();

        assert_eq!(decision.outcome, PolicyOutcome::Rejected);
        assert_eq!(decision.reason, "exceeds per-call max, no affordable downgrade");
        assert_eq!(decision.effective_amount, Amount::zero());
        assert!(reservation.is_none());
    }

    #[test]
    fn insufficient_budget_rejects_and_leaves_remaining_unchanged() {
        let mut ledger = ledger(
            vec![agent("user-agent", 0.05, 0.05, Priority::Normal)],
            vec![service("log_archive", 0.05)],
        );
        let id = AgentId::new("user-agent");
        let svc = ServiceId::new("log_archive");

        // Burn 0.03 of the budget first.
        let (_, reservation) = ledger.evaluate(&id, &svc, Amount::from_human(0.03)).unwrap();
        ledger.commit(&id, reservation.unwrap().amount);

        let (decision, _) = ledger.evaluate(&id, &svc, Amount::from_human(0.05)).unwrap();
        assert_eq!(decision.outcome, PolicyOutcome::Rejected);
        assert_eq!(decision.reason, "insufficient daily budget");
        assert_eq!(ledger.account(&id).unwrap().remaining(), Amount::from_human(0.02));
    }

    #[test]
    fn reservation_blocks_second_concurrent_overcommit() {
        // Two requests of 3.0 against a 5.0 budget: the first reserves,
        // the second must reject even before the first commits.
        let mut ledger = ledger(
            vec![agent("user-agent", 5.0, 3.0, Priority::Normal)],
            vec![service("imagegen", 3.0)],
        );
        let id = AgentId::new("user-agent");
        let svc = ServiceId::new("imagegen");

        let (first, reservation) = ledger.evaluate(&id, &svc, Amount::from_human(3.0)).unwrap();
        assert_eq!(first.outcome, PolicyOutcome::Allowed);
        let reservation = reservation.unwrap();

        let (second, _) = ledger.evaluate(&id, &svc, Amount::from_human(3.0)).unwrap();
        assert_eq!(second.outcome, PolicyOutcome::Rejected);

        ledger.commit(&id, reservation.amount);
        assert_eq!(ledger.account(&id).unwrap().committed, Amount::from_human(3.0));
        assert_eq!(ledger.account(&id).unwrap().reserved, Amount::zero());
    }

    #[test]
    fn released_reservation_returns_headroom() {
        let mut ledger = ledger(
            vec![agent("user-agent", 5.0, 3.0, Priority::Normal)],
            vec![service("imagegen", 3.0)],
        );
        let id = AgentId::new("user-agent");
        let svc = ServiceId::new("imagegen");

        let (_, reservation) = ledger.evaluate(&id, &svc, Amount::from_human(3.0)).unwrap();
        ledger.release(&id, reservation.unwrap().amount);

        let (decision, _) = ledger.evaluate(&id, &svc, Amount::from_human(3.0)).unwrap();
        assert_eq!(decision.outcome, PolicyOutcome::Allowed);
    }

    #[test]
    fn low_priority_request_hits_reservation_floor() {
        // Floor = 50% of the high agent's 10.0 budget = 5.0. After the high
        // agent consumes 8.0, system headroom is 2.0 + 4.0 = 6.0; a low
        // request of 2.0 would leave 4.0 < 5.0 and must be rejected, while
        // a request of 1.0 leaves exactly the floor and passes.
        let mut ledger = BudgetLedger::new(
            vec![
                agent("user-agent", 10.0, 10.0, Priority::High),
                agent("batch-agent", 4.0, 4.0, Priority::Low),
            ],
            vec![service("batch_compute", 8.0)],
            ReservationPolicy::protecting_bps(5_000),
        )
        .unwrap();
        let high = AgentId::new("user-agent");
        let batch = AgentId::new("batch-agent");
        let svc = ServiceId::new("batch_compute");

        let (d1, r1) = ledger.evaluate(&high, &svc, Amount::from_human(8.0)).unwrap();
        assert_eq!(d1.outcome, PolicyOutcome::Allowed);
        ledger.commit(&high, r1.unwrap().amount);

        let (d2, _) = ledger.evaluate(&batch, &svc, Amount::from_human(2.0)).unwrap();
        assert_eq!(d2.outcome, PolicyOutcome::Rejected);
        assert_eq!(d2.reason, "reserved for higher-priority interactive traffic");

        let (d3, _) = ledger.evaluate(&batch, &svc, Amount::from_human(1.0)).unwrap();
        assert_eq!(d3.outcome, PolicyOutcome::Allowed);
    }

    #[test]
    fn high_priority_request_ignores_reservation_floor() {
        let mut ledger = BudgetLedger::new(
            vec![agent("user-agent", 10.0, 10.0, Priority::High)],
            vec![service("imagegen", 10.0)],
            ReservationPolicy::protecting_bps(5_000),
        )
        .unwrap();

        let (decision, _) = ledger
            .evaluate(
                &AgentId::new("user-agent"),
                &ServiceId::new("imagegen"),
                Amount::from_human(10.0),
            )
            .unwrap();
        assert_eq!(decision.outcome, PolicyOutcome::Allowed);
    }

    #[test]
    fn inactive_service_is_rejected_not_missing() {
        let mut svc = service("log_archive", 1.0);
        svc.active = false;
        let mut ledger = ledger(vec![agent("user-agent", 5.0, 2.0, Priority::Normal)], vec![svc]);

        let (decision, reservation) = ledger
            .evaluate(
                &AgentId::new("user-agent"),
                &ServiceId::new("log_archive"),
                Amount::from_human(1.0),
            )
            .unwrap();
        assert_eq!(decision.outcome, PolicyOutcome::Rejected);
        assert!(decision.reason.contains("inactive"));
        assert!(reservation.is_none());
    }

    #[test]
    fn unknown_ids_surface_as_errors_not_decisions() {
        let mut ledger = ledger(
            vec![agent("user-agent", 5.0, 2.0, Priority::Normal)],
            vec![service("imagegen", 1.0)],
        );

        let missing_agent = ledger.evaluate(
            &AgentId::new("ghost"),
            &ServiceId::new("imagegen"),
            Amount::from_human(1.0),
        );
        assert!(matches!(missing_agent, Err(SpendgateError::AgentNotFound { .. })));

        let missing_service = ledger.evaluate(
            &AgentId::new("user-agent"),
            &ServiceId::new("ghost"),
            Amount::from_human(1.0),
        );
        assert!(matches!(missing_service, Err(SpendgateError::ServiceNotFound { .. })));
    }

    #[test]
    fn reset_restores_full_budget_and_is_idempotent() {
        let mut ledger = ledger(
            vec![agent("user-agent", 5.0, 2.0, Priority::Normal)],
            vec![service("imagegen", 1.0)],
        );
        let id = AgentId::new("user-agent");
        let svc = ServiceId::new("imagegen");

        let (_, r) = ledger.evaluate(&id, &svc, Amount::from_human(2.0)).unwrap();
        ledger.commit(&id, r.unwrap().amount);
        assert_eq!(ledger.account(&id).unwrap().remaining(), Amount::from_human(3.0));

        let now = Utc::now();
        ledger.reset_all(now);
        ledger.reset_all(now);
        assert_eq!(ledger.account(&id).unwrap().committed, Amount::zero());
        assert_eq!(ledger.account(&id).unwrap().remaining(), Amount::from_human(5.0));
    }

    #[test]
    fn reload_preserves_live_counters_for_surviving_agents() {
        let mut ledger = ledger(
            vec![
                agent("user-agent", 5.0, 2.0, Priority::Normal),
                agent("ops-agent", 3.0, 1.0, Priority::Normal),
            ],
            vec![service("imagegen", 1.0)],
        );
        let id = AgentId::new("user-agent");
        let svc = ServiceId::new("imagegen");

        let (_, r) = ledger.evaluate(&id, &svc, Amount::from_human(2.0)).unwrap();
        ledger.commit(&id, r.unwrap().amount);

        let orphaned = ledger
            .reload(
                vec![
                    agent("user-agent", 10.0, 2.0, Priority::Normal),
                    agent("batch-agent", 8.0, 4.0, Priority::Low),
                ],
                vec![service("imagegen", 1.0)],
            )
            .unwrap();
        assert!(orphaned.is_empty());

        let account = ledger.account(&id).unwrap();
        assert_eq!(account.committed, Amount::from_human(2.0));
        assert_eq!(account.remaining(), Amount::from_human(8.0));
        assert!(ledger.account(&AgentId::new("ops-agent")).is_err());
        assert_eq!(
            ledger.account(&AgentId::new("batch-agent")).unwrap().remaining(),
            Amount::from_human(8.0)
        );
    }

    #[test]
    fn reload_reports_agents_dropped_with_live_reservations() {
        let mut ledger = ledger(
            vec![agent("user-agent", 5.0, 2.0, Priority::Normal)],
            vec![service("imagegen", 1.0)],
        );
        let id = AgentId::new("user-agent");
        let _reservation = ledger
            .evaluate(&id, &ServiceId::new("imagegen"), Amount::from_human(1.0))
            .unwrap()
            .1
            .unwrap();

        let orphaned = ledger
            .reload(
                vec![agent("batch-agent", 8.0, 4.0, Priority::Low)],
                vec![service("imagegen", 1.0)],
            )
            .unwrap();
        assert_eq!(orphaned, vec![id]);
    }

    #[test]
    fn non_positive_requests_are_rejected() {
        let mut ledger = ledger(
            vec![agent("user-agent", 5.0, 2.0, Priority::Normal)],
            vec![service("imagegen", 1.0)],
        );

        let (decision, reservation) = ledger
            .evaluate(
                &AgentId::new("user-agent"),
                &ServiceId::new("imagegen"),
                Amount::zero(),
            )
            .unwrap();
        assert_eq!(decision.outcome, PolicyOutcome::Rejected);
        assert!(reservation.is_none());
    }

    #[test]
    fn usage_snapshot_is_sorted_and_consistent() {
        let mut ledger = ledger(
            vec![
                agent("zeta", 5.0, 2.0, Priority::Normal),
                agent("alpha", 3.0, 1.0, Priority::High),
            ],
            vec![service("imagegen", 1.0)],
        );
        let (_, r) = ledger
            .evaluate(&AgentId::new("zeta"), &ServiceId::new("imagegen"), Amount::from_human(1.0))
            .unwrap();
        let r = r.unwrap();

        let rows = ledger.usage();
        assert_eq!(rows[0].agent_id, AgentId::new("alpha"));
        assert_eq!(rows[1].agent_id, AgentId::new("zeta"));
        assert_eq!(rows[1].reserved, Amount::from_human(1.0));
        assert_eq!(rows[1].remaining, Amount::from_human(4.0));

        ledger.commit(&AgentId::new("zeta"), r.amount);
        let rows = ledger.usage();
        assert_eq!(rows[1].committed, Amount::from_human(1.0));
        assert_eq!(rows[1].reserved, Amount::zero());
    }
}
