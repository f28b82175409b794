//! SpendGate Gate - The paid-call pipeline
//!
//! [`PaymentGate::wrap`] sequences the full pipeline around one paid action:
//! policy evaluation, settlement with a bounded timeout, spend commit, action
//! execution, and audit logging. The ordering guarantees live here:
//!
//! - the decision entry is written before any transaction entry for the
//!   same request
//! - spend is committed if and only if settlement reported success
//! - the action executes if and only if settlement succeeded
//! - settlement and commit run in a spawned task, so a caller that abandons
//!   the future cannot leave the request short of a terminal state

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::time::timeout;
use tracing::warn;

use spendgate_audit::SystemLogger;
use spendgate_policy::{PolicyEngine, Reservation};
use spendgate_settlement::{SettlementChannel, SettlementReceipt};
use spendgate_types::{
    AgentId, Amount, CorrelationId, PolicyOutcome, Result, ServiceId, SettlementRef,
    SpendgateError, TransactionRecord, TransactionStatus,
};

/// Timeout applied to one settlement attempt unless overridden
pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// A gated action's result with its payment metadata attached
#[derive(Debug)]
pub struct Paid<T> {
    /// The underlying action's output
    pub output: T,
    /// What was actually charged
    pub amount_paid: Amount,
    /// How the request was arbitrated
    pub outcome: PolicyOutcome,
    /// Settlement channel reference
    pub settlement_ref: SettlementRef,
    /// Request correlation id
    pub correlation_id: CorrelationId,
}

/// The pipeline wrapper around every paid call
#[derive(Clone)]
pub struct PaymentGate {
    policy: PolicyEngine,
    settlement: Arc<dyn SettlementChannel>,
    logger: SystemLogger,
    settlement_timeout: Duration,
}

impl PaymentGate {
    pub fn new(
        policy: PolicyEngine,
        settlement: Arc<dyn SettlementChannel>,
        logger: SystemLogger,
    ) -> Self {
        Self {
            policy,
            settlement,
            logger,
            settlement_timeout: DEFAULT_SETTLEMENT_TIMEOUT,
        }
    }

    /// Bound each settlement attempt by the given timeout
    pub fn with_settlement_timeout(mut self, settlement_timeout: Duration) -> Self {
        self.settlement_timeout = settlement_timeout;
        self
    }

    /// The engine this gate arbitrates through
    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// The log this gate writes to
    pub fn logger(&self) -> &SystemLogger {
        &self.logger
    }

    /// Gate one paid call
    ///
    /// `action` runs only after settlement succeeded; its output comes back
    /// wrapped in [`Paid`] with the payment metadata attached.
    pub async fn wrap<F, T>(
        &self,
        agent_id: &AgentId,
        service_id: &ServiceId,
        requested: Amount,
        action: F,
    ) -> Result<Paid<T>>
    where
        F: Future<Output = T>,
    {
        let (decision, reservation) = self
            .policy
            .evaluate(agent_id, service_id, requested)
            .await?;

        let correlation_id = decision.correlation_id;
        let outcome = decision.outcome;
        let effective = decision.effective_amount;
        let reason = decision.reason.clone();
        self.logger.record_decision(decision).await;

        let Some(reservation) = reservation else {
            return Err(SpendgateError::PolicyRejected { reason });
        };

        let receipt = self
            .settle(agent_id.clone(), service_id.clone(), effective, reservation)
            .await?;

        let output = action.await;
        Ok(Paid {
            output,
            amount_paid: effective,
            outcome,
            settlement_ref: receipt.settlement_ref,
            correlation_id,
        })
    }

    /// Run the settlement phase to a terminal state in a spawned task.
    ///
    /// The reservation is consumed exactly once on every path: committed on
    /// success, released on failure or timeout.
    async fn settle(
        &self,
        agent_id: AgentId,
        service_id: ServiceId,
        amount: Amount,
        reservation: Reservation,
    ) -> Result<SettlementReceipt> {
        let policy = self.policy.clone();
        let logger = self.logger.clone();
        let channel = Arc::clone(&self.settlement);
        let settlement_timeout = self.settlement_timeout;
        let correlation_id = reservation.correlation_id();
        let call_hash = call_hash(&agent_id, &service_id, correlation_id, amount);

        let handle = tokio::spawn(async move {
            let attempt = timeout(settlement_timeout, channel.pay(&agent_id, &service_id, amount)).await;
            match attempt {
                Ok(Ok(receipt)) => {
                    let status = if receipt.mocked {
                        TransactionStatus::Mock
                    } else {
                        TransactionStatus::Success
                    };
                    logger
                        .record_transaction(transaction(
                            correlation_id,
                            &agent_id,
                            &service_id,
                            amount,
                            status,
                            Some(receipt.settlement_ref),
                            call_hash,
                        ))
                        .await;
                    policy.commit(reservation).await;
                    Ok(receipt)
                }
                Ok(Err(err)) => {
                    warn!(agent = %agent_id, service = %service_id, %err, "settlement failed");
                    logger
                        .record_transaction(transaction(
                            correlation_id,
                            &agent_id,
                            &service_id,
                            amount,
                            TransactionStatus::Failed,
                            None,
                            call_hash,
                        ))
                        .await;
                    policy.release(reservation).await;
                    Err(err)
                }
                Err(_elapsed) => {
                    warn!(agent = %agent_id, service = %service_id, "settlement timed out");
                    logger
                        .record_transaction(transaction(
                            correlation_id,
                            &agent_id,
                            &service_id,
                            amount,
                            TransactionStatus::Failed,
                            None,
                            call_hash,
                        ))
                        .await;
                    policy.release(reservation).await;
                    Err(SpendgateError::SettlementTimeout {
                        timeout_ms: settlement_timeout.as_millis() as u64,
                    })
                }
            }
        });

        match handle.await {
            Ok(result) => result,
            Err(join_err) => Err(SpendgateError::SettlementFailed {
                reason: format!("settlement task aborted: {join_err}"),
            }),
        }
    }
}

fn transaction(
    correlation_id: CorrelationId,
    agent_id: &AgentId,
    service_id: &ServiceId,
    amount: Amount,
    status: TransactionStatus,
    settlement_ref: Option<SettlementRef>,
    call_hash: String,
) -> TransactionRecord {
    TransactionRecord {
        timestamp: Utc::now(),
        correlation_id,
        agent_id: agent_id.clone(),
        service_id: service_id.clone(),
        amount,
        status,
        settlement_ref,
        call_hash,
    }
}

/// Hash binding a transaction record to the specific gated invocation
fn call_hash(
    agent_id: &AgentId,
    service_id: &ServiceId,
    correlation_id: CorrelationId,
    amount: Amount,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(agent_id.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(service_id.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(correlation_id.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(amount.micros.to_be_bytes());
    hex::encode(hasher.finalize())
}
