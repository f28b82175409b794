//! SpendGate Settlement - The payment transfer seam
//!
//! Settlement is external to the arbitration core: the engine only needs a
//! channel that either produces a reference for an executed transfer or
//! fails. Two in-process implementations ship with the crate: a
//! balance-tracking channel for funds-aware tests and a deterministic mock
//! stand-in with failure and latency injection for pipeline tests. Engine
//! logic is identical whichever channel is plugged in.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::info;

use spendgate_types::{AgentId, Amount, Result, ServiceId, SettlementRef, SpendgateError};

/// Proof of one executed transfer
#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    /// Channel reference for the transfer
    pub settlement_ref: SettlementRef,
    /// Whether the transfer ran on a deterministic stand-in channel
    pub mocked: bool,
}

/// A channel able to move payment from an agent to a service provider
///
/// Implementations may be slow and network-bound; callers bound them with a
/// timeout. The core never retries; retry policy, if any, lives behind this
/// trait.
#[async_trait::async_trait]
pub trait SettlementChannel: Send + Sync {
    async fn pay(
        &self,
        agent_id: &AgentId,
        service_id: &ServiceId,
        amount: Amount,
    ) -> Result<SettlementReceipt>;
}

/// Balance-tracking in-memory channel
///
/// Keeps per-agent settlement funds and per-service revenue; transfers fail
/// when the paying agent's funds cannot cover the amount.
pub struct InMemoryChannel {
    balances: Arc<RwLock<HashMap<AgentId, Amount>>>,
    revenue: Arc<RwLock<HashMap<ServiceId, Amount>>>,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            revenue: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn set_balance(&self, agent_id: AgentId, balance: Amount) {
        self.balances.write().await.insert(agent_id, balance);
    }

    pub async fn balance(&self, agent_id: &AgentId) -> Amount {
        self.balances
            .read()
            .await
            .get(agent_id)
            .copied()
            .unwrap_or(Amount::zero())
    }

    pub async fn revenue(&self, service_id: &ServiceId) -> Amount {
        self.revenue
            .read()
            .await
            .get(service_id)
            .copied()
            .unwrap_or(Amount::zero())
    }
}

impl Default for InMemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SettlementChannel for InMemoryChannel {
    async fn pay(
        &self,
        agent_id: &AgentId,
        service_id: &ServiceId,
        amount: Amount,
    ) -> Result<SettlementReceipt> {
        let mut balances = self.balances.write().await;
        let available = balances.get(agent_id).copied().unwrap_or(Amount::zero());
        if available < amount {
            return Err(SpendgateError::InsufficientSettlementFunds {
                agent_id: agent_id.to_string(),
                requested: amount.to_human(),
                available: available.to_human(),
            });
        }
        balances.insert(agent_id.clone(), available.checked_sub(amount)?);
        drop(balances);

        let mut revenue = self.revenue.write().await;
        let earned = revenue.get(service_id).copied().unwrap_or(Amount::zero());
        revenue.insert(service_id.clone(), earned.checked_add(amount)?);
        drop(revenue);

        let receipt = SettlementReceipt {
            settlement_ref: SettlementRef::new(),
            mocked: false,
        };
        info!(
            agent = %agent_id,
            service = %service_id,
            %amount,
            reference = %receipt.settlement_ref,
            "settlement executed"
        );
        Ok(receipt)
    }
}

/// Behavior of the next [`MockChannel`] transfer
#[derive(Debug, Clone, Default)]
enum MockOutcome {
    #[default]
    Settle,
    Fail(String),
}

/// Deterministic stand-in channel
///
/// Always settles (receipts are flagged mock) unless scripted to fail;
/// optional latency injection exercises the pipeline's timeout handling.
pub struct MockChannel {
    latency: Option<Duration>,
    outcome: Arc<RwLock<MockOutcome>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            latency: None,
            outcome: Arc::new(RwLock::new(MockOutcome::Settle)),
        }
    }

    /// Delay every transfer by the given duration
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Script every subsequent transfer to fail with the given reason
    pub async fn fail_with(&self, reason: impl Into<String>) {
        *self.outcome.write().await = MockOutcome::Fail(reason.into());
    }

    /// Return to settling transfers
    pub async fn settle_again(&self) {
        *self.outcome.write().await = MockOutcome::Settle;
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SettlementChannel for MockChannel {
    async fn pay(
        &self,
        agent_id: &AgentId,
        service_id: &ServiceId,
        amount: Amount,
    ) -> Result<SettlementReceipt> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.outcome.read().await.clone() {
            MockOutcome::Settle => {
                let receipt = SettlementReceipt {
                    settlement_ref: SettlementRef::new(),
                    mocked: true,
                };
                info!(
                    agent = %agent_id,
                    service = %service_id,
                    %amount,
                    reference = %receipt.settlement_ref,
                    "mock settlement executed"
                );
                Ok(receipt)
            }
            MockOutcome::Fail(reason) => Err(SpendgateError::SettlementFailed { reason }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transfer_moves_funds_to_service_revenue() {
        let channel = InMemoryChannel::new();
        let agent = AgentId::new("user-agent");
        let service = ServiceId::new("imagegen");
        channel.set_balance(agent.clone(), Amount::from_human(10.0)).await;

        let receipt = channel
            .pay(&agent, &service, Amount::from_human(4.0))
            .await
            .unwrap();
        assert!(!receipt.mocked);
        assert_eq!(channel.balance(&agent).await, Amount::from_human(6.0));
        assert_eq!(channel.revenue(&service).await, Amount::from_human(4.0));
    }

    #[tokio::test]
    async fn insufficient_funds_leave_balances_untouched() {
        let channel = InMemoryChannel::new();
        let agent = AgentId::new("user-agent");
        let service = ServiceId::new("imagegen");
        channel.set_balance(agent.clone(), Amount::from_human(1.0)).await;

        let result = channel.pay(&agent, &service, Amount::from_human(2.0)).await;
        assert!(matches!(
            result,
            Err(SpendgateError::InsufficientSettlementFunds { .. })
        ));
        assert_eq!(channel.balance(&agent).await, Amount::from_human(1.0));
        assert_eq!(channel.revenue(&service).await, Amount::zero());
    }

    #[tokio::test]
    async fn mock_channel_settles_with_mock_receipts() {
        let channel = MockChannel::new();
        let receipt = channel
            .pay(
                &AgentId::new("user-agent"),
                &ServiceId::new("imagegen"),
                Amount::from_human(1.0),
            )
            .await
            .unwrap();
        assert!(receipt.mocked);
    }

    #[tokio::test]
    async fn scripted_failure_and_recovery() {
        let channel = MockChannel::new();
        let agent = AgentId::new("user-agent");
        let service = ServiceId::new("imagegen");

        channel.fail_with("provider unreachable").await;
        let result = channel.pay(&agent, &service, Amount::from_human(1.0)).await;
        assert!(matches!(result, Err(SpendgateError::SettlementFailed { .. })));

        channel.settle_again().await;
        assert!(channel.pay(&agent, &service, Amount::from_human(1.0)).await.is_ok());
    }
}
