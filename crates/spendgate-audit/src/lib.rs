//! SpendGate Audit - Append-only system log
//!
//! Every policy decision and every settlement attempt produces exactly one
//! record here. The log is append-only and hash-chained: each entry commits
//! to its predecessor, so tampering anywhere breaks verification from that
//! point on. Decision/transaction coupling is explicit through the shared
//! correlation id rather than call-site ordering.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use spendgate_types::{
    AgentId, Amount, CorrelationId, PolicyDecision, PolicyOutcome, ServiceId, TransactionRecord,
    TransactionStatus,
};

/// Hash assigned to the predecessor of the first entry
const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// One record kind in the system log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogRecord {
    Decision(PolicyDecision),
    Transaction(TransactionRecord),
}

impl LogRecord {
    pub fn agent_id(&self) -> &AgentId {
        match self {
            Self::Decision(d) => &d.agent_id,
            Self::Transaction(t) => &t.agent_id,
        }
    }

    pub fn service_id(&self) -> &ServiceId {
        match self {
            Self::Decision(d) => &d.service_id,
            Self::Transaction(t) => &t.service_id,
        }
    }

    pub fn correlation_id(&self) -> CorrelationId {
        match self {
            Self::Decision(d) => d.correlation_id,
            Self::Transaction(t) => t.correlation_id,
        }
    }
}

/// A sequenced, hash-chained entry in the system log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic position in the log
    pub sequence: u64,
    /// Hash of the previous entry
    pub previous_hash: String,
    /// Hash of this entry
    pub hash: String,
    /// When the entry was appended
    pub recorded_at: DateTime<Utc>,
    /// The record itself
    pub record: LogRecord,
}

impl AuditEntry {
    /// Compute the hash this entry should carry
    pub fn compute_hash(&self) -> String {
        let payload = serde_json::to_string(&self.record).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(self.sequence.to_be_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Verify the entry hash
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// The append-only system log
///
/// Cheap to clone; all clones append to the same store. Safe under
/// concurrent writers: each append is one short write-lock hold.
#[derive(Clone, Default)]
pub struct SystemLogger {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl SystemLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a policy decision record
    pub async fn record_decision(&self, decision: PolicyDecision) {
        self.append(LogRecord::Decision(decision)).await;
    }

    /// Append a transaction record
    pub async fn record_transaction(&self, transaction: TransactionRecord) {
        self.append(LogRecord::Transaction(transaction)).await;
    }

    async fn append(&self, record: LogRecord) {
        let mut entries = self.entries.write().await;
        let previous_hash = entries
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let mut entry = AuditEntry {
            sequence: entries.len() as u64,
            previous_hash,
            hash: String::new(),
            recorded_at: Utc::now(),
            record,
        };
        entry.hash = entry.compute_hash();
        debug!(
            sequence = entry.sequence,
            correlation = %entry.record.correlation_id(),
            "log entry appended"
        );
        entries.push(entry);
    }

    /// Number of entries in the log
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// The most recent `limit` entries, oldest first
    pub async fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        let start = entries.len().saturating_sub(limit);
        entries[start..].to_vec()
    }

    /// All entries touching one agent
    pub async fn by_agent(&self, agent_id: &AgentId) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.record.agent_id() == agent_id)
            .cloned()
            .collect()
    }

    /// All entries touching one service
    pub async fn by_service(&self, service_id: &ServiceId) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.record.service_id() == service_id)
            .cloned()
            .collect()
    }

    /// All entries for one gated request
    pub async fn by_correlation(&self, correlation_id: CorrelationId) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.record.correlation_id() == correlation_id)
            .cloned()
            .collect()
    }

    /// All decision records, in log order
    pub async fn decisions(&self) -> Vec<PolicyDecision> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter_map(|e| match &e.record {
                LogRecord::Decision(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    /// All transaction records, in log order
    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter_map(|e| match &e.record {
                LogRecord::Transaction(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    /// Total settled spend for one agent (mock settlements included)
    pub async fn total_spend_by_agent(&self, agent_id: &AgentId) -> Amount {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter_map(|e| match &e.record {
                LogRecord::Transaction(t)
                    if &t.agent_id == agent_id && t.is_settled() =>
                {
                    Some(t.amount)
                }
                _ => None,
            })
            .fold(Amount::zero(), |acc, amount| {
                acc.checked_add(amount).unwrap_or(acc)
            })
    }

    /// Total settled revenue for one service (mock settlements included)
    pub async fn total_revenue_by_service(&self, service_id: &ServiceId) -> Amount {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter_map(|e| match &e.record {
                LogRecord::Transaction(t)
                    if &t.service_id == service_id && t.is_settled() =>
                {
                    Some(t.amount)
                }
                _ => None,
            })
            .fold(Amount::zero(), |acc, amount| {
                acc.checked_add(amount).unwrap_or(acc)
            })
    }

    /// Decision count per outcome
    pub async fn outcome_counts(&self) -> HashMap<PolicyOutcome, usize> {
        let entries = self.entries.read().await;
        let mut counts = HashMap::new();
        for entry in entries.iter() {
            if let LogRecord::Decision(d) = &entry.record {
                *counts.entry(d.outcome).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Transaction count per status
    pub async fn status_counts(&self) -> HashMap<TransactionStatus, usize> {
        let entries = self.entries.read().await;
        let mut counts = HashMap::new();
        for entry in entries.iter() {
            if let LogRecord::Transaction(t) = &entry.record {
                *counts.entry(t.status).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Verify the whole hash chain
    pub async fn verify_chain(&self) -> bool {
        let entries = self.entries.read().await;
        let mut previous = GENESIS_HASH.to_string();
        for (position, entry) in entries.iter().enumerate() {
            if entry.sequence != position as u64
                || entry.previous_hash != previous
                || !entry.verify()
            {
                return false;
            }
            previous = entry.hash.clone();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendgate_types::SettlementRef;

    fn decision(agent: &str, service: &str, outcome: PolicyOutcome) -> PolicyDecision {
        let amount = Amount::from_human(1.0);
        PolicyDecision {
            timestamp: Utc::now(),
            correlation_id: CorrelationId::new(),
            agent_id: AgentId::new(agent),
            service_id: ServiceId::new(service),
            requested_amount: amount,
            outcome,
            effective_amount: if outcome == PolicyOutcome::Rejected {
                Amount::zero()
            } else {
                amount
            },
            reason: "test".to_string(),
        }
    }

    fn transaction(
        agent: &str,
        service: &str,
        amount: f64,
        status: TransactionStatus,
    ) -> TransactionRecord {
        TransactionRecord {
            timestamp: Utc::now(),
            correlation_id: CorrelationId::new(),
            agent_id: AgentId::new(agent),
            service_id: ServiceId::new(service),
            amount: Amount::from_human(amount),
            status,
            settlement_ref: status.is_settled().then(SettlementRef::new),
            call_hash: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn append_builds_a_verifiable_chain() {
        let logger = SystemLogger::new();
        logger.record_decision(decision("a", "s", PolicyOutcome::Allowed)).await;
        logger
            .record_transaction(transaction("a", "s", 1.0, TransactionStatus::Success))
            .await;
        logger.record_decision(decision("a", "s", PolicyOutcome::Rejected)).await;

        assert_eq!(logger.len().await, 3);
        assert!(logger.verify_chain().await);

        let entries = logger.recent(10).await;
        assert_eq!(entries[0].previous_hash, GENESIS_HASH);
        assert_eq!(entries[1].previous_hash, entries[0].hash);
    }

    #[tokio::test]
    async fn tampered_entry_breaks_verification() {
        let logger = SystemLogger::new();
        logger.record_decision(decision("a", "s", PolicyOutcome::Allowed)).await;
        logger.record_decision(decision("a", "s", PolicyOutcome::Allowed)).await;

        {
            let mut entries = logger.entries.write().await;
            if let LogRecord::Decision(d) = &mut entries[0].record {
                d.reason = "rewritten".to_string();
            }
        }
        assert!(!logger.verify_chain().await);
    }

    #[tokio::test]
    async fn queries_filter_by_agent_and_service() {
        let logger = SystemLogger::new();
        logger.record_decision(decision("a", "s1", PolicyOutcome::Allowed)).await;
        logger.record_decision(decision("b", "s2", PolicyOutcome::Allowed)).await;
        logger
            .record_transaction(transaction("a", "s1", 1.0, TransactionStatus::Success))
            .await;

        assert_eq!(logger.by_agent(&AgentId::new("a")).await.len(), 2);
        assert_eq!(logger.by_agent(&AgentId::new("b")).await.len(), 1);
        assert_eq!(logger.by_service(&ServiceId::new("s1")).await.len(), 2);
        assert_eq!(logger.decisions().await.len(), 2);
        assert_eq!(logger.transactions().await.len(), 1);
    }

    #[tokio::test]
    async fn aggregates_count_settled_transactions_only() {
        let logger = SystemLogger::new();
        logger
            .record_transaction(transaction("a", "s", 1.0, TransactionStatus::Success))
            .await;
        logger
            .record_transaction(transaction("a", "s", 0.5, TransactionStatus::Mock))
            .await;
        logger
            .record_transaction(transaction("a", "s", 9.0, TransactionStatus::Failed))
            .await;

        assert_eq!(
            logger.total_spend_by_agent(&AgentId::new("a")).await,
            Amount::from_human(1.5)
        );
        assert_eq!(
            logger.total_revenue_by_service(&ServiceId::new("s")).await,
            Amount::from_human(1.5)
        );

        let counts = logger.status_counts().await;
        assert_eq!(counts[&TransactionStatus::Success], 1);
        assert_eq!(counts[&TransactionStatus::Mock], 1);
        assert_eq!(counts[&TransactionStatus::Failed], 1);
    }

    #[tokio::test]
    async fn recent_returns_tail_in_order() {
        let logger = SystemLogger::new();
        for i in 0..5 {
            let outcome = if i % 2 == 0 {
                PolicyOutcome::Allowed
            } else {
                PolicyOutcome::Rejected
            };
            logger.record_decision(decision("a", "s", outcome)).await;
        }

        let tail = logger.recent(2).await;
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].sequence, 3);
        assert_eq!(tail[1].sequence, 4);
    }

    #[tokio::test]
    async fn chain_survives_concurrent_writers() {
        let logger = SystemLogger::new();
        let mut handles = Vec::new();
        for i in 0..8 {
            let logger = logger.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    logger
                        .record_decision(decision(&format!("agent-{i}"), "s", PolicyOutcome::Allowed))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(logger.len().await, 200);
        assert!(logger.verify_chain().await);
    }
}
