//! Agent and service reference records
//!
//! These records are supplied by an external configuration provider at
//! startup and on explicit reload. The policy engine treats services as
//! read-only reference data; agent records are paired with live spend
//! counters owned exclusively by the engine.

use crate::{AgentId, Amount, Result, ServiceId, SpendgateError};
use serde::{Deserialize, Serialize};

/// Priority tier of an agent or service
///
/// `High` headroom is protected by the reservation rule; the rule is
/// enforced against `Low` requesters only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

/// A budget-holding principal that issues priced action requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Agent ID
    pub id: AgentId,
    /// Total spend allowed per rollover period
    pub daily_budget: Amount,
    /// Largest single charge this agent may incur
    pub per_call_max: Amount,
    /// Priority tier
    #[serde(default)]
    pub priority: Priority,
}

impl AgentRecord {
    /// Create a new agent record
    pub fn new(
        id: impl Into<AgentId>,
        daily_budget: Amount,
        per_call_max: Amount,
        priority: Priority,
    ) -> Self {
        Self {
            id: id.into(),
            daily_budget,
            per_call_max,
            priority,
        }
    }

    /// Validate the record against the configuration contract
    pub fn validate(&self) -> Result<()> {
        if self.daily_budget.is_negative() || self.per_call_max.is_negative() {
            return Err(SpendgateError::InvalidConfig {
                message: format!("agent {}: budgets must be non-negative", self.id),
            });
        }
        if self.per_call_max > self.daily_budget {
            return Err(SpendgateError::InvalidConfig {
                message: format!(
                    "agent {}: per_call_max {} exceeds daily_budget {}",
                    self.id, self.per_call_max, self.daily_budget
                ),
            });
        }
        Ok(())
    }
}

/// A priced capability an agent may request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Service ID
    pub id: ServiceId,
    /// Standard price of one call
    pub base_price: Amount,
    /// Lowest price the provider accepts
    pub min_price: Amount,
    /// Whether a cheaper variant can be substituted
    #[serde(default)]
    pub supports_downgrade: bool,
    /// Price of the downgraded variant (required when `supports_downgrade`)
    #[serde(default)]
    pub downgrade_price: Option<Amount>,
    /// Priority tier
    #[serde(default)]
    pub priority: Priority,
    /// Whether the service currently accepts calls
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ServiceRecord {
    /// Create a new service record without downgrade support
    pub fn new(
        id: impl Into<ServiceId>,
        base_price: Amount,
        min_price: Amount,
        priority: Priority,
    ) -> Self {
        Self {
            id: id.into(),
            base_price,
            min_price,
            supports_downgrade: false,
            downgrade_price: None,
            priority,
            active: true,
        }
    }

    /// Declare a downgraded variant at the given price
    pub fn with_downgrade(mut self, downgrade_price: Amount) -> Self {
        self.supports_downgrade = true;
        self.downgrade_price = Some(downgrade_price);
        self
    }

    /// Validate the record against the configuration contract
    pub fn validate(&self) -> Result<()> {
        if self.base_price.is_negative() || self.min_price.is_negative() {
            return Err(SpendgateError::InvalidConfig {
                message: format!("service {}: prices must be non-negative", self.id),
            });
        }
        if self.min_price > self.base_price {
            return Err(SpendgateError::InvalidConfig {
                message: format!(
                    "service {}: min_price {} exceeds base_price {}",
                    self.id, self.min_price, self.base_price
                ),
            });
        }
        if self.supports_downgrade {
            let downgrade = self.downgrade_price.ok_or_else(|| SpendgateError::InvalidConfig {
                message: format!("service {}: downgrade declared without a price", self.id),
            })?;
            if downgrade < self.min_price || downgrade > self.base_price {
                return Err(SpendgateError::InvalidConfig {
                    message: format!(
                        "service {}: downgrade_price {} outside [{}, {}]",
                        self.id, downgrade, self.min_price, self.base_price
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Configurable parameters of the cross-agent reservation rule
///
/// The protected floor is `reserve_bps` basis points of the sum of
/// high-priority agents' daily budgets; a low-priority request is rejected
/// when committing it would push system-wide remaining headroom below that
/// floor. Zero disables the rule.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReservationPolicy {
    /// Basis points of aggregate high-priority daily budget kept in reserve
    pub reserve_bps: u16,
}

impl ReservationPolicy {
    /// Disable the reservation rule
    pub const fn disabled() -> Self {
        Self { reserve_bps: 0 }
    }

    /// Protect the given basis-point fraction of high-priority budget
    pub const fn protecting_bps(reserve_bps: u16) -> Self {
        Self { reserve_bps }
    }

    /// Whether the rule is active
    pub fn is_enabled(&self) -> bool {
        self.reserve_bps > 0
    }

    /// Validate the policy parameters
    pub fn validate(&self) -> Result<()> {
        if self.reserve_bps > 10_000 {
            return Err(SpendgateError::InvalidConfig {
                message: format!("reserve_bps {} exceeds 10000", self.reserve_bps),
            });
        }
        Ok(())
    }
}
