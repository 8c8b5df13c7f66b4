use std::{fmt::Display, time::Duration};

use lpg_common::Points;
use serde::{Deserialize, Serialize};

use crate::AccrualApiError;

/// The status vocabulary of the accrual system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    /// The order is known, but no calculation has started.
    Registered,
    Processing,
    /// The order will never earn points.
    Invalid,
    /// The calculation is complete and `accrual` holds the reward, if any.
    Processed,
}

impl AccrualStatus {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

impl Display for AccrualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Registered => "REGISTERED",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

impl Settlement {
    /// The reward this settlement grants. Only processed orders earn anything, and a zero accrual earns nothing.
    pub fn reward(&self) -> Option<Points> {
        match (self.status, self.accrual) {
            (AccrualStatus::Processed, Some(p)) if p.is_positive() => Some(p),
            _ => None,
        }
    }

    pub(crate) fn validate(self, requested: &str) -> Result<Self, AccrualApiError> {
        if self.order != requested {
            return Err(AccrualApiError::MalformedSettlement(format!(
                "asked for order {requested}, but received a settlement for {}",
                self.order
            )));
        }
        if self.accrual.is_some_and(|a| a.is_negative()) {
            return Err(AccrualApiError::MalformedSettlement(format!(
                "order {} has a negative accrual",
                self.order
            )));
        }
        Ok(self)
    }
}

/// The outcome of a single settlement query.
#[derive(Debug)]
pub enum SettlementResult {
    /// The accrual system knows about the order.
    Settled(Settlement),
    /// The accrual system has nothing to say about the order yet.
    Unknown,
    /// No queries for *any* order may be sent for at least `retry_after`.
    RateLimited { retry_after: Duration },
    /// Anything else. The order should be retried on the normal schedule.
    Fatal(AccrualApiError),
}
