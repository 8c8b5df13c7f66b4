use std::{fmt::Display, str::FromStr};

use accrual_client::AccrualStatus;
use chrono::{DateTime, Utc};
pub use lpg_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     OrderNumber      ---------------------------------------------------------
/// The identifier a customer submits for an order. Only digit strings that pass the Luhn check make it into the
/// database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been submitted, and the accrual system has not started on it yet.
    New,
    /// The accrual system is calculating the reward for the order.
    Processing,
    /// The accrual system rejected the order. It will never earn points.
    Invalid,
    /// The reward calculation is complete. Any reward has been credited to the owner's balance.
    Processed,
}

impl OrderStatusType {
    /// Statuses only ever move to a strictly higher rank.
    pub fn rank(&self) -> u8 {
        match self {
            OrderStatusType::New => 0,
            OrderStatusType::Processing => 1,
            OrderStatusType::Invalid | OrderStatusType::Processed => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Invalid | OrderStatusType::Processed)
    }

    /// Whether an order currently in this status may be moved to `next`.
    pub fn can_advance_to(&self, next: OrderStatusType) -> bool {
        next.rank() > self.rank()
    }

    /// All the statuses an order can be in while it is still awaiting settlement.
    pub fn pending() -> [OrderStatusType; 2] {
        [OrderStatusType::New, OrderStatusType::Processing]
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<AccrualStatus> for OrderStatusType {
    fn from(status: AccrualStatus) -> Self {
        match status {
            AccrualStatus::Registered => OrderStatusType::New,
            AccrualStatus::Processing => OrderStatusType::Processing,
            AccrualStatus::Invalid => OrderStatusType::Invalid,
            AccrualStatus::Processed => OrderStatusType::Processed,
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub number: OrderNumber,
    pub user_id: i64,
    pub status: OrderStatusType,
    /// The reward the order earned. Only ever set on processed orders with a non-zero accrual.
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub number: OrderNumber,
    pub user_id: i64,
}

impl NewOrder {
    pub fn new(number: OrderNumber, user_id: i64) -> Self {
        Self { number, user_id }
    }
}

//--------------------------------------     SettlementUpdate     ---------------------------------------------------------
/// A definitive or intermediate answer from the accrual system, ready to be applied to an order.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementUpdate {
    pub number: OrderNumber,
    pub status: OrderStatusType,
    /// Only carried for processed orders with a positive accrual.
    pub reward: Option<Points>,
}

impl SettlementUpdate {
    pub fn new(number: OrderNumber, status: OrderStatusType, reward: Option<Points>) -> Self {
        let reward = match status {
            OrderStatusType::Processed => reward.filter(|r| r.is_positive()),
            _ => None,
        };
        Self { number, status, reward }
    }
}

//--------------------------------------      UserAccount      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUserAccount {
    pub login: String,
    pub password_hash: String,
}

//--------------------------------------        Balance        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Balance {
    pub user_id: i64,
    /// Points available for withdrawal. Never negative.
    #[sqlx(rename = "available")]
    pub current: Points,
    /// Everything ever withdrawn. Never decreases.
    pub withdrawn: Points,
}

impl Balance {
    pub fn empty(user_id: i64) -> Self {
        Self { user_id, current: Points::default(), withdrawn: Points::default() }
    }
}

//--------------------------------------       Withdrawal       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    /// A reference supplied by the user. It passes the Luhn check but need not belong to any known order.
    pub order_number: OrderNumber,
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub order_number: OrderNumber,
    pub amount: Points,
}

impl NewWithdrawal {
    pub fn new(user_id: i64, order_number: OrderNumber, amount: Points) -> Self {
        Self { user_id, order_number, amount }
    }
}
