use chrono::{DateTime, SecondsFormat, Utc};
use loyalty_engine::db_types::{Balance, Order, OrderStatusType, Points, Withdrawal};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// The order the points are being spent on
    pub order: String,
    pub sum: Points,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub number: String,
    pub status: OrderStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    #[serde(serialize_with = "rfc3339")]
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self { number: order.number.0, status: order.status, accrual: order.accrual, uploaded_at: order.uploaded_at }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub current: Points,
    pub withdrawn: Points,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        Self { current: balance.current, withdrawn: balance.withdrawn }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResponse {
    pub order: String,
    pub sum: Points,
    #[serde(serialize_with = "rfc3339")]
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.order_number.0, sum: w.amount, processed_at: w.processed_at }
    }
}

/// Timestamps go out as RFC 3339 with whole seconds, e.g. `2024-02-29T13:30:00+00:00`.
fn rfc3339<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Secs, false))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: std::fmt::Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}
