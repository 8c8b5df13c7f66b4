use lpg_common::Points;

use crate::db_types::Order;

#[derive(Debug, Clone)]
pub enum InsertOrderResult {
    /// The order is new, and has been stored with status `NEW`.
    Inserted(Order),
    /// An order with this number already exists. It is returned unchanged and may belong to a different user.
    AlreadyExists(Order),
}

/// What happened when a settlement update was applied to an order.
#[derive(Debug, Clone)]
pub enum SettlementApplied {
    /// The order's status moved forward. If the new status is `PROCESSED` and there was a reward, `credited` holds the
    /// amount that was added to the owner's balance in the same transaction.
    Updated { order: Order, credited: Option<Points> },
    /// The update would not have moved the order forward, so nothing was written.
    Unchanged(Order),
    /// There is no order with this number.
    NotFound,
}

impl SettlementApplied {
    /// The order is finished with: either it has reached a terminal status, or it does not exist at all.
    pub fn is_final(&self) -> bool {
        match self {
            SettlementApplied::Updated { order, .. } | SettlementApplied::Unchanged(order) => order.status.is_terminal(),
            SettlementApplied::NotFound => true,
        }
    }
}
