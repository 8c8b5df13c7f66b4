use log::*;
use tokio::sync::{mpsc, mpsc::error::TrySendError};

use crate::db_types::OrderNumber;

/// The submitting side of the tracker's intake queue. Cheap to clone; hand one to every request handler.
#[derive(Debug, Clone)]
pub struct OrderIntake {
    sender: mpsc::Sender<OrderNumber>,
}

impl OrderIntake {
    /// Creates an intake queue that holds up to `capacity` orders.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OrderNumber>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Hands the order to the tracker without waiting. Returns `false` if the order could not be queued. Such orders
    /// are not lost: they are still pending in the database, and the tracker's next re-scan will find them.
    pub fn enqueue(&self, number: OrderNumber) -> bool {
        match self.sender.try_send(number) {
            Ok(()) => true,
            Err(TrySendError::Full(number)) => {
                warn!("🔄️ The reconciliation intake is full. Order [{number}] will be picked up by the next re-scan.");
                false
            },
            Err(TrySendError::Closed(number)) => {
                warn!(
                    "🔄️ The order tracker is not running. Order [{number}] will be picked up once the tracker starts."
                );
                false
            },
        }
    }
}
