//! A scripted stand-in for the accrual system, and a few polling helpers.
#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use accrual_client::{AccrualApiError, AccrualStatus, Settlement, SettlementResult};
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType, Points},
    BalanceManagement,
    OrderManagement,
    SettlementSource,
    SqliteDatabase,
};

#[derive(Debug, Clone)]
pub enum Reply {
    Settled(AccrualStatus, Option<f64>),
    Unknown,
    RateLimited(Duration),
    Fatal,
}

/// Replies to each order number with the next entry of its script. The last entry repeats forever, and orders without
/// a script are unknown.
#[derive(Clone, Default)]
pub struct ScriptedAccrual {
    state: Arc<Mutex<ScriptState>>,
}

#[derive(Default)]
struct ScriptState {
    scripts: HashMap<String, VecDeque<Reply>>,
    calls: Vec<(String, Instant)>,
}

impl ScriptedAccrual {
    pub fn script(&self, number: &str, replies: Vec<Reply>) {
        let mut state = self.state.lock().unwrap();
        state.scripts.insert(number.to_string(), replies.into());
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, number: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|(n, _)| n == number).count()
    }

    fn next_reply(&self, number: &str) -> Reply {
        let mut state = self.state.lock().unwrap();
        state.calls.push((number.to_string(), Instant::now()));
        match state.scripts.get_mut(number) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or(Reply::Unknown),
            Some(script) => script.front().cloned().unwrap_or(Reply::Unknown),
            None => Reply::Unknown,
        }
    }
}

impl SettlementSource for ScriptedAccrual {
    async fn fetch_settlement(&self, order_number: &str) -> SettlementResult {
        match self.next_reply(order_number) {
            Reply::Settled(status, accrual) => SettlementResult::Settled(Settlement {
                order: order_number.to_string(),
                status,
                accrual: accrual.map(|a| Points::try_from_f64(a).unwrap()),
            }),
            Reply::Unknown => SettlementResult::Unknown,
            Reply::RateLimited(retry_after) => SettlementResult::RateLimited { retry_after },
            Reply::Fatal => SettlementResult::Fatal(AccrualApiError::UnexpectedStatus {
                status: 500,
                message: "Internal Server Error".to_string(),
            }),
        }
    }
}

pub async fn order_status(db: &SqliteDatabase, number: &str) -> OrderStatusType {
    db.fetch_order(&OrderNumber::from(number)).await.unwrap().expect("Order does not exist").status
}

pub async fn wait_for_status(db: &SqliteDatabase, number: &str, status: OrderStatusType) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let current = order_status(db, number).await;
        if current == status {
            return;
        }
        assert!(Instant::now() < deadline, "Order {number} is still {current} after 5s. Expected {status}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn wait_for_calls(source: &ScriptedAccrual, number: &str, calls: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while source.calls_for(number) < calls {
        assert!(Instant::now() < deadline, "Order {number} was not queried {calls} times within 5s");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn available_points(db: &SqliteDatabase, user_id: i64) -> Points {
    db.fetch_balance(user_id).await.unwrap().current
}
