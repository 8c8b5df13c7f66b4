use cucumber::{then, when};
use loyalty_engine::{db_types::Points, LedgerError};

use crate::cucumber::LedgerWorld;

fn points(value: f64) -> Points {
    Points::try_from_f64(value).expect("Not a points amount")
}

#[when(expr = "'{word}' earns {float} points")]
async fn earn(world: &mut LedgerWorld, login: String, amount: f64) {
    let system = world.system();
    system.ledger().credit(system.user_id(&login), points(amount)).await.expect("Error crediting user");
}

#[when(expr = "'{word}' withdraws {float} points against order {word}")]
async fn withdraw(world: &mut LedgerWorld, login: String, amount: f64, reference: String) {
    let system = world.system();
    let result = system.ledger().debit(system.user_id(&login), &reference, points(amount)).await;
    system.last_error = result.err();
}

#[then("the withdrawal succeeds")]
async fn withdrawal_succeeds(world: &mut LedgerWorld) {
    if let Some(e) = &world.system().last_error {
        panic!("The withdrawal failed: {e}");
    }
}

#[then("the withdrawal fails with insufficient funds")]
async fn insufficient_funds(world: &mut LedgerWorld) {
    let err = world.system().last_error.take();
    assert!(matches!(err, Some(LedgerError::InsufficientFunds { .. })), "Unexpected outcome: {err:?}");
}

#[then("the withdrawal is rejected as an invalid reference")]
async fn invalid_reference(world: &mut LedgerWorld) {
    let err = world.system().last_error.take();
    assert!(matches!(err, Some(LedgerError::InvalidReference(_))), "Unexpected outcome: {err:?}");
}

#[then("the withdrawal is rejected as an invalid amount")]
async fn invalid_amount(world: &mut LedgerWorld) {
    let err = world.system().last_error.take();
    assert!(matches!(err, Some(LedgerError::InvalidAmount(_))), "Unexpected outcome: {err:?}");
}

#[then(expr = "'{word}' has {float} points available and {float} withdrawn")]
async fn check_balance(world: &mut LedgerWorld, login: String, current: f64, withdrawn: f64) {
    let system = world.system();
    let balance = system.ledger().read(system.user_id(&login)).await.expect("Error reading balance");
    assert_eq!(balance.current, points(current), "Available balance is incorrect");
    assert_eq!(balance.withdrawn, points(withdrawn), "Withdrawn total is incorrect");
}

#[then(expr = "'{word}' has made {int} withdrawal(s)")]
async fn check_withdrawal_count(world: &mut LedgerWorld, login: String, count: usize) {
    let system = world.system();
    let withdrawals = system.ledger().withdrawals(system.user_id(&login)).await.expect("Error fetching withdrawals");
    assert_eq!(withdrawals.len(), count, "Number of withdrawals is incorrect");
}

#[then(expr = "the latest withdrawal by '{word}' is {float} points against order {word}")]
async fn check_latest_withdrawal(world: &mut LedgerWorld, login: String, amount: f64, reference: String) {
    let system = world.system();
    let withdrawals = system.ledger().withdrawals(system.user_id(&login)).await.expect("Error fetching withdrawals");
    let latest = withdrawals.first().expect("No withdrawals");
    assert_eq!(latest.amount, points(amount));
    assert_eq!(latest.order_number.as_str(), reference);
}
