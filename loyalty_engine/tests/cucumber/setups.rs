use cucumber::given;
use loyalty_engine::db_types::Points;

use crate::cucumber::{ledger_world::LedgerSystem, LedgerWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LedgerWorld) {
    let system = LedgerSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user '{word}'")]
async fn new_user(world: &mut LedgerWorld, login: String) {
    let system = world.system();
    let user = system.auth().register(&login, "correct horse").await.expect("Error registering user");
    system.users.insert(login, user.id);
}

#[given(expr = "a user '{word}' with {float} points")]
async fn new_user_with_points(world: &mut LedgerWorld, login: String, points: f64) {
    new_user(world, login.clone()).await;
    let system = world.system();
    let amount = Points::try_from_f64(points).expect("Not a points amount");
    system.ledger().credit(system.user_id(&login), amount).await.expect("Error crediting user");
}
