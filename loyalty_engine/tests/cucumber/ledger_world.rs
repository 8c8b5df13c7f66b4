use std::collections::HashMap;

use cucumber::World;
use log::*;
use loyalty_engine::{
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    AuthApi,
    LedgerApi,
    LedgerError,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct LedgerWorld {
    pub system: Option<LedgerSystem>,
}

#[derive(Debug)]
pub struct LedgerSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub users: HashMap<String, i64>,
    pub last_error: Option<LedgerError>,
}

impl LedgerWorld {
    pub fn system(&mut self) -> &mut LedgerSystem {
        self.system.as_mut().expect("Ledger not initialised")
    }
}

impl LedgerSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        Self { db_path: url, db, users: HashMap::new(), last_error: None }
    }

    pub fn ledger(&self) -> LedgerApi<SqliteDatabase> {
        LedgerApi::new(self.db.clone())
    }

    pub fn auth(&self) -> AuthApi<SqliteDatabase> {
        AuthApi::new(self.db.clone())
    }

    pub fn user_id(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("No user called {login}"))
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
