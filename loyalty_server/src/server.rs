use std::{path::Path, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use loyalty_engine::{
    AuthApi,
    LedgerApi,
    LoyaltyDatabase,
    OrderFlowApi,
    OrderIntake,
    PostgresDatabase,
    SqliteDatabase,
};

use crate::{
    auth::CookieSigner,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    reconciliation_worker::{start_reconciliation_worker, stop_reconciliation_worker},
    routes::{
        health,
        json_config,
        LoginRoute,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        SubmitOrderRoute,
        WithdrawRoute,
    },
};

const MAX_DB_CONNECTIONS: u32 = 25;

/// The storage backends the server can run against, picked by the scheme of the database URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    pub fn from_url(url: &str) -> Result<Self, ServerError> {
        match url.split_once(':').map(|(scheme, _)| scheme) {
            Some("sqlite") => Ok(Self::Sqlite),
            Some("postgres") | Some("postgresql") => Ok(Self::Postgres),
            _ => Err(ServerError::ConfigurationError(format!(
                "Unsupported database URI {url}. Use a sqlite: or postgres: URL."
            ))),
        }
    }
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    match Backend::from_url(&config.database_url)? {
        Backend::Sqlite => {
            let db = open_sqlite_database(&config.database_url).await?;
            serve(config, db).await
        },
        Backend::Postgres => {
            let db = open_postgres_database(&config.database_url).await?;
            serve(config, db).await
        },
    }
}

async fn serve<B: LoyaltyDatabase>(config: ServerConfig, mut db: B) -> Result<(), ServerError> {
    info!("🗃️ Using database {}", db.url());
    let (intake, tracker) = start_reconciliation_worker(db.clone(), config.accrual.clone(), config.tracker.clone())?;
    let srv = create_server_instance(config, db.clone(), intake)?;
    let result = srv.await.map_err(ServerError::from);
    info!("🚀️ HTTP server has stopped");
    stop_reconciliation_worker(tracker).await;
    db.close().await;
    result
}

/// Opens the SQLite database at `url`, creating the file and bringing the schema up to date if necessary.
pub async fn open_sqlite_database(url: &str) -> Result<SqliteDatabase, ServerError> {
    if let Some(parent) = sqlite_file_path(url).and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    SqliteDatabase::create_if_missing(url)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not create database {url}. {e}")))?;
    let db = SqliteDatabase::new_with_url(url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not connect to {url}. {e}")))?;
    migrate(&db).await?;
    Ok(db)
}

/// Connects to the Postgres database at `url`, creating the database and bringing the schema up to date if necessary.
pub async fn open_postgres_database(url: &str) -> Result<PostgresDatabase, ServerError> {
    PostgresDatabase::create_if_missing(url)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not create database {url}. {e}")))?;
    let db = PostgresDatabase::new_with_url(url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not connect to {url}. {e}")))?;
    migrate(&db).await?;
    Ok(db)
}

async fn migrate<B: LoyaltyDatabase>(db: &B) -> Result<(), ServerError> {
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))
}

/// The file behind a `sqlite:` url, if it names one.
fn sqlite_file_path(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}

pub fn create_server_instance<B: LoyaltyDatabase>(
    config: ServerConfig,
    db: B,
    intake: OrderIntake,
) -> Result<Server, ServerError> {
    let signer = CookieSigner::new(&config.cookie_secret)?;
    let options = ServerOptions::from_config(&config);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), intake.clone());
        let ledger_api = LedgerApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let user_scope = web::scope("/api/user")
            .service(RegisterRoute::<B>::new())
            .service(LoginRoute::<B>::new())
            .service(SubmitOrderRoute::<B>::new())
            .service(MyOrdersRoute::<B>::new())
            .service(MyBalanceRoute::<B>::new())
            .service(WithdrawRoute::<B>::new())
            .service(MyWithdrawalsRoute::<B>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lpg::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(ledger_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(signer.clone()))
            .app_data(web::Data::new(options))
            .app_data(json_config())
            .service(health)
            .service(user_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(config.run_address.as_str())?
    .run();
    Ok(srv)
}
