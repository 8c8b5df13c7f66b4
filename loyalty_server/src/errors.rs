use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use loyalty_engine::{AuthApiError, LedgerError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The login {0} is already taken")]
    LoginTaken(String),
    #[error("{0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Order {0} was submitted by another user")]
    OrderBelongsToAnotherUser(String),
    #[error("Insufficient funds. {0}")]
    InsufficientFunds(String),
    #[error("Invalid withdrawal. {0}")]
    InvalidWithdrawal(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::LoginTaken(_) => StatusCode::CONFLICT,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OrderBelongsToAnotherUser(_) => StatusCode::CONFLICT,
            Self::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
            Self::InvalidWithdrawal(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No session cookie was provided. Please log in.")]
    MissingCookie,
    #[error("The session cookie is invalid. Please log in again.")]
    InvalidCookie,
    #[error("Invalid login or password.")]
    InvalidCredentials,
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::LoginTaken(login) => Self::LoginTaken(login),
            AuthApiError::InvalidLogin(_) | AuthApiError::InvalidPassword(_) => Self::InvalidRequestBody(e.to_string()),
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::DatabaseError(e) => {
                error!("💻️ Database error in the auth API. {e}");
                Self::BackendError(format!("Database error: {e}"))
            },
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::InvalidOrderNumber(number) => Self::InvalidOrderNumber(number),
            OrderFlowError::OwnedByAnotherUser(number) => Self::OrderBelongsToAnotherUser(number.to_string()),
            OrderFlowError::DatabaseError(e) => {
                error!("💻️ Database error in the order flow API. {e}");
                Self::BackendError(format!("Database error: {e}"))
            },
        }
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds { .. } => Self::InsufficientFunds(e.to_string()),
            LedgerError::InvalidReference(_) | LedgerError::InvalidAmount(_) => Self::InvalidWithdrawal(e.to_string()),
            LedgerError::BalanceOverflow(user_id) => {
                error!("💻️ The balance of user #{user_id} cannot hold any more points");
                Self::BackendError(e.to_string())
            },
            LedgerError::DatabaseError(e) => {
                error!("💻️ Database error in the ledger API. {e}");
                Self::BackendError(format!("Database error: {e}"))
            },
        }
    }
}
