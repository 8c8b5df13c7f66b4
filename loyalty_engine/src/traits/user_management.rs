use thiserror::Error;

use crate::db_types::{NewUserAccount, UserAccount};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The login {0} is already taken")]
    LoginTaken(String),
    #[error("Invalid login: {0}")]
    InvalidLogin(String),
    #[error("Invalid password: {0}")]
    InvalidPassword(String),
    #[error("Invalid login or password")]
    InvalidCredentials,
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates the user account along with a zero balance. Fails with [`AuthApiError::LoginTaken`] if the login
    /// exists.
    async fn create_user(&self, user: NewUserAccount) -> Result<UserAccount, AuthApiError>;

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<UserAccount>, AuthApiError>;
}
