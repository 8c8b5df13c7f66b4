use std::{fmt::Debug, ops::RangeInclusive};

use log::*;

use crate::{
    db_types::{NewUserAccount, UserAccount},
    helpers::{hash_password, verify_password},
    traits::{AuthApiError, UserManagement},
};

pub const LOGIN_LENGTH: RangeInclusive<usize> = 3..=50;
pub const PASSWORD_LENGTH: RangeInclusive<usize> = 6..=50;

pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    /// Creates a new user with a zero balance.
    pub async fn register(&self, login: &str, password: &str) -> Result<UserAccount, AuthApiError> {
        validate_credentials(login, password)?;
        let user = NewUserAccount { login: login.to_string(), password_hash: hash_password(password) };
        let user = self.db.create_user(user).await?;
        info!("🔑️ Registered user #{} ({})", user.id, user.login);
        Ok(user)
    }

    /// Returns the account if the login exists and the password matches. Unknown logins and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<UserAccount, AuthApiError> {
        match self.db.fetch_user_by_login(login).await? {
            Some(user) if verify_password(password, &user.password_hash) => {
                debug!("🔑️ User #{} logged in", user.id);
                Ok(user)
            },
            Some(user) => {
                debug!("🔑️ Wrong password for user #{}", user.id);
                Err(AuthApiError::InvalidCredentials)
            },
            None => {
                debug!("🔑️ Login attempt for unknown user {login}");
                Err(AuthApiError::InvalidCredentials)
            },
        }
    }
}

fn validate_credentials(login: &str, password: &str) -> Result<(), AuthApiError> {
    let login_len = login.chars().count();
    if !LOGIN_LENGTH.contains(&login_len) {
        return Err(AuthApiError::InvalidLogin(format!(
            "must be between {} and {} characters",
            LOGIN_LENGTH.start(),
            LOGIN_LENGTH.end()
        )));
    }
    if login.chars().any(char::is_whitespace) {
        return Err(AuthApiError::InvalidLogin("must not contain whitespace".to_string()));
    }
    let password_len = password.chars().count();
    if !PASSWORD_LENGTH.contains(&password_len) {
        return Err(AuthApiError::InvalidPassword(format!(
            "must be between {} and {} characters",
            PASSWORD_LENGTH.start(),
            PASSWORD_LENGTH.end()
        )));
    }
    Ok(())
}
