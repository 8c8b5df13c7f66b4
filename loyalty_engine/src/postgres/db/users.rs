use sqlx::PgConnection;

use crate::db_types::{NewUserAccount, UserAccount};

/// Inserts the user. Fails with a unique-constraint violation if the login is already taken.
pub async fn insert_user(user: NewUserAccount, conn: &mut PgConnection) -> Result<UserAccount, sqlx::Error> {
    let user = sqlx::query_as("INSERT INTO users (login, password_hash) VALUES ($1, $2) RETURNING *")
        .bind(user.login)
        .bind(user.password_hash)
        .fetch_one(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_user_by_login(login: &str, conn: &mut PgConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE login = $1").bind(login).fetch_optional(conn).await?;
    Ok(user)
}
