use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use dispatch_domain::{CreateUser, DispatchError, DispatchResult, User, UserRepository};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: &sqlx::postgres::PgRow) -> DispatchResult<User> {
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn map_unique_violation(err: sqlx::Error) -> DispatchError {
        match &err {
            sqlx::Error::Database(db_err) if db_err.constraint().is_some() => {
                let constraint = db_err.constraint().unwrap_or("");
                if constraint.contains("username") {
                    DispatchError::validation_error("Username already registered")
                } else if constraint.contains("email") {
                    DispatchError::validation_error("Email already registered")
                } else {
                    err.into()
                }
            }
            _ => err.into(),
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create(&self, user: &CreateUser) -> DispatchResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, is_active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, username, email, password_hash, is_active, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::map_unique_violation)?;

        let created = Self::row_to_user(&row)?;
        debug!(user_id = created.id, "user created");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> DispatchResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> DispatchResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_active, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> DispatchResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_active, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }
}
