//! Postgres-backed credential store.
//!
//! Identity uniqueness is enforced by the `users` table constraints, and the
//! refresh-slot compare-and-swap rides on a conditional `UPDATE`, so every
//! operation stays atomic at the single-principal granularity.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::store::{CreateOutcome, Credential, CredentialStore, NewCredential, UpdateOutcome};

const CREDENTIAL_COLUMNS: &str = "id, username, email, full_name, avatar_url, cover_image_url, \
     password_hash, refresh_token, created_at, updated_at";

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn credential_from_row(row: &PgRow) -> Credential {
    Credential {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        full_name: row.get("full_name"),
        avatar_url: row.get("avatar_url"),
        cover_image_url: row.get("cover_image_url"),
        password_hash: row.get("password_hash"),
        refresh_token: row.get("refresh_token"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Credential>> {
        let query = format!(
            "SELECT {CREDENTIAL_COLUMNS} FROM users WHERE username = $1 OR email = $1 LIMIT 1"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(identity)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup principal by identity")?;

        Ok(row.as_ref().map(credential_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>> {
        let query = format!("SELECT {CREDENTIAL_COLUMNS} FROM users WHERE id = $1 LIMIT 1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup principal by id")?;

        Ok(row.as_ref().map(credential_from_row))
    }

    async fn create(&self, new: NewCredential) -> Result<CreateOutcome> {
        let query = format!(
            r"
        INSERT INTO users
            (username, email, full_name, avatar_url, cover_image_url, password_hash)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {CREDENTIAL_COLUMNS}
    "
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.full_name)
            .bind(&new.avatar_url)
            .bind(&new.cover_image_url)
            .bind(&new.password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(CreateOutcome::Created(credential_from_row(&row))),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::DuplicateIdentity),
            Err(err) => Err(err).context("failed to insert principal"),
        }
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let query = "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update password")?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<UpdateOutcome> {
        let query = format!(
            r"
        UPDATE users
        SET full_name = COALESCE($2, full_name),
            email = COALESCE($3, email),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {CREDENTIAL_COLUMNS}
    "
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(full_name)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(Some(row)) => Ok(UpdateOutcome::Updated(credential_from_row(&row))),
            Ok(None) => Ok(UpdateOutcome::Missing),
            Err(err) if is_unique_violation(&err) => Ok(UpdateOutcome::DuplicateIdentity),
            Err(err) => Err(err).context("failed to update profile"),
        }
    }

    async fn set_avatar_url(&self, id: Uuid, url: &str) -> Result<Option<Credential>> {
        let query = format!(
            "UPDATE users SET avatar_url = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {CREDENTIAL_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(url)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update avatar")?;

        Ok(row.as_ref().map(credential_from_row))
    }

    async fn set_cover_image_url(&self, id: Uuid, url: &str) -> Result<Option<Credential>> {
        let query = format!(
            "UPDATE users SET cover_image_url = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {CREDENTIAL_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(url)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update cover image")?;

        Ok(row.as_ref().map(credential_from_row))
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<bool> {
        let query = "UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to set refresh token")?;

        Ok(result.rows_affected() > 0)
    }

    async fn swap_refresh_token(&self, id: Uuid, current: &str, next: &str) -> Result<bool> {
        // The WHERE clause is the compare half of the swap; a concurrent
        // rotation that already replaced the slot makes this a no-op.
        let query = "UPDATE users SET refresh_token = $3, updated_at = NOW() \
             WHERE id = $1 AND refresh_token = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(current)
            .bind(next)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to rotate refresh token")?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
