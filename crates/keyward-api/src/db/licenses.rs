//! License persistence on Postgres.
//!
//! Every conditional write is a single `UPDATE ... WHERE ... RETURNING`
//! statement, so Postgres row locking provides the atomicity the
//! [`LicenseStore`] contract requires. The bind statement only matches a
//! row whose `consumer_id` is still NULL: two instances racing on the same
//! key cannot both get a row back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyward_core::{ClientId, License, LicenseId, LicenseKey, NewLicense, Plan, Timestamp};
use keyward_store::{LicenseStore, Mutation, Precondition, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str =
    "id, key, plan, created_at, expires_at, is_active, consumer_id, consumed_at, deactivated_at";

/// SQLSTATE for `datetime_field_overflow`.
const DATETIME_OVERFLOW: &str = "22008";

/// [`LicenseStore`] backed by the `licenses` table.
#[derive(Debug, Clone)]
pub struct PgLicenseStore {
    pool: PgPool,
}

impl PgLicenseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: LicenseId) -> Result<bool, StoreError> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM licenses WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl LicenseStore for PgLicenseStore {
    async fn create(&self, new: NewLicense) -> Result<License, StoreError> {
        let id = LicenseId::new();
        let sql = format!(
            "INSERT INTO licenses (id, key, plan, created_at, expires_at, is_active)
             VALUES ($1, $2, $3, $4, $5, FALSE)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, LicenseRow>(&sql)
            .bind(id.0)
            .bind(new.key.as_str())
            .bind(new.plan.as_str())
            .bind(*new.created_at.as_datetime())
            .bind(*new.expires_at.as_datetime())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::DuplicateKey
                }
                other => backend(other),
            })?;
        row.into_license()
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<License>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM licenses WHERE key = $1");
        sqlx::query_as::<_, LicenseRow>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(LicenseRow::into_license)
            .transpose()
    }

    async fn find_by_id(&self, id: LicenseId) -> Result<Option<License>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM licenses WHERE id = $1");
        sqlx::query_as::<_, LicenseRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .map(LicenseRow::into_license)
            .transpose()
    }

    async fn list_all(&self) -> Result<Vec<License>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM licenses ORDER BY seq");
        sqlx::query_as::<_, LicenseRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?
            .into_iter()
            .map(LicenseRow::into_license)
            .collect()
    }

    async fn compare_and_update(
        &self,
        id: LicenseId,
        precondition: Precondition,
        mutation: Mutation,
    ) -> Result<License, StoreError> {
        // Bind is write-once regardless of the caller's precondition.
        let guard = match (&mutation, precondition) {
            (Mutation::Bind { .. }, _) | (_, Precondition::Bindable) => {
                " AND consumer_id IS NULL AND deactivated_at IS NULL"
            }
            (_, Precondition::Always) => "",
        };

        let row = match &mutation {
            Mutation::Bind {
                consumer_id,
                consumed_at,
            } => {
                let sql = format!(
                    "UPDATE licenses SET consumer_id = $2, consumed_at = $3, is_active = TRUE
                     WHERE id = $1{guard} RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, LicenseRow>(&sql)
                    .bind(id.0)
                    .bind(consumer_id.as_str())
                    .bind(*consumed_at.as_datetime())
                    .fetch_optional(&self.pool)
                    .await
            }
            Mutation::Deactivate { at } => {
                let sql = format!(
                    "UPDATE licenses SET is_active = FALSE, deactivated_at = COALESCE(deactivated_at, $2)
                     WHERE id = $1{guard} RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, LicenseRow>(&sql)
                    .bind(id.0)
                    .bind(*at.as_datetime())
                    .fetch_optional(&self.pool)
                    .await
            }
            Mutation::ExtendExpiry { by } => {
                let sql = format!(
                    "UPDATE licenses SET expires_at = expires_at + ($2::bigint * INTERVAL '1 second')
                     WHERE id = $1{guard} RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, LicenseRow>(&sql)
                    .bind(id.0)
                    .bind(by.num_seconds())
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some(DATETIME_OVERFLOW) => {
                StoreError::Rejected(format!("{} overflows expires_at", mutation.name()))
            }
            other => backend(other),
        })?;

        match row {
            Some(row) => row.into_license(),
            None if self.exists(id).await? => {
                tracing::debug!(license_id = %id, mutation = mutation.name(), "precondition failed");
                Err(StoreError::Conflict(id))
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct LicenseRow {
    id: Uuid,
    key: String,
    plan: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    is_active: bool,
    consumer_id: Option<String>,
    consumed_at: Option<DateTime<Utc>>,
    deactivated_at: Option<DateTime<Utc>>,
}

impl LicenseRow {
    fn into_license(self) -> Result<License, StoreError> {
        let id = self.id;
        let corrupt = |field: &str, e: keyward_core::ValidationError| {
            tracing::error!(license_id = %id, field, error = %e, "invalid license row in database");
            StoreError::Backend(format!("invalid {field} in license row {id}"))
        };
        Ok(License {
            id: LicenseId(self.id),
            key: LicenseKey::from_stored(self.key),
            plan: Plan::new(self.plan).map_err(|e| corrupt("plan", e))?,
            created_at: Timestamp::from_utc(self.created_at),
            expires_at: Timestamp::from_utc(self.expires_at),
            is_active: self.is_active,
            consumer_id: self
                .consumer_id
                .map(ClientId::new)
                .transpose()
                .map_err(|e| corrupt("consumer_id", e))?,
            consumed_at: self.consumed_at.map(Timestamp::from_utc),
            deactivated_at: self.deactivated_at.map(Timestamp::from_utc),
        })
    }
}
