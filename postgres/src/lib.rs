//! `PostgreSQL` registrant repository for gatepass.
//!
//! Implements [`RegistrantRepository`] on top of a `sqlx` connection pool:
//!
//! - Unique constraints on email, roll number and credential secret
//! - Admission as a single conditional `UPDATE ... RETURNING`
//! - Embedded migrations
//!
//! # Example
//!
//! ```no_run
//! use gatepass_postgres::PostgresRegistrantRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/gatepass").await?;
//! let repo = PostgresRegistrantRepository::new(pool);
//! repo.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use gatepass_core::credential::CredentialSecret;
use gatepass_core::providers::RegistrantRepository;
use gatepass_core::{
    DuplicateField, EntryCount, PassError, Purpose, Registrant, RegistrantId, Result,
};
use sqlx::PgPool;
use uuid::Uuid;

const EMAIL_CONSTRAINT: &str = "registrants_email_key";
const ROLL_NUMBER_CONSTRAINT: &str = "registrants_roll_number_key";

const REGISTRANT_COLUMNS: &str = "id, name, roll_number, email, purpose, entry_count, \
     credential_secret, asset_ref, created_at";

/// A `registrants` row as stored.
#[derive(Debug, sqlx::FromRow)]
struct RegistrantRow {
    id: Uuid,
    name: String,
    roll_number: String,
    email: String,
    purpose: String,
    entry_count: i16,
    credential_secret: String,
    asset_ref: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RegistrantRow> for Registrant {
    type Error = PassError;

    fn try_from(row: RegistrantRow) -> Result<Self> {
        let purpose = Purpose::parse(&row.purpose)
            .map_err(|e| PassError::Database(format!("Corrupt purpose column: {e}")))?;
        let entry_count = EntryCount::try_from(i64::from(row.entry_count))
            .map_err(|e| PassError::Database(format!("Corrupt entry_count column: {e}")))?;

        Ok(Self {
            id: RegistrantId(row.id),
            name: row.name,
            roll_number: row.roll_number,
            email: row.email,
            purpose,
            entry_count,
            credential_secret: CredentialSecret::from_stored(row.credential_secret),
            asset_ref: row.asset_ref,
            created_at: row.created_at,
        })
    }
}

/// Map a `sqlx` error to a [`PassError::Database`] and count it.
fn db_error(operation: &'static str, e: &sqlx::Error) -> PassError {
    metrics::counter!("gatepass_repository_errors_total", "operation" => operation).increment(1);
    PassError::Database(format!("Failed to {operation}: {e}"))
}

/// `PostgreSQL` registrant repository.
#[derive(Debug, Clone)]
pub struct PostgresRegistrantRepository {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresRegistrantRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PassError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    async fn secret_exists(&self, secret: &CredentialSecret) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM registrants WHERE credential_secret = $1)",
        )
        .bind(secret.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("look up credential", &e))?;

        Ok(exists)
    }
}

impl RegistrantRepository for PostgresRegistrantRepository {
    async fn insert(&self, registrant: &Registrant) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO registrants
                (id, name, roll_number, email, purpose, entry_count,
                 credential_secret, asset_ref, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(registrant.id.0)
        .bind(&registrant.name)
        .bind(&registrant.roll_number)
        .bind(&registrant.email)
        .bind(registrant.purpose.as_str())
        .bind(i16::from(registrant.entry_count.get()))
        .bind(registrant.credential_secret.as_str())
        .bind(registrant.asset_ref.as_deref())
        .bind(registrant.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // A concurrent registration can slip past the duplicate pre-check.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    match db_err.constraint() {
                        Some(EMAIL_CONSTRAINT) => {
                            return PassError::DuplicateEntity {
                                field: DuplicateField::Email,
                            };
                        }
                        Some(ROLL_NUMBER_CONSTRAINT) => {
                            return PassError::DuplicateEntity {
                                field: DuplicateField::RollNumber,
                            };
                        }
                        _ => {}
                    }
                }
            }
            db_error("insert registrant", &e)
        })?;

        Ok(())
    }

    async fn find_duplicate(
        &self,
        email: &str,
        roll_number: &str,
    ) -> Result<Option<DuplicateField>> {
        let (email_taken, roll_taken): (bool, bool) = sqlx::query_as(
            r"
            SELECT
                EXISTS (SELECT 1 FROM registrants WHERE email = $1),
                EXISTS (SELECT 1 FROM registrants WHERE roll_number = $2)
            ",
        )
        .bind(email)
        .bind(roll_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("check duplicates", &e))?;

        Ok(if email_taken {
            Some(DuplicateField::Email)
        } else if roll_taken {
            Some(DuplicateField::RollNumber)
        } else {
            None
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Registrant>> {
        let query = format!("SELECT {REGISTRANT_COLUMNS} FROM registrants WHERE email = $1");
        let row: Option<RegistrantRow> = sqlx::query_as(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("get registrant", &e))?;

        row.map(Registrant::try_from).transpose()
    }

    async fn admit(&self, secret: &CredentialSecret, cap: EntryCount) -> Result<Registrant> {
        let query = format!(
            "UPDATE registrants SET entry_count = entry_count + 1 \
             WHERE credential_secret = $1 AND entry_count < $2 \
             RETURNING {REGISTRANT_COLUMNS}"
        );
        let row: Option<RegistrantRow> = sqlx::query_as(&query)
            .bind(secret.as_str())
            .bind(i16::from(cap.get()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("admit registrant", &e))?;

        match row {
            Some(row) => Registrant::try_from(row),
            None if self.secret_exists(secret).await? => Err(PassError::LimitReached),
            None => Err(PassError::NotFound),
        }
    }

    async fn attach_asset(&self, email: &str, asset_ref: &str) -> Result<()> {
        let result = sqlx::query("UPDATE registrants SET asset_ref = $2 WHERE email = $1")
            .bind(email)
            .bind(asset_ref)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("attach asset", &e))?;

        if result.rows_affected() == 0 {
            return Err(PassError::NotFound);
        }

        tracing::debug!(asset_ref, "Asset reference recorded");
        Ok(())
    }
}
