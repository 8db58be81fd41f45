use async_trait::async_trait;
use burrow_core::code_store::{CodeRecord, CodeStore, ReadCodeStore};
use burrow_core::error::{Result, StorageError};
use burrow_core::sequence::{Advance, SequenceSeed, SequenceState, SequenceStore};
use burrow_core::ShortPath;
use jiff::Timestamp;
use sqlx::{MySqlPool, Row};

const CODES_DDL: &str = include_str!("../ddl/mysql/codes.sql");
const CODE_SEQUENCE_DDL: &str = include_str!("../ddl/mysql/code_sequence.sql");

/// MySQL implementation of both store contracts.
///
/// Codes live in `codes`, keyed by a binary-collated `path` primary key, so
/// uniqueness is enforced by the database. The sequence is the single row
/// `id = 1` of `code_sequence`; advancing it is one conditional `UPDATE`,
/// which keeps concurrent service instances from reusing a counter value.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `codes` and `code_sequence` tables if they are missing.
    pub async fn create_schema(&self) -> Result<()> {
        for ddl in [CODES_DDL, CODE_SEQUENCE_DDL] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        Ok(())
    }
}

fn parse_created_at(micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{micros}': {e}"))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

/// Sorts driver errors into the store taxonomy.
///
/// `RowNotFound` only comes from the `fetch_one` reads of the sequence row,
/// so it means the row was never created.
fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    use sqlx::Error as E;

    match err {
        E::RowNotFound => StorageError::Uninitialized,
        E::PoolTimedOut => StorageError::Timeout(err.to_string()),
        E::PoolClosed | E::WorkerCrashed | E::Io(_) | E::Tls(_) | E::Protocol(_) => {
            StorageError::Unavailable(err.to_string())
        }
        E::ColumnNotFound(_) | E::ColumnDecode { .. } | E::Decode(_) => {
            StorageError::InvalidData(err.to_string())
        }
        other => StorageError::Query(other.to_string()),
    }
}

#[async_trait]
impl ReadCodeStore for MySqlStore {
    async fn get(&self, path: &ShortPath) -> Result<Option<CodeRecord>> {
        let row = sqlx::query(
            r#"
            SELECT payload, is_literal, created_at
            FROM codes
            WHERE path = ?
            LIMIT 1
            "#,
        )
        .bind(path.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row.try_get("payload").map_err(map_sqlx_error)?;
        let is_literal: bool = row.try_get("is_literal").map_err(map_sqlx_error)?;
        let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

        Ok(Some(CodeRecord {
            payload,
            is_literal,
            created_at: parse_created_at(created_at)?,
        }))
    }

    async fn exists(&self, path: &ShortPath) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM codes
            WHERE path = ?
            LIMIT 1
            "#,
        )
        .bind(path.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }
}

#[async_trait]
impl CodeStore for MySqlStore {
    async fn insert(&self, path: &ShortPath, record: CodeRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO codes (path, payload, is_literal, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(path.as_str())
        .bind(record.payload)
        .bind(record.is_literal)
        .bind(record.created_at.as_microsecond())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(path.to_string())),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }
}

#[async_trait]
impl SequenceStore for MySqlStore {
    async fn ensure_initialized(&self, seed: SequenceSeed) -> Result<SequenceSeed> {
        sqlx::query(
            r#"
            INSERT INTO code_sequence (id, a, b, counter, last_output)
            VALUES (1, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE id = id
            "#,
        )
        .bind(seed.a)
        .bind(seed.b)
        .bind(seed.state.counter)
        .bind(seed.state.last_output)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let row = sqlx::query(
            r#"
            SELECT a, b, counter, last_output
            FROM code_sequence
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(SequenceSeed {
            a: row.try_get("a").map_err(map_sqlx_error)?,
            b: row.try_get("b").map_err(map_sqlx_error)?,
            state: SequenceState {
                counter: row.try_get("counter").map_err(map_sqlx_error)?,
                last_output: row.try_get("last_output").map_err(map_sqlx_error)?,
            },
        })
    }

    async fn read_state(&self) -> Result<SequenceState> {
        let row = sqlx::query(
            r#"
            SELECT counter, last_output
            FROM code_sequence
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(SequenceState {
            counter: row.try_get("counter").map_err(map_sqlx_error)?,
            last_output: row.try_get("last_output").map_err(map_sqlx_error)?,
        })
    }

    async fn advance(&self, observed: SequenceState, next_output: u64) -> Result<Advance> {
        let result = sqlx::query(
            r#"
            UPDATE code_sequence
            SET counter = counter + 1, last_output = ?
            WHERE id = 1
              AND counter = ?
              AND last_output = ?
            "#,
        )
        .bind(next_output)
        .bind(observed.counter)
        .bind(observed.last_output)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        // `counter` always changes, so affected rows equal matched rows.
        if result.rows_affected() == 1 {
            Ok(Advance::Committed(observed.counter + 1))
        } else {
            Ok(Advance::Stale)
        }
    }
}
