use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    any::{install_default_drivers, AnyArguments, AnyPoolOptions, AnyRow},
    migrate::Migrator,
    query::Query,
    Any, AnyPool, FromRow, Row,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info};

use crate::config::{DatabaseConfig, Driver};

static SQLITE_MIGRATOR: Migrator = sqlx::migrate!("./migrations/sqlite");
static POSTGRES_MIGRATOR: Migrator = sqlx::migrate!("./migrations/postgres");
static MYSQL_MIGRATOR: Migrator = sqlx::migrate!("./migrations/mysql");

/// A record stored in its own table, addressable by an integer primary key.
#[async_trait]
pub trait Model: for<'r> FromRow<'r, AnyRow> + Send + Sync + Unpin + Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static str;
    /// Columns that `Database::find_by` may filter on.
    const LOOKUP_COLUMNS: &'static [&'static str];

    fn id(&self) -> i64;

    /// Inserts the record, stamping both timestamps, and returns the generated id.
    async fn insert(&self, db: &Database) -> sqlx::Result<i64>;

    /// Writes the record back to its row and bumps `updated_at`.
    async fn update(&self, db: &Database) -> sqlx::Result<()>;
}

/// Shared handle over the connection pool. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct Database {
    pool: AnyPool,
    driver: Driver,
}

impl Database {
    pub async fn connect(cfg: &DatabaseConfig, root: &Path) -> anyhow::Result<Self> {
        install_default_drivers();
        let driver = cfg.kind()?;
        let url = cfg.url(root)?;

        let options = if driver == Driver::Sqlite && cfg.is_memory() {
            // every connection to :memory: is a separate database
            AnyPoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            let max_open = cfg.max_open_conns.max(1);
            // sqlx cannot cap idle connections; max_idle_conns is kept warm as the pool floor
            AnyPoolOptions::new()
                .max_connections(max_open)
                .min_connections(cfg.max_idle_conns.min(max_open))
        };

        let pool = options
            .connect(&url)
            .await
            .with_context(|| format!("connect to {} database {}", cfg.driver, cfg.database))?;
        info!(driver = %cfg.driver, database = %cfg.database, "database connected");
        Ok(Self { pool, driver })
    }

    pub(crate) fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        let migrator = match self.driver {
            Driver::Sqlite => &SQLITE_MIGRATOR,
            Driver::Postgres => &POSTGRES_MIGRATOR,
            Driver::Mysql => &MYSQL_MIGRATOR,
        };
        migrator.run(&self.pool).await.context("run migrations")?;
        Ok(())
    }

    /// Bind parameter `n` (1-based) in the driver's syntax.
    pub(crate) fn placeholder(&self, n: usize) -> String {
        match self.driver {
            Driver::Postgres => format!("${n}"),
            Driver::Sqlite | Driver::Mysql => "?".to_string(),
        }
    }

    pub(crate) fn insert_sql(&self, table: &str, columns: &[&str]) -> String {
        let values: Vec<String> = (1..=columns.len()).map(|n| self.placeholder(n)).collect();
        let mut sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            values.join(", ")
        );
        if self.supports_returning() {
            sql.push_str(" RETURNING id");
        }
        sql
    }

    /// `UPDATE` of `columns` followed by `WHERE id = ?`; bind the id last.
    pub(crate) fn update_sql(&self, table: &str, columns: &[&str]) -> String {
        let sets: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = {}", self.placeholder(i + 1)))
            .collect();
        format!(
            "UPDATE {table} SET {} WHERE id = {}",
            sets.join(", "),
            self.placeholder(columns.len() + 1)
        )
    }

    /// Runs a statement built with `insert_sql` and returns the new row's id.
    pub(crate) async fn execute_insert<'q>(
        &self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> sqlx::Result<i64> {
        if self.supports_returning() {
            let row = query.fetch_one(&self.pool).await?;
            row.try_get(0)
        } else {
            let done = query.execute(&self.pool).await?;
            done.last_insert_id().ok_or(sqlx::Error::RowNotFound)
        }
    }

    fn supports_returning(&self) -> bool {
        !matches!(self.driver, Driver::Mysql)
    }

    pub async fn all<M: Model>(&self) -> sqlx::Result<Vec<M>> {
        let sql = format!("SELECT {} FROM {} ORDER BY id", M::COLUMNS, M::TABLE);
        sqlx::query_as::<_, M>(&sql).fetch_all(&self.pool).await
    }

    pub async fn find<M: Model>(&self, id: i64) -> sqlx::Result<Option<M>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = {}",
            M::COLUMNS,
            M::TABLE,
            self.placeholder(1)
        );
        sqlx::query_as::<_, M>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// First record whose `column` equals `value`.
    pub async fn find_by<M: Model>(&self, column: &str, value: &str) -> sqlx::Result<Option<M>> {
        if !M::LOOKUP_COLUMNS.contains(&column) {
            return Err(sqlx::Error::ColumnNotFound(column.to_string()));
        }
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {} ORDER BY id LIMIT 1",
            M::COLUMNS,
            M::TABLE,
            column,
            self.placeholder(1)
        );
        sqlx::query_as::<_, M>(&sql)
            .bind(value.to_string())
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create<M: Model>(&self, record: &M) -> sqlx::Result<M> {
        let id = record.insert(self).await?;
        debug!(table = M::TABLE, id, "record created");
        self.find(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn save<M: Model>(&self, record: &M) -> sqlx::Result<M> {
        record.update(self).await?;
        debug!(table = M::TABLE, id = record.id(), "record saved");
        self.find(record.id()).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Deletes the record's row and returns the number of rows removed.
    pub async fn delete<M: Model>(&self, record: &M) -> sqlx::Result<u64> {
        let sql = format!("DELETE FROM {} WHERE id = {}", M::TABLE, self.placeholder(1));
        let result = sqlx::query(&sql)
            .bind(record.id())
            .execute(&self.pool)
            .await?;
        debug!(table = M::TABLE, id = record.id(), "record deleted");
        Ok(result.rows_affected())
    }
}

/// True when a write failed on a UNIQUE constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}

/// Timestamps are stored as RFC 3339 text so every driver reads them back the same way.
pub(crate) fn encode_timestamp(at: OffsetDateTime) -> sqlx::Result<String> {
    at.format(&Rfc3339)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

pub(crate) fn decode_timestamp(row: &AnyRow, column: &str) -> sqlx::Result<OffsetDateTime> {
    let raw: String = row.try_get(column)?;
    OffsetDateTime::parse(&raw, &Rfc3339).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
