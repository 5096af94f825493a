//! PostgreSQL chart store
//!
//! Each persist call runs in a single transaction that first takes an advisory
//! lock on the position group and, after writing, re-reads the group's depths.
//! A group that is no longer dense means another process wrote between our fetch
//! and persist; the transaction is rolled back and a conflict is reported.

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::ChartStore;
use crate::types::ChartEntry;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info, warn};

const GROUP_FILTER: &str = "LOWER(sport_code) = LOWER($1) AND LOWER(team_code) = LOWER($2) \
     AND chart_date = $3 AND LOWER(position_code) = LOWER($4)";

/// Chart store backed by the `chart_entries` table
#[derive(Debug, Clone)]
pub struct PgChartStore {
    pool: PgPool,
}

impl PgChartStore {
    /// Connect a pool using `config`
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        info!("Connected chart store to database (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create or upgrade the schema
    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Chart store migrations applied");
        Ok(())
    }

    async fn lock_group(tx: &mut Transaction<'_, Postgres>, entry: &ChartEntry) -> StoreResult<()> {
        let key = entry.group_key();
        let lock_name = format!(
            "{}|{}|{}|{}",
            key.sport_code, key.team_code, key.chart_date, key.position_code
        );

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(lock_name)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn update_depth(
        tx: &mut Transaction<'_, Postgres>,
        entry: &ChartEntry,
    ) -> StoreResult<()> {
        let sql = format!(
            "UPDATE chart_entries SET depth = $6, updated_at = NOW() \
             WHERE {GROUP_FILTER} AND player_id = $5"
        );

        let result = sqlx::query(&sql)
            .bind(&entry.sport_code)
            .bind(&entry.team_code)
            .bind(entry.chart_date)
            .bind(&entry.position_code)
            .bind(entry.player_id)
            .bind(entry.depth)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "player {} in position {}",
                entry.player_id, entry.position_code
            )));
        }
        Ok(())
    }

    async fn verify_dense(tx: &mut Transaction<'_, Postgres>, entry: &ChartEntry) -> StoreResult<()> {
        let sql = format!("SELECT depth FROM chart_entries WHERE {GROUP_FILTER} ORDER BY depth");

        let depths: Vec<i32> = sqlx::query_scalar(&sql)
            .bind(&entry.sport_code)
            .bind(&entry.team_code)
            .bind(entry.chart_date)
            .bind(&entry.position_code)
            .fetch_all(&mut **tx)
            .await?;

        if depths.iter().zip(1..).any(|(&depth, expected)| depth != expected) {
            warn!(
                "Position {} of {}/{} is not dense after write: {:?}",
                entry.position_code, entry.sport_code, entry.team_code, depths
            );
            return Err(StoreError::conflict(format!(
                "position {} changed during the operation",
                entry.position_code
            )));
        }
        Ok(())
    }

    fn map_insert_error(err: sqlx::Error, entry: &ChartEntry) -> StoreError {
        let unique_violation =
            matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());

        if unique_violation {
            StoreError::already_exists(format!(
                "player {} in position {}",
                entry.player_id, entry.position_code
            ))
        } else {
            StoreError::Database(err)
        }
    }
}

#[async_trait::async_trait]
impl ChartStore for PgChartStore {
    async fn fetch_group(
        &self,
        sport_code: &str,
        team_code: &str,
        chart_date: NaiveDate,
    ) -> StoreResult<Vec<ChartEntry>> {
        let entries = sqlx::query_as::<_, ChartEntry>(
            "SELECT sport_code, team_code, chart_date, position_code, player_id, player_name, depth \
             FROM chart_entries \
             WHERE LOWER(sport_code) = LOWER($1) AND LOWER(team_code) = LOWER($2) AND chart_date = $3 \
             ORDER BY id",
        )
        .bind(sport_code)
        .bind(team_code)
        .bind(chart_date)
        .fetch_all(&self.pool)
        .await?;

        debug!("Fetched {} entries for {}/{} on {}", entries.len(), sport_code, team_code, chart_date);
        Ok(entries)
    }

    async fn persist_add(&self, new_entry: &ChartEntry, shifted: &[ChartEntry]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::lock_group(&mut tx, new_entry).await?;

        for entry in shifted {
            Self::update_depth(&mut tx, entry).await?;
        }

        sqlx::query(
            "INSERT INTO chart_entries \
             (sport_code, team_code, chart_date, position_code, player_id, player_name, depth) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&new_entry.sport_code)
        .bind(&new_entry.team_code)
        .bind(new_entry.chart_date)
        .bind(&new_entry.position_code)
        .bind(new_entry.player_id)
        .bind(&new_entry.player_name)
        .bind(new_entry.depth)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::map_insert_error(e, new_entry))?;

        Self::verify_dense(&mut tx, new_entry).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn persist_remove(
        &self,
        removed: &ChartEntry,
        shifted: &[ChartEntry],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::lock_group(&mut tx, removed).await?;

        let sql = format!("DELETE FROM chart_entries WHERE {GROUP_FILTER} AND player_id = $5");
        let result = sqlx::query(&sql)
            .bind(&removed.sport_code)
            .bind(&removed.team_code)
            .bind(removed.chart_date)
            .bind(&removed.position_code)
            .bind(removed.player_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "player {} in position {}",
                removed.player_id, removed.position_code
            )));
        }

        for entry in shifted {
            Self::update_depth(&mut tx, entry).await?;
        }

        Self::verify_dense(&mut tx, removed).await?;
        tx.commit().await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
