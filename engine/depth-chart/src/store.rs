//! Chart store trait and the in-memory implementation

use crate::error::{StoreError, StoreResult};
use crate::types::{same_code, ChartEntry};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Storage for depth chart entries.
///
/// Implementations compare sport, team and position codes case-insensitively
/// and apply each persist call atomically: either every write lands or none do.
#[async_trait::async_trait]
pub trait ChartStore: Send + Sync {
    /// All entries, across every position, of a team's chart for one period
    async fn fetch_group(
        &self,
        sport_code: &str,
        team_code: &str,
        chart_date: NaiveDate,
    ) -> StoreResult<Vec<ChartEntry>>;

    /// Insert `new_entry` and update the depths of `shifted`
    async fn persist_add(&self, new_entry: &ChartEntry, shifted: &[ChartEntry]) -> StoreResult<()>;

    /// Delete `removed` and update the depths of `shifted`
    async fn persist_remove(&self, removed: &ChartEntry, shifted: &[ChartEntry])
        -> StoreResult<()>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// In-memory chart store (for testing and development)
#[derive(Debug, Clone, Default)]
pub struct InMemoryChartStore {
    entries: Arc<Mutex<Vec<ChartEntry>>>,
}

impl InMemoryChartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`, kept in the given order
    pub fn with_entries(entries: Vec<ChartEntry>) -> Self {
        Self { entries: Arc::new(Mutex::new(entries)) }
    }

    /// Number of stored entries across all charts
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn apply_shifts(entries: &mut [ChartEntry], shifted: &[ChartEntry]) {
        for update in shifted {
            if let Some(slot) = entries.iter_mut().find(|e| e.same_slot(update)) {
                slot.depth = update.depth;
            }
        }
    }

    fn check_shifts_exist(entries: &[ChartEntry], shifted: &[ChartEntry]) -> StoreResult<()> {
        match shifted.iter().find(|update| !entries.iter().any(|e| e.same_slot(update))) {
            Some(missing) => Err(StoreError::not_found(format!(
                "player {} in position {}",
                missing.player_id, missing.position_code
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ChartStore for InMemoryChartStore {
    async fn fetch_group(
        &self,
        sport_code: &str,
        team_code: &str,
        chart_date: NaiveDate,
    ) -> StoreResult<Vec<ChartEntry>> {
        let entries = self.entries.lock().await;

        Ok(entries
            .iter()
            .filter(|e| {
                same_code(&e.sport_code, sport_code)
                    && same_code(&e.team_code, team_code)
                    && e.chart_date == chart_date
            })
            .cloned()
            .collect())
    }

    async fn persist_add(&self, new_entry: &ChartEntry, shifted: &[ChartEntry]) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;

        // Validate everything before the first write
        if entries.iter().any(|e| e.same_slot(new_entry)) {
            return Err(StoreError::already_exists(format!(
                "player {} in position {}",
                new_entry.player_id, new_entry.position_code
            )));
        }
        Self::check_shifts_exist(&entries, shifted)?;

        Self::apply_shifts(&mut entries, shifted);
        entries.push(new_entry.clone());

        Ok(())
    }

    async fn persist_remove(
        &self,
        removed: &ChartEntry,
        shifted: &[ChartEntry],
    ) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;

        let index = entries.iter().position(|e| e.same_slot(removed)).ok_or_else(|| {
            StoreError::not_found(format!(
                "player {} in position {}",
                removed.player_id, removed.position_code
            ))
        })?;
        Self::check_shifts_exist(&entries, shifted)?;

        entries.remove(index);
        Self::apply_shifts(&mut entries, shifted);

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
