//! Depth chart service: validation, locking and persistence around the ranking engine

use crate::error::{DepthChartError, Result, StoreError};
use crate::locks::GroupLocks;
use crate::period::ChartPeriod;
use crate::ranking;
use crate::store::ChartStore;
use crate::types::{
    AddPlayerRequest, ChartEntry, FullDepthChart, GroupKey, PlayerRequest, PlayerSummary,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Operations every sport's depth chart handler provides
#[async_trait::async_trait]
pub trait DepthChartOps: Send + Sync {
    /// Sport code served by this handler (e.g., "NFL")
    fn sport_code(&self) -> &str;

    /// Teams served by this handler
    fn team_codes(&self) -> &[String];

    /// Add a player to a position, at the requested depth or at the end
    async fn add_player(&self, team_code: &str, request: AddPlayerRequest) -> Result<ChartEntry>;

    /// Remove a player from a position and return who was removed
    async fn remove_player(&self, team_code: &str, request: PlayerRequest)
        -> Result<PlayerSummary>;

    /// Players ranked below the given player in the same position
    async fn get_backups(
        &self,
        team_code: &str,
        request: PlayerRequest,
    ) -> Result<Vec<PlayerSummary>>;

    /// Every position of the team's chart for one period
    async fn get_full_chart(
        &self,
        team_code: &str,
        chart_date: Option<NaiveDate>,
    ) -> Result<FullDepthChart>;
}

/// Sport-level settings a handler is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SportProfile {
    pub sport_code: String,
    pub team_codes: Vec<String>,
    pub period: ChartPeriod,
}

impl SportProfile {
    pub fn new(sport_code: &str, team_codes: &[&str]) -> Self {
        Self {
            sport_code: sport_code.to_string(),
            team_codes: team_codes.iter().map(|t| t.to_string()).collect(),
            period: ChartPeriod::default(),
        }
    }

    pub fn with_period(mut self, period: ChartPeriod) -> Self {
        self.period = period;
        self
    }
}

/// Standard depth chart handler: dense 1-based ranks per position
pub struct DepthChartService {
    profile: SportProfile,
    store: Arc<dyn ChartStore>,
    locks: GroupLocks,
}

impl DepthChartService {
    pub fn new(profile: SportProfile, store: Arc<dyn ChartStore>) -> Self {
        Self { profile, store, locks: GroupLocks::new() }
    }

    pub fn profile(&self) -> &SportProfile {
        &self.profile
    }

    /// Load one position group and check its ranks before planning against it
    async fn load_position(
        &self,
        team_code: &str,
        chart_date: NaiveDate,
        position_code: &str,
    ) -> Result<Vec<ChartEntry>> {
        let entries =
            self.store.fetch_group(&self.profile.sport_code, team_code, chart_date).await?;

        let group: Vec<ChartEntry> =
            entries.into_iter().filter(|e| e.in_position(position_code)).collect();

        if !ranking::is_dense(&group) {
            error!(
                "Position {} of {}/{} on {} has non-dense depths",
                position_code, self.profile.sport_code, team_code, chart_date
            );
            return Err(StoreError::corruption(format!(
                "position {position_code} on {chart_date} has non-dense depths"
            ))
            .into());
        }

        Ok(group)
    }

    fn group_key(&self, team_code: &str, chart_date: NaiveDate, position_code: &str) -> GroupKey {
        GroupKey::new(&self.profile.sport_code, team_code, chart_date, position_code)
    }
}

fn require_team(team_code: &str) -> Result<&str> {
    let team_code = team_code.trim();
    if team_code.is_empty() {
        return Err(DepthChartError::MissingArgument("teamCode"));
    }
    Ok(team_code)
}

fn require_text<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DepthChartError::MissingArgument(field)),
    }
}

fn require_positive(value: Option<i32>, field: &'static str) -> Result<i32> {
    let value = value.ok_or(DepthChartError::MissingArgument(field))?;
    check_positive(value, field)
}

fn check_positive(value: i32, field: &'static str) -> Result<i32> {
    if value < 1 {
        return Err(DepthChartError::InvalidRange { field, value });
    }
    Ok(value)
}

#[async_trait::async_trait]
impl DepthChartOps for DepthChartService {
    fn sport_code(&self) -> &str {
        &self.profile.sport_code
    }

    fn team_codes(&self) -> &[String] {
        &self.profile.team_codes
    }

    async fn add_player(&self, team_code: &str, request: AddPlayerRequest) -> Result<ChartEntry> {
        let team_code = require_team(team_code)?;
        let position_code = require_text(request.position_code.as_deref(), "positionCode")?;
        let player_name = require_text(request.player_name.as_deref(), "playerName")?;
        let player_id = require_positive(request.player_id, "playerId")?;
        let requested_depth = request.depth.map(|d| check_positive(d, "depth")).transpose()?;
        let chart_date = self.profile.period.resolve(request.chart_date);

        debug!(
            "Adding player {} to {} of {}/{} on {} at depth {:?}",
            player_id, position_code, self.profile.sport_code, team_code, chart_date, requested_depth
        );

        let _guard = self.locks.acquire(self.group_key(team_code, chart_date, position_code)).await;
        let group = self.load_position(team_code, chart_date, position_code).await?;

        if group.iter().any(|e| e.player_id == player_id) {
            return Err(DepthChartError::DuplicatePlayer {
                position_code: position_code.to_string(),
                player_id,
            });
        }

        let plan = ranking::compute_insert(&group, requested_depth);
        let entry = ChartEntry {
            sport_code: self.profile.sport_code.clone(),
            team_code: team_code.to_string(),
            chart_date,
            position_code: position_code.to_string(),
            player_id,
            player_name: player_name.to_string(),
            depth: plan.depth,
        };

        self.store.persist_add(&entry, &plan.shifted_entries()).await?;

        info!(
            "Added player {} to {} at depth {} ({} shifted)",
            player_id,
            position_code,
            entry.depth,
            plan.shifted.len()
        );
        Ok(entry)
    }

    async fn remove_player(
        &self,
        team_code: &str,
        request: PlayerRequest,
    ) -> Result<PlayerSummary> {
        let team_code = require_team(team_code)?;
        let position_code = require_text(request.position_code.as_deref(), "positionCode")?;
        let player_id = require_positive(request.player_id, "playerId")?;
        let chart_date = self.profile.period.resolve(request.chart_date);

        let _guard = self.locks.acquire(self.group_key(team_code, chart_date, position_code)).await;
        let group = self.load_position(team_code, chart_date, position_code).await?;

        let Some(plan) = ranking::compute_remove(&group, player_id) else {
            warn!("Remove: player {} not in {} on {}", player_id, position_code, chart_date);
            return Err(DepthChartError::PlayerNotInPosition {
                position_code: position_code.to_string(),
                player_id,
            });
        };

        self.store.persist_remove(&plan.removed, &plan.shifted_entries()).await?;

        info!(
            "Removed player {} from {} at depth {} ({} shifted)",
            player_id,
            position_code,
            plan.removed.depth,
            plan.shifted.len()
        );
        Ok(PlayerSummary::from(&plan.removed))
    }

    async fn get_backups(
        &self,
        team_code: &str,
        request: PlayerRequest,
    ) -> Result<Vec<PlayerSummary>> {
        let team_code = require_team(team_code)?;
        let position_code = require_text(request.position_code.as_deref(), "positionCode")?;
        let player_id = require_positive(request.player_id, "playerId")?;
        let chart_date = self.profile.period.resolve(request.chart_date);

        let group = self.load_position(team_code, chart_date, position_code).await?;

        match ranking::compute_backups(&group, player_id) {
            Some(backups) => Ok(backups.iter().map(PlayerSummary::from).collect()),
            None => {
                warn!("Backups: player {} not in {} on {}", player_id, position_code, chart_date);
                Err(DepthChartError::PlayerNotInPosition {
                    position_code: position_code.to_string(),
                    player_id,
                })
            }
        }
    }

    async fn get_full_chart(
        &self,
        team_code: &str,
        chart_date: Option<NaiveDate>,
    ) -> Result<FullDepthChart> {
        let team_code = require_team(team_code)?;
        let chart_date = self.profile.period.resolve(chart_date);

        let entries =
            self.store.fetch_group(&self.profile.sport_code, team_code, chart_date).await?;

        Ok(FullDepthChart::from_entries(&self.profile.sport_code, team_code, chart_date, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use crate::store::InMemoryChartStore;

    const TEAM: &str = "TampaBayBuccaneers";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    fn service() -> (DepthChartService, InMemoryChartStore) {
        let store = InMemoryChartStore::new();
        let service =
            DepthChartService::new(SportProfile::new("NFL", &[TEAM]), Arc::new(store.clone()));
        (service, store)
    }

    async fn add(service: &DepthChartService, player_id: i32, depth: Option<i32>) -> ChartEntry {
        let mut request = AddPlayerRequest::new("LT", player_id, &format!("Player {player_id}")).on(date());
        request.depth = depth;
        service.add_player(TEAM, request).await.unwrap()
    }

    async fn depths(service: &DepthChartService) -> Vec<(i32, i32)> {
        let chart = service.get_full_chart(TEAM, Some(date())).await.unwrap();
        chart
            .position("LT")
            .map(|p| p.players.iter().map(|pl| (pl.player_id, pl.depth)).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_add_validation() {
        let (service, store) = service();

        let cases = vec![
            ("", AddPlayerRequest::new("LT", 1, "A")),
            (TEAM, AddPlayerRequest { position_code: None, ..AddPlayerRequest::new("LT", 1, "A") }),
            (TEAM, AddPlayerRequest::new("LT", 1, "  ")),
            (TEAM, AddPlayerRequest { player_id: None, ..AddPlayerRequest::new("LT", 1, "A") }),
        ];
        for (team, request) in cases {
            let err = service.add_player(team, request).await.unwrap_err();
            assert!(matches!(err, DepthChartError::MissingArgument(_)), "{err}");
        }

        let err = service.add_player(TEAM, AddPlayerRequest::new("LT", 0, "A")).await.unwrap_err();
        assert!(matches!(err, DepthChartError::InvalidRange { field: "playerId", value: 0 }));

        let err = service
            .add_player(TEAM, AddPlayerRequest::new("LT", 1, "A").at_depth(0))
            .await
            .unwrap_err();
        assert!(matches!(err, DepthChartError::InvalidRange { field: "depth", value: 0 }));

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_add_defaults_to_current_period() {
        let (service, _) = service();
        let entry =
            service.add_player(TEAM, AddPlayerRequest::new("QB", 12, "Tom Brady")).await.unwrap();

        assert_eq!(entry.chart_date, ChartPeriod::default().current_start());
        assert_eq!(entry.depth, 1);
        assert_eq!(entry.sport_code, "NFL");
    }

    #[tokio::test]
    async fn test_add_and_shift() {
        let (service, _) = service();
        add(&service, 1, None).await;
        add(&service, 2, None).await;
        add(&service, 3, None).await;

        let d = add(&service, 4, Some(2)).await;
        assert_eq!(d.depth, 2);
        assert_eq!(depths(&service).await, vec![(1, 1), (4, 2), (2, 3), (3, 4)]);
    }

    #[tokio::test]
    async fn test_duplicate_player_rejected() {
        let (service, store) = service();
        add(&service, 1, None).await;

        let err = service
            .add_player(TEAM, AddPlayerRequest::new("lt", 1, "Again").on(date()))
            .await
            .unwrap_err();
        assert!(matches!(err, DepthChartError::DuplicatePlayer { player_id: 1, .. }));
        assert_eq!(store.len().await, 1);

        // Same player may hold another position
        service.add_player(TEAM, AddPlayerRequest::new("RT", 1, "Player 1").on(date())).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_not_found_is_distinct() {
        let (service, _) = service();
        add(&service, 1, None).await;

        let err = service
            .remove_player(TEAM, PlayerRequest::new("LT", 9).on(date()))
            .await
            .unwrap_err();
        assert!(matches!(err, DepthChartError::PlayerNotInPosition { player_id: 9, .. }));

        let err = service
            .remove_player(TEAM, PlayerRequest { player_id: None, ..PlayerRequest::new("LT", 1) })
            .await
            .unwrap_err();
        assert!(matches!(err, DepthChartError::MissingArgument("playerId")));
    }

    #[tokio::test]
    async fn test_locks_released_after_operations() {
        let (service, _) = service();
        add(&service, 1, None).await;

        for n in 0..500 {
            let position = format!("POS{n}");
            let err = service
                .remove_player(TEAM, PlayerRequest::new(&position, 1).on(date()))
                .await
                .unwrap_err();
            assert!(matches!(err, DepthChartError::PlayerNotInPosition { .. }));
        }
        service
            .add_player(TEAM, AddPlayerRequest::new("LT", 1, "Again").on(date()))
            .await
            .unwrap_err();
        service.remove_player(TEAM, PlayerRequest::new("LT", 1).on(date())).await.unwrap();

        assert!(service.locks.is_empty());
    }

    #[tokio::test]
    async fn test_backups_last_player_is_empty_not_missing() {
        let (service, _) = service();
        add(&service, 1, None).await;
        add(&service, 2, None).await;

        let backups =
            service.get_backups(TEAM, PlayerRequest::new("LT", 2).on(date())).await.unwrap();
        assert!(backups.is_empty());

        let backups =
            service.get_backups(TEAM, PlayerRequest::new("lt", 1).on(date())).await.unwrap();
        assert_eq!(backups, vec![PlayerSummary { player_id: 2, player_name: "Player 2".to_string() }]);
    }

    #[tokio::test]
    async fn test_full_chart_requires_team() {
        let (service, _) = service();
        let err = service.get_full_chart("  ", None).await.unwrap_err();
        assert!(matches!(err, DepthChartError::MissingArgument("teamCode")));
    }

    #[tokio::test]
    async fn test_corrupt_group_refused() {
        let gap = ChartEntry {
            sport_code: "NFL".to_string(),
            team_code: TEAM.to_string(),
            chart_date: date(),
            position_code: "LT".to_string(),
            player_id: 1,
            player_name: "Gap".to_string(),
            depth: 2,
        };
        let store = InMemoryChartStore::with_entries(vec![gap]);
        let service = DepthChartService::new(SportProfile::new("NFL", &[TEAM]), Arc::new(store));

        let err = service
            .add_player(TEAM, AddPlayerRequest::new("LT", 2, "Next").on(date()))
            .await
            .unwrap_err();
        assert!(matches!(err, DepthChartError::Storage(StoreError::Corruption(_))));
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl ChartStore for FailingStore {
        async fn fetch_group(&self, _: &str, _: &str, _: NaiveDate) -> StoreResult<Vec<ChartEntry>> {
            Ok(Vec::new())
        }

        async fn persist_add(&self, _: &ChartEntry, _: &[ChartEntry]) -> StoreResult<()> {
            Err(StoreError::conflict("simulated"))
        }

        async fn persist_remove(&self, _: &ChartEntry, _: &[ChartEntry]) -> StoreResult<()> {
            Err(StoreError::conflict("simulated"))
        }

        fn backend_name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_storage_errors_propagate() {
        let service = DepthChartService::new(SportProfile::new("NFL", &[TEAM]), Arc::new(FailingStore));
        let err = service
            .add_player(TEAM, AddPlayerRequest::new("LT", 1, "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, DepthChartError::Storage(StoreError::Conflict(_))));
    }
}
