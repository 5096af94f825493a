use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One player's ranked slot in a position group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChartEntry {
    /// Sport code (e.g., "NFL")
    pub sport_code: String,

    /// Team code (e.g., "TampaBayBuccaneers")
    pub team_code: String,

    /// First day of the chart period this entry belongs to
    pub chart_date: NaiveDate,

    /// Position code (e.g., "QB", "LT")
    pub position_code: String,

    /// Player ID, unique within the position group
    pub player_id: i32,

    /// Display name
    pub player_name: String,

    /// Rank within the position group, 1 is the starter
    pub depth: i32,
}

impl ChartEntry {
    /// Case-insensitive position match
    pub fn in_position(&self, position_code: &str) -> bool {
        same_code(&self.position_code, position_code)
    }

    /// Key of the position group this entry belongs to
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(&self.sport_code, &self.team_code, self.chart_date, &self.position_code)
    }

    /// Copy of this entry at another depth
    pub fn with_depth(&self, depth: i32) -> Self {
        Self { depth, ..self.clone() }
    }

    /// True when both entries name the same player in the same group
    pub fn same_slot(&self, other: &ChartEntry) -> bool {
        self.player_id == other.player_id && self.group_key() == other.group_key()
    }
}

/// Code equality with the same Unicode lower-casing as `GroupKey` and SQL `LOWER()`
pub fn same_code(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Identity of a position group, normalised for case-insensitive comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub sport_code: String,
    pub team_code: String,
    pub chart_date: NaiveDate,
    pub position_code: String,
}

impl GroupKey {
    pub fn new(sport_code: &str, team_code: &str, chart_date: NaiveDate, position_code: &str) -> Self {
        Self {
            sport_code: sport_code.to_lowercase(),
            team_code: team_code.to_lowercase(),
            chart_date,
            position_code: position_code.to_lowercase(),
        }
    }
}

/// Player identity returned by remove and backups queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_id: i32,
    pub player_name: String,
}

impl From<&ChartEntry> for PlayerSummary {
    fn from(entry: &ChartEntry) -> Self {
        Self { player_id: entry.player_id, player_name: entry.player_name.clone() }
    }
}

/// A player and rank inside a position listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDepth {
    pub player_id: i32,
    pub player_name: String,
    pub depth: i32,
}

/// All players of one position, ascending by depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionChart {
    pub position_code: String,
    pub players: Vec<PositionDepth>,
}

/// Full depth chart of a team for one chart period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullDepthChart {
    pub sport_code: String,
    pub team_code: String,
    pub chart_date: NaiveDate,
    pub positions: Vec<PositionChart>,
}

impl FullDepthChart {
    /// Group entries by position, keeping positions in first-seen order
    pub fn from_entries(
        sport_code: &str,
        team_code: &str,
        chart_date: NaiveDate,
        entries: Vec<ChartEntry>,
    ) -> Self {
        let mut positions: Vec<PositionChart> = Vec::new();

        for entry in entries {
            let player = PositionDepth {
                player_id: entry.player_id,
                player_name: entry.player_name,
                depth: entry.depth,
            };
            match positions.iter_mut().find(|p| same_code(&p.position_code, &entry.position_code)) {
                Some(position) => position.players.push(player),
                None => positions.push(PositionChart {
                    position_code: entry.position_code,
                    players: vec![player],
                }),
            }
        }

        for position in &mut positions {
            position.players.sort_by_key(|p| p.depth);
        }

        Self {
            sport_code: sport_code.to_string(),
            team_code: team_code.to_string(),
            chart_date,
            positions,
        }
    }

    /// Total number of players across all positions
    pub fn player_count(&self) -> usize {
        self.positions.iter().map(|p| p.players.len()).sum()
    }

    /// Listing for one position, if present
    pub fn position(&self, position_code: &str) -> Option<&PositionChart> {
        self.positions.iter().find(|p| same_code(&p.position_code, position_code))
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Request to add a player to a position
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddPlayerRequest {
    pub position_code: Option<String>,
    pub player_id: Option<i32>,
    pub player_name: Option<String>,
    /// Requested rank; omitted means end of the chart
    pub depth: Option<i32>,
    /// Chart period; omitted means the current period
    pub chart_date: Option<NaiveDate>,
}

impl AddPlayerRequest {
    pub fn new(position_code: &str, player_id: i32, player_name: &str) -> Self {
        Self {
            position_code: Some(position_code.to_string()),
            player_id: Some(player_id),
            player_name: Some(player_name.to_string()),
            depth: None,
            chart_date: None,
        }
    }

    pub fn at_depth(mut self, depth: i32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn on(mut self, chart_date: NaiveDate) -> Self {
        self.chart_date = Some(chart_date);
        self
    }
}

/// Request naming a player within a position (remove, backups)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerRequest {
    pub position_code: Option<String>,
    pub player_id: Option<i32>,
    pub chart_date: Option<NaiveDate>,
}

impl PlayerRequest {
    pub fn new(position_code: &str, player_id: i32) -> Self {
        Self {
            position_code: Some(position_code.to_string()),
            player_id: Some(player_id),
            chart_date: None,
        }
    }

    pub fn on(mut self, chart_date: NaiveDate) -> Self {
        self.chart_date = Some(chart_date);
        self
    }
}
