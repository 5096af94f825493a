//! Rank maintenance for a single position group
//!
//! Every function here works on a snapshot of one group (all entries sharing
//! sport, team, chart date and position) and returns the writes needed to keep
//! depths dense: exactly `1..=N` for a group of `N` players. Nothing is mutated;
//! the caller persists the returned plan.

use crate::types::ChartEntry;

/// An existing entry whose depth changes as a side effect of another write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankShift {
    pub entry: ChartEntry,
    pub new_depth: i32,
}

impl RankShift {
    /// The entry as it must be persisted
    pub fn applied(&self) -> ChartEntry {
        self.entry.with_depth(self.new_depth)
    }
}

/// Outcome of inserting a player into a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    /// Depth assigned to the new player
    pub depth: i32,

    /// Existing entries pushed down one rank, ascending by old depth
    pub shifted: Vec<RankShift>,
}

impl InsertPlan {
    pub fn shifted_entries(&self) -> Vec<ChartEntry> {
        self.shifted.iter().map(RankShift::applied).collect()
    }
}

/// Outcome of removing a player from a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovePlan {
    pub removed: ChartEntry,

    /// Entries below the removed player moved up one rank, ascending by old depth
    pub shifted: Vec<RankShift>,
}

impl RemovePlan {
    pub fn shifted_entries(&self) -> Vec<ChartEntry> {
        self.shifted.iter().map(RankShift::applied).collect()
    }
}

/// Compute the depth of a new player and the entries it displaces.
///
/// Without a requested depth, or with one past the end of the group, the player
/// is appended at `len + 1` and nothing moves. Otherwise the player takes the
/// requested depth and every entry at or below it moves down by one.
pub fn compute_insert(existing: &[ChartEntry], requested_depth: Option<i32>) -> InsertPlan {
    let size = existing.len() as i32;

    match requested_depth {
        Some(depth) if depth <= size => {
            debug_assert!(depth >= 1, "depth must be validated before ranking");
            let shifted = shift_where(existing, |e| e.depth >= depth, 1);
            InsertPlan { depth, shifted }
        }
        _ => InsertPlan { depth: size + 1, shifted: Vec::new() },
    }
}

/// Compute the removal of `player_id` and the entries that close the gap.
///
/// Returns `None` when the player is not in the group.
pub fn compute_remove(existing: &[ChartEntry], player_id: i32) -> Option<RemovePlan> {
    let removed = existing.iter().find(|e| e.player_id == player_id)?.clone();
    let shifted = shift_where(existing, |e| e.depth > removed.depth, -1);
    Some(RemovePlan { removed, shifted })
}

/// Players ranked strictly below `player_id`, immediate successor first.
///
/// Returns `None` when the player is not in the group, so an absent player is
/// distinguishable from a player with no backups.
pub fn compute_backups(existing: &[ChartEntry], player_id: i32) -> Option<Vec<ChartEntry>> {
    let target = existing.iter().find(|e| e.player_id == player_id)?;

    let mut backups: Vec<ChartEntry> =
        existing.iter().filter(|e| e.depth > target.depth).cloned().collect();
    backups.sort_by_key(|e| e.depth);
    Some(backups)
}

/// True when the depths of `entries` are exactly `1..=len`
pub fn is_dense(entries: &[ChartEntry]) -> bool {
    let mut depths: Vec<i32> = entries.iter().map(|e| e.depth).collect();
    depths.sort_unstable();
    depths.iter().zip(1..).all(|(&depth, expected)| depth == expected)
}

fn shift_where(
    existing: &[ChartEntry],
    predicate: impl Fn(&ChartEntry) -> bool,
    delta: i32,
) -> Vec<RankShift> {
    let mut shifted: Vec<RankShift> = existing
        .iter()
        .filter(|e| predicate(e))
        .map(|e| RankShift { entry: e.clone(), new_depth: e.depth + delta })
        .collect();
    shifted.sort_by_key(|s| s.entry.depth);
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn entry(player_id: i32, depth: i32) -> ChartEntry {
        ChartEntry {
            sport_code: "NFL".to_string(),
            team_code: "TampaBayBuccaneers".to_string(),
            chart_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            position_code: "LT".to_string(),
            player_id,
            player_name: format!("Player {player_id}"),
            depth,
        }
    }

    /// A, B, C at depths 1, 2, 3
    fn abc() -> Vec<ChartEntry> {
        vec![entry(1, 1), entry(2, 2), entry(3, 3)]
    }

    fn apply_insert(group: &mut Vec<ChartEntry>, player_id: i32, plan: &InsertPlan) {
        for shift in &plan.shifted {
            let slot = group.iter_mut().find(|e| e.player_id == shift.entry.player_id).unwrap();
            slot.depth = shift.new_depth;
        }
        group.push(entry(player_id, plan.depth));
    }

    fn apply_remove(group: &mut Vec<ChartEntry>, plan: &RemovePlan) {
        group.retain(|e| e.player_id != plan.removed.player_id);
        for shift in &plan.shifted {
            let slot = group.iter_mut().find(|e| e.player_id == shift.entry.player_id).unwrap();
            slot.depth = shift.new_depth;
        }
    }

    fn depth_of(group: &[ChartEntry], player_id: i32) -> i32 {
        group.iter().find(|e| e.player_id == player_id).unwrap().depth
    }

    #[test]
    fn test_insert_into_empty() {
        let plan = compute_insert(&[], None);
        assert_eq!(plan.depth, 1);
        assert!(plan.shifted.is_empty());
    }

    #[test]
    fn test_requested_depth_past_end_is_clamped() {
        let plan = compute_insert(&[entry(100, 1)], Some(3));
        assert_eq!(plan.depth, 2);
        assert!(plan.shifted.is_empty());
    }

    #[test]
    fn test_depth_one_past_end_matches_append() {
        let group = abc();
        assert_eq!(compute_insert(&group, Some(4)), compute_insert(&group, None));
    }

    #[test]
    fn test_insert_shifts_lower_ranks() {
        let plan = compute_insert(&abc(), Some(2));
        assert_eq!(plan.depth, 2);

        let moved: Vec<(i32, i32)> =
            plan.shifted.iter().map(|s| (s.entry.player_id, s.new_depth)).collect();
        assert_eq!(moved, vec![(2, 3), (3, 4)]);

        let updated = plan.shifted_entries();
        assert_eq!(updated[0].depth, 3);
        assert_eq!(updated[0].player_name, "Player 2");
    }

    #[test]
    fn test_insert_at_top() {
        let plan = compute_insert(&abc(), Some(1));
        assert_eq!(plan.depth, 1);
        assert_eq!(plan.shifted.len(), 3);
    }

    #[test]
    fn test_remove_closes_gap() {
        let plan = compute_remove(&abc(), 2).unwrap();
        assert_eq!(plan.removed.player_id, 2);
        assert_eq!(plan.shifted.len(), 1);
        assert_eq!(plan.shifted[0].entry.player_id, 3);
        assert_eq!(plan.shifted[0].new_depth, 2);
    }

    #[test]
    fn test_remove_last_moves_nothing() {
        let plan = compute_remove(&abc(), 3).unwrap();
        assert!(plan.shifted.is_empty());
    }

    #[test]
    fn test_remove_missing_player() {
        assert!(compute_remove(&abc(), 42).is_none());
        assert!(compute_remove(&[], 1).is_none());
    }

    #[test]
    fn test_backups() {
        let group = vec![entry(1, 1), entry(2, 2)];
        let backups = compute_backups(&group, 1).unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].player_id, 2);

        assert_eq!(compute_backups(&group, 2), Some(Vec::new()));
        assert_eq!(compute_backups(&group, 9), None);
    }

    #[test]
    fn test_backups_sorted_by_depth() {
        let group = vec![entry(4, 4), entry(1, 1), entry(3, 3), entry(2, 2)];
        let ids: Vec<i32> = compute_backups(&group, 2).unwrap().iter().map(|e| e.player_id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn test_is_dense() {
        assert!(is_dense(&[]));
        assert!(is_dense(&[entry(2, 2), entry(1, 1)]));
        assert!(!is_dense(&[entry(1, 1), entry(2, 3)]));
        assert!(!is_dense(&[entry(1, 1), entry(2, 1)]));
        assert!(!is_dense(&[entry(1, 0)]));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(Option<i32>),
        Remove(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            proptest::option::of(1..12i32).prop_map(Op::Add),
            (0..12usize).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_depths_stay_dense(ops in proptest::collection::vec(op_strategy(), 0..60)) {
            let mut group: Vec<ChartEntry> = Vec::new();
            let mut next_id = 1;

            for op in ops {
                match op {
                    Op::Add(depth) => {
                        let plan = compute_insert(&group, depth);
                        apply_insert(&mut group, next_id, &plan);
                        next_id += 1;
                    }
                    Op::Remove(index) => {
                        if group.is_empty() {
                            continue;
                        }
                        let target = group[index % group.len()].player_id;
                        let before = group.len();
                        let plan = compute_remove(&group, target).unwrap();
                        apply_remove(&mut group, &plan);
                        prop_assert_eq!(group.len(), before - 1);
                    }
                }
                prop_assert!(is_dense(&group));
            }
        }

        #[test]
        fn prop_insert_then_remove_round_trips(size in 0..10i32, depth in proptest::option::of(1..12i32)) {
            let original: Vec<ChartEntry> = (1..=size).map(|d| entry(d, d)).collect();
            let mut group = original.clone();

            let plan = compute_insert(&group, depth);
            apply_insert(&mut group, 999, &plan);
            let plan = compute_remove(&group, 999).unwrap();
            apply_remove(&mut group, &plan);

            for e in &original {
                prop_assert_eq!(depth_of(&group, e.player_id), e.depth);
            }
            prop_assert_eq!(group.len(), original.len());
        }

        #[test]
        fn prop_shift_only_touches_lower_ranks(size in 1..10i32, k in 1..10i32) {
            let k = k.min(size);
            let group: Vec<ChartEntry> = (1..=size).map(|d| entry(d, d)).collect();
            let plan = compute_insert(&group, Some(k));

            prop_assert_eq!(plan.depth, k);
            prop_assert_eq!(plan.shifted.len() as i32, size - k + 1);
            for shift in &plan.shifted {
                prop_assert!(shift.entry.depth >= k);
                prop_assert_eq!(shift.new_depth, shift.entry.depth + 1);
            }
        }
    }
}
