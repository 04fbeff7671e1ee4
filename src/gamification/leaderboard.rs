//! Local top-N leaderboard.

use serde::{Deserialize, Serialize};

use crate::domain::LeaderboardEntry;

pub const MAX_ENTRIES: usize = 10;

/// At most one entry per username, sorted by total points (descending), at most `MAX_ENTRIES`.
/// Persisted as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Rebuild from stored rows, re-establishing the invariants.
    pub fn from_entries(entries: Vec<LeaderboardEntry>) -> Self {
        let mut board = Self::default();
        for e in entries {
            board.upsert(e);
        }
        board
    }

    /// Replace any row for the same username, re-sort, truncate.
    /// Ties keep insertion order (stable sort).
    pub fn upsert(&mut self, entry: LeaderboardEntry) {
        self.entries.retain(|e| e.username != entry.username);
        self.entries.push(entry);
        self.entries.sort_by(|a, b| b.total_points.cmp(&a.total_points));
        self.entries.truncate(MAX_ENTRIES);
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// 1-based rank.
    pub fn rank_of(&self, username: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.username == username).map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(name: &str, points: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            username: name.into(),
            total_points: points,
            level: 1,
            completed_exercises: 1,
            streak: 0,
            last_active: Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap(),
        }
    }

    fn is_sorted(board: &Leaderboard) -> bool {
        board.entries().windows(2).all(|w| w[0].total_points >= w[1].total_points)
    }

    #[test]
    fn test_upsert_replaces_existing_user() {
        let mut board = Leaderboard::default();
        board.upsert(entry("ada", 100));
        board.upsert(entry("bob", 300));
        board.upsert(entry("ada", 500));
        assert_eq!(board.entries().len(), 2);
        assert_eq!(board.entries()[0].username, "ada");
        assert_eq!(board.entries()[0].total_points, 500);
        assert_eq!(board.rank_of("bob"), Some(2));
    }

    #[test]
    fn test_bounded_and_sorted() {
        let mut board = Leaderboard::default();
        for i in 0..25u32 {
            board.upsert(entry(&format!("user{i}"), (i * 37) % 400));
            assert!(board.entries().len() <= MAX_ENTRIES);
            assert!(is_sorted(&board));
        }
        assert_eq!(board.entries().len(), MAX_ENTRIES);
        assert_eq!(board.rank_of("user0"), None);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut board = Leaderboard::default();
        board.upsert(entry("first", 100));
        board.upsert(entry("second", 100));
        assert_eq!(board.entries()[0].username, "first");
        assert_eq!(board.entries()[1].username, "second");
    }

    #[test]
    fn test_from_entries_dedups_and_truncates() {
        let mut rows: Vec<_> = (0..12).map(|i| entry(&format!("u{i}"), i)).collect();
        rows.push(entry("u3", 1000));
        let board = Leaderboard::from_entries(rows);
        assert_eq!(board.entries().len(), MAX_ENTRIES);
        assert_eq!(board.entries()[0].username, "u3");
        assert_eq!(board.entries().iter().filter(|e| e.username == "u3").count(), 1);
    }
}
