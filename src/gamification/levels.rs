//! Level system
//!
//! Maps cumulative points to a level through fixed ascending thresholds.

/// Points required for level `i + 1` (must be sorted ascending).
pub static LEVEL_THRESHOLDS: [u32; 10] = [0, 200, 500, 1000, 1800, 3000, 5000, 8000, 12000, 18000];

/// Level for the given total. Saturates at the last threshold.
pub fn level_for(total_points: u32) -> u32 {
    LEVEL_THRESHOLDS
        .iter()
        .rposition(|&t| total_points >= t)
        .map(|i| i as u32 + 1)
        .unwrap_or(1)
}

pub fn max_level() -> u32 {
    LEVEL_THRESHOLDS.len() as u32
}

/// Points still missing for the next level (0 at max level).
pub fn points_to_next_level(total_points: u32) -> u32 {
    let level = level_for(total_points);
    match LEVEL_THRESHOLDS.get(level as usize) {
        Some(&next) => next - total_points,
        None => 0,
    }
}

/// Level summary shown next to the profile.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u32,
    pub max_level: u32,
    pub total_points: u32,
    pub current_level_points: u32,
    /// None at max level.
    pub next_level_points: Option<u32>,
    pub points_to_next: u32,
    /// 0.0 - 1.0
    pub progress: f32,
}

impl LevelProgress {
    pub fn new(total_points: u32) -> Self {
        let level = level_for(total_points);
        let current = LEVEL_THRESHOLDS[(level - 1) as usize];
        let next = LEVEL_THRESHOLDS.get(level as usize).copied();
        let progress = match next {
            Some(next) if next > current => (total_points - current) as f32 / (next - current) as f32,
            _ => 1.0,
        };
        Self {
            level,
            max_level: max_level(),
            total_points,
            current_level_points: current,
            next_level_points: next,
            points_to_next: points_to_next_level(total_points),
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_points() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(199), 1);
        assert_eq!(level_for(200), 2);
        assert_eq!(level_for(499), 2);
        assert_eq!(level_for(500), 3);
        assert_eq!(level_for(18000), 10);
        assert_eq!(level_for(25000), 10); // Beyond max
        assert_eq!(level_for(u32::MAX), max_level());
    }

    #[test]
    fn test_points_to_next() {
        assert_eq!(points_to_next_level(0), 200);
        assert_eq!(points_to_next_level(450), 50);
        assert_eq!(points_to_next_level(18000), 0);
    }

    #[test]
    fn test_level_progress() {
        let p = LevelProgress::new(350); // between 200 and 500
        assert_eq!(p.level, 2);
        assert!((p.progress - 0.5).abs() < 0.01);
        assert!(p.next_level_points.is_some());
        assert!(LevelProgress::new(20000).next_level_points.is_none());
    }
}
