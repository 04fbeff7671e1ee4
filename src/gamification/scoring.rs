//! Points awarded for a single exercise completion.

/// Scoring constants.
pub struct Scoring;

impl Scoring {
    pub const BASE_POINTS: i64 = 100;
    /// Full bonus on the first attempt, half for attempts 2-3.
    pub const ATTEMPT_BONUS: i64 = 50;
    /// Full bonus under a minute, half under two minutes.
    pub const SPEED_BONUS: i64 = 25;
    pub const HINT_PENALTY: i64 = 10;
    /// First try without any hint.
    pub const PERFECT_BONUS: i64 = 50;
}

/// Points for one completion. Pure; the result is never negative.
pub fn points(attempts: u32, time_spent_secs: u32, hints_used: u32, is_first_try: bool) -> u32 {
    let mut points = Scoring::BASE_POINTS;

    points += match attempts {
        1 => Scoring::ATTEMPT_BONUS,
        2..=3 => Scoring::ATTEMPT_BONUS / 2,
        _ => 0,
    };

    points += if time_spent_secs < 60 {
        Scoring::SPEED_BONUS
    } else if time_spent_secs < 120 {
        Scoring::SPEED_BONUS / 2
    } else {
        0
    };

    points -= Scoring::HINT_PENALTY * i64::from(hints_used);

    if is_first_try && hints_used == 0 {
        points += Scoring::PERFECT_BONUS;
    }

    points.clamp(0, i64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_run() {
        assert_eq!(points(1, 30, 0, true), 225);
    }

    #[test]
    fn test_no_bonuses_with_hints() {
        assert_eq!(points(4, 150, 3, false), 70);
    }

    #[test]
    fn test_half_bonuses() {
        // 100 + 25 + 12
        assert_eq!(points(2, 90, 0, false), 137);
        assert_eq!(points(3, 119, 0, false), 137);
        assert_eq!(points(3, 120, 0, false), 125);
    }

    #[test]
    fn test_first_try_with_hint_loses_perfect_bonus() {
        // 100 + 50 + 25 - 10
        assert_eq!(points(1, 10, 1, true), 165);
    }

    #[test]
    fn test_clamped_at_zero() {
        assert_eq!(points(10, 1000, 50, false), 0);
        for attempts in 1..8 {
            for time in [0, 59, 60, 119, 120, 10_000] {
                for hints in 0..30 {
                    let _ = points(attempts, time, hints, attempts == 1);
                }
            }
        }
        assert_eq!(points(u32::MAX, u32::MAX, u32::MAX, false), 0);
    }

    #[test]
    fn test_pure() {
        assert_eq!(points(2, 75, 1, false), points(2, 75, 1, false));
    }
}
