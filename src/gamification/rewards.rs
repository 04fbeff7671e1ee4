//! Cosmetic and feature rewards unlocked by points or achievements.

use serde::{Deserialize, Serialize};

use super::achievements::{is_unlocked, AchievementId};
use crate::domain::{Achievement, Reward, RewardKind, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewardId {
    DarkTheme,
    RainbowTheme,
    ExpertBadge,
    SpeedsterTitle,
}

pub struct RewardContext<'a> {
    pub total_points: u32,
    pub achievements: &'a [Achievement],
}

/// What unlocks a reward.
#[derive(Debug, Clone, Copy)]
pub enum RewardRule {
    Points(u32),
    Achievement(AchievementId),
}

impl RewardRule {
    pub fn holds(&self, ctx: &RewardContext<'_>) -> bool {
        match *self {
            RewardRule::Points(min) => ctx.total_points >= min,
            RewardRule::Achievement(id) => is_unlocked(ctx.achievements, id),
        }
    }
}

pub struct RewardDef {
    pub id: RewardId,
    pub kind: RewardKind,
    pub name: &'static str,
    pub description: &'static str,
    pub rule: RewardRule,
}

pub static REWARDS: &[RewardDef] = &[
    RewardDef {
        id: RewardId::DarkTheme,
        kind: RewardKind::Theme,
        name: "Dark Theme",
        description: "Unlock the dark theme for the app",
        rule: RewardRule::Points(500),
    },
    RewardDef {
        id: RewardId::RainbowTheme,
        kind: RewardKind::Theme,
        name: "Rainbow Theme",
        description: "Unlock the colorful rainbow theme",
        rule: RewardRule::Points(1000),
    },
    RewardDef {
        id: RewardId::ExpertBadge,
        kind: RewardKind::Badge,
        name: "Expert Badge",
        description: "Show off your HTML table expertise",
        rule: RewardRule::Achievement(AchievementId::TableChampion),
    },
    RewardDef {
        id: RewardId::SpeedsterTitle,
        kind: RewardKind::Title,
        name: "Speedster",
        description: "Earn the Speedster title",
        rule: RewardRule::Achievement(AchievementId::SpeedDemon),
    },
];

/// Stamp every locked reward whose rule holds. Returns the newly unlocked ids.
pub fn unlock(rewards: &mut [Reward], ctx: &RewardContext<'_>, now: Timestamp) -> Vec<RewardId> {
    let mut newly_unlocked = Vec::new();
    for reward in rewards.iter_mut().filter(|r| !r.is_unlocked()) {
        let Some(def) = REWARDS.iter().find(|d| d.id == reward.id) else {
            continue;
        };
        if def.rule.holds(ctx) {
            reward.unlocked_at = Some(now);
            newly_unlocked.push(reward.id);
        }
    }
    newly_unlocked
}
