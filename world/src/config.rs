//! Static encounter description: roster, enemy sequence, skill catalogue,
//! spawn pool and combat tuning.

use std::time::Duration;

use gem_battle_core::{GemKind, SkillDefinition, SkillEffect, SkillId};
use gem_battle_system_combat::CombatTuning;
use serde::{Deserialize, Serialize};

const DEFAULT_CAST_DELAY_MS: u64 = 600;
const DEFAULT_PARTY_HP: u32 = 600;
const DEFAULT_ALLY_HP: u32 = 150;

/// Complete configuration of one encounter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Shared party pool.
    pub party: PartyConfig,
    /// Allies in slot order.
    pub roster: Vec<AllyConfig>,
    /// Enemies in the order they are fought.
    pub enemies: Vec<EnemyConfig>,
    /// Skill catalogue referenced by the roster.
    pub skills: Vec<SkillDefinition>,
    /// Kinds refilled gems are drawn from.
    pub spawn_pool: Vec<GemKind>,
    /// Milliseconds between a cast beginning and its effect applying.
    pub cast_delay_ms: u64,
    /// Combat formula constants.
    pub tuning: CombatTuning,
}

impl EncounterConfig {
    /// Cast delay as a duration.
    #[must_use]
    pub const fn cast_delay(&self) -> Duration {
        Duration::from_millis(self.cast_delay_ms)
    }

    /// Party defense: the configured value, or the integer mean of the
    /// roster's defense when unset.
    #[must_use]
    pub fn party_dp(&self) -> u32 {
        if let Some(dp) = self.party.dp {
            return dp;
        }
        let count = self.roster.len() as u64;
        if count == 0 {
            return 0;
        }
        let total: u64 = self.roster.iter().map(|ally| u64::from(ally.dp)).sum();
        (total / count) as u32
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            party: PartyConfig::default(),
            roster: vec![
                AllyConfig::new("Seiryu", GemKind::Wind, 15, 10, "tornado"),
                AllyConfig::new("Suzaku", GemKind::Fire, 25, 10, "flame_cloak"),
                AllyConfig::new("Byakko", GemKind::Earth, 20, 5, "scratch"),
                AllyConfig::new("Genbu", GemKind::Water, 20, 15, "iron_wall"),
                AllyConfig::new("Seiryu", GemKind::Wind, 15, 10, "tornado"),
                AllyConfig::new("Suzaku", GemKind::Fire, 25, 10, "flame_cloak"),
            ],
            enemies: vec![
                EnemyConfig::new("Slime", GemKind::Water, 100, 10, 1),
                EnemyConfig::new("Goblin", GemKind::Earth, 200, 20, 5),
                EnemyConfig::new("Giant Bat", GemKind::Wind, 300, 30, 10),
                EnemyConfig::new("Werewolf", GemKind::Wind, 400, 40, 15),
                EnemyConfig::new("Dragon", GemKind::Fire, 600, 50, 20),
            ],
            skills: default_skills(),
            spawn_pool: GemKind::ALL.to_vec(),
            cast_delay_ms: DEFAULT_CAST_DELAY_MS,
            tuning: CombatTuning::default(),
        }
    }
}

fn default_skills() -> Vec<SkillDefinition> {
    vec![
        SkillDefinition {
            id: SkillId::new("tornado"),
            name: "Tornado".to_owned(),
            cooldown: 6,
            effect: SkillEffect::Buff {
                element: GemKind::Wind,
                multiplier: 2.0,
                duration: 3,
            },
        },
        SkillDefinition {
            id: SkillId::new("flame_cloak"),
            name: "Flame Cloak".to_owned(),
            cooldown: 3,
            effect: SkillEffect::GenerateGems {
                allowed: vec![GemKind::Fire],
                count: 6,
            },
        },
        SkillDefinition {
            id: SkillId::new("scratch"),
            name: "Scratch".to_owned(),
            cooldown: 7,
            effect: SkillEffect::DirectAttack { fraction: 0.3 },
        },
        SkillDefinition {
            id: SkillId::new("iron_wall"),
            name: "Iron Wall".to_owned(),
            cooldown: 8,
            effect: SkillEffect::Mitigation { fraction: 0.9 },
        },
    ]
}

/// Party-wide settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyConfig {
    /// Maximum hit points of the shared pool.
    pub max_hp: u32,
    /// Explicit defense; defaults to the roster mean.
    pub dp: Option<u32>,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            max_hp: DEFAULT_PARTY_HP,
            dp: None,
        }
    }
}

/// Roster entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllyConfig {
    /// Display name.
    pub name: String,
    /// Element the ally attacks with.
    pub element: GemKind,
    /// Attack power.
    pub ap: u32,
    /// Defense power.
    pub dp: u32,
    /// Maximum hit points.
    #[serde(default = "default_ally_hp")]
    pub max_hp: u32,
    /// Identifier of the ally's skill.
    pub skill: SkillId,
}

impl AllyConfig {
    /// Creates an entry with the default ally hit points.
    #[must_use]
    pub fn new(name: &str, element: GemKind, ap: u32, dp: u32, skill: &str) -> Self {
        Self {
            name: name.to_owned(),
            element,
            ap,
            dp,
            max_hp: DEFAULT_ALLY_HP,
            skill: SkillId::new(skill),
        }
    }
}

fn default_ally_hp() -> u32 {
    DEFAULT_ALLY_HP
}

/// Entry of the enemy sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyConfig {
    /// Display name.
    pub name: String,
    /// Element the enemy attacks and defends as.
    pub element: GemKind,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Attack power.
    pub ap: u32,
    /// Defense power.
    pub dp: u32,
}

impl EnemyConfig {
    /// Creates an entry.
    #[must_use]
    pub fn new(name: &str, element: GemKind, max_hp: u32, ap: u32, dp: u32) -> Self {
        Self {
            name: name.to_owned(),
            element,
            max_hp,
            ap,
            dp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_party_defense_is_roster_mean() {
        let config = EncounterConfig::default();
        // (10 + 10 + 5 + 15 + 10 + 10) / 6
        assert_eq!(config.party_dp(), 10);
    }

    #[test]
    fn explicit_party_defense_wins() {
        let mut config = EncounterConfig::default();
        config.party.dp = Some(3);
        assert_eq!(config.party_dp(), 3);
    }

    #[test]
    fn default_skills_are_all_referenced() {
        let config = EncounterConfig::default();
        for skill in &config.skills {
            assert!(config.roster.iter().any(|ally| ally.skill == skill.id));
        }
        assert_eq!(config.cast_delay(), Duration::from_millis(600));
    }
}
