//! Skill catalogue: identifiers, definitions and the closed set of effects.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{ConfigurationError, GemKind};

/// Identifier naming a skill in the catalogue.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(String);

impl SkillId {
    /// Creates a new skill identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed textual representation of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Effect a skill applies once its cast resolves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkillEffect {
    /// Multiplies one element's damage for a number of turns.
    Buff {
        /// Element whose damage is multiplied.
        element: GemKind,
        /// Factor applied to the element's damage while active.
        multiplier: f64,
        /// Number of turns the buff stays active, counting the cast turn.
        duration: u32,
    },
    /// Converts gems of other kinds into gems drawn from an allowed set.
    GenerateGems {
        /// Kinds the converted gems are drawn from.
        allowed: Vec<GemKind>,
        /// Maximum number of gems converted.
        count: u32,
    },
    /// Deals a fraction of the enemy's maximum hit points, ignoring defense.
    DirectAttack {
        /// Fraction of the enemy's maximum hit points dealt as damage.
        fraction: f64,
    },
    /// Reduces the enemy's attack for the current turn.
    Mitigation {
        /// Fraction of the enemy's damage that is absorbed.
        fraction: f64,
    },
}

impl SkillEffect {
    /// Human-readable description of the effect.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Buff {
                element,
                multiplier,
                duration,
            } => format!("{element} damage x{multiplier} for {duration} turns"),
            Self::GenerateGems { allowed, count } => {
                let kinds = allowed
                    .iter()
                    .map(|kind| kind.name())
                    .collect::<Vec<_>>()
                    .join("/");
                format!("turns up to {count} gems into {kinds}")
            }
            Self::DirectAttack { fraction } => {
                format!("strikes for {:.0}% of the enemy's max HP", fraction * 100.0)
            }
            Self::Mitigation { fraction } => {
                format!(
                    "absorbs {:.0}% of the enemy's next attack",
                    fraction * 100.0
                )
            }
        }
    }

    /// Checks the effect's parameters, attributing failures to `skill`.
    pub fn validate(&self, skill: &SkillId) -> Result<(), ConfigurationError> {
        match self {
            Self::Buff {
                multiplier,
                duration,
                ..
            } => {
                if !multiplier.is_finite() || *multiplier <= 0.0 {
                    return Err(ConfigurationError::InvalidMultiplier {
                        skill: skill.clone(),
                        value: *multiplier,
                    });
                }
                if *duration == 0 {
                    return Err(ConfigurationError::ZeroDuration {
                        skill: skill.clone(),
                    });
                }
                Ok(())
            }
            Self::GenerateGems { allowed, .. } => {
                if allowed.is_empty() {
                    return Err(ConfigurationError::EmptyAllowedGems {
                        skill: skill.clone(),
                    });
                }
                Ok(())
            }
            Self::DirectAttack { fraction } | Self::Mitigation { fraction } => {
                if !(0.0..=1.0).contains(fraction) {
                    return Err(ConfigurationError::InvalidFraction {
                        skill: skill.clone(),
                        value: *fraction,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Static description of a castable skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Identifier referenced by roster entries.
    pub id: SkillId,
    /// Display name of the skill.
    pub name: String,
    /// Turns that must elapse after a cast before the skill is ready again.
    pub cooldown: u32,
    /// Effect applied when the cast resolves.
    pub effect: SkillEffect,
}

impl SkillDefinition {
    /// Display name followed by the effect description.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{}: {}", self.name, self.effect.describe())
    }
}

/// Validated lookup table of skill definitions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkillCatalogue {
    skills: BTreeMap<SkillId, SkillDefinition>,
}

impl SkillCatalogue {
    /// Builds a catalogue, rejecting duplicates and malformed effects.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = SkillDefinition>,
    ) -> Result<Self, ConfigurationError> {
        let mut skills = BTreeMap::new();
        for definition in definitions {
            definition.effect.validate(&definition.id)?;
            let id = definition.id.clone();
            if skills.insert(id.clone(), definition).is_some() {
                return Err(ConfigurationError::DuplicateSkill(id));
            }
        }
        Ok(Self { skills })
    }

    /// Looks up a definition by identifier.
    #[must_use]
    pub fn get(&self, id: &SkillId) -> Option<&SkillDefinition> {
        self.skills.get(id)
    }

    /// Resolves the skill owned by `ally`, failing when the catalogue lacks it.
    pub fn resolve(
        &self,
        ally: &str,
        id: &SkillId,
    ) -> Result<&SkillDefinition, ConfigurationError> {
        self.get(id).ok_or_else(|| ConfigurationError::UnknownSkill {
            ally: ally.to_owned(),
            skill: id.clone(),
        })
    }

    /// Iterator over the definitions ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.skills.values()
    }

    /// Number of definitions in the catalogue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Reports whether the catalogue holds no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
