//! Combatants: clamped hit point pools, unit stat blocks, the party and the
//! enemies it faces.

use serde::Serialize;

use crate::{GemKind, SkillId};

/// Hit point pool whose current value always lies in `[0, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct HitPoints {
    current: u32,
    max: u32,
}

impl HitPoints {
    /// Creates a pool filled to its maximum.
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Creates a pool with an explicit current value, clamped to `max`.
    #[must_use]
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Upper bound of the pool.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Reports whether the pool has been emptied.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Removes up to `amount` hit points, returning how many were removed.
    pub fn damage(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.current);
        self.current -= applied;
        applied
    }

    /// Restores up to `amount` hit points, returning how many were restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.max - self.current);
        self.current += applied;
        applied
    }
}

/// Combat statistics of a single unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct UnitStats {
    /// Element the unit attacks with and defends as.
    pub element: GemKind,
    /// Attack power.
    pub ap: u32,
    /// Defense power.
    pub dp: u32,
    /// Current and maximum hit points.
    pub hp: HitPoints,
}

impl UnitStats {
    /// Creates a unit at full health.
    #[must_use]
    pub const fn new(element: GemKind, ap: u32, dp: u32, max_hp: u32) -> Self {
        Self {
            element,
            ap,
            dp,
            hp: HitPoints::full(max_hp),
        }
    }
}

/// Member of the party roster. Each ally owns exactly one skill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ally {
    /// Display name of the ally.
    pub name: String,
    /// Combat statistics used when the ally's element is matched on the board.
    pub stats: UnitStats,
    /// Identifier of the skill the ally can cast.
    pub skill: SkillId,
}

/// Aggregate party that absorbs enemy attacks and receives healing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Party {
    /// Defense power used against enemy attacks.
    pub dp: u32,
    /// Shared hit point pool.
    pub hp: HitPoints,
    /// Allies in roster order; skill slots are indexed by this order.
    pub roster: Vec<Ally>,
}

impl Party {
    /// First ally whose element matches, used to resolve elemental damage.
    #[must_use]
    pub fn ally_for(&self, element: GemKind) -> Option<&Ally> {
        self.roster.iter().find(|ally| ally.stats.element == element)
    }
}

/// Opposing unit in the encounter sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Enemy {
    /// Display name of the enemy.
    pub name: String,
    /// Static stat block of the enemy.
    pub stats: UnitStats,
}
