//! Mutable per-encounter bookkeeping: buffs, mitigation, cooldown slots and
//! the running cascade tally.

use serde::Serialize;

use crate::GemKind;

const ELEMENT_COUNT: usize = GemKind::ALL.len();

/// Single timed damage multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BuffEntry {
    /// Turns left before the entry expires.
    pub remaining_turns: u32,
    /// Factor applied to the element's damage.
    pub multiplier: f64,
}

/// Active buffs per element, kept in cast order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BuffState {
    entries: [Vec<BuffEntry>; ELEMENT_COUNT],
}

impl BuffState {
    /// Creates an empty buff table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a buff for the element.
    pub fn push(&mut self, element: GemKind, entry: BuffEntry) {
        self.entries[element.index()].push(entry);
    }

    /// Product of every active multiplier for the element, `1.0` when none.
    #[must_use]
    pub fn multiplier(&self, element: GemKind) -> f64 {
        self.entries[element.index()]
            .iter()
            .map(|entry| entry.multiplier)
            .product()
    }

    /// Active entries for the element in cast order.
    #[must_use]
    pub fn entries(&self, element: GemKind) -> &[BuffEntry] {
        &self.entries[element.index()]
    }

    /// Reports whether no buff is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Vec::is_empty)
    }

    /// Ages every entry by one turn and prunes those that reach zero,
    /// reporting the pruned entries through `expired`.
    pub fn decay(&mut self, expired: &mut Vec<(GemKind, BuffEntry)>) {
        for element in GemKind::ALL {
            self.entries[element.index()].retain_mut(|entry| {
                entry.remaining_turns = entry.remaining_turns.saturating_sub(1);
                if entry.remaining_turns == 0 {
                    expired.push((element, *entry));
                    false
                } else {
                    true
                }
            });
        }
    }
}

/// Fraction of the enemy's next attack that is absorbed this turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MitigationState {
    fraction: f64,
}

impl MitigationState {
    /// Overwrites the active fraction, clamped to `[0, 1]`.
    pub fn set(&mut self, fraction: f64) {
        self.fraction = fraction.clamp(0.0, 1.0);
    }

    /// Currently absorbed fraction.
    #[must_use]
    pub const fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Factor applied to incoming damage, `1 - fraction`.
    #[must_use]
    pub fn damage_factor(&self) -> f64 {
        1.0 - self.fraction
    }

    /// Clears any mitigation.
    pub fn reset(&mut self) {
        self.fraction = 0.0;
    }
}

/// Turns elapsed since a roster slot last cast its skill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SkillSlotState {
    turns_since_use: u32,
}

impl SkillSlotState {
    /// Creates a slot that has just been used.
    #[must_use]
    pub const fn new() -> Self {
        Self { turns_since_use: 0 }
    }

    /// Turns counted since the last cast.
    #[must_use]
    pub const fn turns_since_use(&self) -> u32 {
        self.turns_since_use
    }

    /// Reports whether the slot's counter has reached `threshold`.
    #[must_use]
    pub const fn is_ready(&self, threshold: u32) -> bool {
        self.turns_since_use >= threshold
    }

    /// Restarts the counter after a cast.
    pub fn reset(&mut self) {
        self.turns_since_use = 0;
    }

    /// Counts one elapsed turn.
    pub fn advance(&mut self) {
        self.turns_since_use = self.turns_since_use.saturating_add(1);
    }
}

/// Combo index and per-element score accumulated across every wave of one
/// player turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CascadeState {
    combo: u32,
    scores: [f64; ELEMENT_COUNT],
}

impl CascadeState {
    /// Starts an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one resolved cluster, returning its combo index.
    pub fn register(&mut self, kind: GemKind, score: f64) -> u32 {
        self.combo += 1;
        self.scores[kind.index()] += score;
        self.combo
    }

    /// Combo index reached so far; equals the number of clusters registered.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// Score accumulated for the element.
    #[must_use]
    pub fn score(&self, kind: GemKind) -> f64 {
        self.scores[kind.index()]
    }

    /// Elements with a non-zero score in canonical order.
    pub fn buckets(&self) -> impl Iterator<Item = (GemKind, f64)> + '_ {
        GemKind::ALL
            .into_iter()
            .map(|kind| (kind, self.scores[kind.index()]))
            .filter(|(_, score)| *score > 0.0)
    }

    /// Reports whether no cluster has been registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.combo == 0
    }
}
