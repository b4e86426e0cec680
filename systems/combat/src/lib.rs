#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure combat rules: cluster scoring, the affinity wheel, jittered damage
//! and healing, and the enemy counterattack.

use gem_battle_core::{BuffState, CascadeState, Cluster, GemKind, MitigationState, Party, UnitStats};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Tunable constants of the combat formulas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Score bonus per gem beyond the third in a cluster.
    pub combo_size_coefficient: f64,
    /// Base of the exponential combo coefficient.
    pub combo_growth: f64,
    /// Score subtracted before exponentiation.
    pub combo_offset: f64,
    /// Hit points restored per point of accumulated life score.
    pub heal_per_score: f64,
    /// Half-width of the uniform jitter window around `1.0`.
    pub jitter_spread: f64,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            combo_size_coefficient: 0.10,
            combo_growth: 1.5,
            combo_offset: 3.0,
            heal_per_score: 20.0,
            jitter_spread: 0.10,
        }
    }
}

/// Affinity multiplier of `attacker` against `defender` on the elemental
/// wheel. Life never gains or suffers affinity.
#[must_use]
pub fn affinity(attacker: GemKind, defender: GemKind) -> f64 {
    if attacker.beats() == Some(defender) {
        2.0
    } else if defender.beats() == Some(attacker) {
        0.5
    } else {
        1.0
    }
}

/// Scales `value` by a uniform factor in `[1 - spread, 1 + spread]` and
/// rounds, never returning less than one.
pub fn jitter<R: Rng + ?Sized>(value: f64, spread: f64, rng: &mut R) -> u32 {
    let spread = spread.abs();
    let factor = rng.gen_range(1.0 - spread..=1.0 + spread);
    (value * factor).round().max(1.0) as u32
}

/// Outcome of resolving one element bucket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CombatEffect {
    /// Healing granted to the party.
    Heal {
        /// Hit points to restore.
        amount: u32,
    },
    /// Damage dealt to the enemy.
    Damage {
        /// Element of the attacking ally.
        attacker: GemKind,
        /// Element of the enemy.
        defender: GemKind,
        /// Hit points to remove.
        amount: u32,
        /// Affinity multiplier that applied.
        affinity: f64,
    },
}

/// Converts cluster tallies into damage and healing.
#[derive(Clone, Debug, Default)]
pub struct CombatResolver {
    tuning: CombatTuning,
}

impl CombatResolver {
    /// Creates a resolver using the provided tuning.
    #[must_use]
    pub const fn new(tuning: CombatTuning) -> Self {
        Self { tuning }
    }

    /// Tuning in effect.
    #[must_use]
    pub const fn tuning(&self) -> &CombatTuning {
        &self.tuning
    }

    /// Score contributed by a cluster of `count` gems.
    #[must_use]
    pub fn cluster_score(&self, count: usize) -> f64 {
        let extra = count.saturating_sub(3) as f64;
        1.0 + extra * self.tuning.combo_size_coefficient
    }

    /// Registers a matched cluster in the cascade tally, returning its combo
    /// index and score.
    pub fn accumulate(&self, cluster: &Cluster, cascade: &mut CascadeState) -> (u32, f64) {
        let score = self.cluster_score(cluster.count());
        let combo = cascade.register(cluster.kind(), score);
        trace!(
            kind = %cluster.kind(),
            count = cluster.count(),
            combo,
            score,
            "cluster accumulated"
        );
        (combo, score)
    }

    /// Exponential multiplier for an element's accumulated score at the end
    /// of the cascade.
    #[must_use]
    pub fn combo_coefficient(&self, accumulated_score: f64, final_combo: u32) -> f64 {
        let exponent = (accumulated_score - self.tuning.combo_offset) + f64::from(final_combo);
        self.tuning.combo_growth.powf(exponent)
    }

    /// Damage of one attack: jittered, buffed, floored and at least one.
    pub fn damage<R: Rng + ?Sized>(
        &self,
        base: u32,
        affinity: f64,
        combo_coefficient: f64,
        buff_multiplier: f64,
        rng: &mut R,
    ) -> u32 {
        let raw = f64::from(base) * affinity * combo_coefficient;
        let jittered = jitter(raw, self.tuning.jitter_spread, rng);
        (f64::from(jittered) * buff_multiplier).floor().max(1.0) as u32
    }

    /// Healing granted by an accumulated life score.
    pub fn heal<R: Rng + ?Sized>(&self, accumulated_score: f64, rng: &mut R) -> u32 {
        jitter(
            self.tuning.heal_per_score * accumulated_score,
            self.tuning.jitter_spread,
            rng,
        )
    }

    /// Resolves every non-zero bucket of the cascade once, in canonical
    /// element order. Buckets whose element has no ally are dropped.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        cascade: &CascadeState,
        party: &Party,
        enemy: &UnitStats,
        buffs: &BuffState,
        rng: &mut R,
        out: &mut Vec<CombatEffect>,
    ) {
        let final_combo = cascade.combo();
        for (element, score) in cascade.buckets() {
            if element == GemKind::Life {
                out.push(CombatEffect::Heal {
                    amount: self.heal(score, rng),
                });
                continue;
            }

            let Some(ally) = party.ally_for(element) else {
                trace!(%element, score, "no ally for element, bucket dropped");
                continue;
            };

            let base = ally.stats.ap.saturating_sub(enemy.dp).max(1);
            let affinity = affinity(element, enemy.element);
            let coefficient = self.combo_coefficient(score, final_combo);
            let amount = self.damage(
                base,
                affinity,
                coefficient,
                buffs.multiplier(element),
                rng,
            );
            out.push(CombatEffect::Damage {
                attacker: element,
                defender: enemy.element,
                amount,
                affinity,
            });
        }
    }

    /// Damage of the enemy's counterattack after mitigation.
    pub fn enemy_strike<R: Rng + ?Sized>(
        &self,
        enemy: &UnitStats,
        party_dp: u32,
        mitigation: &MitigationState,
        rng: &mut R,
    ) -> u32 {
        let base = enemy.ap.saturating_sub(party_dp).max(1);
        let jittered = jitter(f64::from(base), self.tuning.jitter_spread, rng);
        (f64::from(jittered) * mitigation.damage_factor()).round() as u32
    }
}
