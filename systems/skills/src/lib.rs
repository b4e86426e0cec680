#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Skill system: per-slot cooldown gating, a single FIFO cast queue with a
//! fixed delay between dequeue and application, and the effect handlers.

use std::{collections::VecDeque, time::Duration};

use gem_battle_core::{
    BuffEntry, BuffState, ConfigurationError, GemKind, GeneratedGem, Grid, MitigationState,
    SkillDefinition, SkillEffect, SkillSlotState, UnitStats,
};
use rand::{seq::SliceRandom, Rng};
use tracing::debug;

/// Roster slot together with the skill it resolved to.
#[derive(Clone, Debug)]
pub struct SkillSlot {
    skill: Result<SkillDefinition, ConfigurationError>,
    cooldown: SkillSlotState,
}

impl SkillSlot {
    /// Definition cast by the slot, `None` when it failed to resolve.
    #[must_use]
    pub fn definition(&self) -> Option<&SkillDefinition> {
        self.skill.as_ref().ok()
    }

    /// Configuration problem disabling the slot, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ConfigurationError> {
        self.skill.as_ref().err()
    }

    /// Cooldown counter of the slot.
    #[must_use]
    pub const fn cooldown(&self) -> SkillSlotState {
        self.cooldown
    }

    /// Reports whether the slot can cast right now.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.definition()
            .is_some_and(|skill| self.cooldown.is_ready(skill.cooldown))
    }
}

/// Cast waiting in or moving through the queue.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillCast {
    /// Roster index of the caster.
    pub slot: usize,
    /// Skill being cast.
    pub skill: SkillDefinition,
}

/// Result of asking a slot to cast.
#[derive(Clone, Debug, PartialEq)]
pub enum InvokeOutcome {
    /// The counter was reset and the cast joined the queue.
    Enqueued(SkillCast),
    /// The slot is still cooling down; nothing changed.
    NotReady {
        /// Turns left before the slot becomes ready.
        remaining_turns: u32,
    },
    /// No roster slot exists at the index.
    UnknownSlot,
    /// The slot's skill failed to resolve.
    Misconfigured(ConfigurationError),
}

/// Lifecycle step reported while the queue advances.
#[derive(Clone, Debug, PartialEq)]
pub enum CastProgress {
    /// The cast left the queue and its delay started.
    Begun(SkillCast),
    /// The delay elapsed; the caller applies the effect.
    Resolved(SkillCast),
}

/// Cooldown and cast queue state for every roster slot.
#[derive(Clone, Debug)]
pub struct SkillSystem {
    slots: Vec<SkillSlot>,
    queue: VecDeque<SkillCast>,
    in_progress: Option<(SkillCast, Duration)>,
    cast_delay: Duration,
    clock: Duration,
}

impl SkillSystem {
    /// Creates the system with one slot per roster entry, in roster order.
    #[must_use]
    pub fn new(
        skills: Vec<Result<SkillDefinition, ConfigurationError>>,
        cast_delay: Duration,
    ) -> Self {
        Self {
            slots: skills
                .into_iter()
                .map(|skill| SkillSlot {
                    skill,
                    cooldown: SkillSlotState::new(),
                })
                .collect(),
            queue: VecDeque::new(),
            in_progress: None,
            cast_delay,
            clock: Duration::ZERO,
        }
    }

    /// Every slot in roster order.
    #[must_use]
    pub fn slots(&self) -> &[SkillSlot] {
        &self.slots
    }

    /// Delay between a cast beginning and its effect applying.
    #[must_use]
    pub const fn cast_delay(&self) -> Duration {
        self.cast_delay
    }

    /// Simulated time observed so far.
    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.clock
    }

    /// Cast whose delay is currently running.
    #[must_use]
    pub fn in_progress(&self) -> Option<&SkillCast> {
        self.in_progress.as_ref().map(|(cast, _)| cast)
    }

    /// Casts waiting behind the one in progress.
    pub fn queued(&self) -> impl Iterator<Item = &SkillCast> {
        self.queue.iter()
    }

    /// Reports whether no cast is queued or in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.in_progress.is_none() && self.queue.is_empty()
    }

    /// Attempts to cast the slot's skill. On success the cooldown counter is
    /// reset immediately, before the cast resolves.
    pub fn invoke(&mut self, slot: usize) -> InvokeOutcome {
        let Some(state) = self.slots.get_mut(slot) else {
            return InvokeOutcome::UnknownSlot;
        };
        let skill = match &state.skill {
            Ok(skill) => skill.clone(),
            Err(error) => return InvokeOutcome::Misconfigured(error.clone()),
        };
        if !state.cooldown.is_ready(skill.cooldown) {
            return InvokeOutcome::NotReady {
                remaining_turns: skill.cooldown - state.cooldown.turns_since_use(),
            };
        }

        state.cooldown.reset();
        let cast = SkillCast { slot, skill };
        debug!(slot, skill = %cast.skill.id, "skill cast enqueued");
        self.queue.push_back(cast.clone());
        InvokeOutcome::Enqueued(cast)
    }

    /// Advances the queue without moving the clock: starts the next cast
    /// when idle and resolves every cast whose delay already elapsed.
    pub fn poll(&mut self, out: &mut Vec<CastProgress>) {
        self.tick(Duration::ZERO, out);
    }

    /// Moves the clock forward by `dt`, beginning and resolving casts in
    /// FIFO order. A cast dequeued after another resolves during the same
    /// tick starts its delay at that resolution instant.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<CastProgress>) {
        let target = self.clock.saturating_add(dt);

        loop {
            if let Some((_, started_at)) = &self.in_progress {
                let due = started_at.saturating_add(self.cast_delay);
                if due > target {
                    break;
                }
                self.clock = self.clock.max(due);
                if let Some((cast, _)) = self.in_progress.take() {
                    debug!(slot = cast.slot, skill = %cast.skill.id, "skill cast resolved");
                    out.push(CastProgress::Resolved(cast));
                }
                continue;
            }

            let Some(cast) = self.queue.pop_front() else {
                break;
            };
            debug!(slot = cast.slot, skill = %cast.skill.id, "skill cast begun");
            out.push(CastProgress::Begun(cast.clone()));
            self.in_progress = Some((cast, self.clock));
        }

        self.clock = target;
    }

    /// Counts one elapsed turn on every slot.
    pub fn advance_turn(&mut self) {
        for slot in &mut self.slots {
            slot.cooldown.advance();
        }
    }

    /// Drops every pending cast, returning how many were discarded.
    pub fn abandon(&mut self) -> usize {
        let abandoned = self.queue.len() + usize::from(self.in_progress.is_some());
        self.queue.clear();
        self.in_progress = None;
        abandoned
    }
}

/// Mutable battle state a skill effect may touch.
#[derive(Debug)]
pub struct EffectTarget<'a> {
    /// Board the effect may rewrite.
    pub grid: &'a mut Grid,
    /// Enemy currently in play.
    pub enemy: &'a mut UnitStats,
    /// Active buffs.
    pub buffs: &'a mut BuffState,
    /// Mitigation for the current turn.
    pub mitigation: &'a mut MitigationState,
}

/// Observable result of applying an effect.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectOutcome {
    /// A buff entry was appended.
    Buffed {
        /// Buffed element.
        element: GemKind,
        /// Multiplier of the new entry.
        multiplier: f64,
        /// Turns the entry lasts.
        duration: u32,
    },
    /// Cells were rewritten.
    GemsGenerated(Vec<GeneratedGem>),
    /// The enemy lost hit points.
    DirectDamage {
        /// Hit points removed.
        amount: u32,
    },
    /// Mitigation was set for the current turn.
    Mitigated {
        /// Fraction now absorbed.
        fraction: f64,
    },
}

/// Applies an effect to the battle state.
pub fn apply_effect<R: Rng + ?Sized>(
    effect: &SkillEffect,
    target: EffectTarget<'_>,
    rng: &mut R,
) -> EffectOutcome {
    match effect {
        SkillEffect::Buff {
            element,
            multiplier,
            duration,
        } => {
            target.buffs.push(
                *element,
                BuffEntry {
                    remaining_turns: *duration,
                    multiplier: *multiplier,
                },
            );
            EffectOutcome::Buffed {
                element: *element,
                multiplier: *multiplier,
                duration: *duration,
            }
        }
        SkillEffect::GenerateGems { allowed, count } => {
            EffectOutcome::GemsGenerated(generate_gems(target.grid, allowed, *count, rng))
        }
        SkillEffect::DirectAttack { fraction } => {
            let amount = (f64::from(target.enemy.hp.max()) * fraction).floor() as u32;
            EffectOutcome::DirectDamage {
                amount: target.enemy.hp.damage(amount),
            }
        }
        SkillEffect::Mitigation { fraction } => {
            target.mitigation.set(*fraction);
            EffectOutcome::Mitigated {
                fraction: target.mitigation.fraction(),
            }
        }
    }
}

fn generate_gems<R: Rng + ?Sized>(
    grid: &mut Grid,
    allowed: &[GemKind],
    count: u32,
    rng: &mut R,
) -> Vec<GeneratedGem> {
    let candidates: Vec<(_, GemKind)> = grid
        .cells()
        .filter_map(|(cell, kind)| kind.map(|kind| (cell, kind)))
        .filter(|(_, kind)| !allowed.contains(kind))
        .collect();

    let chosen: Vec<_> = candidates
        .choose_multiple(rng, count as usize)
        .copied()
        .collect();

    let mut generated = Vec::with_capacity(chosen.len());
    for (cell, replaced) in chosen {
        let Some(&kind) = allowed.choose(rng) else {
            break;
        };
        grid.set(cell, kind);
        generated.push(GeneratedGem {
            cell,
            replaced,
            kind,
        });
    }
    generated
}

#[cfg(test)]
mod tests {
    use super::*;
    use gem_battle_core::SkillId;

    fn definition(id: &str, cooldown: u32) -> SkillDefinition {
        SkillDefinition {
            id: SkillId::new(id),
            name: id.to_owned(),
            cooldown,
            effect: SkillEffect::Mitigation { fraction: 0.5 },
        }
    }

    fn system(delay_ms: u64) -> SkillSystem {
        SkillSystem::new(
            vec![
                Ok(definition("first", 0)),
                Ok(definition("second", 0)),
                Ok(definition("gated", 5)),
            ],
            Duration::from_millis(delay_ms),
        )
    }

    #[test]
    fn cooldown_gate_opens_at_threshold() {
        let mut skills = system(0);

        for turn in 0..5 {
            assert_eq!(
                skills.invoke(2),
                InvokeOutcome::NotReady {
                    remaining_turns: 5 - turn
                },
            );
            assert!(!skills.slots()[2].is_ready());
            skills.advance_turn();
        }

        assert!(skills.slots()[2].is_ready());
        assert!(matches!(skills.invoke(2), InvokeOutcome::Enqueued(_)));
        assert_eq!(skills.slots()[2].cooldown().turns_since_use(), 0);
        assert!(matches!(
            skills.invoke(2),
            InvokeOutcome::NotReady { .. }
        ));
    }

    #[test]
    fn unknown_slot_and_misconfigured_slot_are_reported() {
        let error = ConfigurationError::UnknownSkill {
            ally: "Genbu".to_owned(),
            skill: SkillId::new("missing"),
        };
        let mut skills = SkillSystem::new(vec![Err(error.clone())], Duration::ZERO);

        assert_eq!(skills.invoke(3), InvokeOutcome::UnknownSlot);
        assert_eq!(skills.invoke(0), InvokeOutcome::Misconfigured(error));
        assert!(skills.is_idle());
    }

    #[test]
    fn casts_resolve_in_fifo_order_after_delay() {
        let mut skills = system(600);
        let mut progress = Vec::new();

        assert!(matches!(skills.invoke(1), InvokeOutcome::Enqueued(_)));
        assert!(matches!(skills.invoke(0), InvokeOutcome::Enqueued(_)));
        skills.poll(&mut progress);
        assert_eq!(progress.len(), 1);
        assert!(matches!(&progress[0], CastProgress::Begun(cast) if cast.slot == 1));

        progress.clear();
        skills.tick(Duration::from_millis(599), &mut progress);
        assert!(progress.is_empty());

        skills.tick(Duration::from_millis(1), &mut progress);
        let slots: Vec<(bool, usize)> = progress
            .iter()
            .map(|step| match step {
                CastProgress::Begun(cast) => (false, cast.slot),
                CastProgress::Resolved(cast) => (true, cast.slot),
            })
            .collect();
        assert_eq!(slots, vec![(true, 1), (false, 0)]);

        progress.clear();
        skills.tick(Duration::from_millis(600), &mut progress);
        assert!(matches!(&progress[..], [CastProgress::Resolved(cast)] if cast.slot == 0));
        assert!(skills.is_idle());
    }

    #[test]
    fn long_tick_drains_queue() {
        let mut skills = system(600);
        let mut progress = Vec::new();
        let _ = skills.invoke(0);
        let _ = skills.invoke(1);

        skills.tick(Duration::from_secs(2), &mut progress);

        let resolved = progress
            .iter()
            .filter(|step| matches!(step, CastProgress::Resolved(_)))
            .count();
        assert_eq!(resolved, 2);
        assert!(skills.is_idle());
    }

    #[test]
    fn zero_delay_resolves_on_poll() {
        let mut skills = system(0);
        let mut progress = Vec::new();
        let _ = skills.invoke(0);

        skills.poll(&mut progress);

        assert_eq!(progress.len(), 2);
        assert!(matches!(progress[1], CastProgress::Resolved(_)));
    }

    #[test]
    fn abandon_discards_pending_casts() {
        let mut skills = system(600);
        let mut progress = Vec::new();
        let _ = skills.invoke(0);
        let _ = skills.invoke(1);
        skills.poll(&mut progress);

        assert_eq!(skills.abandon(), 2);
        assert!(skills.is_idle());
    }
}
