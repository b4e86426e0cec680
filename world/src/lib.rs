#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state and the turn coordinator driving it.

pub mod config;

use std::{mem, time::Duration};

use gem_battle_core::{
    Ally, BuffState, CascadeState, CellCoord, Cluster, Command, ConfigurationError,
    EncounterOutcome, Enemy, Event, Grid, HitPoints, MitigationState, Party, Run, SkillCatalogue,
    SwapError, TurnPhase, UnitStats,
};
use gem_battle_system_cluster_merger::ClusterMerger;
use gem_battle_system_combat::{CombatEffect, CombatResolver};
use gem_battle_system_gravity::{Gravity, SpawnPool};
use gem_battle_system_grid_scanner::GridScanner;
use gem_battle_system_skills::{
    apply_effect, CastProgress, EffectOutcome, EffectTarget, InvokeOutcome, SkillSystem,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::EncounterConfig;

/// Mutable state of one encounter.
#[derive(Debug)]
struct BattleState {
    grid: Grid,
    party: Party,
    enemies: Vec<Enemy>,
    enemy_index: usize,
    buffs: BuffState,
    mitigation: MitigationState,
    skills: SkillSystem,
    turn: u32,
}

impl BattleState {
    fn current_enemy(&self) -> Option<&Enemy> {
        self.enemies.get(self.enemy_index)
    }
}

/// Represents the authoritative battle world.
#[derive(Debug)]
pub struct World {
    battle: BattleState,
    phase: TurnPhase,
    outcome: Option<EncounterOutcome>,
    swapped_this_drag: bool,
    spawn_pool: SpawnPool,
    rng: ChaCha8Rng,
    scanner: GridScanner,
    merger: ClusterMerger,
    gravity: Gravity,
    resolver: CombatResolver,
    runs: Vec<Run>,
    clusters: Vec<Cluster>,
    effects: Vec<CombatEffect>,
    progress: Vec<CastProgress>,
}

impl World {
    /// Builds an encounter from `config`, seeding every random draw from
    /// `seed`. The opening board is filled from the spawn pool.
    ///
    /// Roster entries naming an unknown skill do not fail construction; their
    /// slot is disabled and reports the problem when invoked.
    pub fn new(config: &EncounterConfig, seed: u64) -> Result<Self, ConfigurationError> {
        if config.roster.is_empty() {
            return Err(ConfigurationError::EmptyRoster);
        }
        if config.enemies.is_empty() {
            return Err(ConfigurationError::NoEnemies);
        }
        let catalogue = SkillCatalogue::from_definitions(config.skills.iter().cloned())?;
        let spawn_pool = SpawnPool::new(config.spawn_pool.clone())?;

        let mut roster = Vec::with_capacity(config.roster.len());
        let mut slots = Vec::with_capacity(config.roster.len());
        for ally in &config.roster {
            let resolved = catalogue.resolve(&ally.name, &ally.skill).cloned();
            if let Err(error) = &resolved {
                warn!(%error, "skill slot disabled");
            }
            slots.push(resolved);
            roster.push(Ally {
                name: ally.name.clone(),
                stats: UnitStats::new(ally.element, ally.ap, ally.dp, ally.max_hp),
                skill: ally.skill.clone(),
            });
        }

        let enemies = config
            .enemies
            .iter()
            .map(|enemy| Enemy {
                name: enemy.name.clone(),
                stats: UnitStats::new(enemy.element, enemy.ap, enemy.dp, enemy.max_hp),
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let grid = spawn_pool.fill(&mut rng);

        Ok(Self {
            battle: BattleState {
                grid,
                party: Party {
                    dp: config.party_dp(),
                    hp: HitPoints::full(config.party.max_hp),
                    roster,
                },
                enemies,
                enemy_index: 0,
                buffs: BuffState::new(),
                mitigation: MitigationState::default(),
                skills: SkillSystem::new(slots, config.cast_delay()),
                turn: 0,
            },
            phase: TurnPhase::AwaitingInput,
            outcome: None,
            swapped_this_drag: false,
            spawn_pool,
            rng,
            scanner: GridScanner::new(),
            merger: ClusterMerger::new(),
            gravity: Gravity::new(),
            resolver: CombatResolver::new(config.tuning),
            runs: Vec::new(),
            clusters: Vec::new(),
            effects: Vec::new(),
            progress: Vec::new(),
        })
    }

    fn set_phase(&mut self, phase: TurnPhase, out_events: &mut Vec<Event>) {
        if self.phase == phase {
            return;
        }
        debug!(from = ?self.phase, to = ?phase, "phase changed");
        self.phase = phase;
        out_events.push(Event::PhaseChanged { phase });
    }

    fn validate_swap(&self, from: CellCoord, to: CellCoord) -> Result<(), SwapError> {
        if self.phase != TurnPhase::AwaitingInput {
            return Err(SwapError::InvalidPhase);
        }
        if !from.is_on_board() || !to.is_on_board() {
            return Err(SwapError::OutOfBounds);
        }
        if from == to {
            return Err(SwapError::SameCell);
        }
        if from.chebyshev_distance(to) > 1 {
            return Err(SwapError::NotAdjacent);
        }
        Ok(())
    }

    fn invoke_skill(&mut self, slot: usize, out_events: &mut Vec<Event>) {
        match self.battle.skills.invoke(slot) {
            InvokeOutcome::Enqueued(cast) => {
                out_events.push(Event::SkillCastEnqueued {
                    slot,
                    skill: cast.skill.id.clone(),
                    description: cast.skill.description(),
                });
                let mut progress = mem::take(&mut self.progress);
                self.battle.skills.poll(&mut progress);
                self.handle_cast_progress(&mut progress, out_events);
                self.progress = progress;
            }
            InvokeOutcome::NotReady { remaining_turns } => {
                debug!(slot, remaining_turns, "skill not ready, invocation ignored");
            }
            InvokeOutcome::UnknownSlot => {
                debug!(slot, "no roster slot, invocation ignored");
            }
            InvokeOutcome::Misconfigured(error) => {
                out_events.push(Event::SkillInvocationFailed { slot, error });
            }
        }
    }

    fn advance_time(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        let mut progress = mem::take(&mut self.progress);
        self.battle.skills.tick(dt, &mut progress);
        self.handle_cast_progress(&mut progress, out_events);
        self.progress = progress;
    }

    fn handle_cast_progress(
        &mut self,
        progress: &mut Vec<CastProgress>,
        out_events: &mut Vec<Event>,
    ) {
        for step in progress.drain(..) {
            match step {
                CastProgress::Begun(cast) => out_events.push(Event::SkillCastBegun {
                    slot: cast.slot,
                    description: cast.skill.description(),
                    skill: cast.skill.id,
                }),
                CastProgress::Resolved(cast) => {
                    let battle = &mut self.battle;
                    let Some(enemy) = battle.enemies.get_mut(battle.enemy_index) else {
                        continue;
                    };
                    let outcome = apply_effect(
                        &cast.skill.effect,
                        EffectTarget {
                            grid: &mut battle.grid,
                            enemy: &mut enemy.stats,
                            buffs: &mut battle.buffs,
                            mitigation: &mut battle.mitigation,
                        },
                        &mut self.rng,
                    );
                    out_events.push(Event::SkillCastResolved {
                        slot: cast.slot,
                        description: cast.skill.description(),
                        skill: cast.skill.id,
                    });
                    match outcome {
                        EffectOutcome::GemsGenerated(gems) => {
                            out_events.push(Event::GemsGenerated { gems });
                        }
                        EffectOutcome::DirectDamage { amount } => {
                            out_events.push(Event::DirectDamageDealt {
                                slot: cast.slot,
                                amount,
                            });
                        }
                        EffectOutcome::Buffed { .. } | EffectOutcome::Mitigated { .. } => {}
                    }
                }
            }
        }
    }

    fn resolve_turn(&mut self, out_events: &mut Vec<Event>) {
        self.swapped_this_drag = false;
        self.set_phase(TurnPhase::Cascading, out_events);
        let cascade = self.run_cascade(out_events);

        self.set_phase(TurnPhase::ApplyingCombat, out_events);
        self.apply_combat(&cascade, out_events);
        let enemy_defeated = self
            .battle
            .current_enemy()
            .map_or(true, |enemy| enemy.stats.hp.is_depleted());

        if !enemy_defeated {
            self.set_phase(TurnPhase::EnemyTurn, out_events);
            self.enemy_attack(out_events);
        }

        self.set_phase(TurnPhase::Bookkeeping, out_events);
        self.bookkeeping(enemy_defeated, out_events);
    }

    fn run_cascade(&mut self, out_events: &mut Vec<Event>) -> CascadeState {
        let mut cascade = CascadeState::new();
        let mut wave = 0;

        loop {
            self.runs.clear();
            self.scanner.scan(&self.battle.grid, &mut self.runs);
            if self.runs.is_empty() {
                break;
            }
            wave += 1;

            self.clusters.clear();
            self.merger
                .merge(&self.battle.grid, &self.runs, &mut self.clusters);
            debug!(wave, clusters = self.clusters.len(), "cascade wave");

            for cluster in self.clusters.drain(..) {
                let (combo, score) = self.resolver.accumulate(&cluster, &mut cascade);
                for &cell in cluster.cells() {
                    let _ = self.battle.grid.clear(cell);
                }
                out_events.push(Event::ClusterMatched {
                    cluster,
                    combo,
                    wave,
                    score,
                });
            }

            let plan = self
                .gravity
                .apply(&mut self.battle.grid, &self.spawn_pool, &mut self.rng);
            out_events.push(Event::GemsFell { wave, plan });
        }

        out_events.push(Event::CascadeSettled {
            waves: wave,
            combo: cascade.combo(),
        });
        cascade
    }

    fn apply_combat(&mut self, cascade: &CascadeState, out_events: &mut Vec<Event>) {
        let battle = &mut self.battle;
        let Some(enemy) = battle.enemies.get_mut(battle.enemy_index) else {
            return;
        };

        self.effects.clear();
        self.resolver.resolve(
            cascade,
            &battle.party,
            &enemy.stats,
            &battle.buffs,
            &mut self.rng,
            &mut self.effects,
        );

        let combo = cascade.combo();
        for effect in self.effects.drain(..) {
            match effect {
                CombatEffect::Heal { amount } => {
                    let _ = battle.party.hp.heal(amount);
                    out_events.push(Event::PartyHealed { amount, combo });
                }
                CombatEffect::Damage {
                    attacker,
                    defender,
                    amount,
                    affinity,
                } => {
                    let _ = enemy.stats.hp.damage(amount);
                    out_events.push(Event::DamageDealt {
                        attacker,
                        defender,
                        amount,
                        affinity,
                        combo,
                    });
                }
            }
        }
    }

    fn enemy_attack(&mut self, out_events: &mut Vec<Event>) {
        let battle = &mut self.battle;
        let Some(enemy) = battle.enemies.get(battle.enemy_index) else {
            return;
        };
        let amount = self.resolver.enemy_strike(
            &enemy.stats,
            battle.party.dp,
            &battle.mitigation,
            &mut self.rng,
        );
        let _ = battle.party.hp.damage(amount);
        out_events.push(Event::EnemyAttacked {
            element: enemy.stats.element,
            amount,
            mitigation: battle.mitigation.fraction(),
        });
    }

    fn bookkeeping(&mut self, enemy_defeated: bool, out_events: &mut Vec<Event>) {
        self.battle.skills.advance_turn();

        let mut expired = Vec::new();
        self.battle.buffs.decay(&mut expired);
        for (element, entry) in expired {
            out_events.push(Event::BuffExpired {
                element,
                multiplier: entry.multiplier,
            });
        }

        self.battle.mitigation.reset();
        self.battle.turn += 1;
        out_events.push(Event::TurnAdvanced {
            turn: self.battle.turn,
        });

        if enemy_defeated {
            let index = self.battle.enemy_index;
            if let Some(enemy) = self.battle.current_enemy() {
                info!(index, name = %enemy.name, "enemy defeated");
                out_events.push(Event::EnemyDefeated {
                    index,
                    name: enemy.name.clone(),
                });
            }
            self.battle.enemy_index += 1;
            match self.battle.current_enemy() {
                Some(next) => out_events.push(Event::EnemyAppeared {
                    index: self.battle.enemy_index,
                    name: next.name.clone(),
                    element: next.stats.element,
                }),
                None => {
                    self.finish(EncounterOutcome::Victory, out_events);
                    return;
                }
            }
        } else if self.battle.party.hp.is_depleted() {
            self.finish(EncounterOutcome::Defeat, out_events);
            return;
        }

        self.set_phase(TurnPhase::AwaitingInput, out_events);
    }

    fn finish(&mut self, outcome: EncounterOutcome, out_events: &mut Vec<Event>) {
        let abandoned = self.battle.skills.abandon();
        info!(?outcome, turn = self.battle.turn, abandoned, "encounter finished");
        self.outcome = Some(outcome);
        self.set_phase(TurnPhase::EncounterOver, out_events);
        out_events.push(Event::EncounterFinished { outcome });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.phase == TurnPhase::EncounterOver {
        if let Command::Swap { from, to } = command {
            out_events.push(Event::SwapRejected {
                from,
                to,
                reason: SwapError::InvalidPhase,
            });
        }
        return;
    }

    match command {
        Command::ConfigureGrid { grid } => {
            if world.phase != TurnPhase::AwaitingInput || !grid.is_settled() {
                warn!("board replacement ignored");
                return;
            }
            world.battle.grid = grid.clone();
            world.swapped_this_drag = false;
            out_events.push(Event::GridConfigured { grid });
        }
        Command::Swap { from, to } => match world.validate_swap(from, to) {
            Ok(()) => {
                let _ = world.battle.grid.swap(from, to);
                world.swapped_this_drag = true;
                out_events.push(Event::GemsSwapped { from, to });
            }
            Err(reason) => out_events.push(Event::SwapRejected { from, to, reason }),
        },
        Command::Release => {
            if world.phase == TurnPhase::AwaitingInput && world.swapped_this_drag {
                world.resolve_turn(out_events);
            }
        }
        Command::InvokeSkill { slot } => world.invoke_skill(slot, out_events),
        Command::Tick { dt } => world.advance_time(dt, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use gem_battle_core::{
        BuffState, EncounterOutcome, Enemy, Grid, MitigationState, Party, TurnPhase,
    };
    use gem_battle_system_skills::{SkillCast, SkillSlot};

    /// Current phase of the turn state machine.
    #[must_use]
    pub fn phase(world: &World) -> TurnPhase {
        world.phase
    }

    /// Board in play.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.battle.grid
    }

    /// Party pool and roster.
    #[must_use]
    pub fn party(world: &World) -> &Party {
        &world.battle.party
    }

    /// Every enemy of the encounter, in sequence order.
    #[must_use]
    pub fn enemies(world: &World) -> &[Enemy] {
        &world.battle.enemies
    }

    /// Position of the enemy currently fought.
    #[must_use]
    pub fn enemy_index(world: &World) -> usize {
        world.battle.enemy_index
    }

    /// Enemy currently fought, `None` once the sequence is exhausted.
    #[must_use]
    pub fn current_enemy(world: &World) -> Option<&Enemy> {
        world.battle.current_enemy()
    }

    /// Active buffs.
    #[must_use]
    pub fn buffs(world: &World) -> &BuffState {
        &world.battle.buffs
    }

    /// Mitigation for the current turn.
    #[must_use]
    pub fn mitigation(world: &World) -> MitigationState {
        world.battle.mitigation
    }

    /// Skill slots in roster order.
    #[must_use]
    pub fn skill_slots(world: &World) -> &[SkillSlot] {
        world.battle.skills.slots()
    }

    /// Indices of the slots that can cast right now.
    #[must_use]
    pub fn ready_slots(world: &World) -> Vec<usize> {
        world
            .battle
            .skills
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_ready())
            .map(|(index, _)| index)
            .collect()
    }

    /// Cast whose delay is running.
    #[must_use]
    pub fn cast_in_progress(world: &World) -> Option<&SkillCast> {
        world.battle.skills.in_progress()
    }

    /// Reports whether no cast is queued or running.
    #[must_use]
    pub fn casts_idle(world: &World) -> bool {
        world.battle.skills.is_idle()
    }

    /// Delay between a cast beginning and resolving.
    #[must_use]
    pub fn cast_delay(world: &World) -> Duration {
        world.battle.skills.cast_delay()
    }

    /// Number of completed turns.
    #[must_use]
    pub fn turn(world: &World) -> u32 {
        world.battle.turn
    }

    /// Final result, once the encounter is over.
    #[must_use]
    pub fn outcome(world: &World) -> Option<EncounterOutcome> {
        world.outcome
    }
}
