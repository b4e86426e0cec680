#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the gem battle engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative turn coordinator, and the pure puzzle and combat systems.
//! Adapters submit [`Command`] values describing player intent, the world
//! executes those commands via its `apply` entry point, and then reports every
//! observable consequence as [`Event`] values for presentation layers to
//! animate and display.

mod grid;
mod skill;
mod state;
mod unit;

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub use grid::{
    Axis, CellCoord, Cluster, FallPlan, GemFall, GemKind, Grid, GridParseError, Run, GRID_COLUMNS,
    GRID_ROWS, MIN_RUN_LENGTH,
};
pub use skill::{SkillCatalogue, SkillDefinition, SkillEffect, SkillId};
pub use state::{BuffEntry, BuffState, CascadeState, MitigationState, SkillSlotState};
pub use unit::{Ally, Enemy, HitPoints, Party, UnitStats};

/// Commands that express all permissible battle mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the board with a fully populated grid.
    ConfigureGrid {
        /// Board to install.
        grid: Grid,
    },
    /// Exchanges two gems as part of a held drag.
    Swap {
        /// Cell the dragged gem currently occupies.
        from: CellCoord,
        /// Hovered cell the dragged gem moves into.
        to: CellCoord,
    },
    /// Ends the drag and resolves the turn.
    Release,
    /// Requests that a roster slot cast its skill.
    InvokeSkill {
        /// Roster index of the casting ally.
        slot: usize,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Stage of the turn state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TurnPhase {
    /// Waiting for the player to drag gems.
    AwaitingInput,
    /// Repeatedly matching, clearing and refilling the board.
    Cascading,
    /// Converting the cascade tally into damage and healing.
    ApplyingCombat,
    /// The surviving enemy strikes back.
    EnemyTurn,
    /// Cooldowns, buffs, mitigation and the turn counter advance.
    Bookkeeping,
    /// The encounter has ended; no further input is accepted.
    EncounterOver,
}

/// Final result of an encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EncounterOutcome {
    /// Every enemy in the sequence was defeated.
    Victory,
    /// The party's hit points reached zero.
    Defeat,
}

/// Reasons a swap intent may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SwapError {
    /// Swaps are only accepted while awaiting input.
    InvalidPhase,
    /// One of the cells lies off the board.
    OutOfBounds,
    /// Both coordinates name the same cell.
    SameCell,
    /// The cells differ by more than one step along an axis.
    NotAdjacent,
}

/// Gem written onto the board by a skill effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GeneratedGem {
    /// Cell that was overwritten.
    pub cell: CellCoord,
    /// Kind the cell held before the effect.
    pub replaced: GemKind,
    /// Kind written into the cell.
    pub kind: GemKind,
}

/// Problems in the static encounter configuration.
#[derive(Clone, Debug, Error, PartialEq, Serialize)]
pub enum ConfigurationError {
    /// A roster entry names a skill missing from the catalogue.
    #[error("ally `{ally}` references unknown skill `{skill}`")]
    UnknownSkill {
        /// Name of the ally owning the reference.
        ally: String,
        /// Identifier that failed to resolve.
        skill: SkillId,
    },
    /// Two catalogue entries share an identifier.
    #[error("skill `{0}` is defined more than once")]
    DuplicateSkill(SkillId),
    /// A fraction lies outside `[0, 1]`.
    #[error("skill `{skill}` uses fraction {value} outside [0, 1]")]
    InvalidFraction {
        /// Skill carrying the fraction.
        skill: SkillId,
        /// Offending value.
        value: f64,
    },
    /// A buff multiplier is not a positive finite number.
    #[error("skill `{skill}` uses non-positive multiplier {value}")]
    InvalidMultiplier {
        /// Skill carrying the multiplier.
        skill: SkillId,
        /// Offending value.
        value: f64,
    },
    /// A buff lasts zero turns.
    #[error("skill `{skill}` buffs for zero turns")]
    ZeroDuration {
        /// Skill carrying the duration.
        skill: SkillId,
    },
    /// A gem generation effect allows no kind at all.
    #[error("skill `{skill}` generates gems from an empty set")]
    EmptyAllowedGems {
        /// Skill carrying the allowed set.
        skill: SkillId,
    },
    /// The refill spawn pool holds no kinds.
    #[error("spawn pool is empty")]
    EmptySpawnPool,
    /// The refill spawn pool holds a single kind, so cascades never settle.
    #[error("spawn pool only contains {kind}; at least two kinds are required")]
    DegenerateSpawnPool {
        /// The only kind present.
        kind: GemKind,
    },
    /// The encounter lists no enemies.
    #[error("encounter has no enemies")]
    NoEnemies,
    /// The party has no allies.
    #[error("party roster is empty")]
    EmptyRoster,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the turn state machine entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: TurnPhase,
    },
    /// Confirms that the board was replaced.
    GridConfigured {
        /// Board now in play.
        grid: Grid,
    },
    /// Confirms that two gems were exchanged.
    GemsSwapped {
        /// Cell the dragged gem left.
        from: CellCoord,
        /// Cell the dragged gem entered.
        to: CellCoord,
    },
    /// Reports that a swap intent was refused.
    SwapRejected {
        /// Cell named as the swap source.
        from: CellCoord,
        /// Cell named as the swap destination.
        to: CellCoord,
        /// Specific reason the swap failed.
        reason: SwapError,
    },
    /// Reports a cluster that was matched and cleared from the board.
    ClusterMatched {
        /// Matched cells; all of them are cleared.
        cluster: Cluster,
        /// Cascade-wide combo index assigned to the cluster.
        combo: u32,
        /// One-based cascade wave the cluster was found in.
        wave: u32,
        /// Score the cluster contributed to its element.
        score: f64,
    },
    /// Describes how gems fell and spawned after a wave was cleared.
    GemsFell {
        /// One-based cascade wave that triggered the refill.
        wave: u32,
        /// Per-gem origin and destination rows.
        plan: FallPlan,
    },
    /// Confirms that the board holds no further runs.
    CascadeSettled {
        /// Number of waves that produced matches.
        waves: u32,
        /// Final combo index of the turn.
        combo: u32,
    },
    /// Reports elemental damage dealt to the enemy by matched gems.
    DamageDealt {
        /// Element of the attacking ally.
        attacker: GemKind,
        /// Element of the enemy.
        defender: GemKind,
        /// Hit points removed from the enemy.
        amount: u32,
        /// Affinity multiplier that applied.
        affinity: f64,
        /// Final combo index of the turn.
        combo: u32,
    },
    /// Reports healing granted by matched life gems.
    PartyHealed {
        /// Hit points restored.
        amount: u32,
        /// Final combo index of the turn.
        combo: u32,
    },
    /// Reports the enemy's counterattack.
    EnemyAttacked {
        /// Element of the attacking enemy.
        element: GemKind,
        /// Hit points removed from the party.
        amount: u32,
        /// Mitigated fraction that applied to the attack.
        mitigation: f64,
    },
    /// Confirms that a skill cast was queued.
    SkillCastEnqueued {
        /// Roster index of the caster.
        slot: usize,
        /// Skill being cast.
        skill: SkillId,
        /// Human-readable description of the effect.
        description: String,
    },
    /// Announces that a queued cast started its delay.
    SkillCastBegun {
        /// Roster index of the caster.
        slot: usize,
        /// Skill being cast.
        skill: SkillId,
        /// Human-readable description of the effect.
        description: String,
    },
    /// Confirms that a cast's effect was applied.
    SkillCastResolved {
        /// Roster index of the caster.
        slot: usize,
        /// Skill that was cast.
        skill: SkillId,
        /// Human-readable description of the effect.
        description: String,
    },
    /// Reports that a slot cannot cast because of a configuration problem.
    SkillInvocationFailed {
        /// Roster index of the caster.
        slot: usize,
        /// Problem preventing the cast.
        error: ConfigurationError,
    },
    /// Lists gems written onto the board by a skill.
    GemsGenerated {
        /// Overwritten cells and their new kinds.
        gems: Vec<GeneratedGem>,
    },
    /// Reports damage dealt by a skill, bypassing defense.
    DirectDamageDealt {
        /// Roster index of the caster.
        slot: usize,
        /// Hit points removed from the enemy.
        amount: u32,
    },
    /// Reports that a buff ran out.
    BuffExpired {
        /// Element the buff applied to.
        element: GemKind,
        /// Multiplier that stopped applying.
        multiplier: f64,
    },
    /// Confirms that bookkeeping completed a turn.
    TurnAdvanced {
        /// Number of turns completed so far.
        turn: u32,
    },
    /// Reports that the current enemy fell.
    EnemyDefeated {
        /// Position of the enemy in the encounter sequence.
        index: usize,
        /// Display name of the enemy.
        name: String,
    },
    /// Announces the next enemy in the sequence.
    EnemyAppeared {
        /// Position of the enemy in the encounter sequence.
        index: usize,
        /// Display name of the enemy.
        name: String,
        /// Element of the enemy.
        element: GemKind,
    },
    /// Announces the end of the encounter.
    EncounterFinished {
        /// Final result.
        outcome: EncounterOutcome,
    },
}

#[cfg(test)]
mod tests {
    use super::{
        BuffEntry, BuffState, CascadeState, CellCoord, Cluster, ConfigurationError, GemKind, Grid,
        GridParseError, HitPoints, MitigationState, SkillCatalogue, SkillDefinition, SkillEffect,
        SkillId, SkillSlotState,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn skill(id: &str, effect: SkillEffect) -> SkillDefinition {
        SkillDefinition {
            id: SkillId::new(id),
            name: id.to_owned(),
            cooldown: 3,
            effect,
        }
    }

    #[test]
    fn chebyshev_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        assert_eq!(origin.chebyshev_distance(CellCoord::new(2, 2)), 1);
        assert_eq!(origin.chebyshev_distance(CellCoord::new(1, 1)), 0);
        assert_eq!(origin.chebyshev_distance(CellCoord::new(4, 2)), 3);
    }

    #[test]
    fn neighbors_stay_on_board() {
        let corner: Vec<CellCoord> = CellCoord::new(0, 0).neighbors().collect();
        assert_eq!(corner, vec![CellCoord::new(1, 0), CellCoord::new(0, 1)]);

        let far_corner: Vec<CellCoord> = CellCoord::new(5, 4).neighbors().collect();
        assert_eq!(far_corner, vec![CellCoord::new(4, 4), CellCoord::new(5, 3)]);
    }

    #[test]
    fn grid_notation_round_trips_through_display() {
        let notation = "$$$~#@\n~#@$~&\n@$~#&$\n#~&@$~\n&@$~#@";
        let grid: Grid = notation.parse().expect("valid notation");
        assert_eq!(grid.to_string(), notation);
        assert_eq!(grid.gem(CellCoord::new(3, 0)), Some(GemKind::Water));
        assert!(grid.is_settled());
    }

    #[test]
    fn grid_notation_reports_malformed_input() {
        assert_eq!(
            "$$$".parse::<Grid>(),
            Err(GridParseError::RowCount { found: 1 })
        );
        assert_eq!(
            "$$$~#@ ~#@$~ @$~#&$ #~&@$~ &@$~#@".parse::<Grid>(),
            Err(GridParseError::RowLength { row: 1, found: 5 })
        );
        assert_eq!(
            "$$$~#@ ~#@$~& @$~#&$ #~&@$~ &@$~#x".parse::<Grid>(),
            Err(GridParseError::UnknownGlyph {
                row: 4,
                column: 5,
                glyph: 'x'
            })
        );
    }

    #[test]
    fn cleared_cells_parse_as_empty() {
        let grid: Grid = "$.$~#@ ~#@$~& @$~#&$ #~&@$~ &@$~#@".parse().expect("valid");
        assert_eq!(grid.gem(CellCoord::new(1, 0)), None);
        assert!(!grid.is_settled());
    }

    #[test]
    fn swap_rejects_off_board_cells() {
        let mut grid: Grid = "$$$~#@ ~#@$~& @$~#&$ #~&@$~ &@$~#@".parse().expect("valid");
        let before = grid.clone();
        assert!(!grid.swap(CellCoord::new(5, 4), CellCoord::new(6, 4)));
        assert_eq!(grid, before);

        assert!(grid.swap(CellCoord::new(2, 0), CellCoord::new(3, 0)));
        assert_eq!(grid.gem(CellCoord::new(2, 0)), Some(GemKind::Water));
        assert_eq!(grid.gem(CellCoord::new(3, 0)), Some(GemKind::Fire));
    }

    #[test]
    fn cluster_cells_are_sorted_and_unique() {
        let cluster = Cluster::new(
            GemKind::Fire,
            vec![
                CellCoord::new(2, 0),
                CellCoord::new(0, 0),
                CellCoord::new(2, 0),
                CellCoord::new(1, 0),
            ],
        );
        assert_eq!(cluster.count(), 3);
        assert!(cluster.contains(CellCoord::new(1, 0)));
        assert!(!cluster.contains(CellCoord::new(1, 1)));
    }

    #[test]
    fn hit_points_clamp_in_both_directions() {
        let mut hp = HitPoints::new(80, 100);
        assert_eq!(hp.heal(50), 20);
        assert_eq!(hp.current(), 100);
        assert_eq!(hp.damage(250), 100);
        assert_eq!(hp.current(), 0);
        assert!(hp.is_depleted());
        assert_eq!(HitPoints::new(500, 100).current(), 100);
    }

    #[test]
    fn buff_multipliers_stack_and_expire() {
        let mut buffs = BuffState::new();
        assert!((buffs.multiplier(GemKind::Wind) - 1.0).abs() < f64::EPSILON);

        buffs.push(
            GemKind::Wind,
            BuffEntry {
                remaining_turns: 1,
                multiplier: 2.0,
            },
        );
        buffs.push(
            GemKind::Wind,
            BuffEntry {
                remaining_turns: 2,
                multiplier: 1.5,
            },
        );
        assert!((buffs.multiplier(GemKind::Wind) - 3.0).abs() < f64::EPSILON);

        let mut expired = Vec::new();
        buffs.decay(&mut expired);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, GemKind::Wind);
        assert!((buffs.multiplier(GemKind::Wind) - 1.5).abs() < f64::EPSILON);

        buffs.decay(&mut expired);
        assert!(buffs.is_empty());
    }

    #[test]
    fn mitigation_is_clamped_and_resettable() {
        let mut mitigation = MitigationState::default();
        mitigation.set(1.7);
        assert!((mitigation.fraction() - 1.0).abs() < f64::EPSILON);
        mitigation.set(0.25);
        assert!((mitigation.damage_factor() - 0.75).abs() < f64::EPSILON);
        mitigation.reset();
        assert!(mitigation.fraction().abs() < f64::EPSILON);
    }

    #[test]
    fn skill_slot_gate_opens_at_threshold() {
        let mut slot = SkillSlotState::new();
        for _ in 0..5 {
            assert!(!slot.is_ready(5));
            slot.advance();
        }
        assert!(slot.is_ready(5));
        slot.reset();
        assert_eq!(slot.turns_since_use(), 0);
    }

    #[test]
    fn cascade_tally_counts_every_cluster() {
        let mut cascade = CascadeState::new();
        assert_eq!(cascade.register(GemKind::Fire, 1.0), 1);
        assert_eq!(cascade.register(GemKind::Fire, 1.2), 2);
        assert_eq!(cascade.register(GemKind::Life, 1.0), 3);
        let buckets: Vec<(GemKind, f64)> = cascade.buckets().collect();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].0, GemKind::Fire);
        assert!((buckets[0].1 - 2.2).abs() < 1e-9);
        assert_eq!(buckets[1].0, GemKind::Life);
    }

    #[test]
    fn catalogue_rejects_duplicates_and_bad_effects() {
        let duplicate = SkillCatalogue::from_definitions(vec![
            skill("a", SkillEffect::DirectAttack { fraction: 0.3 }),
            skill("a", SkillEffect::Mitigation { fraction: 0.5 }),
        ]);
        assert_eq!(
            duplicate,
            Err(ConfigurationError::DuplicateSkill(SkillId::new("a")))
        );

        let bad_fraction =
            SkillCatalogue::from_definitions(vec![skill("b", SkillEffect::Mitigation {
                fraction: 1.5,
            })]);
        assert!(matches!(
            bad_fraction,
            Err(ConfigurationError::InvalidFraction { .. })
        ));

        let no_kinds = SkillCatalogue::from_definitions(vec![skill(
            "c",
            SkillEffect::GenerateGems {
                allowed: Vec::new(),
                count: 3,
            },
        )]);
        assert!(matches!(
            no_kinds,
            Err(ConfigurationError::EmptyAllowedGems { .. })
        ));
    }

    #[test]
    fn effects_describe_their_parameters() {
        let cloak = skill(
            "flame_cloak",
            SkillEffect::GenerateGems {
                allowed: vec![GemKind::Fire, GemKind::Life],
                count: 4,
            },
        );
        assert_eq!(
            cloak.description(),
            "flame_cloak: turns up to 4 gems into Fire/Life"
        );

        let buff = SkillEffect::Buff {
            element: GemKind::Water,
            multiplier: 2.0,
            duration: 3,
        };
        assert_eq!(buff.describe(), "Water damage x2 for 3 turns");
        assert_eq!(
            SkillEffect::DirectAttack { fraction: 0.25 }.describe(),
            "strikes for 25% of the enemy's max HP"
        );
        assert_eq!(
            SkillEffect::Mitigation { fraction: 0.5 }.describe(),
            "absorbs 50% of the enemy's next attack"
        );
    }

    #[test]
    fn catalogue_reports_unknown_skills_by_ally() {
        let catalogue = SkillCatalogue::default();
        let error = catalogue
            .resolve("Genbu", &SkillId::new("iron_wall"))
            .expect_err("missing skill");
        assert_eq!(
            error.to_string(),
            "ally `Genbu` references unknown skill `iron_wall`"
        );
    }

    #[test]
    fn gem_kind_round_trips_through_bincode() {
        for kind in GemKind::ALL {
            assert_round_trip(&kind);
        }
    }

    #[test]
    fn grid_round_trips_through_bincode() {
        let grid: Grid = "$.$~#@ ~#@$~& @$~#&$ #~&@$~ &@$~#@".parse().expect("valid");
        assert_round_trip(&grid);
    }

    #[test]
    fn cluster_round_trips_through_bincode() {
        assert_round_trip(&Cluster::new(
            GemKind::Earth,
            vec![CellCoord::new(0, 2), CellCoord::new(0, 3), CellCoord::new(0, 4)],
        ));
    }
}
