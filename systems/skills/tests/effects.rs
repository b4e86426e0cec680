use gem_battle_core::{BuffState, GemKind, Grid, MitigationState, SkillEffect, UnitStats};
use gem_battle_system_skills::{apply_effect, EffectOutcome, EffectTarget};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

struct Battle {
    grid: Grid,
    enemy: UnitStats,
    buffs: BuffState,
    mitigation: MitigationState,
    rng: ChaCha8Rng,
}

impl Battle {
    fn new() -> Self {
        Self {
            grid: "$$~#@& ~#@$~& @$~#&$ #~&@$~ &@$~#@".parse().expect("valid"),
            enemy: UnitStats::new(GemKind::Water, 10, 1, 100),
            buffs: BuffState::new(),
            mitigation: MitigationState::default(),
            rng: ChaCha8Rng::seed_from_u64(0x5_1111),
        }
    }

    fn cast(&mut self, effect: SkillEffect) -> EffectOutcome {
        apply_effect(
            &effect,
            EffectTarget {
                grid: &mut self.grid,
                enemy: &mut self.enemy,
                buffs: &mut self.buffs,
                mitigation: &mut self.mitigation,
            },
            &mut self.rng,
        )
    }
}

#[test]
fn buff_appends_entry() {
    let mut battle = Battle::new();
    let effect = SkillEffect::Buff {
        element: GemKind::Wind,
        multiplier: 2.0,
        duration: 3,
    };

    let _ = battle.cast(effect.clone());
    let _ = battle.cast(effect);

    assert_eq!(battle.buffs.entries(GemKind::Wind).len(), 2);
    assert!(
        (battle.buffs.multiplier(GemKind::Wind) - 4.0).abs() < f64::EPSILON
    );
}

#[test]
fn generated_gems_only_replace_disallowed_cells() {
    let mut battle = Battle::new();
    let before = battle.grid.clone();
    let fire_before = before
        .cells()
        .filter(|(_, kind)| *kind == Some(GemKind::Fire))
        .count();

    let outcome = battle.cast(SkillEffect::GenerateGems {
        allowed: vec![GemKind::Fire],
        count: 6,
    });

    let EffectOutcome::GemsGenerated(gems) = outcome else {
        panic!("unexpected outcome: {outcome:?}");
    };
    assert_eq!(gems.len(), 6);
    for gem in &gems {
        assert_ne!(gem.replaced, GemKind::Fire);
        assert_eq!(before.gem(gem.cell), Some(gem.replaced));
        assert_eq!(battle.grid.gem(gem.cell), Some(GemKind::Fire));
    }
    let fire_after = battle
        .grid
        .cells()
        .filter(|(_, kind)| *kind == Some(GemKind::Fire))
        .count();
    assert_eq!(fire_after, fire_before + 6);
}

#[test]
fn generation_is_capped_by_candidates() {
    let mut battle = Battle::new();
    battle.grid = "$$$$$~ $$$$$$ $$$$$$ $$$$$$ $$$$$$".parse().expect("valid");

    let outcome = battle.cast(SkillEffect::GenerateGems {
        allowed: vec![GemKind::Fire],
        count: 6,
    });

    assert!(matches!(outcome, EffectOutcome::GemsGenerated(gems) if gems.len() == 1));
}

#[test]
fn direct_attack_ignores_defense_and_clamps() {
    let mut battle = Battle::new();

    let first = battle.cast(SkillEffect::DirectAttack { fraction: 0.3 });
    assert_eq!(first, EffectOutcome::DirectDamage { amount: 30 });
    assert_eq!(battle.enemy.hp.current(), 70);

    let _ = battle.cast(SkillEffect::DirectAttack { fraction: 0.3 });
    let _ = battle.cast(SkillEffect::DirectAttack { fraction: 0.3 });
    let last = battle.cast(SkillEffect::DirectAttack { fraction: 0.3 });
    assert_eq!(last, EffectOutcome::DirectDamage { amount: 10 });
    assert!(battle.enemy.hp.is_depleted());
}

#[test]
fn mitigation_overwrites_previous_value() {
    let mut battle = Battle::new();

    let _ = battle.cast(SkillEffect::Mitigation { fraction: 0.9 });
    let outcome = battle.cast(SkillEffect::Mitigation { fraction: 0.4 });

    assert_eq!(outcome, EffectOutcome::Mitigated { fraction: 0.4 });
    assert!((battle.mitigation.fraction() - 0.4).abs() < f64::EPSILON);
}
