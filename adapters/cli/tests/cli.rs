use std::process::Command;

fn gem_battle() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gem-battle"));
    let _ = command.current_dir(env!("CARGO_MANIFEST_DIR"));
    command
}

#[test]
fn check_accepts_bundled_encounter() {
    let output = gem_battle()
        .args(["check", "--config", "assets/encounter.toml"])
        .output()
        .expect("failed to run gem-battle check");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("slot 3: Genbu"));
    assert!(stdout.contains("configuration ok"));
}

#[test]
fn check_rejects_missing_file() {
    let output = gem_battle()
        .args(["check", "--config", "assets/missing.toml"])
        .output()
        .expect("failed to run gem-battle check");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("assets/missing.toml"));
}

#[test]
fn json_play_emits_parseable_events() {
    let output = gem_battle()
        .args(["play", "--seed", "3", "--max-turns", "4", "--json"])
        .output()
        .expect("failed to run gem-battle play");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let events: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("every line is a JSON event"))
        .collect();
    assert!(events.iter().any(|event| event.get("TurnAdvanced").is_some()));
}

#[test]
fn play_is_reproducible_for_a_seed() {
    let run = || {
        gem_battle()
            .args(["play", "--seed", "11", "--max-turns", "6", "--json"])
            .output()
            .expect("failed to run gem-battle play")
            .stdout
    };

    assert_eq!(run(), run());
}
