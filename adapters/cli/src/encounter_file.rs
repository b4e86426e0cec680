//! Loading encounter descriptions from TOML files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use gem_battle_world::config::EncounterConfig;

/// Reads the encounter at `path`, or the built-in encounter when `None`.
pub(crate) fn load(path: Option<&Path>) -> Result<EncounterConfig> {
    let Some(path) = path else {
        return Ok(EncounterConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read encounter file {}", path.display()))?;
    parse(&text).with_context(|| format!("failed to parse encounter file {}", path.display()))
}

fn parse(text: &str) -> Result<EncounterConfig> {
    Ok(toml::from_str(text)?)
}
