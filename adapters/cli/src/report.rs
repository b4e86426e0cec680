//! Renders the outbound event stream as text or JSON lines.

use std::io::Write;

use anyhow::Result;
use gem_battle_core::{Event, SwapError};
use gem_battle_world::{query, World};

/// Rendering style of the event stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Writes events to `out` in the selected format.
#[derive(Debug)]
pub(crate) struct EventPrinter<W> {
    format: OutputFormat,
    out: W,
}

impl<W: Write> EventPrinter<W> {
    /// Creates a printer.
    pub(crate) fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    /// Prints the opening board and first enemy.
    pub(crate) fn intro(&mut self, world: &World) -> Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        if let Some(enemy) = query::current_enemy(world) {
            writeln!(
                self.out,
                "{} ({}) appears with {} hp",
                enemy.name,
                enemy.stats.element,
                enemy.stats.hp.current()
            )?;
        }
        writeln!(self.out, "{}", query::grid(world))?;
        Ok(())
    }

    /// Prints every event in order.
    pub(crate) fn print_all(&mut self, events: &[Event]) -> Result<()> {
        for event in events {
            self.print(event)?;
        }
        Ok(())
    }

    fn print(&mut self, event: &Event) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, event)?;
                writeln!(self.out)?;
            }
            OutputFormat::Text => {
                if let Some(line) = describe(event) {
                    writeln!(self.out, "{line}")?;
                }
            }
        }
        Ok(())
    }

    /// Prints hit points and the board after a turn.
    pub(crate) fn status(&mut self, world: &World) -> Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        let party = query::party(world);
        write!(
            self.out,
            "turn {}: party {}/{}",
            query::turn(world),
            party.hp.current(),
            party.hp.max()
        )?;
        if let Some(enemy) = query::current_enemy(world) {
            write!(
                self.out,
                ", {} {}/{}",
                enemy.name,
                enemy.stats.hp.current(),
                enemy.stats.hp.max()
            )?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "{}", query::grid(world))?;
        Ok(())
    }

    /// Prints the final result.
    pub(crate) fn summary(&mut self, world: &World) -> Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        match query::outcome(world) {
            Some(outcome) => writeln!(
                self.out,
                "encounter finished after {} turns: {outcome:?}",
                query::turn(world)
            )?,
            None => writeln!(
                self.out,
                "stopped after {} turns without a result",
                query::turn(world)
            )?,
        }
        self.out.flush()?;
        Ok(())
    }
}

fn describe(event: &Event) -> Option<String> {
    let line = match event {
        Event::TimeAdvanced { .. }
        | Event::PhaseChanged { .. }
        | Event::GemsSwapped { .. }
        | Event::GemsFell { .. }
        | Event::GridConfigured { .. } => return None,
        Event::SwapRejected { from, to, reason } => {
            let reason = match reason {
                SwapError::InvalidPhase => "not accepting input",
                SwapError::OutOfBounds => "off the board",
                SwapError::SameCell => "same cell",
                SwapError::NotAdjacent => "not adjacent",
            };
            format!("swap {from:?} -> {to:?} rejected: {reason}")
        }
        Event::ClusterMatched {
            cluster,
            combo,
            wave,
            ..
        } => format!(
            "wave {wave}: {} x{} (combo {combo})",
            cluster.kind(),
            cluster.count()
        ),
        Event::CascadeSettled { waves, combo } => {
            format!("cascade settled after {waves} waves, combo {combo}")
        }
        Event::DamageDealt {
            attacker,
            defender,
            amount,
            affinity,
            ..
        } => format!("{attacker} hits {defender} enemy for {amount} (affinity x{affinity})"),
        Event::PartyHealed { amount, .. } => format!("party healed for {amount}"),
        Event::EnemyAttacked {
            element,
            amount,
            mitigation,
        } => {
            if *mitigation > 0.0 {
                format!("{element} enemy strikes for {amount} (mitigated {mitigation})")
            } else {
                format!("{element} enemy strikes for {amount}")
            }
        }
        Event::SkillCastEnqueued {
            slot, description, ..
        } => format!("slot {slot} queues {description}"),
        Event::SkillCastBegun { slot, skill, .. } => format!("slot {slot} begins {skill}"),
        Event::SkillCastResolved { slot, skill, .. } => format!("slot {slot} casts {skill}"),
        Event::SkillInvocationFailed { slot, error } => format!("slot {slot} cannot cast: {error}"),
        Event::GemsGenerated { gems } => format!("{} gems transformed", gems.len()),
        Event::DirectDamageDealt { slot, amount } => {
            format!("slot {slot} deals {amount} direct damage")
        }
        Event::BuffExpired {
            element,
            multiplier,
        } => format!("{element} x{multiplier} buff expired"),
        Event::TurnAdvanced { turn } => format!("-- turn {turn} complete --"),
        Event::EnemyDefeated { name, .. } => format!("{name} defeated"),
        Event::EnemyAppeared { name, element, .. } => format!("{name} ({element}) appears"),
        Event::EncounterFinished { outcome } => format!("encounter over: {outcome:?}"),
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gem_battle_core::{EncounterOutcome, GemKind};

    #[test]
    fn json_lines_are_one_object_per_event() {
        let mut buffer = Vec::new();
        let mut printer = EventPrinter::new(OutputFormat::Json, &mut buffer);
        printer
            .print_all(&[
                Event::TurnAdvanced { turn: 3 },
                Event::EncounterFinished {
                    outcome: EncounterOutcome::Victory,
                },
            ])
            .expect("write to buffer");

        let text = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["TurnAdvanced"]["turn"], 3);
        assert_eq!(lines[1]["EncounterFinished"]["outcome"], "Victory");
    }

    #[test]
    fn text_skips_animation_only_events() {
        assert!(describe(&Event::TimeAdvanced {
            dt: std::time::Duration::from_millis(16)
        })
        .is_none());
        assert_eq!(
            describe(&Event::BuffExpired {
                element: GemKind::Wind,
                multiplier: 2.0
            })
            .as_deref(),
            Some("Wind x2 buff expired")
        );
    }
}
