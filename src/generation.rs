use crate::config::CycleConfig;
use crate::error::{EvolutionError, Result};
use crate::population::Population;
use crate::simulation::Simulation;
use bevy::prelude::*;

/// Where the turnover sequence currently is
#[derive(Debug, Clone, PartialEq)]
pub enum CyclePhase {
    /// Normal flocking; counts up to the next turnover
    Idle { elapsed: f32 },
    /// Doomed slots play their death animation
    Dying { elapsed: f32, doomed: Vec<usize> },
    /// Only survivors remain on screen
    Interlude { elapsed: f32, doomed: Vec<usize> },
    /// Replacement genomes play their birth animation
    Newborn { elapsed: f32 },
}

impl CyclePhase {
    pub fn label(&self) -> &'static str {
        match self {
            CyclePhase::Idle { .. } => "idle",
            CyclePhase::Dying { .. } => "dying",
            CyclePhase::Interlude { .. } => "interlude",
            CyclePhase::Newborn { .. } => "newborn",
        }
    }
}

/// Sequences death, survivors-only window and rebirth around each GA turnover
#[derive(Resource, Debug, Clone)]
pub struct GenerationCycle {
    pub config: CycleConfig,
    pub phase: CyclePhase,
}

impl GenerationCycle {
    pub fn new(config: CycleConfig) -> Self {
        Self { config, phase: CyclePhase::Idle { elapsed: 0.0 } }
    }

    /// Start a turnover right away, if idle
    pub fn trigger(&mut self) {
        if let CyclePhase::Idle { elapsed } = &mut self.phase {
            *elapsed = self.config.generation_interval;
        }
    }

    /// Advance the sequence by `dt`. Returns true when the phase changed.
    pub fn advance(
        &mut self,
        dt: f32,
        population: &mut Population,
        simulation: &mut Simulation,
    ) -> Result<bool> {
        let next = match &mut self.phase {
            CyclePhase::Idle { elapsed } => {
                *elapsed += dt;
                if *elapsed < self.config.generation_interval {
                    return Ok(false);
                }
                // Slot indices link genomes to agents, so both sides must agree
                if population.size() != simulation.agents().len() {
                    *elapsed = 0.0;
                    return Err(EvolutionError::PopulationSizeMismatch {
                        expected: simulation.agents().len(),
                        actual: population.size(),
                    });
                }
                let doomed = population.evaluate_population()?.doomed.clone();
                simulation.mark_dying(&doomed, self.config.death_duration)?;
                CyclePhase::Dying { elapsed: 0.0, doomed }
            }
            CyclePhase::Dying { elapsed, doomed } => {
                *elapsed += dt;
                if *elapsed < self.config.death_duration {
                    return Ok(false);
                }
                CyclePhase::Interlude { elapsed: 0.0, doomed: std::mem::take(doomed) }
            }
            CyclePhase::Interlude { elapsed, doomed } => {
                *elapsed += dt;
                if *elapsed < self.config.interlude_duration {
                    return Ok(false);
                }
                let genomes = population.next_generation()?;
                for &slot in doomed.iter() {
                    simulation.apply_genome(slot, genomes[slot])?;
                }
                simulation.mark_newborn(doomed, self.config.newborn_duration)?;
                CyclePhase::Newborn { elapsed: 0.0 }
            }
            CyclePhase::Newborn { elapsed } => {
                *elapsed += dt;
                if *elapsed < self.config.newborn_duration {
                    return Ok(false);
                }
                CyclePhase::Idle { elapsed: 0.0 }
            }
        };

        debug!("Generation cycle: {} -> {}", self.phase.label(), next.label());
        self.phase = next;
        Ok(true)
    }
}

/// System to drive generation turnover from frame time
pub fn run_generation_cycle(
    time: Res<Time>,
    mut cycle: ResMut<GenerationCycle>,
    mut population: ResMut<Population>,
    mut simulation: ResMut<Simulation>,
) {
    if let Err(err) = cycle.advance(time.delta_secs(), &mut population, &mut simulation) {
        error!("Generation cycle failed: {err}");
    }
}
