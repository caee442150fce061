use crate::config::{GaConfig, PATTERN_COUNT, STATS_HISTORY_LEN};
use crate::error::{EvolutionError, Result};
use crate::genome::{Genome, PatternDistribution};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Result of ranking the population by fitness
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Fitness per slot
    pub fitness: Vec<f32>,
    /// Slots ordered by fitness, best first; ties keep slot order
    pub sorted_indices: Vec<usize>,
    pub survivors: Vec<usize>,
    pub doomed: Vec<usize>,
}

/// Summary of one evaluated generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    pub generation: u32,
    pub best_fitness: f32,
    pub mean_fitness: f32,
    pub min_fitness: f32,
    /// Slot count per pattern id
    pub pattern_counts: [usize; PATTERN_COUNT as usize],
}

/// Fixed-size ordered set of genomes, one per agent slot
#[derive(Resource)]
pub struct Population {
    config: GaConfig,
    patterns: PatternDistribution,
    genomes: Vec<Genome>,
    initialized: bool,
    generation: u32,
    evaluation: Option<Evaluation>,
    history: VecDeque<GenerationStats>,
    rng: StdRng,
}

impl Population {
    pub fn new(config: GaConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            config,
            patterns: PatternDistribution::default(),
            genomes: Vec::new(),
            initialized: false,
            generation: 0,
            evaluation: None,
            history: VecDeque::with_capacity(STATS_HISTORY_LEN),
            rng,
        })
    }

    pub fn with_pattern_distribution(mut self, patterns: PatternDistribution) -> Self {
        self.patterns = patterns;
        self
    }

    /// Seed every slot with a random genome from the exploration ranges
    pub fn init_population(&mut self) -> &[Genome] {
        let genomes: Vec<Genome> = (0..self.config.population_size)
            .map(|slot| self.create_random_genome(slot))
            .collect();
        self.reset_with(genomes);
        info!("Seeded population of {} genomes", self.genomes.len());
        &self.genomes
    }

    /// Seed from caller-supplied genomes, one per slot
    pub fn init_with(&mut self, genomes: Vec<Genome>) -> Result<&[Genome]> {
        if genomes.len() != self.config.population_size {
            return Err(EvolutionError::PopulationSizeMismatch {
                expected: self.config.population_size,
                actual: genomes.len(),
            });
        }
        let genomes = genomes
            .into_iter()
            .map(|mut genome| {
                genome.clamp_to_ranges();
                genome
            })
            .collect();
        self.reset_with(genomes);
        Ok(&self.genomes)
    }

    fn reset_with(&mut self, genomes: Vec<Genome>) {
        self.genomes = genomes;
        self.initialized = true;
        self.generation = 0;
        self.evaluation = None;
        self.history.clear();
    }

    pub fn create_random_genome(&mut self, slot: usize) -> Genome {
        let pattern = self.patterns.pattern_for_slot(slot);
        Genome::random(&mut self.rng, pattern, self.generation)
    }

    pub fn genomes(&self) -> Result<&[Genome]> {
        self.ensure_initialized()?;
        Ok(&self.genomes)
    }

    pub fn genome(&self, slot: usize) -> Result<&Genome> {
        self.ensure_initialized()?;
        self.genomes.get(slot).ok_or(EvolutionError::SlotOutOfRange {
            slot,
            len: self.genomes.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.config.population_size
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Cached evaluation, present between evaluate and the next generation
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn history(&self) -> impl Iterator<Item = &GenerationStats> {
        self.history.iter()
    }

    pub fn latest_stats(&self) -> Option<&GenerationStats> {
        self.history.back()
    }

    /// Score every slot and split into survivors and doomed
    pub fn evaluate_population(&mut self) -> Result<&Evaluation> {
        self.ensure_initialized()?;

        let fitness: Vec<f32> = self.genomes.iter().map(Genome::fitness).collect();
        let mut sorted_indices: Vec<usize> = (0..fitness.len()).collect();
        // sort_by is stable, so equal scores stay in slot order
        sorted_indices.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));

        let survivor_count = self.config.survivor_count();
        let survivors = sorted_indices[..survivor_count].to_vec();
        let doomed = sorted_indices[survivor_count..].to_vec();

        self.record_stats(&fitness);
        debug!(
            "Evaluated generation {}: {} survivors, {} doomed",
            self.generation,
            survivors.len(),
            doomed.len()
        );

        Ok(self.evaluation.insert(Evaluation { fitness, sorted_indices, survivors, doomed }))
    }

    /// Tournament selection over the whole population, doomed slots included
    pub fn select_parent_index(&mut self) -> Result<usize> {
        let evaluation = self.evaluation.as_ref().ok_or(EvolutionError::NotEvaluated)?;
        let fitness = &evaluation.fitness;

        let mut best = self.rng.gen_range(0..fitness.len());
        for _ in 1..self.config.tournament_size {
            let contender = self.rng.gen_range(0..fitness.len());
            // strict comparison: the first one seen keeps a tie
            if fitness[contender] > fitness[best] {
                best = contender;
            }
        }
        Ok(best)
    }

    pub fn crossover(&mut self, parent_a: &Genome, parent_b: &Genome) -> Genome {
        Genome::crossover(
            parent_a,
            parent_b,
            &mut self.rng,
            self.config.crossover_rate,
            self.generation + 1,
        )
    }

    pub fn mutate(&mut self, genome: &Genome) -> Genome {
        genome.mutate(&mut self.rng, self.config.mutation_rate)
    }

    /// Replace every doomed slot with a bred child. Survivors keep their slot untouched.
    pub fn next_generation(&mut self) -> Result<&[Genome]> {
        self.ensure_initialized()?;
        if self.evaluation.is_none() {
            debug!("next_generation called without evaluation, evaluating first");
            self.evaluate_population()?;
        }
        let doomed = match self.evaluation.as_ref() {
            Some(evaluation) => evaluation.doomed.clone(),
            None => return Err(EvolutionError::NotEvaluated),
        };

        let mut children = Vec::with_capacity(doomed.len());
        for _ in &doomed {
            let a = self.select_parent_index()?;
            let b = self.select_parent_index()?;
            let (parent_a, parent_b) = (self.genomes[a], self.genomes[b]);
            let child = self.crossover(&parent_a, &parent_b);
            let mut child = self.mutate(&child);
            child.gen_id = self.generation + 1;
            children.push(child);
        }

        // Parents are drawn from the old generation only, so write back afterwards
        for (slot, child) in doomed.iter().zip(children) {
            self.genomes[*slot] = child;
        }

        self.generation += 1;
        self.evaluation = None;
        info!("Advanced to generation {} ({} slots replaced)", self.generation, doomed.len());

        Ok(&self.genomes)
    }

    fn record_stats(&mut self, fitness: &[f32]) {
        let mut pattern_counts = [0; PATTERN_COUNT as usize];
        for genome in &self.genomes {
            pattern_counts[genome.pattern.id() as usize] += 1;
        }
        let best_fitness = fitness.iter().copied().fold(f32::MIN, f32::max);
        let min_fitness = fitness.iter().copied().fold(f32::MAX, f32::min);
        let mean_fitness = fitness.iter().sum::<f32>() / fitness.len().max(1) as f32;

        // Re-evaluating the same generation replaces its entry
        if self.history.back().is_some_and(|stats| stats.generation == self.generation) {
            self.history.pop_back();
        }
        if self.history.len() == STATS_HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(GenerationStats {
            generation: self.generation,
            best_fitness,
            mean_fitness,
            min_fitness,
            pattern_counts,
        });
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized { Ok(()) } else { Err(EvolutionError::PopulationNotInitialized) }
    }
}
