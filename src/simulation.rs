use crate::boid::{AgentPool, AgentTint, AgentTransform, Boid, LifecycleCounts, LifecycleState, StepContext};
use crate::config::SimulationConfig;
use crate::error::{EvolutionError, Result};
use crate::genome::{Genome, PatternDistribution};
use crate::nutrient::NutrientField;
use crate::terrain::{FlatTerrain, Terrain};
use crate::trail::TrailField;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Owned simulation state: agents, fields and the terrain they move over
#[derive(Resource)]
pub struct Simulation {
    config: SimulationConfig,
    agents: AgentPool,
    trail: TrailField,
    nutrients: NutrientField,
    terrain: Option<Arc<dyn Terrain>>,
    rng: StdRng,
    elapsed: f32,
    steps: u64,
}

impl Simulation {
    /// Build a simulation. `initial_genomes`, when given, must hold one genome per agent
    /// slot; without it every slot gets a random genome.
    pub fn new(
        config: SimulationConfig,
        terrain: Option<Arc<dyn Terrain>>,
        initial_genomes: Option<&[Genome]>,
    ) -> Result<Self> {
        config.validate()?;
        if let Some(genomes) = initial_genomes {
            if genomes.len() != config.agent_count {
                return Err(EvolutionError::PopulationSizeMismatch {
                    expected: config.agent_count,
                    actual: genomes.len(),
                });
            }
        }
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let spawn = config.world_half_extent * 0.5;
        let patterns = PatternDistribution::RoundRobin;
        let boids = (0..config.agent_count)
            .map(|slot| {
                let genome = match initial_genomes {
                    Some(genomes) => genomes.get(slot).copied(),
                    None => Some(Genome::random(&mut rng, patterns.pattern_for_slot(slot), 0)),
                };
                let x = rng.gen_range(-spawn..spawn);
                let z = rng.gen_range(-spawn..spawn);
                let y = terrain.as_deref().map_or(0.0, |t| t.height_at(x, z)) + config.hover_height;
                let velocity = random_heading(&mut rng) * config.max_speed * 0.5;
                Boid::new(slot, Vec3::new(x, y, z), velocity, genome)
            })
            .collect();

        let trail = TrailField::new(
            config.trail_resolution,
            config.world_half_extent,
            config.trail_decay_rate,
            config.trail_deposit_amount,
        );
        let nutrients = NutrientField::new(config.nutrient_capacity);

        info!("Simulation created with {} agents", config.agent_count);
        Ok(Self {
            config,
            agents: AgentPool::new(boids),
            trail,
            nutrients,
            terrain,
            rng,
            elapsed: 0.0,
            steps: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn agents(&self) -> &AgentPool {
        &self.agents
    }

    pub fn trail(&self) -> &TrailField {
        &self.trail
    }

    pub fn nutrients(&self) -> &NutrientField {
        &self.nutrients
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance one frame. Trail decay runs once, after every agent has deposited.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let flat = FlatTerrain::default();
        let terrain: &dyn Terrain = match self.terrain.as_deref() {
            Some(terrain) => terrain,
            None => &flat,
        };

        self.agents.step(
            dt,
            StepContext {
                config: &self.config,
                trail: &mut self.trail,
                nutrients: &mut self.nutrients,
                terrain,
            },
        );
        self.trail.decay_all();
        self.elapsed += dt;
        self.steps += 1;
    }

    pub fn apply_genome(&mut self, slot: usize, genome: Genome) -> Result<()> {
        self.agents.apply_genome(slot, genome)
    }

    pub fn mark_dying(&mut self, slots: &[usize], duration: f32) -> Result<()> {
        self.agents.mark_dying(slots, duration)
    }

    /// Rebirth slots in place. Slots coming back from `Dead` get a fresh heading.
    pub fn mark_newborn(&mut self, slots: &[usize], duration: f32) -> Result<()> {
        let reborn: Vec<usize> = slots
            .iter()
            .copied()
            .filter(|&slot| self.agents.get(slot).is_ok_and(|b| b.state == LifecycleState::Dead))
            .collect();
        self.agents.mark_newborn(slots, duration)?;

        let speed = self.config.max_speed * 0.5;
        for slot in reborn {
            let velocity = random_heading(&mut self.rng) * speed;
            self.agents.get_mut(slot)?.velocity = velocity;
        }
        Ok(())
    }

    pub fn transform(&self, slot: usize) -> Result<AgentTransform> {
        self.agents.transform(slot)
    }

    pub fn tint(&self, slot: usize) -> Result<AgentTint> {
        self.agents.tint(slot)
    }

    pub fn density_metric(&self) -> f32 {
        self.agents.density_metric()
    }

    pub fn lifecycle_counts(&self) -> LifecycleCounts {
        self.agents.counts()
    }

    /// Drop a nutrient source at a random spot if a slot is free
    pub fn spawn_random_nutrient(&mut self) -> Option<usize> {
        let extent = self.config.world_half_extent - self.config.boundary_margin;
        let x = self.rng.gen_range(-extent..extent);
        let z = self.rng.gen_range(-extent..extent);
        let strength = self.rng.gen_range(0.5..=1.0);
        let y = self.terrain.as_deref().map_or(0.0, |t| t.height_at(x, z));
        self.nutrients.add_source(Vec3::new(x, y, z), strength)
    }
}

fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

/// Timer resource for nutrient replenishment
#[derive(Resource)]
pub struct NutrientSpawnTimer(pub Timer);

/// System to advance the simulation by the frame delta
pub fn step_simulation(time: Res<Time>, mut simulation: ResMut<Simulation>) {
    simulation.step(time.delta_secs());
}

/// System to top up nutrient sources at regular intervals
pub fn replenish_nutrients(
    time: Res<Time>,
    mut timer: ResMut<NutrientSpawnTimer>,
    mut simulation: ResMut<Simulation>,
) {
    if timer.0.tick(time.delta()).just_finished() {
        if let Some(slot) = simulation.spawn_random_nutrient() {
            debug!("Nutrient source spawned in slot {slot}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::RollingTerrain;

    fn seeded(seed: u64) -> Simulation {
        let config = SimulationConfig { seed: Some(seed), ..SimulationConfig::default() };
        Simulation::new(config, None, None).unwrap()
    }

    #[test]
    fn every_slot_gets_a_genome_by_default() {
        let simulation = seeded(1);
        assert_eq!(simulation.agents().len(), 40);
        assert!(simulation.agents().boids().iter().all(|b| b.genome.is_some()));
    }

    #[test]
    fn initial_genomes_must_cover_every_slot() {
        let genomes = vec![Genome { hue: 171.0, ..Genome::default() }; 3];
        let err = Simulation::new(SimulationConfig::default(), None, Some(&genomes)).err();
        assert_eq!(err, Some(EvolutionError::PopulationSizeMismatch { expected: 40, actual: 3 }));

        let genomes = vec![Genome { hue: 171.0, ..Genome::default() }; 40];
        let simulation = Simulation::new(SimulationConfig::default(), None, Some(&genomes)).unwrap();
        assert!(simulation.agents().boids().iter().all(|b| b.genome.map(|g| g.hue) == Some(171.0)));
    }

    #[test]
    fn decay_runs_once_per_step() {
        let mut simulation = seeded(2);
        simulation.trail.deposit_with(-59.0, -59.0, 1.0);
        simulation.step(0.016);
        simulation.step(0.016);
        let expected = 0.97f32.powi(2);
        assert!((simulation.trail().sample(-59.0, -59.0) - expected).abs() < 1e-5);
    }

    #[test]
    fn zero_or_negative_dt_is_ignored() {
        let mut simulation = seeded(3);
        let before: Vec<Vec3> = simulation.agents().boids().iter().map(|b| b.position).collect();
        simulation.step(0.0);
        simulation.step(-1.0);
        simulation.step(f32::NAN);
        let after: Vec<Vec3> = simulation.agents().boids().iter().map(|b| b.position).collect();
        assert_eq!(before, after);
        assert_eq!(simulation.steps(), 0);
    }

    #[test]
    fn runs_long_on_rolling_terrain_without_nan() {
        let config = SimulationConfig { seed: Some(4), ..SimulationConfig::default() };
        let terrain: Arc<dyn Terrain> = Arc::new(RollingTerrain::default());
        let mut simulation = Simulation::new(config, Some(terrain.clone()), None).unwrap();
        for _ in 0..4 {
            simulation.spawn_random_nutrient();
        }
        for _ in 0..600 {
            simulation.step(1.0 / 60.0);
        }
        let bound = simulation.config().world_half_extent;
        for boid in simulation.agents().boids() {
            assert!(boid.position.is_finite() && boid.velocity.is_finite());
            assert!(boid.position.x.abs() <= bound && boid.position.z.abs() <= bound);
            let ground = terrain.height_at(boid.position.x, boid.position.z);
            assert!(boid.position.y >= ground + simulation.config().hover_height - 1e-3);
        }
        assert!(simulation.density_metric() >= 0.0);
    }

    #[test]
    fn rebirth_gives_dead_slots_a_heading() {
        let mut simulation = seeded(5);
        simulation.mark_dying(&[0], 0.0).unwrap();
        simulation.step(0.016);
        assert_eq!(simulation.agents().boids()[0].velocity, Vec3::ZERO);

        simulation.mark_newborn(&[0], 1.0).unwrap();
        let boid = &simulation.agents().boids()[0];
        assert_eq!(boid.state, LifecycleState::Newborn);
        assert!(boid.velocity.length() > 0.0);
    }
}
