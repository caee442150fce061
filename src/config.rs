//! Configuration constants and config structs for the flock simulator
use crate::error::{EvolutionError, Result};

// ============================================================================
// GA SETTINGS
// ============================================================================

/// Number of agent slots (and genomes) in the population
pub const POPULATION_SIZE: usize = 40;

/// Fraction of the population that survives each generation
pub const SURVIVAL_RATE: f32 = 0.4;

/// Base mutation rate, scaled per trait group
pub const MUTATION_RATE: f32 = 0.15;

/// Probability that crossover blends parents instead of cloning one
pub const CROSSOVER_RATE: f32 = 1.0;

/// Number of contestants sampled per tournament
pub const TOURNAMENT_SIZE: usize = 3;

/// Number of distinct pattern ids
pub const PATTERN_COUNT: u8 = 5;

/// Number of past generation summaries kept on the population
pub const STATS_HISTORY_LEN: usize = 64;

// ============================================================================
// FLOCKING
// ============================================================================

/// Base top speed in world units per second (scaled by genome base speed)
pub const MAX_SPEED: f32 = 6.0;

/// Maximum steering force per contribution
pub const MAX_FORCE: f32 = 4.0;

/// Radius for alignment and cohesion neighbors
pub const NEIGHBOR_RADIUS: f32 = 8.0;

/// Radius for separation
pub const SEPARATION_RADIUS: f32 = 2.5;

pub const ALIGN_WEIGHT: f32 = 0.8;
pub const COHESION_WEIGHT: f32 = 0.55;
pub const SEPARATION_WEIGHT: f32 = 1.2;

/// Multiplier applied to acceleration during integration
pub const SPEED_FACTOR: f32 = 1.0;

/// Distances below this contribute nothing to force math
pub const DISTANCE_EPSILON: f32 = 1e-3;

// ============================================================================
// TRAIL FIELD
// ============================================================================

/// Cells per side of the trail grid
pub const TRAIL_RESOLUTION: usize = 128;

/// Per-step multiplicative decay
pub const TRAIL_DECAY_RATE: f32 = 0.97;

/// Amount deposited per agent per step
pub const TRAIL_DEPOSIT_AMOUNT: f32 = 0.1;

/// Side-ray angle for trail sensing (radians)
pub const SENSOR_ANGLE: f32 = std::f32::consts::FRAC_PI_4;

/// Distance ahead at which trail sensors sample
pub const SENSOR_DISTANCE: f32 = 3.0;

/// Readings at or below this are treated as empty
pub const SENSOR_THRESHOLD: f32 = 1e-4;

pub const TRAIL_WEIGHT: f32 = 0.5;

// ============================================================================
// NUTRIENTS
// ============================================================================

/// Fixed number of nutrient source slots
pub const NUTRIENT_CAPACITY: usize = 10;

pub const NUTRIENT_WEIGHT: f32 = 0.6;

/// Agents within this horizontal distance of a source feed on it
pub const FEEDING_RADIUS: f32 = 1.5;

/// Strength drained per second by one feeding agent
pub const FEEDING_RATE: f32 = 0.02;

/// Seconds between nutrient replenishment attempts
pub const NUTRIENT_SPAWN_INTERVAL: f32 = 4.0;

// ============================================================================
// WORLD & TERRAIN
// ============================================================================

/// Half-extent of the square world: positions live in [-R, R] on x and z
pub const WORLD_HALF_EXTENT: f32 = 60.0;

/// Distance from the bound where inward steering starts
pub const BOUNDARY_MARGIN: f32 = 8.0;

/// Inward steering strength inside the margin
pub const BOUNDARY_TURN: f32 = 6.0;

/// Height agents hover above the ground
pub const HOVER_HEIGHT: f32 = 0.6;

/// Rate at which height converges to the hover height (per second)
pub const GROUND_FOLLOW_RATE: f32 = 4.0;

/// Blend toward the tangent-plane velocity per step
pub const SURFACE_BLEND: f32 = 0.2;

/// Strength of the downhill pull from the terrain normal
pub const SLOPE_SEEK: f32 = 1.5;

// ============================================================================
// LIFECYCLE & CYCLE TIMING
// ============================================================================

/// Visual scale at the end of death and the start of birth
pub const MIN_VISUAL_SCALE: f32 = 0.2;

/// Depth a dying agent sinks by the end of its animation
pub const DEATH_SINK_DEPTH: f32 = 1.0;

/// Seconds between generation turnovers
pub const GENERATION_INTERVAL: f32 = 20.0;

pub const DEATH_DURATION: f32 = 2.0;

/// Window in which only survivors are on screen
pub const INTERLUDE_DURATION: f32 = 1.0;

pub const NEWBORN_DURATION: f32 = 2.0;

// ============================================================================
// VIEWER
// ============================================================================

/// Screen pixels per world unit
pub const PIXELS_PER_UNIT: f32 = 6.0;

/// Body radius of an agent at scale 1.0 (pixels)
pub const BOID_RADIUS: f32 = 5.0;

/// Marker radius of a full-strength nutrient source (pixels)
pub const NUTRIENT_RADIUS: f32 = 7.0;

/// Orthographic scale at startup
pub const DEFAULT_ZOOM: f32 = 1.0;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 10.0;

/// Genetic algorithm parameters
#[derive(Debug, Clone)]
pub struct GaConfig {
    pub population_size: usize,
    pub survival_rate: f32,
    pub mutation_rate: f32,
    pub crossover_rate: f32,
    pub tournament_size: usize,
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: POPULATION_SIZE,
            survival_rate: SURVIVAL_RATE,
            mutation_rate: MUTATION_RATE,
            crossover_rate: CROSSOVER_RATE,
            tournament_size: TOURNAMENT_SIZE,
            seed: None,
        }
    }
}

impl GaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(EvolutionError::InvalidConfig("population_size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.survival_rate) {
            return Err(EvolutionError::InvalidConfig(format!(
                "survival_rate {} outside [0, 1]",
                self.survival_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvolutionError::InvalidConfig(format!(
                "mutation_rate {} outside [0, 1]",
                self.mutation_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(EvolutionError::InvalidConfig(format!(
                "crossover_rate {} outside [0, 1]",
                self.crossover_rate
            )));
        }
        if self.tournament_size == 0 {
            return Err(EvolutionError::InvalidConfig("tournament_size must be positive".into()));
        }
        Ok(())
    }

    /// `max(1, floor(N * survival_rate))`, never more than N
    pub fn survivor_count(&self) -> usize {
        let raw = (self.population_size as f32 * self.survival_rate).floor() as usize;
        raw.max(1).min(self.population_size)
    }
}

/// Per-step physics and field parameters
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub agent_count: usize,
    pub world_half_extent: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub neighbor_radius: f32,
    pub separation_radius: f32,
    pub align_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    pub nutrient_weight: f32,
    pub trail_weight: f32,
    pub speed_factor: f32,
    pub trail_resolution: usize,
    pub trail_decay_rate: f32,
    pub trail_deposit_amount: f32,
    pub sensor_angle: f32,
    pub sensor_distance: f32,
    pub nutrient_capacity: usize,
    pub feeding_radius: f32,
    pub feeding_rate: f32,
    pub boundary_margin: f32,
    pub boundary_turn: f32,
    pub hover_height: f32,
    pub ground_follow_rate: f32,
    pub surface_blend: f32,
    pub slope_seek: f32,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            agent_count: POPULATION_SIZE,
            world_half_extent: WORLD_HALF_EXTENT,
            max_speed: MAX_SPEED,
            max_force: MAX_FORCE,
            neighbor_radius: NEIGHBOR_RADIUS,
            separation_radius: SEPARATION_RADIUS,
            align_weight: ALIGN_WEIGHT,
            cohesion_weight: COHESION_WEIGHT,
            separation_weight: SEPARATION_WEIGHT,
            nutrient_weight: NUTRIENT_WEIGHT,
            trail_weight: TRAIL_WEIGHT,
            speed_factor: SPEED_FACTOR,
            trail_resolution: TRAIL_RESOLUTION,
            trail_decay_rate: TRAIL_DECAY_RATE,
            trail_deposit_amount: TRAIL_DEPOSIT_AMOUNT,
            sensor_angle: SENSOR_ANGLE,
            sensor_distance: SENSOR_DISTANCE,
            nutrient_capacity: NUTRIENT_CAPACITY,
            feeding_radius: FEEDING_RADIUS,
            feeding_rate: FEEDING_RATE,
            boundary_margin: BOUNDARY_MARGIN,
            boundary_turn: BOUNDARY_TURN,
            hover_height: HOVER_HEIGHT,
            ground_follow_rate: GROUND_FOLLOW_RATE,
            surface_blend: SURFACE_BLEND,
            slope_seek: SLOPE_SEEK,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.agent_count == 0 {
            return Err(EvolutionError::InvalidConfig("agent_count must be positive".into()));
        }
        if self.world_half_extent <= 0.0 {
            return Err(EvolutionError::InvalidConfig("world_half_extent must be positive".into()));
        }
        if self.trail_resolution == 0 {
            return Err(EvolutionError::InvalidConfig("trail_resolution must be positive".into()));
        }
        if !(self.trail_decay_rate > 0.0 && self.trail_decay_rate < 1.0) {
            return Err(EvolutionError::InvalidConfig(format!(
                "trail_decay_rate {} outside (0, 1)",
                self.trail_decay_rate
            )));
        }
        if self.separation_radius > self.neighbor_radius {
            return Err(EvolutionError::InvalidConfig(
                "separation_radius must not exceed neighbor_radius".into(),
            ));
        }
        if self.boundary_margin >= self.world_half_extent {
            return Err(EvolutionError::InvalidConfig(
                "boundary_margin must be smaller than world_half_extent".into(),
            ));
        }
        Ok(())
    }
}

/// Timing of the generation turnover sequence
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub generation_interval: f32,
    pub death_duration: f32,
    pub interlude_duration: f32,
    pub newborn_duration: f32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            generation_interval: GENERATION_INTERVAL,
            death_duration: DEATH_DURATION,
            interlude_duration: INTERLUDE_DURATION,
            newborn_duration: NEWBORN_DURATION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survivor_count_floors_and_keeps_one() {
        let config = GaConfig::default();
        assert_eq!(config.survivor_count(), 16);

        let tiny = GaConfig { population_size: 2, survival_rate: 0.1, ..GaConfig::default() };
        assert_eq!(tiny.survivor_count(), 1);
    }

    #[test]
    fn rejects_bad_rates() {
        let config = GaConfig { survival_rate: 1.5, ..GaConfig::default() };
        assert!(matches!(config.validate(), Err(EvolutionError::InvalidConfig(_))));

        let sim = SimulationConfig { trail_decay_rate: 1.0, ..SimulationConfig::default() };
        assert!(sim.validate().is_err());
    }
}
