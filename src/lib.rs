//! Flocking creatures whose looks and gait evolve under a genetic algorithm.
//!
//! The core (`genome`, `population`, `simulation`, `generation`) has no rendering
//! dependencies beyond bevy's math and ECS resources, so it runs headless.

pub mod boid;
pub mod camera;
pub mod config;
pub mod error;
pub mod generation;
pub mod genome;
pub mod nutrient;
pub mod population;
pub mod render;
pub mod simulation;
pub mod terrain;
pub mod trail;

pub use boid::{AgentTint, AgentTransform, Boid, LifecycleCounts, LifecycleState};
pub use config::{CycleConfig, GaConfig, SimulationConfig};
pub use error::{EvolutionError, Result};
pub use generation::{CyclePhase, GenerationCycle};
pub use genome::{Genome, PatternKind};
pub use population::{Evaluation, GenerationStats, Population};
pub use simulation::Simulation;
pub use terrain::{FlatTerrain, RollingTerrain, Terrain};
