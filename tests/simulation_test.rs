use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use flock_genesis::config::{CycleConfig, GaConfig, SimulationConfig};
use flock_genesis::generation::{CyclePhase, GenerationCycle, run_generation_cycle};
use flock_genesis::genome::Genome;
use flock_genesis::population::Population;
use flock_genesis::simulation::{NutrientSpawnTimer, Simulation, replenish_nutrients, step_simulation};
use flock_genesis::terrain::{RollingTerrain, Terrain};
use std::sync::Arc;
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(50);

/// Build a headless app running the simulation, nutrient and generation systems
fn headless_app(seed: u64, cycle: CycleConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));

    let mut population = Population::new(GaConfig { seed: Some(seed), ..GaConfig::default() }).unwrap();
    let genomes = population.init_population().to_vec();
    let terrain: Arc<dyn Terrain> = Arc::new(RollingTerrain::default());
    let simulation = Simulation::new(
        SimulationConfig { seed: Some(seed), ..SimulationConfig::default() },
        Some(terrain),
        Some(&genomes),
    )
    .unwrap();

    app.insert_resource(population);
    app.insert_resource(simulation);
    app.insert_resource(GenerationCycle::new(cycle));
    app.insert_resource(NutrientSpawnTimer(Timer::from_seconds(0.5, TimerMode::Repeating)));
    app.add_systems(Update, (replenish_nutrients, step_simulation, run_generation_cycle).chain());
    app
}

fn fast_cycle() -> CycleConfig {
    CycleConfig {
        generation_interval: 1.0,
        death_duration: 0.5,
        interlude_duration: 0.25,
        newborn_duration: 0.5,
    }
}

/// The app can start and run for multiple frames
#[test]
fn test_simulation_startup_and_execution() {
    let mut app = headless_app(1, CycleConfig::default());

    for _ in 0..20 {
        app.update();
    }

    let simulation = app.world().resource::<Simulation>();
    assert!(simulation.steps() > 0, "simulation should have stepped");
    assert_eq!(simulation.agents().len(), 40);
    for boid in simulation.agents().boids() {
        assert!(boid.position.is_finite());
    }
}

/// Nutrient sources appear over time and stay within capacity
#[test]
fn test_nutrients_replenish() {
    let mut app = headless_app(2, CycleConfig::default());

    for _ in 0..60 {
        app.update();
    }

    let nutrients = app.world().resource::<Simulation>().nutrients();
    assert!(nutrients.active_count() > 0);
    assert!(nutrients.active_count() <= nutrients.capacity());
}

/// Several generations turn over while slot count and split stay fixed
#[test]
fn test_generations_turn_over() {
    let mut app = headless_app(3, fast_cycle());
    let mut saw_split = false;

    // Each turnover takes about 2.25s of frame time
    for _ in 0..200 {
        app.update();

        let world = app.world();
        let cycle = world.resource::<GenerationCycle>();
        let population = world.resource::<Population>();
        let simulation = world.resource::<Simulation>();

        assert_eq!(simulation.agents().len(), 40);
        assert_eq!(population.size(), 40);
        if let CyclePhase::Dying { doomed, .. } = &cycle.phase {
            assert_eq!(doomed.len(), 24);
            let survivors = population.evaluation().map(|e| e.survivors.len());
            assert_eq!(survivors, Some(16));
            saw_split = true;
        }
    }

    let population = app.world().resource::<Population>();
    assert!(saw_split);
    assert!(population.generation() >= 3, "generation was {}", population.generation());
    assert!(population.genomes().unwrap().iter().all(Genome::is_within_ranges));
}

/// Systems gated on a paused flag leave the world untouched
#[test]
fn test_paused_world_does_not_move() {
    #[derive(Resource)]
    struct Paused(bool);

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app.insert_resource(Paused(true));
    let simulation = Simulation::new(SimulationConfig { seed: Some(4), ..SimulationConfig::default() }, None, None).unwrap();
    app.insert_resource(simulation);
    app.add_systems(Update, step_simulation.run_if(|paused: Res<Paused>| !paused.0));

    let positions = |app: &App| -> Vec<Vec3> {
        app.world().resource::<Simulation>().agents().boids().iter().map(|b| b.position).collect()
    };

    let before = positions(&app);
    for _ in 0..5 {
        app.update();
    }
    assert_eq!(before, positions(&app));
    assert_eq!(app.world().resource::<Simulation>().steps(), 0);

    app.world_mut().resource_mut::<Paused>().0 = false;
    for _ in 0..5 {
        app.update();
    }
    assert!(app.world().resource::<Simulation>().steps() > 0);
    assert_ne!(before, positions(&app));
}

/// A genome sitting in every reward band scores a perfect 1.0
#[test]
fn test_ideal_genome_scores_one() {
    let genome = Genome::new(190.0, 0.65, 0, 1.0, 1.0, 0.5, 0).unwrap();
    assert!((genome.fitness() - 1.0).abs() < 1e-6);
}
