use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};
use flock_genesis::camera::{CameraState, camera_pan, camera_zoom, setup_camera};
use flock_genesis::config::*;
use flock_genesis::generation::{GenerationCycle, run_generation_cycle};
use flock_genesis::genome::PatternKind;
use flock_genesis::population::Population;
use flock_genesis::render::{spawn_sprites, sync_boid_colors, sync_boid_sprites, sync_nutrient_markers};
use flock_genesis::simulation::{NutrientSpawnTimer, Simulation, replenish_nutrients, step_simulation};
use flock_genesis::terrain::{RollingTerrain, Terrain};
use std::sync::Arc;

/// Resource to control simulation state
#[derive(Resource, PartialEq, Eq, Clone, Copy, Default)]
pub enum SimulationState {
    #[default]
    Running,
    Paused,
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Flock Genesis".to_string(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin)
        .init_resource::<CameraState>()
        .init_resource::<SimulationState>()
        .insert_resource(GenerationCycle::new(CycleConfig::default()))
        .insert_resource(NutrientSpawnTimer(Timer::from_seconds(NUTRIENT_SPAWN_INTERVAL, TimerMode::Repeating)))
        .add_systems(PreStartup, setup_world)
        .add_systems(Startup, (setup_camera, spawn_sprites.run_if(resource_exists::<Simulation>)))
        .add_systems(Update, (
            // Always run (even when paused)
            camera_zoom,
            camera_pan,
            sync_boid_sprites,
            sync_boid_colors,
            sync_nutrient_markers,
            ui_system,
        ).run_if(resource_exists::<Simulation>))
        .add_systems(Update, (
            // Only run when simulation is running
            replenish_nutrients,
            step_simulation,
            run_generation_cycle,
        )
            .chain()
            .before(sync_boid_sprites)
            .run_if(resource_exists::<Simulation>)
            .run_if(|state: Res<SimulationState>| *state == SimulationState::Running))
        .run();
}

/// Build the population and the simulation seeded from it. On a bad config the
/// app exits instead of running without a world.
fn setup_world(mut commands: Commands, mut exit: EventWriter<AppExit>) {
    let mut population = match Population::new(GaConfig::default()) {
        Ok(population) => population,
        Err(err) => {
            error!("Invalid GA configuration: {err}");
            exit.send(AppExit::error());
            return;
        }
    };
    let genomes = population.init_population().to_vec();

    let terrain: Arc<dyn Terrain> = Arc::new(RollingTerrain::default());
    match Simulation::new(SimulationConfig::default(), Some(terrain), Some(&genomes)) {
        Ok(simulation) => {
            commands.insert_resource(population);
            commands.insert_resource(simulation);
        }
        Err(err) => {
            error!("Invalid simulation configuration: {err}");
            exit.send(AppExit::error());
        }
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    camera_state: Res<CameraState>,
    mut simulation_state: ResMut<SimulationState>,
    mut cycle: ResMut<GenerationCycle>,
    population: Res<Population>,
    simulation: Res<Simulation>,
) {
    egui::Window::new("Flock Info")
        .default_pos(egui::pos2(10.0, 10.0))
        .show(contexts.ctx_mut(), |ui| {
            ui.horizontal(|ui| {
                let running = *simulation_state == SimulationState::Running;
                if ui.button(if running { "⏸ Pause" } else { "▶ Resume" }).clicked() {
                    *simulation_state = if running { SimulationState::Paused } else { SimulationState::Running };
                }
                ui.label(format!("State: {}", if running { "Running" } else { "Paused" }));
            });

            if ui.button("⏭ Next Generation").clicked() {
                cycle.trigger();
            }

            ui.separator();
            ui.heading("Evolution");
            ui.separator();

            ui.label(format!("Generation: {}", population.generation()));
            ui.label(format!("Cycle: {}", cycle.phase.label()));
            match population.latest_stats() {
                Some(stats) => {
                    ui.label(format!("Best fitness: {:.3}", stats.best_fitness));
                    ui.label(format!("Mean fitness: {:.3}", stats.mean_fitness));
                    let ratio = stats.mean_fitness.clamp(0.0, 1.0);
                    ui.add(egui::ProgressBar::new(ratio).text(format!("{:.0}%", ratio * 100.0)));
                    ui.label("Patterns:");
                    for (pattern, count) in PatternKind::ALL.iter().zip(stats.pattern_counts) {
                        ui.label(format!("  {pattern}: {count}"));
                    }
                }
                None => {
                    ui.colored_label(egui::Color32::GRAY, "  (not evaluated yet)");
                }
            }

            ui.separator();
            ui.heading("Flock");
            ui.separator();

            let counts = simulation.lifecycle_counts();
            ui.label(format!("Alive: {}", counts.alive));
            ui.label(format!("Dying: {}", counts.dying));
            ui.label(format!("Dead: {}", counts.dead));
            ui.label(format!("Newborn: {}", counts.newborn));
            ui.label(format!("Density: {:.2}", simulation.density_metric()));
            ui.label(format!(
                "Nutrients: {} / {}",
                simulation.nutrients().active_count(),
                simulation.nutrients().capacity()
            ));
            let trail = simulation.trail();
            ui.label(format!(
                "Trail peak: {:.2} ({}x{} cells)",
                trail.max_value(),
                trail.resolution(),
                trail.resolution()
            ));
            ui.label(format!("Elapsed: {:.1}s", simulation.elapsed()));

            ui.separator();
            ui.label(format!("Zoom: {:.2}x", camera_state.zoom));
            ui.label("Controls:");
            ui.label("• Mouse Wheel - Zoom in/out");
            ui.label("• Middle Mouse - Pan camera");
        });
}
