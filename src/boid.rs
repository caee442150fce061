use crate::config::{DEATH_SINK_DEPTH, DISTANCE_EPSILON, MIN_VISUAL_SCALE, SENSOR_THRESHOLD, SimulationConfig};
use crate::error::{EvolutionError, Result};
use crate::genome::{Genome, PatternKind};
use crate::nutrient::NutrientField;
use crate::terrain::Terrain;
use crate::trail::TrailField;
use bevy::prelude::*;

/// Lifecycle of an agent slot. Slots are never removed, only cycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Alive,
    Dying,
    Dead,
    Newborn,
}

impl LifecycleState {
    /// Dead slots skip physics and are invisible
    pub fn is_active(&self) -> bool {
        !matches!(self, LifecycleState::Dead)
    }
}

/// One agent slot
#[derive(Debug, Clone)]
pub struct Boid {
    pub slot: usize,
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub state: LifecycleState,
    pub state_timer: f32,
    pub state_duration: f32,
    /// Copy of the slot's genome, refreshed only by `apply_genome`
    pub genome: Option<Genome>,
    pub visual_scale: f32,
    /// Neighbors within the flocking radius at the last step
    pub neighbor_count: usize,
}

impl Boid {
    pub fn new(slot: usize, position: Vec3, velocity: Vec3, genome: Option<Genome>) -> Self {
        Self {
            slot,
            position,
            velocity,
            acceleration: Vec3::ZERO,
            state: LifecycleState::Alive,
            state_timer: 0.0,
            state_duration: 0.0,
            genome,
            visual_scale: 1.0,
            neighbor_count: 0,
        }
    }

    /// Genome used for this step; the neutral default fills a missing slot
    pub fn resolved_genome(&self) -> Genome {
        self.genome.unwrap_or_default()
    }

    /// Fraction of the current death or birth animation elapsed, in [0, 1]
    pub fn state_progress(&self) -> f32 {
        if self.state_duration <= 0.0 {
            1.0
        } else {
            (self.state_timer / self.state_duration).clamp(0.0, 1.0)
        }
    }
}

/// Position, facing and scale handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentTransform {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: f32,
    pub visible: bool,
}

/// Color-relevant traits handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentTint {
    pub hue: f32,
    pub value: f32,
    pub pattern: PatternKind,
    pub show_off: f32,
}

/// Number of slots in each lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleCounts {
    pub alive: usize,
    pub dying: usize,
    pub dead: usize,
    pub newborn: usize,
}

/// Everything a step reads or writes besides the agents themselves
pub struct StepContext<'a> {
    pub config: &'a SimulationConfig,
    pub trail: &'a mut TrailField,
    pub nutrients: &'a mut NutrientField,
    pub terrain: &'a dyn Terrain,
}

/// Fixed set of agent slots
#[derive(Debug, Clone, Default)]
pub struct AgentPool {
    boids: Vec<Boid>,
}

impl AgentPool {
    pub fn new(boids: Vec<Boid>) -> Self {
        Self { boids }
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn get(&self, slot: usize) -> Result<&Boid> {
        self.boids.get(slot).ok_or(EvolutionError::SlotOutOfRange { slot, len: self.boids.len() })
    }

    pub fn get_mut(&mut self, slot: usize) -> Result<&mut Boid> {
        let len = self.boids.len();
        self.boids.get_mut(slot).ok_or(EvolutionError::SlotOutOfRange { slot, len })
    }

    fn check_slots(&self, slots: &[usize]) -> Result<()> {
        match slots.iter().find(|&&slot| slot >= self.boids.len()) {
            Some(&slot) => Err(EvolutionError::SlotOutOfRange { slot, len: self.boids.len() }),
            None => Ok(()),
        }
    }

    /// Replace the slot's genome copy. Traits are clamped into their declared ranges.
    pub fn apply_genome(&mut self, slot: usize, mut genome: Genome) -> Result<()> {
        let boid = self.get_mut(slot)?;
        if !genome.is_within_ranges() {
            warn!("apply_genome clamped out-of-range traits for slot {slot}");
            genome.clamp_to_ranges();
        }
        boid.genome = Some(genome);
        Ok(())
    }

    /// Start the death animation on Alive or Newborn slots
    pub fn mark_dying(&mut self, slots: &[usize], duration: f32) -> Result<()> {
        self.check_slots(slots)?;
        for &slot in slots {
            let boid = &mut self.boids[slot];
            match boid.state {
                LifecycleState::Alive | LifecycleState::Newborn => {
                    boid.state = LifecycleState::Dying;
                    boid.state_timer = 0.0;
                    boid.state_duration = duration.max(0.0);
                }
                LifecycleState::Dying | LifecycleState::Dead => {
                    warn!("mark_dying ignored for slot {slot} in state {:?}", boid.state);
                }
            }
        }
        Ok(())
    }

    /// Start the birth animation. This is the only way out of `Dead`.
    pub fn mark_newborn(&mut self, slots: &[usize], duration: f32) -> Result<()> {
        self.check_slots(slots)?;
        for &slot in slots {
            let boid = &mut self.boids[slot];
            if boid.state == LifecycleState::Alive {
                debug!("mark_newborn restarting birth for live slot {slot}");
            }
            boid.state = LifecycleState::Newborn;
            boid.state_timer = 0.0;
            boid.state_duration = duration.max(0.0);
            boid.visual_scale = MIN_VISUAL_SCALE;
        }
        Ok(())
    }

    pub fn counts(&self) -> LifecycleCounts {
        let mut counts = LifecycleCounts::default();
        for boid in &self.boids {
            match boid.state {
                LifecycleState::Alive => counts.alive += 1,
                LifecycleState::Dying => counts.dying += 1,
                LifecycleState::Dead => counts.dead += 1,
                LifecycleState::Newborn => counts.newborn += 1,
            }
        }
        counts
    }

    /// Mean neighbor count over non-dead agents
    pub fn density_metric(&self) -> f32 {
        let (sum, active) = self
            .boids
            .iter()
            .filter(|b| b.state.is_active())
            .fold((0usize, 0usize), |(sum, n), b| (sum + b.neighbor_count, n + 1));
        if active == 0 { 0.0 } else { sum as f32 / active as f32 }
    }

    pub fn transform(&self, slot: usize) -> Result<AgentTransform> {
        let boid = self.get(slot)?;
        let genome = boid.resolved_genome();
        let heading = Vec3::new(boid.velocity.x, 0.0, boid.velocity.z);
        let orientation = if heading.length_squared() > DISTANCE_EPSILON * DISTANCE_EPSILON {
            Quat::from_rotation_arc(Vec3::Z, heading.normalize())
        } else {
            Quat::IDENTITY
        };

        Ok(AgentTransform {
            position: boid.position,
            orientation,
            scale: boid.visual_scale * genome.body_scale,
            visible: boid.state.is_active(),
        })
    }

    pub fn tint(&self, slot: usize) -> Result<AgentTint> {
        let genome = self.get(slot)?.resolved_genome();
        Ok(AgentTint {
            hue: genome.hue,
            value: genome.value,
            pattern: genome.pattern,
            show_off: genome.show_off,
        })
    }

    /// Advance every non-dead agent by `dt`: compute all forces from the settled
    /// state, then integrate, then tick lifecycle timers.
    pub fn step(&mut self, dt: f32, ctx: StepContext<'_>) {
        let accelerations = self.compute_forces(&ctx);
        self.integrate(dt, &accelerations, ctx);
        self.tick_lifecycles(dt);
    }

    fn compute_forces(&mut self, ctx: &StepContext<'_>) -> Vec<Vec3> {
        let config = ctx.config;
        let mut accelerations = vec![Vec3::ZERO; self.boids.len()];
        let mut neighbor_counts = vec![0usize; self.boids.len()];

        for (i, boid) in self.boids.iter().enumerate() {
            if !boid.state.is_active() {
                continue;
            }
            let genome = boid.resolved_genome();
            let top_speed = config.max_speed * genome.base_speed;
            let steer = |direction: Vec3| steer_toward(direction, boid.velocity, top_speed, config.max_force);

            let mut velocity_sum = Vec3::ZERO;
            let mut position_sum = Vec3::ZERO;
            let mut repulsion = Vec3::ZERO;
            let mut neighbors = 0usize;

            for (j, other) in self.boids.iter().enumerate() {
                // Dying agents still count; only Dead ones are absent
                if i == j || !other.state.is_active() {
                    continue;
                }
                let offset = boid.position - other.position;
                let distance = offset.length();
                if distance < DISTANCE_EPSILON {
                    continue;
                }
                if distance < config.neighbor_radius {
                    velocity_sum += other.velocity;
                    position_sum += other.position;
                    neighbors += 1;
                }
                if distance < config.separation_radius {
                    repulsion += offset / (distance * distance);
                }
            }

            let mut acceleration = Vec3::ZERO;
            if neighbors > 0 {
                let count = neighbors as f32;
                acceleration += steer(velocity_sum / count) * config.align_weight;
                acceleration += steer(position_sum / count - boid.position) * config.cohesion_weight;
            }
            acceleration += steer(repulsion) * config.separation_weight;

            let attraction = ctx.nutrients.attraction_direction(boid.position);
            acceleration += steer(attraction) * config.nutrient_weight;

            if let Some(direction) = sense_trail(boid, &*ctx.trail, config) {
                acceleration += steer(direction) * config.trail_weight;
            }

            accelerations[i] = acceleration;
            neighbor_counts[i] = neighbors;
        }

        for (boid, count) in self.boids.iter_mut().zip(neighbor_counts) {
            boid.neighbor_count = count;
        }
        accelerations
    }

    fn integrate(&mut self, dt: f32, accelerations: &[Vec3], ctx: StepContext<'_>) {
        let StepContext { config, trail, nutrients, terrain } = ctx;
        let bound = config.world_half_extent;
        let inner = bound - config.boundary_margin;
        let follow = (config.ground_follow_rate * dt).min(1.0);

        for (boid, &acceleration) in self.boids.iter_mut().zip(accelerations) {
            if !boid.state.is_active() {
                continue;
            }
            let genome = boid.resolved_genome();
            let top_speed = config.max_speed * genome.base_speed;

            boid.acceleration = acceleration;
            let mut velocity = boid.velocity + acceleration * dt * config.speed_factor;

            // Steer back inside near the world edge
            if boid.position.x > inner {
                velocity.x -= config.boundary_turn * dt;
            } else if boid.position.x < -inner {
                velocity.x += config.boundary_turn * dt;
            }
            if boid.position.z > inner {
                velocity.z -= config.boundary_turn * dt;
            } else if boid.position.z < -inner {
                velocity.z += config.boundary_turn * dt;
            }

            // Follow the surface: blend toward the tangent plane, then roll downhill
            let normal = surface_normal(terrain, boid.position.x, boid.position.z);
            let tangent = velocity - normal * velocity.dot(normal);
            velocity = velocity.lerp(tangent, config.surface_blend);
            velocity += Vec3::new(normal.x, 0.0, normal.z) * config.slope_seek * dt;

            velocity = velocity.clamp_length_max(top_speed);
            let mut position = boid.position + velocity * dt;

            if position.x.abs() > bound {
                position.x = position.x.clamp(-bound, bound);
                if velocity.x * position.x > 0.0 {
                    velocity.x = -velocity.x;
                }
            }
            if position.z.abs() > bound {
                position.z = position.z.clamp(-bound, bound);
                if velocity.z * position.z > 0.0 {
                    velocity.z = -velocity.z;
                }
            }

            let sink = if boid.state == LifecycleState::Dying {
                boid.state_progress() * DEATH_SINK_DEPTH
            } else {
                0.0
            };
            let ground = terrain.height_at(position.x, position.z) + config.hover_height - sink;
            let ground = if ground.is_finite() { ground } else { config.hover_height - sink };
            position.y += (ground - position.y) * follow;
            if position.y < ground {
                position.y = ground;
                velocity.y = velocity.y.max(0.0);
            }

            boid.velocity = velocity;
            boid.position = position;

            match boid.state {
                LifecycleState::Alive | LifecycleState::Newborn => {
                    trail.deposit(position.x, position.z);
                    nutrients.consume_near(position, config.feeding_radius, config.feeding_rate * dt);
                }
                LifecycleState::Dying | LifecycleState::Dead => {}
            }
        }
    }

    fn tick_lifecycles(&mut self, dt: f32) {
        for boid in &mut self.boids {
            match boid.state {
                LifecycleState::Dying => {
                    boid.state_timer += dt;
                    boid.visual_scale = 1.0 + (MIN_VISUAL_SCALE - 1.0) * boid.state_progress();
                    if boid.state_timer >= boid.state_duration {
                        boid.state = LifecycleState::Dead;
                        boid.velocity = Vec3::ZERO;
                        boid.acceleration = Vec3::ZERO;
                        boid.neighbor_count = 0;
                        boid.visual_scale = MIN_VISUAL_SCALE;
                    }
                }
                LifecycleState::Newborn => {
                    boid.state_timer += dt;
                    boid.visual_scale = MIN_VISUAL_SCALE + (1.0 - MIN_VISUAL_SCALE) * boid.state_progress();
                    if boid.state_timer >= boid.state_duration {
                        boid.state = LifecycleState::Alive;
                        boid.visual_scale = 1.0;
                    }
                }
                LifecycleState::Alive | LifecycleState::Dead => {}
            }
        }
    }
}

/// Seek toward `direction` at `top_speed`, limited to `max_force`.
/// A degenerate direction contributes nothing.
fn steer_toward(direction: Vec3, velocity: Vec3, top_speed: f32, max_force: f32) -> Vec3 {
    if !direction.is_finite() || direction.length_squared() < DISTANCE_EPSILON * DISTANCE_EPSILON {
        return Vec3::ZERO;
    }
    let desired = direction.normalize() * top_speed;
    (desired - velocity).clamp_length_max(max_force)
}

/// Three rays, forward and +/- the sensor angle. Returns the direction of the strongest
/// nonzero reading; forward wins ties.
fn sense_trail(boid: &Boid, trail: &TrailField, config: &SimulationConfig) -> Option<Vec3> {
    let heading = Vec3::new(boid.velocity.x, 0.0, boid.velocity.z);
    if heading.length_squared() < DISTANCE_EPSILON * DISTANCE_EPSILON {
        return None;
    }
    let forward = heading.normalize();
    let rays = [
        forward,
        Quat::from_rotation_y(config.sensor_angle) * forward,
        Quat::from_rotation_y(-config.sensor_angle) * forward,
    ];

    let mut best: Option<(Vec3, f32)> = None;
    for ray in rays {
        let probe = boid.position + ray * config.sensor_distance;
        let reading = trail.sample(probe.x, probe.z);
        if reading <= SENSOR_THRESHOLD {
            continue;
        }
        if best.is_none_or(|(_, strongest)| reading > strongest) {
            best = Some((ray, reading));
        }
    }
    best.map(|(ray, _)| ray)
}

fn surface_normal(terrain: &dyn Terrain, x: f32, z: f32) -> Vec3 {
    let normal = terrain.normal_at(x, z);
    if normal.is_finite() && normal.length_squared() > DISTANCE_EPSILON {
        normal.normalize()
    } else {
        Vec3::Y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::FlatTerrain;

    struct Fixture {
        config: SimulationConfig,
        trail: TrailField,
        nutrients: NutrientField,
        terrain: FlatTerrain,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SimulationConfig::default();
            let trail = TrailField::new(
                config.trail_resolution,
                config.world_half_extent,
                config.trail_decay_rate,
                config.trail_deposit_amount,
            );
            Self { config, trail, nutrients: NutrientField::new(10), terrain: FlatTerrain::default() }
        }

        fn step(&mut self, pool: &mut AgentPool, dt: f32) {
            pool.step(
                dt,
                StepContext {
                    config: &self.config,
                    trail: &mut self.trail,
                    nutrients: &mut self.nutrients,
                    terrain: &self.terrain,
                },
            );
        }
    }

    fn pair(distance: f32) -> AgentPool {
        AgentPool::new(vec![
            Boid::new(0, Vec3::new(0.0, 0.6, 0.0), Vec3::X, None),
            Boid::new(1, Vec3::new(distance, 0.6, 0.0), Vec3::X, None),
        ])
    }

    #[test]
    fn dying_becomes_dead_exactly_at_duration() {
        let mut fixture = Fixture::new();
        let mut pool = pair(20.0);
        pool.mark_dying(&[0], 2.0).unwrap();

        for _ in 0..3 {
            fixture.step(&mut pool, 0.5);
            assert_eq!(pool.boids()[0].state, LifecycleState::Dying);
        }
        fixture.step(&mut pool, 0.5);
        assert_eq!(pool.boids()[0].state, LifecycleState::Dead);
        assert_eq!(pool.boids()[0].visual_scale, MIN_VISUAL_SCALE);
    }

    #[test]
    fn dead_agents_are_not_neighbors() {
        let mut fixture = Fixture::new();
        let mut pool = pair(3.0);
        fixture.step(&mut pool, 0.1);
        assert_eq!(pool.boids()[0].neighbor_count, 1);

        pool.mark_dying(&[1], 0.0).unwrap();
        fixture.step(&mut pool, 0.1);
        assert_eq!(pool.boids()[1].state, LifecycleState::Dead);

        let frozen = pool.boids()[1].position;
        fixture.step(&mut pool, 0.1);
        assert_eq!(pool.boids()[0].neighbor_count, 0);
        assert_eq!(pool.boids()[1].position, frozen);
    }

    #[test]
    fn dying_agents_still_count_as_neighbors() {
        let mut fixture = Fixture::new();
        let mut pool = pair(3.0);
        pool.mark_dying(&[1], 5.0).unwrap();
        fixture.step(&mut pool, 0.1);
        assert_eq!(pool.boids()[0].neighbor_count, 1);
    }

    #[test]
    fn dead_needs_explicit_rebirth() {
        let mut fixture = Fixture::new();
        let mut pool = pair(20.0);
        pool.mark_dying(&[0], 0.5).unwrap();
        for _ in 0..20 {
            fixture.step(&mut pool, 0.1);
        }
        assert_eq!(pool.boids()[0].state, LifecycleState::Dead);

        pool.apply_genome(0, Genome { hue: 200.0, ..Genome::default() }).unwrap();
        pool.mark_newborn(&[0], 1.0).unwrap();
        assert_eq!(pool.boids()[0].state, LifecycleState::Newborn);
        assert_eq!(pool.tint(0).unwrap().hue, 200.0);

        for _ in 0..12 {
            fixture.step(&mut pool, 0.1);
        }
        assert_eq!(pool.boids()[0].state, LifecycleState::Alive);
        assert_eq!(pool.boids()[0].visual_scale, 1.0);
    }

    #[test]
    fn commands_reject_bad_slots() {
        let mut pool = pair(5.0);
        assert_eq!(
            pool.mark_dying(&[0, 7], 1.0).unwrap_err(),
            EvolutionError::SlotOutOfRange { slot: 7, len: 2 }
        );
        // nothing changed when any slot was invalid
        assert_eq!(pool.boids()[0].state, LifecycleState::Alive);
        assert!(pool.apply_genome(2, Genome::default()).is_err());
        assert!(pool.mark_newborn(&[3], 1.0).is_err());
    }

    #[test]
    fn speed_stays_under_genome_limit() {
        let mut fixture = Fixture::new();
        let slow = Genome { base_speed: 0.5, ..Genome::default() };
        let mut pool = AgentPool::new(vec![Boid::new(0, Vec3::ZERO, Vec3::X * 50.0, Some(slow))]);
        fixture.step(&mut pool, 0.1);
        let speed = pool.boids()[0].velocity.length();
        assert!(speed <= fixture.config.max_speed * 0.5 + 1e-4, "speed {speed}");
    }

    #[test]
    fn agents_stay_inside_world_and_above_ground() {
        let mut fixture = Fixture::new();
        let edge = fixture.config.world_half_extent - 0.1;
        let mut pool = AgentPool::new(vec![
            Boid::new(0, Vec3::new(edge, -5.0, 0.0), Vec3::X * 6.0, None),
            Boid::new(1, Vec3::new(0.0, 0.0, -edge), Vec3::NEG_Z * 6.0, None),
        ]);
        for _ in 0..50 {
            fixture.step(&mut pool, 0.1);
            for boid in pool.boids() {
                assert!(boid.position.x.abs() <= fixture.config.world_half_extent);
                assert!(boid.position.z.abs() <= fixture.config.world_half_extent);
                assert!(boid.position.y >= fixture.config.hover_height - 1e-4);
            }
        }
    }

    #[test]
    fn trail_deposit_lands_at_new_position() {
        let mut fixture = Fixture::new();
        let mut pool = AgentPool::new(vec![Boid::new(0, Vec3::ZERO, Vec3::X * 2.0, None)]);
        fixture.step(&mut pool, 0.1);
        let position = pool.boids()[0].position;
        assert!(fixture.trail.sample(position.x, position.z) > 0.0);
    }

    #[test]
    fn trail_sensing_turns_toward_strongest_ray() {
        let fixture = Fixture::new();
        let mut trail = fixture.trail.clone();
        let boid = Boid::new(0, Vec3::ZERO, Vec3::Z, None);
        assert_eq!(sense_trail(&boid, &trail, &fixture.config), None);

        let left = Quat::from_rotation_y(fixture.config.sensor_angle) * Vec3::Z * fixture.config.sensor_distance;
        trail.deposit_with(left.x, left.z, 5.0);
        let direction = sense_trail(&boid, &trail, &fixture.config).unwrap();
        assert!(direction.x > 0.5);

        let still = Boid::new(1, Vec3::ZERO, Vec3::ZERO, None);
        assert_eq!(sense_trail(&still, &trail, &fixture.config), None);
    }

    #[test]
    fn missing_genome_falls_back_to_neutral() {
        let pool = pair(5.0);
        assert_eq!(pool.boids()[0].resolved_genome(), Genome::default());
        assert_eq!(pool.transform(0).unwrap().scale, 1.0);
    }

    #[test]
    fn density_metric_averages_active_neighbors() {
        let mut fixture = Fixture::new();
        let mut pool = AgentPool::new(vec![
            Boid::new(0, Vec3::ZERO, Vec3::X, None),
            Boid::new(1, Vec3::new(3.0, 0.0, 0.0), Vec3::X, None),
            Boid::new(2, Vec3::new(40.0, 0.0, 40.0), Vec3::X, None),
        ]);
        fixture.step(&mut pool, 0.05);
        assert!((pool.density_metric() - 2.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn apply_genome_clamps_out_of_range_traits() {
        let mut fixture = Fixture::new();
        let mut pool = pair(20.0);
        pool.apply_genome(0, Genome { base_speed: 10.0, hue: 400.0, ..Genome::default() }).unwrap();
        let genome = pool.boids()[0].resolved_genome();
        assert!(genome.is_within_ranges());
        assert_eq!(genome.base_speed, 1.8);

        for _ in 0..100 {
            fixture.step(&mut pool, 0.05);
        }
        let limit = fixture.config.max_speed * 1.8;
        assert!(pool.boids()[0].velocity.length() <= limit + 1e-3);
    }

    #[test]
    fn dying_agents_leave_no_trail() {
        let mut fixture = Fixture::new();
        let mut pool = AgentPool::new(vec![Boid::new(0, Vec3::ZERO, Vec3::X * 2.0, None)]);
        pool.mark_dying(&[0], 5.0).unwrap();
        fixture.step(&mut pool, 0.1);
        assert_eq!(fixture.trail.total(), 0.0);
    }

    #[test]
    fn agent_order_does_not_change_the_step() {
        let boids = [
            Boid::new(0, Vec3::new(0.0, 0.6, 0.0), Vec3::new(1.0, 0.0, 0.5), None),
            Boid::new(1, Vec3::new(2.0, 0.6, 1.0), Vec3::new(-0.5, 0.0, 1.0), Some(Genome { base_speed: 1.4, ..Genome::default() })),
            Boid::new(2, Vec3::new(-1.5, 0.6, 2.5), Vec3::new(0.3, 0.0, -1.0), None),
        ];
        let mut forward_fixture = Fixture::new();
        let mut reverse_fixture = Fixture::new();
        forward_fixture.trail.deposit_with(3.0, 3.0, 1.0);
        reverse_fixture.trail.deposit_with(3.0, 3.0, 1.0);

        let mut forward = AgentPool::new(boids.to_vec());
        let mut reverse = AgentPool::new(boids.iter().rev().cloned().collect());
        forward_fixture.step(&mut forward, 0.1);
        reverse_fixture.step(&mut reverse, 0.1);

        for boid in forward.boids() {
            let twin = reverse.boids().iter().find(|b| b.slot == boid.slot).unwrap();
            assert!((boid.position - twin.position).length() < 1e-6);
            assert!((boid.velocity - twin.velocity).length() < 1e-6);
            assert_eq!(boid.neighbor_count, twin.neighbor_count);
        }
    }
}
