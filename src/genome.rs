use crate::config::PATTERN_COUNT;
use crate::error::{EvolutionError, Result};
use rand::Rng;
use std::fmt;

/// Closed interval a trait must stay inside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitRange {
    pub min: f32,
    pub max: f32,
}

impl TraitRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn width(&self) -> f32 {
        self.max - self.min
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        rng.gen_range(self.min..=self.max)
    }
}

// Declared trait ranges. Hue is half-open at 360, so its ceiling sits just below.
pub const HUE_RANGE: TraitRange = TraitRange::new(0.0, 359.99);
pub const VALUE_RANGE: TraitRange = TraitRange::new(0.0, 1.0);
pub const BODY_SCALE_RANGE: TraitRange = TraitRange::new(0.5, 2.0);
pub const BASE_SPEED_RANGE: TraitRange = TraitRange::new(0.5, 1.8);
pub const SHOW_OFF_RANGE: TraitRange = TraitRange::new(0.0, 1.2);

// Exploration ranges used for fresh random genomes, wider than the rewarded bands
pub const EXPLORE_HUE: TraitRange = TraitRange::new(150.0, 230.0);
pub const EXPLORE_VALUE: TraitRange = TraitRange::new(0.3, 0.95);
pub const EXPLORE_BODY_SCALE: TraitRange = TraitRange::new(0.6, 1.6);
pub const EXPLORE_BASE_SPEED: TraitRange = TraitRange::new(0.6, 1.6);
pub const EXPLORE_SHOW_OFF: TraitRange = TraitRange::new(0.0, 1.0);

// Rewarded bands, two per sub-score
pub const REWARD_HUE: TraitRange = TraitRange::new(170.0, 210.0);
pub const REWARD_VALUE: TraitRange = TraitRange::new(0.55, 0.8);
pub const REWARD_SPOT_COUNT: TraitRange = TraitRange::new(20.0, 36.0);
pub const REWARD_SPOT_SIZE: TraitRange = TraitRange::new(3.0, 7.0);
pub const REWARD_BODY_SCALE: TraitRange = TraitRange::new(0.8, 1.3);
/// body_scale * base_speed
pub const REWARD_MOMENTUM: TraitRange = TraitRange::new(0.7, 1.5);
pub const REWARD_BASE_SPEED: TraitRange = TraitRange::new(0.8, 1.3);
pub const REWARD_SHOW_OFF: TraitRange = TraitRange::new(0.3, 0.7);

pub const PALETTE_WEIGHT: f32 = 0.20;
pub const PATTERN_WEIGHT: f32 = 0.35;
pub const SIZE_WEIGHT: f32 = 0.20;
pub const MOVEMENT_WEIGHT: f32 = 0.25;

/// Body pattern family, indexed by pattern id 0..=4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Spotted,
    Striped,
    Blob,
    Speckled,
    Dappled,
}

/// Fixed visual descriptor of a pattern family
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternDescriptor {
    pub spot_count: u32,
    pub spot_size: f32,
}

/// Grouping used by the synergy bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynergyCategory {
    FastStripe,
    Blob,
    Ornate,
    Plain,
}

impl PatternKind {
    pub const ALL: [PatternKind; PATTERN_COUNT as usize] = [
        PatternKind::Spotted,
        PatternKind::Striped,
        PatternKind::Blob,
        PatternKind::Speckled,
        PatternKind::Dappled,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn id(&self) -> u8 {
        match self {
            PatternKind::Spotted => 0,
            PatternKind::Striped => 1,
            PatternKind::Blob => 2,
            PatternKind::Speckled => 3,
            PatternKind::Dappled => 4,
        }
    }

    pub fn descriptor(&self) -> PatternDescriptor {
        match self {
            PatternKind::Spotted => PatternDescriptor { spot_count: 28, spot_size: 5.0 },
            PatternKind::Striped => PatternDescriptor { spot_count: 12, spot_size: 4.0 },
            PatternKind::Blob => PatternDescriptor { spot_count: 6, spot_size: 12.0 },
            PatternKind::Speckled => PatternDescriptor { spot_count: 64, spot_size: 2.0 },
            PatternKind::Dappled => PatternDescriptor { spot_count: 24, spot_size: 9.0 },
        }
    }

    pub fn category(&self) -> SynergyCategory {
        match self {
            PatternKind::Striped => SynergyCategory::FastStripe,
            PatternKind::Blob => SynergyCategory::Blob,
            PatternKind::Spotted | PatternKind::Dappled => SynergyCategory::Ornate,
            PatternKind::Speckled => SynergyCategory::Plain,
        }
    }

    /// Uniformly random id different from this one
    pub fn random_other<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut id = rng.gen_range(0..PATTERN_COUNT - 1);
        if id >= self.id() {
            id += 1;
        }
        Self::ALL[id as usize]
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Spotted => write!(f, "spotted"),
            PatternKind::Striped => write!(f, "striped"),
            PatternKind::Blob => write!(f, "blob"),
            PatternKind::Speckled => write!(f, "speckled"),
            PatternKind::Dappled => write!(f, "dappled"),
        }
    }
}

/// How pattern ids are handed out to slots when a population is seeded
#[derive(Debug, Clone, Default)]
pub enum PatternDistribution {
    /// slot % 5, so every family is represented
    #[default]
    RoundRobin,
    /// Explicit per-slot pattern, cycled if shorter than the population
    PerSlot(Vec<PatternKind>),
}

impl PatternDistribution {
    pub fn pattern_for_slot(&self, slot: usize) -> PatternKind {
        match self {
            PatternDistribution::RoundRobin => PatternKind::ALL[slot % PatternKind::ALL.len()],
            PatternDistribution::PerSlot(patterns) if !patterns.is_empty() => {
                patterns[slot % patterns.len()]
            }
            PatternDistribution::PerSlot(_) => PatternKind::ALL[slot % PatternKind::ALL.len()],
        }
    }
}

/// Heritable traits of one agent slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Genome {
    pub hue: f32,
    pub value: f32,
    pub pattern: PatternKind,
    pub body_scale: f32,
    pub base_speed: f32,
    pub show_off: f32,
    /// Generation this genome was born in
    pub gen_id: u32,
}

impl Default for Genome {
    /// Neutral genome used when a slot has no genome assigned
    fn default() -> Self {
        Self {
            hue: 190.0,
            value: 0.6,
            pattern: PatternKind::Spotted,
            body_scale: 1.0,
            base_speed: 1.0,
            show_off: 0.5,
            gen_id: 0,
        }
    }
}

impl Genome {
    /// Build a genome, rejecting any trait outside its declared range
    pub fn new(
        hue: f32,
        value: f32,
        pattern_id: u8,
        body_scale: f32,
        base_speed: f32,
        show_off: f32,
        gen_id: u32,
    ) -> Result<Self> {
        check_trait("hue", hue, HUE_RANGE)?;
        check_trait("value", value, VALUE_RANGE)?;
        check_trait("body_scale", body_scale, BODY_SCALE_RANGE)?;
        check_trait("base_speed", base_speed, BASE_SPEED_RANGE)?;
        check_trait("show_off", show_off, SHOW_OFF_RANGE)?;
        let pattern = PatternKind::from_id(pattern_id).ok_or(EvolutionError::TraitOutOfRange {
            name: "pattern_id",
            value: pattern_id as f32,
            min: 0.0,
            max: (PATTERN_COUNT - 1) as f32,
        })?;

        Ok(Self { hue, value, pattern, body_scale, base_speed, show_off, gen_id })
    }

    /// Fresh genome drawn from the exploration ranges
    pub fn random<R: Rng + ?Sized>(rng: &mut R, pattern: PatternKind, gen_id: u32) -> Self {
        let mut genome = Self {
            hue: EXPLORE_HUE.sample(rng),
            value: EXPLORE_VALUE.sample(rng),
            pattern,
            body_scale: EXPLORE_BODY_SCALE.sample(rng),
            base_speed: EXPLORE_BASE_SPEED.sample(rng),
            show_off: EXPLORE_SHOW_OFF.sample(rng),
            gen_id,
        };
        genome.clamp_to_ranges();
        genome
    }

    /// The single place traits are forced back into their declared ranges
    pub fn clamp_to_ranges(&mut self) {
        self.hue = if self.hue.is_finite() { HUE_RANGE.clamp(self.hue) } else { HUE_RANGE.min };
        self.value = VALUE_RANGE.clamp(finite_or(self.value, VALUE_RANGE.min));
        self.body_scale = BODY_SCALE_RANGE.clamp(finite_or(self.body_scale, 1.0));
        self.base_speed = BASE_SPEED_RANGE.clamp(finite_or(self.base_speed, 1.0));
        self.show_off = SHOW_OFF_RANGE.clamp(finite_or(self.show_off, SHOW_OFF_RANGE.min));
    }

    pub fn is_within_ranges(&self) -> bool {
        HUE_RANGE.contains(self.hue)
            && VALUE_RANGE.contains(self.value)
            && BODY_SCALE_RANGE.contains(self.body_scale)
            && BASE_SPEED_RANGE.contains(self.base_speed)
            && SHOW_OFF_RANGE.contains(self.show_off)
    }

    /// Create a mutated copy of this genome.
    /// Each trait passes an independent gate; palette traits and the pattern mutate less
    /// often than the behavior traits.
    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, rate: f32) -> Self {
        let mut child = *self;
        let palette_p = (rate * 0.5).clamp(0.0, 1.0) as f64;
        let pattern_p = (rate * 0.3).clamp(0.0, 1.0) as f64;
        let body_p = rate.clamp(0.0, 1.0) as f64;
        let behavior_p = (rate * 1.5).clamp(0.0, 1.0) as f64;

        if rng.gen_bool(palette_p) {
            child.hue += perturbation(rng, rate, HUE_RANGE);
        }
        if rng.gen_bool(palette_p) {
            child.value += perturbation(rng, rate, VALUE_RANGE);
        }
        if rng.gen_bool(pattern_p) {
            child.pattern = child.pattern.random_other(rng);
        }
        if rng.gen_bool(body_p) {
            child.body_scale += perturbation(rng, rate, BODY_SCALE_RANGE);
        }
        if rng.gen_bool(behavior_p) {
            child.base_speed += perturbation(rng, rate, BASE_SPEED_RANGE);
        }
        if rng.gen_bool(behavior_p) {
            child.show_off += perturbation(rng, rate, SHOW_OFF_RANGE);
        }

        child.clamp_to_ranges();
        child
    }

    /// Blend two parents. With probability `1 - crossover_rate` the child is an exact
    /// clone of one parent instead, `gen_id` included.
    pub fn crossover<R: Rng + ?Sized>(
        a: &Genome,
        b: &Genome,
        rng: &mut R,
        crossover_rate: f32,
        gen_id: u32,
    ) -> Self {
        if !rng.gen_bool(crossover_rate.clamp(0.0, 1.0) as f64) {
            return if rng.gen_bool(0.5) { *a } else { *b };
        }

        let mut child = Genome {
            hue: blend(rng, a.hue, b.hue, 10.0),
            value: blend(rng, a.value, b.value, 0.05),
            pattern: if rng.gen_bool(0.5) { a.pattern } else { b.pattern },
            body_scale: blend(rng, a.body_scale, b.body_scale, 0.1),
            base_speed: blend(rng, a.base_speed, b.base_speed, 0.1),
            show_off: blend(rng, a.show_off, b.show_off, 0.1),
            gen_id,
        };
        child.clamp_to_ranges();
        child
    }

    pub fn fitness(&self) -> f32 {
        self.fitness_breakdown().total()
    }

    pub fn fitness_breakdown(&self) -> FitnessBreakdown {
        let descriptor = self.pattern.descriptor();

        FitnessBreakdown {
            palette: banded(REWARD_HUE.contains(self.hue), REWARD_VALUE.contains(self.value)),
            pattern: banded(
                REWARD_SPOT_COUNT.contains(descriptor.spot_count as f32),
                REWARD_SPOT_SIZE.contains(descriptor.spot_size),
            ),
            size: banded(
                REWARD_BODY_SCALE.contains(self.body_scale),
                REWARD_MOMENTUM.contains(self.body_scale * self.base_speed),
            ),
            movement: banded(
                REWARD_BASE_SPEED.contains(self.base_speed),
                REWARD_SHOW_OFF.contains(self.show_off),
            ),
            synergy: self.synergy_bonus(),
        }
    }

    fn synergy_bonus(&self) -> f32 {
        let mut bonus = 0.0;
        match self.pattern.category() {
            SynergyCategory::FastStripe => {
                if self.base_speed >= 1.2 {
                    bonus += 0.08;
                }
                if self.show_off >= 0.6 {
                    bonus += 0.04;
                }
            }
            SynergyCategory::Blob => {
                if self.base_speed <= 0.9 {
                    bonus += 0.06;
                }
                if self.show_off <= 0.4 {
                    bonus += 0.06;
                }
            }
            SynergyCategory::Ornate => {
                if (0.4..=0.8).contains(&self.show_off) {
                    bonus += 0.05;
                }
            }
            SynergyCategory::Plain => {}
        }
        bonus
    }
}

/// Sub-scores of one fitness evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessBreakdown {
    pub palette: f32,
    pub pattern: f32,
    pub size: f32,
    pub movement: f32,
    pub synergy: f32,
}

impl FitnessBreakdown {
    /// Weighted base score in [0, 1], before the synergy bonus
    pub fn base(&self) -> f32 {
        let weighted = self.palette * PALETTE_WEIGHT
            + self.pattern * PATTERN_WEIGHT
            + self.size * SIZE_WEIGHT
            + self.movement * MOVEMENT_WEIGHT;
        weighted / (PALETTE_WEIGHT + PATTERN_WEIGHT + SIZE_WEIGHT + MOVEMENT_WEIGHT)
    }

    pub fn total(&self) -> f32 {
        (self.base() + self.synergy).clamp(0.0, 1.0)
    }
}

/// 0 / 0.5 / 1 step: half credit per satisfied band
fn banded(first: bool, second: bool) -> f32 {
    match (first, second) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    }
}

fn perturbation<R: Rng + ?Sized>(rng: &mut R, rate: f32, range: TraitRange) -> f32 {
    rate * range.width() * rng.gen_range(-1.0f32..=1.0)
}

fn blend<R: Rng + ?Sized>(rng: &mut R, a: f32, b: f32, noise: f32) -> f32 {
    (a + b) * 0.5 + rng.gen_range(-noise..=noise)
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn check_trait(name: &'static str, value: f32, range: TraitRange) -> Result<()> {
    if range.contains(value) {
        Ok(())
    } else {
        Err(EvolutionError::TraitOutOfRange { name, value, min: range.min, max: range.max })
    }
}
