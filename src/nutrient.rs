use crate::config::DISTANCE_EPSILON;
use bevy::prelude::*;

/// Point attractor agents steer toward and feed on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutrientSource {
    pub position: Vec3,
    pub strength: f32,
    pub active: bool,
}

impl Default for NutrientSource {
    fn default() -> Self {
        Self { position: Vec3::ZERO, strength: 0.0, active: false }
    }
}

/// Fixed-capacity set of nutrient sources
#[derive(Debug, Clone)]
pub struct NutrientField {
    sources: Vec<NutrientSource>,
}

impl NutrientField {
    pub fn new(capacity: usize) -> Self {
        Self { sources: vec![NutrientSource::default(); capacity] }
    }

    pub fn capacity(&self) -> usize {
        self.sources.len()
    }

    pub fn sources(&self) -> &[NutrientSource] {
        &self.sources
    }

    pub fn active_count(&self) -> usize {
        self.sources.iter().filter(|s| s.active).count()
    }

    /// Activate the first free slot. Returns `None` when every slot is in use.
    pub fn add_source(&mut self, position: Vec3, strength: f32) -> Option<usize> {
        let slot = self.sources.iter().position(|s| !s.active)?;
        self.sources[slot] = NutrientSource {
            position,
            strength: strength.clamp(0.0, 1.0),
            active: true,
        };
        Some(slot)
    }

    pub fn deactivate(&mut self, slot: usize) {
        if let Some(source) = self.sources.get_mut(slot) {
            source.active = false;
        }
    }

    /// Unit direction toward the strength/distance-weighted sources, on the x-z plane.
    /// Zero when no source has influence here.
    pub fn attraction_direction(&self, point: Vec3) -> Vec3 {
        let mut sum = Vec3::ZERO;
        for source in self.sources.iter().filter(|s| s.active && s.strength > 0.0) {
            let offset = Vec3::new(source.position.x - point.x, 0.0, source.position.z - point.z);
            let distance = offset.length();
            if distance < DISTANCE_EPSILON {
                continue;
            }
            sum += (offset / distance) * (source.strength / distance);
        }
        sum.normalize_or_zero()
    }

    /// Drain `amount` from every active source within `radius` of `point`.
    /// Sources that run dry are deactivated. Returns how much was consumed.
    pub fn consume_near(&mut self, point: Vec3, radius: f32, amount: f32) -> f32 {
        let mut consumed = 0.0;
        for source in self.sources.iter_mut().filter(|s| s.active) {
            let dx = source.position.x - point.x;
            let dz = source.position.z - point.z;
            if dx * dx + dz * dz > radius * radius {
                continue;
            }
            let taken = amount.min(source.strength);
            source.strength -= taken;
            consumed += taken;
            if source.strength <= 0.0 {
                source.strength = 0.0;
                source.active = false;
            }
        }
        consumed
    }
}
