use bevy::prelude::*;

/// Height and normal sampling the simulation moves agents across
pub trait Terrain: Send + Sync {
    fn height_at(&self, x: f32, z: f32) -> f32;

    /// Unit surface normal, pointing up
    fn normal_at(&self, x: f32, z: f32) -> Vec3;
}

/// Level ground at a fixed height. Also stands in when no terrain is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain {
    pub height: f32,
}

impl Terrain for FlatTerrain {
    fn height_at(&self, _x: f32, _z: f32) -> f32 {
        self.height
    }

    fn normal_at(&self, _x: f32, _z: f32) -> Vec3 {
        Vec3::Y
    }
}

/// Gentle hills from two crossed sine waves, with exact normals
#[derive(Debug, Clone, Copy)]
pub struct RollingTerrain {
    pub amplitude: f32,
    pub wavelength: f32,
}

impl Default for RollingTerrain {
    fn default() -> Self {
        Self { amplitude: 2.5, wavelength: 40.0 }
    }
}

impl RollingTerrain {
    fn frequency(&self) -> f32 {
        std::f32::consts::TAU / self.wavelength.max(f32::EPSILON)
    }
}

impl Terrain for RollingTerrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        let k = self.frequency();
        self.amplitude * ((k * x).sin() + (k * z * 0.7).cos()) * 0.5
    }

    fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let k = self.frequency();
        let dh_dx = self.amplitude * 0.5 * k * (k * x).cos();
        let dh_dz = -self.amplitude * 0.5 * 0.7 * k * (k * z * 0.7).sin();
        Vec3::new(-dh_dx, 1.0, -dh_dz).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_normal_is_up() {
        let flat = FlatTerrain { height: 3.0 };
        assert_eq!(flat.height_at(12.0, -4.0), 3.0);
        assert_eq!(flat.normal_at(0.0, 0.0), Vec3::Y);
    }

    #[test]
    fn rolling_normal_matches_finite_difference() {
        let terrain = RollingTerrain::default();
        let (x, z, h) = (7.3, -11.2, 1e-3);
        let dx = (terrain.height_at(x + h, z) - terrain.height_at(x - h, z)) / (2.0 * h);
        let dz = (terrain.height_at(x, z + h) - terrain.height_at(x, z - h)) / (2.0 * h);
        let numeric = Vec3::new(-dx, 1.0, -dz).normalize();
        let analytic = terrain.normal_at(x, z);
        assert!((numeric - analytic).length() < 1e-2);
        assert!((analytic.length() - 1.0).abs() < 1e-5);
    }
}
