/// Square grid of decaying trail intensities covering [-R, R] on x and z
#[derive(Debug, Clone)]
pub struct TrailField {
    cells: Vec<f32>,
    resolution: usize,
    half_extent: f32,
    decay_rate: f32,
    deposit_amount: f32,
}

impl TrailField {
    pub fn new(resolution: usize, half_extent: f32, decay_rate: f32, deposit_amount: f32) -> Self {
        let resolution = resolution.max(1);
        Self {
            cells: vec![0.0; resolution * resolution],
            resolution,
            half_extent,
            decay_rate: decay_rate.clamp(0.0, 1.0),
            deposit_amount,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Grid coordinates of the cell covering a world point, clamped to the grid
    pub fn cell_of(&self, x: f32, z: f32) -> (usize, usize) {
        (self.axis_index(x), self.axis_index(z))
    }

    fn axis_index(&self, coord: f32) -> usize {
        if !coord.is_finite() {
            return 0;
        }
        let normalized = (coord + self.half_extent) / (2.0 * self.half_extent);
        let scaled = (normalized * self.resolution as f32).floor();
        scaled.clamp(0.0, (self.resolution - 1) as f32) as usize
    }

    fn index(&self, x: f32, z: f32) -> usize {
        let (col, row) = self.cell_of(x, z);
        row * self.resolution + col
    }

    /// Add the default deposit amount at a world point
    pub fn deposit(&mut self, x: f32, z: f32) {
        self.deposit_with(x, z, self.deposit_amount);
    }

    pub fn deposit_with(&mut self, x: f32, z: f32, amount: f32) {
        if amount.is_nan() || amount <= 0.0 {
            return;
        }
        let idx = self.index(x, z);
        self.cells[idx] += amount;
    }

    pub fn sample(&self, x: f32, z: f32) -> f32 {
        self.cells[self.index(x, z)]
    }

    /// Multiply every cell by the decay rate. Called once per step after all deposits.
    pub fn decay_all(&mut self) {
        let rate = self.decay_rate;
        for cell in &mut self.cells {
            *cell *= rate;
        }
    }

    pub fn max_value(&self) -> f32 {
        self.cells.iter().copied().fold(0.0, f32::max)
    }

    pub fn total(&self) -> f32 {
        self.cells.iter().sum()
    }

    pub fn clear(&mut self) {
        self.cells.fill(0.0);
    }

    /// Row-major cell values, z rows of x columns
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> TrailField {
        TrailField::new(128, 60.0, 0.97, 0.1)
    }

    #[test]
    fn untouched_cells_sample_zero() {
        let mut trail = field();
        trail.deposit(10.0, 10.0);
        assert_eq!(trail.sample(-30.0, 25.0), 0.0);
        assert_eq!(trail.sample(10.0, 10.0), 0.1);
    }

    #[test]
    fn decay_is_geometric() {
        let mut trail = field();
        trail.deposit_with(0.0, 0.0, 2.0);
        for _ in 0..25 {
            trail.decay_all();
        }
        let expected = 2.0 * 0.97f32.powi(25);
        assert!((trail.sample(0.0, 0.0) - expected).abs() < 1e-5);
    }

    #[test]
    fn out_of_bounds_points_clamp_to_edge() {
        let mut trail = field();
        trail.deposit_with(500.0, -500.0, 1.0);
        assert_eq!(trail.cell_of(500.0, -500.0), (127, 0));
        assert_eq!(trail.sample(59.9, -59.9), 1.0);
        assert_eq!(trail.cell_of(60.0, 60.0), (127, 127));
    }

    #[test]
    fn deposits_accumulate_and_ignore_negative() {
        let mut trail = field();
        trail.deposit(1.0, 1.0);
        trail.deposit(1.0, 1.0);
        trail.deposit_with(1.0, 1.0, -5.0);
        assert!((trail.sample(1.0, 1.0) - 0.2).abs() < 1e-6);
        assert!(trail.cells().iter().all(|&v| v >= 0.0));
    }
}
