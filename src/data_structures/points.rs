//! Procedurally generated point clouds.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Where the third coordinate of each generated point is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrideLayout {
    /// x, y and z are three independent draws at `i*3`, `i*3+1` and `i*3+2`.
    #[default]
    Independent,
    /// The z draw lands on the y slot and the z slot repeats it, so every
    /// point lies on the plane y == z.
    MirroredYz,
}

/// A flat buffer of xyz triples.
#[derive(Clone, Debug, PartialEq)]
pub struct PointBuffer {
    positions: Vec<f32>,
}

impl PointBuffer {
    /// `count` points with every coordinate drawn uniformly from
    /// `[-spread / 2, spread / 2)`, reproducible for a given `seed`.
    pub fn random(count: usize, spread: f32, seed: u64, layout: StrideLayout) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions = vec![0.0; count * 3];
        let mut draw = || (rng.random::<f32>() - 0.5) * spread;
        for i in 0..count {
            let (x, y, z) = (draw(), draw(), draw());
            positions[i * 3] = x;
            positions[i * 3 + 1] = y;
            match layout {
                StrideLayout::Independent => positions[i * 3 + 2] = z,
                StrideLayout::MirroredYz => {
                    positions[i * 3 + 1] = z;
                    positions[i * 3 + 2] = z;
                }
            }
        }
        Self { positions }
    }

    pub fn from_positions(positions: Vec<f32>) -> Self {
        Self { positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.len() < 3
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.positions
    }

    pub fn point(&self, i: usize) -> Option<[f32; 3]> {
        let start = i.checked_mul(3)?;
        self.positions
            .get(start..start.checked_add(3)?)
            .map(|p| [p[0], p[1], p[2]])
    }

    pub fn iter(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }
}

/// A seed derived from the current time, for when none was configured.
pub fn time_seed() -> u64 {
    instant::now().to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_stay_within_spread() {
        let points = PointBuffer::random(1000, 1.0, 7, StrideLayout::Independent);
        assert_eq!(points.len(), 1000);
        assert_eq!(points.as_slice().len(), 3000);
        assert!(points.as_slice().iter().all(|c| (-0.5..=0.5).contains(c)));
    }

    #[test]
    fn same_seed_same_cloud() {
        let a = PointBuffer::random(64, 2.0, 42, StrideLayout::Independent);
        let b = PointBuffer::random(64, 2.0, 42, StrideLayout::Independent);
        let c = PointBuffer::random(64, 2.0, 43, StrideLayout::Independent);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn mirrored_layout_repeats_y_in_z() {
        let mirrored = PointBuffer::random(100, 1.0, 3, StrideLayout::MirroredYz);
        assert!(mirrored.iter().all(|[_, y, z]| y == z));

        let independent = PointBuffer::random(100, 1.0, 3, StrideLayout::Independent);
        assert!(independent.iter().any(|[_, y, z]| y != z));
        // both layouts consume the same draws, so x agrees
        assert!(
            mirrored
                .iter()
                .zip(independent.iter())
                .all(|(m, i)| m[0] == i[0])
        );
    }

    #[test]
    fn point_lookup_is_bounds_checked() {
        let points = PointBuffer::from_positions(vec![1.0, 2.0, 3.0]);
        assert_eq!(points.point(0), Some([1.0, 2.0, 3.0]));
        assert_eq!(points.point(1), None);
        assert!(!points.is_empty());
    }

    #[test]
    fn huge_point_index_is_none() {
        let points = PointBuffer::from_positions(vec![1.0, 2.0, 3.0]);
        assert_eq!(points.point(usize::MAX / 2), None);
        assert_eq!(points.point(usize::MAX), None);
    }
}
