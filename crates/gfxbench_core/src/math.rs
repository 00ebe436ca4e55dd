//! Math utilities
//!
//! Re-exports glam and builds the fixed cube placement grid

pub use glam::*;

/// Cubes per axis in the placement grid.
pub const CUBE_GRID_DIM: usize = 64;

/// Total cube instances submitted per frame by the cube workloads.
pub const CUBE_COUNT: usize = CUBE_GRID_DIM * CUBE_GRID_DIM * CUBE_GRID_DIM;

/// Immutable batch of rigid-body transforms, one per cube instance.
///
/// Generated once and read every frame, so per-frame cost measures GPU
/// submission rather than transform generation.
#[derive(Debug, Clone)]
pub struct TransformBatch {
    transforms: Box<[Mat4]>,
}

impl TransformBatch {
    /// 64x64x64 grid centered at the origin; each axis spans -32..=31.
    ///
    /// Ordering is x outermost, z innermost.
    pub fn grid() -> Self {
        let half = (CUBE_GRID_DIM / 2) as f32;
        let mut transforms = Vec::with_capacity(CUBE_COUNT);
        for x in 0..CUBE_GRID_DIM {
            for y in 0..CUBE_GRID_DIM {
                for z in 0..CUBE_GRID_DIM {
                    transforms.push(Mat4::from_translation(Vec3::new(
                        x as f32 - half,
                        y as f32 - half,
                        z as f32 - half,
                    )));
                }
            }
        }

        Self {
            transforms: transforms.into_boxed_slice(),
        }
    }

    pub fn as_slice(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn grid_covers_every_cell_once() {
        let batch = TransformBatch::grid();
        assert_eq!(batch.len(), CUBE_COUNT);

        let mut cells = HashSet::new();
        for m in batch.as_slice() {
            let t = m.w_axis;
            for c in [t.x, t.y, t.z] {
                assert!((-32.0..=31.0).contains(&c));
                assert_eq!(c.fract(), 0.0);
            }
            assert!(cells.insert((t.x as i32, t.y as i32, t.z as i32)));
        }
        assert_eq!(cells.len(), CUBE_COUNT);
    }

    #[test]
    fn grid_transforms_are_pure_translations() {
        let batch = TransformBatch::grid();
        let first = batch.as_slice()[0];
        assert_eq!(first, Mat4::from_translation(Vec3::splat(-32.0)));

        let last = batch.as_slice()[CUBE_COUNT - 1];
        assert_eq!(last.w_axis, Vec4::new(31.0, 31.0, 31.0, 1.0));
        assert_eq!(last.x_axis, Vec4::X);
        assert_eq!(last.y_axis, Vec4::Y);
        assert_eq!(last.z_axis, Vec4::Z);

        // z is the innermost axis
        assert_eq!(batch.as_slice()[1].w_axis.z, -31.0);
    }
}
