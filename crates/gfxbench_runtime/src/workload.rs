//! Per-frame submission drivers
//!
//! The volume submitted each frame is fixed so that frame rates are
//! comparable across backends: 160,000 streamed quads, or the whole
//! 64x64x64 cube batch.

use gfxbench_core::math::TransformBatch;
use gfxbench_render::{
    Cubes, RenderError, StreamingVb, VertexPos2, Workload, VERTICES_PER_QUAD,
};
use once_cell::unsync::OnceCell;

/// Layout of the streamed quads: left to right, top to bottom, starting a
/// new row once `x` passes `wrap_x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadGrid {
    pub count: usize,
    pub size: f32,
    pub spacing: f32,
    pub wrap_x: f32,
}

impl Default for QuadGrid {
    fn default() -> Self {
        Self {
            count: 160_000,
            size: 1.0,
            spacing: 1.0,
            wrap_x: 1000.0,
        }
    }
}

impl QuadGrid {
    pub fn quads(&self) -> Quads {
        Quads {
            grid: *self,
            remaining: self.count,
            x: self.spacing,
            y: self.spacing,
        }
    }
}

pub type Quad = [VertexPos2; VERTICES_PER_QUAD];

/// Iterator over the quads of a [`QuadGrid`], two triangles each.
#[derive(Debug, Clone)]
pub struct Quads {
    grid: QuadGrid,
    remaining: usize,
    x: f32,
    y: f32,
}

impl Iterator for Quads {
    type Item = Quad;

    fn next(&mut self) -> Option<Quad> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let QuadGrid { size, spacing, wrap_x, .. } = self.grid;
        let (x, y) = (self.x, self.y);
        let quad = [
            VertexPos2::new(x, y),
            VertexPos2::new(x + size, y),
            VertexPos2::new(x, y + size),
            VertexPos2::new(x + size, y),
            VertexPos2::new(x, y + size),
            VertexPos2::new(x + size, y + size),
        ];

        self.x += size + spacing;
        if self.x > wrap_x {
            self.x = spacing;
            self.y += size + spacing;
        }
        Some(quad)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Quads {}

/// How much of a frame's workload reached the test case.
#[derive(Debug)]
pub struct Submission {
    /// Quads or transforms accepted before any failure.
    pub submitted: usize,
    /// The failure that cut the frame short.
    pub error: Option<RenderError>,
}

/// Calls the submission entry point matching the workload's tag. The cube
/// batch is built on first use and reused afterwards.
pub fn submit(
    test: &mut Workload,
    grid: &QuadGrid,
    transforms: &OnceCell<TransformBatch>,
) -> Submission {
    match test {
        Workload::StreamingVb(test) => submit_quads(test.as_mut(), grid),
        Workload::CubesUniform(test) | Workload::CubesDynamicBuffer(test) => {
            submit_cubes(test.as_mut(), transforms.get_or_init(TransformBatch::grid))
        }
    }
}

/// One `draw` per quad. Stops at the first failure.
pub fn submit_quads(test: &mut dyn StreamingVb, grid: &QuadGrid) -> Submission {
    let mut submitted = 0;
    for quad in grid.quads() {
        if let Err(err) = test.draw(&quad) {
            return Submission {
                submitted,
                error: Some(err),
            };
        }
        submitted += 1;
    }
    Submission {
        submitted,
        error: None,
    }
}

/// The whole batch in a single `draw`; the test case picks its own batching.
pub fn submit_cubes(test: &mut dyn Cubes, batch: &TransformBatch) -> Submission {
    match test.draw(batch.as_slice()) {
        Ok(()) => Submission {
            submitted: batch.len(),
            error: None,
        },
        Err(err) => Submission {
            submitted: 0,
            error: Some(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_volume_and_layout() {
        let quads: Vec<Quad> = QuadGrid::default().quads().collect();
        assert_eq!(quads.len(), 160_000);

        let first = quads[0];
        assert_eq!(first[0], VertexPos2::new(1.0, 1.0));
        assert_eq!(first[5], VertexPos2::new(2.0, 2.0));

        // x runs 1, 3, ..., 999 and wraps once it passes 1000
        assert_eq!(quads[499][0], VertexPos2::new(999.0, 1.0));
        assert_eq!(quads[500][0], VertexPos2::new(1.0, 3.0));

        let last = quads[159_999][0];
        assert_eq!(last, VertexPos2::new(999.0, 639.0));
    }

    #[test]
    fn quads_stay_inside_the_wrap_extent() {
        let grid = QuadGrid::default();
        assert!(grid
            .quads()
            .flatten()
            .all(|v| v.x >= 1.0 && v.x <= grid.wrap_x + grid.size));
        assert_eq!(grid.quads().len(), grid.count);
    }

    #[test]
    fn smaller_grid_wraps_early() {
        let grid = QuadGrid {
            count: 5,
            size: 2.0,
            spacing: 1.0,
            wrap_x: 6.0,
        };
        let origins: Vec<(f32, f32)> = grid.quads().map(|q| (q[0].x, q[0].y)).collect();
        assert_eq!(origins, [(1.0, 1.0), (4.0, 1.0), (1.0, 4.0), (4.0, 4.0), (1.0, 7.0)]);
    }
}
