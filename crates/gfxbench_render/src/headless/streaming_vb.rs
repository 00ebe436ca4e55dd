use super::FrameRecorder;
use crate::{
    Extent, FrameBuffer, RenderError, StreamingVb, SwapChain, TestCase, VertexPos2,
    STREAMING_VERTEX_CAPACITY,
};

/// Streaming vertex buffer emulated with a fixed-capacity `Vec`.
#[derive(Debug)]
pub struct HeadlessStreamingVb {
    recorder: FrameRecorder,
    vertices: Vec<VertexPos2>,
}

impl HeadlessStreamingVb {
    pub(super) fn new(recorder: FrameRecorder) -> Self {
        Self {
            recorder,
            vertices: Vec::new(),
        }
    }

    /// Vertices written in the current (or last) frame.
    pub fn written(&self) -> &[VertexPos2] {
        &self.vertices
    }
}

impl TestCase for HeadlessStreamingVb {
    fn init(&mut self) -> Result<(), RenderError> {
        self.recorder.ensure_initialized()?;
        self.vertices = Vec::with_capacity(STREAMING_VERTEX_CAPACITY);
        Ok(())
    }

    fn begin(
        &mut self,
        extent: Extent,
        swap_chain: &SwapChain,
        frame_buffer: &FrameBuffer,
    ) -> Result<(), RenderError> {
        self.recorder.begin(extent, swap_chain, frame_buffer)?;
        self.vertices.clear();
        Ok(())
    }

    fn end(&mut self, swap_chain: &SwapChain) -> Result<(), RenderError> {
        // The whole buffer goes out as a single draw, as on the GPU path.
        let vertices = self.vertices.len();
        let stats = self.recorder.stats_mut()?;
        stats.draw_calls = usize::from(vertices > 0);
        stats.vertices = vertices;
        self.recorder.end(swap_chain).map(|_| ())
    }
}

impl StreamingVb for HeadlessStreamingVb {
    fn draw(&mut self, vertices: &[VertexPos2]) -> Result<(), RenderError> {
        let available = STREAMING_VERTEX_CAPACITY - self.vertices.len();
        let stats = self.recorder.stats_mut()?;
        if vertices.len() > available {
            return Err(RenderError::CapacityExceeded {
                what: "streaming vertex buffer",
                requested: vertices.len(),
                available,
            });
        }

        stats.bytes_uploaded += std::mem::size_of_val(vertices);
        self.vertices.extend_from_slice(vertices);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::headless::HeadlessApi;
    use crate::{
        Extent, GfxApi, RenderError, StreamingVb, TestCase, TestId, VertexPos2, WindowSurface,
        Workload, STREAMING_QUAD_CAPACITY, VERTICES_PER_QUAD,
    };

    const QUAD: [VertexPos2; VERTICES_PER_QUAD] = [
        VertexPos2::new(1.0, 1.0),
        VertexPos2::new(2.0, 1.0),
        VertexPos2::new(1.0, 2.0),
        VertexPos2::new(2.0, 1.0),
        VertexPos2::new(1.0, 2.0),
        VertexPos2::new(2.0, 2.0),
    ];

    #[test]
    fn full_frame_is_one_draw() {
        let mut api = HeadlessApi::new();
        api.init().unwrap();
        let extent = Extent::new(1024, 748);
        let (sc, fb) = api.create_swap_chain(&WindowSurface::headless(extent)).unwrap();
        let Some(Workload::StreamingVb(mut test)) = api.create_test(TestId::StreamingVb) else {
            panic!("expected the streaming workload");
        };
        test.init().unwrap();

        test.begin(extent, &sc, &fb).unwrap();
        for _ in 0..STREAMING_QUAD_CAPACITY {
            test.draw(&QUAD).unwrap();
        }
        let overflow = test.draw(&QUAD).unwrap_err();
        assert!(matches!(overflow, RenderError::CapacityExceeded { available: 0, .. }));
        test.end(&sc).unwrap();

        let stats = api.frame_log().last().unwrap();
        assert_eq!(stats.test, TestId::StreamingVb);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.vertices, STREAMING_QUAD_CAPACITY * VERTICES_PER_QUAD);
        assert_eq!(stats.bytes_uploaded, STREAMING_QUAD_CAPACITY * 48);
    }

    #[test]
    fn draw_outside_frame_fails() {
        let mut api = HeadlessApi::new();
        api.init().unwrap();
        let mut test = api.create_test(TestId::StreamingVb).unwrap();
        test.init().unwrap();
        let Workload::StreamingVb(test) = &mut test else {
            unreachable!()
        };
        assert!(matches!(test.draw(&QUAD), Err(RenderError::NoFrameInProgress)));
    }
}
