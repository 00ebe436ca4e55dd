use super::FrameRecorder;
use crate::{
    Cubes, Extent, FrameBuffer, RenderError, SwapChain, TestCase, CUBE_INSTANCE_CHUNK,
    UNIFORM_BLOCK_TRANSFORMS,
};
use gfxbench_core::math::CUBE_COUNT;
use glam::Mat4;

/// How transforms reach the (emulated) vertex stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubesMode {
    /// Copy into one uniform block per batch, one draw per block.
    Uniform,
    /// Append to an instance buffer in chunks, one draw per chunk.
    DynamicBuffer,
}

#[derive(Debug)]
pub struct HeadlessCubes {
    recorder: FrameRecorder,
    mode: CubesMode,
    uniform_block: Vec<Mat4>,
    instances: Vec<Mat4>,
    /// Translation sum of everything drawn this frame; keeps the copies honest.
    checksum: f32,
}

impl HeadlessCubes {
    pub(super) fn new(recorder: FrameRecorder, mode: CubesMode) -> Self {
        Self {
            recorder,
            mode,
            uniform_block: Vec::new(),
            instances: Vec::new(),
            checksum: 0.0,
        }
    }

    pub fn mode(&self) -> CubesMode {
        self.mode
    }

    pub fn checksum(&self) -> f32 {
        self.checksum
    }

    fn draw_uniform(&mut self, transforms: &[Mat4]) -> Result<(), RenderError> {
        if self.uniform_block.len() < UNIFORM_BLOCK_TRANSFORMS {
            return Err(RenderError::NotInitialized);
        }
        let stats = self.recorder.stats_mut()?;
        for block in transforms.chunks(UNIFORM_BLOCK_TRANSFORMS) {
            self.uniform_block[..block.len()].copy_from_slice(block);
            self.checksum += self.uniform_block[..block.len()]
                .iter()
                .map(|m| m.w_axis.x + m.w_axis.y + m.w_axis.z)
                .sum::<f32>();
            stats.draw_calls += 1;
            stats.instances += block.len();
            stats.bytes_uploaded += std::mem::size_of_val(block);
        }
        Ok(())
    }

    fn draw_dynamic(&mut self, transforms: &[Mat4]) -> Result<(), RenderError> {
        let available = CUBE_COUNT - self.instances.len();
        let stats = self.recorder.stats_mut()?;
        if transforms.len() > available {
            return Err(RenderError::CapacityExceeded {
                what: "instance buffer",
                requested: transforms.len(),
                available,
            });
        }

        for chunk in transforms.chunks(CUBE_INSTANCE_CHUNK) {
            let start = self.instances.len();
            self.instances.extend_from_slice(chunk);
            self.checksum += self.instances[start..]
                .iter()
                .map(|m| m.w_axis.x + m.w_axis.y + m.w_axis.z)
                .sum::<f32>();
            stats.draw_calls += 1;
            stats.instances += chunk.len();
            stats.bytes_uploaded += std::mem::size_of_val(chunk);
        }
        Ok(())
    }
}

impl TestCase for HeadlessCubes {
    fn init(&mut self) -> Result<(), RenderError> {
        self.recorder.ensure_initialized()?;
        match self.mode {
            CubesMode::Uniform => self.uniform_block = vec![Mat4::IDENTITY; UNIFORM_BLOCK_TRANSFORMS],
            CubesMode::DynamicBuffer => self.instances = Vec::with_capacity(CUBE_COUNT),
        }
        Ok(())
    }

    fn begin(
        &mut self,
        extent: Extent,
        swap_chain: &SwapChain,
        frame_buffer: &FrameBuffer,
    ) -> Result<(), RenderError> {
        self.recorder.begin(extent, swap_chain, frame_buffer)?;
        self.instances.clear();
        self.checksum = 0.0;
        Ok(())
    }

    fn end(&mut self, swap_chain: &SwapChain) -> Result<(), RenderError> {
        self.recorder.end(swap_chain).map(|_| ())
    }
}

impl Cubes for HeadlessCubes {
    fn draw(&mut self, transforms: &[Mat4]) -> Result<(), RenderError> {
        match self.mode {
            CubesMode::Uniform => self.draw_uniform(transforms),
            CubesMode::DynamicBuffer => self.draw_dynamic(transforms),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::headless::HeadlessApi;
    use crate::{
        Cubes, Extent, GfxApi, RenderError, TestCase, TestId, WindowSurface, Workload,
        CUBE_INSTANCE_CHUNK, UNIFORM_BLOCK_TRANSFORMS,
    };
    use gfxbench_core::math::{TransformBatch, CUBE_COUNT};

    fn run_frame(id: TestId) -> crate::headless::FrameStats {
        let mut api = HeadlessApi::new();
        api.init().unwrap();
        let extent = Extent::new(1024, 748);
        let (sc, fb) = api.create_swap_chain(&WindowSurface::headless(extent)).unwrap();
        let mut test = match api.create_test(id) {
            Some(Workload::CubesUniform(test)) | Some(Workload::CubesDynamicBuffer(test)) => test,
            other => panic!("unexpected workload {other:?}"),
        };
        test.init().unwrap();

        let batch = TransformBatch::grid();
        test.begin(extent, &sc, &fb).unwrap();
        test.draw(batch.as_slice()).unwrap();
        test.end(&sc).unwrap();
        api.frame_log().last().unwrap()
    }

    #[test]
    fn uniform_mode_draws_one_call_per_block() {
        let stats = run_frame(TestId::CubesUniform);
        assert_eq!(stats.test, TestId::CubesUniform);
        assert_eq!(stats.instances, CUBE_COUNT);
        assert_eq!(stats.draw_calls, CUBE_COUNT / UNIFORM_BLOCK_TRANSFORMS);
        assert_eq!(stats.bytes_uploaded, CUBE_COUNT * 64);
    }

    #[test]
    fn dynamic_mode_draws_one_call_per_chunk() {
        let stats = run_frame(TestId::CubesDynamicBuffer);
        assert_eq!(stats.test, TestId::CubesDynamicBuffer);
        assert_eq!(stats.instances, CUBE_COUNT);
        assert_eq!(stats.draw_calls, CUBE_COUNT / CUBE_INSTANCE_CHUNK);
    }

    #[test]
    fn dynamic_buffer_rejects_a_second_full_batch() {
        let mut api = HeadlessApi::new();
        api.init().unwrap();
        let extent = Extent::new(16, 16);
        let (sc, fb) = api.create_swap_chain(&WindowSurface::headless(extent)).unwrap();
        let Some(Workload::CubesDynamicBuffer(mut test)) =
            api.create_test(TestId::CubesDynamicBuffer)
        else {
            panic!("expected the dynamic buffer workload");
        };
        test.init().unwrap();

        let batch = TransformBatch::grid();
        test.begin(extent, &sc, &fb).unwrap();
        test.draw(batch.as_slice()).unwrap();
        let err = test.draw(&batch.as_slice()[..1]).unwrap_err();
        assert!(matches!(err, RenderError::CapacityExceeded { available: 0, .. }));
        test.end(&sc).unwrap();

        // the next frame starts empty again
        test.begin(extent, &sc, &fb).unwrap();
        test.draw(batch.as_slice()).unwrap();
        test.end(&sc).unwrap();
        assert_eq!(api.frame_log().presented(), 2);
    }
}
