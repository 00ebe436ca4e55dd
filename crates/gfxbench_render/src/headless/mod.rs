//! CPU-only backend
//!
//! Runs every workload against plain memory: submissions are copied into
//! fixed-capacity buffers shaped like their GPU counterparts, and each
//! presented frame is recorded in a [`FrameLog`]. No GPU, no window.

mod cubes;
mod streaming_vb;

use crate::{
    BackendType, Extent, FrameBuffer, GfxApi, RenderError, SwapChain, TestId, WindowSurface,
    Workload,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub use cubes::{CubesMode, HeadlessCubes};
pub use streaming_vb::HeadlessStreamingVb;

/// Counters for one frame, from `begin` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub test: TestId,
    pub extent: Extent,
    pub draw_calls: usize,
    pub vertices: usize,
    pub instances: usize,
    pub bytes_uploaded: usize,
}

impl FrameStats {
    fn new(test: TestId, extent: Extent) -> Self {
        Self {
            test,
            extent,
            draw_calls: 0,
            vertices: 0,
            instances: 0,
            bytes_uploaded: 0,
        }
    }
}

#[derive(Debug, Default)]
struct FrameLogInner {
    presented: u64,
    last: Option<FrameStats>,
}

/// Shared view of what the headless backend has presented.
#[derive(Debug, Clone, Default)]
pub struct FrameLog(Rc<RefCell<FrameLogInner>>);

impl FrameLog {
    pub fn presented(&self) -> u64 {
        self.0.borrow().presented
    }

    pub fn last(&self) -> Option<FrameStats> {
        self.0.borrow().last
    }

    fn record(&self, stats: FrameStats) {
        let mut inner = self.0.borrow_mut();
        inner.presented += 1;
        inner.last = Some(stats);
    }
}

/// Device state shared between the backend and the test cases it creates.
#[derive(Debug, Default)]
struct HeadlessDevice {
    initialized: bool,
    next_id: u64,
    swap_chains: HashMap<u64, Extent>,
    /// frame buffer id -> owning swap chain id
    frame_buffers: HashMap<u64, u64>,
}

impl HeadlessDevice {
    fn check_targets(&self, swap_chain: &SwapChain, frame_buffer: &FrameBuffer) -> Result<(), RenderError> {
        if !self.swap_chains.contains_key(&swap_chain.id()) {
            return Err(RenderError::UnknownSwapChain(swap_chain.id()));
        }
        match self.frame_buffers.get(&frame_buffer.id()) {
            Some(&owner) if owner == swap_chain.id() => Ok(()),
            _ => Err(RenderError::UnknownFrameBuffer(frame_buffer.id())),
        }
    }
}

#[derive(Debug, Default)]
pub struct HeadlessApi {
    device: Rc<RefCell<HeadlessDevice>>,
    log: FrameLog,
}

impl HeadlessApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the presented-frame log; stays valid after the backend is
    /// boxed and handed to the harness.
    pub fn frame_log(&self) -> FrameLog {
        self.log.clone()
    }

    /// Live swap chains, for lifetime checks.
    pub fn live_swap_chains(&self) -> usize {
        self.device.borrow().swap_chains.len()
    }

    fn recorder(&self, test: TestId) -> FrameRecorder {
        FrameRecorder {
            device: Rc::clone(&self.device),
            log: self.log.clone(),
            test,
            frame: None,
        }
    }
}

impl GfxApi for HeadlessApi {
    fn backend_type(&self) -> BackendType {
        BackendType::Headless
    }

    fn init(&mut self) -> Result<(), RenderError> {
        self.device.borrow_mut().initialized = true;
        tracing::debug!("headless device ready");
        Ok(())
    }

    fn create_swap_chain(
        &mut self,
        surface: &WindowSurface,
    ) -> Result<(SwapChain, FrameBuffer), RenderError> {
        let mut device = self.device.borrow_mut();
        if !device.initialized {
            return Err(RenderError::NotInitialized);
        }
        if surface.extent().is_zero() {
            return Err(RenderError::ZeroExtent);
        }

        let swap_chain = device.next_id;
        let frame_buffer = device.next_id + 1;
        device.next_id += 2;
        device.swap_chains.insert(swap_chain, surface.extent());
        device.frame_buffers.insert(frame_buffer, swap_chain);

        Ok((SwapChain::from_raw(swap_chain), FrameBuffer::from_raw(frame_buffer)))
    }

    fn destroy_frame_buffer(&mut self, frame_buffer: FrameBuffer) {
        self.device.borrow_mut().frame_buffers.remove(&frame_buffer.id());
    }

    fn destroy_swap_chain(&mut self, swap_chain: SwapChain) {
        let mut device = self.device.borrow_mut();
        if device.frame_buffers.values().any(|&owner| owner == swap_chain.id()) {
            tracing::warn!(swap_chain = swap_chain.id(), "swap chain destroyed before its frame buffer");
            device.frame_buffers.retain(|_, owner| *owner != swap_chain.id());
        }
        device.swap_chains.remove(&swap_chain.id());
    }

    fn create_test(&mut self, id: TestId) -> Option<Workload> {
        let recorder = self.recorder(id);
        let workload = match id {
            TestId::StreamingVb => Workload::StreamingVb(Box::new(HeadlessStreamingVb::new(recorder))),
            TestId::CubesUniform => Workload::CubesUniform(Box::new(HeadlessCubes::new(
                recorder,
                CubesMode::Uniform,
            ))),
            TestId::CubesDynamicBuffer => Workload::CubesDynamicBuffer(Box::new(
                HeadlessCubes::new(recorder, CubesMode::DynamicBuffer),
            )),
        };
        Some(workload)
    }
}

/// Frame bookkeeping shared by the headless test cases.
#[derive(Debug)]
struct FrameRecorder {
    device: Rc<RefCell<HeadlessDevice>>,
    log: FrameLog,
    test: TestId,
    frame: Option<(u64, FrameStats)>,
}

impl FrameRecorder {
    fn ensure_initialized(&self) -> Result<(), RenderError> {
        if self.device.borrow().initialized {
            Ok(())
        } else {
            Err(RenderError::NotInitialized)
        }
    }

    fn begin(
        &mut self,
        extent: Extent,
        swap_chain: &SwapChain,
        frame_buffer: &FrameBuffer,
    ) -> Result<(), RenderError> {
        if self.frame.is_some() {
            return Err(RenderError::FrameInProgress);
        }
        if extent.is_zero() {
            return Err(RenderError::ZeroExtent);
        }
        self.device.borrow().check_targets(swap_chain, frame_buffer)?;
        self.frame = Some((swap_chain.id(), FrameStats::new(self.test, extent)));
        Ok(())
    }

    fn stats_mut(&mut self) -> Result<&mut FrameStats, RenderError> {
        self.frame
            .as_mut()
            .map(|(_, stats)| stats)
            .ok_or(RenderError::NoFrameInProgress)
    }

    fn end(&mut self, swap_chain: &SwapChain) -> Result<FrameStats, RenderError> {
        match self.frame.take() {
            Some((id, stats)) if id == swap_chain.id() => {
                self.log.record(stats);
                Ok(stats)
            }
            Some(frame) => {
                self.frame = Some(frame);
                Err(RenderError::UnknownSwapChain(swap_chain.id()))
            }
            None => Err(RenderError::NoFrameInProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_api() -> (HeadlessApi, SwapChain, FrameBuffer) {
        let mut api = HeadlessApi::new();
        api.init().unwrap();
        let (sc, fb) = api
            .create_swap_chain(&WindowSurface::headless(Extent::new(1024, 748)))
            .unwrap();
        (api, sc, fb)
    }

    #[test]
    fn swap_chain_requires_init() {
        let mut api = HeadlessApi::new();
        let result = api.create_swap_chain(&WindowSurface::headless(Extent::new(64, 64)));
        assert!(matches!(result, Err(RenderError::NotInitialized)));
    }

    #[test]
    fn swap_chain_rejects_zero_extent() {
        let mut api = HeadlessApi::new();
        api.init().unwrap();
        let result = api.create_swap_chain(&WindowSurface::headless(Extent::new(0, 64)));
        assert!(matches!(result, Err(RenderError::ZeroExtent)));
    }

    #[test]
    fn ordered_teardown_releases_everything() {
        let (mut api, sc, fb) = bound_api();
        assert_eq!(api.live_swap_chains(), 1);
        api.destroy_frame_buffer(fb);
        api.destroy_swap_chain(sc);
        assert_eq!(api.live_swap_chains(), 0);
        assert!(api.device.borrow().frame_buffers.is_empty());
    }

    #[test]
    fn every_test_id_is_supported() {
        let (mut api, _sc, _fb) = bound_api();
        for id in TestId::ALL {
            let workload = api.create_test(id).expect("headless supports every workload");
            assert_eq!(workload.id(), id);
        }
    }

    #[test]
    fn begin_rejects_foreign_handles() {
        let (mut api, sc, fb) = bound_api();
        let mut test = api.create_test(TestId::CubesUniform).unwrap();
        test.init().unwrap();

        let foreign = SwapChain::from_raw(999);
        let err = test.begin(Extent::new(8, 8), &foreign, &fb).unwrap_err();
        assert!(matches!(err, RenderError::UnknownSwapChain(999)));

        let foreign_fb = FrameBuffer::from_raw(sc.id());
        let err = test.begin(Extent::new(8, 8), &sc, &foreign_fb).unwrap_err();
        assert!(matches!(err, RenderError::UnknownFrameBuffer(_)));
    }

    #[test]
    fn end_without_begin_is_an_error() {
        let (mut api, sc, _fb) = bound_api();
        let mut test = api.create_test(TestId::StreamingVb).unwrap();
        test.init().unwrap();
        assert!(matches!(test.end(&sc), Err(RenderError::NoFrameInProgress)));
        assert_eq!(api.frame_log().presented(), 0);
    }
}
