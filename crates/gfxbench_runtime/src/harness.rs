//! Backend and test selection
//!
//! The [`Harness`] owns one backend slot and one test slot and moves
//! between three states:
//!
//! ```text
//!  Unbound ──select_backend──▶ BackendActive ──select_test──▶ Ready
//!     ▲                              │                          │
//!     └────── unbind / failed switch ┴──────────────────────────┘
//! ```
//!
//! A backend switch tears everything down before anything new is built,
//! and re-applies the last requested test once the new backend is up.

use crate::workload::{self, QuadGrid, Submission};
use gfxbench_core::math::TransformBatch;
use gfxbench_core::time::Clock;
use gfxbench_metrics::{Counter, FpsCounter};
use gfxbench_render::{
    create_backend, BackendOptions, BackendType, Extent, FrameBuffer, GfxApi, RenderError,
    SwapChain, TestId, WindowSurface, Workload,
};
use gfxbench_services::Request;
use once_cell::unsync::OnceCell;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{backend} backend failed to initialize")]
    BackendInit {
        backend: BackendType,
        #[source]
        source: RenderError,
    },
    #[error("{backend} backend could not create a swap chain")]
    SwapChain {
        backend: BackendType,
        #[source]
        source: RenderError,
    },
    #[error("{backend} backend does not support {test}")]
    UnsupportedTest { backend: BackendType, test: TestId },
    #[error("{test} failed to initialize on {backend}")]
    TestInit {
        backend: BackendType,
        test: TestId,
        #[source]
        source: RenderError,
    },
    #[error("no backend is bound")]
    NoBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    Unbound,
    /// Backend and swap chain are up but no test is running.
    BackendActive,
    Ready,
}

#[derive(Debug)]
pub enum FrameOutcome {
    /// Nothing to render: no test is active or the window has no area.
    Idle,
    /// The frame was abandoned and no FPS sample was taken.
    Skipped,
    Presented {
        /// Quads or transforms that reached the test case.
        submitted: usize,
        /// Set when this frame closed an FPS interval.
        fps: Option<f64>,
    },
}

/// What the event loop should do after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// FPS statistics over the retained reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FpsSummary {
    pub reports: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for FpsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} avg, {:.1} min, {:.1} max over {} reports",
            self.average, self.min, self.max, self.reports
        )
    }
}

pub type BackendFactory = Box<dyn Fn(BackendType) -> Box<dyn GfxApi>>;

struct Targets {
    swap_chain: SwapChain,
    frame_buffer: FrameBuffer,
}

/// A backend together with everything created from it.
///
/// Dropping it releases the test case, then the frame buffer, then the swap
/// chain, and only then the backend itself.
struct BoundBackend {
    test: Option<Workload>,
    targets: Option<Targets>,
    api: Box<dyn GfxApi>,
}

impl BoundBackend {
    fn bind(mut api: Box<dyn GfxApi>, surface: &WindowSurface) -> Result<Self, HarnessError> {
        let backend = api.backend_type();
        api.init()
            .map_err(|source| HarnessError::BackendInit { backend, source })?;
        let (swap_chain, frame_buffer) = api
            .create_swap_chain(surface)
            .map_err(|source| HarnessError::SwapChain { backend, source })?;

        Ok(Self {
            test: None,
            targets: Some(Targets {
                swap_chain,
                frame_buffer,
            }),
            api,
        })
    }

    fn backend_type(&self) -> BackendType {
        self.api.backend_type()
    }

    fn select_test(&mut self, id: TestId) -> Result<(), HarnessError> {
        let backend = self.backend_type();
        self.test = None;

        let mut test = self
            .api
            .create_test(id)
            .ok_or(HarnessError::UnsupportedTest { backend, test: id })?;
        test.init().map_err(|source| HarnessError::TestInit {
            backend,
            test: id,
            source,
        })?;
        self.test = Some(test);
        Ok(())
    }

    fn frame_parts(&mut self) -> Option<(&mut Workload, &SwapChain, &FrameBuffer)> {
        match (&mut self.test, &self.targets) {
            (Some(test), Some(targets)) => Some((test, &targets.swap_chain, &targets.frame_buffer)),
            _ => None,
        }
    }
}

impl Drop for BoundBackend {
    fn drop(&mut self) {
        self.test = None;
        if let Some(Targets {
            swap_chain,
            frame_buffer,
        }) = self.targets.take()
        {
            self.api.destroy_frame_buffer(frame_buffer);
            self.api.destroy_swap_chain(swap_chain);
        }
    }
}

pub struct Harness<C: Clock> {
    surface: WindowSurface,
    clock: C,
    factory: BackendFactory,
    /// Last test asked for; survives backend switches and failed selections.
    requested_test: TestId,
    bound: Option<BoundBackend>,
    transforms: OnceCell<TransformBatch>,
    quads: QuadGrid,
    fps: FpsCounter,
    counters: Counter,
}

impl<C: Clock> Harness<C> {
    /// Starts unbound. Backends requested by type come from
    /// [`create_backend`] with `options`.
    pub fn new(surface: WindowSurface, clock: C, options: BackendOptions) -> Self {
        let factory: BackendFactory = Box::new(move |backend| create_backend(backend, &options));
        Self::with_factory(surface, clock, factory)
    }

    pub fn with_factory(surface: WindowSurface, clock: C, factory: BackendFactory) -> Self {
        let fps = FpsCounter::new(&clock);
        Self {
            surface,
            clock,
            factory,
            requested_test: TestId::default(),
            bound: None,
            transforms: OnceCell::new(),
            quads: QuadGrid::default(),
            fps,
            counters: Counter::new(),
        }
    }

    /// Sets the test the next backend starts with, without touching the
    /// current one.
    pub fn with_initial_test(mut self, test: TestId) -> Self {
        self.requested_test = test;
        self
    }

    pub fn state(&self) -> HarnessState {
        match &self.bound {
            None => HarnessState::Unbound,
            Some(bound) if bound.test.is_some() => HarnessState::Ready,
            Some(_) => HarnessState::BackendActive,
        }
    }

    pub fn backend_type(&self) -> Option<BackendType> {
        self.bound.as_ref().map(BoundBackend::backend_type)
    }

    /// The last requested test, whether or not it is running.
    pub fn test_id(&self) -> TestId {
        self.requested_test
    }

    /// The test actually running, if any.
    pub fn active_test(&self) -> Option<TestId> {
        self.bound
            .as_ref()
            .and_then(|bound| bound.test.as_ref())
            .map(Workload::id)
    }

    pub fn surface(&self) -> &WindowSurface {
        &self.surface
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }

    /// The cube batch, once a cube test has rendered a frame.
    pub fn transform_batch(&self) -> Option<&TransformBatch> {
        self.transforms.get()
    }

    /// Tears down the current backend, then binds `api` and restores the
    /// last requested test.
    ///
    /// If `api` fails to initialize or to create its swap chain the harness
    /// is left `Unbound`. If only the test fails, the backend stays bound in
    /// `BackendActive` and the test error is returned.
    pub fn select_backend(&mut self, api: Box<dyn GfxApi>) -> Result<(), HarnessError> {
        let backend = api.backend_type();
        self.unbind();

        let bound = BoundBackend::bind(api, &self.surface).inspect_err(|err| {
            tracing::error!(backend = %backend, error = ?err, "backend switch failed");
        })?;
        self.bound = Some(bound);
        self.counters.increment("backend_switches", 1);
        tracing::info!(backend = %backend, "backend selected");

        self.select_test(self.requested_test)
    }

    /// [`select_backend`](Self::select_backend) with a backend built by the
    /// harness's factory.
    pub fn select_backend_type(&mut self, backend: BackendType) -> Result<(), HarnessError> {
        let api = (self.factory)(backend);
        self.select_backend(api)
    }

    /// Releases the test, targets and backend, in that order.
    pub fn unbind(&mut self) {
        if let Some(bound) = self.bound.take() {
            tracing::info!(backend = %bound.backend_type(), "backend released");
        }
    }

    /// Replaces the running test. On failure the backend stays bound with
    /// no test.
    pub fn select_test(&mut self, id: TestId) -> Result<(), HarnessError> {
        self.requested_test = id;
        let bound = self.bound.as_mut().ok_or(HarnessError::NoBackend)?;

        bound.select_test(id).inspect_err(|err| {
            tracing::error!(test = %id, error = ?err, "test selection failed");
        })?;
        self.counters.increment("test_switches", 1);
        self.fps.restart(self.clock.read());
        tracing::info!(test = %id, backend = %bound.backend_type(), "test selected");
        Ok(())
    }

    /// Applies one queued request. Failures are logged and absorbed; the
    /// event loop only needs to know whether to keep going.
    pub fn apply(&mut self, request: Request) -> Flow {
        let result = match request {
            Request::SelectBackend(backend) => self.select_backend_type(backend),
            Request::SelectTest(test) => self.select_test(test),
            Request::Quit => return Flow::Quit,
        };
        if result.is_err() {
            self.counters.increment("failed_requests", 1);
        }
        Flow::Continue
    }

    /// The window's new extent; backends pick it up at the next `begin`.
    pub fn resize(&mut self, extent: Extent) {
        self.surface.set_extent(extent);
    }

    /// Renders one frame with the active test.
    ///
    /// A failed `begin` abandons the frame. A failed submission stops the
    /// remaining submissions but the frame is still ended.
    pub fn render_frame(&mut self) -> FrameOutcome {
        let extent = self.surface.extent();
        if extent.is_zero() {
            return FrameOutcome::Idle;
        }
        let Some((test, swap_chain, frame_buffer)) =
            self.bound.as_mut().and_then(BoundBackend::frame_parts)
        else {
            return FrameOutcome::Idle;
        };
        let id = test.id();

        if let Err(err) = test.begin(extent, swap_chain, frame_buffer) {
            tracing::warn!(test = %id, error = %err, "frame skipped");
            self.counters.increment("frames_skipped", 1);
            return FrameOutcome::Skipped;
        }

        let Submission { submitted, error } = workload::submit(test, &self.quads, &self.transforms);
        if let Some(err) = error {
            tracing::warn!(test = %id, submitted, error = %err, "submission failed, ending frame early");
            self.counters.increment("submission_errors", 1);
        }

        if let Err(err) = test.end(swap_chain) {
            tracing::warn!(test = %id, error = %err, "present failed");
            self.counters.increment("frames_skipped", 1);
            return FrameOutcome::Skipped;
        }
        self.counters.increment("frames_presented", 1);

        let fps = self.fps.record_frame(&self.clock);
        if let Some(fps) = fps {
            tracing::info!("FPS: {fps:.1}");
        }
        FrameOutcome::Presented { submitted, fps }
    }

    pub fn fps_summary(&self) -> Option<FpsSummary> {
        let (min, max) = self.fps.min_max()?;
        Some(FpsSummary {
            reports: self.fps.reports(),
            average: self.fps.average(),
            min,
            max,
        })
    }

    /// Unbinds and logs the session summary.
    pub fn shutdown(&mut self) {
        self.unbind();
        match self.fps_summary() {
            Some(summary) => tracing::info!(%summary, counters = %self.counters, "session finished"),
            None => tracing::info!(counters = %self.counters, "session finished before the first FPS report"),
        }
    }
}
