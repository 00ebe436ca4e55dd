//! Scripted backend for harness tests
//!
//! Every lifecycle call lands in a shared [`Journal`], so a test can check
//! exactly what was created and destroyed, and in which order.

use gfxbench_core::math::Mat4;
use gfxbench_render::{
    BackendType, Cubes, Extent, FrameBuffer, GfxApi, RenderError, StreamingVb, SwapChain,
    TestCase, TestId, VertexPos2, WindowSurface, Workload, VERTICES_PER_QUAD,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Init(&'static str),
    CreateSwapChain(&'static str),
    CreateTest(&'static str, TestId),
    TestInit(&'static str),
    Begin(&'static str),
    End(&'static str),
    TestDropped(&'static str),
    DestroyFrameBuffer(&'static str),
    DestroySwapChain(&'static str),
    ApiDropped(&'static str),
}

impl Event {
    fn label(self) -> &'static str {
        match self {
            Event::Init(l)
            | Event::CreateSwapChain(l)
            | Event::CreateTest(l, _)
            | Event::TestInit(l)
            | Event::Begin(l)
            | Event::End(l)
            | Event::TestDropped(l)
            | Event::DestroyFrameBuffer(l)
            | Event::DestroySwapChain(l)
            | Event::ApiDropped(l) => l,
        }
    }
}

/// What one frame received between `begin` and `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRecord {
    pub extent: Extent,
    pub draw_calls: usize,
    /// Quads or transforms accepted.
    pub items: usize,
    pub min_translation: Option<f32>,
    pub max_translation: Option<f32>,
    pub ended: bool,
}

#[derive(Debug, Default)]
struct JournalInner {
    events: Vec<Event>,
    frames: Vec<FrameRecord>,
    live: isize,
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<JournalInner>>);

impl Journal {
    fn push(&self, event: Event) {
        let mut inner = self.0.borrow_mut();
        inner.live += match event {
            Event::CreateSwapChain(_) | Event::CreateTest(..) => 1,
            Event::TestDropped(_) | Event::DestroySwapChain(_) | Event::ApiDropped(_) => -1,
            _ => 0,
        };
        inner.events.push(event);
    }

    fn frame_mut<R>(&self, f: impl FnOnce(&mut FrameRecord) -> R) -> Option<R> {
        self.0.borrow_mut().frames.last_mut().map(f)
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub fn clear(&self) {
        let mut inner = self.0.borrow_mut();
        inner.events.clear();
        inner.frames.clear();
    }

    pub fn last_frame(&self) -> Option<FrameRecord> {
        self.0.borrow().frames.last().copied()
    }

    pub fn frames_ended(&self) -> usize {
        self.0.borrow().frames.iter().filter(|f| f.ended).count()
    }

    fn api_created(&self) {
        self.0.borrow_mut().live += 1;
    }

    /// Backends, swap chain pairs and tests created but not yet released.
    pub fn live_objects(&self) -> isize {
        self.0.borrow().live
    }

    /// Checks that, per backend, nothing happens after the backend is
    /// dropped and the frame buffer goes before its swap chain.
    pub fn assert_nested(&self) {
        let events = self.events();
        let mut dropped = HashSet::new();
        let mut frame_buffer_gone = HashSet::new();
        for event in &events {
            let label = event.label();
            assert!(
                !dropped.contains(label),
                "{event:?} after backend '{label}' was dropped: {events:?}"
            );
            match event {
                Event::ApiDropped(_) => {
                    dropped.insert(label);
                }
                Event::DestroyFrameBuffer(_) => {
                    frame_buffer_gone.insert(label);
                }
                Event::DestroySwapChain(_) => assert!(
                    frame_buffer_gone.contains(label),
                    "swap chain of '{label}' destroyed before its frame buffer: {events:?}"
                ),
                _ => {}
            }
        }
    }
}

/// Failures a [`MockApi`] injects.
#[derive(Debug, Clone, Default)]
pub struct Script {
    fail_init: bool,
    fail_swap_chain: bool,
    unsupported: Vec<TestId>,
    fail_test_init: Vec<TestId>,
    /// Zero-based `begin` calls that fail.
    fail_begin: Vec<usize>,
    /// Draws per frame accepted before every further draw fails.
    fail_draw_after: Option<usize>,
}

impl Script {
    pub fn fail_init() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    pub fn fail_swap_chain() -> Self {
        Self {
            fail_swap_chain: true,
            ..Self::default()
        }
    }

    pub fn unsupported(tests: &[TestId]) -> Self {
        Self {
            unsupported: tests.to_vec(),
            ..Self::default()
        }
    }

    pub fn fail_test_init(tests: &[TestId]) -> Self {
        Self {
            fail_test_init: tests.to_vec(),
            ..Self::default()
        }
    }

    pub fn fail_begin_on(frames: &[usize]) -> Self {
        Self {
            fail_begin: frames.to_vec(),
            ..Self::default()
        }
    }

    pub fn fail_draw_after(draws: usize) -> Self {
        Self {
            fail_draw_after: Some(draws),
            ..Self::default()
        }
    }
}

pub struct MockApi {
    label: &'static str,
    backend: BackendType,
    journal: Journal,
    script: Rc<Script>,
    /// Shared with its test cases so `begin` calls are numbered per backend.
    begins: Rc<Cell<usize>>,
}

impl MockApi {
    pub fn new(label: &'static str, journal: &Journal) -> Self {
        Self::scripted(label, journal, Script::default())
    }

    pub fn scripted(label: &'static str, journal: &Journal, script: Script) -> Self {
        journal.api_created();
        Self {
            label,
            backend: BackendType::Headless,
            journal: journal.clone(),
            script: Rc::new(script),
            begins: Rc::default(),
        }
    }

    pub fn with_backend(mut self, backend: BackendType) -> Self {
        self.backend = backend;
        self
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.journal.push(Event::ApiDropped(self.label));
    }
}

impl GfxApi for MockApi {
    fn backend_type(&self) -> BackendType {
        self.backend
    }

    fn init(&mut self) -> Result<(), RenderError> {
        if self.script.fail_init {
            return Err(RenderError::AdapterUnavailable(self.backend));
        }
        self.journal.push(Event::Init(self.label));
        Ok(())
    }

    fn create_swap_chain(
        &mut self,
        _surface: &WindowSurface,
    ) -> Result<(SwapChain, FrameBuffer), RenderError> {
        if self.script.fail_swap_chain {
            return Err(RenderError::InvalidSurface("scripted failure"));
        }
        self.journal.push(Event::CreateSwapChain(self.label));
        Ok((SwapChain::from_raw(0), FrameBuffer::from_raw(1)))
    }

    fn destroy_frame_buffer(&mut self, _frame_buffer: FrameBuffer) {
        self.journal.push(Event::DestroyFrameBuffer(self.label));
    }

    fn destroy_swap_chain(&mut self, _swap_chain: SwapChain) {
        self.journal.push(Event::DestroySwapChain(self.label));
    }

    fn create_test(&mut self, id: TestId) -> Option<Workload> {
        if self.script.unsupported.contains(&id) {
            return None;
        }
        self.journal.push(Event::CreateTest(self.label, id));
        let test = MockTest {
            label: self.label,
            id,
            journal: self.journal.clone(),
            script: Rc::clone(&self.script),
            begins: Rc::clone(&self.begins),
            draws: 0,
        };
        Some(match id {
            TestId::StreamingVb => Workload::StreamingVb(Box::new(test)),
            TestId::CubesUniform => Workload::CubesUniform(Box::new(test)),
            TestId::CubesDynamicBuffer => Workload::CubesDynamicBuffer(Box::new(test)),
        })
    }
}

struct MockTest {
    label: &'static str,
    id: TestId,
    journal: Journal,
    script: Rc<Script>,
    begins: Rc<Cell<usize>>,
    draws: usize,
}

impl MockTest {
    fn draw_allowed(&mut self) -> Result<(), RenderError> {
        self.journal
            .frame_mut(|frame| frame.draw_calls += 1)
            .ok_or(RenderError::NoFrameInProgress)?;
        self.draws += 1;
        match self.script.fail_draw_after {
            Some(limit) if self.draws > limit => Err(RenderError::CapacityExceeded {
                what: "scripted buffer",
                requested: 1,
                available: 0,
            }),
            _ => Ok(()),
        }
    }
}

impl Drop for MockTest {
    fn drop(&mut self) {
        self.journal.push(Event::TestDropped(self.label));
    }
}

impl TestCase for MockTest {
    fn init(&mut self) -> Result<(), RenderError> {
        self.journal.push(Event::TestInit(self.label));
        if self.script.fail_test_init.contains(&self.id) {
            return Err(RenderError::NotInitialized);
        }
        Ok(())
    }

    fn begin(
        &mut self,
        extent: Extent,
        _swap_chain: &SwapChain,
        _frame_buffer: &FrameBuffer,
    ) -> Result<(), RenderError> {
        self.journal.push(Event::Begin(self.label));
        let index = self.begins.get();
        self.begins.set(index + 1);
        if self.script.fail_begin.contains(&index) {
            return Err(RenderError::NoFrameInProgress);
        }

        self.draws = 0;
        self.journal.0.borrow_mut().frames.push(FrameRecord {
            extent,
            draw_calls: 0,
            items: 0,
            min_translation: None,
            max_translation: None,
            ended: false,
        });
        Ok(())
    }

    fn end(&mut self, _swap_chain: &SwapChain) -> Result<(), RenderError> {
        self.journal.push(Event::End(self.label));
        self.journal
            .frame_mut(|frame| frame.ended = true)
            .ok_or(RenderError::NoFrameInProgress)
    }
}

impl StreamingVb for MockTest {
    fn draw(&mut self, vertices: &[VertexPos2]) -> Result<(), RenderError> {
        self.draw_allowed()?;
        let quads = vertices.len() / VERTICES_PER_QUAD;
        self.journal.frame_mut(|frame| frame.items += quads);
        Ok(())
    }
}

impl Cubes for MockTest {
    fn draw(&mut self, transforms: &[Mat4]) -> Result<(), RenderError> {
        self.draw_allowed()?;
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for t in transforms {
            let w = t.w_axis.truncate();
            min = min.min(w.min_element());
            max = max.max(w.max_element());
        }
        self.journal.frame_mut(|frame| {
            frame.items += transforms.len();
            frame.min_translation = Some(min);
            frame.max_translation = Some(max);
        });
        Ok(())
    }
}
