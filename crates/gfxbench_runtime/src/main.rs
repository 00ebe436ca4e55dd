//! gfxbench
//!
//! Opens the benchmark window and renders as fast as the backend allows.
//!
//! Keys: D/G/V/M/H select DirectX 12, OpenGL, Vulkan, Metal or the headless
//! backend; F1-F3 select a test; Escape quits.
//!
//! Usage: `gfxbench [settings.json]`

use anyhow::{Context, Result};
use gfxbench_core::time::SystemClock;
use gfxbench_render::{window_attributes, BackendOptions, WindowConfig, WindowSurface};
use gfxbench_runtime::{Flow, Harness};
use gfxbench_services::settings::DEFAULT_SETTINGS_PATH;
use gfxbench_services::{Key, RequestQueue, Settings};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key as LogicalKey, NamedKey},
    window::{Window, WindowId},
};

struct BenchApp {
    settings: Settings,
    window: Option<Arc<Window>>,
    harness: Option<Harness<SystemClock>>,
    requests: RequestQueue,
    /// Set when the window could not be created.
    error: Option<anyhow::Error>,
}

impl BenchApp {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            window: None,
            harness: None,
            requests: RequestQueue::new(),
            error: None,
        }
    }

    fn window_config(&self) -> WindowConfig {
        let window = &self.settings.window;
        WindowConfig {
            title: window.title.clone(),
            x: window.x,
            y: window.y,
            width: window.width,
            height: window.height,
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut harness) = self.harness.take() {
            harness.shutdown();
        }
        event_loop.exit();
    }
}

fn map_key(key: &LogicalKey) -> Option<Key> {
    match key {
        LogicalKey::Named(NamedKey::F1) => Some(Key::F1),
        LogicalKey::Named(NamedKey::F2) => Some(Key::F2),
        LogicalKey::Named(NamedKey::F3) => Some(Key::F3),
        LogicalKey::Named(NamedKey::Escape) => Some(Key::Escape),
        LogicalKey::Character(text) => text.chars().next().map(Key::Character),
        _ => None,
    }
}

impl ApplicationHandler for BenchApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes(&self.window_config())) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                tracing::error!(error = %err, "failed to create window");
                self.error = Some(anyhow::Error::new(err).context("creating the benchmark window"));
                event_loop.exit();
                return;
            }
        };

        let benchmark = self.settings.benchmark;
        let options = BackendOptions {
            vsync: benchmark.vsync,
        };
        let surface = WindowSurface::from_window(Arc::clone(&window));
        let mut harness =
            Harness::new(surface, SystemClock::new(), options).with_initial_test(benchmark.test);

        // A failed start is logged by the harness; another backend can still
        // be picked from the keyboard.
        if harness.select_backend_type(benchmark.backend).is_err() {
            tracing::warn!("no backend bound, press D, G, V, M or H to select one");
        }

        self.window = Some(window);
        self.harness = Some(harness);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Some(harness) = &mut self.harness {
                    harness.resize(size.into());
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(key) = map_key(&logical_key) {
                    self.requests.push_key(key);
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(harness) = &mut self.harness else {
                    return;
                };
                // Switches land between frames, never inside one.
                let quit = self
                    .requests
                    .drain()
                    .any(|request| harness.apply(request) == Flow::Quit);
                if quit {
                    self.shutdown(event_loop);
                    return;
                }
                harness.render_frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("gfxbench v{}", gfxbench_core::VERSION);

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());
    let settings = Settings::load_or_default(&path)
        .with_context(|| format!("loading settings from '{path}'"))?;
    tracing::info!(
        backend = %settings.benchmark.backend,
        test = %settings.benchmark.test,
        vsync = settings.benchmark.vsync,
        "settings loaded"
    );

    let event_loop = EventLoop::new()?;
    // Idle-driven: render whenever no event is pending.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = BenchApp::new(settings);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
