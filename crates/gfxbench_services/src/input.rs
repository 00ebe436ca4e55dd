//! Keyboard input mapped to harness requests
//!
//! The event loop translates raw key events into [`Key`]s, maps them to
//! [`Request`]s and queues them; the harness drains the queue before the
//! next frame so a switch never lands in the middle of one.

use gfxbench_core::{BackendType, TestId};
use std::collections::VecDeque;

/// The keys the harness reacts to, independent of the windowing library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Character(char),
    F1,
    F2,
    F3,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    SelectBackend(BackendType),
    SelectTest(TestId),
    Quit,
}

impl Request {
    /// Key bindings:
    ///
    /// | Key | Request |
    /// |-----|---------|
    /// | D | DirectX 12 |
    /// | G | OpenGL |
    /// | V | Vulkan |
    /// | M | Metal |
    /// | H | Headless |
    /// | F1 | StreamingVB |
    /// | F2 | CubesUniform |
    /// | F3 | CubesDynamicBuffer |
    /// | Escape | Quit |
    pub fn from_key(key: Key) -> Option<Request> {
        let request = match key {
            Key::F1 => Request::SelectTest(TestId::StreamingVb),
            Key::F2 => Request::SelectTest(TestId::CubesUniform),
            Key::F3 => Request::SelectTest(TestId::CubesDynamicBuffer),
            Key::Escape => Request::Quit,
            Key::Character(c) => match c.to_ascii_lowercase() {
                'd' => Request::SelectBackend(BackendType::DirectX12),
                'g' => Request::SelectBackend(BackendType::OpenGl),
                'v' => Request::SelectBackend(BackendType::Vulkan),
                'm' => Request::SelectBackend(BackendType::Metal),
                'h' => Request::SelectBackend(BackendType::Headless),
                _ => return None,
            },
        };
        Some(request)
    }
}

/// FIFO of pending requests.
#[derive(Debug, Default)]
pub struct RequestQueue {
    pending: VecDeque<Request>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: Request) {
        tracing::debug!(?request, "request queued");
        self.pending.push_back(request);
    }

    /// Maps and queues a key press. Returns whether the key was bound.
    pub fn push_key(&mut self, key: Key) -> bool {
        match Request::from_key(key) {
            Some(request) => {
                self.push(request);
                true
            }
            None => false,
        }
    }

    pub fn pop(&mut self) -> Option<Request> {
        self.pending.pop_front()
    }

    /// Takes every pending request in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = Request> + '_ {
        self.pending.drain(..)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
