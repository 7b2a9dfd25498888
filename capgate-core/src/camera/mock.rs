//! Scripted camera platform for testing.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;

use super::{CameraPlatform, MediaConstraints, MediaStream};
use crate::error::PlatformError;
use crate::mock::{MockGate, UserActivation};
use crate::platform::PlatformCall;

/// What the next camera request should do.
#[derive(Debug, Clone)]
pub enum MockCameraOutcome {
    Grant,
    Fail(PlatformError),
}

/// Camera platform double.
///
/// Requests consume queued outcomes in order and fall back to granting (or to
/// the failure given to [`MockCamera::failing`]) once the queue is empty.
/// Live streams are counted so tests can check that tracks get stopped.
pub struct MockCamera {
    available: bool,
    outcomes: RefCell<VecDeque<MockCameraOutcome>>,
    fallback: RefCell<MockCameraOutcome>,
    requests: Cell<usize>,
    live: Rc<Cell<usize>>,
    last_constraints: RefCell<Option<MediaConstraints>>,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    activation: Option<UserActivation>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self {
            available: true,
            outcomes: RefCell::new(VecDeque::new()),
            fallback: RefCell::new(MockCameraOutcome::Grant),
            requests: Cell::new(0),
            live: Rc::new(Cell::new(0)),
            last_constraints: RefCell::new(None),
            gate: RefCell::new(None),
            activation: None,
        }
    }

    /// A browser without `navigator.mediaDevices`.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Every request fails with `name`.
    pub fn failing(name: &str, message: &str) -> Self {
        let camera = Self::new();
        *camera.fallback.borrow_mut() = MockCameraOutcome::Fail(PlatformError::new(name, message));
        camera
    }

    /// Awaiting a request ends the user gesture held by `activation`.
    pub fn with_activation(mut self, activation: UserActivation) -> Self {
        self.activation = Some(activation);
        self
    }

    pub fn push_outcome(&self, outcome: MockCameraOutcome) {
        self.outcomes.borrow_mut().push_back(outcome);
    }

    /// Keep the next request pending (like an open permission prompt) until
    /// the returned gate is released.
    pub fn hold(&self) -> MockGate {
        let (gate, rx) = MockGate::pair();
        *self.gate.borrow_mut() = Some(rx);
        gate
    }

    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    /// Streams handed out and not yet stopped.
    pub fn live_streams(&self) -> usize {
        self.live.get()
    }

    pub fn last_constraints(&self) -> Option<MediaConstraints> {
        self.last_constraints.borrow().clone()
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraPlatform for MockCamera {
    fn is_available(&self) -> bool {
        self.available
    }

    fn request(&self, constraints: &MediaConstraints) -> PlatformCall<Box<dyn MediaStream>> {
        self.requests.set(self.requests.get() + 1);
        *self.last_constraints.borrow_mut() = Some(constraints.clone());

        let outcome = self
            .outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.fallback.borrow().clone());
        let live = Rc::clone(&self.live);
        let activation = self.activation.clone();
        let gate = self.gate.borrow_mut().take();

        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            // The caller is suspended here; any gesture is over by now.
            if let Some(activation) = activation {
                activation.expire();
            }
            match outcome {
                MockCameraOutcome::Grant => {
                    live.set(live.get() + 1);
                    Ok(Box::new(MockStream {
                        live,
                        stopped: false,
                    }) as Box<dyn MediaStream>)
                }
                MockCameraOutcome::Fail(err) => Err(err),
            }
        })
    }
}

struct MockStream {
    live: Rc<Cell<usize>>,
    stopped: bool,
}

impl MediaStream for MockStream {
    fn stop_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.set(self.live.get() - 1);
        }
    }
}
