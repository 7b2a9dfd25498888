//! Platform doubles.
//!
//! WARNING: for tests and offline demos only. Nothing here talks to real
//! hardware, and credential ids are derived deterministically.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;

use crate::orchestrator::{BiometricUi, CameraUi, ErrorNotice, StatusKind, UiSurface};
use crate::platform::Scheduler;

pub use crate::biometric::{MockAuthenticator, MockAuthenticatorOutcome, MockCredentialCall};
pub use crate::camera::{MockCamera, MockCameraOutcome};
pub use crate::store::MemoryCredentialStore;

/// Model of the browser's transient user activation.
///
/// A click grants it; the first suspension of the click handler ends it.
/// Privacy-sensitive requests issued without it are rejected with
/// `NotAllowedError`.
#[derive(Debug, Clone, Default)]
pub struct UserActivation(Rc<Cell<bool>>);

impl UserActivation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A user gesture happened.
    pub fn grant(&self) {
        self.0.set(true);
    }

    /// The gesture handler yielded to the event loop.
    pub fn expire(&self) {
        self.0.set(false);
    }

    pub fn is_active(&self) -> bool {
        self.0.get()
    }
}

/// Holds the next platform call of a double pending until released.
///
/// Dropping the gate releases the call as well.
#[derive(Debug)]
pub struct MockGate(oneshot::Sender<()>);

impl MockGate {
    pub(crate) fn pair() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    pub fn release(self) {
        let _ = self.0.send(());
    }
}

struct ScheduledTask {
    due: Duration,
    seq: u64,
    task: Box<dyn FnOnce()>,
}

/// Scheduler driven by a virtual clock.
///
/// Tasks run only when [`ManualScheduler::advance`] moves the clock past their
/// due time, in due order.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    seq: Cell<u64>,
    pending: RefCell<Vec<ScheduledTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Due time of the earliest pending task, relative to the virtual epoch.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.borrow().iter().map(|t| t.due).min()
    }

    /// Move the clock forward and run every task that became due.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;

        loop {
            // Take the task out before running it; tasks may schedule more.
            let next = {
                let mut pending = self.pending.borrow_mut();
                let idx = pending
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                idx.map(|i| pending.swap_remove(i))
            };

            match next {
                Some(task) => {
                    self.now.set(task.due);
                    (task.task)();
                }
                None => break,
            }
        }

        self.now.set(target);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        self.pending.borrow_mut().push(ScheduledTask {
            due: self.now.get() + delay,
            seq,
            task,
        });
    }
}

/// One notification received by [`RecordingUi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Camera(CameraUi),
    Biometric(BiometricUi),
    Status(StatusKind, String),
    Error(ErrorNotice),
    Cleared,
}

/// UI surface that records every notification.
#[derive(Debug, Default)]
pub struct RecordingUi {
    events: RefCell<Vec<UiEvent>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.borrow().clone()
    }

    pub fn last_camera(&self) -> Option<CameraUi> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            UiEvent::Camera(c) => Some(*c),
            _ => None,
        })
    }

    pub fn last_biometric(&self) -> Option<BiometricUi> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            UiEvent::Biometric(b) => Some(*b),
            _ => None,
        })
    }

    /// Most recent status banner, unless a clear came after it.
    pub fn current_status(&self) -> Option<(StatusKind, String)> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            UiEvent::Status(kind, text) => Some(Some((*kind, text.clone()))),
            UiEvent::Cleared => Some(None),
            _ => None,
        })?
    }

    /// Most recent error banner, unless a clear came after it.
    pub fn current_error(&self) -> Option<ErrorNotice> {
        self.events.borrow().iter().rev().find_map(|e| match e {
            UiEvent::Error(notice) => Some(Some(notice.clone())),
            UiEvent::Cleared => Some(None),
            _ => None,
        })?
    }

    pub fn error_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, UiEvent::Error(_)))
            .count()
    }
}

impl UiSurface for RecordingUi {
    fn camera_changed(&self, state: CameraUi) {
        self.events.borrow_mut().push(UiEvent::Camera(state));
    }

    fn biometric_changed(&self, state: BiometricUi) {
        self.events.borrow_mut().push(UiEvent::Biometric(state));
    }

    fn show_status(&self, kind: StatusKind, text: &str) {
        self.events
            .borrow_mut()
            .push(UiEvent::Status(kind, text.to_string()));
    }

    fn show_error(&self, notice: &ErrorNotice) {
        self.events.borrow_mut().push(UiEvent::Error(notice.clone()));
    }

    fn clear_messages(&self) {
        self.events.borrow_mut().push(UiEvent::Cleared);
    }
}
