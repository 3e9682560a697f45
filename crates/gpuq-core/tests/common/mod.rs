//! Shared fake-device harness for the lifecycle tests.
//!
//! `FakeDevice` models the asynchronous hardware side: submissions are
//! recorded, and a test (or a completer thread) advances the completed
//! counter explicitly. `wait` blocks on a condvar exactly like a real
//! driver wait would block the calling thread.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use gpuq_core::{
    CompletionToken, ContextDesc, DeviceHandle, QueueBackend, QueueError, QueueHandle, UnitFactory,
};

#[derive(Default)]
struct DeviceState {
    completed: u64,
    submissions: Vec<u64>,
    destroyed: Vec<&'static str>,
    lost: bool,
    reject_next_submit: bool,
}

/// The device side, shared between the backend and the test body.
pub struct FakeDevice {
    state: Mutex<DeviceState>,
    signal: Condvar,
}

impl FakeDevice {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(DeviceState::default()),
            signal: Condvar::new(),
        })
    }

    /// Report everything up to `token` as finished and wake any waiter.
    pub fn complete_up_to(&self, token: u64) {
        let mut state = self.state.lock();
        state.completed = state.completed.max(token);
        self.signal.notify_all();
    }

    /// Report every submission so far as finished.
    pub fn complete_all(&self) {
        let mut state = self.state.lock();
        if let Some(&last) = state.submissions.last() {
            state.completed = state.completed.max(last);
        }
        self.signal.notify_all();
    }

    /// Simulate device loss; waiters are woken and fail.
    pub fn mark_lost(&self) {
        let mut state = self.state.lock();
        state.lost = true;
        self.signal.notify_all();
    }

    /// Make the next submission come back rejected.
    pub fn reject_next_submit(&self) {
        self.state.lock().reject_next_submit = true;
    }

    /// Tokens submitted so far, in submission order.
    pub fn submissions(&self) -> Vec<u64> {
        self.state.lock().submissions.clone()
    }

    /// Objects destroyed so far, in destruction order.
    pub fn destroyed(&self) -> Vec<&'static str> {
        self.state.lock().destroyed.clone()
    }
}

/// Queue backend over a [`FakeDevice`].
pub struct FakeBackend {
    device: Arc<FakeDevice>,
}

impl FakeBackend {
    pub fn new(device: Arc<FakeDevice>) -> Self {
        Self { device }
    }
}

impl QueueBackend for FakeBackend {
    type Unit = FakeUnit;
    type Resource = &'static str;
    type Factory = FakeFactory;

    fn submit(&mut self, unit: &mut FakeUnit, signal: CompletionToken) -> Result<(), QueueError> {
        let mut state = self.device.state.lock();
        if state.lost {
            return Err(QueueError::DeviceLost);
        }
        if state.reject_next_submit {
            state.reject_next_submit = false;
            return Err(QueueError::Submission("rejected by fake device".into()));
        }
        state.submissions.push(signal.value());
        unit.submissions += 1;
        Ok(())
    }

    fn completed(&mut self) -> Result<CompletionToken, QueueError> {
        let state = self.device.state.lock();
        if state.lost {
            return Err(QueueError::DeviceLost);
        }
        Ok(CompletionToken::new(state.completed))
    }

    fn wait(&mut self, token: CompletionToken) -> Result<(), QueueError> {
        let mut state = self.device.state.lock();
        while state.completed < token.value() && !state.lost {
            self.device.signal.wait(&mut state);
        }
        if state.lost {
            return Err(QueueError::DeviceLost);
        }
        Ok(())
    }

    fn destroy(&mut self, resource: &'static str) -> Result<(), QueueError> {
        let mut state = self.device.state.lock();
        if state.lost {
            return Err(QueueError::DeviceLost);
        }
        state.destroyed.push(resource);
        Ok(())
    }
}

/// An execution unit with a stable identity for reuse assertions.
#[derive(Debug, PartialEq, Eq)]
pub struct FakeUnit {
    pub id: u32,
    pub resets: u32,
    pub submissions: u32,
}

/// Factory call counts, shared with the test body.
#[derive(Debug, Default)]
pub struct FactoryStats {
    pub allocated: u32,
    pub resets: u32,
    pub released: u32,
}

pub struct FakeFactory {
    stats: Arc<Mutex<FactoryStats>>,
    next_id: u32,
}

impl FakeFactory {
    pub fn new() -> (Self, Arc<Mutex<FactoryStats>>) {
        let stats = Arc::new(Mutex::new(FactoryStats::default()));
        (
            Self {
                stats: stats.clone(),
                next_id: 1,
            },
            stats,
        )
    }
}

impl UnitFactory for FakeFactory {
    type Unit = FakeUnit;

    fn allocate(&mut self) -> Result<FakeUnit, QueueError> {
        self.stats.lock().allocated += 1;
        let id = self.next_id;
        self.next_id += 1;
        Ok(FakeUnit {
            id,
            resets: 0,
            submissions: 0,
        })
    }

    fn reset(&mut self, unit: &mut FakeUnit) -> Result<(), QueueError> {
        self.stats.lock().resets += 1;
        unit.resets += 1;
        Ok(())
    }

    fn release(&mut self, _unit: FakeUnit) {
        self.stats.lock().released += 1;
    }
}

/// A valid context description for tests.
pub fn desc() -> ContextDesc {
    ContextDesc {
        device: DeviceHandle(0x1000),
        queue: QueueHandle(0x2000),
        node_mask: 1,
    }
}
