use std::sync::atomic::{AtomicBool, Ordering};

/// Shared state of one run.
///
/// `active` is the only thing the record loop looks at; it is polled once
/// per record. `finished` flips once the loop has fully wound down.
#[derive(Debug)]
pub struct RunState {
    active: AtomicBool,
    finished: AtomicBool,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    /// A fresh run, already active.
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
            finished: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Ask the loop to stop before its next record. Returns `true` if the
    /// run was still active.
    pub fn request_stop(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub(crate) fn mark_finished(&self) {
        self.active.store(false, Ordering::Release);
        self.finished.store(true, Ordering::Release);
    }

    /// Whether the loop is still winding, even if a stop was requested.
    pub fn is_running(&self) -> bool {
        !self.finished.load(Ordering::Acquire)
    }
}
