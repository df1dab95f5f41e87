use super::{Invocation, ProcessRunner};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Process runner that records invocations instead of spawning processes.
///
/// Exit codes are handed out from a queue; once the queue is empty every
/// further call returns the default exit code.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    default_exit_code: i32,
    exit_codes: Mutex<VecDeque<i32>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl RecordingRunner {
    pub fn new(default_exit_code: i32) -> Self {
        Self {
            default_exit_code,
            ..Self::default()
        }
    }

    /// Runner where every call succeeds
    pub fn succeeding() -> Self {
        Self::new(0)
    }

    /// Return `exit_codes` in order before falling back to the default
    pub fn with_exit_codes(mut self, exit_codes: impl IntoIterator<Item = i32>) -> Self {
        self.exit_codes = Mutex::new(exit_codes.into_iter().collect());
        self
    }

    /// Snapshot of all recorded invocations, in call order
    pub fn invocations(&self) -> Vec<Invocation> {
        lock(&self.invocations).clone()
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        lock(&self.invocations).last().cloned()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.invocations).len()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<i32> {
        lock(&self.invocations).push(invocation.clone());
        let code = lock(&self.exit_codes)
            .pop_front()
            .unwrap_or(self.default_exit_code);
        Ok(code)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
