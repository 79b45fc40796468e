//! In-memory [`StateStore`].

use std::cell::{Cell, RefCell};

use tsdb_core::{AppliedState, Error, Result, StateStore};

/// Keeps the applied state in memory and counts commits.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: RefCell<AppliedState>,
    commits: Cell<usize>,
    fail_commits: Cell<bool>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state
    pub fn with_state(state: AppliedState) -> Self {
        Self {
            state: RefCell::new(state),
            ..Self::default()
        }
    }

    /// Snapshot of the stored state
    pub fn state(&self) -> AppliedState {
        self.state.borrow().clone()
    }

    /// Number of successful commits
    pub fn commits(&self) -> usize {
        self.commits.get()
    }

    /// Make every subsequent commit fail
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.set(fail);
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<AppliedState> {
        Ok(self.state())
    }

    fn commit(&self, state: &AppliedState) -> Result<()> {
        if self.fail_commits.get() {
            return Err(Error::StateCorrupt {
                path: "memory".into(),
                message: "simulated commit failure".into(),
            });
        }
        *self.state.borrow_mut() = state.clone();
        self.commits.set(self.commits.get() + 1);
        Ok(())
    }
}
