//! Event runner
//!
//! Loads the applied state, lets the controller handle the event,
//! commits the resulting state and reports the final status. This is
//! the only place state is written.

use crate::controller::{Controller, Event, Transition};
use crate::state::StateStore;
use crate::status::{Disposition, StatusSink, UnitStatus};

/// Result of dispatching one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Final status, `None` when the event changed nothing
    pub status: Option<UnitStatus>,
    pub disposition: Disposition,
    /// Whether a new state was committed
    pub committed: bool,
}

impl Outcome {
    pub fn deferred(&self) -> bool {
        self.disposition == Disposition::Defer
    }
}

/// A unit: state store, controller and status sink wired together
pub struct Unit<'a> {
    store: &'a dyn StateStore,
    controller: Controller<'a>,
    status: &'a dyn StatusSink,
}

impl<'a> Unit<'a> {
    pub fn new(store: &'a dyn StateStore, controller: Controller<'a>, status: &'a dyn StatusSink) -> Self {
        Self {
            store,
            controller,
            status,
        }
    }

    /// Process one event to completion. Never fails; problems surface as
    /// a blocked status with a deferred disposition.
    pub fn dispatch(&self, event: &Event) -> Outcome {
        let _span = tracing::info_span!("dispatch", event = %event.kind).entered();

        let state = match self.store.load() {
            Ok(state) => state,
            Err(e) => return self.finish(state_store_failed(&e)),
        };

        let mut transition = self.controller.handle(&state, event);
        let mut committed = false;

        if let Some(next) = transition.next.take() {
            match self.store.commit(&next) {
                Ok(()) => committed = true,
                Err(e) => transition = state_store_failed(&e),
            }
        }

        Outcome {
            committed,
            ..self.finish(transition)
        }
    }

    fn finish(&self, transition: Transition) -> Outcome {
        if let Some(status) = &transition.status {
            self.status.report(status);
        }
        Outcome {
            status: transition.status,
            disposition: transition.disposition,
            committed: false,
        }
    }
}

fn state_store_failed(error: &crate::Error) -> Transition {
    tracing::error!(error = %error, "State store failed");
    Transition::defer(UnitStatus::blocked(format!("state store failed: {}", error)))
}
