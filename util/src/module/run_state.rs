//! Module run state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt;
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

use log::debug;
use serde::Serialize;

use super::ModuleError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Describes the state of a hardware-owning module. Used to allow the
/// module's worker threads a chance to detect termination and exit gracefully
/// before they are abandoned.
///
/// States are ordered, and a module only ever moves forwards through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum ModuleRunState {
    /// The module is still being constructed. This state is used to prevent
    /// registration of new workers after the module has been built. For all
    /// other purposes it is equivalent to `Init`.
    New = 0,

    /// The module has been built but its owner has not entered the main loop.
    ///
    /// Workers may already be running (warm up, calibration) but must not use
    /// hardware devices, which are still being initialised by the owner.
    Init = 1,

    /// The owner is in its main loop. Workers should only interact with
    /// hardware in this state.
    Running = 2,

    /// The owner has begun shutting down. Workers have a limited amount of
    /// time to clean up before they are abandoned.
    Terminated = 3,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The owner's handle on a module run state.
///
/// Only the owner holds the cell and so only the owner may advance the
/// state. Workers are given read-only [`RunStateToken`]s.
#[derive(Debug)]
pub struct RunStateCell {
    module_name: String,
    state: Arc<AtomicU8>,
}

/// A read-only view of a module's run state, handed to worker threads.
#[derive(Debug, Clone)]
pub struct RunStateToken {
    state: Arc<AtomicU8>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleRunState {
    /// Has the module terminated?
    pub fn is_terminated(self) -> bool {
        self == ModuleRunState::Terminated
    }

    /// Is the module in the initialisation phase (`New` or `Init`)?
    pub fn is_in_init(self) -> bool {
        matches!(self, ModuleRunState::New | ModuleRunState::Init)
    }

    /// Is the module's owner in its main loop?
    pub fn is_running(self) -> bool {
        self == ModuleRunState::Running
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => ModuleRunState::New,
            1 => ModuleRunState::Init,
            2 => ModuleRunState::Running,
            _ => ModuleRunState::Terminated,
        }
    }
}

impl fmt::Display for ModuleRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModuleRunState::New => "NEW",
            ModuleRunState::Init => "INIT",
            ModuleRunState::Running => "RUNNING",
            ModuleRunState::Terminated => "TERMINATED",
        };
        f.write_str(s)
    }
}

impl RunStateCell {
    /// Create a new cell in the `New` state.
    pub fn new(module_name: &str) -> Self {
        Self::with_state(module_name, ModuleRunState::New)
    }

    /// Create a new cell in the given state.
    ///
    /// Modules which merge construction and initialisation start directly in
    /// `Init`.
    pub fn with_state(module_name: &str, state: ModuleRunState) -> Self {
        Self {
            module_name: module_name.to_string(),
            state: Arc::new(AtomicU8::new(state as u8)),
        }
    }

    /// Get the current state.
    pub fn load(&self) -> ModuleRunState {
        ModuleRunState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Get a read-only token for a worker.
    pub fn token(&self) -> RunStateToken {
        RunStateToken {
            state: self.state.clone(),
        }
    }

    /// Advance the state to `next`, returning the previous state.
    ///
    /// Advancing to the current state does nothing. Moving backwards is an
    /// error and leaves the state untouched. The new state is published with
    /// release ordering, so anything the owner did before the transition is
    /// visible to a worker which observes it.
    pub fn advance(&self, next: ModuleRunState) -> Result<ModuleRunState, ModuleError> {
        let mut current = self.state.load(Ordering::Acquire);

        loop {
            let from = ModuleRunState::from_u8(current);

            if from == next {
                return Ok(from);
            }
            if next < from {
                return Err(ModuleError::IllegalTransition {
                    module: self.module_name.clone(),
                    from,
                    to: next,
                });
            }

            match self.state.compare_exchange_weak(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    debug!("Module {} run state {} -> {}", self.module_name, from, next);
                    return Ok(from);
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl RunStateToken {
    /// Get the current state.
    pub fn state(&self) -> ModuleRunState {
        ModuleRunState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// See [`ModuleRunState::is_terminated`].
    pub fn is_terminated(&self) -> bool {
        self.state().is_terminated()
    }

    /// See [`ModuleRunState::is_in_init`].
    pub fn is_in_init(&self) -> bool {
        self.state().is_in_init()
    }

    /// See [`ModuleRunState::is_running`].
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
