//! Module lifecycle interfaces
//!
//! Every module which owns hardware and runs its own worker threads shares a
//! `ModuleRunState` with those workers. The owning context drives the state
//! forwards through `New -> Init -> Running -> Terminated`, and the workers
//! poll it at the top of each of their loops to decide whether they may touch
//! hardware, or whether they should exit.
//!
//! - [`run_state`]: the state itself and the atomically published cell/token
//!   pair used to share it.
//! - [`concurrent`]: a module which owns a set of worker threads.
//! - [`hardware`]: a device handle which can only be used while the owning
//!   module is running.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod concurrent;
pub mod hardware;
pub mod run_state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use concurrent::{CleanupReport, ConcurrentModule, WorkerContext, WorkerResult};
pub use hardware::Hardware;
pub use run_state::{ModuleRunState, RunStateCell, RunStateToken};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while managing a module's lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Module {module} cannot move from {from} to {to}, run states only move forwards")]
    IllegalTransition {
        module: String,
        from: ModuleRunState,
        to: ModuleRunState,
    },

    #[error("Module {0} has already been constructed, workers can no longer be registered")]
    RegistrationClosed(String),

    #[error("Could not spawn worker {0}: {1}")]
    WorkerSpawnError(String, std::io::Error),

    #[error("Hardware {device} can only be used while the module is running (module is {state})")]
    HardwareNotRunning {
        device: String,
        state: ModuleRunState,
    },

    #[error("Hardware {device} can only be initialised while the module is in init (module is {state})")]
    HardwareNotInInit {
        device: String,
        state: ModuleRunState,
    },

    #[error("Hardware {0} lock is poisoned, a worker panicked while using it")]
    HardwarePoisoned(String),
}
