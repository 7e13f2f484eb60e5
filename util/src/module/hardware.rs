//! Run-state gated hardware handles

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Mutex;

use super::{ModuleError, RunStateToken};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A hardware device owned by a module.
///
/// The device sits behind a mutex so that two workers can never drive it at
/// the same time, and every access is checked against the owning module's run
/// state: workers may only use the device while the module is running, and
/// the owner may only initialise it while the module is in init.
#[derive(Debug)]
pub struct Hardware<T> {
    name: String,
    token: RunStateToken,
    device: Mutex<T>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> Hardware<T> {
    /// Wrap a device, gating it on the given run state.
    pub fn new(name: &str, device: T, token: RunStateToken) -> Self {
        Self {
            name: name.to_string(),
            token,
            device: Mutex::new(device),
        }
    }

    /// Name of the device.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Use the device.
    ///
    /// Fails without touching the device unless the module is running. The
    /// state is checked again once the lock is held, in case the module was
    /// terminated while waiting for another worker.
    pub fn with<R, F>(&self, f: F) -> Result<R, ModuleError>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.check_running()?;

        let mut device = self
            .device
            .lock()
            .map_err(|_| ModuleError::HardwarePoisoned(self.name.clone()))?;

        self.check_running()?;

        Ok(f(&mut device))
    }

    /// Initialise the device from the owning context.
    ///
    /// Only allowed while the module is `New` or `Init`.
    pub fn initialise<R, F>(&self, f: F) -> Result<R, ModuleError>
    where
        F: FnOnce(&mut T) -> R,
    {
        let state = self.token.state();
        if !state.is_in_init() {
            return Err(ModuleError::HardwareNotInInit {
                device: self.name.clone(),
                state,
            });
        }

        let mut device = self
            .device
            .lock()
            .map_err(|_| ModuleError::HardwarePoisoned(self.name.clone()))?;

        Ok(f(&mut device))
    }

    fn check_running(&self) -> Result<(), ModuleError> {
        let state = self.token.state();
        if state.is_running() {
            Ok(())
        } else {
            Err(ModuleError::HardwareNotRunning {
                device: self.name.clone(),
                state,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
