//! Concurrent modules
//!
//! A `ConcurrentModule` owns a set of worker threads which share its run
//! state. Workers are registered while the module is being constructed, are
//! spawned once it enters init, and are expected to poll their
//! [`WorkerContext`] at the top of each loop so they can exit cleanly once the
//! module is terminated.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use serde::Serialize;

use super::{Hardware, ModuleError, ModuleRunState, RunStateCell, RunStateToken};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period at which blocking helpers re-check the run state.
pub const STATE_POLL_PERIOD: Duration = Duration::from_millis(5);

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Result returned by a worker thread.
pub type WorkerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type WorkerFn = Box<dyn FnOnce(WorkerContext) -> WorkerResult + Send + 'static>;

/// A worker bound to its context, ready to run on a new thread.
type SpawnFn = Box<dyn FnOnce() -> WorkerResult + Send + 'static>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A module which owns worker threads.
pub struct ConcurrentModule {
    name: String,

    /// Time workers are given to exit after termination.
    grace_period: Duration,

    state: RunStateCell,

    /// Workers registered during construction, not yet spawned.
    pending: Vec<(String, WorkerFn)>,

    workers: Vec<(String, JoinHandle<WorkerResult>)>,
}

/// Everything a worker thread needs to follow its module's lifecycle.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    worker_name: String,
    token: RunStateToken,
}

/// The outcome of cleaning up a module's workers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    /// Workers which exited successfully.
    pub exited: Vec<String>,

    /// Workers which exited with an error or panicked, with a description.
    pub failed: Vec<(String, String)>,

    /// Workers which did not exit within the grace period and were abandoned.
    pub timed_out: Vec<String>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ConcurrentModule {
    /// Begin constructing a new module. The module is in the `New` state
    /// until [`ConcurrentModule::init`] is called.
    pub fn new(name: &str, grace_period: Duration) -> Self {
        Self {
            name: name.to_string(),
            grace_period,
            state: RunStateCell::new(name),
            pending: Vec::new(),
            workers: Vec::new(),
        }
    }

    /// Name of the module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current run state.
    pub fn state(&self) -> ModuleRunState {
        self.state.load()
    }

    /// A read-only token on this module's run state.
    pub fn token(&self) -> RunStateToken {
        self.state.token()
    }

    /// Wrap a device so that it is gated on this module's run state.
    pub fn hardware<T>(&self, device_name: &str, device: T) -> Arc<Hardware<T>> {
        Arc::new(Hardware::new(device_name, device, self.token()))
    }

    /// Register a worker to be spawned when the module enters init.
    ///
    /// Registration is only possible while the module is `New`.
    pub fn register_worker<F>(&mut self, worker_name: &str, worker: F) -> Result<(), ModuleError>
    where
        F: FnOnce(WorkerContext) -> WorkerResult + Send + 'static,
    {
        if self.state() != ModuleRunState::New {
            return Err(ModuleError::RegistrationClosed(self.name.clone()));
        }

        debug!("Module {} registered worker {}", self.name, worker_name);
        self.pending.push((worker_name.to_string(), Box::new(worker)));

        Ok(())
    }

    /// Finish construction, moving to `Init` and spawning all registered
    /// workers.
    ///
    /// A worker which fails to spawn does not stop the others from spawning.
    /// Every failure is logged and the first is returned. Workers which did
    /// spawn are joined by [`ConcurrentModule::cleanup`] as usual.
    pub fn init(&mut self) -> Result<(), ModuleError> {
        let module_name = self.name.clone();

        self.init_with(|worker_name, worker| {
            thread::Builder::new()
                .name(format!("{}/{}", module_name, worker_name))
                .spawn(worker)
        })
    }

    fn init_with<S>(&mut self, mut spawn: S) -> Result<(), ModuleError>
    where
        S: FnMut(&str, SpawnFn) -> io::Result<JoinHandle<WorkerResult>>,
    {
        self.state.advance(ModuleRunState::Init)?;

        let mut first_error = None;

        for (worker_name, worker) in std::mem::take(&mut self.pending) {
            let ctx = WorkerContext {
                worker_name: worker_name.clone(),
                token: self.state.token(),
            };

            match spawn(&worker_name, Box::new(move || worker(ctx))) {
                Ok(handle) => self.workers.push((worker_name, handle)),
                Err(e) => {
                    error!("Could not spawn worker {}/{}: {}", self.name, worker_name, e);

                    if first_error.is_none() {
                        first_error = Some(ModuleError::WorkerSpawnError(worker_name, e));
                    }
                }
            }
        }

        info!("Module {} initialised with {} worker(s)", self.name, self.workers.len());

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Move to `Running`, allowing workers to use hardware.
    ///
    /// If the module has not been initialised yet it is initialised first.
    pub fn start_threads(&mut self) -> Result<(), ModuleError> {
        if self.state() == ModuleRunState::New {
            self.init()?;
        }

        self.state.advance(ModuleRunState::Running)?;
        info!("Module {} running", self.name);

        Ok(())
    }

    /// Terminate the module and wait for its workers to exit.
    ///
    /// Workers are given the module's grace period in total. Any worker still
    /// alive after that is abandoned and listed in the report's `timed_out`.
    pub fn cleanup(&mut self) -> CleanupReport {
        // Advancing to terminated can't fail, it's the last state
        self.state.advance(ModuleRunState::Terminated).ok();
        self.pending.clear();

        let deadline = Instant::now() + self.grace_period;
        let mut report = CleanupReport::default();
        let mut remaining = std::mem::take(&mut self.workers);

        loop {
            let (finished, alive): (Vec<_>, Vec<_>) = remaining
                .into_iter()
                .partition(|(_, handle)| handle.is_finished());

            for (worker_name, handle) in finished {
                match handle.join() {
                    Ok(Ok(())) => report.exited.push(worker_name),
                    Ok(Err(e)) => {
                        warn!("Worker {}/{} exited with error: {}", self.name, worker_name, e);
                        report.failed.push((worker_name, e.to_string()));
                    }
                    Err(_) => {
                        error!("Worker {}/{} panicked", self.name, worker_name);
                        report.failed.push((worker_name, String::from("panicked")));
                    }
                }
            }

            remaining = alive;

            if remaining.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                for (worker_name, _) in remaining {
                    error!(
                        "Worker {}/{} did not exit within {:?}, abandoning it",
                        self.name, worker_name, self.grace_period
                    );
                    report.timed_out.push(worker_name);
                }
                break;
            }

            thread::sleep(STATE_POLL_PERIOD);
        }

        info!(
            "Module {} cleaned up: {} exited, {} failed, {} timed out",
            self.name,
            report.exited.len(),
            report.failed.len(),
            report.timed_out.len()
        );

        report
    }
}

impl Drop for ConcurrentModule {
    fn drop(&mut self) {
        if !self.workers.is_empty() || !self.state().is_terminated() {
            self.cleanup();
        }
    }
}

impl WorkerContext {
    /// Name of this worker.
    pub fn name(&self) -> &str {
        &self.worker_name
    }

    /// The worker's view of the module's run state.
    pub fn token(&self) -> &RunStateToken {
        &self.token
    }

    /// Current run state of the module.
    pub fn state(&self) -> ModuleRunState {
        self.token.state()
    }

    /// True once the module has been terminated and the worker should exit.
    pub fn should_exit(&self) -> bool {
        self.token.is_terminated()
    }

    /// Block until the module leaves init.
    ///
    /// Returns `true` if the module is now running, or `false` if it was
    /// terminated without ever running.
    pub fn wait_for_start(&self) -> bool {
        while self.token.is_in_init() {
            thread::sleep(STATE_POLL_PERIOD);
        }

        self.token.is_running()
    }

    /// Sleep for the given period, waking early if the module is terminated.
    ///
    /// Returns `false` if the module was terminated.
    pub fn sleep(&self, period: Duration) -> bool {
        let end = Instant::now() + period;

        loop {
            if self.should_exit() {
                return false;
            }

            let now = Instant::now();
            if now >= end {
                return true;
            }

            thread::sleep(STATE_POLL_PERIOD.min(end - now));
        }
    }
}

impl CleanupReport {
    /// True if every worker exited successfully within the grace period.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.timed_out.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::channel,
    };

    #[test]
    fn test_registration_closed_after_init() {
        let mut module = ConcurrentModule::new("test", Duration::from_millis(100));
        module.register_worker("noop", |_| Ok(())).unwrap();
        module.init().unwrap();

        assert_eq!(module.state(), ModuleRunState::Init);
        assert!(matches!(
            module.register_worker("late", |_| Ok(())),
            Err(ModuleError::RegistrationClosed(_))
        ));

        let report = module.cleanup();
        assert!(report.is_clean());
        assert_eq!(report.exited, vec![String::from("noop")]);
    }

    #[test]
    fn test_workers_follow_lifecycle() {
        let mut module = ConcurrentModule::new("test", Duration::from_secs(1));
        let (tx, rx) = channel();
        let ticks = Arc::new(AtomicUsize::new(0));

        let worker_ticks = ticks.clone();
        module
            .register_worker("ticker", move |ctx| {
                // Nothing should happen before start
                tx.send(ctx.state())?;

                if !ctx.wait_for_start() {
                    return Ok(());
                }
                tx.send(ctx.state())?;

                while !ctx.should_exit() {
                    worker_ticks.fetch_add(1, Ordering::Relaxed);
                    ctx.sleep(Duration::from_millis(1));
                }

                Ok(())
            })
            .unwrap();

        module.init().unwrap();
        assert!(rx.recv().unwrap().is_in_init());
        assert_eq!(ticks.load(Ordering::Relaxed), 0);

        module.start_threads().unwrap();
        assert_eq!(rx.recv().unwrap(), ModuleRunState::Running);

        thread::sleep(Duration::from_millis(20));
        let report = module.cleanup();

        assert!(report.is_clean());
        assert!(ticks.load(Ordering::Relaxed) > 0);
        assert_eq!(module.state(), ModuleRunState::Terminated);
    }

    #[test]
    fn test_terminated_before_start() {
        let mut module = ConcurrentModule::new("test", Duration::from_secs(1));
        let started = Arc::new(AtomicBool::new(false));

        let worker_started = started.clone();
        module
            .register_worker("never", move |ctx| {
                if ctx.wait_for_start() {
                    worker_started.store(true, Ordering::Relaxed);
                }
                Ok(())
            })
            .unwrap();
        module.init().unwrap();

        let report = module.cleanup();
        assert!(report.is_clean());
        assert!(!started.load(Ordering::Relaxed));
    }

    #[test]
    fn test_stuck_and_failing_workers() {
        let mut module = ConcurrentModule::new("test", Duration::from_millis(50));

        // Ignores termination for longer than the grace period
        module
            .register_worker("stuck", |_| {
                thread::sleep(Duration::from_millis(500));
                Ok(())
            })
            .unwrap();
        module
            .register_worker("failing", |_| Err("sensor fault".into()))
            .unwrap();

        module.start_threads().unwrap();
        let report = module.cleanup();

        assert!(!report.is_clean());
        assert_eq!(report.timed_out, vec![String::from("stuck")]);
        assert_eq!(
            report.failed,
            vec![(String::from("failing"), String::from("sensor fault"))]
        );
    }

    #[test]
    fn test_spawn_failure_still_spawns_other_workers() {
        let mut module = ConcurrentModule::new("test", Duration::from_secs(1));
        for worker_name in &["first", "broken", "last"] {
            module.register_worker(worker_name, |_| Ok(())).unwrap();
        }

        let result = module.init_with(|worker_name, worker| {
            if worker_name == "broken" {
                Err(io::Error::new(io::ErrorKind::Other, "out of threads"))
            } else {
                Ok(thread::spawn(worker))
            }
        });

        assert!(matches!(
            result,
            Err(ModuleError::WorkerSpawnError(name, _)) if name == "broken"
        ));
        assert_eq!(module.state(), ModuleRunState::Init);

        let mut report = module.cleanup();
        report.exited.sort();
        assert!(report.is_clean());
        assert_eq!(report.exited, vec![String::from("first"), String::from("last")]);
    }

    #[test]
    fn test_worker_uses_hardware_only_while_running() {
        let mut module = ConcurrentModule::new("test", Duration::from_secs(1));
        let motor = module.hardware("motor", 0u32);
        let (tx, rx) = channel();

        let worker_motor = motor.clone();
        module
            .register_worker("driver", move |ctx| {
                // Early use is refused
                tx.send(worker_motor.with(|m| *m += 1).is_err())?;

                if ctx.wait_for_start() {
                    while !ctx.should_exit() {
                        if worker_motor.with(|m| *m += 1).is_err() {
                            break;
                        }
                        ctx.sleep(Duration::from_millis(1));
                    }
                }
                Ok(())
            })
            .unwrap();

        module.init().unwrap();
        assert!(rx.recv().unwrap());

        module.start_threads().unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(module.cleanup().is_clean());

        let count = motor.initialise(|m| *m);
        assert!(count.is_err());
        assert!(motor.with(|m| *m).is_err());
    }
}
