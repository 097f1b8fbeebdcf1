use std::sync::atomic::{AtomicU8, Ordering};
use tracing::info;
use crate::errors::{SimulatorError, SimulatorResult};

const STOPPED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPING: u8 = 2;

/// The states a simulation goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Stopped,
    Running,
    /// A stop was requested but the loop has not exited yet
    Stopping,
}

/// Tracks whether a simulation loop is running.
///
/// The loop reads the state once per pass, so a stop request takes effect at the next check and
/// never interrupts a pass or a sleep already under way. Until the loop reports that it has exited
/// the lifecycle stays in `Stopping` and refuses a new start.
#[derive(Debug)]
pub struct SimulationLifecycle {
    state: AtomicU8,
}

impl Default for SimulationLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationLifecycle {
    /// Creates a lifecycle in the `Stopped` state.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(STOPPED),
        }
    }

    /// Moves from `Stopped` to `Running`.
    ///
    /// # Returns
    ///
    /// `Err(SimulatorError::AlreadyRunning)` if a loop still owns this lifecycle, including one that
    /// was asked to stop but has not exited yet.
    pub fn start(&self) -> SimulatorResult<()> {
        self.state
            .compare_exchange(STOPPED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| SimulatorError::AlreadyRunning)
    }

    /// Requests a stop. Idempotent.
    pub fn stop(&self) {
        if self.state
            .compare_exchange(RUNNING, STOPPING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Stop requested; the simulation ends at its next check");
        }
    }

    /// Marks the loop as exited, whatever state it was in.
    pub fn finish(&self) {
        self.state.store(STOPPED, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.state() == SimulationState::Running
    }

    pub fn state(&self) -> SimulationState {
        match self.state.load(Ordering::SeqCst) {
            RUNNING => SimulationState::Running,
            STOPPING => SimulationState::Stopping,
            _ => SimulationState::Stopped,
        }
    }
}
