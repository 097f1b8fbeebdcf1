use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::errors::SimulatorResult;
use crate::models::{default_sensors, Sensor};
use crate::services::{generate_reading, HttpTransmitter, ReadingSink, TransmitOutcome};
use crate::state_management::{SimulationLifecycle, SimulationState};

/// Drives the generate-and-send loop over a fixed list of sensors
#[derive(Clone)]
pub struct Simulator {
    /// Sensors in the order they are visited on every tick
    sensors: Arc<Vec<Sensor>>,
    /// Where each generated reading goes
    sink: Arc<dyn ReadingSink>,
    /// Sleep between two passes
    interval: Duration,
    lifecycle: Arc<SimulationLifecycle>,
}

impl Simulator {
    /// Creates a stopped simulator
    ///
    /// # Arguments
    ///
    /// * `sensors`: The fleet to simulate, visited in this order on every tick
    /// * `sink`: The destination for readings, usually an `HttpTransmitter`
    /// * `interval`: The pause after each full pass
    pub fn new(sensors: Vec<Sensor>, sink: Arc<dyn ReadingSink>, interval: Duration) -> Self {
        info!("Initializing simulator with {} sensors", sensors.len());
        for sensor in &sensors {
            debug!("{} '{}' at {}: crop {} ({}), soil {}",
                sensor.id, sensor.name, sensor.location.name, sensor.crop(), sensor.crop_type, sensor.soil_type);
        }
        Self {
            sensors: Arc::new(sensors),
            sink,
            interval,
            lifecycle: Arc::new(SimulationLifecycle::new()),
        }
    }

    /// Builds the default sensor fleet posting to the configured endpoint
    pub fn from_settings(settings: &Settings) -> SimulatorResult<Self> {
        let transmitter = HttpTransmitter::from_settings(&settings.simulator)?;
        Ok(Self::new(
            default_sensors(),
            Arc::new(transmitter),
            settings.simulator.interval(),
        ))
    }

    /// Replaces the lifecycle so that other components can observe or stop this simulator
    pub fn with_lifecycle(mut self, lifecycle: Arc<SimulationLifecycle>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn lifecycle(&self) -> Arc<SimulationLifecycle> {
        Arc::clone(&self.lifecycle)
    }

    pub fn state(&self) -> SimulationState {
        self.lifecycle.state()
    }

    /// Requests a stop; see `SimulationLifecycle::stop`
    pub fn stop(&self) {
        self.lifecycle.stop();
    }

    /// Generates and sends one reading per sensor, strictly in list order
    ///
    /// # Returns
    ///
    /// One outcome per sensor. Failed sends are logged and returned, never raised.
    pub async fn run_tick(&self) -> Vec<TransmitOutcome> {
        let mut outcomes = Vec::with_capacity(self.sensors.len());
        for sensor in self.sensors.iter() {
            let reading = generate_reading(sensor);
            let outcome = self.sink.send(&reading).await;
            if outcome.is_delivered() {
                info!("{}", outcome);
            } else {
                error!("{}", outcome);
            }
            outcomes.push(outcome);
        }

        let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
        debug!("Tick completed: {} delivered, {} failed", delivered, outcomes.len() - delivered);
        outcomes
    }

    /// Runs the loop on the current task until a stop is requested
    ///
    /// # Returns
    ///
    /// * `Ok(())` once the loop observes the stop
    /// * `Err(SimulatorError::AlreadyRunning)` if this simulator is already running
    pub async fn run(&self) -> SimulatorResult<()> {
        self.lifecycle.start()?;
        let _active = ActiveLoop(self.lifecycle());
        self.run_loop().await;
        Ok(())
    }

    /// Runs the loop on a spawned task and returns immediately
    ///
    /// The simulator is `Running` by the time this returns, so a `stop` on the handle can never be lost.
    pub fn spawn(&self) -> SimulatorResult<SimulationHandle> {
        self.lifecycle.start()?;
        let active = ActiveLoop(self.lifecycle());
        let simulator = self.clone();
        let task = tokio::spawn(async move {
            let _active = active;
            simulator.run_loop().await;
        });
        Ok(SimulationHandle {
            lifecycle: self.lifecycle(),
            task,
        })
    }

    async fn run_loop(&self) {
        info!("🚀 Simulation started (interval: {:?})", self.interval);
        info!("{}", "=".repeat(50));

        while self.lifecycle.is_running() {
            self.run_tick().await;
            tokio::time::sleep(self.interval).await;
        }

        info!("Simulation loop exited");
    }
}

/// Returns the lifecycle to `Stopped` once the loop that owns it is gone, including when its
/// future is dropped mid-pass.
struct ActiveLoop(Arc<SimulationLifecycle>);

impl Drop for ActiveLoop {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Handle to a simulation running on a background task
pub struct SimulationHandle {
    lifecycle: Arc<SimulationLifecycle>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    /// Requests a stop; the task finishes its current pass and sleep first
    pub fn stop(&self) {
        self.lifecycle.stop();
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Waits for the background task to finish
    pub async fn wait(self) -> SimulatorResult<()> {
        self.task.await?;
        Ok(())
    }

    /// Requests a stop and waits for the task to observe it
    pub async fn shutdown(self) -> SimulatorResult<()> {
        self.stop();
        self.wait().await
    }
}
