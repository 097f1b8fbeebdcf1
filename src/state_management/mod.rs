pub mod simulation_lifecycle;

pub use simulation_lifecycle::{SimulationLifecycle, SimulationState};
