pub mod simulator;

pub use simulator::{SimulationHandle, Simulator};
