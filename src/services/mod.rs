pub mod generator;
pub mod transmitter;

pub use generator::{generate_reading, generate_reading_at};
pub use transmitter::{HttpTransmitter, ReadingSink, TransmitOutcome};
