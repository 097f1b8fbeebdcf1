pub mod isensor;
pub mod ireading;

pub use isensor::*;
pub use ireading::*;

use chrono::{Local, NaiveDateTime};

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
