//! Sensor and actuator channels
//!
//! The sensor delivers ASCII decimal samples one per line; the actuator
//! accepts single command bytes. Both are modelled as traits so the same
//! loops run against serial ports, recorded files and in-memory buffers.

mod actuator;
mod clock;
mod sensor;
pub mod serial;

pub use actuator::{CommandSink, WriterSink};
pub use clock::{Clock, SampleClock, SystemClock};
pub use sensor::{parse_sample, LineSensor, Reading, SampleSource, DEFAULT_MAX_READ_ERRORS};
