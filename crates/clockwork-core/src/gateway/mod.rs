//! External control and status surfaces: the signal file going in, the
//! status file going out.

mod signal;
mod status;

pub use signal::{Command, SignalChannel};
pub use status::{StatusClass, StatusPublisher, StatusRecord};
