mod runner;
mod session;
mod timer;

pub use runner::{
    ChargingMonitor, FEED_CLOSED_TOAST, MonitorCommand, MonitorError, MonitorHandle,
    PERMISSION_DENIED_TOAST,
};
pub use session::{ArmTicket, ChargingSession, SampleOutcome};
pub use timer::{TimerEvent, Timers};
pub use crate::types::{MonitorState, MonitorStatus};
