mod source;
mod sysfs;

pub use source::{
    BatterySource, ManualFeed, ManualSource, SampleReceiver, SampleSender, SourceError,
};
pub use sysfs::{SysfsSource, read_sample};
