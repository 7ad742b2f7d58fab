mod reading;
mod status;

pub use reading::SensorReading;
pub use status::{
    ChipInfo, Connectivity, DeviceStatusSnapshot, FlashInfo, HardwareInfo, MemoryInfo, PsramInfo,
    SensorConfig, SensorStatus, SystemInfo,
};
