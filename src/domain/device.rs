// Hardware device status snapshot
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Paired,
}

impl DeviceStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(DeviceStatus::Online),
            "offline" => Some(DeviceStatus::Offline),
            "paired" => Some(DeviceStatus::Paired),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
            DeviceStatus::Paired => "paired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareDevice {
    pub id: String,
    pub alias: String,
    pub serial: String,
    pub status: DeviceStatus,
}
