//! Robot Model
//!
//! Flags and sensor readings published by (or for) the delivery robot.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::util::parse_non_negative;

/// Battery percentage below which the dashboard raises a warning
pub const LOW_BATTERY_THRESHOLD: u8 = 20;

/// Realtime tree paths for robot state
pub mod paths {
    pub const EMERGENCY: &str = "robot/emergency";
    pub const CHARGING: &str = "robot/charging";
    pub const BATTERY: &str = "robot/battery";
    pub const ULTRASONIC_LEFT: &str = "ultrasonic/left";
    pub const ULTRASONIC_CENTER: &str = "ultrasonic/center";
    pub const ULTRASONIC_RIGHT: &str = "ultrasonic/right";
}

/// Ultrasonic distance readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UltrasonicReadings {
    pub left: u32,
    pub center: u32,
    pub right: u32,
}

/// Robot status as shown on the admin dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotStatus {
    /// Pending "trays emptied" signal
    pub served: bool,
    /// Robot currently carrying at least one order
    pub has_served: bool,
    pub emergency: bool,
    pub charging: bool,
    /// Percentage, absent until the robot first reports
    pub battery: Option<u8>,
    pub low_battery: bool,
    pub ultrasonic: UltrasonicReadings,
}

impl RobotStatus {
    /// Battery below threshold while not charging
    pub fn is_low_battery(battery: Option<u8>, charging: bool) -> bool {
        !charging && battery.is_some_and(|level| level < LOW_BATTERY_THRESHOLD)
    }
}

/// Partial robot flag update from the control panel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotUpdate {
    pub has_served: Option<bool>,
    pub emergency: Option<bool>,
    pub charging: Option<bool>,
    pub battery: Option<u8>,
}

impl RobotUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(level) = self.battery.filter(|level| *level > 100) {
            return Err(AppError::new(ErrorCode::ValueOutOfRange)
                .with_detail("field", "battery")
                .with_detail("value", level));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.has_served.is_none()
            && self.emergency.is_none()
            && self.charging.is_none()
            && self.battery.is_none()
    }
}

/// "Robot emptied its trays" signal body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServedSignal {
    pub served: bool,
}

/// Ultrasonic edit, raw text as typed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UltrasonicEdit {
    pub left: String,
    pub center: String,
    pub right: String,
}

impl UltrasonicEdit {
    pub fn parse(&self) -> Result<UltrasonicReadings, AppError> {
        let read = |field: &str, raw: &str| {
            parse_non_negative(raw).ok_or_else(|| {
                AppError::new(ErrorCode::SensorValueInvalid)
                    .with_detail("field", field)
                    .with_detail("value", raw)
            })
        };
        Ok(UltrasonicReadings {
            left: read("left", &self.left)?,
            center: read("center", &self.center)?,
            right: read("right", &self.right)?,
        })
    }
}
