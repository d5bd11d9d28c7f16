//! Typed tray / robot access on top of the tree

use async_trait::async_trait;
use serde_json::{Value, json};
use shared::models::robot::{self, RobotStatus, RobotUpdate, UltrasonicReadings};
use shared::models::tray::{self, TrayAssignment};

use super::RealtimeTree;
use crate::utils::AppResult;

/// 托盘状态存储抽象
///
/// 同步器只通过该 trait 写托盘状态，测试可注入失败的后端。
#[async_trait]
pub trait TrayStateStore: Send + Sync {
    /// 读取三个托盘和 trayCount
    async fn read_trays(&self) -> AppResult<TrayAssignment>;

    /// 一次写入 tray1/tray2/tray3/trayCount
    async fn write_tray_slots(&self, assignment: TrayAssignment) -> AppResult<()>;

    async fn read_served_signal(&self) -> AppResult<bool>;

    async fn write_served_signal(&self, served: bool) -> AppResult<()>;

    async fn read_has_served_flag(&self) -> AppResult<bool>;

    async fn write_has_served_flag(&self, has_served: bool) -> AppResult<()>;
}

/// Tray slot value; absent or malformed reads as empty
pub fn slot_value(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Boolean flag; anything but `true` reads as false
pub fn flag_value(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

impl RealtimeTree {
    fn read_slot(&self, path: &str) -> u32 {
        self.get(path).as_ref().map(slot_value).unwrap_or(0)
    }

    fn read_flag(&self, path: &str) -> bool {
        self.get(path).as_ref().map(flag_value).unwrap_or(false)
    }

    /// Current tray values as stored (trayCount is not recomputed)
    pub fn read_tray_assignment(&self) -> TrayAssignment {
        TrayAssignment {
            tray1: self.read_slot(tray::paths::TRAY1),
            tray2: self.read_slot(tray::paths::TRAY2),
            tray3: self.read_slot(tray::paths::TRAY3),
            tray_count: self.read_slot(tray::paths::TRAY_COUNT),
        }
    }

    pub fn write_tray_assignment(&self, assignment: TrayAssignment) {
        self.update([
            (tray::paths::TRAY1, json!(assignment.tray1)),
            (tray::paths::TRAY2, json!(assignment.tray2)),
            (tray::paths::TRAY3, json!(assignment.tray3)),
            (tray::paths::TRAY_COUNT, json!(assignment.tray_count)),
        ]);
    }

    /// Robot dashboard view
    pub fn read_robot_status(&self) -> RobotStatus {
        let battery = self
            .get(robot::paths::BATTERY)
            .and_then(|v| v.as_u64())
            .map(|level| level.min(100) as u8);
        let charging = self.read_flag(robot::paths::CHARGING);

        RobotStatus {
            served: self.read_flag(tray::paths::SERVED),
            has_served: self.read_flag(tray::paths::HAS_SERVED),
            emergency: self.read_flag(robot::paths::EMERGENCY),
            charging,
            battery,
            low_battery: RobotStatus::is_low_battery(battery, charging),
            ultrasonic: UltrasonicReadings {
                left: self.read_slot(robot::paths::ULTRASONIC_LEFT),
                center: self.read_slot(robot::paths::ULTRASONIC_CENTER),
                right: self.read_slot(robot::paths::ULTRASONIC_RIGHT),
            },
        }
    }

    /// Apply the flags present in the update
    pub fn write_robot_update(&self, update: &RobotUpdate) {
        let mut entries: Vec<(&str, Value)> = Vec::new();
        if let Some(has_served) = update.has_served {
            entries.push((tray::paths::HAS_SERVED, json!(has_served)));
        }
        if let Some(emergency) = update.emergency {
            entries.push((robot::paths::EMERGENCY, json!(emergency)));
        }
        if let Some(charging) = update.charging {
            entries.push((robot::paths::CHARGING, json!(charging)));
        }
        if let Some(battery) = update.battery {
            entries.push((robot::paths::BATTERY, json!(battery)));
        }
        self.update(entries);
    }

    pub fn write_ultrasonic(&self, readings: UltrasonicReadings) {
        self.update([
            (robot::paths::ULTRASONIC_LEFT, json!(readings.left)),
            (robot::paths::ULTRASONIC_CENTER, json!(readings.center)),
            (robot::paths::ULTRASONIC_RIGHT, json!(readings.right)),
        ]);
    }
}

#[async_trait]
impl TrayStateStore for RealtimeTree {
    async fn read_trays(&self) -> AppResult<TrayAssignment> {
        Ok(self.read_tray_assignment())
    }

    async fn write_tray_slots(&self, assignment: TrayAssignment) -> AppResult<()> {
        self.write_tray_assignment(assignment);
        Ok(())
    }

    async fn read_served_signal(&self) -> AppResult<bool> {
        Ok(self.read_flag(tray::paths::SERVED))
    }

    async fn write_served_signal(&self, served: bool) -> AppResult<()> {
        self.set(tray::paths::SERVED, served);
        Ok(())
    }

    async fn read_has_served_flag(&self) -> AppResult<bool> {
        Ok(self.read_flag(tray::paths::HAS_SERVED))
    }

    async fn write_has_served_flag(&self, has_served: bool) -> AppResult<()> {
        self.set(tray::paths::HAS_SERVED, has_served);
        Ok(())
    }
}
