//! Tray Model
//!
//! Three serving-tray slots on the robot. A slot holds either `0` (empty) or
//! the table number it is carrying; `trayCount` is always the number of
//! non-zero slots.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};
use crate::util::parse_non_negative;

/// Number of physical trays
pub const TRAY_SLOT_COUNT: usize = 3;

/// Realtime tree paths for tray state
pub mod paths {
    pub const TRAYS: &str = "trays";
    pub const TRAY1: &str = "trays/tray1";
    pub const TRAY2: &str = "trays/tray2";
    pub const TRAY3: &str = "trays/tray3";
    pub const TRAY_COUNT: &str = "trays/trayCount";
    /// Edge-triggered "robot just emptied all trays" command
    pub const SERVED: &str = "orders/served";
    /// Level flag "robot currently carrying at least one order"
    pub const HAS_SERVED: &str = "robot/has_served";

    /// Slot paths in tray order
    pub const SLOTS: [&str; super::TRAY_SLOT_COUNT] = [TRAY1, TRAY2, TRAY3];
}

/// Tray slot triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TraySlots {
    pub tray1: u32,
    pub tray2: u32,
    pub tray3: u32,
}

impl TraySlots {
    pub const EMPTY: TraySlots = TraySlots {
        tray1: 0,
        tray2: 0,
        tray3: 0,
    };

    pub fn from_array(values: [u32; TRAY_SLOT_COUNT]) -> Self {
        Self {
            tray1: values[0],
            tray2: values[1],
            tray3: values[2],
        }
    }

    pub fn as_array(&self) -> [u32; TRAY_SLOT_COUNT] {
        [self.tray1, self.tray2, self.tray3]
    }

    /// Replace one slot (0-based index)
    pub fn with_slot(mut self, index: usize, value: u32) -> Self {
        match index {
            0 => self.tray1 = value,
            1 => self.tray2 = value,
            2 => self.tray3 = value,
            _ => {}
        }
        self
    }

    /// Place table numbers into slots, smallest first.
    ///
    /// `0` is never a table; such values are skipped. At most
    /// [`TRAY_SLOT_COUNT`] tables are placed, remaining slots stay empty.
    pub fn place<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        let mut sorted: Vec<u32> = tables.into_iter().filter(|t| *t != 0).collect();
        sorted.sort_unstable();

        let mut slots = [0u32; TRAY_SLOT_COUNT];
        for (slot, table) in slots.iter_mut().zip(sorted) {
            *slot = table;
        }
        Self::from_array(slots)
    }

    /// Number of occupied slots
    pub fn tray_count(&self) -> u32 {
        self.as_array().iter().filter(|v| **v != 0).count() as u32
    }

    /// `has_served` predicate: at least one slot non-zero
    pub fn is_carrying(&self) -> bool {
        self.tray_count() > 0
    }

    pub fn is_full(&self) -> bool {
        self.tray_count() as usize == TRAY_SLOT_COUNT
    }
}

/// The four values written to the tree on every tray write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayAssignment {
    pub tray1: u32,
    pub tray2: u32,
    pub tray3: u32,
    pub tray_count: u32,
}

impl TrayAssignment {
    pub fn slots(&self) -> TraySlots {
        TraySlots {
            tray1: self.tray1,
            tray2: self.tray2,
            tray3: self.tray3,
        }
    }
}

impl From<TraySlots> for TrayAssignment {
    fn from(slots: TraySlots) -> Self {
        Self {
            tray1: slots.tray1,
            tray2: slots.tray2,
            tray3: slots.tray3,
            tray_count: slots.tray_count(),
        }
    }
}

/// Session-local observable tray state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayView {
    pub tray1: u32,
    pub tray2: u32,
    pub tray3: u32,
    pub tray_count: u32,
    /// A served-triggered repopulation is in progress
    pub loading: bool,
}

impl TrayView {
    pub fn slots(&self) -> TraySlots {
        TraySlots {
            tray1: self.tray1,
            tray2: self.tray2,
            tray3: self.tray3,
        }
    }
}

impl From<TrayAssignment> for TrayView {
    fn from(assignment: TrayAssignment) -> Self {
        Self {
            tray1: assignment.tray1,
            tray2: assignment.tray2,
            tray3: assignment.tray3,
            tray_count: assignment.tray_count,
            loading: false,
        }
    }
}

/// Admin manual tray edit, raw text as typed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrayEdit {
    pub tray1: String,
    pub tray2: String,
    pub tray3: String,
}

impl TrayEdit {
    /// Validate all three inputs; any non-numeric value rejects the whole edit
    pub fn parse(&self) -> Result<TraySlots, AppError> {
        let mut values = [0u32; TRAY_SLOT_COUNT];
        for (index, (field, raw)) in [
            ("tray1", &self.tray1),
            ("tray2", &self.tray2),
            ("tray3", &self.tray3),
        ]
        .into_iter()
        .enumerate()
        {
            values[index] = parse_non_negative(raw).ok_or_else(|| {
                AppError::new(ErrorCode::TrayValueInvalid)
                    .with_detail("field", field)
                    .with_detail("value", raw.as_str())
            })?;
        }
        Ok(TraySlots::from_array(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_sorts_ascending() {
        let slots = TraySlots::place([12, 5, 30]);
        assert_eq!(slots.as_array(), [5, 12, 30]);
        assert_eq!(slots.tray_count(), 3);
    }

    #[test]
    fn test_place_fills_remaining_with_zero() {
        let slots = TraySlots::place([7]);
        assert_eq!(slots, TraySlots { tray1: 7, tray2: 0, tray3: 0 });
        assert_eq!(slots.tray_count(), 1);

        assert_eq!(TraySlots::place(std::iter::empty()), TraySlots::EMPTY);
    }

    #[test]
    fn test_place_skips_zero_and_caps_at_three() {
        let slots = TraySlots::place([0, 9, 4, 8, 1]);
        assert_eq!(slots.as_array(), [1, 4, 8]);
    }

    #[test]
    fn test_count_matches_non_zero_slots() {
        let slots = TraySlots { tray1: 0, tray2: 9, tray3: 0 };
        assert_eq!(slots.tray_count(), 1);
        assert!(slots.is_carrying());
        assert!(!TraySlots::EMPTY.is_carrying());

        let assignment = TrayAssignment::from(slots);
        assert_eq!(assignment.tray_count, 1);
        assert_eq!(assignment.slots(), slots);
    }

    #[test]
    fn test_tray_edit_parse() {
        let edit = TrayEdit {
            tray1: "3".into(),
            tray2: " 0".into(),
            tray3: "11".into(),
        };
        assert_eq!(edit.parse().unwrap().as_array(), [3, 0, 11]);
    }

    #[test]
    fn test_tray_edit_rejects_non_numeric() {
        let edit = TrayEdit {
            tray1: "3".into(),
            tray2: "two".into(),
            tray3: "11".into(),
        };
        let err = edit.parse().unwrap_err();
        assert_eq!(err.code, ErrorCode::TrayValueInvalid);
        assert_eq!(err.details.unwrap().get("field").unwrap(), "tray2");

        let negative = TrayEdit {
            tray1: "-1".into(),
            tray2: "0".into(),
            tray3: "0".into(),
        };
        assert!(negative.parse().is_err());
    }
}
