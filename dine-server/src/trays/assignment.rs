//! Tray assignment
//!
//! Selection and placement use two different orderings: the oldest Pending
//! orders are *selected*, then *placed* smallest table number first.

use shared::models::{Order, TRAY_SLOT_COUNT, TrayAssignment, TraySlots};

/// At most one order per physical tray
pub const MAX_TRAY_ORDERS: usize = TRAY_SLOT_COUNT;

/// Place the selected orders onto the trays
///
/// `selected` must already be the oldest-first selection; only its first
/// [`MAX_TRAY_ORDERS`] entries are used.
pub fn assign(selected: &[Order]) -> TrayAssignment {
    TraySlots::place(
        selected
            .iter()
            .take(MAX_TRAY_ORDERS)
            .map(|order| order.table_number),
    )
    .into()
}
