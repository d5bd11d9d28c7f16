//! Domain models shared by the server and its clients

pub mod cart;
pub mod order;
pub mod product;
pub mod robot;
pub mod tray;
pub mod user;

pub use cart::{CartAdd, CartEntry, CartLine, CheckoutRequest, MAX_PORTION_QTY, UNKNOWN_PRODUCT};
pub use order::{
    Order, OrderCreate, OrderEditOutcome, OrderItem, OrderItemQuantity, OrderItemView,
    OrderItemsUpdate, OrderQuery, OrderStatus, OrderView,
};
pub use product::{MAX_PORTION_PRICE, Product, ProductCreate};
pub use robot::{
    LOW_BATTERY_THRESHOLD, RobotStatus, RobotUpdate, ServedSignal, UltrasonicEdit,
    UltrasonicReadings,
};
pub use tray::{TRAY_SLOT_COUNT, TrayAssignment, TrayEdit, TraySlots, TrayView};
pub use user::{Admin, AdminLoginRequest, LoginRequest, User, UserCreate};
