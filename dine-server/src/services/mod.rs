//! 业务服务
//!
//! - [`CheckoutService`] - 购物车结账 + 托盘补位
//! - [`order_view`] - 订单视图 (关联用户名与菜品名)

pub mod checkout;
pub mod order_view;

pub use checkout::CheckoutService;
pub use order_view::{UNKNOWN_FOOD, UNKNOWN_USER, render_orders};
