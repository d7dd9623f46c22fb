//! Checkout types: addresses, shipping options, orders.

mod address;
mod order;
mod shipping;

pub use address::Address;
pub use order::{Order, OrderItem, OrderNote, OrderStatus, PaymentStatus, ShippingStatus, TaxRate};
pub use shipping::ShippingOption;
