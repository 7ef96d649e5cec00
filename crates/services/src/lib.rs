pub mod auth;
pub mod cart;
pub mod order;
pub mod payment;
pub mod types;

pub use types::{CartItemId, OrderId, PaymentId, ServiceOrderId, SessionId, UserId};
