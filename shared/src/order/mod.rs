//! Order domain types shared between server and clients

pub mod cart;
pub mod event;
pub mod payment;
pub mod status;
pub mod types;

pub use cart::{Cart, CartItem};
pub use event::OrderEvent;
pub use payment::{Payment, PaymentHandle, PaymentMethod};
pub use status::{InvalidTransition, OrderStatus, PaymentStatus};
pub use types::{Order, OrderItem};
