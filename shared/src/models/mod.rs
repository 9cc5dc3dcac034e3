//! Shared entity models

pub mod product;
pub mod role;

pub use product::{ProductRecord, ProductUpsert};
pub use role::Role;
