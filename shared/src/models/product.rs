//! Product Record
//!
//! The slice of the catalog the checkout core needs: live price and
//! stock. Full catalog CRUD lives with the catalog collaborator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog entry as seen by checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    /// Units on hand; conditional decrements keep this >= 0
    pub stock: u32,
    /// Delisted products stay resident so old orders keep resolving
    pub available: bool,
}

/// Upsert payload for the catalog surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpsert {
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}
