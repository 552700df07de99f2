//! Pond models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pond owned by one user account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pond {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Unique per owner, not globally
    pub name: String,
    pub area_acres: Decimal,
}

impl std::fmt::Display for Pond {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} acres)", self.name, self.area_acres)
    }
}
