//! Record shapes.

use serde::{Deserialize, Serialize};

/// A product record as exchanged with the remote store and the UI.
///
/// `Record` carries no sync metadata. `id` is empty for records the caller
/// has created but not yet handed to the repository; everywhere else it is
/// globally unique and stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Globally unique id. Empty only for not-yet-inserted records.
    pub id: String,
    /// Display name. Must be non-blank.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Unit price. Must be finite and non-negative.
    pub price: f64,
    /// Units in stock.
    pub quantity: u32,
    /// Category label used for grouping and rollups.
    pub category: String,
    /// URL of the product image, if any.
    pub image_url: String,
    /// Id of the owning principal.
    pub owner_id: String,
    /// Creation time, unix millis.
    pub created_at: i64,
}

impl Record {
    /// Creates a record with the given name and everything else defaulted.
    ///
    /// Mostly useful in tests and examples.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: String::new(),
            price: 0.0,
            quantity: 0,
            category: String::new(),
            image_url: String::new(),
            owner_id: String::new(),
            created_at: 0,
        }
    }
}

/// A product row as stored in the local table.
///
/// Superset of [`Record`] plus the sync bookkeeping fields. Invariants:
///
/// - `is_synced` is true iff the remote store holds an identical copy
/// - `is_deleted && is_synced` rows are eligible for physical removal;
///   `is_deleted && !is_synced` rows must survive until the remote delete
///   succeeds
/// - every local mutation clears `is_synced` and refreshes `updated_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalRecord {
    /// Primary key. Temporary `local_` id until the first successful push.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Unit price.
    pub price: f64,
    /// Units in stock.
    pub quantity: u32,
    /// Category label.
    pub category: String,
    /// URL of the product image, if any.
    pub image_url: String,
    /// Id of the owning principal.
    pub owner_id: String,
    /// Creation time, unix millis.
    pub created_at: i64,
    /// Last local mutation time, unix millis.
    pub updated_at: i64,
    /// True iff the remote copy matches this row.
    pub is_synced: bool,
    /// Soft-delete marker.
    pub is_deleted: bool,
    /// Time of the last push attempt, unix millis. 0 = never attempted.
    pub last_sync_attempt: i64,
    /// Message from the last failed push attempt. Empty = no error.
    pub sync_error: String,
}

impl LocalRecord {
    /// Stock value contributed by this row.
    #[must_use]
    pub fn stock_value(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    /// True for rows the sync engine still has to push (upsert or delete).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.is_synced
    }
}
