//! Bidirectional transforms between [`Record`] and [`LocalRecord`].
//!
//! All functions here are pure apart from reading the clock and the RNG for
//! generated ids. The mapper never talks to a store.

use crate::{now_millis, LocalRecord, Record, LOCAL_ID_PREFIX};
use rand::Rng;

/// Widens a local row into a [`Record`], dropping the sync metadata.
#[must_use]
pub fn to_record(local: &LocalRecord) -> Record {
    Record {
        id: local.id.clone(),
        name: local.name.clone(),
        description: local.description.clone(),
        price: local.price,
        quantity: local.quantity,
        category: local.category.clone(),
        image_url: local.image_url.clone(),
        owner_id: local.owner_id.clone(),
        created_at: local.created_at,
    }
}

/// Narrows a [`Record`] into a fresh local row.
///
/// If `record.id` is empty a temporary local id is generated. A zero
/// `created_at` is replaced with the current time, so records pulled from
/// the remote keep their creation time while fresh local creations get one.
#[must_use]
pub fn to_local_record(record: &Record, is_synced: bool) -> LocalRecord {
    let now = now_millis();
    LocalRecord {
        id: if record.id.is_empty() {
            generate_local_id()
        } else {
            record.id.clone()
        },
        name: record.name.clone(),
        description: record.description.clone(),
        price: record.price,
        quantity: record.quantity,
        category: record.category.clone(),
        image_url: record.image_url.clone(),
        owner_id: record.owner_id.clone(),
        created_at: if record.created_at != 0 {
            record.created_at
        } else {
            now
        },
        updated_at: now,
        is_synced,
        is_deleted: false,
        last_sync_attempt: 0,
        sync_error: String::new(),
    }
}

/// Applies a caller update onto an existing local row.
///
/// Identity (`id`, `owner_id`, `created_at`) and the retry bookkeeping are
/// preserved; `is_synced` is forced off and `updated_at` refreshed so the
/// row becomes eligible for the next push.
#[must_use]
pub fn apply_update(existing: &LocalRecord, updated: &Record) -> LocalRecord {
    LocalRecord {
        name: updated.name.clone(),
        description: updated.description.clone(),
        price: updated.price,
        quantity: updated.quantity,
        category: updated.category.clone(),
        image_url: updated.image_url.clone(),
        updated_at: now_millis(),
        is_synced: false,
        ..existing.clone()
    }
}

/// Generates a temporary local id: `local_<millis>_<4-digit random>`.
///
/// The id must be unique within one device's table; timestamp plus a random
/// suffix is enough for that, and the prefix keeps it recognizable until
/// the first successful push assigns a remote id.
#[must_use]
pub fn generate_local_id() -> String {
    let suffix: u16 = rand::thread_rng().gen_range(1000..10000);
    format!("{}{}_{}", LOCAL_ID_PREFIX, now_millis(), suffix)
}
