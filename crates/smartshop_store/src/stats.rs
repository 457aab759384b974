//! Aggregate inventory statistics.

use smartshop_model::LocalRecord;
use std::collections::BTreeMap;

/// Quantity below which a stocked product counts as low-stock.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// Inventory-wide aggregates over non-deleted rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryStats {
    /// Number of live (non-deleted) records.
    pub total_records: usize,
    /// Sum of `price * quantity` over live records.
    pub total_stock_value: f64,
    /// Sum of quantities over live records.
    pub total_quantity: u64,
    /// Records with `0 < quantity < LOW_STOCK_THRESHOLD`.
    pub low_stock_count: usize,
    /// Records with `quantity == 0`.
    pub out_of_stock_count: usize,
}

impl InventoryStats {
    /// Collects aggregates over an iterator of live rows.
    ///
    /// Callers are expected to have filtered out soft-deleted rows.
    pub fn collect<'a>(rows: impl Iterator<Item = &'a LocalRecord>) -> Self {
        let mut stats = Self::default();
        for row in rows {
            stats.total_records += 1;
            stats.total_stock_value += row.stock_value();
            stats.total_quantity += u64::from(row.quantity);
            if row.quantity == 0 {
                stats.out_of_stock_count += 1;
            } else if row.quantity < LOW_STOCK_THRESHOLD {
                stats.low_stock_count += 1;
            }
        }
        stats
    }
}

/// Per-category rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStat {
    /// Category label.
    pub category: String,
    /// Number of live records in the category.
    pub count: usize,
    /// Stock value of the category.
    pub value: f64,
}

/// Groups live rows by category, sorted by stock value descending.
pub fn category_rollup<'a>(rows: impl Iterator<Item = &'a LocalRecord>) -> Vec<CategoryStat> {
    let mut grouped: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for row in rows {
        let entry = grouped.entry(row.category.as_str()).or_default();
        entry.0 += 1;
        entry.1 += row.stock_value();
    }

    let mut rollup: Vec<CategoryStat> = grouped
        .into_iter()
        .map(|(category, (count, value))| CategoryStat {
            category: category.to_string(),
            count,
            value,
        })
        .collect();
    rollup.sort_by(|a, b| b.value.total_cmp(&a.value));
    rollup
}
