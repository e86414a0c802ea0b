// Arrow schema for warehouse movement snapshots
//
// Common movement fields are extracted to dedicated columns; the full source
// row is preserved as a JSON-encoded attributes column so the snapshot loses
// nothing the upstream API returned.

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::sync::{Arc, OnceLock};

/// Returns the Arrow schema shared by all entity snapshots
pub fn movement_snapshot_schema() -> Schema {
    Schema::new(vec![
        // Extracted movement fields
        Field::new("document_number", DataType::Utf8, true),
        Field::new("material_code", DataType::Utf8, true),
        Field::new("material_description", DataType::Utf8, true),
        Field::new("movement_type", DataType::Utf8, true),
        Field::new("quantity", DataType::Float64, true),
        Field::new("primary_uom", DataType::Utf8, true),
        Field::new("warehouse_code", DataType::Utf8, true),
        // Raw API value, not normalized to a timestamp type
        Field::new("transaction_date", DataType::Utf8, true),
        // Load metadata
        Field::new(
            "loaded_at",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        Field::new("query_id", DataType::Utf8, false),
        Field::new("source_warehouse", DataType::Utf8, true),
        // Full source row as JSON
        Field::new("attributes", DataType::Utf8, false),
    ])
}

/// Shared Arc'd schema (cached)
pub fn movement_snapshot_schema_arc() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| Arc::new(movement_snapshot_schema()))
        .clone()
}

/// Candidate source keys for each extracted column, tried in order.
///
/// The MaterialTransactions views prefix every field with `ctxn_`; the bare
/// names cover other list views that share the movement shape.
pub const EXTRACTED_FIELDS: &[(&str, &[&str])] = &[
    ("document_number", &["ctxn_document_number", "document_number"]),
    ("material_code", &["ctxn_material_code", "material_code"]),
    (
        "material_description",
        &["ctxn_material_description", "material_description"],
    ),
    ("movement_type", &["ctxn_movement_type", "movement_type"]),
    (
        "quantity",
        &["ctxn_primary_quantity", "ctxn_quantity", "quantity"],
    ),
    (
        "primary_uom",
        &["ctxn_primary_uom_code", "primary_uom_code", "primary_uom"],
    ),
    ("warehouse_code", &["ctxn_warehouse_code", "warehouse_code"]),
    (
        "transaction_date",
        &["ctxn_transaction_date", "transaction_date"],
    ),
];
