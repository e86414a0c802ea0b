// Convert warehouse API rows to an Arrow RecordBatch
//
// Extracts the common movement fields into typed columns and JSON-encodes
// the full row into the attributes column. Missing or oddly-typed fields
// become nulls; a row never fails the whole batch.

use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, Float64Builder, RecordBatch, StringBuilder, TimestampMicrosecondBuilder,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::schema::{movement_snapshot_schema_arc, EXTRACTED_FIELDS};

/// Default capacity for builders when the expected row count is unknown
const DEFAULT_BUILDER_CAPACITY: usize = 1024;

/// Provenance recorded on every row of a converted batch.
#[derive(Debug, Clone)]
pub struct LoadContext {
    pub query_id: String,
    pub warehouse: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

impl LoadContext {
    pub fn new(query_id: &str, warehouse: Option<&str>, loaded_at: DateTime<Utc>) -> Self {
        Self {
            query_id: query_id.to_string(),
            warehouse: warehouse.map(str::to_string),
            loaded_at,
        }
    }
}

/// Converts JSON rows to an Arrow RecordBatch against the snapshot schema
pub struct RowConverter {
    document_number_builder: StringBuilder,
    material_code_builder: StringBuilder,
    material_description_builder: StringBuilder,
    movement_type_builder: StringBuilder,
    quantity_builder: Float64Builder,
    primary_uom_builder: StringBuilder,
    warehouse_code_builder: StringBuilder,
    transaction_date_builder: StringBuilder,
    loaded_at_builder: TimestampMicrosecondBuilder,
    query_id_builder: StringBuilder,
    source_warehouse_builder: StringBuilder,
    attributes_builder: StringBuilder,

    ctx: LoadContext,
    loaded_at_micros: i64,
    row_count: usize,
}

impl RowConverter {
    /// Create a converter with default capacity
    pub fn new(ctx: LoadContext) -> Self {
        Self::with_capacity(DEFAULT_BUILDER_CAPACITY, ctx)
    }

    /// Create a converter with a capacity hint
    pub fn with_capacity(capacity: usize, ctx: LoadContext) -> Self {
        let loaded_at_micros = ctx.loaded_at.timestamp_micros();
        Self {
            document_number_builder: StringBuilder::with_capacity(capacity, capacity * 16),
            material_code_builder: StringBuilder::with_capacity(capacity, capacity * 16),
            material_description_builder: StringBuilder::with_capacity(capacity, capacity * 48),
            movement_type_builder: StringBuilder::with_capacity(capacity, capacity * 8),
            quantity_builder: Float64Builder::with_capacity(capacity),
            primary_uom_builder: StringBuilder::with_capacity(capacity, capacity * 8),
            warehouse_code_builder: StringBuilder::with_capacity(capacity, capacity * 8),
            transaction_date_builder: StringBuilder::with_capacity(capacity, capacity * 24),
            loaded_at_builder: TimestampMicrosecondBuilder::with_capacity(capacity)
                .with_timezone("UTC"),
            query_id_builder: StringBuilder::with_capacity(capacity, capacity * 24),
            source_warehouse_builder: StringBuilder::with_capacity(capacity, capacity * 8),
            attributes_builder: StringBuilder::with_capacity(capacity, capacity * 512),
            ctx,
            loaded_at_micros,
            row_count: 0,
        }
    }

    /// Append one API row.
    pub fn add_row(&mut self, row: &Value) {
        self.document_number_builder
            .append_option(extract_string(row, "document_number"));
        self.material_code_builder
            .append_option(extract_string(row, "material_code"));
        self.material_description_builder
            .append_option(extract_string(row, "material_description"));
        self.movement_type_builder
            .append_option(extract_string(row, "movement_type"));
        self.quantity_builder
            .append_option(extract_number(row, "quantity"));
        self.primary_uom_builder
            .append_option(extract_string(row, "primary_uom"));
        self.warehouse_code_builder
            .append_option(extract_string(row, "warehouse_code"));
        self.transaction_date_builder
            .append_option(extract_string(row, "transaction_date"));

        self.loaded_at_builder.append_value(self.loaded_at_micros);
        self.query_id_builder.append_value(&self.ctx.query_id);
        self.source_warehouse_builder
            .append_option(self.ctx.warehouse.as_deref());
        self.attributes_builder
            .append_value(serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string()));

        self.row_count += 1;
    }

    /// Number of rows appended so far.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Finalize the batch.
    pub fn finish(mut self) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(self.document_number_builder.finish()),
            Arc::new(self.material_code_builder.finish()),
            Arc::new(self.material_description_builder.finish()),
            Arc::new(self.movement_type_builder.finish()),
            Arc::new(self.quantity_builder.finish()),
            Arc::new(self.primary_uom_builder.finish()),
            Arc::new(self.warehouse_code_builder.finish()),
            Arc::new(self.transaction_date_builder.finish()),
            Arc::new(self.loaded_at_builder.finish()),
            Arc::new(self.query_id_builder.finish()),
            Arc::new(self.source_warehouse_builder.finish()),
            Arc::new(self.attributes_builder.finish()),
        ];

        RecordBatch::try_new(movement_snapshot_schema_arc(), columns)
            .context("Failed to build snapshot RecordBatch")
    }
}

/// Look up the first candidate key present in the row, as a string.
fn extract_string(row: &Value, column: &str) -> Option<String> {
    let value = lookup(row, column)?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Look up the first candidate key present in the row, as a float.
fn extract_number(row: &Value, column: &str) -> Option<f64> {
    let value = lookup(row, column)?;
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lookup<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
    let obj = row.as_object()?;
    let (_, candidates) = EXTRACTED_FIELDS.iter().find(|(name, _)| *name == column)?;
    for key in candidates.iter() {
        match obj.get(*key) {
            Some(Value::Null) | None => continue,
            Some(v) => return Some(v),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, StringArray};
    use serde_json::json;

    fn test_ctx() -> LoadContext {
        LoadContext::new("goods_issues", Some("1145"), Utc::now())
    }

    #[test]
    fn test_extracts_prefixed_fields() {
        let mut converter = RowConverter::new(test_ctx());
        converter.add_row(&json!({
            "ctxn_document_number": "MV-001",
            "ctxn_movement_type": "261",
            "ctxn_primary_quantity": 12.5,
            "ctxn_primary_uom_code": "Und",
            "ctxn_warehouse_code": "1145",
            "ctxn_transaction_date": "2024-03-01T08:00:00"
        }));
        let batch = converter.finish().unwrap();

        assert_eq!(batch.num_rows(), 1);
        let docs = batch
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(docs.value(0), "MV-001");

        let qty = batch
            .column(4)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(qty.value(0), 12.5);
    }

    #[test]
    fn test_missing_fields_become_nulls() {
        let mut converter = RowConverter::new(test_ctx());
        converter.add_row(&json!({"unrelated": true}));
        let batch = converter.finish().unwrap();

        assert_eq!(batch.num_rows(), 1);
        assert!(batch.column(0).is_null(0));
        assert!(batch.column(4).is_null(0));
        // Metadata columns are still populated
        assert!(!batch.column(9).is_null(0));
        assert!(!batch.column(11).is_null(0));
    }

    #[test]
    fn test_numeric_strings_parse_as_quantity() {
        let mut converter = RowConverter::new(test_ctx());
        converter.add_row(&json!({"ctxn_primary_quantity": " 7.25 "}));
        let batch = converter.finish().unwrap();

        let qty = batch
            .column(4)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(qty.value(0), 7.25);
    }

    #[test]
    fn test_attributes_preserve_full_row() {
        let row = json!({"ctxn_document_number": "MV-002", "custom_field": 3});
        let mut converter = RowConverter::new(test_ctx());
        converter.add_row(&row);
        let batch = converter.finish().unwrap();

        let attrs = batch
            .column(11)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        let parsed: Value = serde_json::from_str(attrs.value(0)).unwrap();
        assert_eq!(parsed, row);
    }

    #[test]
    fn test_empty_converter_yields_empty_batch() {
        let batch = RowConverter::new(test_ctx()).finish().unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.schema(), movement_snapshot_schema_arc());
    }
}
