//! Tabular export of flattened instances.
//!
//! Rows are rendered column-for-column against the Header Set and built into
//! a single `Utf8` record batch, which is then written as CSV or parquet.

use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parquet::arrow::ArrowWriter;
use rayon::prelude::*;
use serde_json::Value;

use crate::config::{ExportConfig, ExportMode};
use crate::error::Result;
use crate::flatten::{Cell, Flattener};
use crate::instance::Instance;
use crate::schema::ResolvedSchema;

/// Renders instances of one form into export rows
#[derive(Debug, Clone)]
pub struct Exporter<'a> {
    flattener: Flattener<'a>,
    config: ExportConfig,
}

impl<'a> Exporter<'a> {
    #[must_use]
    pub const fn new(schema: &'a ResolvedSchema, config: ExportConfig) -> Self {
        Self {
            flattener: Flattener::new(schema),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    #[must_use]
    pub fn headers(&self) -> &'a [String] {
        self.flattener.schema().headers()
    }

    /// One value per header, in header order
    #[must_use]
    pub fn render_row(&self, instance: &Instance) -> Vec<String> {
        let schema = self.flattener.schema();
        let row = self.flattener.to_flat_row(instance, self.config.mode);
        schema
            .headers()
            .iter()
            .map(|header| {
                if schema.meta_headers().contains(header) {
                    return self
                        .flattener
                        .meta_value(instance, header)
                        .unwrap_or(self.config.na_rep.as_str())
                        .to_string();
                }
                match row.get(header) {
                    Some(Cell::Text(text)) => text.clone(),
                    Some(Cell::Flag(true)) => self.config.true_rep.clone(),
                    Some(Cell::Flag(false)) => self.config.false_rep().to_string(),
                    Some(Cell::Absent) | None => self.config.na_rep.clone(),
                }
            })
            .collect()
    }

    /// Render every exportable instance, preserving input order
    #[must_use]
    pub fn rows(&self, instances: &[Instance]) -> Vec<Vec<String>> {
        self.selected(instances)
            .par_iter()
            .map(|instance| self.render_row(instance))
            .collect()
    }

    /// Build a record batch with one non-null `Utf8` column per header
    pub fn to_record_batch(&self, instances: &[Instance]) -> Result<RecordBatch> {
        let rows = self.rows(instances);
        let headers = self.headers();

        let fields: Vec<Field> = headers
            .iter()
            .map(|header| Field::new(header, DataType::Utf8, false))
            .collect();
        let columns: Vec<ArrayRef> = (0..headers.len())
            .map(|i| {
                Arc::new(StringArray::from_iter_values(
                    rows.iter().map(|row| row[i].as_str()),
                )) as ArrayRef
            })
            .collect();

        let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?;

        log::info!(
            "Exported {} of {} instances ({} columns) for form {}",
            batch.num_rows(),
            instances.len(),
            batch.num_columns(),
            self.flattener.schema().id_string()
        );
        Ok(batch)
    }

    /// Write the header row followed by one row per instance.
    ///
    /// The destination is flushed before returning, so a failed final write
    /// surfaces as an error.
    pub fn write_csv<W: Write>(&self, instances: &[Instance], writer: W) -> Result<()> {
        let batch = self.to_record_batch(instances)?;
        let mut writer = WriterBuilder::new().with_header(true).build(writer);
        writer.write(&batch)?;
        writer.into_inner().flush()?;
        Ok(())
    }

    pub fn write_parquet<W: Write + Send>(&self, instances: &[Instance], writer: W) -> Result<()> {
        let batch = self.to_record_batch(instances)?;
        let mut writer = ArrowWriter::try_new(writer, batch.schema(), None)?;
        writer.write(&batch)?;
        writer.into_inner()?.flush()?;
        Ok(())
    }

    /// Sparse JSON rows with the metadata headers, one per exportable instance
    #[must_use]
    pub fn to_json_rows(&self, instances: &[Instance]) -> Vec<Value> {
        let schema = self.flattener.schema();
        self.selected(instances)
            .into_iter()
            .map(|instance| {
                let mut row = self
                    .flattener
                    .to_flat_row(instance, ExportMode::Sparse)
                    .into_json();
                for header in schema.meta_headers() {
                    if let Some(value) = self.flattener.meta_value(instance, header) {
                        row.insert(header.clone(), Value::String(value.to_string()));
                    }
                }
                Value::Object(row)
            })
            .collect()
    }

    /// Instances to export. An instance is foreign when it is tagged with
    /// another form, or untagged with a different root group.
    fn selected<'b>(&self, instances: &'b [Instance]) -> Vec<&'b Instance> {
        let schema = self.flattener.schema();
        instances
            .iter()
            .filter(|instance| {
                if !self.config.skip_foreign_instances {
                    return true;
                }
                let foreign = match instance.id_string() {
                    Some(id_string) => id_string != schema.id_string(),
                    None => instance.root() != schema.root(),
                };
                if foreign {
                    log::warn!(
                        "Skipping instance of form {} while exporting {}",
                        instance.id_string().unwrap_or(instance.root()),
                        schema.id_string()
                    );
                }
                !foreign
            })
            .collect()
    }
}
