use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};

use super::model::{FeatureVector, LabeledDataset, LabeledExample, SourceLabel, FEATURE_NAMES};

/// Column holding the class name, after the feature columns.
pub const LABEL_COLUMN: &str = "label";

// ---------------------------------------------------------------------------
// DatasetRow – one flat table row
// ---------------------------------------------------------------------------

/// Field order here is the column order on disk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct DatasetRow {
    pm2_5: f64,
    no2: f64,
    so2: f64,
    road: f64,
    industrial: f64,
    residential: f64,
    label: SourceLabel,
}

impl From<&LabeledExample> for DatasetRow {
    fn from(ex: &LabeledExample) -> Self {
        let [pm2_5, no2, so2, road, industrial, residential] = ex.features.values();
        DatasetRow {
            pm2_5,
            no2,
            so2,
            road,
            industrial,
            residential,
            label: ex.label,
        }
    }
}

impl From<DatasetRow> for LabeledExample {
    fn from(r: DatasetRow) -> Self {
        LabeledExample {
            features: FeatureVector::from_values([
                r.pm2_5,
                r.no2,
                r.so2,
                r.road,
                r.industrial,
                r.residential,
            ]),
            label: r.label,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableFormat {
    Csv,
    Json,
    Parquet,
}

fn format_for(path: &Path) -> Result<TableFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => Ok(TableFormat::Csv),
        "json" => Ok(TableFormat::Json),
        "parquet" | "pq" => Ok(TableFormat::Parquet),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load a labeled dataset. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header `pm2_5,no2,so2,road,industrial,residential,label`
/// * `.json`    – `[{ "pm2_5": .., ..., "label": "Traffic" }, ...]`
/// * `.parquet` – Float64 (or Float32/Int64) feature columns, Utf8 `label`
pub fn load_dataset(path: &Path) -> Result<LabeledDataset> {
    let dataset = match format_for(path)? {
        TableFormat::Csv => load_csv(path),
        TableFormat::Json => load_json(path),
        TableFormat::Parquet => load_parquet(path),
    }
    .with_context(|| format!("loading dataset {}", path.display()))?;

    log::info!("loaded {} rows from {}", dataset.len(), path.display());
    Ok(dataset)
}

/// Write a labeled dataset in the format implied by the extension.
pub fn write_dataset(dataset: &LabeledDataset, path: &Path) -> Result<()> {
    match format_for(path)? {
        TableFormat::Csv => write_csv(dataset, path),
        TableFormat::Json => write_json(dataset, path),
        TableFormat::Parquet => write_parquet(dataset, path),
    }
    .with_context(|| format!("writing dataset {}", path.display()))?;

    log::info!("wrote {} rows to {}", dataset.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<LabeledDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    for col in FEATURE_NAMES.iter().chain(std::iter::once(&LABEL_COLUMN)) {
        if !headers.iter().any(|h| h == *col) {
            bail!("CSV missing '{col}' column");
        }
    }

    let mut examples = Vec::new();
    for (row_no, result) in reader.deserialize::<DatasetRow>().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        examples.push(row.into());
    }
    Ok(LabeledDataset::from_examples(examples))
}

fn write_csv(dataset: &LabeledDataset, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for ex in &dataset.examples {
        writer.serialize(DatasetRow::from(ex)).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON (records-oriented, like `df.to_json(orient='records')`)
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<LabeledDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<DatasetRow> = serde_json::from_str(&text).context("parsing JSON records")?;
    Ok(LabeledDataset::from_examples(rows.into_iter().map(Into::into).collect()))
}

fn write_json(dataset: &LabeledDataset, path: &Path) -> Result<()> {
    let rows: Vec<DatasetRow> = dataset.examples.iter().map(DatasetRow::from).collect();
    let file = std::fs::File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), &rows).context("writing JSON")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn load_parquet(path: &Path) -> Result<LabeledDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut examples = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let mut feature_cols = Vec::with_capacity(FEATURE_NAMES.len());
        for name in FEATURE_NAMES {
            let idx = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
            feature_cols.push(batch.column(idx));
        }
        let label_idx = schema
            .index_of(LABEL_COLUMN)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{LABEL_COLUMN}' column"))?;
        let label_col = batch.column(label_idx);

        for row in 0..batch.num_rows() {
            let mut values = [0.0; FEATURE_NAMES.len()];
            for (slot, (col, name)) in values.iter_mut().zip(feature_cols.iter().zip(FEATURE_NAMES)) {
                *slot = extract_f64(col, row).with_context(|| format!("Row {row}: column '{name}'"))?;
            }
            let label = extract_label(label_col, row).with_context(|| format!("Row {row}: label"))?;
            examples.push(LabeledExample {
                features: FeatureVector::from_values(values),
                label,
            });
        }
    }

    Ok(LabeledDataset::from_examples(examples))
}

fn write_parquet(dataset: &LabeledDataset, path: &Path) -> Result<()> {
    let mut fields: Vec<Field> = FEATURE_NAMES
        .iter()
        .map(|name| Field::new(*name, DataType::Float64, false))
        .collect();
    fields.push(Field::new(LABEL_COLUMN, DataType::Utf8, false));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<Arc<dyn Array>> = (0..FEATURE_NAMES.len())
        .map(|i| {
            let values: Vec<f64> = dataset
                .examples
                .iter()
                .map(|ex| ex.features.as_slice()[i])
                .collect();
            Arc::new(Float64Array::from(values)) as Arc<dyn Array>
        })
        .collect();
    columns.push(Arc::new(StringArray::from(
        dataset
            .examples
            .iter()
            .map(|ex| ex.label.as_str())
            .collect::<Vec<_>>(),
    )));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

// -- Arrow helpers --

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in feature column");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Ok(arr.value(row) as f64)
    } else {
        bail!("feature column is {:?}, expected a numeric type", col.data_type())
    }
}

fn extract_label(col: &Arc<dyn Array>, row: usize) -> Result<SourceLabel> {
    if col.is_null(row) {
        bail!("null label");
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row),
        other => bail!("label column is {other:?}, expected a string type"),
    };
    Ok(text.parse::<SourceLabel>()?)
}
