use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, AsArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use thiserror::Error;

use super::model::{SalesDataset, SalesRecord};

/// Columns every input file must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Date",
    "Product_Category",
    "State",
    "Payment_Method",
    "Total_Sales_INR",
    "Review_Rating",
    "Delivery_Status",
];

/// Date formats accepted for the `Date` column, tried in order.
const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
];

// ---------------------------------------------------------------------------
// DataLoadError
// ---------------------------------------------------------------------------

/// Fatal load failure. No partial dataset is ever returned: a single bad
/// date or number aborts the whole load.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: cannot parse date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: {message}")]
    InvalidField { row: usize, message: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the required columns
/// * `.json`    – records-oriented array (`df.to_json(orient='records')`)
/// * `.parquet` – flat columns, one row per sale
pub fn load_file(path: &Path) -> Result<SalesDataset, DataLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataLoadError::UnsupportedExtension(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Raw row + enrichment
// ---------------------------------------------------------------------------

/// One un-enriched input row, field names matching the source headers.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Product_Category")]
    product_category: String,
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Payment_Method")]
    payment_method: String,
    #[serde(rename = "Total_Sales_INR")]
    total_sales_inr: f64,
    #[serde(rename = "Review_Rating")]
    review_rating: f64,
    #[serde(rename = "Delivery_Status")]
    delivery_status: String,
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse the date and compute the derived columns for one raw row.
fn enrich(raw: RawRecord, row: usize) -> Result<SalesRecord, DataLoadError> {
    let date = parse_date(&raw.date).ok_or_else(|| DataLoadError::InvalidDate {
        row,
        value: raw.date.clone(),
    })?;

    Ok(SalesRecord::new(
        date,
        raw.product_category,
        raw.state,
        raw.payment_method,
        raw.total_sales_inr,
        raw.review_rating,
        raw.delivery_status,
    ))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<SalesDataset, DataLoadError> {
    let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}

/// Parse CSV sales rows from any reader (split out so tests can feed bytes).
fn read_csv<R: Read>(reader: R) -> Result<SalesDataset, DataLoadError> {
    let mut reader = csv::Reader::from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(DataLoadError::MissingColumn(col.to_string()));
        }
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<RawRecord>().enumerate() {
        let raw = result?;
        records.push(enrich(raw, row_no)?);
    }

    Ok(SalesDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   {
///     "Date": "2025-10-20",
///     "Product_Category": "Electronics",
///     "State": "Delhi",
///     "Payment_Method": "UPI",
///     "Total_Sales_INR": 12999.0,
///     "Review_Rating": 4.5,
///     "Delivery_Status": "Delivered"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SalesDataset, DataLoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<SalesDataset, DataLoadError> {
    let raw_rows: Vec<RawRecord> = serde_json::from_str(text)?;
    let records = raw_rows
        .into_iter()
        .enumerate()
        .map(|(row_no, raw)| enrich(raw, row_no))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SalesDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat row per sale.
///
/// String columns must be Utf8/LargeUtf8; numeric columns may be any of
/// Int32/Int64/Float32/Float64; `Date` may be Utf8 or Date32. Works with
/// files written by both Pandas (`df.to_parquet()`) and Polars
/// (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<SalesDataset, DataLoadError> {
    let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut records = Vec::new();
    let mut row_no = 0usize;

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        let col = |name: &str| -> Result<usize, DataLoadError> {
            schema
                .index_of(name)
                .map_err(|_| DataLoadError::MissingColumn(name.to_string()))
        };
        let date_col = batch.column(col("Date")?).clone();
        let category_col = batch.column(col("Product_Category")?).clone();
        let state_col = batch.column(col("State")?).clone();
        let payment_col = batch.column(col("Payment_Method")?).clone();
        let sales_col = batch.column(col("Total_Sales_INR")?).clone();
        let rating_col = batch.column(col("Review_Rating")?).clone();
        let status_col = batch.column(col("Delivery_Status")?).clone();

        for row in 0..batch.num_rows() {
            let date = date_at(&date_col, row, row_no)?;
            records.push(SalesRecord::new(
                date,
                str_at(&category_col, row, row_no, "Product_Category")?,
                str_at(&state_col, row, row_no, "State")?,
                str_at(&payment_col, row, row_no, "Payment_Method")?,
                f64_at(&sales_col, row, row_no, "Total_Sales_INR")?,
                f64_at(&rating_col, row, row_no, "Review_Rating")?,
                str_at(&status_col, row, row_no, "Delivery_Status")?,
            ));
            row_no += 1;
        }
    }

    Ok(SalesDataset::from_records(records))
}

// -- Parquet / Arrow helpers --

/// Extract a string cell from a Utf8 or LargeUtf8 column.
fn str_at(
    col: &Arc<dyn Array>,
    row: usize,
    row_no: usize,
    name: &str,
) -> Result<String, DataLoadError> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    match col.data_type() {
        DataType::Utf8 => {
            if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
                Ok(arr.value(row).to_string())
            } else {
                Ok(col.as_string::<i32>().value(row).to_string())
            }
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => Err(DataLoadError::InvalidField {
            row: row_no,
            message: format!("column '{name}' has type {other:?}, expected strings"),
        }),
    }
}

/// Extract a numeric cell, widening any supported integer/float type to f64.
fn f64_at(
    col: &Arc<dyn Array>,
    row: usize,
    row_no: usize,
    name: &str,
) -> Result<f64, DataLoadError> {
    if col.is_null(row) {
        return Ok(f64::NAN);
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
        Ok(arr.value(row) as f64)
    } else {
        Err(DataLoadError::InvalidField {
            row: row_no,
            message: format!(
                "column '{name}' has type {:?}, expected a numeric type",
                col.data_type()
            ),
        })
    }
}

/// Days between 0001-01-01 (CE) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Extract a calendar date from a Utf8 (formatted string) or Date32 column.
fn date_at(col: &Arc<dyn Array>, row: usize, row_no: usize) -> Result<NaiveDate, DataLoadError> {
    if let Some(arr) = col.as_any().downcast_ref::<Date32Array>() {
        let days = arr.value(row);
        return NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE).ok_or_else(
            || DataLoadError::InvalidDate {
                row: row_no,
                value: format!("{days} days since epoch"),
            },
        );
    }

    let text = str_at(col, row, row_no, "Date")?;
    parse_date(&text).ok_or(DataLoadError::InvalidDate {
        row: row_no,
        value: text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Month;

    const CSV_OK: &str = "\
Date,Product_Category,State,Payment_Method,Total_Sales_INR,Review_Rating,Delivery_Status
2025-10-20,Electronics,Delhi,UPI,12999,4.5,Delivered
2025-11-02,Clothing,Kerala,Card,799,3,Returned
";

    #[test]
    fn csv_rows_are_parsed_and_enriched() {
        let ds = read_csv(CSV_OK.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);

        let first = &ds.records[0];
        assert_eq!(first.month, Month::Oct);
        assert_eq!(first.quarter, 4);
        assert_eq!(first.delivered_flag, 1);
        assert_eq!(first.satisfied, 1);

        let second = &ds.records[1];
        assert_eq!(second.month, Month::Nov);
        assert_eq!(second.delivered_flag, 0);
        assert_eq!(second.satisfied, 0);

        assert!(ds.categories.contains("Electronics"));
        assert!(ds.states.contains("Kerala"));
        assert!(ds.payment_methods.contains("Card"));
    }

    #[test]
    fn csv_missing_column_is_fatal() {
        let csv = "Date,Product_Category,State,Total_Sales_INR,Review_Rating,Delivery_Status\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        match err {
            DataLoadError::MissingColumn(col) => assert_eq!(col, "Payment_Method"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn csv_bad_date_is_fatal() {
        let csv = "\
Date,Product_Category,State,Payment_Method,Total_Sales_INR,Review_Rating,Delivery_Status
not-a-date,Electronics,Delhi,UPI,100,4,Delivered
";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        match err {
            DataLoadError::InvalidDate { row, value } => {
                assert_eq!(row, 0);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn csv_bad_number_is_fatal() {
        let csv = "\
Date,Product_Category,State,Payment_Method,Total_Sales_INR,Review_Rating,Delivery_Status
2025-10-20,Electronics,Delhi,UPI,lots,4,Delivered
";
        assert!(read_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn json_records_are_parsed() {
        let json = r#"[
            {"Date": "2025-01-05", "Product_Category": "Toys", "State": "Goa",
             "Payment_Method": "COD", "Total_Sales_INR": 450,
             "Review_Rating": 5, "Delivery_Status": "Delivered"}
        ]"#;
        let ds = parse_json(json).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].month, Month::Jan);
        assert_eq!(ds.records[0].satisfied, 1);
    }

    #[test]
    fn json_missing_field_is_fatal() {
        let json = r#"[{"Date": "2025-01-05", "Product_Category": "Toys"}]"#;
        assert!(matches!(
            parse_json(json).unwrap_err(),
            DataLoadError::Json(_)
        ));
    }

    #[test]
    fn date_formats_are_tried_in_order() {
        assert!(parse_date("2025-10-20").is_some());
        assert!(parse_date("2025-10-20 00:00:00").is_some());
        assert!(parse_date("20-10-2025").is_some());
        assert!(parse_date("20/10/2025").is_some());
        assert!(parse_date("2025/10/20").is_some());
        assert!(parse_date("October 20").is_none());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("sales.xlsx")).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedExtension(e) if e == "xlsx"));
    }
}
