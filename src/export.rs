//! CSV and JSON downloads built from the in-memory collections.

use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::api::{Coordinates, PropertyDetail};
use crate::listing::{value_text, Listing};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

impl ExportFile {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

pub fn csv_filename(date: NaiveDate) -> String {
    format!("adla_properties_{}.csv", date.format("%Y-%m-%d"))
}

pub fn property_json_filename(stock_number: &str) -> String {
    format!("property_{stock_number}.json")
}

/// Serializes listings to CSV; `None` when there is nothing to export.
///
/// The header comes from the first record's keys. Every non-null value is
/// quoted with inner quotes doubled, a null is a bare empty cell, and rows are
/// separated by `\n` with no trailing newline.
pub fn listings_to_csv(listings: &[Listing], date: NaiveDate) -> Result<Option<ExportFile>, ExportError> {
    let Some(first) = listings.first() else {
        return Ok(None);
    };
    let headers: Vec<&str> = first.keys().collect();

    let mut header_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header_writer.write_record(&headers)?;

    // Cells arrive pre-quoted so the writer must not quote again.
    let mut row_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());
    for listing in listings {
        let cells: Vec<String> = listing
            .fields()
            .values()
            .map(|value| match value_text(value) {
                Some(text) => format!("\"{}\"", text.replace('"', "\"\"")),
                None => String::new(),
            })
            .collect();
        row_writer.write_record(&cells)?;
    }

    let mut body = into_string(header_writer)?;
    body.push_str(&into_string(row_writer)?);
    let body = body.trim_end_matches('\n').to_string();

    Ok(Some(ExportFile {
        filename: csv_filename(date),
        content_type: CSV_CONTENT_TYPE,
        body,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct PropertyExport<'a> {
    #[serde(rename = "stockNumber")]
    stock_number: &'a str,
    location: &'a str,
    coordinates: Option<Coordinates>,
    details: Map<String, Value>,
}

/// Restructures a property detail into the downloadable JSON document.
pub fn property_to_json(detail: &PropertyDetail) -> Result<ExportFile, ExportError> {
    let details = detail
        .categories
        .iter()
        .map(|category| {
            let fields: Map<String, Value> = category
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.value.clone()))
                .collect();
            (category.name.clone(), Value::Object(fields))
        })
        .collect();

    let document = PropertyExport {
        stock_number: &detail.summary.stock_number,
        location: &detail.summary.location,
        coordinates: detail.map,
        details,
    };

    Ok(ExportFile {
        filename: property_json_filename(&detail.summary.stock_number),
        content_type: JSON_CONTENT_TYPE,
        body: serde_json::to_string_pretty(&document)?,
    })
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Buffer(err.to_string()))
}
