//! Listing and category records mapped to display rows.

use serde::Serialize;
use serde_json::Value;

use crate::api::CategoryRecord;
use crate::listing::{value_text, Listing, STOCK_NUMBER_FIELD};

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    StockLink,
    PassThrough,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardColumn {
    pub key: &'static str,
    pub header: &'static str,
    kind: ColumnKind,
}

const fn column(key: &'static str, header: &'static str, kind: ColumnKind) -> DashboardColumn {
    DashboardColumn { key, header, kind }
}

pub const DASHBOARD_COLUMNS: [DashboardColumn; 9] = [
    column(STOCK_NUMBER_FIELD, "Stock #", ColumnKind::StockLink),
    column("Sale Price", "Sale Price", ColumnKind::PassThrough),
    column("Acres", "Acres", ColumnKind::Numeric),
    column("Price/Acre", "Price/Acre", ColumnKind::PassThrough),
    column("Demand", "Demand", ColumnKind::Numeric),
    column("Housing Gap", "Housing Gap", ColumnKind::Numeric),
    column("Affordability", "Affordability", ColumnKind::Numeric),
    column("Convenience", "Convenience", ColumnKind::Numeric),
    column("Score", "Score", ColumnKind::PassThrough),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellStyle {
    Emphasis,
    Favorable,
    Plain,
}

impl CellStyle {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Emphasis => "fw-bold text-primary",
            Self::Favorable => "text-success",
            Self::Plain => "text-dark",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCell {
    pub text: String,
    pub href: Option<String>,
    pub numeric: bool,
    pub style: Option<CellStyle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub stock_number: Option<String>,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRow {
    pub name: String,
    pub value: String,
    pub style: Option<CellStyle>,
}

/// Styling is decided from the field name and displayed value alone.
pub fn cell_style(field: &str, value: &str) -> Option<CellStyle> {
    if field == "Composite Score" {
        Some(CellStyle::Emphasis)
    } else if field.contains("Affordability") && value.contains('-') {
        // A negative gap means the area is more affordable.
        Some(CellStyle::Favorable)
    } else if field.contains("Price") && value != NOT_AVAILABLE {
        Some(CellStyle::Plain)
    } else {
        None
    }
}

/// Display text for a possibly numeric field. Blank strings and booleans
/// coerce to numbers the way browser number formatting does.
pub fn format_display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(text)) if text == NOT_AVAILABLE => NOT_AVAILABLE.to_string(),
        Some(Value::String(text)) if text.contains('$') || text.contains(',') => text.clone(),
        Some(Value::String(text)) if text.trim().is_empty() => format_thousands(0.0),
        Some(Value::String(text)) => match text.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => format_thousands(number),
            _ => text.clone(),
        },
        Some(Value::Bool(flag)) => format_thousands(if *flag { 1.0 } else { 0.0 }),
        Some(Value::Number(number)) => number
            .as_f64()
            .map(format_thousands)
            .unwrap_or_else(|| number.to_string()),
        Some(other) => value_text(other).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

/// en-US grouping with at most three fraction digits, trailing zeros dropped.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rendered = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(rendered.len() + int_part.len() / 3 + 1);
    let is_zero = int_part.chars().all(|ch| ch == '0') && frac_part.is_empty();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

pub fn listing_rows<'a>(listings: impl IntoIterator<Item = &'a Listing>) -> Vec<ListingRow> {
    listings.into_iter().map(listing_row).collect()
}

pub fn listing_row(listing: &Listing) -> ListingRow {
    let stock_number = listing
        .stock_number()
        .filter(|stock| !stock.trim().is_empty());

    let cells = DASHBOARD_COLUMNS
        .iter()
        .map(|column| {
            let value = listing.get(column.key);
            let (text, href) = match column.kind {
                ColumnKind::StockLink => match &stock_number {
                    Some(stock) => (stock.clone(), Some(property_href(stock))),
                    None => (NOT_AVAILABLE.to_string(), None),
                },
                ColumnKind::PassThrough => (pass_through(value), None),
                ColumnKind::Numeric => (format_display_value(value), None),
            };
            let style = cell_style(column.key, &text);

            TableCell {
                text,
                href,
                numeric: column.kind != ColumnKind::StockLink,
                style,
            }
        })
        .collect();

    ListingRow {
        stock_number,
        cells,
    }
}

pub fn category_rows(category: &CategoryRecord) -> Vec<CategoryRow> {
    category
        .fields
        .iter()
        .map(|field| {
            let value = field.value_text();
            CategoryRow {
                style: cell_style(&field.field, &value),
                name: field.name.clone(),
                value,
            }
        })
        .collect()
}

/// `/property/{stock}` with the stock number encoded as one path segment.
pub fn property_href(stock_number: &str) -> String {
    let Ok(mut url) = reqwest::Url::parse("http://adla.local/") else {
        return format!("/property/{stock_number}");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().extend(["property", stock_number]);
    }
    url.path().to_string()
}

/// Falsy values (null, empty text, zero, false) show as N/A.
fn pass_through(value: Option<&Value>) -> String {
    match value {
        Some(Value::Bool(false)) => NOT_AVAILABLE.to_string(),
        Some(Value::Number(number)) if number.as_f64() == Some(0.0) => NOT_AVAILABLE.to_string(),
        _ => value
            .and_then(value_text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}
