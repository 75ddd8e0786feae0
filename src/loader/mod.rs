//! Loading of VAT transaction report files into typed records
//!
//! The source files are monthly marketplace exports: delimited text with a
//! header row, comma or semicolon separated, occasionally ISO-8859-1 encoded
//! and using European decimal commas in numeric cells. Numeric coercion is
//! tolerant: an empty or unparseable cell becomes zero, never an error.

use bigdecimal::BigDecimal;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::types::{MonetaryField, ReconError, ReconResult, TransactionRecord};

/// Column that must be present in every report file.
const ACTIVITY_PERIOD: &str = "ACTIVITY_PERIOD";

/// A single upload may cover at most this many distinct reporting periods.
const MAX_ACTIVITY_PERIODS: usize = 3;

/// Load a report file from disk into transaction records.
///
/// Fatal on a missing file, an unsupported extension, or a malformed header;
/// everything cell-level is coerced, not rejected.
pub fn load_records<P: AsRef<Path>>(path: P) -> ReconResult<Vec<TransactionRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ReconError::InputNotFound(path.display().to_string()));
    }
    validate_extension(path)?;

    let bytes = fs::read(path)?;
    let content = decode_bytes(bytes);
    parse_records(&content)
}

/// Parse report content into transaction records.
///
/// The first non-empty line is the header; its delimiter is detected by
/// comparing comma and semicolon counts.
pub fn parse_records(content: &str) -> ReconResult<Vec<TransactionRecord>> {
    let delimiter = detect_delimiter(content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == ACTIVITY_PERIOD) {
        return Err(ReconError::MissingColumn(ACTIVITY_PERIOD.to_string()));
    }

    let mut records = Vec::new();
    let mut periods: BTreeSet<String> = BTreeSet::new();

    for row in reader.records() {
        let row = row?;
        let record = record_from_row(&headers, &row);

        if !record.activity_period.is_empty() {
            periods.insert(record.activity_period.clone());
            if periods.len() > MAX_ACTIVITY_PERIODS {
                return Err(ReconError::Validation(format!(
                    "Maximum {MAX_ACTIVITY_PERIODS} distinct {ACTIVITY_PERIOD} values allowed"
                )));
            }
        }

        records.push(record);
    }

    debug!(rows = records.len(), "parsed transaction report");
    Ok(records)
}

/// Build one typed record from a header/value row pair.
///
/// Known categorical columns map to struct fields, monetary columns are
/// coerced to decimals, anything else is dropped.
fn record_from_row(headers: &csv::StringRecord, row: &csv::StringRecord) -> TransactionRecord {
    let mut record = TransactionRecord::new();

    for (header, value) in headers.iter().zip(row.iter()) {
        if let Some(field) = MonetaryField::from_header(header) {
            record.set_amount(field, parse_decimal(value));
            continue;
        }

        match header {
            "TAX_REPORTING_SCHEME" => record.tax_reporting_scheme = value.to_string(),
            "TAX_COLLECTION_RESPONSIBILITY" => {
                record.tax_collection_responsibility = value.to_string()
            }
            "TAXABLE_JURISDICTION" => record.taxable_jurisdiction = value.to_string(),
            "TRANSACTION_CURRENCY_CODE" => record.transaction_currency_code = value.to_string(),
            "SALE_DEPART_COUNTRY" => record.sale_depart_country = value.to_string(),
            "SALE_ARRIVAL_COUNTRY" => record.sale_arrival_country = value.to_string(),
            "BUYER_VAT_NUMBER" => record.buyer_vat_number = value.to_string(),
            "BUYER_VAT_NUMBER_COUNTRY" => record.buyer_vat_number_country = value.to_string(),
            "SUPPLIER_NAME" => record.supplier_name = value.to_string(),
            "BUYER_NAME" => record.buyer_name = value.to_string(),
            "TRANSACTION_EVENT_CODE" => record.transaction_event_code = value.to_string(),
            ACTIVITY_PERIOD => record.activity_period = value.to_string(),
            _ => {}
        }
    }

    record
}

/// Coerce a numeric cell to a decimal, defaulting to zero.
///
/// European decimal commas ("12,5") are normalized to dots first.
fn parse_decimal(raw: &str) -> BigDecimal {
    if raw.is_empty() {
        return BigDecimal::from(0);
    }
    let normalized = raw.replace(',', ".");
    normalized
        .parse::<BigDecimal>()
        .unwrap_or_else(|_| BigDecimal::from(0))
}

/// Detect the delimiter from the first non-empty line: comma wins ties.
fn detect_delimiter(content: &str) -> u8 {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let commas = line.matches(',').count();
        let semicolons = line.matches(';').count();
        return if commas >= semicolons { b',' } else { b';' };
    }
    b','
}

/// Only .csv and .txt exports are accepted.
fn validate_extension(path: &Path) -> ReconResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "txt" => Ok(()),
        other => Err(ReconError::UnsupportedExtension(other.to_string())),
    }
}

/// Decode file bytes as UTF-8, falling back to ISO-8859-1.
fn decode_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(content) => content,
        // Latin-1 bytes map 1:1 onto the first 256 Unicode code points.
        Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ACTIVITY_PERIOD,TAX_REPORTING_SCHEME,TAX_COLLECTION_RESPONSIBILITY,\
TAXABLE_JURISDICTION,TRANSACTION_CURRENCY_CODE,PRICE_OF_ITEMS_VAT_AMT,SHIP_CHARGE_VAT_AMT";

    #[test]
    fn parses_comma_separated_rows() {
        let content = format!("{HEADER}\n2023-01,REGULAR,SELLER,POLAND,PLN,400,2.5\n");
        let records = parse_records(&content).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.tax_reporting_scheme, "REGULAR");
        assert_eq!(record.taxable_jurisdiction, "POLAND");
        assert_eq!(
            record.amount(MonetaryField::PriceOfItemsVatAmt),
            BigDecimal::from(400)
        );
        assert_eq!(
            record.amount(MonetaryField::ShipChargeVatAmt),
            "2.5".parse::<BigDecimal>().unwrap()
        );
    }

    #[test]
    fn detects_semicolon_delimiter() {
        let content = "ACTIVITY_PERIOD;TAXABLE_JURISDICTION;PRICE_OF_ITEMS_VAT_AMT\n\
2023-01;POLAND;12,5\n";
        let records = parse_records(content).unwrap();

        assert_eq!(records[0].taxable_jurisdiction, "POLAND");
        // Decimal comma is only meaningful with a semicolon delimiter.
        assert_eq!(
            records[0].amount(MonetaryField::PriceOfItemsVatAmt),
            "12.5".parse::<BigDecimal>().unwrap()
        );
    }

    #[test]
    fn malformed_numeric_cells_become_zero() {
        let content = format!("{HEADER}\n2023-01,REGULAR,SELLER,POLAND,EUR,not-a-number,\n");
        let records = parse_records(&content).unwrap();

        assert_eq!(
            records[0].amount(MonetaryField::PriceOfItemsVatAmt),
            BigDecimal::from(0)
        );
        assert_eq!(
            records[0].amount(MonetaryField::ShipChargeVatAmt),
            BigDecimal::from(0)
        );
    }

    #[test]
    fn rejects_missing_activity_period_column() {
        let content = "TAXABLE_JURISDICTION,PRICE_OF_ITEMS_VAT_AMT\nPOLAND,1\n";
        let err = parse_records(content).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn(_)));
    }

    #[test]
    fn rejects_more_than_three_periods() {
        let content = format!(
            "{HEADER}\n\
2023-01,REGULAR,SELLER,POLAND,EUR,1,0\n\
2023-02,REGULAR,SELLER,POLAND,EUR,1,0\n\
2023-03,REGULAR,SELLER,POLAND,EUR,1,0\n\
2023-04,REGULAR,SELLER,POLAND,EUR,1,0\n"
        );
        let err = parse_records(&content).unwrap_err();
        assert!(matches!(err, ReconError::Validation(_)));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let err = load_records("report.xlsx").unwrap_err();
        assert!(matches!(err, ReconError::InputNotFound(_)));

        let err = validate_extension(Path::new("report.xlsx")).unwrap_err();
        assert!(matches!(err, ReconError::UnsupportedExtension(_)));
    }

    #[test]
    fn decodes_latin1_fallback() {
        let bytes = b"ACTIVITY_PERIOD\nENERO 2023 \xe9\n".to_vec();
        let content = decode_bytes(bytes);
        assert!(content.contains('é'));
    }
}
