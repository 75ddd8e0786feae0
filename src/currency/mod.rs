//! Fixed-rate currency normalization into euros
//!
//! Every monetary column of a non-EUR record is multiplied by a fixed
//! per-currency rate and rounded to two decimals, and the currency tag is
//! overwritten with EUR. A currency that has no rate entry passes through
//! untouched, tag included. That silent pass-through is intentional: the
//! reconciliation report exists to surface exactly the discrepancies such
//! gaps produce, so the normalizer must not paper over them.

use bigdecimal::rounding::RoundingMode;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::{MonetaryField, TransactionRecord};

/// Exchange rate table: currency code to a multiplier into EUR.
///
/// EUR always maps to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    to_eur: BTreeMap<String, BigDecimal>,
}

impl ExchangeRates {
    /// The fixed rates used by the monthly reports: PLN and SEK.
    pub fn fixed() -> Self {
        let mut rates = Self::empty();
        rates.insert("PLN", BigDecimal::from(23) / BigDecimal::from(100));
        rates.insert("SEK", BigDecimal::from(87) / BigDecimal::from(1000));
        rates
    }

    /// A table containing only the identity EUR entry.
    pub fn empty() -> Self {
        let mut to_eur = BTreeMap::new();
        to_eur.insert("EUR".to_string(), BigDecimal::from(1));
        Self { to_eur }
    }

    /// Add or replace a rate entry.
    pub fn insert(&mut self, currency: &str, rate: BigDecimal) {
        self.to_eur.insert(currency.to_string(), rate);
    }

    /// Look up the multiplier into EUR for a currency code.
    pub fn rate(&self, currency: &str) -> Option<&BigDecimal> {
        self.to_eur.get(currency)
    }
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::fixed()
    }
}

/// One applied conversion, recorded for the diagnostic report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    /// Position of the record in the normalized sequence
    pub row: usize,
    /// Jurisdiction of the converted record
    pub jurisdiction: String,
    /// Source currency code
    pub currency: String,
    /// Rate applied
    pub rate: BigDecimal,
    /// PRICE_OF_ITEMS_VAT_AMT before conversion
    pub item_vat_before: BigDecimal,
    /// PRICE_OF_ITEMS_VAT_AMT after conversion
    pub item_vat_after: BigDecimal,
}

/// Result of normalizing a sequence of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    /// Normalized records, same order as the input
    pub records: Vec<TransactionRecord>,
    /// One entry per record that was actually converted
    pub conversions: Vec<Conversion>,
}

/// Normalize a sequence of records into EUR.
///
/// Input records are read, never mutated; the output is a fresh sequence in
/// the same order. EUR records and records with an unknown currency come
/// back unchanged, so running the normalizer twice is the same as running
/// it once.
pub fn normalize_records(records: &[TransactionRecord], rates: &ExchangeRates) -> Normalization {
    let mut normalized = Vec::with_capacity(records.len());
    let mut conversions = Vec::new();

    for (row, record) in records.iter().enumerate() {
        match eur_rate(record, rates) {
            Some(rate) => {
                let item_vat_before = record.amount(MonetaryField::PriceOfItemsVatAmt);
                let converted = convert_record(record, rate);
                debug!(
                    row,
                    currency = %record.transaction_currency_code,
                    rate = %rate,
                    "converted record to EUR"
                );
                conversions.push(Conversion {
                    row,
                    jurisdiction: record.taxable_jurisdiction.clone(),
                    currency: record.transaction_currency_code.clone(),
                    rate: rate.clone(),
                    item_vat_before,
                    item_vat_after: converted.amount(MonetaryField::PriceOfItemsVatAmt),
                });
                normalized.push(converted);
            }
            None => normalized.push(record.clone()),
        }
    }

    Normalization {
        records: normalized,
        conversions,
    }
}

/// The rate to apply, or None when the record should pass through.
fn eur_rate<'a>(record: &TransactionRecord, rates: &'a ExchangeRates) -> Option<&'a BigDecimal> {
    if record.is_eur() {
        return None;
    }
    rates.rate(&record.transaction_currency_code)
}

/// Produce the converted copy of one record.
fn convert_record(record: &TransactionRecord, rate: &BigDecimal) -> TransactionRecord {
    let mut converted = record.clone();
    for (field, value) in record.amounts() {
        converted.set_amount(field, round_eur(&(value * rate)));
    }
    converted.transaction_currency_code = "EUR".to_string();
    converted
}

/// Round a converted amount to cents, ordinary half-up rounding.
pub fn round_eur(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}
