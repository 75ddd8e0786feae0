//! Jurisdiction-level VAT reconciliation against a reference total
//!
//! This is the diagnostic half of the pipeline: it takes the domestic
//! bucket, normalizes it into EUR, sums the derived VAT total over one
//! jurisdiction and reports how far the result sits from an externally
//! supplied reference figure. The report is a readout, not an assertion;
//! there is no pass/fail outcome.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::classifier::{Buckets, TaxCategory};
use crate::currency::{normalize_records, round_eur, Conversion, ExchangeRates};
use crate::loader::load_records;
use crate::types::{MonetaryField, ReconResult, TransactionRecord};

/// The six VAT sub-columns that make up the derived "IVA (€)" total.
pub const VAT_TOTAL_FIELDS: [MonetaryField; 6] = [
    MonetaryField::PriceOfItemsVatAmt,
    MonetaryField::PromoPriceOfItemsVatAmt,
    MonetaryField::ShipChargeVatAmt,
    MonetaryField::PromoShipChargeVatAmt,
    MonetaryField::GiftWrapVatAmt,
    MonetaryField::PromoGiftWrapVatAmt,
];

/// Derived VAT total for one record: the sum of the six VAT sub-columns,
/// each defaulting to zero when absent.
pub fn vat_total(record: &TransactionRecord) -> BigDecimal {
    VAT_TOTAL_FIELDS.iter().map(|f| record.amount(*f)).sum()
}

/// Constants for one reconciliation run, passed explicitly by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Jurisdiction whose VAT total is being reconciled
    pub jurisdiction: String,
    /// Reference total the jurisdiction sum is compared against
    pub expected_total: BigDecimal,
    /// Rate table used for currency normalization
    pub rates: ExchangeRates,
}

impl ReconcileConfig {
    pub fn new(jurisdiction: &str, expected_total: BigDecimal, rates: ExchangeRates) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            expected_total,
            rates,
        }
    }
}

impl Default for ReconcileConfig {
    /// The reference run this tool was built around: POLAND against the
    /// accounting system's figure of 91.54.
    fn default() -> Self {
        Self::new(
            "POLAND",
            BigDecimal::from(9154) / BigDecimal::from(100),
            ExchangeRates::fixed(),
        )
    }
}

/// Pre-conversion view of the jurisdiction subset for one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySlice {
    /// Currency code as it appeared in the source
    pub currency: String,
    /// Number of records carrying that code
    pub count: usize,
    /// PRICE_OF_ITEMS_VAT_AMT summed over those records
    pub item_vat_total: BigDecimal,
}

/// Diagnostic readout of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Jurisdiction the totals are filtered to
    pub jurisdiction: String,
    /// Size of the whole domestic bucket, all jurisdictions
    pub domestic_count: usize,
    /// Records of the domestic bucket in the target jurisdiction
    pub jurisdiction_count: usize,
    /// Per-currency totals of the jurisdiction subset before conversion
    pub before_conversion: Vec<CurrencySlice>,
    /// Conversions applied to the jurisdiction subset
    pub conversions: Vec<Conversion>,
    /// Non-zero per-column VAT totals after conversion
    pub vat_by_field: Vec<(MonetaryField, BigDecimal)>,
    /// Derived VAT total summed over the jurisdiction subset
    pub actual_total: BigDecimal,
    /// Reference total supplied by the caller
    pub expected_total: BigDecimal,
    /// Absolute difference between actual and expected
    pub difference: BigDecimal,
}

/// Run the reconciliation pipeline over already-loaded records.
///
/// Partitions the records, normalizes the domestic bucket into EUR and
/// compares the jurisdiction's derived VAT total against the configured
/// reference. Buckets other than the domestic one are left untouched.
pub fn reconcile_records(
    records: Vec<TransactionRecord>,
    config: &ReconcileConfig,
) -> ReconciliationReport {
    let buckets = Buckets::partition(records);
    let domestic = buckets.bucket(TaxCategory::B2cB2bLocal);

    let before_conversion = currency_slices(domestic, &config.jurisdiction);

    let normalization = normalize_records(domestic, &config.rates);
    let conversions: Vec<Conversion> = normalization
        .conversions
        .into_iter()
        .filter(|c| c.jurisdiction == config.jurisdiction)
        .collect();

    let subset: Vec<&TransactionRecord> = normalization
        .records
        .iter()
        .filter(|r| r.taxable_jurisdiction == config.jurisdiction)
        .collect();

    let vat_by_field: Vec<(MonetaryField, BigDecimal)> = VAT_TOTAL_FIELDS
        .iter()
        .map(|field| {
            let total: BigDecimal = subset.iter().map(|r| r.amount(*field)).sum();
            (*field, total)
        })
        .filter(|(_, total)| *total != BigDecimal::from(0))
        .collect();

    let actual_total: BigDecimal = subset.iter().map(|r| vat_total(r)).sum();
    let difference = (&actual_total - &config.expected_total).abs();

    info!(
        jurisdiction = %config.jurisdiction,
        actual = %actual_total,
        expected = %config.expected_total,
        difference = %difference,
        "reconciliation complete"
    );

    ReconciliationReport {
        jurisdiction: config.jurisdiction.clone(),
        domestic_count: domestic.len(),
        jurisdiction_count: subset.len(),
        before_conversion,
        conversions,
        vat_by_field,
        actual_total,
        expected_total: config.expected_total.clone(),
        difference,
    }
}

/// One-shot entry point: load a report file and reconcile it.
pub fn reconcile_file<P: AsRef<Path>>(
    path: P,
    config: &ReconcileConfig,
) -> ReconResult<ReconciliationReport> {
    let records = load_records(path)?;
    Ok(reconcile_records(records, config))
}

/// Group the jurisdiction subset by currency and sum the item VAT column.
fn currency_slices(records: &[TransactionRecord], jurisdiction: &str) -> Vec<CurrencySlice> {
    let mut grouped: BTreeMap<String, (usize, BigDecimal)> = BTreeMap::new();

    for record in records
        .iter()
        .filter(|r| r.taxable_jurisdiction == jurisdiction)
    {
        let entry = grouped
            .entry(record.transaction_currency_code.clone())
            .or_insert_with(|| (0, BigDecimal::from(0)));
        entry.0 += 1;
        entry.1 += record.amount(MonetaryField::PriceOfItemsVatAmt);
    }

    grouped
        .into_iter()
        .map(|(currency, (count, item_vat_total))| CurrencySlice {
            currency,
            count,
            item_vat_total,
        })
        .collect()
}

impl fmt::Display for ReconciliationReport {
    /// Renders the human-readable diagnostic text: per-currency totals
    /// before conversion, one line per applied conversion, the VAT column
    /// breakdown and the final discrepancy line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total {} B2C/B2B transactions: {}",
            self.jurisdiction, self.jurisdiction_count
        )?;

        writeln!(f, "\nBEFORE currency conversion:")?;
        for slice in &self.before_conversion {
            writeln!(
                f,
                "  {}: {} transactions, PRICE_OF_ITEMS_VAT_AMT total: {}",
                slice.currency,
                slice.count,
                round_eur(&slice.item_vat_total)
            )?;
        }

        writeln!(f, "\nApplying currency conversion...")?;
        for conversion in &self.conversions {
            writeln!(
                f,
                "Converting {} transaction {}: {} -> EUR (rate: {})",
                conversion.jurisdiction, conversion.row, conversion.currency, conversion.rate
            )?;
            writeln!(
                f,
                "  PRICE_OF_ITEMS_VAT_AMT: {} -> {}",
                conversion.item_vat_before, conversion.item_vat_after
            )?;
        }
        writeln!(f, "Total conversions applied: {}", self.conversions.len())?;

        writeln!(f, "\nAFTER currency conversion:")?;
        writeln!(f, "VAT column breakdown for {}:", self.jurisdiction)?;
        for (field, total) in &self.vat_by_field {
            writeln!(f, "  {}: {}", field.header(), round_eur(total))?;
        }

        writeln!(
            f,
            "\nCalculated IVA (€) total for {}: {}",
            self.jurisdiction,
            round_eur(&self.actual_total)
        )?;
        writeln!(f, "Expected reference total: {}", round_eur(&self.expected_total))?;
        write!(f, "Difference: {}", round_eur(&self.difference))
    }
}
