//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Monetary columns of a VAT transaction report.
///
/// These are the columns subject to numeric coercion on load and to
/// fixed-rate currency conversion. Every amount defaults to zero when the
/// source cell is absent or unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MonetaryField {
    CostPriceOfItems,
    PriceOfItemsAmtVatExcl,
    PromoPriceOfItemsAmtVatExcl,
    TotalPriceOfItemsAmtVatExcl,
    ShipChargeAmtVatExcl,
    PromoShipChargeAmtVatExcl,
    TotalShipChargeAmtVatExcl,
    GiftWrapAmtVatExcl,
    PromoGiftWrapAmtVatExcl,
    TotalGiftWrapAmtVatExcl,
    TotalActivityValueAmtVatExcl,
    PriceOfItemsVatRatePercent,
    PriceOfItemsVatAmt,
    PromoPriceOfItemsVatAmt,
    TotalPriceOfItemsVatAmt,
    ShipChargeVatRatePercent,
    ShipChargeVatAmt,
    PromoShipChargeVatAmt,
    TotalShipChargeVatAmt,
    GiftWrapVatRatePercent,
    GiftWrapVatAmt,
    PromoGiftWrapVatAmt,
    TotalGiftWrapVatAmt,
    TotalActivityValueVatAmt,
    PriceOfItemsAmtVatIncl,
    PromoPriceOfItemsAmtVatIncl,
    TotalPriceOfItemsAmtVatIncl,
    ShipChargeAmtVatIncl,
    PromoShipChargeAmtVatIncl,
    TotalShipChargeAmtVatIncl,
    GiftWrapAmtVatIncl,
    PromoGiftWrapAmtVatIncl,
    TotalGiftWrapAmtVatIncl,
    TotalActivityValueAmtVatIncl,
}

impl MonetaryField {
    /// Every monetary column, in report column order.
    pub const ALL: [MonetaryField; 34] = [
        MonetaryField::CostPriceOfItems,
        MonetaryField::PriceOfItemsAmtVatExcl,
        MonetaryField::PromoPriceOfItemsAmtVatExcl,
        MonetaryField::TotalPriceOfItemsAmtVatExcl,
        MonetaryField::ShipChargeAmtVatExcl,
        MonetaryField::PromoShipChargeAmtVatExcl,
        MonetaryField::TotalShipChargeAmtVatExcl,
        MonetaryField::GiftWrapAmtVatExcl,
        MonetaryField::PromoGiftWrapAmtVatExcl,
        MonetaryField::TotalGiftWrapAmtVatExcl,
        MonetaryField::TotalActivityValueAmtVatExcl,
        MonetaryField::PriceOfItemsVatRatePercent,
        MonetaryField::PriceOfItemsVatAmt,
        MonetaryField::PromoPriceOfItemsVatAmt,
        MonetaryField::TotalPriceOfItemsVatAmt,
        MonetaryField::ShipChargeVatRatePercent,
        MonetaryField::ShipChargeVatAmt,
        MonetaryField::PromoShipChargeVatAmt,
        MonetaryField::TotalShipChargeVatAmt,
        MonetaryField::GiftWrapVatRatePercent,
        MonetaryField::GiftWrapVatAmt,
        MonetaryField::PromoGiftWrapVatAmt,
        MonetaryField::TotalGiftWrapVatAmt,
        MonetaryField::TotalActivityValueVatAmt,
        MonetaryField::PriceOfItemsAmtVatIncl,
        MonetaryField::PromoPriceOfItemsAmtVatIncl,
        MonetaryField::TotalPriceOfItemsAmtVatIncl,
        MonetaryField::ShipChargeAmtVatIncl,
        MonetaryField::PromoShipChargeAmtVatIncl,
        MonetaryField::TotalShipChargeAmtVatIncl,
        MonetaryField::GiftWrapAmtVatIncl,
        MonetaryField::PromoGiftWrapAmtVatIncl,
        MonetaryField::TotalGiftWrapAmtVatIncl,
        MonetaryField::TotalActivityValueAmtVatIncl,
    ];

    /// The column header used for this field in the source report.
    pub fn header(&self) -> &'static str {
        match self {
            MonetaryField::CostPriceOfItems => "COST_PRICE_OF_ITEMS",
            MonetaryField::PriceOfItemsAmtVatExcl => "PRICE_OF_ITEMS_AMT_VAT_EXCL",
            MonetaryField::PromoPriceOfItemsAmtVatExcl => "PROMO_PRICE_OF_ITEMS_AMT_VAT_EXCL",
            MonetaryField::TotalPriceOfItemsAmtVatExcl => "TOTAL_PRICE_OF_ITEMS_AMT_VAT_EXCL",
            MonetaryField::ShipChargeAmtVatExcl => "SHIP_CHARGE_AMT_VAT_EXCL",
            MonetaryField::PromoShipChargeAmtVatExcl => "PROMO_SHIP_CHARGE_AMT_VAT_EXCL",
            MonetaryField::TotalShipChargeAmtVatExcl => "TOTAL_SHIP_CHARGE_AMT_VAT_EXCL",
            MonetaryField::GiftWrapAmtVatExcl => "GIFT_WRAP_AMT_VAT_EXCL",
            MonetaryField::PromoGiftWrapAmtVatExcl => "PROMO_GIFT_WRAP_AMT_VAT_EXCL",
            MonetaryField::TotalGiftWrapAmtVatExcl => "TOTAL_GIFT_WRAP_AMT_VAT_EXCL",
            MonetaryField::TotalActivityValueAmtVatExcl => "TOTAL_ACTIVITY_VALUE_AMT_VAT_EXCL",
            MonetaryField::PriceOfItemsVatRatePercent => "PRICE_OF_ITEMS_VAT_RATE_PERCENT",
            MonetaryField::PriceOfItemsVatAmt => "PRICE_OF_ITEMS_VAT_AMT",
            MonetaryField::PromoPriceOfItemsVatAmt => "PROMO_PRICE_OF_ITEMS_VAT_AMT",
            MonetaryField::TotalPriceOfItemsVatAmt => "TOTAL_PRICE_OF_ITEMS_VAT_AMT",
            MonetaryField::ShipChargeVatRatePercent => "SHIP_CHARGE_VAT_RATE_PERCENT",
            MonetaryField::ShipChargeVatAmt => "SHIP_CHARGE_VAT_AMT",
            MonetaryField::PromoShipChargeVatAmt => "PROMO_SHIP_CHARGE_VAT_AMT",
            MonetaryField::TotalShipChargeVatAmt => "TOTAL_SHIP_CHARGE_VAT_AMT",
            MonetaryField::GiftWrapVatRatePercent => "GIFT_WRAP_VAT_RATE_PERCENT",
            MonetaryField::GiftWrapVatAmt => "GIFT_WRAP_VAT_AMT",
            MonetaryField::PromoGiftWrapVatAmt => "PROMO_GIFT_WRAP_VAT_AMT",
            MonetaryField::TotalGiftWrapVatAmt => "TOTAL_GIFT_WRAP_VAT_AMT",
            MonetaryField::TotalActivityValueVatAmt => "TOTAL_ACTIVITY_VALUE_VAT_AMT",
            MonetaryField::PriceOfItemsAmtVatIncl => "PRICE_OF_ITEMS_AMT_VAT_INCL",
            MonetaryField::PromoPriceOfItemsAmtVatIncl => "PROMO_PRICE_OF_ITEMS_AMT_VAT_INCL",
            MonetaryField::TotalPriceOfItemsAmtVatIncl => "TOTAL_PRICE_OF_ITEMS_AMT_VAT_INCL",
            MonetaryField::ShipChargeAmtVatIncl => "SHIP_CHARGE_AMT_VAT_INCL",
            MonetaryField::PromoShipChargeAmtVatIncl => "PROMO_SHIP_CHARGE_AMT_VAT_INCL",
            MonetaryField::TotalShipChargeAmtVatIncl => "TOTAL_SHIP_CHARGE_AMT_VAT_INCL",
            MonetaryField::GiftWrapAmtVatIncl => "GIFT_WRAP_AMT_VAT_INCL",
            MonetaryField::PromoGiftWrapAmtVatIncl => "PROMO_GIFT_WRAP_AMT_VAT_INCL",
            MonetaryField::TotalGiftWrapAmtVatIncl => "TOTAL_GIFT_WRAP_AMT_VAT_INCL",
            MonetaryField::TotalActivityValueAmtVatIncl => "TOTAL_ACTIVITY_VALUE_AMT_VAT_INCL",
        }
    }

    /// Resolve a source column header to its monetary field, if it is one.
    pub fn from_header(header: &str) -> Option<MonetaryField> {
        MonetaryField::ALL
            .iter()
            .copied()
            .find(|f| f.header() == header)
    }
}

/// One row of a VAT transaction report.
///
/// Categorical columns are kept as plain strings exactly as they appear in
/// the source file; monetary columns live in a typed map keyed by
/// [`MonetaryField`] and default to zero when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Tax reporting scheme (REGULAR, UNION-OSS, UK_VOEC-DOMESTIC, ...)
    pub tax_reporting_scheme: String,
    /// Who collects the tax (SELLER or MARKETPLACE)
    pub tax_collection_responsibility: String,
    /// Jurisdiction whose tax rules apply to the transaction
    pub taxable_jurisdiction: String,
    /// ISO currency code the monetary columns are denominated in
    pub transaction_currency_code: String,
    /// Country the goods departed from
    pub sale_depart_country: String,
    /// Country the goods arrived in
    pub sale_arrival_country: String,
    /// Buyer VAT registration number, empty for consumer sales
    pub buyer_vat_number: String,
    /// Country of the buyer VAT registration
    pub buyer_vat_number_country: String,
    /// Supplier name for purchase rows
    pub supplier_name: String,
    /// Buyer name
    pub buyer_name: String,
    /// Transaction event code (SALE, REFUND, ...)
    pub transaction_event_code: String,
    /// Reporting period the row belongs to
    pub activity_period: String,
    amounts: BTreeMap<MonetaryField, BigDecimal>,
}

impl TransactionRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a monetary amount, defaulting to zero when the column was absent.
    pub fn amount(&self, field: MonetaryField) -> BigDecimal {
        self.amounts
            .get(&field)
            .cloned()
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Set a monetary amount.
    pub fn set_amount(&mut self, field: MonetaryField, value: BigDecimal) {
        self.amounts.insert(field, value);
    }

    /// Iterate over the monetary amounts actually present on this record.
    pub fn amounts(&self) -> impl Iterator<Item = (MonetaryField, &BigDecimal)> {
        self.amounts.iter().map(|(f, v)| (*f, v))
    }

    /// Whether the record is denominated in euros.
    pub fn is_eur(&self) -> bool {
        self.transaction_currency_code == "EUR"
    }
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("Input file not found: {0}")]
    InputNotFound(String),
    #[error("Unsupported file extension: {0} (only .csv and .txt are accepted)")]
    UnsupportedExtension(String),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
