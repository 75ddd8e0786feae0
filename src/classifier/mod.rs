//! Classification of transaction rows into tax categories
//!
//! Rules are applied in a fixed order and the first match wins, so a row
//! belongs to exactly one category. Bucket contents preserve the iteration
//! order of the source table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::TransactionRecord;

/// EU member state codes. GB is deliberately absent.
const EU_COUNTRIES: [&str; 27] = [
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
    "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
];

/// Departure countries whose shipments outside the set count as exports.
const EXPORT_DEPARTURE_COUNTRIES: [&str; 5] = ["ES", "DE", "FR", "IT", "PL"];

/// Supplier name identifying marketplace fee purchase rows.
const MARKETPLACE_SUPPLIER: &str = "Amazon Services Europe Sarl";

/// Tax categories, in rule application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaxCategory {
    /// Domestic B2C/B2B sales where the seller collects the tax
    B2cB2bLocal,
    /// Domestic sales carrying no VAT
    LocalSinIva,
    /// Intra-community B2B movements between two EU countries
    IntracomunitariasB2b,
    /// Union One-Stop-Shop scheme sales
    Oss,
    /// Import One-Stop-Shop deemed reseller sales
    Ioss,
    /// VAT collected and remitted by the marketplace
    MarketplaceVat,
    /// Purchases from the marketplace operator
    AmazonCompras,
    /// Shipments leaving the export departure set
    Exportaciones,
    /// Fallthrough for rows no rule matched
    Unclassified,
}

impl TaxCategory {
    /// Short category name.
    pub fn name(&self) -> &'static str {
        match self {
            TaxCategory::B2cB2bLocal => "B2C/B2B Local",
            TaxCategory::LocalSinIva => "Local Sin IVA",
            TaxCategory::IntracomunitariasB2b => "Intracomunitarias B2B",
            TaxCategory::Oss => "OSS",
            TaxCategory::Ioss => "IOSS",
            TaxCategory::MarketplaceVat => "Marketplace VAT",
            TaxCategory::AmazonCompras => "Amazon Compras",
            TaxCategory::Exportaciones => "Exportaciones",
            TaxCategory::Unclassified => "Unclassified",
        }
    }

    /// Spanish report label for the category section.
    pub fn label(&self) -> &'static str {
        match self {
            TaxCategory::B2cB2bLocal => "Ventas locales al consumidor final - B2C y B2B (EUR)",
            TaxCategory::LocalSinIva => "Ventas locales SIN IVA (EUR)",
            TaxCategory::IntracomunitariasB2b => "Ventas Intracomunitarias de bienes - B2B (EUR)",
            TaxCategory::Oss => "Ventanilla Única - OSS esquema europeo (EUR)",
            TaxCategory::Ioss => "Ventanilla Única - IOSS esquema de importación (EUR)",
            TaxCategory::MarketplaceVat => {
                "IVA recaudado y remitido por Amazon Marketplace (EUR)"
            }
            TaxCategory::AmazonCompras => "Compras a Amazon (EUR)",
            TaxCategory::Exportaciones => "Exportaciones (EUR)",
            TaxCategory::Unclassified => "Sin clasificar (EUR)",
        }
    }
}

/// Classify a single transaction row. First matching rule wins.
pub fn classify(record: &TransactionRecord) -> TaxCategory {
    if is_b2c_b2b_local(record) {
        TaxCategory::B2cB2bLocal
    } else if is_local_sin_iva(record) {
        TaxCategory::LocalSinIva
    } else if is_intracomunitarias_b2b(record) {
        TaxCategory::IntracomunitariasB2b
    } else if is_oss(record) {
        TaxCategory::Oss
    } else if is_ioss(record) {
        TaxCategory::Ioss
    } else if is_marketplace_vat(record) {
        TaxCategory::MarketplaceVat
    } else if is_amazon_compras(record) {
        TaxCategory::AmazonCompras
    } else if is_exportaciones(record) {
        TaxCategory::Exportaciones
    } else {
        TaxCategory::Unclassified
    }
}

/// Transaction records partitioned into category buckets.
///
/// Each bucket keeps the order records had in the source table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buckets {
    buckets: BTreeMap<TaxCategory, Vec<TransactionRecord>>,
}

impl Buckets {
    /// Partition records into buckets in one pass.
    pub fn partition<I>(records: I) -> Self
    where
        I: IntoIterator<Item = TransactionRecord>,
    {
        let mut buckets: BTreeMap<TaxCategory, Vec<TransactionRecord>> = BTreeMap::new();
        for record in records {
            let category = classify(&record);
            buckets.entry(category).or_default().push(record);
        }

        for (category, rows) in &buckets {
            debug!(category = category.name(), rows = rows.len(), "classified bucket");
        }

        Self { buckets }
    }

    /// Records in one category, in source order. Empty when none matched.
    pub fn bucket(&self, category: TaxCategory) -> &[TransactionRecord] {
        self.buckets.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over non-empty buckets in category order.
    pub fn iter(&self) -> impl Iterator<Item = (TaxCategory, &[TransactionRecord])> {
        self.buckets.iter().map(|(c, rows)| (*c, rows.as_slice()))
    }

    /// Total number of partitioned records.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Whether no records were partitioned.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Rule 1: seller-collected domestic sales under a regular or UK VOEC
/// domestic scheme.
fn is_b2c_b2b_local(record: &TransactionRecord) -> bool {
    matches!(
        record.tax_reporting_scheme.as_str(),
        "REGULAR" | "UK_VOEC-DOMESTIC"
    ) && record.tax_collection_responsibility == "SELLER"
}

/// Rule 2: same-country shipment, zero activity VAT, no buyer VAT number.
fn is_local_sin_iva(record: &TransactionRecord) -> bool {
    use bigdecimal::BigDecimal;

    use crate::types::MonetaryField::TotalActivityValueVatAmt;

    record.sale_depart_country == record.sale_arrival_country
        && record.amount(TotalActivityValueVatAmt) == BigDecimal::from(0)
        && record.buyer_vat_number.is_empty()
        && record.tax_collection_responsibility == "SELLER"
}

/// Rule 3: cross-border EU movement sold B2B under the regular scheme.
fn is_intracomunitarias_b2b(record: &TransactionRecord) -> bool {
    record.sale_depart_country != record.sale_arrival_country
        && is_eu(&record.sale_depart_country)
        && is_eu(&record.sale_arrival_country)
        && !record.buyer_vat_number_country.is_empty()
        && record.tax_collection_responsibility == "SELLER"
        && record.tax_reporting_scheme == "REGULAR"
}

/// Rule 4: Union OSS scheme.
fn is_oss(record: &TransactionRecord) -> bool {
    record.tax_reporting_scheme == "UNION-OSS"
}

/// Rule 5: IOSS deemed reseller shipping between two distinct EU countries.
fn is_ioss(record: &TransactionRecord) -> bool {
    record.tax_reporting_scheme == "DEEMED_RESELLER-IOSS"
        && is_eu(&record.sale_depart_country)
        && is_eu(&record.sale_arrival_country)
        && record.sale_depart_country != record.sale_arrival_country
}

/// Rule 6: marketplace-collected VAT.
fn is_marketplace_vat(record: &TransactionRecord) -> bool {
    record.tax_collection_responsibility == "MARKETPLACE"
}

/// Rule 7: purchases from the marketplace operator.
fn is_amazon_compras(record: &TransactionRecord) -> bool {
    record.supplier_name == MARKETPLACE_SUPPLIER
}

/// Rule 8: departure inside the export set, arrival outside it.
fn is_exportaciones(record: &TransactionRecord) -> bool {
    EXPORT_DEPARTURE_COUNTRIES.contains(&record.sale_depart_country.as_str())
        && !EXPORT_DEPARTURE_COUNTRIES.contains(&record.sale_arrival_country.as_str())
}

fn is_eu(country: &str) -> bool {
    EU_COUNTRIES.contains(&country)
}
