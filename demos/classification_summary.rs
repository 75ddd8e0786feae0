//! Per-category breakdown of a VAT transaction report
//!
//! Usage: classification_summary <path/to/report.csv>

use std::collections::BTreeMap;
use std::env;

use anyhow::{bail, Context, Result};
use bigdecimal::BigDecimal;
use tracing_subscriber::EnvFilter;
use vat_recon_core::{
    load_records, normalize_records, round_eur, vat_total, Buckets, ExchangeRates, TaxCategory,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        bail!("Usage: classification_summary <path/to/report.csv>");
    }

    let records = load_records(&args[1]).with_context(|| format!("failed to load {}", args[1]))?;
    println!("📊 Classified {} transactions\n", records.len());

    let buckets = Buckets::partition(records);
    for (category, rows) in buckets.iter() {
        println!("{}: {} rows", category.label(), rows.len());
    }

    // Jurisdiction-level IVA totals for the domestic bucket, in EUR.
    let domestic = buckets.bucket(TaxCategory::B2cB2bLocal);
    if domestic.is_empty() {
        return Ok(());
    }

    let normalization = normalize_records(domestic, &ExchangeRates::fixed());
    let mut totals: BTreeMap<String, BigDecimal> = BTreeMap::new();
    for record in &normalization.records {
        let entry = totals
            .entry(record.taxable_jurisdiction.clone())
            .or_insert_with(|| BigDecimal::from(0));
        *entry += vat_total(record);
    }

    println!("\nIVA (€) per jurisdiction, {} section:", TaxCategory::B2cB2bLocal.name());
    for (jurisdiction, total) in totals {
        println!("  {jurisdiction}: {}", round_eur(&total));
    }

    Ok(())
}
