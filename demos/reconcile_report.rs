//! Reconciliation diagnostic over a VAT transaction report
//!
//! Usage: reconcile_report <path/to/report.csv> [jurisdiction] [expected_total]

use std::env;

use anyhow::{bail, Context, Result};
use bigdecimal::BigDecimal;
use tracing_subscriber::EnvFilter;
use vat_recon_core::{reconcile_file, ReconcileConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        bail!("Usage: reconcile_report <path/to/report.csv> [jurisdiction] [expected_total]");
    }

    let mut config = ReconcileConfig::default();
    if let Some(jurisdiction) = args.get(2) {
        config.jurisdiction = jurisdiction.clone();
    }
    if let Some(expected) = args.get(3) {
        config.expected_total = expected
            .parse::<BigDecimal>()
            .with_context(|| format!("invalid expected total: {expected}"))?;
    }

    println!("🧾 VAT Reconciliation Report\n");
    let report = reconcile_file(&args[1], &config)
        .with_context(|| format!("failed to reconcile {}", args[1]))?;
    println!("{report}");

    Ok(())
}
