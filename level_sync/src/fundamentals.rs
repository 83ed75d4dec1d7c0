//! Shaping provider reference data into fundamentals record fields.
//!
//! The provider only covers part of the fundamentals attribute set; the
//! remaining keys stay null via the merger's seeding. A failed lookup
//! degrades to a symbol-only record so the batch keeps its 1:1 shape.

use market_data_ingestor::providers::polygon_rest::{PolygonProvider, TickerDetails};
use serde_json::{Value, json};
use tracing::error;

use crate::record::SymbolRecord;

/// Fetches and shapes fundamentals for one symbol. Never fails: provider
/// errors degrade to a record carrying only the symbol.
pub async fn fetch_fundamentals(
    provider: &PolygonProvider,
    symbol: &str,
    today: &str,
) -> SymbolRecord {
    match provider.ticker_details(symbol).await {
        Ok(details) => shape(symbol, &details, today),
        Err(e) => {
            error!(symbol, error = %e, "fundamentals lookup failed");
            let mut record = SymbolRecord::new();
            record.set("symbol", json!(symbol));
            record
        }
    }
}

/// Fetches fundamentals for a batch, sequentially, one record per symbol.
pub async fn fetch_all(
    provider: &PolygonProvider,
    symbols: &[String],
    today: &str,
) -> Vec<SymbolRecord> {
    let mut records = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        records.push(fetch_fundamentals(provider, symbol, today).await);
    }
    records
}

fn opt_str(v: &Option<String>) -> Value {
    v.as_ref().map_or(Value::Null, |s| json!(s))
}

fn shape(symbol: &str, details: &TickerDetails, today: &str) -> SymbolRecord {
    let mut record = SymbolRecord::new();
    record.set("symbol", json!(symbol));
    record.set("name", opt_str(&details.name));
    record.set("listingExchange", opt_str(&details.primary_exchange));
    record.set(
        "securityType",
        match details.security_type.as_deref() {
            Some("CS") => json!("Common Stock"),
            other => other.map_or(Value::Null, |t| json!(t)),
        },
    );
    record.set("sector", opt_str(&details.sic_description));
    record.set("industry", opt_str(&details.sic_description));
    record.set(
        "countryDomicile",
        match details.locale.as_deref() {
            Some("us") => json!("US"),
            other => other.map_or(Value::Null, |l| json!(l)),
        },
    );
    record.set(
        "outstandingShares",
        details
            .share_class_shares_outstanding
            .map_or(Value::Null, |v| json!(v)),
    );
    record.set(
        "float",
        details
            .weighted_shares_outstanding
            .map_or(Value::Null, |v| json!(v)),
    );
    record.set("optionable", json!(true));
    record.set("lotSize", details.round_lot.map_or(Value::Null, |v| json!(v)));

    let address = details.address.clone().unwrap_or_default();
    let branding = details.branding.clone().unwrap_or_default();
    record.set(
        "polygon_details",
        json!({
            "active": details.active,
            "address": {
                "address1": address.address1,
                "city": address.city,
                "postal_code": address.postal_code,
                "state": address.state,
            },
            "branding": {
                "icon_url": branding.icon_url,
                "logo_url": branding.logo_url,
            },
            "cik": details.cik,
            "composite_figi": details.composite_figi,
            "currency_name": details.currency_name,
            "description": details.description,
            "homepage_url": details.homepage_url,
            "list_date": details.list_date,
            "market_cap": details.market_cap,
            "phone_number": details.phone_number,
            "share_class_figi": details.share_class_figi,
            "sic_code": details.sic_code,
            "ticker_root": details.ticker_root,
            "total_employees": details.total_employees,
            "weighted_shares_outstanding": details.weighted_shares_outstanding,
        }),
    );
    record.set("today_date", json!(today));
    record
}
