#![cfg(test)]
use chrono::{Duration, Utc};
use market_data_ingestor::{
    models::{
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::TimeFrame,
    },
    providers::{
        DataProvider,
        polygon_rest::{PolygonBarsParams, PolygonProvider, Sort},
    },
};
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore]
async fn test_polygon_provider_fetch_bars() {
    // This test requires POLYGON_KEY to be set in the environment.
    dotenvy::dotenv().ok();
    if std::env::var("POLYGON_KEY").is_err() {
        println!("Skipping test_polygon_provider_fetch_bars: API key not set.");
        return;
    }

    let provider = PolygonProvider::new().expect("Failed to create PolygonProvider");

    let end = Utc::now() - Duration::days(1);
    let params = BarsRequestParams {
        symbols: vec!["AAPL".to_string()],
        timeframe: TimeFrame::daily(),
        start: end - Duration::days(10),
        end,
        provider_specific: ProviderParams::Polygon(PolygonBarsParams {
            sort: Some(Sort::Asc),
            limit: Some(5),
            ..Default::default()
        }),
    };

    let result = provider.fetch_bars(params).await;

    assert!(
        result.is_ok(),
        "fetch_bars returned an error: {:?}",
        result.err()
    );

    let series = result.unwrap();
    assert_eq!(series.len(), 1, "Expected 1 BarSeries for AAPL");

    let aapl = &series[0];
    assert_eq!(aapl.symbol, "AAPL");
    assert!(
        !aapl.bars.is_empty(),
        "Expected to fetch at least one bar for AAPL"
    );

    // Check that bars are sorted ascending.
    if aapl.bars.len() > 1 {
        assert!(aapl.bars[0].timestamp < aapl.bars[1].timestamp);
    }
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_polygon_provider_ticker_details() {
    dotenvy::dotenv().ok();
    if std::env::var("POLYGON_KEY").is_err() {
        println!("Skipping test_polygon_provider_ticker_details: API key not set.");
        return;
    }

    let provider = PolygonProvider::new().expect("Failed to create PolygonProvider");
    let details = provider.ticker_details("AAPL").await.expect("details");
    assert_eq!(details.ticker, "AAPL");
    assert!(details.name.is_some());
}
