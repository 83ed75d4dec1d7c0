use serde::Deserialize;

/// One aggregate bar as returned by the `/v2/aggs` endpoints.
#[derive(Deserialize, Debug)]
pub struct PolygonAggBar {
    /// Epoch milliseconds for the start of the aggregate window.
    #[serde(rename = "t")]
    pub timestamp_millis: i64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v")]
    pub volume: f64,
    #[serde(rename = "n")]
    pub trade_count: Option<u64>,
    #[serde(rename = "vw")]
    pub vwap: Option<f64>,
}

/// Response envelope for aggregates. `results` is absent when the window
/// holds no bars; `next_url` carries the pagination cursor.
#[derive(Deserialize, Debug)]
pub struct AggsResponse {
    #[serde(default)]
    pub results: Option<Vec<PolygonAggBar>>,
    pub next_url: Option<String>,
}

/// Reference details for one ticker (`/v3/reference/tickers/{ticker}`).
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TickerDetails {
    pub ticker: String,
    pub name: Option<String>,
    pub primary_exchange: Option<String>,
    #[serde(rename = "type")]
    pub security_type: Option<String>,
    pub sic_description: Option<String>,
    pub sic_code: Option<String>,
    pub market: Option<String>,
    pub locale: Option<String>,
    pub active: Option<bool>,
    pub cik: Option<String>,
    pub composite_figi: Option<String>,
    pub share_class_figi: Option<String>,
    pub currency_name: Option<String>,
    pub description: Option<String>,
    pub homepage_url: Option<String>,
    pub phone_number: Option<String>,
    pub list_date: Option<String>,
    pub ticker_root: Option<String>,
    pub market_cap: Option<f64>,
    pub total_employees: Option<u64>,
    pub round_lot: Option<i64>,
    pub share_class_shares_outstanding: Option<i64>,
    pub weighted_shares_outstanding: Option<i64>,
    pub address: Option<TickerAddress>,
    pub branding: Option<TickerBranding>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TickerAddress {
    pub address1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TickerBranding {
    pub icon_url: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TickerDetailsResponse {
    pub results: TickerDetails,
}

/// One OHLCV block inside a snapshot (today, previous day, or latest minute).
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SnapshotAgg {
    #[serde(rename = "o")]
    pub open: Option<f64>,
    #[serde(rename = "h")]
    pub high: Option<f64>,
    #[serde(rename = "l")]
    pub low: Option<f64>,
    #[serde(rename = "c")]
    pub close: Option<f64>,
    #[serde(rename = "v")]
    pub volume: Option<f64>,
    #[serde(rename = "vw")]
    pub vwap: Option<f64>,
}

/// One ticker in the gainers/losers snapshot.
#[derive(Deserialize, Debug, Clone)]
pub struct TickerSnapshot {
    pub ticker: String,
    #[serde(rename = "todaysChange")]
    pub todays_change: Option<f64>,
    #[serde(rename = "todaysChangePerc")]
    pub todays_change_percent: Option<f64>,
    pub day: Option<SnapshotAgg>,
    #[serde(rename = "prevDay")]
    pub prev_day: Option<SnapshotAgg>,
    pub min: Option<SnapshotAgg>,
}

#[derive(Deserialize, Debug)]
pub struct SnapshotResponse {
    #[serde(default)]
    pub tickers: Vec<TickerSnapshot>,
}

/// One news item from `/v2/reference/news`.
#[derive(Deserialize, Debug, Clone)]
pub struct NewsArticle {
    pub title: String,
    pub article_url: String,
    pub published_utc: String,
    pub publisher: NewsPublisher,
    #[serde(default)]
    pub tickers: Vec<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct NewsPublisher {
    pub name: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct NewsResponse {
    #[serde(default)]
    pub results: Option<Vec<NewsArticle>>,
}
