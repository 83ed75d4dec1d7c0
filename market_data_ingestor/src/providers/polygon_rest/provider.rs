use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shared_utils::env::get_env_var;

use crate::{
    models::{
        bar::Bar,
        bar_series::BarSeries,
        request_params::BarsRequestParams,
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{
        DataProvider, ProviderInitError,
        errors::ProviderError,
        polygon_rest::{
            params::{construct_params, validate_timeframe},
            response::{
                AggsResponse, NewsArticle, NewsResponse, SnapshotResponse, TickerDetails,
                TickerDetailsResponse, TickerSnapshot,
            },
        },
    },
};

const BASE_URL: &str = "https://api.polygon.io";

/// Every request goes through the shared limiter; the aggregates pagination
/// loop counts each page as one request.
const REQUESTS_PER_MINUTE: u32 = 60;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PolygonProvider {
    client: Client,
    _api_key: SecretString,
    limiter: DefaultDirectRateLimiter,
}

impl PolygonProvider {
    /// Creates a new Polygon provider.
    ///
    /// Reads the API key from the `POLYGON_KEY` environment variable.
    pub fn new() -> Result<Self, ProviderInitError> {
        let api_key = SecretString::new(get_env_var("POLYGON_KEY")?.into());

        let mut headers = header::HeaderMap::new();
        let mut auth =
            header::HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            _api_key: api_key,
            limiter: RateLimiter::direct(Quota::per_minute(nonzero!(REQUESTS_PER_MINUTE))),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<T, ProviderError> {
        self.limiter.until_ready().await;

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let msg = response
                .text()
                .await
                .unwrap_or_else(|_| "entitlement refused".to_string());
            return Err(ProviderError::Rejected(msg));
        }
        if !status.is_success() {
            let msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return Err(ProviderError::Api(msg));
        }

        Ok(response.json::<T>().await?)
    }

    /// Reference details for one ticker (name, exchange, share counts, ...).
    pub async fn ticker_details(&self, symbol: &str) -> Result<TickerDetails, ProviderError> {
        let url = format!("{BASE_URL}/v3/reference/tickers/{symbol}");
        let response: TickerDetailsResponse = self.get_json(&url, &[]).await?;
        Ok(response.results)
    }

    /// The full-market gainers snapshot.
    pub async fn top_gainers(&self) -> Result<Vec<TickerSnapshot>, ProviderError> {
        let url = format!("{BASE_URL}/v2/snapshot/locale/us/markets/stocks/gainers");
        let response: SnapshotResponse = self.get_json(&url, &[]).await?;
        Ok(response.tickers)
    }

    /// Most recent news for one ticker, newest first.
    pub async fn ticker_news(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<Vec<NewsArticle>, ProviderError> {
        let url = format!("{BASE_URL}/v2/reference/news");
        let query = vec![
            ("ticker".to_string(), symbol.to_string()),
            ("limit".to_string(), limit.to_string()),
            ("order".to_string(), "desc".to_string()),
            ("sort".to_string(), "published_utc".to_string()),
        ];
        let response: NewsResponse = self.get_json(&url, &query).await?;
        Ok(response.results.unwrap_or_default())
    }

    async fn fetch_symbol_bars(
        &self,
        symbol: &str,
        params: &BarsRequestParams,
    ) -> Result<BarSeries, ProviderError> {
        let (from, to) = range_bounds(params);
        let timespan = timespan_str(&params.timeframe);
        let first_url = format!(
            "{BASE_URL}/v2/aggs/ticker/{symbol}/range/{}/{timespan}/{from}/{to}",
            params.timeframe.amount
        );

        let query = construct_params(params);
        let mut bars: Vec<Bar> = Vec::new();
        let mut next_url: Option<String> = None;

        loop {
            // The cursor URL already carries the original query string.
            let page: AggsResponse = match &next_url {
                Some(url) => self.get_json(url, &[]).await?,
                None => self.get_json(&first_url, &query).await?,
            };

            for agg in page.results.unwrap_or_default() {
                let timestamp = Utc
                    .timestamp_millis_opt(agg.timestamp_millis)
                    .single()
                    .ok_or_else(|| {
                        ProviderError::Internal(format!(
                            "unrepresentable bar timestamp: {}",
                            agg.timestamp_millis
                        ))
                    })?;
                bars.push(Bar {
                    timestamp,
                    open: agg.open,
                    high: agg.high,
                    low: agg.low,
                    close: agg.close,
                    volume: agg.volume,
                    trade_count: agg.trade_count,
                    vwap: agg.vwap,
                });
            }

            match page.next_url {
                Some(url) => next_url = Some(url),
                None => break,
            }
        }

        Ok(BarSeries {
            symbol: symbol.to_string(),
            timeframe: params.timeframe,
            window_start: params.start,
            window_end: params.end,
            bars,
        })
    }
}

fn timespan_str(tf: &TimeFrame) -> &'static str {
    match tf.unit {
        TimeFrameUnit::Minute => "minute",
        TimeFrameUnit::Day => "day",
    }
}

/// Intraday requests use epoch milliseconds; daily requests use calendar dates.
fn range_bounds(params: &BarsRequestParams) -> (String, String) {
    match params.timeframe.unit {
        TimeFrameUnit::Minute => (
            params.start.timestamp_millis().to_string(),
            params.end.timestamp_millis().to_string(),
        ),
        TimeFrameUnit::Day => (
            params.start.format("%Y-%m-%d").to_string(),
            params.end.format("%Y-%m-%d").to_string(),
        ),
    }
}

#[async_trait]
impl DataProvider for PolygonProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        // Validate the timeframe before issuing any request.
        validate_timeframe(&params)?;

        let mut result = Vec::with_capacity(params.symbols.len());
        for symbol in &params.symbols {
            result.push(self.fetch_symbol_bars(symbol, &params).await?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::models::{request_params::ProviderParams, timeframe::TimeFrame};

    use super::*;

    #[test]
    fn minute_ranges_use_epoch_millis() {
        let end = Utc::now();
        let start = end - Duration::hours(2);
        let params = BarsRequestParams {
            symbols: vec!["AAPL".into()],
            timeframe: TimeFrame::minutes(1),
            start,
            end,
            provider_specific: ProviderParams::None,
        };
        let (from, to) = range_bounds(&params);
        assert_eq!(from, start.timestamp_millis().to_string());
        assert_eq!(to, end.timestamp_millis().to_string());
    }

    #[test]
    fn daily_ranges_use_calendar_dates() {
        let end = Utc::now();
        let start = end - Duration::days(730);
        let params = BarsRequestParams {
            symbols: vec!["AAPL".into()],
            timeframe: TimeFrame::daily(),
            start,
            end,
            provider_specific: ProviderParams::None,
        };
        let (from, to) = range_bounds(&params);
        assert_eq!(from, start.format("%Y-%m-%d").to_string());
        assert_eq!(to, end.format("%Y-%m-%d").to_string());
    }
}
