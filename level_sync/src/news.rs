//! News gathering for suggestion analysis.
//!
//! Two sources feed one normalized item shape: the market-data provider's
//! news endpoint and an optional secondary filter feed. Both degrade to an
//! empty list on any failure; a symbol without news gets a stock suggestion
//! instead of an error.

use std::time::Duration;

use chrono::DateTime;
use market_data_ingestor::providers::polygon_rest::PolygonProvider;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// One normalized news item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    /// Article headline.
    pub title: String,
    /// Canonical article URL.
    pub link: String,
    /// Publisher display name.
    pub publisher: Option<String>,
    /// Symbols the item was fetched for.
    pub symbols: Vec<String>,
    /// Publication time as a UTC epoch second.
    #[serde(rename = "utcTime")]
    pub utc_time: i64,
    /// Related tickers, when the source reports them.
    pub keywords: Vec<String>,
    /// Full article HTML, when the source carries it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
}

fn parse_utc_seconds(stamp: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(stamp)
        .ok()
        .map(|dt| dt.timestamp())
}

/// Recent provider news for one symbol, normalized. Items whose timestamp
/// does not parse are dropped with a log line, not propagated as errors.
pub async fn provider_news(
    provider: &PolygonProvider,
    symbol: &str,
    limit: u32,
) -> Vec<NewsItem> {
    let articles = match provider.ticker_news(symbol, limit).await {
        Ok(articles) => articles,
        Err(e) => {
            error!(symbol, error = %e, "provider news fetch failed");
            return Vec::new();
        }
    };

    articles
        .into_iter()
        .filter_map(|a| {
            let Some(utc_time) = parse_utc_seconds(&a.published_utc) else {
                warn!(symbol, stamp = %a.published_utc, "unparseable publication time");
                return None;
            };
            Some(NewsItem {
                title: a.title,
                link: a.article_url,
                publisher: a.publisher.name,
                symbols: vec![symbol.to_uppercase()],
                utc_time,
                keywords: a.tickers,
                html_content: None,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct NewsfilterResponse {
    #[serde(default)]
    articles: Vec<NewsfilterArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsfilterArticle {
    title: String,
    url: String,
    #[serde(rename = "publishedAt")]
    published_at: String,
    source: NewsfilterSource,
    html_content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct NewsfilterSource {
    name: Option<String>,
}

/// Client for the secondary news feed, `GET {base_url}/{symbol}`.
pub struct NewsfilterClient {
    base_url: String,
    client: Client,
}

impl NewsfilterClient {
    /// Builds a client with a 60 second request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: base_url.into(),
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
        })
    }

    /// News for one symbol, normalized; empty on any failure.
    pub async fn fetch(&self, symbol: &str) -> Vec<NewsItem> {
        let url = format!("{}/{symbol}", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(symbol, status = %r.status(), "news filter feed returned an error");
                return Vec::new();
            }
            Err(e) => {
                error!(symbol, error = %e, "news filter feed request failed");
                return Vec::new();
            }
        };

        let parsed: NewsfilterResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                error!(symbol, error = %e, "news filter feed payload did not parse");
                return Vec::new();
            }
        };

        parsed
            .articles
            .into_iter()
            .filter_map(|a| {
                let utc_time = parse_utc_seconds(&a.published_at)?;
                Some(NewsItem {
                    title: a.title,
                    link: a.url,
                    publisher: a.source.name,
                    symbols: vec![symbol.to_uppercase()],
                    utc_time,
                    keywords: Vec::new(),
                    html_content: a.html_content,
                })
            })
            .collect()
    }
}

/// Merges both sources for one symbol: provider items first, then the
/// secondary feed when configured.
pub async fn gather_news(
    provider: &PolygonProvider,
    newsfilter: Option<&NewsfilterClient>,
    symbol: &str,
    limit: u32,
) -> Vec<NewsItem> {
    let mut items = provider_news(provider, symbol, limit).await;
    if let Some(client) = newsfilter {
        items.extend(client.fetch(symbol).await);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_stamps_parse_to_epoch_seconds() {
        assert_eq!(parse_utc_seconds("1970-01-01T00:01:00Z"), Some(60));
        assert_eq!(
            parse_utc_seconds("2025-03-03T09:30:00-05:00"),
            Some(1741012200)
        );
        assert_eq!(parse_utc_seconds("yesterday-ish"), None);
    }

    #[test]
    fn news_item_serializes_with_the_feed_field_names() {
        let item = NewsItem {
            title: "Alpha beats".to_string(),
            link: "https://example.com/a".to_string(),
            publisher: Some("Example Wire".to_string()),
            symbols: vec!["AAA".to_string()],
            utc_time: 60,
            keywords: vec![],
            html_content: None,
        };
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["utcTime"], 60);
        assert!(v.get("html_content").is_none());
    }
}
