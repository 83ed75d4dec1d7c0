//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching time-series bar data from any market data vendor.
//!
//! Each concrete provider implementation (such as Polygon.io) should implement
//! [`DataProvider`] to handle vendor-specific API logic and validation.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn DataProvider`) for runtime selection of providers.

pub mod errors;
pub mod polygon_rest;

use async_trait::async_trait;

use crate::{
    models::{bar_series::BarSeries, request_params::BarsRequestParams},
    providers::errors::ProviderError,
};

pub use errors::ProviderInitError;

#[async_trait]
pub trait DataProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::models::timeframe::TimeFrame;

    use super::*;

    struct StaticProvider;
    struct EmptyProvider;

    #[async_trait]
    impl DataProvider for StaticProvider {
        async fn fetch_bars(
            &self,
            params: BarsRequestParams,
        ) -> Result<Vec<BarSeries>, ProviderError> {
            Ok(params
                .symbols
                .iter()
                .map(|s| BarSeries::empty(s.clone(), params.timeframe, params.start, params.end))
                .collect())
        }
    }

    #[async_trait]
    impl DataProvider for EmptyProvider {
        async fn fetch_bars(
            &self,
            _params: BarsRequestParams,
        ) -> Result<Vec<BarSeries>, ProviderError> {
            Ok(vec![])
        }
    }

    fn get_provider(name: &str) -> Box<dyn DataProvider> {
        if name == "static" {
            Box::new(StaticProvider)
        } else {
            Box::new(EmptyProvider)
        }
    }

    #[tokio::test]
    async fn test_dynamic_provider() {
        // We get a provider without knowing the concrete type; the trait
        // contract is all the caller relies on.
        let provider = get_provider("static");

        let params = BarsRequestParams {
            symbols: vec!["AAPL".to_string()],
            timeframe: TimeFrame::minutes(1),
            start: Utc::now(),
            end: Utc::now(),
            provider_specific: Default::default(),
        };

        let result = provider.fetch_bars(params).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].symbol, "AAPL");
        assert!(result[0].is_empty());
    }
}
