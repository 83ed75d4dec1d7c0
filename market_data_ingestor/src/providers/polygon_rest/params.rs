use serde::{Deserialize, Serialize};

use crate::models::{request_params::BarsRequestParams, timeframe::TimeFrameError};

/// Specifies the sort order for the bars.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

impl Sort {
    fn as_str(&self) -> &'static str {
        match self {
            Sort::Asc => "asc",
            Sort::Desc => "desc",
        }
    }
}

/// Polygon-specific parameters for a bars request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PolygonBarsParams {
    /// Adjust for splits. Defaults to true when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted: Option<bool>,
    /// Maximum number of base aggregates per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

/// Validates the universal timeframe against what the aggregates endpoint accepts.
pub fn validate_timeframe(params: &BarsRequestParams) -> Result<(), TimeFrameError> {
    params.timeframe.validate()
}

/// Builds the query string for one aggregates request page.
pub fn construct_params(params: &BarsRequestParams) -> Vec<(String, String)> {
    let polygon = match &params.provider_specific {
        crate::models::request_params::ProviderParams::Polygon(p) => p.clone(),
        _ => PolygonBarsParams::default(),
    };

    vec![
        (
            "adjusted".to_string(),
            polygon.adjusted.unwrap_or(true).to_string(),
        ),
        (
            "sort".to_string(),
            polygon.sort.unwrap_or_default().as_str().to_string(),
        ),
        (
            "limit".to_string(),
            polygon.limit.unwrap_or(1000).to_string(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::models::{
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::TimeFrame,
    };

    use super::*;

    fn request(provider_specific: ProviderParams) -> BarsRequestParams {
        BarsRequestParams {
            symbols: vec!["AAPL".into()],
            timeframe: TimeFrame::minutes(1),
            start: Utc::now(),
            end: Utc::now(),
            provider_specific,
        }
    }

    #[test]
    fn defaults_match_the_aggregates_contract() {
        let q = construct_params(&request(ProviderParams::None));
        assert!(q.contains(&("adjusted".to_string(), "true".to_string())));
        assert!(q.contains(&("sort".to_string(), "asc".to_string())));
        assert!(q.contains(&("limit".to_string(), "1000".to_string())));
    }

    #[test]
    fn explicit_params_override_defaults() {
        let q = construct_params(&request(ProviderParams::Polygon(PolygonBarsParams {
            adjusted: Some(false),
            limit: Some(500),
            sort: Some(Sort::Desc),
        })));
        assert!(q.contains(&("adjusted".to_string(), "false".to_string())));
        assert!(q.contains(&("sort".to_string(), "desc".to_string())));
        assert!(q.contains(&("limit".to_string(), "500".to_string())));
    }
}
