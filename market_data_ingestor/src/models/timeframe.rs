use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },
}

/// Unit component of a bar interval. This system only fetches intraday
/// minute bars and daily bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFrameUnit {
    Minute,
    Day,
}

/// A bar interval as amount × unit (e.g., 5 × Minute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

impl TimeFrame {
    pub fn new(amount: u32, unit: TimeFrameUnit) -> Self {
        Self { amount, unit }
    }

    /// Convenience constructor for `n`-minute bars.
    pub fn minutes(amount: u32) -> Self {
        Self::new(amount, TimeFrameUnit::Minute)
    }

    /// Convenience constructor for daily bars.
    pub fn daily() -> Self {
        Self::new(1, TimeFrameUnit::Day)
    }

    /// Checks the amount/unit combination against what the aggregate
    /// endpoints accept. Providers call this before issuing a request.
    pub fn validate(&self) -> Result<(), TimeFrameError> {
        match self.unit {
            TimeFrameUnit::Minute if !(1..=59).contains(&self.amount) => {
                Err(TimeFrameError::InvalidAmount {
                    unit: self.unit,
                    message: "Minute units can only be used with amounts between 1-59.".into(),
                })
            }
            TimeFrameUnit::Day if self.amount != 1 => Err(TimeFrameError::InvalidAmount {
                unit: self.unit,
                message: "Day units can only be used with amount 1".into(),
            }),
            _ => Ok(()),
        }
    }
}
