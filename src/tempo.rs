//! # Tempo Filter Planning
//!
//! Scompone un moltiplicatore di velocità arbitrario in una catena di
//! stadi `atempo`, ognuno nel range supportato da ffmpeg `[0.5, 2.0]`.
//!
//! ## Esempio:
//! ```ignore
//! let chain = FilterChain::plan(4.0)?;
//! assert_eq!(chain.to_filter_expr(), "atempo=2,atempo=2");
//! ```

use crate::error::{ConvertError, Result};
use std::fmt;

/// Smallest ratio a single `atempo` stage accepts.
pub const MIN_STAGE_RATIO: f64 = 0.5;
/// Largest ratio a single `atempo` stage accepts.
pub const MAX_STAGE_RATIO: f64 = 2.0;

const EPSILON: f64 = 1e-9;
const FILTER_NAME: &str = "atempo";

/// Check that a requested speed is usable as a tempo ratio.
pub fn validate_speed(speed: f64) -> Result<f64> {
    if !speed.is_finite() {
        return Err(ConvertError::InvalidSpeed("Speed must be a number.".to_string()));
    }
    if speed <= 0.0 {
        return Err(ConvertError::InvalidSpeed(
            "Speed must be greater than 0.".to_string(),
        ));
    }
    Ok(speed)
}

/// Ordered `atempo` stages whose product is the requested speed
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    stages: Vec<f64>,
}

impl FilterChain {
    /// Plan the stages for `speed`, rejecting non-finite or non-positive input.
    ///
    /// Factors of 2 are peeled off while the residual is above 2, factors of
    /// 0.5 while it is below 0.5; the residual is appended unless it is 1 and
    /// some factor was already extracted. The chain is never empty and every
    /// stage lies in `[0.5, 2.0]`.
    pub fn plan(speed: f64) -> Result<Self> {
        let mut remaining = validate_speed(speed)?;
        let mut stages = Vec::new();

        while remaining > MAX_STAGE_RATIO + EPSILON {
            stages.push(MAX_STAGE_RATIO);
            remaining /= MAX_STAGE_RATIO;
        }
        while remaining < MIN_STAGE_RATIO - EPSILON {
            stages.push(MIN_STAGE_RATIO);
            remaining /= MIN_STAGE_RATIO;
        }

        // A residual within EPSILON of a bound is snapped onto it.
        let remaining = remaining.clamp(MIN_STAGE_RATIO, MAX_STAGE_RATIO);
        if stages.is_empty() || (remaining - 1.0).abs() > EPSILON {
            stages.push(remaining);
        }

        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[f64] {
        &self.stages
    }

    /// Combined ratio of every stage.
    pub fn product(&self) -> f64 {
        self.stages.iter().product()
    }

    /// Render as the `-filter:a` argument, e.g. `atempo=2,atempo=1.5`.
    pub fn to_filter_expr(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, ratio) in self.stages.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", FILTER_NAME, ratio)?;
        }
        Ok(())
    }
}
