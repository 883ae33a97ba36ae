//! Tri-state classification of a measurement against configured bounds.

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Normal,
    High,
}

/// `value < min` is `Low`, `value > max` is `High`, anything else is `Normal`.
///
/// Total over all inputs. The low test runs first, so an inverted range
/// classifies a value under `min` as `Low` even when it also exceeds `max`.
pub fn classify(value: f64, min: f64, max: f64) -> Level {
    if value < min {
        Level::Low
    } else if value > max {
        Level::High
    } else {
        Level::Normal
    }
}
