//! # Trend Synthesizer
//! Derives a short illustrative time series from the aggregate's positive
//! ratio. Explicitly synthetic — the API contract labels it as derived, not
//! measured history.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const TREND_POINTS: usize = 7;

/// Jitter bounds per band.
const POSITIVE_JITTER: i32 = 5;
const OTHER_JITTER: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

/// Baseline split derived from the positive share; the three bands sum
/// to 100 before jitter.
fn baseline(positive_ratio: f32) -> (i32, i32, i32) {
    let ratio = positive_ratio.clamp(0.0, 1.0);
    let positive = (ratio * 60.0) as i32 + 20;
    let negative = (40 - positive).max(10);
    let neutral = 100 - positive - negative;
    (positive, neutral, negative)
}

fn jitter(base: i32, spread: i32) -> u32 {
    let v = base + rand::rng().random_range(-spread..=spread);
    v.clamp(0, 100) as u32
}

/// Produce 7 daily points around the baseline with small bounded jitter.
pub fn synthesize_trend(positive_ratio: f32) -> Vec<TrendPoint> {
    let (positive, neutral, negative) = baseline(positive_ratio);
    (1..=TREND_POINTS)
        .map(|day| TrendPoint {
            date: format!("Day {day}"),
            positive: jitter(positive, POSITIVE_JITTER),
            neutral: jitter(neutral, OTHER_JITTER),
            negative: jitter(negative, OTHER_JITTER),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_seven_labeled_points() {
        let trend = synthesize_trend(0.5);
        assert_eq!(trend.len(), TREND_POINTS);
        assert_eq!(trend[0].date, "Day 1");
        assert_eq!(trend[6].date, "Day 7");
    }

    #[test]
    fn bands_stay_within_bounds() {
        for ratio in [0.0, 0.25, 0.5, 0.75, 1.0, -3.0, 42.0] {
            for point in synthesize_trend(ratio) {
                assert!(point.positive <= 100);
                assert!(point.neutral <= 100);
                assert!(point.negative <= 100);
            }
        }
    }

    #[test]
    fn point_sums_stay_near_one_hundred() {
        for point in synthesize_trend(0.6) {
            let sum = point.positive + point.neutral + point.negative;
            assert!((85..=115).contains(&sum), "sum {sum} out of band");
        }
    }

    #[test]
    fn baseline_tracks_positive_share() {
        let (low_pos, _, low_neg) = baseline(0.0);
        let (high_pos, _, high_neg) = baseline(1.0);
        assert_eq!(low_pos, 20);
        assert_eq!(high_pos, 80);
        assert!(low_neg >= high_neg);
        for ratio in [0.0, 0.3, 0.7, 1.0] {
            let (p, n, neg) = baseline(ratio);
            assert_eq!(p + n + neg, 100);
        }
    }
}
