//! Percentile curve and banding scale for families scored by raw percentile.

use serde::{Deserialize, Serialize};

/// The seven banding labels, lowest first.
pub const BANDING_LABELS: [&str; 7] = [
    "Very Low",
    "Low",
    "Moderately Low",
    "Average",
    "Moderately High",
    "High",
    "Very High",
];

/// Position of `label` on the seven-label scale.
pub fn banding_index(label: &str) -> Option<usize> {
    BANDING_LABELS.iter().position(|l| *l == label)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Lowest raw score mapped to `percentile`.
    pub raw_score: f64,
    pub percentile: f64,
}

/// Step curve from raw mean score to percentile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PercentileCurve {
    points: Vec<CurvePoint>,
}

impl PercentileCurve {
    pub fn new(mut points: Vec<CurvePoint>) -> Self {
        points.sort_by(|a, b| a.raw_score.total_cmp(&b.raw_score));
        Self { points }
    }

    /// Percentile of the last point whose raw score is at or below `raw`.
    ///
    /// Scores below the first point take the first point's percentile.
    /// Returns `None` only for an empty curve.
    pub fn percentile_for_raw_score(&self, raw: f64) -> Option<f64> {
        self.points
            .iter()
            .rev()
            .find(|p| p.raw_score <= raw)
            .or_else(|| self.points.first())
            .map(|p| p.percentile)
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }
}

/// OM curve for mean item scores on a 1–5 scale.
impl Default for PercentileCurve {
    fn default() -> Self {
        let points = [
            (1.0, 1.0),
            (1.5, 2.0),
            (2.0, 5.0),
            (2.4, 10.0),
            (2.8, 16.0),
            (3.0, 25.0),
            (3.2, 35.0),
            (3.4, 45.0),
            (3.6, 55.0),
            (3.8, 65.0),
            (4.0, 75.0),
            (4.2, 84.0),
            (4.4, 90.0),
            (4.6, 95.0),
            (4.8, 98.0),
            (5.0, 99.0),
        ];
        Self::new(
            points
                .into_iter()
                .map(|(raw_score, percentile)| CurvePoint { raw_score, percentile })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandThreshold {
    pub label: String,
    /// Exclusive upper percentile bound.
    pub below: f64,
}

/// Ordered percentile cut-offs for the banding labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandScale {
    thresholds: Vec<BandThreshold>,
}

impl BandScale {
    pub fn new(thresholds: Vec<BandThreshold>) -> Self {
        Self { thresholds }
    }

    /// First label whose bound exceeds `percentile`, else the top label.
    pub fn label_for_percentile(&self, percentile: f64) -> Option<&str> {
        self.thresholds
            .iter()
            .find(|t| percentile < t.below)
            .or_else(|| self.thresholds.last())
            .map(|t| t.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

impl Default for BandScale {
    fn default() -> Self {
        let bounds = [4.0, 11.0, 23.0, 77.0, 89.0, 96.0, 100.0];
        Self::new(
            BANDING_LABELS
                .iter()
                .zip(bounds)
                .map(|(label, below)| BandThreshold { label: label.to_string(), below })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_steps() {
        let curve = PercentileCurve::default();
        assert_eq!(curve.percentile_for_raw_score(3.0), Some(25.0));
        assert_eq!(curve.percentile_for_raw_score(3.1), Some(25.0));
        assert_eq!(curve.percentile_for_raw_score(5.0), Some(99.0));
        assert_eq!(curve.percentile_for_raw_score(7.0), Some(99.0));
    }

    #[test]
    fn test_curve_below_first_point() {
        let curve = PercentileCurve::default();
        assert_eq!(curve.percentile_for_raw_score(0.2), Some(1.0));
    }

    #[test]
    fn test_curve_sorts_points() {
        let curve = PercentileCurve::new(vec![
            CurvePoint { raw_score: 2.0, percentile: 80.0 },
            CurvePoint { raw_score: 1.0, percentile: 20.0 },
        ]);
        assert_eq!(curve.percentile_for_raw_score(1.5), Some(20.0));
        assert_eq!(PercentileCurve::new(vec![]).percentile_for_raw_score(1.0), None);
    }

    #[test]
    fn test_scale_boundaries() {
        let scale = BandScale::default();
        assert_eq!(scale.len(), 7);
        assert_eq!(scale.label_for_percentile(1.0), Some("Very Low"));
        assert_eq!(scale.label_for_percentile(4.0), Some("Low"));
        assert_eq!(scale.label_for_percentile(22.9), Some("Moderately Low"));
        assert_eq!(scale.label_for_percentile(50.0), Some("Average"));
        assert_eq!(scale.label_for_percentile(77.0), Some("Moderately High"));
        assert_eq!(scale.label_for_percentile(95.0), Some("High"));
        assert_eq!(scale.label_for_percentile(99.0), Some("Very High"));
    }

    #[test]
    fn test_banding_index() {
        assert_eq!(banding_index("Very Low"), Some(0));
        assert_eq!(banding_index("Average"), Some(3));
        assert_eq!(banding_index("Superb"), None);
    }
}
