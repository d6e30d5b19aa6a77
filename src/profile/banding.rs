//! Banding lookup against scoring tables.
//!
//! Two lookups exist and are kept apart:
//!
//! | Strategy           | Input            | Row selection                           |
//! |--------------------|------------------|-----------------------------------------|
//! | `ZScore`           | standardized score | first row (ascending `min_raw_score`) covering the score |
//! | `DirectPercentile` | raw mean score   | curve percentile → label → first row with that label |

use crate::profile::percentile::{BandScale, PercentileCurve, banding_index};
use crate::profile::types::{BandResult, ScoreRecord};
use crate::repository::ScoringTableRepository;
use tracing::debug;

/// Resolves band labels for one test type.
pub struct BandingResolver<'a> {
    table: &'a dyn ScoringTableRepository,
    curve: &'a PercentileCurve,
    scale: &'a BandScale,
}

impl<'a> BandingResolver<'a> {
    pub fn new(
        table: &'a dyn ScoringTableRepository,
        curve: &'a PercentileCurve,
        scale: &'a BandScale,
    ) -> Self {
        Self { table, curve, scale }
    }

    /// First row, in ascending `min_raw_score` order, whose range covers `score`.
    ///
    /// Overlapping ranges are not rejected; the lowest lower bound wins.
    pub fn resolve_banding(
        &self,
        question_code_id: u32,
        test_type_id: u32,
        score: f64,
    ) -> Option<BandResult> {
        self.table
            .get_scoring_rows(question_code_id, test_type_id)
            .iter()
            .find(|row| row.covers(score))
            .map(BandResult::from_row)
    }

    /// Maps a raw mean score through the percentile curve to a label, then
    /// takes the first row of the test type carrying that label for the
    /// question code. The percentile comes from the curve, not the row.
    pub fn resolve_by_label(
        &self,
        question_code_id: u32,
        test_type_id: u32,
        raw_score: f64,
    ) -> Option<BandResult> {
        let percentile = self.curve.percentile_for_raw_score(raw_score)?;
        let label = self.scale.label_for_percentile(percentile)?;

        self.table
            .get_test_type_rows(test_type_id)
            .iter()
            .find(|row| row.question_code_id == question_code_id && row.banding == label)
            .map(|row| BandResult {
                percentile: Some(percentile),
                ..BandResult::from_row(row)
            })
    }
}

/// How a family turns an aggregated record into a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationStrategy {
    /// Average `avg_score`, standardize against the norm, range lookup.
    ZScore,
    /// Average `mean_score` as is, percentile curve, label lookup.
    DirectPercentile,
}

impl NormalizationStrategy {
    /// Whether the aggregator should average and standardize `avg_score`.
    pub fn use_average(self) -> bool {
        matches!(self, NormalizationStrategy::ZScore)
    }

    pub fn compute_band(
        self,
        resolver: &BandingResolver,
        test_type_id: u32,
        record: &ScoreRecord,
    ) -> Option<BandResult> {
        let question_code_id = record.question_code_ref?;
        match self {
            NormalizationStrategy::ZScore => {
                resolver.resolve_banding(question_code_id, test_type_id, record.mean_score)
            }
            NormalizationStrategy::DirectPercentile => {
                resolver.resolve_by_label(question_code_id, test_type_id, record.mean_score)
            }
        }
    }

    /// Annotates `record`, leaving it unbanded when nothing matches.
    pub fn annotate(
        self,
        resolver: &BandingResolver,
        test_type_id: u32,
        record: ScoreRecord,
    ) -> ScoreRecord {
        match self.compute_band(resolver, test_type_id, &record) {
            Some(band) => {
                let index = banding_index(&band.banding);
                record.with_band(band, index)
            }
            None => {
                debug!(
                    group = %record.group_name,
                    subfactor = %record.subfactor_name,
                    question_code = ?record.question_code_ref,
                    score = record.mean_score,
                    "No banding row matched"
                );
                record
            }
        }
    }
}
