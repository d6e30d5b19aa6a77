//! Read-only reference data consumed by the profile pipeline.
//!
//! Each trait is a narrow view over one table. [`Dataset`] implements all of
//! them from a directory of CSV exports.

mod dataset;

pub use dataset::Dataset;

use crate::profile::types::{
    CandidateScoreRow, Order, QuestionCodeNorm, ScoringRow, Test, TestType,
};

/// Per-candidate sub-scores of a test administration.
pub trait ScoreRepository {
    /// Rows for `order_id`/`test_id`, ordered by candidate test then sequence
    /// number, with test-type specific exclusions already applied.
    fn fetch_grouped_scores(
        &self,
        order_id: u32,
        test_id: u32,
        test_type_id: u32,
    ) -> Vec<CandidateScoreRow>;
}

pub trait NormRepository {
    fn get_norm(&self, question_code_id: u32) -> Option<QuestionCodeNorm>;
}

pub trait ScoringTableRepository {
    /// Rows for one question code and test type, ordered by `min_raw_score`.
    fn get_scoring_rows(&self, question_code_id: u32, test_type_id: u32) -> Vec<ScoringRow>;

    /// Every row of a test type, in table order.
    fn get_test_type_rows(&self, test_type_id: u32) -> Vec<ScoringRow>;
}

pub trait OrderRepository {
    fn find_order(&self, order_id: u32) -> Option<Order>;
    fn find_test_type(&self, test_type_id: u32) -> Option<TestType>;
    fn find_test(&self, test_id: u32) -> Option<Test>;
}
