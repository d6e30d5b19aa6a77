use super::{NormRepository, OrderRepository, ScoreRepository, ScoringTableRepository};
use crate::profile::types::{
    CandidateScoreRow, Order, QuestionCodeNorm, ScoringRow, Test, TestType,
};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Test type family whose competency rows are left out of group profiles.
const COMPETENCY_EXCLUDING_PREFIX: &str = "OPA";

/// In-memory reference tables loaded from CSV exports.
///
/// Expected files in the data directory: `orders.csv`, `test_types.csv`,
/// `tests.csv`, `candidate_scores.csv`, `question_codes.csv` and
/// `scorings.csv`.
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    pub orders: Vec<Order>,
    pub test_types: Vec<TestType>,
    pub tests: Vec<Test>,
    pub scores: Vec<CandidateScoreRow>,
    pub norms: Vec<QuestionCodeNorm>,
    pub scorings: Vec<ScoringRow>,
}

impl Dataset {
    pub fn load(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let dataset = Dataset {
            orders: load_rows(&base_dir.join("orders.csv"))?,
            test_types: load_rows(&base_dir.join("test_types.csv"))?,
            tests: load_rows(&base_dir.join("tests.csv"))?,
            scores: load_rows(&base_dir.join("candidate_scores.csv"))?,
            norms: load_rows(&base_dir.join("question_codes.csv"))?,
            scorings: load_rows(&base_dir.join("scorings.csv"))?,
        };

        debug!(
            dir = %base_dir.display(),
            orders = dataset.orders.len(),
            scores = dataset.scores.len(),
            norms = dataset.norms.len(),
            scorings = dataset.scorings.len(),
            "Dataset loaded"
        );

        Ok(dataset)
    }

    fn excludes_competencies(&self, test_type_id: u32) -> bool {
        self.find_test_type(test_type_id)
            .is_some_and(|t| t.prefix() == COMPETENCY_EXCLUDING_PREFIX)
    }
}

fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: T = result.with_context(|| format!("invalid row in {}", path.display()))?;
        rows.push(record);
    }

    Ok(rows)
}

impl ScoreRepository for Dataset {
    fn fetch_grouped_scores(
        &self,
        order_id: u32,
        test_id: u32,
        test_type_id: u32,
    ) -> Vec<CandidateScoreRow> {
        let skip_competencies = self.excludes_competencies(test_type_id);

        let mut rows: Vec<CandidateScoreRow> = self
            .scores
            .iter()
            .filter(|r| r.order_id == order_id && r.test_id == test_id)
            .filter(|r| !(skip_competencies && r.is_competency))
            .cloned()
            .collect();

        rows.sort_by_key(|r| (r.order_candidate_test_id, r.sequence_no));
        rows
    }
}

impl NormRepository for Dataset {
    fn get_norm(&self, question_code_id: u32) -> Option<QuestionCodeNorm> {
        self.norms.iter().find(|n| n.id == question_code_id).cloned()
    }
}

impl ScoringTableRepository for Dataset {
    fn get_scoring_rows(&self, question_code_id: u32, test_type_id: u32) -> Vec<ScoringRow> {
        let mut rows: Vec<ScoringRow> = self
            .scorings
            .iter()
            .filter(|s| s.question_code_id == question_code_id && s.test_type_id == test_type_id)
            .cloned()
            .collect();

        // Stable, so equal lower bounds keep table order.
        rows.sort_by(|a, b| a.lower_bound().total_cmp(&b.lower_bound()));
        rows
    }

    fn get_test_type_rows(&self, test_type_id: u32) -> Vec<ScoringRow> {
        self.scorings
            .iter()
            .filter(|s| s.test_type_id == test_type_id)
            .cloned()
            .collect()
    }
}

impl OrderRepository for Dataset {
    fn find_order(&self, order_id: u32) -> Option<Order> {
        self.orders.iter().find(|o| o.id == order_id).cloned()
    }

    fn find_test_type(&self, test_type_id: u32) -> Option<TestType> {
        self.test_types.iter().find(|t| t.id == test_type_id).cloned()
    }

    fn find_test(&self, test_id: u32) -> Option<Test> {
        self.tests.iter().find(|t| t.id == test_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(candidate: u32, seq: i32, competency: bool) -> CandidateScoreRow {
        CandidateScoreRow {
            order_candidate_test_id: candidate,
            order_id: 1,
            test_id: 10,
            group_name: "Thinking".to_string(),
            subfactor_name: format!("S{seq}"),
            sequence_no: seq,
            avg_score: 3.0,
            mean_score: 0.0,
            question_code_id: None,
            is_competency: competency,
        }
    }

    fn scoring(min: Option<f64>, banding: &str) -> ScoringRow {
        ScoringRow {
            question_code_id: 5,
            test_type_id: 2,
            min_raw_score: min,
            max_raw_score: None,
            banding: banding.to_string(),
            std_score: None,
            percentile: None,
            report_desc: None,
            suggested_development_guide: None,
        }
    }

    #[test]
    fn test_scores_sorted_by_candidate_then_sequence() {
        let dataset = Dataset {
            scores: vec![score(2, 1, false), score(1, 2, false), score(1, 1, false)],
            ..Default::default()
        };

        let rows = dataset.fetch_grouped_scores(1, 10, 99);
        let keys: Vec<_> = rows
            .iter()
            .map(|r| (r.order_candidate_test_id, r.sequence_no))
            .collect();
        assert_eq!(keys, vec![(1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_opa_excludes_competencies() {
        let dataset = Dataset {
            test_types: vec![
                TestType { id: 3, name: "OPA-STD".to_string() },
                TestType { id: 4, name: "CAP-STD".to_string() },
            ],
            scores: vec![score(1, 1, true), score(1, 2, false)],
            ..Default::default()
        };

        assert_eq!(dataset.fetch_grouped_scores(1, 10, 3).len(), 1);
        assert_eq!(dataset.fetch_grouped_scores(1, 10, 4).len(), 2);
    }

    #[test]
    fn test_scoring_rows_ordered_by_lower_bound() {
        let dataset = Dataset {
            scorings: vec![
                scoring(Some(1.0), "High"),
                scoring(None, "Low"),
                scoring(Some(-1.0), "Average"),
            ],
            ..Default::default()
        };

        let bandings: Vec<_> = dataset
            .get_scoring_rows(5, 2)
            .into_iter()
            .map(|r| r.banding)
            .collect();
        assert_eq!(bandings, vec!["Low", "Average", "High"]);
        assert!(dataset.get_scoring_rows(5, 3).is_empty());
    }

    #[test]
    fn test_scoring_rows_with_nan_bound_still_sort() {
        let dataset = Dataset {
            scorings: vec![
                scoring(Some(f64::NAN), "Broken"),
                scoring(Some(1.0), "High"),
                scoring(None, "Low"),
                scoring(Some(f64::NAN), "Broken"),
            ],
            ..Default::default()
        };

        let bandings: Vec<_> = dataset
            .get_scoring_rows(5, 2)
            .into_iter()
            .map(|r| r.banding)
            .collect();
        assert_eq!(bandings, vec!["Low", "High", "Broken", "Broken"]);
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let dir = std::env::temp_dir().join("group_profile_missing_dataset_dir");
        assert!(Dataset::load(&dir).is_err());
    }
}
