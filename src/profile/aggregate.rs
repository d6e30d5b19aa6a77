use crate::error::{ProfileError, ProfileResult};
use crate::profile::types::{CandidateScoreRow, ScoreRecord};
use crate::profile::utility::{mean, z_score};
use crate::repository::{NormRepository, OrderRepository, ScoreRepository};
use std::collections::HashMap;
use tracing::debug;

/// Rows of one (factor, subfactor) group, headed by the first row scanned.
struct Group<'a> {
    head: &'a CandidateScoreRow,
    values: Vec<f64>,
}

/// Groups per-candidate sub-scores of an order into averaged [`ScoreRecord`]s.
pub struct ScoreAggregator<'a> {
    orders: &'a dyn OrderRepository,
    scores: &'a dyn ScoreRepository,
    norms: &'a dyn NormRepository,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(
        orders: &'a dyn OrderRepository,
        scores: &'a dyn ScoreRepository,
        norms: &'a dyn NormRepository,
    ) -> Self {
        Self { orders, scores, norms }
    }

    /// Averages the order's sub-scores per (factor, subfactor).
    ///
    /// With `use_average` the per-candidate `avg_score`s are averaged and
    /// standardized against the question code's norm; without it the
    /// per-candidate `mean_score`s are averaged and taken as final.
    ///
    /// Returns an empty vector when the order has no scores for the test.
    ///
    /// # Errors
    ///
    /// [`ProfileError::OrderNotFound`] if `order_id` does not exist.
    pub fn aggregate(
        &self,
        order_id: u32,
        test_id: u32,
        test_type_id: u32,
        use_average: bool,
    ) -> ProfileResult<Vec<ScoreRecord>> {
        if self.orders.find_order(order_id).is_none() {
            return Err(ProfileError::OrderNotFound(order_id));
        }

        let rows = self.scores.fetch_grouped_scores(order_id, test_id, test_type_id);

        let mut index: HashMap<(&str, &str), usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();

        for row in &rows {
            let key = (row.group_name.as_str(), row.subfactor_name.as_str());
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(Group { head: row, values: Vec::new() });
                groups.len() - 1
            });

            let value = if use_average { row.avg_score } else { row.mean_score };
            groups[slot].values.push(value);
        }

        // Stable: equal sequence numbers stay in first-seen order.
        groups.sort_by_key(|g| g.head.sequence_no);

        let records: Vec<ScoreRecord> = groups
            .into_iter()
            .map(|g| self.build_record(g, test_type_id, use_average))
            .collect();

        debug!(order_id, test_id, test_type_id, groups = records.len(), "Scores aggregated");
        Ok(records)
    }

    fn build_record(&self, group: Group, test_type_id: u32, use_average: bool) -> ScoreRecord {
        let head = group.head;
        let raw_average_score = mean(&group.values);

        let norm = head
            .question_code_id
            .and_then(|id| self.norms.get_norm(id))
            .filter(|n| n.applies_to(test_type_id));

        let mean_score = if !use_average {
            raw_average_score
        } else {
            match &norm {
                Some(n) => z_score(raw_average_score, n.mean, n.standard_deviation),
                None => {
                    debug!(
                        group = %head.group_name,
                        subfactor = %head.subfactor_name,
                        question_code = ?head.question_code_id,
                        "No applicable norm, using zero score"
                    );
                    0.0
                }
            }
        };

        ScoreRecord {
            order_id: head.order_id,
            group_name: head.group_name.clone(),
            subfactor_name: head.subfactor_name.clone(),
            sequence_no: head.sequence_no,
            raw_average_score,
            question_code_ref: norm.as_ref().map(|n| n.id),
            question_code_group: norm.map(|n| n.group),
            mean_score,
            candidate_count: group.values.len(),
            banding: None,
            banding_index: None,
            std_score: None,
            percentile: None,
            narrative: None,
            development_guide: None,
        }
    }
}
