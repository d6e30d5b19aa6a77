//! Data types used by the group profile pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A single per-candidate sub-score row deserialized from `candidate_scores.csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateScoreRow {
    pub order_candidate_test_id: u32,
    pub order_id: u32,
    pub test_id: u32,
    pub group_name: String,
    pub subfactor_name: String,
    pub sequence_no: i32,
    pub avg_score: f64,
    pub mean_score: f64,
    pub question_code_id: Option<u32>,
    #[serde(default, deserialize_with = "flag")]
    pub is_competency: bool,
}

/// Population norm attached to a question code.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionCodeNorm {
    pub id: u32,
    pub group: String,
    pub mean: f64,
    pub standard_deviation: f64,
    pub test_type_id: u32,
    pub custom_norm_id: Option<u32>,
}

impl QuestionCodeNorm {
    /// Generic norms only: custom norms and other test types never apply.
    pub fn applies_to(&self, test_type_id: u32) -> bool {
        self.test_type_id == test_type_id && self.custom_norm_id.is_none()
    }
}

/// One row of a banding lookup table.
///
/// An empty `min_raw_score` is unbounded below and an empty `max_raw_score`
/// is unbounded above.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringRow {
    pub question_code_id: u32,
    pub test_type_id: u32,
    pub min_raw_score: Option<f64>,
    pub max_raw_score: Option<f64>,
    pub banding: String,
    pub std_score: Option<f64>,
    pub percentile: Option<f64>,
    #[serde(default)]
    pub report_desc: Option<String>,
    #[serde(default)]
    pub suggested_development_guide: Option<String>,
}

impl ScoringRow {
    pub fn lower_bound(&self) -> f64 {
        self.min_raw_score.unwrap_or(f64::NEG_INFINITY)
    }

    /// Lower bound at or below `score`, and upper bound (where present) at or above it.
    pub fn covers(&self, score: f64) -> bool {
        self.lower_bound() <= score && self.max_raw_score.is_none_or(|max| score <= max)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: u32,
    pub client_name: Option<String>,
    pub test_admin_name: String,
    pub po_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestType {
    pub id: u32,
    pub name: String,
}

impl TestType {
    /// Family prefix of the name, e.g. `OM` for `OM-E-CN`.
    pub fn prefix(&self) -> &str {
        self.name.split('-').next().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Test {
    pub id: u32,
    pub name: String,
    pub abbreviation: String,
}

/// Banding annotation produced by the resolver for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandResult {
    pub banding: String,
    pub std_score: Option<f64>,
    pub percentile: Option<f64>,
    pub narrative: Option<String>,
    pub development_guide: Option<String>,
}

impl BandResult {
    pub(crate) fn from_row(row: &ScoringRow) -> Self {
        BandResult {
            banding: row.banding.clone(),
            std_score: row.std_score,
            percentile: row.percentile,
            narrative: row.report_desc.clone(),
            development_guide: row.suggested_development_guide.clone(),
        }
    }
}

/// Averaged score for one factor/subfactor group of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub order_id: u32,
    pub group_name: String,
    pub subfactor_name: String,
    pub sequence_no: i32,
    pub raw_average_score: f64,
    /// Question code whose generic norm applies to the test type; banding
    /// is only looked up through it.
    pub question_code_ref: Option<u32>,
    pub question_code_group: Option<String>,
    pub mean_score: f64,
    pub candidate_count: usize,
    pub banding: Option<String>,
    pub banding_index: Option<usize>,
    pub std_score: Option<f64>,
    pub percentile: Option<f64>,
    pub narrative: Option<String>,
    pub development_guide: Option<String>,
}

impl ScoreRecord {
    /// Returns a copy annotated with `band`.
    pub fn with_band(self, band: BandResult, banding_index: Option<usize>) -> Self {
        ScoreRecord {
            banding: Some(band.banding),
            banding_index,
            std_score: band.std_score,
            percentile: band.percentile,
            narrative: band.narrative,
            development_guide: band.development_guide,
            ..self
        }
    }
}

/// Report sub-kind selected by the request's `file_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Profile,
}

impl ReportKind {
    pub fn from_file_type(file_type: &str) -> Option<Self> {
        match file_type {
            "gp-pdf-i" => Some(ReportKind::Profile),
            _ => None,
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            ReportKind::Profile => "IIR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    En,
    Cn,
}

/// Records of one OM factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorSection {
    pub factor: String,
    pub records: Vec<ScoreRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", content = "items", rename_all = "snake_case")]
pub enum ProfileBody {
    Flat(Vec<ScoreRecord>),
    ByFactor(Vec<FactorSection>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub client_name: String,
    pub order_name: String,
    pub test_date: NaiveDate,
    pub test_type_id: u32,
    pub test_abbreviation: String,
    pub report_kind: ReportKind,
    pub report_abbreviation: &'static str,
    pub locale: Locale,
    pub banding_count: usize,
}

/// Complete group profile payload handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupProfileReport {
    pub schema_version: u8,
    pub metadata: ReportMetadata,
    pub body: ProfileBody,
}

impl GroupProfileReport {
    pub fn records(&self) -> Vec<&ScoreRecord> {
        match &self.body {
            ProfileBody::Flat(records) => records.iter().collect(),
            ProfileBody::ByFactor(sections) => {
                sections.iter().flat_map(|s| s.records.iter()).collect()
            }
        }
    }
}

/// Request parameters for one group profile.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
    pub test_type_id: u32,
    pub test_id: u32,
    pub file_type: String,
}

/// Accepts `1`/`0`, `true`/`false` and empty cells.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(matches!(
        raw.as_deref().map(str::trim),
        Some("1") | Some("true") | Some("TRUE") | Some("yes")
    ))
}
