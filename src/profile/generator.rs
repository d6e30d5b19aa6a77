use crate::config::ProfileConfig;
use crate::error::{ProfileError, ProfileResult};
use crate::output::ReportRenderer;
use crate::profile::aggregate::ScoreAggregator;
use crate::profile::banding::{BandingResolver, NormalizationStrategy};
use crate::profile::types::{
    FactorSection, GroupProfileReport, Locale, ProfileBody, ProfileInput, ReportKind,
    ReportMetadata, ScoreRecord, TestType,
};
use crate::repository::{NormRepository, OrderRepository, ScoreRepository, ScoringTableRepository};
use tracing::{debug, info, warn};

/// OM factors in report order.
pub const OM_FACTORS: [&str; 4] = [
    "Physical Needs",
    "Material Welfare",
    "Interpersonal Relationships",
    "Self-Actualisation",
];

/// Test type rendered in Chinese.
const OM_CN_TEST_TYPE: &str = "OM-E-CN";

/// Group profile variant, chosen by the test type name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Cap,
    Om,
}

impl GeneratorKind {
    pub fn for_test_type(test_type: &TestType) -> Option<Self> {
        match test_type.prefix() {
            "CAP" => Some(GeneratorKind::Cap),
            "OM" => Some(GeneratorKind::Om),
            _ => None,
        }
    }

    pub fn strategy(self) -> NormalizationStrategy {
        match self {
            GeneratorKind::Cap => NormalizationStrategy::ZScore,
            GeneratorKind::Om => NormalizationStrategy::DirectPercentile,
        }
    }

    fn body(self, records: Vec<ScoreRecord>) -> ProfileBody {
        match self {
            GeneratorKind::Cap => ProfileBody::Flat(records),
            GeneratorKind::Om => {
                for r in records.iter().filter(|r| !OM_FACTORS.contains(&r.group_name.as_str())) {
                    debug!(
                        group = %r.group_name,
                        subfactor = %r.subfactor_name,
                        "Record outside the OM factors left out of the report"
                    );
                }
                ProfileBody::ByFactor(
                    OM_FACTORS
                        .iter()
                        .map(|factor| FactorSection {
                            factor: factor.to_string(),
                            records: records
                                .iter()
                                .filter(|r| r.group_name == *factor)
                                .cloned()
                                .collect(),
                        })
                        .collect(),
                )
            }
        }
    }
}

/// Result of a generation request that did not fail structurally.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    Report(GroupProfileReport),
    /// The order exists but has nothing to render.
    Empty,
}

/// Everything the generator reads.
pub trait ProfileSource:
    OrderRepository + ScoreRepository + NormRepository + ScoringTableRepository
{
}

impl<T> ProfileSource for T where
    T: OrderRepository + ScoreRepository + NormRepository + ScoringTableRepository
{
}

/// Builds group profile reports: aggregate, annotate, assemble.
pub struct GroupProfileGenerator<'a, S> {
    source: &'a S,
    config: &'a ProfileConfig,
}

impl<'a, S: ProfileSource> GroupProfileGenerator<'a, S> {
    pub fn new(source: &'a S, config: &'a ProfileConfig) -> Self {
        Self { source, config }
    }

    /// Generates the group profile of `order_id`.
    ///
    /// # Errors
    ///
    /// Missing order or test type, a test type without a generator, or an
    /// unknown `file_type`.
    #[tracing::instrument(skip(self, input), fields(test_type_id = input.test_type_id, test_id = input.test_id))]
    pub fn generate(&self, order_id: u32, input: &ProfileInput) -> ProfileResult<GenerateOutcome> {
        let order = self
            .source
            .find_order(order_id)
            .ok_or(ProfileError::OrderNotFound(order_id))?;

        let test_type = self
            .source
            .find_test_type(input.test_type_id)
            .ok_or(ProfileError::TestTypeNotFound(input.test_type_id))?;

        let kind = GeneratorKind::for_test_type(&test_type)
            .ok_or_else(|| ProfileError::UnsupportedTestType(test_type.name.clone()))?;

        let report_kind = ReportKind::from_file_type(&input.file_type)
            .ok_or_else(|| ProfileError::UnsupportedFileType(input.file_type.clone()))?;

        let strategy = kind.strategy();
        let aggregator = ScoreAggregator::new(self.source, self.source, self.source);
        let records = aggregator.aggregate(
            order_id,
            input.test_id,
            input.test_type_id,
            strategy.use_average(),
        )?;

        if records.is_empty() {
            return Ok(GenerateOutcome::Empty);
        }

        let resolver = BandingResolver::new(
            self.source,
            &self.config.percentile_curve,
            &self.config.band_scale,
        );
        let records: Vec<ScoreRecord> = records
            .into_iter()
            .map(|r| strategy.annotate(&resolver, input.test_type_id, r))
            .collect();

        let banded = records.iter().filter(|r| r.banding.is_some()).count();
        info!(records = records.len(), banded, ?kind, "Group profile prepared");

        let locale = if test_type.name == OM_CN_TEST_TYPE {
            Locale::Cn
        } else {
            Locale::En
        };

        let metadata = ReportMetadata {
            client_name: order.client_name.unwrap_or_default(),
            order_name: order.test_admin_name,
            test_date: order.po_date,
            test_type_id: input.test_type_id,
            test_abbreviation: self
                .source
                .find_test(input.test_id)
                .map(|t| t.abbreviation)
                .unwrap_or_default(),
            report_kind,
            report_abbreviation: report_kind.abbreviation(),
            locale,
            banding_count: self.config.band_scale.len(),
        };

        Ok(GenerateOutcome::Report(GroupProfileReport {
            schema_version: 1,
            metadata,
            body: kind.body(records),
        }))
    }
}

/// Generates the group profile and hands it to `renderer`.
///
/// Returns `false` when there were no scores to render.
pub fn render_group_profile<S: ProfileSource>(
    generator: &GroupProfileGenerator<S>,
    order_id: u32,
    input: &ProfileInput,
    renderer: &dyn ReportRenderer,
) -> anyhow::Result<bool> {
    match generator.generate(order_id, input)? {
        GenerateOutcome::Report(report) => {
            renderer.render(&report)?;
            info!(order_id, "Group profile rendered");
            Ok(true)
        }
        GenerateOutcome::Empty => {
            warn!(order_id, test_id = input.test_id, "No test scores found, nothing to render");
            Ok(false)
        }
    }
}
