//! Hand-off of finished group profiles to the rendering layer.
//!
//! Supports pretty-printing, JSON logging, and writing the JSON payload to a
//! file for the template renderer.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::profile::types::GroupProfileReport;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Receives a fully annotated report.
pub trait ReportRenderer {
    fn render(&self, report: &GroupProfileReport) -> Result<()>;
}

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &GroupProfileReport) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json(report: &GroupProfileReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes the report payload as JSON, creating parent directories as needed.
pub struct JsonFileRenderer {
    pub path: PathBuf,
    pub pretty: bool,
}

impl JsonFileRenderer {
    pub fn new(path: impl Into<PathBuf>, pretty: bool) -> Self {
        Self { path: path.into(), pretty }
    }
}

impl ReportRenderer for JsonFileRenderer {
    fn render(&self, report: &GroupProfileReport) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let file = File::create(&self.path)
            .with_context(|| format!("failed to create {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);

        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, report)?;
        } else {
            serde_json::to_writer(&mut writer, report)?;
        }
        writer.flush()?;

        debug!(path = %self.path.display(), "Report payload written");
        Ok(())
    }
}

/// Renders to the log only.
pub struct LogRenderer;

impl ReportRenderer for LogRenderer {
    fn render(&self, report: &GroupProfileReport) -> Result<()> {
        print_pretty(report);
        print_json(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::types::{
        Locale, ProfileBody, ReportKind, ReportMetadata, ScoreRecord,
    };
    use chrono::NaiveDate;
    use std::env;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn report() -> GroupProfileReport {
        GroupProfileReport {
            schema_version: 1,
            metadata: ReportMetadata {
                client_name: "Acme".to_string(),
                order_name: "Cohort A/B".to_string(),
                test_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                test_type_id: 2,
                test_abbreviation: "CAP".to_string(),
                report_kind: ReportKind::Profile,
                report_abbreviation: "IIR",
                locale: Locale::En,
                banding_count: 7,
            },
            body: ProfileBody::Flat(vec![ScoreRecord {
                order_id: 1,
                group_name: "Thinking".to_string(),
                subfactor_name: "Logic".to_string(),
                sequence_no: 1,
                raw_average_score: 50.0,
                question_code_ref: Some(7),
                question_code_group: None,
                mean_score: 1.0,
                candidate_count: 2,
                banding: Some("Average".to_string()),
                banding_index: Some(3),
                std_score: None,
                percentile: None,
                narrative: None,
                development_guide: None,
            }]),
        }
    }

    #[test]
    fn test_print_does_not_panic() {
        print_pretty(&report());
        print_json(&report()).unwrap();
        LogRenderer.render(&report()).unwrap();
    }

    #[test]
    fn test_json_renderer_writes_payload() {
        let path = temp_path("group_profile_test_out/report.json");
        let _ = fs::remove_file(&path);

        JsonFileRenderer::new(&path, false).render(&report()).unwrap();
        assert!(path.is_file());

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["order_name"], "Cohort A/B");
        assert_eq!(value["metadata"]["locale"], "en");
        assert_eq!(value["body"]["layout"], "flat");
        assert_eq!(value["body"]["items"][0]["banding"], "Average");

        fs::remove_file(&path).unwrap();
    }
}
