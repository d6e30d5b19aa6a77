use crate::profile::percentile::{BandScale, PercentileCurve};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Reference curves for families banded by percentile.
///
/// Stored as a JSON object on disk; either key may be omitted to keep the
/// built-in value:
/// ```json
/// {
///   "percentile_curve": [{ "raw_score": 1.0, "percentile": 1.0 }],
///   "band_scale": [{ "label": "Very Low", "below": 4.0 }]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub percentile_curve: PercentileCurve,
    pub band_scale: BandScale,
}

impl ProfileConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: ProfileConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config.normalized())
    }

    /// Loads `path` when given, otherwise the built-in values.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    // Deserialized curves skip `PercentileCurve::new`, so re-sort here.
    fn normalized(self) -> Self {
        ProfileConfig {
            percentile_curve: PercentileCurve::new(self.percentile_curve.points().to_vec()),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_partial_config_keeps_default_scale() {
        let path = temp_path("group_profile_test_partial_config.json");
        fs::write(
            &path,
            r#"{"percentile_curve": [
                {"raw_score": 3.0, "percentile": 60.0},
                {"raw_score": 1.0, "percentile": 10.0}
            ]}"#,
        )
        .unwrap();

        let config = ProfileConfig::load(&path).unwrap();
        assert_eq!(config.band_scale, BandScale::default());
        assert_eq!(config.percentile_curve.percentile_for_raw_score(2.0), Some(10.0));
        assert_eq!(config.percentile_curve.percentile_for_raw_score(3.5), Some(60.0));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_default_round_trips_through_json() {
        let json = serde_json::to_string(&ProfileConfig::default()).unwrap();
        let parsed: ProfileConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ProfileConfig::default());
    }

    #[test]
    fn test_missing_file_fails() {
        let path = temp_path("group_profile_test_no_such_config.json");
        let _ = fs::remove_file(&path);
        assert!(ProfileConfig::load(&path).is_err());
        assert!(ProfileConfig::load_or_default(None).is_ok());
    }
}
