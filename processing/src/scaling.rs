//! Min-max statistics fitted once on the training corpus and applied as a
//! fixed affine transform at inference time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::ArtifactLoadError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxStats {
    pub min: f64,
    pub max: f64,
}

impl MinMaxStats {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `(x - min) / (max - min)`, clamped to `[0, 1]`.
    ///
    /// A zero-width range maps everything to 0.0, the same as a min-max
    /// scaler fitted on constant data.
    pub fn transform(&self, x: f64) -> f64 {
        let range = self.max - self.min;
        if range <= 0.0 {
            return 0.0;
        }
        ((x - self.min) / range).clamp(0.0, 1.0)
    }

    fn check(&self) -> Result<(), String> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err("min and max must be finite".to_string());
        }
        if self.min > self.max {
            return Err(format!("min {} is greater than max {}", self.min, self.max));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalingStatistics {
    pub columns: BTreeMap<String, MinMaxStats>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

/// Equal when the column statistics are; where they were loaded from does not matter.
impl PartialEq for ScalingStatistics {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl ScalingStatistics {
    pub fn new(columns: BTreeMap<String, MinMaxStats>) -> Self {
        Self {
            columns,
            source: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stats = Self::from_json_str(&contents, path)?;
        info!(
            path = %path.display(),
            columns = stats.columns.len(),
            "Loaded scaling statistics"
        );
        Ok(stats)
    }

    pub fn from_json_str(json: &str, path: impl AsRef<Path>) -> Result<Self, ArtifactLoadError> {
        let path = path.as_ref();
        let mut stats: ScalingStatistics =
            serde_json::from_str(json).map_err(|source| ArtifactLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        for (name, column) in &stats.columns {
            column
                .check()
                .map_err(|reason| ArtifactLoadError::invalid(path, format!("{}: {}", name, reason)))?;
        }
        stats.source = Some(path.to_path_buf());
        Ok(stats)
    }

    /// Fit statistics from training samples, one slice per column.
    /// Non-finite samples are ignored; a column with no usable samples is skipped.
    pub fn fit<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [f64])>,
    {
        let columns = samples
            .into_iter()
            .filter_map(|(name, values)| {
                let finite = values.iter().copied().filter(|v| v.is_finite());
                let (min, max) = finite.fold(None, |acc: Option<(f64, f64)>, v| match acc {
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                    None => Some((v, v)),
                })?;
                Some((name.to_string(), MinMaxStats::new(min, max)))
            })
            .collect();
        Self::new(columns)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactLoadError> {
        let path = path.as_ref();
        // Never persist what `load` would refuse
        for (name, column) in &self.columns {
            column
                .check()
                .map_err(|reason| ArtifactLoadError::invalid(path, format!("{}: {}", name, reason)))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ArtifactLoadError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn column(&self, name: &str) -> Result<MinMaxStats, ArtifactLoadError> {
        self.columns.get(name).copied().ok_or_else(|| {
            let path = self
                .source
                .clone()
                .unwrap_or_else(|| PathBuf::from("<in-memory>"));
            ArtifactLoadError::invalid(path, format!("missing statistics for column '{}'", name))
        })
    }
}
