//! Statistical manifests: frozen snapshots of computed results for a
//! protocol version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lock placed on a manifest once the investigator signs off. A locked
/// manifest rejects further saves at the store layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestLock {
    pub locked_at: String,
    pub locked_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub protocol_number: String,
    pub protocol_version: String,
    pub generated_at: String,
    pub generated_by: String,
    pub records_analyzed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<ManifestLock>,
}

/// Descriptive summary for one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescriptiveSummary {
    Continuous {
        mean: f64,
        sd: f64,
        median: f64,
        min: f64,
        max: f64,
    },
    Categorical {
        counts: BTreeMap<String, usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveResult {
    pub variable: String,
    pub n: usize,
    pub summary: DescriptiveSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeResult {
    pub outcome: String,
    pub group_variable: String,
    pub test: String,
    pub statistic: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub variable_a: String,
    pub variable_b: String,
    pub coefficient: f64,
    pub method: CorrelationMethod,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalManifest {
    pub metadata: ManifestMetadata,
    #[serde(default)]
    pub descriptive: Vec<DescriptiveResult>,
    #[serde(default)]
    pub comparative: Vec<ComparativeResult>,
    #[serde(default)]
    pub correlations: Vec<CorrelationResult>,
}

impl StatisticalManifest {
    pub fn is_locked(&self) -> bool {
        self.metadata.lock.is_some()
    }

    /// Place the lock. Returns false (and leaves the existing lock intact)
    /// when the manifest is already locked.
    pub fn lock(&mut self, by: &str, at: &str, reason: Option<String>) -> bool {
        if self.is_locked() {
            return false;
        }
        self.metadata.lock = Some(ManifestLock {
            locked_at: at.to_string(),
            locked_by: by.to_string(),
            reason,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> StatisticalManifest {
        StatisticalManifest {
            metadata: ManifestMetadata {
                protocol_number: "PROTO-001".to_string(),
                protocol_version: "1.0".to_string(),
                generated_at: "2026-02-01T09:00:00Z".to_string(),
                generated_by: "statistician".to_string(),
                records_analyzed: 48,
                lock: None,
            },
            descriptive: Vec::new(),
            comparative: Vec::new(),
            correlations: Vec::new(),
        }
    }

    #[test]
    fn lock_is_first_wins() {
        let mut m = manifest();
        assert!(m.lock("pi", "2026-02-02T09:00:00Z", None));
        assert!(!m.lock("someone-else", "2026-02-03T09:00:00Z", None));
        let lock = m.metadata.lock.as_ref().expect("locked");
        assert_eq!(lock.locked_by, "pi");
    }
}
