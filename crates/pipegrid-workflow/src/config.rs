//! Compute-resource configuration for transfers and path translation.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One namespace-to-base-directory translation entry.
///
/// Translation lists are ordered; the first matching base directory wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTranslation {
    /// Namespace tag carried by translated references.
    pub namespace: String,
    /// Base directory the namespace is rooted at.
    pub base_dir: PathBuf,
}

impl PathTranslation {
    /// Creates a translation entry.
    pub fn new(namespace: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            namespace: namespace.into(),
            base_dir: base_dir.into(),
        }
    }
}

/// Per-resource transfer roots and path translations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Directories whose contents require explicit data transfer, in
    /// priority order.
    #[serde(default)]
    pub transfer_paths: Vec<PathBuf>,
    /// Shared-storage translations, in priority order.
    #[serde(default)]
    pub path_translations: Vec<PathTranslation>,
}

/// Workflow conversion configuration.
///
/// Every lookup degrades to empty defaults; an absent resource is not an
/// error, it simply disables transfers and translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Name of the compute resource the workflow is built for.
    #[serde(default)]
    pub computing_resource: Option<String>,
    /// Per-resource configuration, keyed by resource name.
    #[serde(default)]
    pub resources: HashMap<String, ResourceConfig>,
}

impl WorkflowConfig {
    /// Creates a configuration with no resource selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the transfer roots and path translations for the selected
    /// resource, or empty defaults when any part of the lookup is missing.
    pub fn resource_paths(&self) -> (Vec<PathBuf>, Vec<PathTranslation>) {
        let Some(name) = &self.computing_resource else {
            return (Vec::new(), Vec::new());
        };
        let Some(resource) = self.resources.get(name) else {
            return (Vec::new(), Vec::new());
        };
        (
            resource.transfer_paths.clone(),
            resource.path_translations.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(resource: &str) -> WorkflowConfig {
        let mut config = WorkflowConfig::new();
        config.computing_resource = Some(resource.to_owned());
        config.resources.insert(
            "cluster".to_owned(),
            ResourceConfig {
                transfer_paths: vec!["/data/study".into()],
                path_translations: vec![PathTranslation::new("shared", "/shared")],
            },
        );
        config
    }

    #[test]
    fn test_resource_paths_present() {
        let (transfers, translations) = config_for("cluster").resource_paths();
        assert_eq!(transfers, vec![PathBuf::from("/data/study")]);
        assert_eq!(translations, vec![PathTranslation::new("shared", "/shared")]);
    }

    #[test]
    fn test_missing_resource_degrades_to_empty() {
        let (transfers, translations) = config_for("elsewhere").resource_paths();
        assert!(transfers.is_empty());
        assert!(translations.is_empty());

        let (transfers, translations) = WorkflowConfig::new().resource_paths();
        assert!(transfers.is_empty());
        assert!(translations.is_empty());
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: WorkflowConfig = serde_json::from_str("{}").unwrap();
        assert!(config.computing_resource.is_none());
        assert!(config.resources.is_empty());

        let config: WorkflowConfig = serde_json::from_str(
            r#"{"computing_resource": "c", "resources": {"c": {}}}"#,
        )
        .unwrap();
        let (transfers, translations) = config.resource_paths();
        assert!(transfers.is_empty());
        assert!(translations.is_empty());
    }
}
