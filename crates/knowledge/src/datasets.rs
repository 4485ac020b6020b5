//! Registry of the FAQ datasets a user can ask about.

use medfaq_core::config::DatasetConfig;
use medfaq_core::{AppError, AppResult};
use serde::Serialize;

/// A selectable FAQ dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetDescriptor {
    /// Label shown to the user and used as the index filter
    pub label: String,

    /// Medical department that published the FAQ
    pub department: String,

    /// Public page the entries were collected from
    pub source_url: String,
}

impl DatasetDescriptor {
    pub fn new(
        label: impl Into<String>,
        department: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            department: department.into(),
            source_url: source_url.into(),
        }
    }
}

/// Ordered, immutable set of datasets with unique labels.
///
/// The first entry is the default selection.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    entries: Vec<DatasetDescriptor>,
}

impl DatasetRegistry {
    /// Build a registry, rejecting an empty list or duplicate labels.
    pub fn new(entries: Vec<DatasetDescriptor>) -> AppResult<Self> {
        if entries.is_empty() {
            return Err(AppError::Config(
                "Dataset registry needs at least one dataset".to_string(),
            ));
        }

        for (i, entry) in entries.iter().enumerate() {
            if entry.label.trim().is_empty() {
                return Err(AppError::Config("Dataset label cannot be empty".to_string()));
            }
            if entries[..i].iter().any(|e| e.label == entry.label) {
                return Err(AppError::Config(format!(
                    "Duplicate dataset label: {}",
                    entry.label
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The datasets shipped with medfaq.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                DatasetDescriptor::new(
                    "排便問題",
                    "肝膽腸胃科",
                    "https://sp1.hso.mohw.gov.tw/doctor/Often_question/type_detail.php?q_type=%B1%C6%ABK%B0%DD%C3D&UrlClass=%A8x%C1x%B8z%ADG%AC%EC",
                ),
                DatasetDescriptor::new(
                    "經痛",
                    "婦產科",
                    "https://sp1.hso.mohw.gov.tw/doctor/Often_question/type_detail.php?UrlClass=%B0%FC%B2%A3%AC%EC&q_like=0&q_type=%B8g%B5h",
                ),
                DatasetDescriptor::new(
                    "藥水",
                    "眼科",
                    "https://sp1.hso.mohw.gov.tw/doctor/Often_question/type_detail.php?UrlClass=%B2%B4%AC%EC&q_like=0&q_type=%C3%C4%A4%F4",
                ),
            ],
        }
    }

    /// Registry from the `datasets` config section; built-ins when it is empty.
    pub fn from_config(datasets: &[DatasetConfig]) -> AppResult<Self> {
        if datasets.is_empty() {
            return Ok(Self::builtin());
        }

        Self::new(
            datasets
                .iter()
                .map(|d| DatasetDescriptor::new(&d.label, &d.department, &d.url))
                .collect(),
        )
    }

    /// Find a dataset by its exact label.
    pub fn lookup(&self, label: &str) -> AppResult<&DatasetDescriptor> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Unknown dataset '{}'. Available: {}",
                    label,
                    self.labels().join(", ")
                ))
            })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e.label == label)
    }

    /// Labels in registry order.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn default_label(&self) -> &str {
        // `new` and `builtin` guarantee at least one entry.
        self.entries
            .first()
            .map(|e| e.label.as_str())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetDescriptor> {
        self.entries.iter()
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = DatasetRegistry::builtin();
        assert_eq!(registry.labels(), vec!["排便問題", "經痛", "藥水"]);
        assert_eq!(registry.default_label(), "排便問題");
        assert_eq!(registry.lookup("藥水").unwrap().department, "眼科");
    }

    #[test]
    fn test_lookup_unknown_label() {
        let registry = DatasetRegistry::builtin();
        let err = registry.lookup("頭痛").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains("排便問題"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = DatasetRegistry::builtin();
        assert!(registry.lookup(" 經痛").is_err());
        assert!(registry.contains("經痛"));
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(DatasetRegistry::new(Vec::new()).is_err());

        let dup = vec![
            DatasetDescriptor::new("經痛", "婦產科", "https://a"),
            DatasetDescriptor::new("經痛", "婦產科", "https://b"),
        ];
        assert!(matches!(DatasetRegistry::new(dup), Err(AppError::Config(_))));
    }

    #[test]
    fn test_from_config() {
        let registry = DatasetRegistry::from_config(&[DatasetConfig {
            label: "過敏".to_string(),
            department: "皮膚科".to_string(),
            url: "https://example.org/allergy".to_string(),
        }])
        .unwrap();
        assert_eq!(registry.labels(), vec!["過敏"]);
        assert_eq!(registry.default_label(), "過敏");

        let fallback = DatasetRegistry::from_config(&[]).unwrap();
        assert_eq!(fallback.labels().len(), 3);
    }
}
