//! Label mapping between class names and network output indices.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Immutable index-to-name lookup built from a `{name: index}` mapping.
///
/// Indices are guaranteed unique and contiguous from zero, so the mapping
/// length is also the width of the network's output layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMapping {
    names: Vec<String>,
}

impl LabelMapping {
    /// Read and validate a JSON label mapping file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::MappingRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let class_to_idx: HashMap<String, usize> =
            serde_json::from_str(&contents).map_err(|e| Error::MappingParse {
                path: path.to_path_buf(),
                source: e,
            })?;

        Self::from_class_to_index(class_to_idx)
    }

    /// Build the inverse mapping, rejecting duplicate or non-contiguous indices.
    pub fn from_class_to_index(class_to_idx: HashMap<String, usize>) -> Result<Self> {
        if class_to_idx.is_empty() {
            return Err(Error::InvalidLabelMapping {
                reason: "mapping contains no classes".to_string(),
            });
        }

        let count = class_to_idx.len();
        let mut slots: Vec<Option<String>> = vec![None; count];

        for (name, index) in class_to_idx {
            let Some(slot) = slots.get_mut(index) else {
                return Err(Error::InvalidLabelMapping {
                    reason: format!(
                        "index {index} for '{name}' is outside 0..{count} (indices must be contiguous)"
                    ),
                });
            };
            if let Some(existing) = slot {
                return Err(Error::InvalidLabelMapping {
                    reason: format!("index {index} is shared by '{existing}' and '{name}'"),
                });
            }
            *slot = Some(name);
        }

        // Every slot is filled: N distinct indices all below N.
        let names = slots.into_iter().flatten().collect();
        Ok(Self { names })
    }

    /// Number of classes. Never zero for a validated mapping.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Class name for a network output index.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn mapping(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(n, i)| ((*n).to_string(), *i)).collect()
    }

    #[test]
    fn test_inverse_mapping_is_bijection() {
        let labels = LabelMapping::from_class_to_index(mapping(&[
            ("ladybug", 0),
            ("beetle", 1),
            ("weevil", 2),
        ]))
        .unwrap();

        assert_eq!(labels.len(), 3);
        for index in 0..labels.len() {
            let name = labels.name(index).unwrap();
            assert_eq!(labels.names.iter().position(|n| n == name), Some(index));
        }
        assert_eq!(labels.name(1), Some("beetle"));
        assert_eq!(labels.name(3), None);
    }

    #[test]
    fn test_rejects_empty_mapping() {
        let result = LabelMapping::from_class_to_index(HashMap::new());
        assert!(matches!(result, Err(Error::InvalidLabelMapping { .. })));
    }

    #[test]
    fn test_rejects_gap_in_indices() {
        let result = LabelMapping::from_class_to_index(mapping(&[("ladybug", 0), ("beetle", 2)]));
        assert!(matches!(result, Err(Error::InvalidLabelMapping { .. })));
    }

    #[test]
    fn test_rejects_duplicate_index() {
        let result = LabelMapping::from_class_to_index(mapping(&[("ladybug", 0), ("beetle", 0)]));
        assert!(matches!(result, Err(Error::InvalidLabelMapping { .. })));
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"ladybug": 0, "beetle": 1}}"#).unwrap();

        let labels = LabelMapping::load(file.path()).unwrap();
        assert_eq!(labels.names, ["ladybug".to_string(), "beetle".to_string()]);
    }

    #[test]
    fn test_load_rejects_negative_index() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"ladybug": -1}}"#).unwrap();

        let result = LabelMapping::load(file.path());
        assert!(matches!(result, Err(Error::MappingParse { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = LabelMapping::load(Path::new("/nonexistent/class_mapping.json"));
        assert!(matches!(result, Err(Error::MappingRead { .. })));
    }
}
