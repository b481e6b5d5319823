//! CSV evaluation dataset reader.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use ndarray::{Array1, Array2};

use crate::data_handling::Dataset;
use crate::preprocessing::fit_transform;

/// Configuration for reading a labelled CSV dataset.
#[derive(Debug, Clone)]
pub struct DatasetReaderConfig {
    /// Column holding the integer outcome label.
    pub label_column: String,
    /// Optional list of feature columns to load (in order).
    /// When `None`, all non-label, non-ignored columns are features.
    pub feature_columns: Option<Vec<String>>,
    /// Columns to skip when auto-selecting features.
    pub ignore_columns: Vec<String>,
    pub delimiter: u8,
    /// Standardize features after loading.
    pub scale_features: bool,
}

impl Default for DatasetReaderConfig {
    fn default() -> Self {
        Self {
            label_column: "Outcome".to_string(),
            feature_columns: None,
            ignore_columns: vec!["PatientId".to_string(), "Id".to_string()],
            delimiter: b',',
            scale_features: true,
        }
    }
}

/// Read a CSV dataset with the default configuration.
pub fn read_dataset_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    read_dataset_csv_with_config(path, &DatasetReaderConfig::default())
}

/// Read a CSV dataset using a custom configuration.
pub fn read_dataset_csv_with_config<P: AsRef<Path>>(
    path: P,
    config: &DatasetReaderConfig,
) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open dataset: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read dataset header row")?
        .clone();

    let label_idx = find_column(&headers, &config.label_column)
        .ok_or_else(|| anyhow!("Missing label column '{}'", config.label_column))?;

    let feature_indices = resolve_feature_indices(&headers, config, label_idx)?;
    if feature_indices.is_empty() {
        return Err(anyhow!("No feature columns detected in dataset header"));
    }

    let mut features = Vec::new();
    let mut labels = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let raw_label = record
            .get(label_idx)
            .ok_or_else(|| anyhow!("Missing label value at row {}", row_idx + 1))?;
        labels.push(parse_label(raw_label).with_context(|| format!("Invalid label at row {}", row_idx + 1))?);

        for &idx in &feature_indices {
            let value = record
                .get(idx)
                .ok_or_else(|| anyhow!("Missing feature value at row {}", row_idx + 1))?;
            let parsed = value.parse::<f64>().with_context(|| {
                format!(
                    "Invalid feature '{}' at row {}",
                    headers.get(idx).unwrap_or(""),
                    row_idx + 1
                )
            })?;
            features.push(parsed);
        }
    }

    let n_rows = labels.len();
    let x = Array2::from_shape_vec((n_rows, feature_indices.len()), features)
        .context("Feature matrix shape mismatch")?;
    let x = if config.scale_features && n_rows > 0 {
        fit_transform(&x)?
    } else {
        x
    };

    let names = feature_indices
        .iter()
        .map(|&idx| headers.get(idx).unwrap_or_default().to_string())
        .collect();

    let dataset = Dataset::new(names, x, Array1::from(labels))?;
    Ok(dataset)
}

/// Labels are integers, but exports frequently write them as `1.0`.
fn parse_label(raw: &str) -> Result<i64> {
    if let Ok(label) = raw.parse::<i64>() {
        return Ok(label);
    }
    let value = raw
        .parse::<f64>()
        .with_context(|| format!("'{}' is not a number", raw))?;
    if value.fract() != 0.0 || !value.is_finite() {
        return Err(anyhow!("'{}' is not an integer label", raw));
    }
    Ok(value as i64)
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn resolve_feature_indices(
    headers: &StringRecord,
    config: &DatasetReaderConfig,
    label_idx: usize,
) -> Result<Vec<usize>> {
    if let Some(columns) = &config.feature_columns {
        return columns
            .iter()
            .map(|name| {
                find_column(headers, name).ok_or_else(|| anyhow!("Missing feature column '{}'", name))
            })
            .collect();
    }

    Ok(headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            *idx != label_idx
                && !config
                    .ignore_columns
                    .iter()
                    .any(|ignored| ignored.eq_ignore_ascii_case(name))
        })
        .map(|(idx, _)| idx)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_accept_integral_floats() {
        assert_eq!(parse_label("1").unwrap(), 1);
        assert_eq!(parse_label("0.0").unwrap(), 0);
        assert!(parse_label("0.5").is_err());
        assert!(parse_label("yes").is_err());
    }
}
