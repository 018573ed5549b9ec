//! Column schema of the model input.
//!
//! The schema file lists the model's input columns in training order. The
//! first three columns are the numeric features (area, bathrooms, bedrooms);
//! every column after them is a one-hot location indicator.
//!
//! Numeric feature positions are resolved by column name so that a schema
//! written as `[sqft, bed, bath]` is never filled as `[sqft, bath, bed]`.

use crate::error::EstimateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Number of numeric feature columns that precede the location columns.
pub const NUM_NUMERIC_FEATURES: usize = 3;

/// Alternate spelling of the bedroom column found in older artifacts.
const BED_COLUMN_ALIAS: &str = "bhk";

/// Names of the numeric feature columns in the schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Column holding the total area in square feet
    pub area_column: String,

    /// Column holding the bathroom count
    pub bath_column: String,

    /// Column holding the bedroom count
    pub bed_column: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            area_column: "total_sqft".to_string(),
            bath_column: "bath".to_string(),
            bed_column: "bed".to_string(),
        }
    }
}

/// On-disk layout of the schema file.
#[derive(Debug, Deserialize)]
struct ColumnsFile {
    data_columns: Vec<String>,
}

/// Vector positions of the numeric features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureIndices {
    pub area: usize,
    pub bath: usize,
    pub bed: usize,
}

/// Validated column schema with a case-insensitive location index.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    columns: Vec<String>,
    indices: FeatureIndices,
    /// Lower-cased location names, in schema order
    locations: Vec<String>,
    /// Lower-cased location name -> vector position
    location_index: HashMap<String, usize>,
}

impl ColumnSchema {
    /// Build a schema from an ordered list of column names.
    pub fn new(columns: Vec<String>, config: &SchemaConfig) -> Result<Self, String> {
        if columns.len() < NUM_NUMERIC_FEATURES {
            return Err(format!(
                "schema must have at least {} columns, found {}",
                NUM_NUMERIC_FEATURES,
                columns.len()
            ));
        }

        let numeric = &columns[..NUM_NUMERIC_FEATURES];
        let area = find_numeric(numeric, &[config.area_column.as_str()])?;
        let bath = find_numeric(numeric, &[config.bath_column.as_str()])?;
        let bed = find_numeric(numeric, &[config.bed_column.as_str(), BED_COLUMN_ALIAS])?;

        if area == bath || area == bed || bath == bed {
            return Err(format!(
                "numeric feature columns must be distinct, got area={} bath={} bed={}",
                area, bath, bed
            ));
        }

        let mut locations = Vec::with_capacity(columns.len() - NUM_NUMERIC_FEATURES);
        let mut location_index = HashMap::with_capacity(columns.len() - NUM_NUMERIC_FEATURES);
        for (position, name) in columns.iter().enumerate().skip(NUM_NUMERIC_FEATURES) {
            let key = name.to_lowercase();
            if location_index.insert(key.clone(), position).is_some() {
                return Err(format!("duplicate location column '{}'", name));
            }
            locations.push(key);
        }

        Ok(Self {
            columns,
            indices: FeatureIndices { area, bath, bed },
            locations,
            location_index,
        })
    }

    /// Parse a schema from the JSON contents of a columns file.
    pub fn from_json(json: &str, config: &SchemaConfig) -> Result<Self, String> {
        let file: ColumnsFile =
            serde_json::from_str(json).map_err(|e| format!("malformed columns file: {}", e))?;
        Self::new(file.data_columns, config)
    }

    /// Load a schema from a columns file on disk.
    pub fn from_file(path: &Path, config: &SchemaConfig) -> Result<Self, EstimateError> {
        let json = std::fs::read_to_string(path).map_err(|e| EstimateError::artifact(path, e))?;
        Self::from_json(&json, config).map_err(|reason| EstimateError::artifact(path, reason))
    }

    /// Total number of columns, i.e. the model input dimensionality.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in schema order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Positions of the numeric features.
    pub fn indices(&self) -> FeatureIndices {
        self.indices
    }

    /// Lower-cased location names, in schema order.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Vector position of a location, matched case-insensitively.
    pub fn location_position(&self, location: &str) -> Option<usize> {
        self.location_index.get(&location.to_lowercase()).copied()
    }
}

fn find_numeric(numeric: &[String], names: &[&str]) -> Result<usize, String> {
    numeric
        .iter()
        .position(|column| names.iter().any(|name| column.eq_ignore_ascii_case(name)))
        .ok_or_else(|| {
            format!(
                "column '{}' not found among the first {} columns {:?}",
                names[0], NUM_NUMERIC_FEATURES, numeric
            )
        })
}
