//! Process-wide artifact store.
//!
//! Holds the column schema and the regression model. Artifacts are read from
//! disk once by [`ArtifactStore::load`]; afterwards the store is read-only and
//! can be shared across request handlers without locking. Concurrent loaders
//! serialize on a mutex so the files are read at most once.

use crate::error::EstimateError;
use crate::model::{load_model, verify_dimensions, Regressor};
use crate::schema::{ColumnSchema, SchemaConfig};
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Locations of the artifact files on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Column schema (`{"data_columns": [...]}`)
    pub columns: PathBuf,

    /// Serialized regression model
    pub model: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            columns: PathBuf::from("./artifacts/columns.json"),
            model: PathBuf::from("./artifacts/banglore_home_prices_model.json"),
        }
    }
}

/// Schema and model, validated against each other.
#[derive(Debug)]
pub struct Artifacts {
    pub schema: ColumnSchema,
    pub model: Box<dyn Regressor>,
}

impl Artifacts {
    fn read(paths: &ArtifactPaths, schema_config: &SchemaConfig) -> Result<Self, EstimateError> {
        let schema = ColumnSchema::from_file(&paths.columns, schema_config)?;
        let model = load_model(&paths.model)?;
        verify_dimensions(model.as_ref(), schema.len(), &paths.model)?;
        Ok(Self { schema, model })
    }
}

/// Owner of the loaded artifacts.
#[derive(Debug)]
pub struct ArtifactStore {
    paths: ArtifactPaths,
    schema_config: SchemaConfig,
    artifacts: OnceLock<Artifacts>,
    load_lock: Mutex<()>,
}

impl ArtifactStore {
    /// Create an unloaded store for the given artifact files.
    pub fn new(paths: ArtifactPaths, schema_config: SchemaConfig) -> Self {
        Self {
            paths,
            schema_config,
            artifacts: OnceLock::new(),
            load_lock: Mutex::new(()),
        }
    }

    /// Create a loaded store from in-memory artifacts.
    pub fn preloaded(
        schema: ColumnSchema,
        model: Box<dyn Regressor>,
    ) -> Result<Self, EstimateError> {
        let paths = ArtifactPaths {
            columns: PathBuf::from("<memory>"),
            model: PathBuf::from("<memory>"),
        };
        verify_dimensions(model.as_ref(), schema.len(), &paths.model)?;

        let store = Self::new(paths, SchemaConfig::default());
        // A fresh OnceLock is always empty
        let _ = store.artifacts.set(Artifacts { schema, model });
        Ok(store)
    }

    /// Read the schema and model from disk.
    ///
    /// Calling this on an already loaded store does nothing.
    pub fn load(&self) -> Result<(), EstimateError> {
        if self.artifacts.get().is_some() {
            debug!("Artifacts already loaded, skipping reload");
            return Ok(());
        }

        let _guard = self.load_lock.lock();
        if self.artifacts.get().is_some() {
            debug!("Artifacts were loaded by a concurrent caller");
            return Ok(());
        }

        info!(
            "Loading saved artifacts from {} and {}",
            self.paths.columns.display(),
            self.paths.model.display()
        );
        let artifacts = Artifacts::read(&self.paths, &self.schema_config)?;
        info!(
            "Loaded {} model with {} columns ({} locations)",
            artifacts.model.kind(),
            artifacts.schema.len(),
            artifacts.schema.locations().len()
        );

        // Only `preloaded` sets the cell outside the lock, and it does so on a fresh store
        let _ = self.artifacts.set(artifacts);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.artifacts.get().is_some()
    }

    fn artifacts(&self) -> Result<&Artifacts, EstimateError> {
        self.artifacts.get().ok_or(EstimateError::NotLoaded)
    }

    /// Lower-cased location names, in schema order.
    pub fn locations(&self) -> Result<&[String], EstimateError> {
        Ok(self.artifacts()?.schema.locations())
    }

    pub fn schema(&self) -> Result<&ColumnSchema, EstimateError> {
        Ok(&self.artifacts()?.schema)
    }

    pub fn model(&self) -> Result<&dyn Regressor, EstimateError> {
        Ok(self.artifacts()?.model.as_ref())
    }
}
