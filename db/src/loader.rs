//! Schema text loading and crash-safe saving.
//!
//! [`SchemaStore`] pairs a resolved [`Schema`] with the settings block it was
//! loaded with, and renders it back to YAML in full or delta-only form.
//!
//! ```no_run
//! use lore_schema_db::SchemaStore;
//!
//! let store = SchemaStore::load("world/schema.yaml").unwrap();
//! println!("{} types", store.schema().type_count());
//!
//! // Writes through a temporary file in the same directory, then renames.
//! store.save("world/schema.yaml").unwrap();
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use lore_schema_core::{Schema, SchemaDocument, SchemaSettings};
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::Result;

/// A resolved schema together with its settings.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    settings: SchemaSettings,
    schema: Schema,
    source: Option<PathBuf>,
}

impl SchemaStore {
    /// Resolves an already parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Schema`](crate::StoreError::Schema) if resolution fails.
    pub fn from_document(doc: &SchemaDocument) -> Result<Self> {
        let schema = Schema::from_document(doc, &doc.settings)?;
        Ok(Self {
            settings: doc.settings.clone(),
            schema,
            source: None,
        })
    }

    /// Parses and resolves schema YAML.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore_schema_db::SchemaStore;
    ///
    /// let store = SchemaStore::from_yaml(
    ///     "types:\n  - name: Character\n  - name: Hero\n    extends: Character\n",
    /// )
    /// .unwrap();
    /// assert_eq!(store.schema().type_count(), 2);
    /// ```
    pub fn from_yaml(text: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_yaml::from_str(text)?;
        Self::from_document(&doc)
    }

    /// Reads and resolves a schema file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`](crate::StoreError::IoError) if the file
    /// cannot be read, [`StoreError::YamlError`](crate::StoreError::YamlError)
    /// if it is not valid schema YAML, or
    /// [`StoreError::Schema`](crate::StoreError::Schema) if it does not resolve.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut store = Self::from_yaml(&text)?;
        store.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            types = store.schema.type_count(),
            collections = store.schema.root_collections().len(),
            "loaded schema"
        );
        Ok(store)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Mutable access for edit operations such as
    /// [`Schema::set_parent`] and [`Schema::make_independent`].
    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn settings(&self) -> &SchemaSettings {
        &self.settings
    }

    /// The file this store was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// The document that [`save`](Self::save) would write.
    pub fn to_document(&self) -> SchemaDocument {
        SchemaDocument::for_save(&self.schema, &self.settings)
    }

    /// Renders the schema as YAML, delta-only unless `save_delta_only` is off.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_document())?)
    }

    /// Renders the full resolved schema as YAML, inherited members included.
    pub fn to_yaml_full(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.schema.to_document(&self.settings))?)
    }

    /// Writes [`to_yaml`](Self::to_yaml) to `path` atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_atomic(path, &self.to_yaml()?)?;
        info!(
            path = %path.display(),
            delta_only = self.settings.save_delta_only,
            types = self.schema.type_count(),
            "saved schema"
        );
        Ok(())
    }
}

/// Replaces `path` with `contents` without ever leaving a partial file.
///
/// The text goes to a temporary file in the target's directory, which is
/// then renamed over the target.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
