//! Global schema options.
//!
//! [`SchemaSettings`] is the `settings` block of a schema document. It is
//! handed explicitly to every resolution, merge, and validation call rather
//! than living in ambient state, so two schemas with different options can be
//! processed side by side.
//!
//! # Example YAML
//!
//! ```yaml
//! settings:
//!   case_sensitive: false
//!   default_sort: name
//!   save_delta_only: true
//!   allowed_extensions: [".md", ".markdown"]
//!   blocked_paths: ["drafts/", "archive/old"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Ordering applied when listing definitions or entities for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Keep declaration (document) order.
    #[default]
    Declaration,
    /// Sort alphabetically by name, honoring case sensitivity.
    Name,
}

/// Options shared by the loader, merge engine, and validator.
///
/// # Examples
///
/// ```
/// use lore_schema_core::SchemaSettings;
///
/// let settings = SchemaSettings::default();
/// assert!(!settings.case_sensitive);
/// assert!(settings.save_delta_only);
/// assert!(settings.names_match("Hit Points", "hit points"));
///
/// let strict = SchemaSettings { case_sensitive: true, ..Default::default() };
/// assert!(!strict.names_match("Hit Points", "hit points"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Whether definition names and picklist values compare case-sensitively.
    pub case_sensitive: bool,
    /// Default ordering for listings.
    pub default_sort: SortKey,
    /// Persist only the parts of the schema that differ from inherited bases.
    pub save_delta_only: bool,
    /// File extensions (with leading dot) that count as lore documents.
    pub allowed_extensions: Vec<String>,
    /// Path prefixes, relative to the project root, that are never read.
    pub blocked_paths: Vec<String>,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            default_sort: SortKey::Declaration,
            save_delta_only: true,
            allowed_extensions: vec![".md".to_string()],
            blocked_paths: Vec::new(),
        }
    }
}

impl SchemaSettings {
    /// Returns the lookup key for a name under the current case policy.
    pub fn name_key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Returns `true` if two names refer to the same definition.
    pub fn names_match(&self, a: &str, b: &str) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            a.to_lowercase() == b.to_lowercase()
        }
    }

    /// Returns `true` if `path` has one of the allowed lore extensions.
    pub fn has_allowed_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Returns `true` if `path` falls under one of the blocked prefixes.
    ///
    /// Paths are compared component-wise with `/` separators, so a blocked
    /// entry of `drafts` matches `drafts/villain.md` but not `drafts2/x.md`.
    pub fn is_blocked(&self, path: &Path) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");
        let normalized = normalized.trim_start_matches("./");
        self.blocked_paths.iter().any(|blocked| {
            let blocked = blocked.trim_start_matches("./").trim_end_matches('/');
            if blocked.is_empty() {
                return false;
            }
            normalized == blocked
                || normalized
                    .strip_prefix(blocked)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Returns `true` if `path` should be handed to the document parser.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use lore_schema_core::SchemaSettings;
    ///
    /// let settings = SchemaSettings {
    ///     blocked_paths: vec!["drafts/".into()],
    ///     ..Default::default()
    /// };
    /// assert!(settings.is_path_allowed(Path::new("people/ayla.md")));
    /// assert!(!settings.is_path_allowed(Path::new("drafts/ayla.md")));
    /// assert!(!settings.is_path_allowed(Path::new("people/ayla.txt")));
    /// ```
    pub fn is_path_allowed(&self, path: &Path) -> bool {
        self.has_allowed_extension(path) && !self.is_blocked(path)
    }

    /// Orders `names` in place according to [`default_sort`](Self::default_sort).
    pub fn sort_names<T: AsRef<str>>(&self, names: &mut [T]) {
        if self.default_sort == SortKey::Name {
            names.sort_by_key(|name| self.name_key(name.as_ref()));
        }
    }
}
