//! Content file discovery.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use lore_schema_core::SchemaSettings;
use tracing::debug;

use crate::content::ContentFormat;
use crate::error::{Result, StoreError};

/// Expands `inputs` into a sorted, de-duplicated list of content files.
///
/// Directories are walked recursively. Inside a directory, files under a
/// `blocked_paths` prefix (relative to that directory) are skipped, as are
/// files that are not content documents. Lore source files with an allowed
/// extension are skipped too, since they must be parsed into content
/// documents first. A file given explicitly must be a content document and
/// must not be blocked.
///
/// # Errors
///
/// [`StoreError::InvalidInput`] for empty input, missing paths, or explicit
/// files of the wrong kind; [`StoreError::BlockedPath`] for an explicit file
/// under a blocked prefix.
pub fn collect_content_paths(
    inputs: &[PathBuf],
    settings: &SchemaSettings,
) -> Result<Vec<PathBuf>> {
    if inputs.is_empty() {
        return Err(StoreError::InvalidInput(
            "no content paths were provided".to_string(),
        ));
    }

    let mut paths = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            walk(input, input, settings, &mut paths)?;
            continue;
        }

        if input.is_file() {
            if settings.is_blocked(input) {
                return Err(StoreError::BlockedPath(input.clone()));
            }
            if ContentFormat::from_path(input).is_none() {
                return Err(StoreError::InvalidInput(format!(
                    "content file '{}' must end in .json, .yaml or .yml",
                    input.display()
                )));
            }
            paths.insert(input.clone());
            continue;
        }

        return Err(StoreError::InvalidInput(format!(
            "content path '{}' does not exist",
            input.display()
        )));
    }

    Ok(paths.into_iter().collect())
}

fn walk(
    root: &Path,
    dir: &Path,
    settings: &SchemaSettings,
    paths: &mut BTreeSet<PathBuf>,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if settings.is_blocked(relative) {
            debug!(path = %path.display(), "skipping blocked path");
            continue;
        }

        if path.is_dir() {
            walk(root, &path, settings, paths)?;
        } else if ContentFormat::from_path(&path).is_some() {
            paths.insert(path);
        } else if settings.has_allowed_extension(&path) {
            debug!(path = %path.display(), "skipping unparsed lore document");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "nodes: []\n").unwrap();
    }

    #[test]
    fn test_walk_honors_blocked_paths_and_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for name in [
            "people/ayla.yaml",
            "people/brann.json",
            "people/cira.md",
            "drafts/villain.yml",
            "places/notes.txt",
            "places/deep/vell.yml",
        ] {
            touch(&root.join(name));
        }
        let settings = SchemaSettings {
            blocked_paths: vec!["drafts/".into()],
            ..Default::default()
        };

        let paths = collect_content_paths(&[root.to_path_buf()], &settings).unwrap();
        let relative: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            relative,
            vec!["people/ayla.yaml", "people/brann.json", "places/deep/vell.yml"]
        );
    }

    #[test]
    fn test_explicit_files() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("a.yaml");
        let md = dir.path().join("a.md");
        touch(&yaml);
        touch(&md);
        let settings = SchemaSettings::default();

        let paths = collect_content_paths(&[yaml.clone(), yaml.clone()], &settings).unwrap();
        assert_eq!(paths, vec![yaml]);
        assert!(matches!(
            collect_content_paths(&[md], &settings),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            collect_content_paths(&[dir.path().join("missing.yaml")], &settings),
            Err(StoreError::InvalidInput(_))
        ));
        assert!(matches!(
            collect_content_paths(&[], &settings),
            Err(StoreError::InvalidInput(_))
        ));
    }
}
