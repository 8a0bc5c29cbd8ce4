//! core::defaults
//!
//! Per-folder defaults for new time entries.
//!
//! # Discovery
//!
//! Starting at a directory, each ancestor is checked for the defaults file
//! (`.clockify-defaults.yaml` unless another name is given). The first
//! regular file found wins; a directory with that name is skipped. Reaching
//! the filesystem root without a match yields [`DefaultsError::NotFound`].
//!
//! # Encoding
//!
//! The file suffix picks the encoding: `.json` is JSON, anything else YAML.
//!
//! # Example
//!
//! ```no_run
//! use clockify_cli::core::defaults::{DefaultsStore, ScanParam};
//!
//! let store = DefaultsStore::new(ScanParam::new("/work/acme/api"));
//! match store.read() {
//!     Ok(found) => println!("{}: {:?}", found.path.display(), found.defaults),
//!     Err(e) if e.is_not_found() => println!("no defaults"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::ValidationError;

/// Default filename looked up in each directory.
pub const DEFAULT_FILENAME: &str = ".clockify-defaults.yaml";

/// Errors from reading or writing the defaults file.
#[derive(Debug, Error)]
pub enum DefaultsError {
    #[error("no defaults file found")]
    NotFound,

    #[error("failed to read defaults '{path}': {cause}")]
    Scan { path: PathBuf, cause: String },

    #[error("invalid defaults: {0}")]
    Invalid(#[from] ValidationError),

    #[error("failed to write defaults '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl DefaultsError {
    /// True when no defaults file exists between the start dir and root.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DefaultsError::NotFound)
    }
}

/// Default values applied to new time entries started below a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Defaults {
    /// Workspace the defaults were written for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub billable: Option<bool>,
}

impl Defaults {
    /// Reject a task without a project.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if has(&self.task_id) && !has(&self.project_id) {
            return Err(ValidationError::new("taskId", "requires projectId to be set"));
        }
        Ok(())
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.project_id.is_none()
            && self.task_id.is_none()
            && self.tag_ids.is_empty()
            && self.billable.is_none()
    }
}

/// Where to start looking and which filename to look for.
#[derive(Debug, Clone)]
pub struct ScanParam {
    pub dir: PathBuf,
    pub filename: Option<String>,
}

impl ScanParam {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    fn filename(&self) -> &str {
        self.filename.as_deref().unwrap_or(DEFAULT_FILENAME)
    }
}

/// Defaults and the file they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundDefaults {
    pub path: PathBuf,
    pub defaults: Defaults,
}

/// Reads and writes the folder defaults file.
#[derive(Debug, Clone)]
pub struct DefaultsStore {
    param: ScanParam,
}

impl DefaultsStore {
    pub fn new(param: ScanParam) -> Self {
        Self { param }
    }

    /// The path [`write`](Self::write) targets.
    pub fn target_path(&self) -> PathBuf {
        self.param.dir.join(self.param.filename())
    }

    /// Walk up from the start directory and decode the first file found.
    ///
    /// # Errors
    ///
    /// - [`DefaultsError::NotFound`] when the root is reached without a match
    /// - [`DefaultsError::Scan`] on decode failures, IO errors other than
    ///   "not found", or a task set without a project
    pub fn read(&self) -> Result<FoundDefaults, DefaultsError> {
        let filename = self.param.filename();
        let mut dir: &Path = &self.param.dir;

        loop {
            let candidate = dir.join(filename);
            match fs::metadata(&candidate) {
                Ok(meta) if meta.is_file() => {
                    let defaults = decode(&candidate)?;
                    tracing::debug!(path = %candidate.display(), "loaded folder defaults");
                    return Ok(FoundDefaults {
                        path: candidate,
                        defaults,
                    });
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(DefaultsError::Scan {
                        path: candidate,
                        cause: e.to_string(),
                    })
                }
            }

            match dir.parent() {
                Some(parent) if parent != dir => dir = parent,
                _ => return Err(DefaultsError::NotFound),
            }
        }
    }

    /// Serialize `defaults` into the start directory, creating or truncating.
    pub fn write(&self, defaults: &Defaults) -> Result<PathBuf, DefaultsError> {
        defaults.validate()?;

        let path = self.target_path();
        let contents = if is_json(&path) {
            serde_json::to_string_pretty(defaults).map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        } else {
            serde_yaml::to_string(defaults).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        }
        .map_err(|source| DefaultsError::Write {
            path: path.clone(),
            source,
        })?;

        let mut file = fs::File::create(&path).map_err(|source| DefaultsError::Write {
            path: path.clone(),
            source,
        })?;
        file.write_all(contents.as_bytes())
            .map_err(|source| DefaultsError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn decode(path: &Path) -> Result<Defaults, DefaultsError> {
    let scan = |cause: String| DefaultsError::Scan {
        path: path.to_path_buf(),
        cause,
    };

    let contents = fs::read_to_string(path).map_err(|e| scan(e.to_string()))?;
    let defaults: Defaults = if is_json(path) {
        serde_json::from_str(&contents).map_err(|e| scan(e.to_string()))?
    } else if contents.trim().is_empty() {
        Defaults::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|e| scan(e.to_string()))?
    };

    defaults.validate().map_err(|e| scan(e.to_string()))?;
    Ok(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Defaults {
        Defaults {
            project_id: Some("5f1d0ab2c3e4f5a6b7c8d9e0".into()),
            tag_ids: vec!["5f1d0ab2c3e4f5a6b7c8d9e1".into()],
            billable: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn finds_file_in_ancestor() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        DefaultsStore::new(ScanParam::new(temp.path().join("a")))
            .write(&sample())
            .unwrap();

        let found = DefaultsStore::new(ScanParam::new(&nested)).read().unwrap();
        assert_eq!(found.path, temp.path().join("a").join(DEFAULT_FILENAME));
        assert_eq!(found.defaults, sample());
    }

    #[test]
    fn nearest_file_wins() {
        let temp = TempDir::new().unwrap();
        let inner = temp.path().join("inner");
        fs::create_dir_all(&inner).unwrap();
        DefaultsStore::new(ScanParam::new(temp.path()))
            .write(&sample())
            .unwrap();
        let closer = Defaults {
            billable: Some(false),
            ..Default::default()
        };
        DefaultsStore::new(ScanParam::new(&inner)).write(&closer).unwrap();

        let found = DefaultsStore::new(ScanParam::new(&inner)).read().unwrap();
        assert_eq!(found.defaults, closer);
    }

    #[test]
    fn directory_with_same_name_is_skipped() {
        let temp = TempDir::new().unwrap();
        let inner = temp.path().join("inner");
        fs::create_dir_all(inner.join(DEFAULT_FILENAME)).unwrap();
        DefaultsStore::new(ScanParam::new(temp.path()))
            .write(&sample())
            .unwrap();

        let found = DefaultsStore::new(ScanParam::new(&inner)).read().unwrap();
        assert_eq!(found.path, temp.path().join(DEFAULT_FILENAME));
    }

    #[test]
    fn missing_file_reaches_root() {
        let temp = TempDir::new().unwrap();
        let param = ScanParam::new(temp.path()).with_filename(".no-such-defaults-file.yaml");
        let err = DefaultsStore::new(param).read().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn json_suffix_uses_json() {
        let temp = TempDir::new().unwrap();
        let param = ScanParam::new(temp.path()).with_filename(".clockify-defaults.json");
        let path = DefaultsStore::new(param.clone()).write(&sample()).unwrap();
        let raw = fs::read_to_string(path).unwrap();
        assert!(raw.trim_start().starts_with('{'));
        assert!(raw.contains("\"projectId\""));

        let found = DefaultsStore::new(param).read().unwrap();
        assert_eq!(found.defaults, sample());
    }

    #[test]
    fn task_without_project_rejected_on_write() {
        let temp = TempDir::new().unwrap();
        let bad = Defaults {
            task_id: Some("5f1d0ab2c3e4f5a6b7c8d9e2".into()),
            ..Default::default()
        };
        let store = DefaultsStore::new(ScanParam::new(temp.path()));
        assert!(matches!(store.write(&bad), Err(DefaultsError::Invalid(_))));
        assert!(!store.target_path().exists());
    }

    #[test]
    fn task_without_project_is_decode_error() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(DEFAULT_FILENAME),
            "taskId: 5f1d0ab2c3e4f5a6b7c8d9e2\n",
        )
        .unwrap();
        let err = DefaultsStore::new(ScanParam::new(temp.path()))
            .read()
            .unwrap_err();
        assert!(matches!(err, DefaultsError::Scan { .. }));
        assert!(err.to_string().contains("projectId"));
    }

    #[test]
    fn malformed_yaml_is_scan_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_FILENAME), "tagIds: [unclosed\n").unwrap();
        let err = DefaultsStore::new(ScanParam::new(temp.path()))
            .read()
            .unwrap_err();
        assert!(matches!(err, DefaultsError::Scan { .. }));
    }
}
