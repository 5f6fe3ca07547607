//! Dataset discovery.
//!
//! A dataset is a folder with one sub-folder per class:
//!
//! ```text
//! data_prepared/
//!   Adialer.C/
//!     00bb6b6a7be5402fcfce453630bfff19.png
//!     ...
//!   Agent.FYI/
//!     ...
//! ```

use crate::core::error::{ConfigError, DatasetError, DatasetResult, FeatureResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One image awaiting extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Full path to the file.
    pub path: PathBuf,
    /// Class label (the parent folder name).
    pub class: String,
}

/// The files of one class folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFolder {
    /// Folder name, used as the label.
    pub name: String,
    /// Folder path.
    pub path: PathBuf,
    /// Candidate image files, sorted by name.
    pub files: Vec<PathBuf>,
}

/// All class folders of a dataset, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetIndex {
    root: PathBuf,
    classes: Vec<ClassFolder>,
}

impl DatasetIndex {
    /// Scan `root` for class folders and their files.
    ///
    /// `pattern` is a glob matched against file names only (`*.png`).
    pub fn scan(root: impl AsRef<Path>, pattern: Option<&str>) -> FeatureResult<Self> {
        let root = root.as_ref();
        let pattern = pattern
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| ConfigError::InvalidPattern {
                    pattern: p.to_string(),
                    error: e.to_string(),
                })
            })
            .transpose()?;

        if !root.is_dir() {
            return Err(DatasetError::RootNotFound {
                path: root.to_path_buf(),
            }
            .into());
        }

        let mut classes = Vec::new();
        for dir in list_dir(root)? {
            if !dir.is_dir() {
                continue;
            }
            let name = file_name(&dir);
            let files = list_dir(&dir)?
                .into_iter()
                .filter(|p| p.is_file())
                .filter(|p| !file_name(p).starts_with('.'))
                .filter(|p| pattern.as_ref().map_or(true, |g| g.matches(&file_name(p))))
                .collect();
            classes.push(ClassFolder {
                name,
                path: dir,
                files,
            });
        }

        if classes.is_empty() {
            return Err(DatasetError::NoClassFolders {
                path: root.to_path_buf(),
            }
            .into());
        }

        log::debug!(
            "Found {} classes with {} files under {}",
            classes.len(),
            classes.iter().map(|c| c.files.len()).sum::<usize>(),
            root.display()
        );

        Ok(Self {
            root: root.to_path_buf(),
            classes,
        })
    }

    /// Dataset root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Class folders in label order.
    pub fn classes(&self) -> &[ClassFolder] {
        &self.classes
    }

    /// Class labels in order.
    pub fn class_names(&self) -> Vec<String> {
        self.classes.iter().map(|c| c.name.clone()).collect()
    }

    /// Total number of candidate files.
    pub fn file_count(&self) -> usize {
        self.classes.iter().map(|c| c.files.len()).sum()
    }

    /// Every candidate file, class by class.
    pub fn entries(&self) -> impl Iterator<Item = ImageEntry> + '_ {
        self.classes.iter().flat_map(|class| {
            class.files.iter().map(move |path| ImageEntry {
                path: path.clone(),
                class: class.name.clone(),
            })
        })
    }
}

/// Direct children of `dir`, sorted by file name.
fn list_dir(dir: &Path) -> DatasetResult<Vec<PathBuf>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            entry.map(|e| e.into_path()).map_err(|e| DatasetError::ReadDir {
                path: dir.to_path_buf(),
                error: e.to_string(),
            })
        })
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::FeatureError;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    fn sample_dataset() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("Zeta")).unwrap();
        fs::create_dir(root.join("Alpha")).unwrap();
        touch(&root.join("Alpha/b.png"));
        touch(&root.join("Alpha/a.png"));
        touch(&root.join("Alpha/.DS_Store"));
        touch(&root.join("Alpha/notes.txt"));
        touch(&root.join("Zeta/z.png"));
        touch(&root.join("stray.png"));
        dir
    }

    #[test]
    fn test_classes_and_files_are_sorted() {
        let dir = sample_dataset();
        let index = DatasetIndex::scan(dir.path(), None).unwrap();

        assert_eq!(index.class_names(), vec!["Alpha", "Zeta"]);
        let alpha: Vec<String> = index.classes()[0].files.iter().map(|p| file_name(p)).collect();
        assert_eq!(alpha, vec!["a.png", "b.png", "notes.txt"]);
        assert_eq!(index.file_count(), 4);

        let first = index.entries().next().unwrap();
        assert_eq!(first.class, "Alpha");
        assert!(first.path.ends_with("Alpha/a.png"));
    }

    #[test]
    fn test_pattern_filters_file_names() {
        let dir = sample_dataset();
        let index = DatasetIndex::scan(dir.path(), Some("*.png")).unwrap();
        assert_eq!(index.file_count(), 3);

        let err = DatasetIndex::scan(dir.path(), Some("[")).unwrap_err();
        assert!(matches!(err, FeatureError::Config(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = DatasetIndex::scan(dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, FeatureError::Dataset(DatasetError::RootNotFound { .. })));
    }

    #[test]
    fn test_root_without_class_folders() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("image.png"));
        let err = DatasetIndex::scan(dir.path(), None).unwrap_err();
        assert!(matches!(err, FeatureError::Dataset(DatasetError::NoClassFolders { .. })));
    }

    #[test]
    fn test_empty_class_folder_is_kept() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Empty")).unwrap();
        let index = DatasetIndex::scan(dir.path(), None).unwrap();
        assert_eq!(index.class_names(), vec!["Empty"]);
        assert_eq!(index.file_count(), 0);
    }
}
