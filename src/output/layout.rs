//! Output directory layout.
//!
//! ```text
//! <root>/
//!   features/
//!     master_max_features.csv
//!     sets_csv/ angles_csv/ dists_csv/ props_csv/ prop_angle_csv/ prop_dist_csv/
//!   arff/
//!     sets/ angles/ dists/ props/ prop_angle/ prop_dist/
//! ```

use crate::core::error::{OutputError, OutputResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the full-table CSV under `features/`.
pub const MASTER_CSV: &str = "master_max_features.csv";

/// Kind of subset file, each with its own pair of folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsetGroup {
    /// Whole feature families and their fusions
    Sets,
    /// Base GLCM props at one distance and angle
    Angles,
    /// Base GLCM angle statistics at one distance
    Dists,
    /// One cross-distance GLCM column
    Props,
    /// One raw GLCM column at distance 1
    PropAngle,
    /// One per-distance angle mean
    PropDist,
}

impl SubsetGroup {
    /// All groups in write order.
    pub fn all() -> &'static [SubsetGroup] {
        &[
            SubsetGroup::Sets,
            SubsetGroup::Angles,
            SubsetGroup::Dists,
            SubsetGroup::Props,
            SubsetGroup::PropAngle,
            SubsetGroup::PropDist,
        ]
    }

    /// Folder name under `arff/`.
    pub fn arff_dir(&self) -> &'static str {
        match self {
            SubsetGroup::Sets => "sets",
            SubsetGroup::Angles => "angles",
            SubsetGroup::Dists => "dists",
            SubsetGroup::Props => "props",
            SubsetGroup::PropAngle => "prop_angle",
            SubsetGroup::PropDist => "prop_dist",
        }
    }

    /// Folder name under `features/`.
    pub fn csv_dir(&self) -> String {
        format!("{}_csv", self.arff_dir())
    }
}

/// Paths of every output file below one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// CSV root (`features/`).
    pub fn features_dir(&self) -> PathBuf {
        self.root.join("features")
    }

    /// ARFF root (`arff/`).
    pub fn arff_dir(&self) -> PathBuf {
        self.root.join("arff")
    }

    /// Path of the master CSV.
    pub fn master_csv(&self) -> PathBuf {
        self.features_dir().join(MASTER_CSV)
    }

    /// CSV path of subset `name` in `group`.
    pub fn csv_path(&self, group: SubsetGroup, name: &str) -> PathBuf {
        self.features_dir()
            .join(group.csv_dir())
            .join(format!("{}.csv", name))
    }

    /// ARFF path of subset `name` in `group`.
    pub fn arff_path(&self, group: SubsetGroup, name: &str) -> PathBuf {
        self.arff_dir()
            .join(group.arff_dir())
            .join(format!("{}.arff", name))
    }

    /// Every directory of the layout.
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.features_dir(), self.arff_dir()];
        for group in SubsetGroup::all() {
            dirs.push(self.arff_dir().join(group.arff_dir()));
            dirs.push(self.features_dir().join(group.csv_dir()));
        }
        dirs
    }

    /// Create every directory; existing ones are left alone.
    pub fn create_all(&self) -> OutputResult<()> {
        for dir in self.directories() {
            std::fs::create_dir_all(&dir).map_err(|source| OutputError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let layout = OutputLayout::new("/out");
        assert_eq!(layout.master_csv(), PathBuf::from("/out/features/master_max_features.csv"));
        assert_eq!(
            layout.csv_path(SubsetGroup::PropAngle, "PROP_ASM_angle_0_d1"),
            PathBuf::from("/out/features/prop_angle_csv/PROP_ASM_angle_0_d1.csv")
        );
        assert_eq!(
            layout.arff_path(SubsetGroup::Sets, "GLCM_all"),
            PathBuf::from("/out/arff/sets/GLCM_all.arff")
        );
    }

    #[test]
    fn test_create_all_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.create_all().unwrap();
        layout.create_all().unwrap();

        assert_eq!(layout.directories().len(), 14);
        for d in layout.directories() {
            assert!(d.is_dir(), "{}", d.display());
        }
    }
}
