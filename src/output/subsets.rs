//! Subset file generation.
//!
//! Columns are picked purely by naming convention, so a subset whose
//! columns were never produced comes out empty (set files) or is not
//! written at all (atomic files).

use crate::core::config::GlcmConfig;
use crate::core::error::FeatureResult;
use crate::dataset::table::FeatureTable;
use crate::extractors::glcm::{self, GlcmProperty};
use crate::extractors::FeatureFamily;
use crate::output::arff::{self, ArffHeader};
use crate::output::csv;
use crate::output::layout::{OutputLayout, SubsetGroup};
use std::path::PathBuf;

/// Name of the set holding every column.
pub const ALL_FEATURES_SET: &str = "MAX_all_features";

/// Family sets: name and the families concatenated, in order.
pub const SET_DEFINITIONS: [(&str, &[FeatureFamily]); 10] = [
    ("GLCM_all", &[FeatureFamily::Glcm]),
    ("Wavelet_only", &[FeatureFamily::Wavelet]),
    ("Gabor_only", &[FeatureFamily::Gabor]),
    ("Global_only", &[FeatureFamily::Global]),
    ("LBP_summary_only", &[FeatureFamily::Lbp]),
    ("HOG_summary_only", &[FeatureFamily::Hog]),
    ("GLCM_Wavelet", &[FeatureFamily::Glcm, FeatureFamily::Wavelet]),
    ("GLCM_Gabor", &[FeatureFamily::Glcm, FeatureFamily::Gabor]),
    (
        "GLCM_LBP_HOGsummary",
        &[FeatureFamily::Glcm, FeatureFamily::Lbp, FeatureFamily::Hog],
    ),
    (
        "GLCM_Wav_Gab_LBP_HOG_Global",
        &[
            FeatureFamily::Glcm,
            FeatureFamily::Wavelet,
            FeatureFamily::Gabor,
            FeatureFamily::Lbp,
            FeatureFamily::Hog,
            FeatureFamily::Global,
        ],
    ),
];

/// One planned output: a column selection written as CSV and ARFF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetFile {
    /// Folder pair the files go to.
    pub group: SubsetGroup,
    /// File stem.
    pub name: String,
    /// Feature columns in output order (the class column is implied).
    pub columns: Vec<String>,
}

impl SubsetFile {
    fn new(group: SubsetGroup, name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            group,
            name: name.into(),
            columns,
        }
    }
}

fn family_columns(table: &FeatureTable, family: FeatureFamily) -> Vec<String> {
    table.columns_where(|c| family.owns_column(c))
}

/// Plan the family set files.
///
/// Every set is planned, even when its families produced no columns.
pub fn set_plan(table: &FeatureTable) -> Vec<SubsetFile> {
    let mut plan = vec![SubsetFile::new(
        SubsetGroup::Sets,
        ALL_FEATURES_SET,
        table.columns().to_vec(),
    )];
    for (name, families) in SET_DEFINITIONS {
        let columns = families
            .iter()
            .flat_map(|f| family_columns(table, *f))
            .collect();
        plan.push(SubsetFile::new(SubsetGroup::Sets, name, columns));
    }
    plan
}

/// Plan the atomic GLCM files for the configured distances and angles.
///
/// Files whose columns are all missing are left out.
pub fn atomic_plan(table: &FeatureTable, glcm_config: &GlcmConfig) -> Vec<SubsetFile> {
    let present = |names: Vec<String>| -> Vec<String> {
        names.into_iter().filter(|c| table.has_column(c)).collect()
    };
    let mut plan = Vec::new();
    let mut push = |group, name: String, columns: Vec<String>| {
        if !columns.is_empty() {
            plan.push(SubsetFile::new(group, name, columns));
        }
    };

    for &d in &glcm_config.distances {
        for &a in &glcm_config.angles_deg {
            let columns = GlcmProperty::BASE
                .iter()
                .map(|&p| glcm::raw_column(d, p, a))
                .collect();
            push(
                SubsetGroup::Angles,
                format!("GLCM_d{}_angle_{}_base6", d, a),
                present(columns),
            );
        }
    }

    for &d in &glcm_config.distances {
        let columns = GlcmProperty::BASE
            .iter()
            .flat_map(|&p| [glcm::angle_mean_column(d, p), glcm::angle_std_column(d, p)])
            .collect();
        push(
            SubsetGroup::Dists,
            format!("GLCM_d{}_base6_ang_mean_std", d),
            present(columns),
        );
    }

    for p in GlcmProperty::ALL {
        push(
            SubsetGroup::Props,
            format!("PROP_{}_dist_mean", p.name()),
            present(vec![glcm::dist_mean_column(p)]),
        );
        push(
            SubsetGroup::Props,
            format!("PROP_{}_dist_std", p.name()),
            present(vec![glcm::dist_std_column(p)]),
        );
    }

    for p in GlcmProperty::ALL {
        for &a in &glcm_config.angles_deg {
            push(
                SubsetGroup::PropAngle,
                format!("PROP_{}_angle_{}_d1", p.name(), a),
                present(vec![glcm::raw_column(1, p, a)]),
            );
        }
    }

    for p in GlcmProperty::ALL {
        for &d in &glcm_config.distances {
            push(
                SubsetGroup::PropDist,
                format!("PROP_{}_d{}_ang_mean", p.name(), d),
                present(vec![glcm::angle_mean_column(d, p)]),
            );
        }
    }

    plan
}

/// Counts of files written by a [`SubsetWriter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Master CSV path, if written.
    pub master: Option<PathBuf>,
    /// Set files written (each as CSV and ARFF).
    pub sets: usize,
    /// Atomic files written (each as CSV and ARFF).
    pub atomic: usize,
}

impl WriteSummary {
    /// Total files on disk, counting each format separately.
    pub fn total_files(&self) -> usize {
        usize::from(self.master.is_some()) + 2 * (self.sets + self.atomic)
    }
}

/// Writes the master table and its subsets under an [`OutputLayout`].
#[derive(Debug, Clone)]
pub struct SubsetWriter {
    layout: OutputLayout,
    header: ArffHeader,
}

impl SubsetWriter {
    /// Create a writer.
    pub fn new(layout: OutputLayout, header: ArffHeader) -> Self {
        Self { layout, header }
    }

    /// Output layout.
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Write `features/master_max_features.csv`.
    pub fn write_master(&self, table: &FeatureTable) -> FeatureResult<PathBuf> {
        let path = self.layout.master_csv();
        csv::save(table, &path)?;
        log::info!("Saved master CSV: {}", path.display());
        Ok(path)
    }

    /// Write one subset in both formats.
    pub fn write_subset(&self, table: &FeatureTable, subset: &SubsetFile) -> FeatureResult<()> {
        let selected = table.select(&subset.columns)?;
        let csv_path = self.layout.csv_path(subset.group, &subset.name);
        let arff_path = self.layout.arff_path(subset.group, &subset.name);

        arff::save(&selected, &self.header, &arff_path)?;
        csv::save(&selected, &csv_path)?;
        log::debug!(
            "Wrote {} ({} columns) to {} and {}",
            subset.name,
            subset.columns.len(),
            arff_path.display(),
            csv_path.display()
        );
        Ok(())
    }

    /// Write every file of `plan`, returning how many were written.
    pub fn write_plan(&self, table: &FeatureTable, plan: &[SubsetFile]) -> FeatureResult<usize> {
        for subset in plan {
            self.write_subset(table, subset)?;
        }
        Ok(plan.len())
    }

    /// Create the layout, then write the master CSV and, if
    /// `write_subsets`, every set and atomic file.
    pub fn write_all(
        &self,
        table: &FeatureTable,
        glcm_config: &GlcmConfig,
        write_subsets: bool,
    ) -> FeatureResult<WriteSummary> {
        self.layout.create_all()?;

        let mut summary = WriteSummary {
            master: Some(self.write_master(table)?),
            ..WriteSummary::default()
        };
        if !write_subsets {
            return Ok(summary);
        }

        summary.sets = self.write_plan(table, &set_plan(table))?;
        log::info!(
            "Set files created in {} and {}",
            self.layout.arff_dir().join(SubsetGroup::Sets.arff_dir()).display(),
            self.layout.features_dir().join(SubsetGroup::Sets.csv_dir()).display()
        );

        summary.atomic = self.write_plan(table, &atomic_plan(table, glcm_config))?;
        log::info!("{} atomic GLCM files created", summary.atomic);

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::table::FeatureRecord;
    use crate::extractors::{FeatureExtractor, GlcmExtractor};
    use crate::core::types::FeatureMap;
    use std::fs;
    use tempfile::TempDir;

    fn full_glcm_table() -> FeatureTable {
        let mut features: FeatureMap = GlcmExtractor::from_config(&GlcmConfig::default())
            .column_names()
            .into_iter()
            .map(|c| (c, 0.5))
            .collect();
        features.insert("wav_LL_mean".into(), 1.0);
        features.insert("edge_density".into(), 0.25);
        features.insert("global_mean".into(), 3.0);
        features.insert("hog_max_grad".into(), 4.0);

        FeatureTable::from_records(
            vec![FeatureRecord::new("A", features)],
            vec!["A".into(), "B".into()],
        )
    }

    #[test]
    fn test_set_plan_concatenates_families() {
        let table = full_glcm_table();
        let plan = set_plan(&table);
        assert_eq!(plan.len(), 11);
        assert_eq!(plan[0].name, ALL_FEATURES_SET);
        assert_eq!(plan[0].columns.len(), 316);

        let gabor = plan.iter().find(|s| s.name == "Gabor_only").unwrap();
        assert!(gabor.columns.is_empty());

        let global = plan.iter().find(|s| s.name == "Global_only").unwrap();
        assert_eq!(global.columns, vec!["edge_density", "global_mean"]);

        let fused = plan.iter().find(|s| s.name == "GLCM_Wav_Gab_LBP_HOG_Global").unwrap();
        assert_eq!(fused.columns.len(), 316);
        assert_eq!(fused.columns[312], "wav_LL_mean");
        assert_eq!(fused.columns[313], "hog_max_grad");
        assert_eq!(fused.columns[315], "global_mean");
    }

    #[test]
    fn test_atomic_plan_counts() {
        let table = full_glcm_table();
        let plan = atomic_plan(&table, &GlcmConfig::default());
        let count = |g| plan.iter().filter(|s| s.group == g).count();

        assert_eq!(count(SubsetGroup::Angles), 16);
        assert_eq!(count(SubsetGroup::Dists), 4);
        assert_eq!(count(SubsetGroup::Props), 24);
        assert_eq!(count(SubsetGroup::PropAngle), 48);
        assert_eq!(count(SubsetGroup::PropDist), 48);

        let d2 = plan.iter().find(|s| s.name == "GLCM_d2_base6_ang_mean_std").unwrap();
        assert_eq!(d2.columns[0], "glcm_d2_contrast_ang_mean");
        assert_eq!(d2.columns[1], "glcm_d2_contrast_ang_std");
        assert_eq!(d2.columns.len(), 12);

        let angle = plan.iter().find(|s| s.name == "GLCM_d3_angle_45_base6").unwrap();
        assert_eq!(angle.columns[5], "glcm_d3_ASM_a45");
    }

    #[test]
    fn test_atomic_plan_skips_missing_columns() {
        let table = FeatureTable::from_records(
            vec![FeatureRecord::new("A", [("glcm_d1_ASM_a0".to_string(), 1.0)].into_iter().collect())],
            vec!["A".into()],
        );
        let plan = atomic_plan(&table, &GlcmConfig::default());
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].name, "GLCM_d1_angle_0_base6");
        assert_eq!(plan[1].name, "PROP_ASM_angle_0_d1");
    }

    #[test]
    fn test_write_all() {
        let dir = TempDir::new().unwrap();
        let writer = SubsetWriter::new(OutputLayout::new(dir.path()), ArffHeader::default());
        let table = full_glcm_table();

        let summary = writer.write_all(&table, &GlcmConfig::default(), true).unwrap();
        assert_eq!(summary.sets, 11);
        assert_eq!(summary.atomic, 140);
        assert_eq!(summary.total_files(), 1 + 2 * 151);

        let layout = writer.layout();
        assert!(layout.master_csv().is_file());
        let csv_text = fs::read_to_string(layout.csv_path(SubsetGroup::Props, "PROP_ASM_dist_mean")).unwrap();
        assert_eq!(csv_text, "glcm_ASM_dist_mean,class\n0.5,A\n");

        let arff_text = fs::read_to_string(layout.arff_path(SubsetGroup::Sets, "Gabor_only")).unwrap();
        assert!(arff_text.contains("@ATTRIBUTE class {A, B}"));
        assert!(arff_text.ends_with("@DATA\nA\n"));
    }

    #[test]
    fn test_write_all_without_subsets() {
        let dir = TempDir::new().unwrap();
        let writer = SubsetWriter::new(OutputLayout::new(dir.path()), ArffHeader::default());
        let summary = writer.write_all(&full_glcm_table(), &GlcmConfig::default(), false).unwrap();
        assert_eq!(summary.total_files(), 1);
        assert!(!writer.layout().arff_path(SubsetGroup::Sets, "GLCM_all").exists());
    }
}
