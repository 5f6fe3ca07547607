//! Writing feature tables to disk.
//!
//! - [`csv`] and [`arff`] serialize a single table
//! - [`layout`] knows where every file goes
//! - [`subsets`] fans the full table out into family and GLCM subsets

pub mod arff;
pub mod csv;
pub mod layout;
pub mod subsets;

pub use arff::ArffHeader;
pub use layout::{OutputLayout, SubsetGroup, MASTER_CSV};
pub use subsets::{SubsetFile, SubsetWriter, WriteSummary};

use crate::core::error::{OutputError, OutputResult};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Create `path` and fill it through a buffered writer.
pub(crate) fn write_file<F>(path: &Path, fill: F) -> OutputResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let to_error = |source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    fill(&mut writer).map_err(to_error)?;
    writer.flush().map_err(to_error)
}
