//! Dataset discovery and the feature table.

pub mod scan;
pub mod table;

pub use scan::{ClassFolder, DatasetIndex, ImageEntry};
pub use table::{FeatureRecord, FeatureTable, Row, LABEL_COLUMN};
