pub mod convert;
pub mod exporter;

pub use convert::records_to_csv;
pub use exporter::{artifact_name, TableExporter, CSV_SUFFIX};
