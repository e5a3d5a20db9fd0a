// Security module for dataset path validation
//
// Tool calls name CSV files by path; this module confines those reads to the
// configured data root, preventing path traversal out of it.

pub mod dataset_path;

pub use dataset_path::{PathSecurityError, validate_dataset_path};
