//! Runtime configuration files for the `perfscan` binary.
pub mod slicer;
