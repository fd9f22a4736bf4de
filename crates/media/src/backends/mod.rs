//! Media store backends.

pub mod filesystem;
pub mod s3;
