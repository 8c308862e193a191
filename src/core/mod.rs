//! Core business logic module
//!
//! The packaging pipeline's building blocks: update-binary packing,
//! embedded-binary header generation, archive assembly, native and
//! package builds, and artifact signing.

pub mod apk;
pub mod archive;
pub mod dump;
pub mod native;
pub mod packer;
pub mod sign;
